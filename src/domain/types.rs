use serde::Serialize;
use uuid::Uuid;

use super::entry::Entry;

/// Result of the serve protocol. Exhaustion is a defined terminal signal,
/// not a failure.
#[derive(Debug, Clone)]
pub enum NextOutcome {
    Entry(Entry),
    Exhausted,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedSummary {
    pub id: Uuid,
    pub url: String,
    pub entries: usize,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct QueueStats {
    pub feeds: usize,
    pub pending: usize,
    pub judged: usize,
    pub classifier_prepared: bool,
}

/// Per-sync accounting: how many feeds refreshed, how many kept stale
/// entries after a failed fetch, and the rebuilt pending depth.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SyncReport {
    pub synced: usize,
    pub failed: usize,
    pub pending: usize,
}
