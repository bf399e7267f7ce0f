pub mod entry;
pub mod types;

pub use entry::Entry;
pub use types::{FeedSummary, NextOutcome, QueueStats, SyncReport};
