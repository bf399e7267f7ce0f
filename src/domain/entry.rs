use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One normalized feed entry. Immutable once constructed; owned by the feed
/// store until it reaches the review queue, then by the judged log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    /// Stable dedup key. Falls back to the canonical link when the feed
    /// carries no native id.
    pub identity: String,
    pub title: String,
    pub link: String,
    pub summary: String,
    pub body: String,
    pub author: String,
    pub categories: BTreeSet<String>,
    pub published: DateTime<Utc>,
}

impl Entry {
    /// Canonical concatenation fed to the classifier for both training and
    /// scoring.
    pub fn full_text(&self) -> String {
        let categories = self
            .categories
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ");
        format!(
            "{} {} {} {} {} {}",
            self.title, self.summary, self.body, self.author, categories, self.link
        )
    }
}
