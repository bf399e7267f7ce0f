use std::collections::BTreeMap;

use uuid::Uuid;

use crate::domain::{Entry, FeedSummary};

use super::ReaderError;

/// One subscribed origin. Entries are replaced wholesale on each successful
/// sync; a failed fetch leaves the previous batch in place.
#[derive(Debug, Clone)]
pub struct Feed {
    pub id: Uuid,
    pub entries: Vec<Entry>,
}

/// Subscribed feeds keyed by url. Url order keeps sync rebuilds
/// deterministic.
#[derive(Debug, Default)]
pub struct FeedStore {
    feeds: BTreeMap<String, Feed>,
}

impl FeedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, url: &str) -> Result<Uuid, ReaderError> {
        if self.feeds.contains_key(url) {
            return Err(ReaderError::DuplicateSource(url.to_string()));
        }
        let id = Uuid::new_v4();
        self.feeds.insert(
            url.to_string(),
            Feed {
                id,
                entries: Vec::new(),
            },
        );
        Ok(id)
    }

    /// Re-registers a feed persisted in a previous run, keeping its id.
    pub fn restore(&mut self, url: &str, id: Uuid) {
        self.feeds.entry(url.to_string()).or_insert(Feed {
            id,
            entries: Vec::new(),
        });
    }

    pub fn unsubscribe(&mut self, url: &str) -> bool {
        self.feeds.remove(url).is_some()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.feeds.contains_key(url)
    }

    pub fn len(&self) -> usize {
        self.feeds.len()
    }

    pub fn urls(&self) -> Vec<String> {
        self.feeds.keys().cloned().collect()
    }

    pub fn replace_entries(&mut self, url: &str, entries: Vec<Entry>) {
        if let Some(feed) = self.feeds.get_mut(url) {
            feed.entries = entries;
        }
    }

    pub fn entries_of(&self, url: &str) -> &[Entry] {
        self.feeds.get(url).map(|f| f.entries.as_slice()).unwrap_or(&[])
    }

    pub fn summaries(&self) -> Vec<FeedSummary> {
        self.feeds
            .iter()
            .map(|(url, feed)| FeedSummary {
                id: feed.id,
                url: url.clone(),
                entries: feed.entries.len(),
            })
            .collect()
    }

    /// Rows for the persistence gateway's feed upsert.
    pub fn persistent_rows(&self) -> Vec<(Uuid, String)> {
        self.feeds
            .iter()
            .map(|(url, feed)| (feed.id, url.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribing_twice_is_rejected_without_state_change() {
        let mut store = FeedStore::new();
        let id = store.subscribe("https://example.org/feed.xml").unwrap();
        let err = store.subscribe("https://example.org/feed.xml").unwrap_err();
        assert!(matches!(err, ReaderError::DuplicateSource(_)));
        assert_eq!(store.len(), 1);
        assert_eq!(store.persistent_rows(), vec![(id, "https://example.org/feed.xml".to_string())]);
    }

    #[test]
    fn unsubscribe_removes_the_feed_and_its_entries() {
        let mut store = FeedStore::new();
        store.subscribe("https://a.example/feed").unwrap();
        assert!(store.unsubscribe("https://a.example/feed"));
        assert!(!store.unsubscribe("https://a.example/feed"));
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn restore_keeps_the_persisted_id() {
        let mut store = FeedStore::new();
        let id = Uuid::new_v4();
        store.restore("https://a.example/feed", id);
        assert_eq!(store.persistent_rows(), vec![(id, "https://a.example/feed".to_string())]);
    }
}
