pub mod queue;
pub mod store;

use futures::future::join_all;
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    classifier::NaiveBayesClassifier,
    domain::{Entry, FeedSummary, NextOutcome, QueueStats, SyncReport},
    fetch::{FeedFetcher, FetchError},
};

use queue::ReviewQueue;
use store::FeedStore;

#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("feed already subscribed: {0}")]
    DuplicateSource(String),
}

/// Everything the serve and sync protocols mutate, guarded as one unit so
/// callers never observe a half-rebuilt queue.
struct ReaderState {
    store: FeedStore,
    queue: ReviewQueue,
    classifier: NaiveBayesClassifier,
}

impl ReaderState {
    /// Applies settled fetch results: successful feeds replace their entries
    /// wholesale, failed feeds keep their stale batch and contribute nothing
    /// to the rebuilt pending stack.
    fn apply_sync(&mut self, results: Vec<(String, Result<Vec<Entry>, FetchError>)>) -> SyncReport {
        let mut synced = 0;
        let mut failed = 0;
        let mut fresh: Vec<Entry> = Vec::new();

        for (url, result) in results {
            match result {
                Ok(entries) => {
                    synced += 1;
                    fresh.extend(entries.iter().cloned());
                    self.store.replace_entries(&url, entries);
                }
                Err(err) => {
                    failed += 1;
                    tracing::warn!(
                        target: "sync",
                        url = %url,
                        error = %err,
                        stale_entries = self.store.entries_of(&url).len(),
                        "feed fetch failed; keeping previous entries"
                    );
                }
            }
        }

        self.queue.rebuild(fresh);
        SyncReport {
            synced,
            failed,
            pending: self.queue.pending_len(),
        }
    }
}

/// Single logical thread of control over the feed store, review queue and
/// classifier. The fetch fan-out runs outside the state lock; only the
/// post-barrier rebuild mutates shared state.
pub struct ReaderService {
    state: Mutex<ReaderState>,
    sync_gate: Mutex<()>,
    fetcher: FeedFetcher,
}

impl ReaderService {
    pub fn new(fetcher: FeedFetcher, classifier: NaiveBayesClassifier) -> Self {
        Self {
            state: Mutex::new(ReaderState {
                store: FeedStore::new(),
                queue: ReviewQueue::new(),
                classifier,
            }),
            sync_gate: Mutex::new(()),
            fetcher,
        }
    }

    pub async fn subscribe(&self, url: &str) -> Result<Uuid, ReaderError> {
        self.state.lock().await.store.subscribe(url)
    }

    /// Re-registers feeds loaded from the persistence gateway at startup.
    pub async fn restore(&self, url: &str, id: Uuid) {
        self.state.lock().await.store.restore(url, id);
    }

    pub async fn unsubscribe(&self, url: &str) -> bool {
        self.state.lock().await.store.unsubscribe(url)
    }

    pub async fn feeds(&self) -> Vec<FeedSummary> {
        self.state.lock().await.store.summaries()
    }

    pub async fn persistent_rows(&self) -> Vec<(Uuid, String)> {
        self.state.lock().await.store.persistent_rows()
    }

    pub async fn judged_snapshot(&self) -> Vec<(Entry, bool)> {
        self.state.lock().await.queue.judged().to_vec()
    }

    pub async fn stats(&self) -> QueueStats {
        let state = self.state.lock().await;
        QueueStats {
            feeds: state.store.len(),
            pending: state.queue.pending_len(),
            judged: state.queue.judged_len(),
            classifier_prepared: state.classifier.is_prepared(),
        }
    }

    pub async fn next(&self, verdict: Option<bool>) -> NextOutcome {
        let mut state = self.state.lock().await;
        let ReaderState {
            queue, classifier, ..
        } = &mut *state;
        queue.next(verdict, classifier)
    }

    /// Fetches every subscribed feed concurrently, waits for all of them to
    /// settle, then rebuilds `pending` atomically. The gate serializes
    /// overlapping sync requests instead of interleaving two rebuilds.
    pub async fn sync(&self) -> SyncReport {
        let _gate = self.sync_gate.lock().await;

        let urls = { self.state.lock().await.store.urls() };
        let fetches = urls.iter().map(|url| self.fetcher.fetch(url));
        let settled = join_all(fetches).await;
        let results: Vec<_> = urls.into_iter().zip(settled).collect();

        let report = self.state.lock().await.apply_sync(results);
        tracing::info!(
            target: "sync",
            synced = report.synced,
            failed = report.failed,
            pending = report.pending,
            "sync complete"
        );
        report
    }
}
