use std::collections::HashSet;

use crate::{
    classifier::NaiveBayesClassifier,
    domain::{Entry, NextOutcome},
};

/// Scores at or above this survive the filter and reach the reader.
pub const SCORE_THRESHOLD: f64 = 0.5;

/// LIFO stack of unseen entries plus the append-only judged log.
///
/// `pending` is rebuilt from scratch on every sync and never persisted; the
/// judged log is persisted and doubles as the classifier training set.
#[derive(Debug, Default)]
pub struct ReviewQueue {
    pending: Vec<Entry>,
    judged: Vec<(Entry, bool)>,
}

impl ReviewQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn judged_len(&self) -> usize {
        self.judged.len()
    }

    pub fn judged(&self) -> &[(Entry, bool)] {
        &self.judged
    }

    /// Replaces `pending` with the given entries, deduplicated by identity.
    /// First occurrence wins; the last pushed entry sits on top of the
    /// stack, so the most recently fetched surface first.
    pub fn rebuild<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = Entry>,
    {
        self.pending.clear();
        let mut seen: HashSet<String> = HashSet::new();
        for entry in entries {
            if seen.insert(entry.identity.clone()) {
                self.pending.push(entry);
            }
        }
    }

    /// Serve protocol. An incoming verdict judges the previously served
    /// entry (the current top). The loop then discards anything scoring
    /// below threshold or already judged, and returns the first survivor
    /// without popping it.
    pub fn next(
        &mut self,
        verdict: Option<bool>,
        classifier: &NaiveBayesClassifier,
    ) -> NextOutcome {
        if let Some(liked) = verdict {
            if let Some(entry) = self.pending.pop() {
                self.judged.push((entry, liked));
            }
        }

        while let Some(current) = self.pending.last() {
            let score = classifier.score(current);
            if score < SCORE_THRESHOLD {
                tracing::debug!(
                    target: "queue",
                    identity = %current.identity,
                    score,
                    "entry filtered out"
                );
                self.pending.pop();
                continue;
            }
            if self.already_judged(&current.identity) {
                // Seen in a previous run or feed; drop without a new record.
                self.pending.pop();
                continue;
            }
            return NextOutcome::Entry(current.clone());
        }
        NextOutcome::Exhausted
    }

    fn already_judged(&self, identity: &str) -> bool {
        self.judged.iter().any(|(entry, _)| entry.identity == identity)
    }
}
