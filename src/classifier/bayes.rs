use std::collections::{BTreeSet, HashMap};

use crate::domain::Entry;

use super::tokenize::tokenize;

const EPSILON: f64 = 1e-9;

/// Score reported until the classifier has ingested a full retrain pass:
/// "show me everything".
pub const NEUTRAL_SCORE: f64 = 1.0;

/// Two-class Bernoulli Naive Bayes with add-alpha smoothing.
///
/// Liked judgments increment liked counters throughout, so tokens that
/// co-occur with liked training entries push scores toward 1.0. State only
/// grows; scoring never mutates.
#[derive(Debug, Clone)]
pub struct NaiveBayesClassifier {
    alpha: f64,
    tokens: BTreeSet<String>,
    liked_token_counts: HashMap<String, u64>,
    disliked_token_counts: HashMap<String, u64>,
    liked_entries: u64,
    disliked_entries: u64,
    prepared: bool,
}

impl NaiveBayesClassifier {
    /// `alpha` is the Laplace smoothing constant and must be positive.
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha,
            tokens: BTreeSet::new(),
            liked_token_counts: HashMap::new(),
            disliked_token_counts: HashMap::new(),
            liked_entries: 0,
            disliked_entries: 0,
            prepared: false,
        }
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    /// Marks the classifier usable for scoring. Only the persistence layer
    /// flips this, once the judged log clears the retrain threshold.
    pub fn mark_prepared(&mut self) {
        self.prepared = true;
    }

    pub fn trained_entries(&self) -> u64 {
        self.liked_entries + self.disliked_entries
    }

    /// Ingests labeled items. Additive: training in batches is equivalent to
    /// one pass over the concatenation of all batches.
    pub fn train<'a, I>(&mut self, items: I)
    where
        I: IntoIterator<Item = &'a (String, bool)>,
    {
        for (content, liked) in items {
            if *liked {
                self.liked_entries += 1;
            } else {
                self.disliked_entries += 1;
            }

            // Each distinct token counts once per item.
            for token in tokenize(content) {
                let counts = if *liked {
                    &mut self.liked_token_counts
                } else {
                    &mut self.disliked_token_counts
                };
                *counts.entry(token.clone()).or_insert(0) += 1;
                self.tokens.insert(token);
            }
        }
    }

    pub fn score(&self, entry: &Entry) -> f64 {
        if !self.prepared {
            return NEUTRAL_SCORE;
        }
        self.score_text(&entry.full_text())
    }

    /// Bernoulli likelihood over the entire vocabulary: tokens absent from
    /// the message contribute their complement, which is what lets unseen
    /// spammy vocabulary pull a score down.
    pub fn score_text(&self, text: &str) -> f64 {
        let message_tokens = tokenize(text);
        let mut log_if_liked = 0.0_f64;
        let mut log_if_disliked = 0.0_f64;

        for token in &self.tokens {
            let (p_liked, p_disliked) = self.token_probabilities(token);
            let p_liked = p_liked.clamp(EPSILON, 1.0 - EPSILON);
            let p_disliked = p_disliked.clamp(EPSILON, 1.0 - EPSILON);

            if message_tokens.contains(token) {
                log_if_liked += p_liked.ln();
                log_if_disliked += p_disliked.ln();
            } else {
                log_if_liked += (1.0 - p_liked).ln();
                log_if_disliked += (1.0 - p_disliked).ln();
            }
        }

        // exp(l)/(exp(l)+exp(d)) rearranged so a large vocabulary cannot
        // underflow both likelihoods to zero.
        1.0 / (1.0 + (log_if_disliked - log_if_liked).exp())
    }

    fn token_probabilities(&self, token: &str) -> (f64, f64) {
        let liked = self.liked_token_counts.get(token).copied().unwrap_or(0) as f64;
        let disliked = self.disliked_token_counts.get(token).copied().unwrap_or(0) as f64;

        let p_liked = (liked + self.alpha) / (self.liked_entries as f64 + 2.0 * self.alpha);
        let p_disliked = (disliked + self.alpha) / (self.disliked_entries as f64 + 2.0 * self.alpha);
        (p_liked, p_disliked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labeled(content: &str, liked: bool) -> (String, bool) {
        (content.to_string(), liked)
    }

    fn probe_entry(text: &str) -> Entry {
        Entry {
            identity: "probe".into(),
            title: text.into(),
            link: String::new(),
            summary: String::new(),
            body: String::new(),
            author: String::new(),
            categories: Default::default(),
            published: chrono::Utc::now(),
        }
    }

    fn sample_batch() -> Vec<(String, bool)> {
        vec![
            labeled("rust async runtime deep dive", true),
            labeled("borrow checker explained", true),
            labeled("crypto giveaway claim your prize", false),
            labeled("one weird trick to get rich", false),
        ]
    }

    #[test]
    fn neutral_until_prepared() {
        let mut classifier = NaiveBayesClassifier::new(1.0);
        classifier.train(&sample_batch());
        assert!(!classifier.is_prepared());
        assert_eq!(classifier.score(&probe_entry("anything")), NEUTRAL_SCORE);

        classifier.mark_prepared();
        let score = classifier.score(&probe_entry("rust borrow checker"));
        assert!(score > 0.0 && score < 1.0);
    }

    #[test]
    fn batched_training_matches_single_pass() {
        let batch = sample_batch();
        let (first, second) = batch.split_at(2);

        let mut split = NaiveBayesClassifier::new(1.0);
        split.train(first);
        split.train(second);
        split.mark_prepared();

        let mut whole = NaiveBayesClassifier::new(1.0);
        whole.train(&batch);
        whole.mark_prepared();

        for probe in ["rust", "crypto prize", "weird runtime", ""] {
            assert_eq!(split.score_text(probe).to_bits(), whole.score_text(probe).to_bits());
        }
    }

    #[test]
    fn liked_vocabulary_raises_score_disliked_lowers_it() {
        let mut classifier = NaiveBayesClassifier::new(1.0);
        let mut batch = Vec::new();
        for _ in 0..20 {
            batch.push(labeled("ferris compiler lifetimes", true));
            batch.push(labeled("casino bonus spins", false));
        }
        classifier.train(&batch);
        classifier.mark_prepared();

        assert!(classifier.score_text("ferris lifetimes") > 0.5);
        assert!(classifier.score_text("casino spins") < 0.5);
    }

    #[test]
    fn heavily_liked_token_scores_above_threshold() {
        // 101 liked entries all containing "rust", none disliked.
        let batch: Vec<(String, bool)> = (0..101).map(|_| labeled("rust", true)).collect();
        let mut classifier = NaiveBayesClassifier::new(1.0);
        classifier.train(&batch);
        classifier.mark_prepared();

        let score = classifier.score_text("rust");
        assert!(score > 0.5, "score was {score}");
        assert!(score < 1.0);
    }

    #[test]
    fn training_is_monotone_on_counts() {
        let mut classifier = NaiveBayesClassifier::new(1.0);
        classifier.train(&[labeled("alpha beta", true)]);
        assert_eq!(classifier.trained_entries(), 1);
        classifier.train(&[labeled("beta gamma", false)]);
        assert_eq!(classifier.trained_entries(), 2);
    }
}
