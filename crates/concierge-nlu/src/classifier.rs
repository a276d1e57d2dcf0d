//! Probabilistic fallback classifier.
//!
//! Multinomial naive Bayes over unigram and bigram tokens with Laplace
//! smoothing. Trained once at startup from a static phrase corpus; consulted
//! only when the deterministic resolver finds nothing.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use concierge_core::types::Intent;

use crate::corpus::TRAINING_PHRASES;

/// Ranked labels with posterior scores, highest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassificationResult {
    pub ranked: Vec<(Intent, f64)>,
}

impl ClassificationResult {
    pub fn top(&self) -> Option<(Intent, f64)> {
        self.ranked.first().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }
}

#[derive(Debug, Default)]
struct ClassModel {
    documents: usize,
    token_counts: HashMap<String, usize>,
    total_tokens: usize,
}

pub struct IntentClassifier {
    classes: Vec<(Intent, ClassModel)>,
    vocabulary: HashSet<String>,
    documents: usize,
}

impl IntentClassifier {
    /// Train on `(normalized phrase, intent)` pairs.
    pub fn train(corpus: &[(&str, Intent)]) -> Self {
        let mut models: HashMap<Intent, ClassModel> = HashMap::new();
        let mut vocabulary = HashSet::new();

        for (phrase, intent) in corpus {
            let model = models.entry(*intent).or_default();
            model.documents += 1;
            for token in features(phrase) {
                vocabulary.insert(token.clone());
                *model.token_counts.entry(token).or_insert(0) += 1;
                model.total_tokens += 1;
            }
        }

        // Stable class order keeps ties deterministic.
        let mut classes: Vec<(Intent, ClassModel)> = models.into_iter().collect();
        classes.sort_by_key(|(intent, _)| *intent);

        debug!(
            classes = classes.len(),
            vocabulary = vocabulary.len(),
            documents = corpus.len(),
            "Classifier trained"
        );

        Self {
            classes,
            vocabulary,
            documents: corpus.len(),
        }
    }

    /// Train on the built-in corpus.
    pub fn from_default_corpus() -> Self {
        Self::train(TRAINING_PHRASES)
    }

    /// Posterior distribution over intents for `normalized` text.
    ///
    /// Tokens outside the training vocabulary carry no evidence; when none are
    /// known the result is empty.
    pub fn classify(&self, normalized: &str) -> ClassificationResult {
        let known: Vec<String> = features(normalized)
            .into_iter()
            .filter(|token| self.vocabulary.contains(token))
            .collect();
        if known.is_empty() || self.documents == 0 {
            return ClassificationResult::default();
        }

        let vocab_size = self.vocabulary.len() as f64;
        let log_scores: Vec<(Intent, f64)> = self
            .classes
            .iter()
            .map(|(intent, model)| {
                let prior = (model.documents as f64 / self.documents as f64).ln();
                let denominator = model.total_tokens as f64 + vocab_size;
                let likelihood: f64 = known
                    .iter()
                    .map(|token| {
                        let count = model.token_counts.get(token).copied().unwrap_or(0);
                        ((count as f64 + 1.0) / denominator).ln()
                    })
                    .sum();
                (*intent, prior + likelihood)
            })
            .collect();

        // Softmax in log space.
        let max = log_scores
            .iter()
            .map(|(_, score)| *score)
            .fold(f64::NEG_INFINITY, f64::max);
        let total: f64 = log_scores.iter().map(|(_, s)| (s - max).exp()).sum();

        let mut ranked: Vec<(Intent, f64)> = log_scores
            .into_iter()
            .map(|(intent, score)| (intent, (score - max).exp() / total))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

        ClassificationResult { ranked }
    }

    /// Top label when its score reaches `threshold`.
    pub fn decide(&self, normalized: &str, threshold: f64) -> Option<(Intent, f64)> {
        self.classify(normalized)
            .top()
            .filter(|(_, score)| *score >= threshold)
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }
}

/// Alphabetic unigrams plus adjacent bigrams.
fn features(text: &str) -> Vec<String> {
    let words: Vec<&str> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty() && !w.chars().any(|c| c.is_ascii_digit()))
        .collect();

    let mut tokens: Vec<String> = words.iter().map(|w| w.to_string()).collect();
    tokens.extend(words.windows(2).map(|pair| format!("{}_{}", pair[0], pair[1])));
    tokens
}
