//! Text comprehensibility analysis: tokenization, coverage against a
//! learner's known-word set, and CEFR level estimation.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::engine::config::CoverageConfig;
use crate::engine::frequency::{normalize, FrequencyIndex};
use crate::types::CefrBand;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageReport {
    /// Fraction of tokens known to the learner, in [0,1].
    pub coverage: f64,
    /// Up to `max_unknown_words` unknown tokens, in order of appearance.
    pub unknown_words: Vec<String>,
    pub total_words: usize,
}

impl CoverageReport {
    /// Empty text is vacuously comprehensible.
    fn vacuous() -> Self {
        Self {
            coverage: 1.0,
            unknown_words: Vec::new(),
            total_words: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CoverageEstimator {
    index: Arc<FrequencyIndex>,
    config: CoverageConfig,
}

impl CoverageEstimator {
    pub fn new(index: Arc<FrequencyIndex>, config: CoverageConfig) -> Self {
        Self { index, config }
    }

    pub fn index(&self) -> &Arc<FrequencyIndex> {
        &self.index
    }

    /// Coverage of `text` against `known_words`. A token counts as known if
    /// it is in the learner's set or its frequency rank is within the free
    /// vocabulary range.
    pub fn coverage(&self, text: &str, known_words: &HashSet<String>) -> CoverageReport {
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return CoverageReport::vacuous();
        }

        let known: HashSet<String> = known_words.iter().map(|w| normalize(w)).collect();

        let mut known_count = 0usize;
        let mut unknown_words = Vec::new();
        let mut seen_unknown = HashSet::new();

        for token in &tokens {
            let is_known = known.contains(token)
                || self.index.lookup(token).rank <= self.config.free_vocabulary_rank;
            if is_known {
                known_count += 1;
            } else if unknown_words.len() < self.config.max_unknown_words
                && seen_unknown.insert(token.clone())
            {
                unknown_words.push(token.clone());
            }
        }

        CoverageReport {
            coverage: known_count as f64 / tokens.len() as f64,
            unknown_words,
            total_words: tokens.len(),
        }
    }

    /// Estimates the CEFR band of `text` from average sentence length and
    /// the ratio of rare tokens. Both factors map to an ordinal 0-4 score;
    /// the 0-8 sum maps to six bands with fixed breakpoints.
    pub fn estimate_cefr(&self, text: &str) -> CefrBand {
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return CefrBand::A1;
        }

        let sentences = count_sentences(text).max(1);
        let avg_words_per_sentence = tokens.len() as f64 / sentences as f64;

        let rare_count = tokens
            .iter()
            .filter(|token| self.index.lookup(token).rank > self.config.rare_rank_threshold)
            .count();
        let rare_ratio = rare_count as f64 / tokens.len() as f64;

        let length_score = match avg_words_per_sentence {
            v if v < 8.0 => 0,
            v if v < 12.0 => 1,
            v if v < 18.0 => 2,
            v if v < 25.0 => 3,
            _ => 4,
        };
        let rare_score = match rare_ratio {
            v if v < 0.02 => 0,
            v if v < 0.05 => 1,
            v if v < 0.12 => 2,
            v if v < 0.20 => 3,
            _ => 4,
        };

        match length_score + rare_score {
            0..=1 => CefrBand::A1,
            2 => CefrBand::A2,
            3..=4 => CefrBand::B1,
            5..=6 => CefrBand::B2,
            7 => CefrBand::C1,
            _ => CefrBand::C2,
        }
    }
}

/// Splits `text` into normalized alphabetic tokens: lowercase, accents
/// stripped for matching, non-alphabetic characters treated as boundaries.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for c in text.chars() {
        if c.is_alphabetic() {
            current.push(c);
        } else if !current.is_empty() {
            tokens.push(normalize(&current));
            current.clear();
        }
    }
    if !current.is_empty() {
        tokens.push(normalize(&current));
    }
    tokens
}

fn count_sentences(text: &str) -> usize {
    text.split(['.', '!', '?', '…'])
        .filter(|segment| segment.chars().any(char::is_alphabetic))
        .count()
}
