//! Composite content scoring: seven weighted factors folded into a single
//! relevance score per candidate item.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rayon::prelude::*;

use crate::constants::PARALLEL_SCORE_THRESHOLD;
use crate::engine::config::{EngineConfig, LevelMatchConfig, NoveltyConfig, RecencyConfig, ScoringWeights};
use crate::engine::coverage::CoverageEstimator;
use crate::engine::frequency::{normalize, FrequencyIndex};
use crate::types::{ContentItem, LearnerProfile, ScoreBreakdown, ScoreSignals, ScoredItem};

#[derive(Debug, Clone)]
pub struct ContentScorer {
    estimator: CoverageEstimator,
    weights: ScoringWeights,
    novelty: NoveltyConfig,
    level_match: LevelMatchConfig,
    recency: RecencyConfig,
}

impl ContentScorer {
    pub fn new(index: Arc<FrequencyIndex>, config: &EngineConfig) -> Self {
        Self {
            estimator: CoverageEstimator::new(index, config.coverage.clone()),
            weights: config.scoring.clone(),
            novelty: config.novelty.clone(),
            level_match: config.level_match.clone(),
            recency: config.recency.clone(),
        }
    }

    pub fn estimator(&self) -> &CoverageEstimator {
        &self.estimator
    }

    /// Scores every candidate and returns them ranked best-first. Ties on
    /// score break toward fresher `published_at` (undated items last), then
    /// toward earlier input position, so ranking is fully deterministic.
    pub fn rank_content(
        &self,
        items: Vec<ContentItem>,
        profile: &LearnerProfile,
        signals: &ScoreSignals,
        now: DateTime<Utc>,
    ) -> Vec<ScoredItem> {
        let mut scored: Vec<(usize, ScoredItem)> = if items.len() >= PARALLEL_SCORE_THRESHOLD {
            items
                .into_par_iter()
                .enumerate()
                .map(|(idx, item)| (idx, self.score_item(item, profile, signals, now)))
                .collect()
        } else {
            items
                .into_iter()
                .enumerate()
                .map(|(idx, item)| (idx, self.score_item(item, profile, signals, now)))
                .collect()
        };

        scored.sort_by(|(a_idx, a), (b_idx, b)| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| match (b.item.published_at, a.item.published_at) {
                    (Some(b_ts), Some(a_ts)) => b_ts.cmp(&a_ts),
                    (Some(_), None) => std::cmp::Ordering::Greater,
                    (None, Some(_)) => std::cmp::Ordering::Less,
                    (None, None) => std::cmp::Ordering::Equal,
                })
                .then_with(|| a_idx.cmp(b_idx))
        });

        scored.into_iter().map(|(_, item)| item).collect()
    }

    pub fn score_item(
        &self,
        item: ContentItem,
        profile: &LearnerProfile,
        signals: &ScoreSignals,
        now: DateTime<Utc>,
    ) -> ScoredItem {
        // Aggregator-precomputed coverage and unknowns win; anything
        // missing is estimated from the text.
        let (coverage, unknown_words) = match (item.coverage, item.unknown_words.clone()) {
            (Some(c), Some(unknowns)) => (c.clamp(0.0, 1.0), unknowns),
            (precomputed, unknowns) => {
                let report = self.estimator.coverage(&item.text, &profile.known_words);
                (
                    precomputed.map_or(report.coverage, |c| c.clamp(0.0, 1.0)),
                    unknowns.unwrap_or(report.unknown_words),
                )
            }
        };

        let breakdown = ScoreBreakdown {
            coverage,
            novelty_fit: self.novelty_fit(coverage, profile),
            level_match: self.level_match(&item, profile),
            interest_alignment: interest_alignment(&item, profile),
            recency: self.recency(&item, now),
            srs_focus: srs_focus(&unknown_words, profile),
            engagement_prediction: engagement_prediction(&item, signals),
        };

        let score = (self.weights.coverage * breakdown.coverage
            + self.weights.novelty_fit * breakdown.novelty_fit
            + self.weights.level_match * breakdown.level_match
            + self.weights.interest_alignment * breakdown.interest_alignment
            + self.weights.recency * breakdown.recency
            + self.weights.srs_focus * breakdown.srs_focus
            + self.weights.engagement_prediction * breakdown.engagement_prediction)
            .clamp(0.0, 1.0);

        ScoredItem {
            item,
            score,
            score_breakdown: breakdown,
        }
    }

    /// Desirable difficulty: how close the unknown-word fraction sits to
    /// the band-specific target. The fraction saturates at `max_novelty`,
    /// so anything past the window is penalized by distance, not zeroed.
    fn novelty_fit(&self, coverage: f64, profile: &LearnerProfile) -> f64 {
        let novelty = (1.0 - coverage).clamp(0.0, self.novelty.max_novelty);
        let target = self.novelty.target_for(profile.cefr_level);
        (1.0 - (novelty - target).abs()).clamp(0.0, 1.0)
    }

    fn level_match(&self, item: &ContentItem, profile: &LearnerProfile) -> f64 {
        let item_level = item
            .target_level
            .unwrap_or_else(|| self.estimator.estimate_cefr(&item.text));
        let distance = item_level.delta(profile.cefr_level).abs() as f64;
        (1.0 - self.level_match.penalty_per_band * distance).clamp(0.0, 1.0)
    }

    fn recency(&self, item: &ContentItem, now: DateTime<Utc>) -> f64 {
        match item.published_at {
            Some(published_at) => {
                let age_hours =
                    (now - published_at).num_seconds().max(0) as f64 / 3600.0;
                (-age_hours / self.recency.decay_hours).exp().clamp(0.0, 1.0)
            }
            // Undated content gets a neutral score rather than a penalty.
            None => 0.5,
        }
    }
}

/// Jaccard similarity between the item's tags and the learner's interests.
/// Either set being empty is absence of data, not a mismatch: neutral 0.5.
fn interest_alignment(item: &ContentItem, profile: &LearnerProfile) -> f64 {
    if item.tags.is_empty() || profile.interest_tags.is_empty() {
        return 0.5;
    }
    let intersection = item
        .tags
        .intersection(&profile.interest_tags)
        .count();
    let union = item.tags.union(&profile.interest_tags).count();
    intersection as f64 / union as f64
}

/// Fraction of the item's unknown words that the learner recently got
/// wrong; content that re-exposes struggling vocabulary floats up.
fn srs_focus(unknown_words: &[String], profile: &LearnerProfile) -> f64 {
    if unknown_words.is_empty() || profile.recent_mistakes.is_empty() {
        return 0.0;
    }
    let mistakes: std::collections::HashSet<String> =
        profile.recent_mistakes.iter().map(|w| normalize(w)).collect();
    let matched = unknown_words
        .iter()
        .filter(|word| mistakes.contains(&normalize(word)))
        .count();
    matched as f64 / unknown_words.len() as f64
}

fn engagement_prediction(item: &ContentItem, signals: &ScoreSignals) -> f64 {
    signals
        .engagement_priors
        .get(&item.content_type)
        .copied()
        .unwrap_or(0.5)
        .clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::collections::HashSet;

    fn scorer() -> ContentScorer {
        ContentScorer::new(FrequencyIndex::builtin_spanish(), &EngineConfig::default())
    }

    fn item(id: &str, text: &str) -> ContentItem {
        ContentItem {
            id: id.to_string(),
            content_type: "article".to_string(),
            title: id.to_string(),
            text: text.to_string(),
            tags: HashSet::new(),
            target_level: None,
            source: "rss".to_string(),
            category: "news".to_string(),
            published_at: None,
            unknown_words: None,
            coverage: None,
        }
    }

    #[test]
    fn scores_stay_in_unit_interval() {
        let profile = LearnerProfile::new("u1");
        let signals = ScoreSignals::default();
        let now = Utc::now();
        for text in ["", "Hola, ¿cómo estás?", "xilofonista quimerico taumaturgia"] {
            let scored = scorer().score_item(item("a", text), &profile, &signals, now);
            assert!((0.0..=1.0).contains(&scored.score), "text: {text}");
        }
    }

    #[test]
    fn precomputed_coverage_short_circuits_estimation() {
        let profile = LearnerProfile::new("u1");
        let mut it = item("a", "zorrocloco taumaturgia");
        it.coverage = Some(0.9);
        let scored = scorer().score_item(it, &profile, &ScoreSignals::default(), Utc::now());
        assert_eq!(scored.score_breakdown.coverage, 0.9);
    }

    #[test]
    fn novelty_saturates_at_the_cap() {
        let s = scorer();
        let profile = LearnerProfile::new("u1"); // A2, target novelty 0.10
        let signals = ScoreSignals::default();
        let now = Utc::now();

        let mut hard = item("a", "text");
        hard.coverage = Some(0.4); // 60% unknown, clamps to 0.30
        let hard = s.score_item(hard, &profile, &signals, now);
        assert!((hard.score_breakdown.novelty_fit - 0.80).abs() < 1e-9);

        // Anything past the cap saturates to the same fit.
        let mut harder = item("b", "text");
        harder.coverage = Some(0.1);
        let harder = s.score_item(harder, &profile, &signals, now);
        assert_eq!(
            hard.score_breakdown.novelty_fit,
            harder.score_breakdown.novelty_fit
        );
    }

    #[test]
    fn fresher_items_win_recency() {
        let s = scorer();
        let profile = LearnerProfile::new("u1");
        let signals = ScoreSignals::default();
        let now = Utc::now();
        let mut fresh = item("fresh", "Hola");
        fresh.published_at = Some(now - Duration::hours(1));
        let mut stale = item("stale", "Hola");
        stale.published_at = Some(now - Duration::hours(72));
        let fresh_score = s.score_item(fresh, &profile, &signals, now);
        let stale_score = s.score_item(stale, &profile, &signals, now);
        assert!(fresh_score.score_breakdown.recency > stale_score.score_breakdown.recency);
    }

    #[test]
    fn interest_alignment_is_jaccard() {
        let s = scorer();
        let mut profile = LearnerProfile::new("u1");
        profile.interest_tags =
            ["deportes", "cocina", "viajes"].iter().map(|t| t.to_string()).collect();
        let mut it = item("a", "Hola");
        it.tags = ["deportes".to_string()].into_iter().collect();
        let scored = s.score_item(it, &profile, &ScoreSignals::default(), Utc::now());
        // One shared tag over a three-tag union.
        assert!((scored.score_breakdown.interest_alignment - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn srs_focus_covers_mistakes_in_unknown_words() {
        let s = scorer();
        let mut profile = LearnerProfile::new("u1");
        profile.recent_mistakes = vec!["gato".to_string()];
        let mut it = item("a", "");
        it.unknown_words = Some(vec!["gato".to_string(), "perro".to_string()]);
        let scored = s.score_item(it, &profile, &ScoreSignals::default(), Utc::now());
        assert_eq!(scored.score_breakdown.srs_focus, 0.5);
    }

    #[test]
    fn srs_focus_falls_back_to_estimated_unknowns() {
        let s = scorer();
        let mut profile = LearnerProfile::new("u1");
        profile.recent_mistakes = vec!["zorrocloco".to_string()];
        let scored = s.score_item(
            item("a", "El zorrocloco está en la casa."),
            &profile,
            &ScoreSignals::default(),
            Utc::now(),
        );
        // "zorrocloco" is the only out-of-corpus token in the text.
        assert_eq!(scored.score_breakdown.srs_focus, 1.0);
    }

    #[test]
    fn ranking_is_deterministic_under_ties() {
        let s = scorer();
        let profile = LearnerProfile::new("u1");
        let signals = ScoreSignals::default();
        let now = Utc::now();
        let mut a = item("a", "Hola casa");
        a.coverage = Some(0.95);
        let mut b = item("b", "Hola casa");
        b.coverage = Some(0.95);
        let ranked = s.rank_content(vec![a.clone(), b.clone()], &profile, &signals, now);
        let again = s.rank_content(vec![a, b], &profile, &signals, now);
        // Identical items tie on score and published_at; input order decides.
        assert_eq!(ranked[0].item.id, "a");
        assert_eq!(
            ranked.iter().map(|x| x.item.id.clone()).collect::<Vec<_>>(),
            again.iter().map(|x| x.item.id.clone()).collect::<Vec<_>>()
        );
    }

    #[test]
    fn dated_items_outrank_undated_on_tied_score() {
        let s = scorer();
        let profile = LearnerProfile::new("u1");
        let now = Utc::now();
        let mut dated = item("dated", "Hola");
        dated.published_at = Some(now);
        let undated = item("undated", "Hola");
        // Force identical composite scores by overriding coverage.
        let mut scored: Vec<ScoredItem> = vec![
            s.score_item(undated, &profile, &ScoreSignals::default(), now),
            s.score_item(dated, &profile, &ScoreSignals::default(), now),
        ];
        for entry in &mut scored {
            entry.score = 0.5;
        }
        scored.sort_by(|a, b| {
            b.score.total_cmp(&a.score).then_with(|| {
                match (b.item.published_at, a.item.published_at) {
                    (Some(b_ts), Some(a_ts)) => b_ts.cmp(&a_ts),
                    (Some(_), None) => std::cmp::Ordering::Greater,
                    (None, Some(_)) => std::cmp::Ordering::Less,
                    (None, None) => std::cmp::Ordering::Equal,
                }
            })
        });
        assert_eq!(scored[0].item.id, "dated");
    }
}
