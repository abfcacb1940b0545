//! SM-2 spaced-repetition scheduling for vocabulary cards.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::config::SrsConfig;
use crate::types::{CardPhase, ReviewQuality, VocabularyCard};

/// Aggregate review-state counts for a learner's deck.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
    pub total: usize,
    pub new: usize,
    pub learning: usize,
    pub review: usize,
    pub mature: usize,
    pub due_today: usize,
    pub average_easiness: f64,
}

#[derive(Debug, Clone)]
pub struct SpacedRepetitionScheduler {
    config: SrsConfig,
}

impl SpacedRepetitionScheduler {
    pub fn new(config: SrsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SrsConfig {
        &self.config
    }

    /// Applies one SM-2 review to `card`. A failed recall (quality below 3)
    /// resets repetitions and falls back to the first interval; a successful
    /// one advances through the fixed first/second intervals and then grows
    /// multiplicatively by the easiness factor held before this review.
    /// The easiness factor itself is updated on every review, pass or fail.
    pub fn review(
        &self,
        card: &VocabularyCard,
        quality: ReviewQuality,
        now: DateTime<Utc>,
    ) -> VocabularyCard {
        let mut updated = card.clone();
        let easiness_before = card.easiness_factor;

        if quality.is_correct() {
            updated.repetitions = card.repetitions + 1;
            updated.interval_days = match updated.repetitions {
                1 => self.config.first_interval_days,
                2 => self.config.second_interval_days,
                _ => (card.interval_days as f64 * easiness_before).round().max(1.0) as u32,
            };
        } else {
            updated.repetitions = 0;
            updated.interval_days = self.config.first_interval_days;
        }

        let q = quality.value() as f64;
        updated.easiness_factor = (easiness_before + 0.1
            - (5.0 - q) * (0.08 + (5.0 - q) * 0.02))
            .clamp(self.config.min_easiness, self.config.max_easiness);

        updated.last_reviewed_at = Some(now);
        updated.next_review_at = now + Duration::days(i64::from(updated.interval_days));
        updated
    }

    /// Classifies a card for reporting. Maturity is a threshold on the
    /// current interval, never an input to scheduling.
    pub fn phase(&self, card: &VocabularyCard) -> CardPhase {
        if card.repetitions == 0 {
            CardPhase::New
        } else if card.interval_days > self.config.mature_interval_days {
            CardPhase::Mature
        } else if card.repetitions == 1 {
            CardPhase::Learning
        } else {
            CardPhase::Review
        }
    }

    /// Cards due at `now`, most overdue first, capped at `cap`.
    pub fn select_due(
        &self,
        cards: &[VocabularyCard],
        now: DateTime<Utc>,
        cap: usize,
    ) -> Vec<VocabularyCard> {
        let mut due: Vec<VocabularyCard> = cards
            .iter()
            .filter(|card| card.next_review_at <= now)
            .cloned()
            .collect();
        due.sort_by(|a, b| a.next_review_at.cmp(&b.next_review_at));
        due.truncate(cap);
        due
    }

    pub fn stats(&self, cards: &[VocabularyCard], now: DateTime<Utc>) -> ReviewStats {
        let mut stats = ReviewStats {
            total: cards.len(),
            new: 0,
            learning: 0,
            review: 0,
            mature: 0,
            due_today: 0,
            average_easiness: 0.0,
        };
        for card in cards {
            match self.phase(card) {
                CardPhase::New => stats.new += 1,
                CardPhase::Learning => stats.learning += 1,
                CardPhase::Review => stats.review += 1,
                CardPhase::Mature => stats.mature += 1,
            }
            if card.next_review_at <= now {
                stats.due_today += 1;
            }
        }
        if !cards.is_empty() {
            stats.average_easiness =
                cards.iter().map(|c| c.easiness_factor).sum::<f64>() / cards.len() as f64;
        }
        stats
    }
}

impl Default for SpacedRepetitionScheduler {
    fn default() -> Self {
        Self::new(SrsConfig::default())
    }
}
