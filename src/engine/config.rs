use serde::{Deserialize, Serialize};

use crate::constants;
use crate::types::CefrBand;

/// Weights for the seven scoring factors. Empirically chosen defaults;
/// tunable configuration, not hard-coded truths.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringWeights {
    pub coverage: f64,
    pub novelty_fit: f64,
    pub level_match: f64,
    pub interest_alignment: f64,
    pub recency: f64,
    pub srs_focus: f64,
    pub engagement_prediction: f64,
}

impl ScoringWeights {
    pub fn sum(&self) -> f64 {
        self.coverage
            + self.novelty_fit
            + self.level_match
            + self.interest_alignment
            + self.recency
            + self.srs_focus
            + self.engagement_prediction
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            coverage: 0.30,
            novelty_fit: 0.20,
            level_match: 0.15,
            interest_alignment: 0.15,
            recency: 0.10,
            srs_focus: 0.05,
            engagement_prediction: 0.05,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageConfig {
    /// Rank above which a token counts as rare for CEFR estimation.
    pub rare_rank_threshold: u32,
    /// Rank within which a word is "free" vocabulary, known regardless of
    /// explicit learning history.
    pub free_vocabulary_rank: u32,
    pub max_unknown_words: usize,
}

impl Default for CoverageConfig {
    fn default() -> Self {
        Self {
            rare_rank_threshold: constants::DEFAULT_RARE_RANK_THRESHOLD,
            free_vocabulary_rank: constants::DEFAULT_FREE_VOCABULARY_RANK,
            max_unknown_words: constants::MAX_UNKNOWN_WORDS,
        }
    }
}

/// Desirable-difficulty window: the target fraction of unknown vocabulary
/// per CEFR band, non-decreasing A1 through C2.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoveltyConfig {
    pub max_novelty: f64,
    pub target_by_band: [f64; 6],
}

impl NoveltyConfig {
    pub fn target_for(&self, band: CefrBand) -> f64 {
        self.target_by_band[band.index()]
    }
}

impl Default for NoveltyConfig {
    fn default() -> Self {
        Self {
            max_novelty: 0.30,
            target_by_band: [0.08, 0.10, 0.13, 0.16, 0.19, 0.22],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelMatchConfig {
    /// Score lost per band of distance between item and learner.
    pub penalty_per_band: f64,
}

impl Default for LevelMatchConfig {
    fn default() -> Self {
        Self {
            penalty_per_band: 0.25,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecencyConfig {
    /// Decay time constant in hours (`exp(-age / decay_hours)`).
    pub decay_hours: f64,
}

impl Default for RecencyConfig {
    fn default() -> Self {
        Self { decay_hours: 24.0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SrsConfig {
    pub min_easiness: f64,
    pub max_easiness: f64,
    pub first_interval_days: u32,
    pub second_interval_days: u32,
    /// Intervals beyond this classify a card as mature (reporting only).
    pub mature_interval_days: u32,
    /// Due cards merged into a single feed page; a deliberate anti-spam
    /// policy, not a technical limitation.
    pub due_card_cap: usize,
}

impl Default for SrsConfig {
    fn default() -> Self {
        Self {
            min_easiness: 1.3,
            max_easiness: 2.5,
            first_interval_days: 1,
            second_interval_days: 6,
            mature_interval_days: 21,
            due_card_cap: constants::DEFAULT_DUE_CARD_CAP,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiversityConfig {
    /// Sliding window of emitted items inspected for repeats.
    pub window_size: usize,
    /// Occurrences of a (source, category) key tolerated per window.
    pub max_per_window: usize,
}

impl Default for DiversityConfig {
    fn default() -> Self {
        Self {
            window_size: 10,
            max_per_window: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedConfig {
    /// Comprehension filter: minimum known-vocabulary fraction.
    pub coverage_cutoff: f64,
    pub candidate_limit: usize,
    pub upstream_timeout_ms: u64,
    pub profile_cache_ttl_secs: u64,
    pub engagement_history_cap: usize,
    /// Content types considered when deriving preferred-type priors.
    pub preferred_type_count: usize,
    /// Engagement prior assigned to items of a preferred content type.
    pub preferred_type_prior: f64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            coverage_cutoff: constants::DEFAULT_COVERAGE_CUTOFF,
            candidate_limit: constants::DEFAULT_CANDIDATE_LIMIT,
            upstream_timeout_ms: constants::DEFAULT_UPSTREAM_TIMEOUT_MS,
            profile_cache_ttl_secs: constants::DEFAULT_PROFILE_CACHE_TTL_SECS,
            engagement_history_cap: constants::ENGAGEMENT_HISTORY_CAP,
            preferred_type_count: 3,
            preferred_type_prior: 0.65,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    pub scoring: ScoringWeights,
    pub coverage: CoverageConfig,
    pub novelty: NoveltyConfig,
    pub level_match: LevelMatchConfig,
    pub recency: RecencyConfig,
    pub srs: SrsConfig,
    pub diversity: DiversityConfig,
    pub feed: FeedConfig,
}

impl EngineConfig {
    /// Applies environment overrides on top of defaults.
    pub fn from_env_config(env: &crate::config::FeedEnvConfig) -> Self {
        let mut config = Self::default();
        config.feed.candidate_limit = env.candidate_limit;
        config.feed.upstream_timeout_ms = env.upstream_timeout_ms;
        config.feed.profile_cache_ttl_secs = env.profile_cache_ttl_secs;
        config.feed.coverage_cutoff = env.coverage_cutoff;
        config
    }

    pub fn validate(&self) -> Result<(), String> {
        let w = &self.scoring;
        for (name, value) in [
            ("scoring.coverage", w.coverage),
            ("scoring.noveltyFit", w.novelty_fit),
            ("scoring.levelMatch", w.level_match),
            ("scoring.interestAlignment", w.interest_alignment),
            ("scoring.recency", w.recency),
            ("scoring.srsFocus", w.srs_focus),
            ("scoring.engagementPrediction", w.engagement_prediction),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{name} must be in [0,1]"));
            }
        }
        if (w.sum() - 1.0).abs() > 0.01 {
            return Err("scoring weights must sum to 1.0".to_string());
        }

        if !(0.0..=1.0).contains(&self.novelty.max_novelty) {
            return Err("novelty.maxNovelty must be in [0,1]".to_string());
        }
        for pair in self.novelty.target_by_band.windows(2) {
            if pair[1] < pair[0] {
                return Err("novelty.targetByBand must be non-decreasing".to_string());
            }
        }
        for target in &self.novelty.target_by_band {
            if !(0.0..=self.novelty.max_novelty).contains(target) {
                return Err("novelty targets must be within [0, maxNovelty]".to_string());
            }
        }

        if self.srs.min_easiness >= self.srs.max_easiness {
            return Err("srs.minEasiness must be below srs.maxEasiness".to_string());
        }
        if self.srs.first_interval_days == 0 || self.srs.second_interval_days == 0 {
            return Err("srs intervals must be at least 1 day".to_string());
        }
        if self.srs.due_card_cap == 0 {
            return Err("srs.dueCardCap must be at least 1".to_string());
        }

        if self.diversity.window_size == 0 || self.diversity.max_per_window == 0 {
            return Err("diversity window parameters must be at least 1".to_string());
        }

        if !(0.0..=1.0).contains(&self.feed.coverage_cutoff) {
            return Err("feed.coverageCutoff must be in [0,1]".to_string());
        }
        if self.feed.candidate_limit == 0 {
            return Err("feed.candidateLimit must be at least 1".to_string());
        }
        if self.coverage.rare_rank_threshold == 0 {
            return Err("coverage.rareRankThreshold must be at least 1".to_string());
        }

        Ok(())
    }
}
