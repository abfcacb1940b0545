use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// CEFR proficiency bands on an ordinal A1..C2 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CefrBand {
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
}

impl CefrBand {
    pub const ALL: [CefrBand; 6] = [
        CefrBand::A1,
        CefrBand::A2,
        CefrBand::B1,
        CefrBand::B2,
        CefrBand::C1,
        CefrBand::C2,
    ];

    pub fn index(self) -> usize {
        match self {
            Self::A1 => 0,
            Self::A2 => 1,
            Self::B1 => 2,
            Self::B2 => 3,
            Self::C1 => 4,
            Self::C2 => 5,
        }
    }

    /// Band at `index`, clamped to the valid range.
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index.min(Self::ALL.len() - 1)]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::A1 => "A1",
            Self::A2 => "A2",
            Self::B1 => "B1",
            Self::B2 => "B2",
            Self::C1 => "C1",
            Self::C2 => "C2",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "A1" => Some(Self::A1),
            "A2" => Some(Self::A2),
            "B1" => Some(Self::B1),
            "B2" => Some(Self::B2),
            "C1" => Some(Self::C1),
            "C2" => Some(Self::C2),
            _ => None,
        }
    }

    /// Signed ordinal distance `self - other`.
    pub fn delta(self, other: CefrBand) -> i32 {
        self.index() as i32 - other.index() as i32
    }
}

/// One entry of the static frequency corpus.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrequencyEntry {
    pub word: String,
    pub rank: u32,
    pub band: CefrBand,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementEvent {
    pub content_id: String,
    pub content_type: String,
    pub shown_at: DateTime<Utc>,
    pub engaged: bool,
    pub engagement_type: Option<String>,
    pub engaged_at: Option<DateTime<Utc>>,
}

impl EngagementEvent {
    pub fn shown(content_id: &str, content_type: &str, at: DateTime<Utc>) -> Self {
        Self {
            content_id: content_id.to_string(),
            content_type: content_type.to_string(),
            shown_at: at,
            engaged: false,
            engagement_type: None,
            engaged_at: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnerProfile {
    pub user_id: String,
    pub cefr_level: CefrBand,
    pub known_words: HashSet<String>,
    pub interest_tags: HashSet<String>,
    pub recent_mistakes: Vec<String>,
    pub engagement_history: Vec<EngagementEvent>,
    pub last_active_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl LearnerProfile {
    /// Profile used for a learner seen for the first time.
    pub fn new(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            cefr_level: CefrBand::A2,
            known_words: HashSet::new(),
            interest_tags: HashSet::new(),
            recent_mistakes: Vec::new(),
            engagement_history: Vec::new(),
            last_active_at: None,
            created_at: Utc::now(),
        }
    }
}

/// A candidate item produced by the external aggregator. Read-only to the
/// engine; optional fields are modeled explicitly rather than duck-typed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub id: String,
    pub content_type: String,
    pub title: String,
    pub text: String,
    #[serde(default)]
    pub tags: HashSet<String>,
    pub target_level: Option<CefrBand>,
    pub source: String,
    pub category: String,
    pub published_at: Option<DateTime<Utc>>,
    /// Unknown words precomputed by the aggregator, if available.
    #[serde(default)]
    pub unknown_words: Option<Vec<String>>,
    /// Coverage precomputed by the aggregator, if available.
    #[serde(default)]
    pub coverage: Option<f64>,
}

/// Per-factor contributions of a composite score, each normalized to [0,1]
/// before weighting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub coverage: f64,
    pub novelty_fit: f64,
    pub level_match: f64,
    pub interest_alignment: f64,
    pub recency: f64,
    pub srs_focus: f64,
    pub engagement_prediction: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredItem {
    pub item: ContentItem,
    pub score: f64,
    pub score_breakdown: ScoreBreakdown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyCard {
    pub id: String,
    pub user_id: String,
    pub word: String,
    pub translation: String,
    pub context: Option<String>,
    pub easiness_factor: f64,
    pub interval_days: u32,
    pub repetitions: u32,
    pub next_review_at: DateTime<Utc>,
    pub last_reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl VocabularyCard {
    /// Card created when a learner saves a new word; due immediately.
    pub fn new(user_id: &str, word: &str, translation: &str, context: Option<&str>) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            word: word.to_string(),
            translation: translation.to_string(),
            context: context.map(str::to_string),
            easiness_factor: 2.5,
            interval_days: 1,
            repetitions: 0,
            next_review_at: now,
            last_reviewed_at: None,
            created_at: now,
        }
    }
}

/// Lifecycle phase of a vocabulary card. `Mature` is a classification for
/// reporting, not stored state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardPhase {
    New,
    Learning,
    Review,
    Mature,
}

/// Review pseudo-item interleaved into the feed for a due card.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewCardItem {
    pub card_id: String,
    pub word: String,
    pub translation: String,
    pub context: Option<String>,
    pub next_review_at: DateTime<Utc>,
    pub interval_days: u32,
    /// Always above any content score; due cards bypass the page limit.
    pub priority: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FeedItem {
    Content(ScoredItem),
    Review(ReviewCardItem),
}

impl FeedItem {
    pub fn content_id(&self) -> &str {
        match self {
            Self::Content(scored) => &scored.item.id,
            Self::Review(review) => &review.card_id,
        }
    }

    pub fn is_review(&self) -> bool {
        matches!(self, Self::Review(_))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPage {
    pub items: Vec<FeedItem>,
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub has_more: bool,
}

impl FeedPage {
    /// An empty feed is a valid, observable state, not a failure.
    pub fn empty(page: u64, limit: u64) -> Self {
        Self {
            items: Vec::new(),
            page,
            limit,
            total: 0,
            has_more: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedOptions {
    pub page: u64,
    pub limit: u64,
    pub level: Option<CefrBand>,
    pub interests: Option<Vec<String>>,
    pub include_reviews: bool,
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self {
            page: 1,
            limit: crate::constants::DEFAULT_PAGE_SIZE,
            level: None,
            interests: None,
            include_reviews: true,
        }
    }
}

/// Externally supplied ranking signals. The engine treats these as inputs,
/// never something it computes itself.
#[derive(Debug, Clone, Default)]
pub struct ScoreSignals {
    /// Engagement prior per content type; absent types score a neutral 0.5.
    pub engagement_priors: std::collections::HashMap<String, f64>,
}

/// Validated recall quality on the SM-2 0..5 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewQuality(u8);

impl ReviewQuality {
    /// Rejects out-of-range ratings instead of clamping; silent clamping
    /// would corrupt the learning signal.
    pub fn new(raw: i32) -> Result<Self, crate::error::EngineError> {
        if !(0..=5).contains(&raw) {
            return Err(crate::error::EngineError::validation(format!(
                "quality must be between 0 and 5, got {raw}"
            )));
        }
        Ok(Self(raw as u8))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Whether the rating counts as a successful recall.
    pub fn is_correct(self) -> bool {
        self.0 >= 3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_ordering_is_ordinal() {
        assert!(CefrBand::A1 < CefrBand::C2);
        assert_eq!(CefrBand::B2.delta(CefrBand::A2), 2);
        assert_eq!(CefrBand::A1.delta(CefrBand::B1), -2);
        assert_eq!(CefrBand::from_index(99), CefrBand::C2);
    }

    #[test]
    fn band_parse_is_case_insensitive() {
        assert_eq!(CefrBand::parse("b1"), Some(CefrBand::B1));
        assert_eq!(CefrBand::parse(" C2 "), Some(CefrBand::C2));
        assert_eq!(CefrBand::parse("D1"), None);
    }

    #[test]
    fn default_profile_starts_at_a2() {
        let profile = LearnerProfile::new("u1");
        assert_eq!(profile.cefr_level, CefrBand::A2);
        assert!(profile.known_words.is_empty());
        assert!(profile.interest_tags.is_empty());
    }

    #[test]
    fn new_card_is_due_immediately() {
        let card = VocabularyCard::new("u1", "hola", "hello", None);
        assert_eq!(card.repetitions, 0);
        assert_eq!(card.interval_days, 1);
        assert!((card.easiness_factor - 2.5).abs() < f64::EPSILON);
        assert!(card.next_review_at <= Utc::now());
    }

    #[test]
    fn quality_rejects_out_of_range() {
        assert!(ReviewQuality::new(-1).is_err());
        assert!(ReviewQuality::new(6).is_err());
        assert!(ReviewQuality::new(0).is_ok());
        assert!(ReviewQuality::new(5).unwrap().is_correct());
        assert!(!ReviewQuality::new(2).unwrap().is_correct());
    }

    #[test]
    fn serde_uses_camel_case() {
        let profile = LearnerProfile::new("u1");
        let json = serde_json::to_value(&profile).unwrap();
        assert!(json.get("userId").is_some());
        assert!(json.get("cefrLevel").is_some());
        assert!(json.get("knownWords").is_some());
    }
}
