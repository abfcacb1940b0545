//! Collaborator seams. The engine owns none of this data; it talks to the
//! content aggregator, profile service, card store, and analytics pipeline
//! through these traits so callers can wire in real backends or the bundled
//! in-memory implementation.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

use crate::error::EngineError;
use crate::types::{ContentItem, EngagementEvent, LearnerProfile, VocabularyCard};

pub use memory::InMemoryStore;

/// Upstream content aggregator.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Fetches up to `limit` candidate items for ranking. Order is not
    /// meaningful; the scorer establishes it.
    async fn fetch_candidates(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<ContentItem>, EngineError>;
}

/// Learner profile persistence.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn load_profile(&self, user_id: &str) -> Result<Option<LearnerProfile>, EngineError>;

    async fn save_profile(&self, profile: &LearnerProfile) -> Result<(), EngineError>;

    /// The learner's known-word set, however the backend derives it
    /// (explicit marks, graduated cards, or both).
    async fn load_known_words(&self, user_id: &str) -> Result<HashSet<String>, EngineError>;
}

/// Vocabulary card persistence.
#[async_trait]
pub trait CardStore: Send + Sync {
    async fn load_card(
        &self,
        user_id: &str,
        card_id: &str,
    ) -> Result<Option<VocabularyCard>, EngineError>;

    async fn save_card(&self, card: &VocabularyCard) -> Result<(), EngineError>;

    async fn load_due_cards(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<VocabularyCard>, EngineError>;

    async fn load_all_cards(&self, user_id: &str) -> Result<Vec<VocabularyCard>, EngineError>;
}

/// Downstream analytics sink. Impression recording is fire-and-forget from
/// the feed path; failures here never fail a feed.
#[async_trait]
pub trait EngagementSink: Send + Sync {
    async fn record_impressions(
        &self,
        user_id: &str,
        content_ids: &[String],
        at: DateTime<Utc>,
    ) -> Result<(), EngineError>;

    async fn record_engagement(
        &self,
        user_id: &str,
        event: &EngagementEvent,
    ) -> Result<(), EngineError>;
}
