//! Personalized language-learning feed engine: ranks candidate content by
//! comprehensibility and relevance for an individual learner and weaves due
//! spaced-repetition reviews into the result.

pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod logging;
pub mod profile_cache;
pub mod store;
pub mod types;
pub mod validation;

pub use engine::{EngineConfig, FeedAssembler};
pub use error::EngineError;
pub use store::{CardStore, ContentSource, EngagementSink, InMemoryStore, ProfileStore};
pub use types::{
    CefrBand, ContentItem, EngagementEvent, FeedItem, FeedOptions, FeedPage, LearnerProfile,
    ReviewQuality, ScoreSignals, ScoredItem, VocabularyCard,
};
