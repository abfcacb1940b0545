//! The ranking and scheduling core: frequency data, comprehensibility
//! analysis, composite scoring, SM-2 scheduling, diversity mixing, and the
//! feed assembly pipeline that ties them together.

pub mod assembler;
pub mod config;
pub mod coverage;
pub mod diversity;
pub mod frequency;
pub mod scorer;
pub mod srs;

pub use assembler::FeedAssembler;
pub use config::EngineConfig;
pub use coverage::{CoverageEstimator, CoverageReport};
pub use diversity::DiversityMixer;
pub use frequency::{FrequencyIndex, FrequencyInfo};
pub use scorer::ContentScorer;
pub use srs::{ReviewStats, SpacedRepetitionScheduler};
