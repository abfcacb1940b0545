/// Default feed page size.
pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// Maximum feed page size.
pub const MAX_PAGE_SIZE: u64 = 100;

/// Upper bound on candidate items requested from the aggregator per feed.
pub const DEFAULT_CANDIDATE_LIMIT: usize = 100;

/// Maximum due review cards merged into a single feed page.
pub const DEFAULT_DUE_CARD_CAP: usize = 5;

/// Comprehension filter threshold (fraction of known vocabulary).
pub const DEFAULT_COVERAGE_CUTOFF: f64 = 0.85;

/// Frequency rank below which a word counts as known regardless of history.
pub const DEFAULT_FREE_VOCABULARY_RANK: u32 = 500;

/// Frequency rank above which a word counts as rare for CEFR estimation.
pub const DEFAULT_RARE_RANK_THRESHOLD: u32 = 2000;

/// Rank assigned to words absent from the frequency corpus.
pub const BEYOND_CORPUS_RANK: u32 = 10_001;

/// Maximum unknown words reported per coverage analysis.
pub const MAX_UNKNOWN_WORDS: usize = 20;

/// Internal priority carried by review pseudo-items; above any content
/// score so pagination never silently drops a due review.
pub const REVIEW_ITEM_PRIORITY: f64 = 2.0;

/// Engagement history entries kept per learner profile.
pub const ENGAGEMENT_HISTORY_CAP: usize = 100;

/// Candidate count above which scoring switches to the parallel map.
pub const PARALLEL_SCORE_THRESHOLD: usize = 32;

/// Default timeout for a single collaborator call (milliseconds).
pub const DEFAULT_UPSTREAM_TIMEOUT_MS: u64 = 2_000;

/// Default learner profile cache TTL (seconds).
pub const DEFAULT_PROFILE_CACHE_TTL_SECS: u64 = 1_800;

/// Profile cache size above which expired entries are pruned on insert.
pub const PROFILE_CACHE_PRUNE_THRESHOLD: usize = 1_000;
