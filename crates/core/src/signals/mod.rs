//! Recommendation signal generators
//!
//! Four independent, pure signals: repeat-purchase habits, co-purchase
//! associations, catalog trending, and item-to-item similarity. None of them
//! fail on empty or cold-start input; an empty result is a valid answer.

pub mod association;
pub mod habit;
pub mod similarity;
pub mod trending;

pub use association::{build_pairs, build_pairs_from_baskets, suggest, PairIndex, PairKey};
pub use habit::reminders;
pub use similarity::{
    build_similarity, build_similarity_with_axis, recommend, recommend_scored, ScoredItem,
    SimilarityAxis, SimilarityMatrix,
};
pub use trending::trending;

/// Minimum number of shared baskets for a pair to be kept
pub const DEFAULT_MIN_SUPPORT: u32 = 2;

/// Purchases needed before an item counts as a habit
pub const DEFAULT_HABIT_THRESHOLD: u32 = 2;

/// Length of the trending and similarity lists
pub const DEFAULT_TOP_N: usize = 5;
