//! Types for the recommendation engine

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{CatalogItem, ItemId};
use crate::errors::EngineError;
use crate::signals::{
    PairIndex, SimilarityAxis, SimilarityMatrix, DEFAULT_HABIT_THRESHOLD, DEFAULT_MIN_SUPPORT,
    DEFAULT_TOP_N,
};

/// Tuning knobs shared by refresh and request serving
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationConfig {
    /// Shared baskets required before a pair is suggested
    pub min_support: u32,
    /// Purchases required before an item is treated as a habit
    pub habit_threshold: u32,
    /// Length of the trending ranking
    pub top_n_trending: usize,
    /// Length of the similarity ranking
    pub top_n_similarity: usize,
    /// Column key used when building the similarity matrix
    pub similarity_axis: SimilarityAxis,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            min_support: DEFAULT_MIN_SUPPORT,
            habit_threshold: DEFAULT_HABIT_THRESHOLD,
            top_n_trending: DEFAULT_TOP_N,
            top_n_similarity: DEFAULT_TOP_N,
            similarity_axis: SimilarityAxis::default(),
        }
    }
}

impl RecommendationConfig {
    pub fn with_min_support(mut self, min_support: u32) -> Self {
        self.min_support = min_support;
        self
    }

    pub fn with_habit_threshold(mut self, habit_threshold: u32) -> Self {
        self.habit_threshold = habit_threshold;
        self
    }

    pub fn with_top_n_trending(mut self, top_n: usize) -> Self {
        self.top_n_trending = top_n;
        self
    }

    pub fn with_top_n_similarity(mut self, top_n: usize) -> Self {
        self.top_n_similarity = top_n;
        self
    }

    pub fn with_similarity_axis(mut self, axis: SimilarityAxis) -> Self {
        self.similarity_axis = axis;
        self
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.min_support == 0 {
            return Err(EngineError::InvalidParameter(
                "min_support must be greater than zero".to_owned(),
            ));
        }
        if self.habit_threshold == 0 {
            return Err(EngineError::InvalidParameter(
                "habit_threshold must be greater than zero".to_owned(),
            ));
        }
        Ok(())
    }
}

/// One immutable generation of derived indices.
///
/// Every request served from the same snapshot sees the same pairs,
/// similarity scores, trending ranking and catalog.
#[derive(Clone, Debug)]
pub struct RefreshedIndices {
    epoch: u64,
    built_at: DateTime<Utc>,
    pairs: PairIndex,
    similarity: SimilarityMatrix,
    trending: Vec<ItemId>,
    catalog: Vec<CatalogItem>,
}

impl RefreshedIndices {
    pub(crate) fn new(
        pairs: PairIndex,
        similarity: SimilarityMatrix,
        trending: Vec<ItemId>,
        catalog: Vec<CatalogItem>,
    ) -> Self {
        Self { epoch: 0, built_at: Utc::now(), pairs, similarity, trending, catalog }
    }

    pub(crate) fn with_epoch(mut self, epoch: u64) -> Self {
        self.epoch = epoch;
        self
    }

    /// Generation counter; zero until the snapshot is published by an engine.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    pub fn pairs(&self) -> &PairIndex {
        &self.pairs
    }

    pub fn similarity(&self) -> &SimilarityMatrix {
        &self.similarity
    }

    /// Basket-independent trending ranking cached at refresh time
    pub fn trending(&self) -> &[ItemId] {
        &self.trending
    }

    pub fn catalog(&self) -> &[CatalogItem] {
        &self.catalog
    }
}

/// Labeled output of one recommendation request
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResult {
    /// Snapshot generation the result was computed from
    pub epoch: u64,
    pub habit_reminders: Vec<ItemId>,
    pub pairing_suggestions: BTreeSet<ItemId>,
    pub trending_nudge: Vec<ItemId>,
    pub similarity_recommendations: Vec<ItemId>,
    /// Basket items missing from the catalog, served as cold-start
    pub unknown_items: Vec<ItemId>,
}

impl RecommendationResult {
    /// Every suggested item across the four signals, deduplicated.
    pub fn all_items(&self) -> BTreeSet<&ItemId> {
        self.habit_reminders
            .iter()
            .chain(&self.pairing_suggestions)
            .chain(&self.trending_nudge)
            .chain(&self.similarity_recommendations)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.habit_reminders.is_empty()
            && self.pairing_suggestions.is_empty()
            && self.trending_nudge.is_empty()
            && self.similarity_recommendations.is_empty()
    }
}
