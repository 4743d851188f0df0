//! Combines the four signals into one labeled result

use std::collections::HashSet;

use tracing::debug;

use super::types::{RecommendationConfig, RecommendationResult, RefreshedIndices};
use crate::domain::{Basket, CatalogItem, ItemId, TransactionRecord, UserHistory};
use crate::errors::EngineError;
use crate::signals::{self, SimilarityAxis};

/// Rebuilds the pair index, similarity matrix and trending ranking.
///
/// The result is unpublished (epoch 0); publishing is the engine's job.
pub fn refresh(
    transactions: &[TransactionRecord],
    catalog: &[CatalogItem],
    min_support: u32,
    top_n_trending: usize,
) -> Result<RefreshedIndices, EngineError> {
    refresh_with_axis(transactions, catalog, min_support, top_n_trending, SimilarityAxis::default())
}

pub fn refresh_with_axis(
    transactions: &[TransactionRecord],
    catalog: &[CatalogItem],
    min_support: u32,
    top_n_trending: usize,
    axis: SimilarityAxis,
) -> Result<RefreshedIndices, EngineError> {
    if transactions.is_empty() {
        return Err(EngineError::InsufficientData);
    }
    if min_support == 0 {
        return Err(EngineError::InvalidParameter(
            "min_support must be greater than zero".to_owned(),
        ));
    }

    let pairs = signals::build_pairs(transactions, min_support);
    let similarity = signals::build_similarity_with_axis(transactions, axis);
    let trending = signals::trending(catalog, top_n_trending);

    debug!(
        event_name = "engine.refresh.built",
        transactions = transactions.len(),
        catalog_items = catalog.len(),
        pairs = pairs.len(),
        similarity_items = similarity.len(),
        "derived indices rebuilt"
    );

    Ok(RefreshedIndices::new(pairs, similarity, trending, catalog.to_vec()))
}

/// Runs every signal against `indices` and strips basket items from all of
/// them. Never fails: unknown basket items are reported in the result and
/// otherwise treated as cold-start.
pub fn recommend(
    history: &UserHistory,
    basket: &Basket,
    indices: &RefreshedIndices,
    catalog: &[CatalogItem],
    config: &RecommendationConfig,
) -> RecommendationResult {
    let known = catalog_ids(catalog);
    let unknown_items: Vec<ItemId> =
        basket.iter().filter(|item| !known.contains(item)).cloned().collect();
    if !unknown_items.is_empty() {
        debug!(
            event_name = "engine.recommend.unknown_items",
            epoch = indices.epoch(),
            unknown = unknown_items.len(),
            "basket contains items missing from the catalog"
        );
    }

    let mut habit_reminders = signals::reminders(history, basket, config.habit_threshold);
    let mut pairing_suggestions = signals::suggest(basket, indices.pairs());
    let mut trending_nudge: Vec<ItemId> =
        indices.trending().iter().take(config.top_n_trending).cloned().collect();
    let mut similarity_recommendations =
        signals::recommend(indices.similarity(), basket, config.top_n_similarity);

    habit_reminders.retain(|item| !basket.contains(item));
    pairing_suggestions.retain(|item| !basket.contains(item));
    trending_nudge.retain(|item| !basket.contains(item));
    similarity_recommendations.retain(|item| !basket.contains(item));

    RecommendationResult {
        epoch: indices.epoch(),
        habit_reminders,
        pairing_suggestions,
        trending_nudge,
        similarity_recommendations,
        unknown_items,
    }
}

/// Strict pre-check for callers that reject unknown basket items outright.
pub fn validate_basket(basket: &Basket, catalog: &[CatalogItem]) -> Result<(), EngineError> {
    let known = catalog_ids(catalog);
    match basket.iter().find(|item| !known.contains(item)) {
        Some(item_id) => Err(EngineError::UnknownItem { item_id: item_id.clone() }),
        None => Ok(()),
    }
}

fn catalog_ids(catalog: &[CatalogItem]) -> HashSet<&ItemId> {
    catalog.iter().map(|item| &item.item_id).collect()
}
