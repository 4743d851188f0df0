//! Catalog-wide demand ranking

use crate::domain::{CatalogItem, ItemId};

/// Top `top_n` catalog items by descending baseline demand, ties by ascending
/// item id. Independent of any basket so the ranking can be cached per epoch.
pub fn trending(catalog: &[CatalogItem], top_n: usize) -> Vec<ItemId> {
    let mut ranked: Vec<&CatalogItem> = catalog.iter().collect();
    ranked.sort_by(|a, b| {
        b.baseline_demand.total_cmp(&a.baseline_demand).then_with(|| a.item_id.cmp(&b.item_id))
    });
    ranked.into_iter().take(top_n).map(|item| item.item_id.clone()).collect()
}
