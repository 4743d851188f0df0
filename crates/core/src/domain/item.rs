use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl ItemId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// One row of the item catalog.
///
/// Only a catalog refresh replaces these; the recommendation path reads them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub item_id: ItemId,
    pub unit_price: Decimal,
    /// Expected units sold per day, the ranking key for trending.
    pub baseline_demand: f64,
}

impl CatalogItem {
    pub fn new(item_id: impl Into<ItemId>, unit_price: Decimal, baseline_demand: f64) -> Self {
        Self { item_id: item_id.into(), unit_price, baseline_demand }
    }
}
