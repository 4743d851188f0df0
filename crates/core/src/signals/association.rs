//! Co-purchase association mining
//!
//! Counts how many baskets each unordered item pair shares and keeps the pairs
//! whose support reaches the configured minimum. Mining enumerates every
//! 2-combination per basket, so the cost is O(sum of basket_size^2). That is
//! fine for grocery-sized baskets; baskets with hundreds of distinct items
//! need an itemset-lattice miner instead.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::domain::{Basket, ItemId, TransactionRecord};
use crate::store::group_baskets;

/// Unordered item pair stored with the smaller id first.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PairKey {
    low: ItemId,
    high: ItemId,
}

impl PairKey {
    /// `None` when both sides are the same item.
    pub fn new(a: ItemId, b: ItemId) -> Option<Self> {
        match a.cmp(&b) {
            std::cmp::Ordering::Less => Some(Self { low: a, high: b }),
            std::cmp::Ordering::Greater => Some(Self { low: b, high: a }),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub fn low(&self) -> &ItemId {
        &self.low
    }

    pub fn high(&self) -> &ItemId {
        &self.high
    }

    pub fn contains(&self, item: &ItemId) -> bool {
        &self.low == item || &self.high == item
    }

    /// The other side of the pair, if `item` is one of its members.
    pub fn partner_of(&self, item: &ItemId) -> Option<&ItemId> {
        if &self.low == item {
            Some(&self.high)
        } else if &self.high == item {
            Some(&self.low)
        } else {
            None
        }
    }
}

/// Pair support counts that met the minimum support when mined.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PairIndex {
    min_support: u32,
    counts: BTreeMap<PairKey, u32>,
    partners: BTreeMap<ItemId, BTreeSet<ItemId>>,
}

impl PairIndex {
    pub fn from_counts(counts: BTreeMap<PairKey, u32>, min_support: u32) -> Self {
        let counts: BTreeMap<PairKey, u32> =
            counts.into_iter().filter(|(_, count)| *count >= min_support).collect();

        let mut partners: BTreeMap<ItemId, BTreeSet<ItemId>> = BTreeMap::new();
        for key in counts.keys() {
            partners.entry(key.low.clone()).or_default().insert(key.high.clone());
            partners.entry(key.high.clone()).or_default().insert(key.low.clone());
        }

        Self { min_support, counts, partners }
    }

    pub fn min_support(&self) -> u32 {
        self.min_support
    }

    pub fn support(&self, a: &ItemId, b: &ItemId) -> u32 {
        PairKey::new(a.clone(), b.clone())
            .and_then(|key| self.counts.get(&key).copied())
            .unwrap_or(0)
    }

    /// Items that co-occur with `item` at or above minimum support.
    pub fn partners(&self, item: &ItemId) -> impl Iterator<Item = &ItemId> {
        self.partners.get(item).into_iter().flatten()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PairKey, u32)> {
        self.counts.iter().map(|(key, count)| (key, *count))
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

pub fn build_pairs(transactions: &[TransactionRecord], min_support: u32) -> PairIndex {
    let baskets = group_baskets(transactions);
    build_pairs_from_baskets(baskets.values(), min_support)
}

pub fn build_pairs_from_baskets<'a>(
    baskets: impl IntoIterator<Item = &'a Basket>,
    min_support: u32,
) -> PairIndex {
    let mut counts: BTreeMap<PairKey, u32> = BTreeMap::new();

    for basket in baskets {
        let items = basket.sorted_items();
        for (position, low) in items.iter().enumerate() {
            for high in &items[position + 1..] {
                let key = PairKey { low: low.clone(), high: high.clone() };
                *counts.entry(key).or_insert(0) += 1;
            }
        }
    }

    PairIndex::from_counts(counts, min_support)
}

/// Complements of the basket contents, unioned across basket items and with
/// basket items themselves left out.
pub fn suggest(basket: &Basket, pairs: &PairIndex) -> BTreeSet<ItemId> {
    basket
        .iter()
        .flat_map(|item| pairs.partners(item))
        .filter(|partner| !basket.contains(partner))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::{build_pairs, build_pairs_from_baskets, suggest, PairKey};
    use crate::domain::{Basket, ItemId, TransactionRecord};

    fn sales(baskets: &[(&str, &[&str])]) -> Vec<TransactionRecord> {
        let date = NaiveDate::from_ymd_opt(2023, 1, 1).expect("valid date");
        baskets
            .iter()
            .flat_map(|(transaction, items)| {
                items.iter().map(move |item| {
                    TransactionRecord::new(*transaction, date, *item, 1, Decimal::ONE)
                })
            })
            .collect()
    }

    #[test]
    fn pair_key_orders_smaller_id_first() {
        let key = PairKey::new(ItemId::from("Y"), ItemId::from("X")).expect("distinct items");

        assert_eq!(key.low(), &ItemId::from("X"));
        assert_eq!(key.high(), &ItemId::from("Y"));
        assert_eq!(key.partner_of(&ItemId::from("X")), Some(&ItemId::from("Y")));
        assert!(PairKey::new(ItemId::from("X"), ItemId::from("X")).is_none());
    }

    #[test]
    fn only_pairs_meeting_min_support_survive() {
        let transactions = sales(&[("t1", &["X", "Y"]), ("t2", &["X", "Y"]), ("t3", &["X", "Z"])]);

        let pairs = build_pairs(&transactions, 2);

        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs.support(&ItemId::from("X"), &ItemId::from("Y")), 2);
        assert_eq!(pairs.support(&ItemId::from("Y"), &ItemId::from("X")), 2);
        assert_eq!(pairs.support(&ItemId::from("X"), &ItemId::from("Z")), 0);

        let suggestions = suggest(&Basket::new(["X"]), &pairs);
        assert_eq!(suggestions, BTreeSet::from([ItemId::from("Y")]));
    }

    #[test]
    fn mining_ignores_item_order_within_a_basket() {
        let forward = build_pairs_from_baskets([&Basket::new(["A", "B", "C"])], 1);
        let backward = build_pairs_from_baskets([&Basket::new(["C", "A", "B"])], 1);

        assert_eq!(forward, backward);
        assert_eq!(forward.len(), 3);
    }

    #[test]
    fn repeated_lines_in_one_transaction_count_once() {
        let transactions = sales(&[("t1", &["X", "Y", "Y", "X"])]);

        let pairs = build_pairs(&transactions, 1);
        assert_eq!(pairs.support(&ItemId::from("X"), &ItemId::from("Y")), 1);
    }

    #[test]
    fn suggestions_are_unioned_and_exclude_basket_items() {
        let transactions = sales(&[
            ("t1", &["A", "B", "C"]),
            ("t2", &["A", "B", "C"]),
            ("t3", &["B", "D"]),
            ("t4", &["B", "D"]),
        ]);
        let pairs = build_pairs(&transactions, 2);

        let suggestions = suggest(&Basket::new(["A", "B"]), &pairs);

        assert_eq!(suggestions, BTreeSet::from([ItemId::from("C"), ItemId::from("D")]));
    }

    #[test]
    fn unknown_basket_item_suggests_nothing() {
        let pairs = build_pairs(&sales(&[("t1", &["A", "B"])]), 1);

        assert!(suggest(&Basket::new(["NEW"]), &pairs).is_empty());
    }
}
