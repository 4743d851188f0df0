//! Repeat-purchase reminders

use std::collections::HashMap;

use crate::domain::{Basket, ItemId, UserHistory};

/// Items the shopper keeps buying that are missing from the current basket.
///
/// Ordered by descending purchase count; ties keep the order in which the
/// items first appear in `history`.
pub fn reminders(history: &UserHistory, basket: &Basket, threshold: u32) -> Vec<ItemId> {
    let mut counts: HashMap<&ItemId, (u32, usize)> = HashMap::new();
    for (position, item) in history.items().iter().enumerate() {
        counts.entry(item).or_insert((0, position)).0 += 1;
    }

    let mut frequent: Vec<(&ItemId, u32, usize)> = counts
        .into_iter()
        .filter(|(item, (count, _))| *count >= threshold && !basket.contains(item))
        .map(|(item, (count, first_seen))| (item, count, first_seen))
        .collect();

    frequent.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.2.cmp(&b.2)));
    frequent.into_iter().map(|(item, _, _)| item.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::reminders;
    use crate::domain::{Basket, ItemId, UserHistory};

    fn ids(values: &[&str]) -> Vec<ItemId> {
        values.iter().map(|value| ItemId::from(*value)).collect()
    }

    #[test]
    fn repeated_item_outside_basket_is_reminded() {
        let history = UserHistory::new(["X", "X", "X", "Y"]);
        let basket = Basket::new(["Y"]);

        assert_eq!(reminders(&history, &basket, 2), ids(&["X"]));
    }

    #[test]
    fn higher_counts_come_first_and_ties_keep_first_occurrence() {
        let history = UserHistory::new(["B", "A", "C", "A", "B", "C", "C"]);

        assert_eq!(reminders(&history, &Basket::default(), 2), ids(&["C", "B", "A"]));
    }

    #[test]
    fn basket_items_are_never_reminded() {
        let history = UserHistory::new(["SKU0009", "SKU0009", "SKU0012", "SKU0012", "SKU0012", "SKU0034"]);
        let basket = Basket::new(["SKU0009", "SKU0034"]);

        let result = reminders(&history, &basket, 1);
        assert_eq!(result, ids(&["SKU0012"]));
        assert!(result.iter().all(|item| !basket.contains(item)));
    }

    #[test]
    fn empty_history_yields_nothing() {
        assert!(reminders(&UserHistory::default(), &Basket::new(["A"]), 2).is_empty());
    }
}
