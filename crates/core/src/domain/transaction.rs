use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::item::ItemId;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(pub String);

impl TransactionId {
    /// Basket key used when the source data only knows the sale date.
    pub fn from_date(date: NaiveDate) -> Self {
        Self(date.format("%Y-%m-%d").to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TransactionId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// A single recorded sale line. Records are append-only and never edited.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub transaction_id: TransactionId,
    pub date: NaiveDate,
    pub item_id: ItemId,
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl TransactionRecord {
    pub fn new(
        transaction_id: impl Into<TransactionId>,
        date: NaiveDate,
        item_id: impl Into<ItemId>,
        quantity: u32,
        unit_price: Decimal,
    ) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            date,
            item_id: item_id.into(),
            quantity,
            unit_price,
        }
    }

    /// Daily sales feeds carry no basket id, so every sale on the same date
    /// lands in the same basket.
    pub fn from_daily_sale(
        date: NaiveDate,
        item_id: impl Into<ItemId>,
        quantity: u32,
        unit_price: Decimal,
    ) -> Self {
        Self::new(TransactionId::from_date(date), date, item_id, quantity, unit_price)
    }
}

/// Items bought together in one transaction, in first-seen order with
/// duplicates collapsed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<ItemId>", into = "Vec<ItemId>")]
pub struct Basket {
    items: Vec<ItemId>,
}

impl Basket {
    pub fn new<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ItemId>,
    {
        let mut basket = Self::default();
        for item in items {
            basket.insert(item.into());
        }
        basket
    }

    /// Returns `false` when the item was already present.
    pub fn insert(&mut self, item: ItemId) -> bool {
        if self.contains(&item) {
            return false;
        }
        self.items.push(item);
        true
    }

    pub fn contains(&self, item: &ItemId) -> bool {
        self.items.iter().any(|existing| existing == item)
    }

    pub fn items(&self) -> &[ItemId] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ItemId> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sorted copy of the item set, the canonical form used for pair mining.
    pub fn sorted_items(&self) -> Vec<ItemId> {
        let mut sorted = self.items.clone();
        sorted.sort();
        sorted
    }
}

impl From<Vec<ItemId>> for Basket {
    fn from(items: Vec<ItemId>) -> Self {
        Self::new(items)
    }
}

impl From<Basket> for Vec<ItemId> {
    fn from(basket: Basket) -> Self {
        basket.items
    }
}

impl<'a> IntoIterator for &'a Basket {
    type Item = &'a ItemId;
    type IntoIter = std::slice::Iter<'a, ItemId>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Everything a shopper has bought, oldest first. Repeats are kept.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserHistory(pub Vec<ItemId>);

impl UserHistory {
    pub fn new<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ItemId>,
    {
        Self(items.into_iter().map(Into::into).collect())
    }

    pub fn items(&self) -> &[ItemId] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::{Basket, TransactionId, TransactionRecord};
    use crate::domain::item::ItemId;

    #[test]
    fn basket_collapses_duplicates_and_keeps_first_seen_order() {
        let basket = Basket::new(["B", "A", "B", "C", "A"]);

        assert_eq!(basket.len(), 3);
        assert_eq!(basket.items(), &[ItemId::from("B"), ItemId::from("A"), ItemId::from("C")]);
        assert_eq!(
            basket.sorted_items(),
            vec![ItemId::from("A"), ItemId::from("B"), ItemId::from("C")]
        );
    }

    #[test]
    fn basket_deserialization_collapses_duplicates() {
        let basket: Basket =
            serde_json::from_str(r#"["X", "Y", "X"]"#).expect("basket should deserialize");

        assert_eq!(basket.len(), 2);
        assert!(basket.contains(&ItemId::from("Y")));
    }

    #[test]
    fn daily_sale_uses_iso_date_as_transaction_id() {
        let date = NaiveDate::from_ymd_opt(2023, 1, 2).expect("valid date");
        let record = TransactionRecord::from_daily_sale(date, "SKU0009", 3, Decimal::new(1000, 2));

        assert_eq!(record.transaction_id, TransactionId::from("2023-01-02"));
        assert_eq!(record.item_id, ItemId::from("SKU0009"));
    }
}
