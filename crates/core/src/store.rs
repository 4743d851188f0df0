use std::collections::{BTreeMap, HashMap};

use crate::domain::{Basket, CatalogItem, ItemId, TransactionId, TransactionRecord};

/// In-memory sales history plus item catalog, loaded once per refresh cycle.
#[derive(Clone, Debug, Default)]
pub struct TransactionStore {
    transactions: Vec<TransactionRecord>,
    catalog: Vec<CatalogItem>,
    catalog_index: HashMap<ItemId, usize>,
}

impl TransactionStore {
    pub fn new(transactions: Vec<TransactionRecord>, catalog: Vec<CatalogItem>) -> Self {
        let mut store = Self { transactions, catalog: Vec::new(), catalog_index: HashMap::new() };
        store.replace_catalog(catalog);
        store
    }

    pub fn transactions(&self) -> &[TransactionRecord] {
        &self.transactions
    }

    pub fn catalog(&self) -> &[CatalogItem] {
        &self.catalog
    }

    pub fn append(&mut self, records: impl IntoIterator<Item = TransactionRecord>) {
        self.transactions.extend(records);
    }

    /// Later rows win when the same item id appears twice.
    pub fn replace_catalog(&mut self, catalog: Vec<CatalogItem>) {
        let mut deduped: Vec<CatalogItem> = Vec::with_capacity(catalog.len());
        let mut index = HashMap::with_capacity(catalog.len());
        for item in catalog {
            match index.get(&item.item_id) {
                Some(&position) => deduped[position] = item,
                None => {
                    index.insert(item.item_id.clone(), deduped.len());
                    deduped.push(item);
                }
            }
        }
        self.catalog = deduped;
        self.catalog_index = index;
    }

    pub fn find(&self, item_id: &ItemId) -> Option<&CatalogItem> {
        self.catalog_index.get(item_id).map(|&position| &self.catalog[position])
    }

    pub fn contains(&self, item_id: &ItemId) -> bool {
        self.catalog_index.contains_key(item_id)
    }

    pub fn baskets(&self) -> BTreeMap<TransactionId, Basket> {
        group_baskets(&self.transactions)
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn into_parts(self) -> (Vec<TransactionRecord>, Vec<CatalogItem>) {
        (self.transactions, self.catalog)
    }
}

/// Groups sale lines into baskets keyed by transaction id, ordered by key so
/// iteration is deterministic.
pub fn group_baskets(transactions: &[TransactionRecord]) -> BTreeMap<TransactionId, Basket> {
    let mut baskets: BTreeMap<TransactionId, Basket> = BTreeMap::new();
    for record in transactions {
        baskets.entry(record.transaction_id.clone()).or_default().insert(record.item_id.clone());
    }
    baskets
}
