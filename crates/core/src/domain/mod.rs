pub mod item;
pub mod transaction;

pub use item::{CatalogItem, ItemId};
pub use transaction::{Basket, TransactionId, TransactionRecord, UserHistory};
