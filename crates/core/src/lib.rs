pub mod config;
pub mod domain;
pub mod engine;
pub mod errors;
pub mod signals;
pub mod store;

pub use domain::{Basket, CatalogItem, ItemId, TransactionId, TransactionRecord, UserHistory};
pub use engine::{
    EngineResult, RecommendationConfig, RecommendationResult, RefreshedIndices, SmartCartEngine,
};
pub use errors::{ApplicationError, EngineError};
pub use signals::{PairIndex, PairKey, ScoredItem, SimilarityAxis, SimilarityMatrix};
pub use store::TransactionStore;
