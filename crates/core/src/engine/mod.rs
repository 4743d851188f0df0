//! Smart Cart Recommendation Engine
//!
//! Holds the active snapshot of derived indices and serves requests from it.
//! Refreshes build a new snapshot off to the side and publish it with a single
//! pointer swap, so a reader never sees a half-built index. Requests already
//! in flight finish against the snapshot they started with.

mod aggregator;
mod types;

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{info, warn};

pub use aggregator::{recommend, refresh, refresh_with_axis, validate_basket};
pub use types::{RecommendationConfig, RecommendationResult, RefreshedIndices};

use crate::domain::{Basket, CatalogItem, TransactionRecord, UserHistory};
use crate::errors::EngineError;
use crate::store::TransactionStore;

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Caller-owned snapshot holder with a single-writer refresh cycle
#[derive(Debug)]
pub struct SmartCartEngine {
    config: RecommendationConfig,
    active: RwLock<Option<Arc<RefreshedIndices>>>,
    writer: Mutex<()>,
}

impl SmartCartEngine {
    pub fn new() -> Self {
        Self::with_config(RecommendationConfig::default())
    }

    pub fn with_config(config: RecommendationConfig) -> Self {
        Self { config, active: RwLock::new(None), writer: Mutex::new(()) }
    }

    pub fn config(&self) -> &RecommendationConfig {
        &self.config
    }

    /// The snapshot currently serving requests, if any refresh has succeeded.
    pub fn snapshot(&self) -> Option<Arc<RefreshedIndices>> {
        self.active.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Generation of the active snapshot; zero before the first publish.
    pub fn epoch(&self) -> u64 {
        self.snapshot().map(|snapshot| snapshot.epoch()).unwrap_or(0)
    }

    /// Rebuild and publish. On failure the previous snapshot stays active.
    pub async fn refresh(
        &self,
        transactions: Vec<TransactionRecord>,
        catalog: Vec<CatalogItem>,
    ) -> EngineResult<Arc<RefreshedIndices>> {
        self.refresh_inner(transactions, catalog, None).await
    }

    /// Like [`refresh`](Self::refresh), but gives up once `deadline` passes.
    /// A build that finishes after the deadline is dropped, never published.
    ///
    /// The blocking build itself cannot be cancelled: it runs to completion on
    /// the blocking pool after the writer lock is released, so back-to-back
    /// timeouts can leave several builds running at once.
    pub async fn refresh_with_deadline(
        &self,
        transactions: Vec<TransactionRecord>,
        catalog: Vec<CatalogItem>,
        deadline: Duration,
    ) -> EngineResult<Arc<RefreshedIndices>> {
        self.refresh_inner(transactions, catalog, Some(deadline)).await
    }

    pub async fn refresh_from_store(
        &self,
        store: TransactionStore,
        deadline: Option<Duration>,
    ) -> EngineResult<Arc<RefreshedIndices>> {
        let (transactions, catalog) = store.into_parts();
        self.refresh_inner(transactions, catalog, deadline).await
    }

    async fn refresh_inner(
        &self,
        transactions: Vec<TransactionRecord>,
        catalog: Vec<CatalogItem>,
        deadline: Option<Duration>,
    ) -> EngineResult<Arc<RefreshedIndices>> {
        let _writer = self.writer.lock().await;
        let previous_epoch = self.epoch();

        if let Err(error) = self.config.validate() {
            return Err(self.reject(error, previous_epoch));
        }
        if transactions.is_empty() {
            return Err(self.reject(EngineError::InsufficientData, previous_epoch));
        }

        let min_support = self.config.min_support;
        let top_n_trending = self.config.top_n_trending;
        let axis = self.config.similarity_axis;
        let build = tokio::task::spawn_blocking(move || {
            refresh_with_axis(&transactions, &catalog, min_support, top_n_trending, axis)
        });

        let joined = match deadline {
            Some(deadline) => match tokio::time::timeout(deadline, build).await {
                Ok(joined) => joined,
                Err(_) => {
                    let error = EngineError::RefreshTimeout { deadline_ms: deadline.as_millis() };
                    return Err(self.reject(error, previous_epoch));
                }
            },
            None => build.await,
        };

        let built = match joined {
            Ok(Ok(built)) => built,
            Ok(Err(error)) => return Err(self.reject(error, previous_epoch)),
            Err(join_error) => {
                let error = EngineError::RefreshTask(join_error.to_string());
                return Err(self.reject(error, previous_epoch));
            }
        };

        let snapshot = Arc::new(built.with_epoch(previous_epoch + 1));
        *self.active.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&snapshot));

        info!(
            event_name = "engine.refresh.published",
            epoch = snapshot.epoch(),
            pairs = snapshot.pairs().len(),
            similarity_items = snapshot.similarity().len(),
            catalog_items = snapshot.catalog().len(),
            "snapshot published"
        );

        Ok(snapshot)
    }

    fn reject(&self, error: EngineError, active_epoch: u64) -> EngineError {
        warn!(
            event_name = "engine.refresh.rejected",
            active_epoch,
            error = %error,
            "refresh rejected"
        );
        error
    }

    /// Serve one request from the snapshot active when the call starts.
    pub fn recommend(
        &self,
        history: &UserHistory,
        basket: &Basket,
    ) -> EngineResult<RecommendationResult> {
        let snapshot = self.snapshot().ok_or(EngineError::SnapshotUnavailable)?;
        Ok(recommend(history, basket, &snapshot, snapshot.catalog(), &self.config))
    }

    /// Fails with `UnknownItem` for the first basket item missing from the
    /// active catalog.
    pub fn validate_basket(&self, basket: &Basket) -> EngineResult<()> {
        let snapshot = self.snapshot().ok_or(EngineError::SnapshotUnavailable)?;
        validate_basket(basket, snapshot.catalog())
    }
}

impl Default for SmartCartEngine {
    fn default() -> Self {
        Self::new()
    }
}
