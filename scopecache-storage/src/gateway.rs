//! Store gateway trait.
//!
//! The gateway is the cache's only view of the persistence engine. It
//! executes queries and writes, and joins the caller's transaction when one
//! is given; it never sees the cache itself.

use async_trait::async_trait;
use scopecache_core::{CacheResult, Criteria, Model, ModelHandle};

use crate::cache::TransactionHandle;

/// Backing store for one model type.
///
/// A database-backed gateway returns a new handle for every row it loads.
/// Failures are reported as `CacheError::Storage`.
#[async_trait]
pub trait StoreGateway<M: Model>: Send + Sync {
    /// Load at most one model matching `criteria`.
    async fn load(
        &self,
        criteria: &Criteria,
        tx: Option<&TransactionHandle>,
    ) -> CacheResult<Option<ModelHandle<M>>>;

    /// Load every model matching `criteria`, in store order.
    async fn load_many(
        &self,
        criteria: &Criteria,
        tx: Option<&TransactionHandle>,
    ) -> CacheResult<Vec<ModelHandle<M>>>;

    /// Write the current state of `model`.
    async fn persist(&self, model: &ModelHandle<M>, tx: Option<&TransactionHandle>) -> CacheResult<()>;
}
