//! Synchronization between a scope's cache and the backing store.

use std::sync::Arc;

use scopecache_core::{CacheError, CacheResult, Criteria, Model, ModelHandle, ModelId};

use crate::cache::{guard, ModelCache, ScopeContext};
use crate::gateway::StoreGateway;
use crate::policy::ErrorPolicy;

/// One failed entity (or a failed bulk call when `id` is `None`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncFailure {
    pub id: Option<ModelId>,
    pub error: CacheError,
}

/// Outcome of a bulk load or flush.
///
/// Only ever carries failures under [`ErrorPolicy::Swallow`]; under
/// `Surface` the first failure is returned as an error instead.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Entities the operation tried to cache or persist.
    pub attempted: usize,
    pub succeeded: usize,
    pub failures: Vec<SyncFailure>,
}

impl SyncReport {
    /// Aggregate success flag: `false` if anything failed.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    fn record(
        &mut self,
        id: Option<ModelId>,
        error: CacheError,
        policy: ErrorPolicy,
        operation: &'static str,
    ) -> CacheResult<()> {
        if policy.surfaces() {
            return Err(error);
        }
        match id {
            Some(id) => tracing::warn!(error = %error, id = %id, operation, "Entity sync failed, continuing"),
            None => tracing::error!(error = %error, operation, "Store call failed"),
        }
        self.failures.push(SyncFailure { id, error });
        Ok(())
    }
}

/// Moves models between one kind's cache and its store gateway.
///
/// Every store call joins the transaction attached to the scope, if any.
pub struct Synchronizer<M, G> {
    cache: ModelCache<M>,
    gateway: Arc<G>,
}

impl<M, G> Clone for Synchronizer<M, G> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache,
            gateway: Arc::clone(&self.gateway),
        }
    }
}

impl<M: Model, G: StoreGateway<M>> Synchronizer<M, G> {
    pub fn new(cache: ModelCache<M>, gateway: Arc<G>) -> Self {
        Self { cache, gateway }
    }

    pub fn cache(&self) -> ModelCache<M> {
        self.cache
    }

    pub fn gateway(&self) -> &Arc<G> {
        &self.gateway
    }

    /// Load every model matching `criteria` and cache each one.
    ///
    /// Models whose id is already cached are skipped and the cached instance
    /// kept, so repeating a load is harmless.
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(kind = %self.cache.kind(), scope = %scope.scope_id(), policy = ?policy)
    )]
    pub async fn load_from_store(
        &self,
        criteria: &Criteria,
        scope: &mut ScopeContext,
        policy: ErrorPolicy,
    ) -> CacheResult<SyncReport> {
        let mut report = SyncReport::default();

        let loaded = match self.load_checked(criteria, scope).await {
            Ok(models) => models,
            Err(error) => {
                report.record(None, error, policy, "load_from_store")?;
                return Ok(report);
            }
        };

        for model in &loaded {
            report.attempted += 1;
            match self.cache.add(model, scope) {
                Ok(_) => report.succeeded += 1,
                Err(error) => report.record(Some(model.id()), error, policy, "load_from_store")?,
            }
        }

        tracing::debug!(
            attempted = report.attempted,
            succeeded = report.succeeded,
            "Loaded models into cache"
        );
        Ok(report)
    }

    /// Persist every cached model of this kind, in cache order.
    ///
    /// Walks a snapshot taken at call time. Models persisted before a
    /// failure stay persisted.
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(kind = %self.cache.kind(), scope = %scope.scope_id(), policy = ?policy)
    )]
    pub async fn flush_to_store(&self, scope: &ScopeContext, policy: ErrorPolicy) -> CacheResult<SyncReport> {
        let mut report = SyncReport::default();

        let pending = match self.cache.get_list(scope, None) {
            Ok(models) => models,
            Err(error) => {
                report.record(None, error, policy, "flush_to_store")?;
                return Ok(report);
            }
        };

        let tx = scope.transaction();
        for model in &pending {
            report.attempted += 1;
            match self.gateway.persist(model, tx).await {
                Ok(()) => report.succeeded += 1,
                Err(error) => report.record(Some(model.id()), error, policy, "flush_to_store")?,
            }
        }

        tracing::debug!(
            attempted = report.attempted,
            succeeded = report.succeeded,
            "Flushed cache to store"
        );
        Ok(report)
    }

    /// Load a single model straight from the store.
    ///
    /// The result is NOT added to the cache, unlike
    /// [`Synchronizer::load_from_store`]; callers that want it cached call
    /// [`ModelCache::add`] themselves.
    #[tracing::instrument(level = "debug", skip_all, fields(kind = %self.cache.kind(), scope = %scope.scope_id()))]
    pub async fn fetch_one(
        &self,
        criteria: &Criteria,
        scope: &ScopeContext,
        require_found: bool,
    ) -> CacheResult<Option<ModelHandle<M>>> {
        self.cache.check_model(None, scope)?;
        let found = self.gateway.load(criteria, scope.transaction()).await?;
        self.cache.check_model(found.as_ref(), scope)?;

        if require_found {
            let found = guard::require_found(found, self.cache.kind(), None)?;
            return Ok(Some(found));
        }
        Ok(found)
    }

    /// Load every model matching `criteria` without caching any of them.
    #[tracing::instrument(level = "debug", skip_all, fields(kind = %self.cache.kind(), scope = %scope.scope_id()))]
    pub async fn fetch_list(&self, criteria: &Criteria, scope: &ScopeContext) -> CacheResult<Vec<ModelHandle<M>>> {
        let models = self.load_checked(criteria, scope).await?;
        for model in &models {
            self.cache.check_model(Some(model), scope)?;
        }
        Ok(models)
    }

    /// Persist one model with the scope's transaction.
    #[tracing::instrument(level = "debug", skip_all, fields(kind = %self.cache.kind(), scope = %scope.scope_id(), id = %model.id()))]
    pub async fn save(&self, model: &ModelHandle<M>, scope: &ScopeContext) -> CacheResult<()> {
        self.cache.check_model(Some(model), scope)?;
        self.gateway.persist(model, scope.transaction()).await
    }

    async fn load_checked(&self, criteria: &Criteria, scope: &ScopeContext) -> CacheResult<Vec<ModelHandle<M>>> {
        self.cache.check_model(None, scope)?;
        self.gateway.load_many(criteria, scope.transaction()).await
    }
}
