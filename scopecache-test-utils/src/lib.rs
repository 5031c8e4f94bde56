//! scopecache Test Utilities
//!
//! Shared test infrastructure for the scopecache workspace:
//! - Fixture models and a ready-made kind registry
//! - A scripted store gateway with failure injection
//! - Proptest generators for ids and cache operations
//! - Custom assertions for cache-specific errors
//! - Tracing setup for tests

// Re-export the reference gateway from its source crate
pub use scopecache_storage::InMemoryStore;

// Re-export core types for convenience
pub use scopecache_core::{
    CacheError, CacheResult, Criteria, Model, ModelError, ModelHandle, ModelId, ModelKind,
    StorageError, StoreConfig,
};
pub use scopecache_storage::{
    ErrorPolicy, KindRegistry, ModelCache, ScopeContext, StoreGateway, SyncReport, Synchronizer,
    TransactionHandle,
};

use std::collections::HashSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

// ============================================================================
// FIXTURE MODELS
// ============================================================================

pub const WIDGET_KIND: ModelKind = ModelKind::new("Widget");
pub const GADGET_KIND: ModelKind = ModelKind::new("Gadget");
pub const RECORD_KIND: ModelKind = ModelKind::new("Record");

/// Typed fixture model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Widget {
    pub id: ModelId,
    pub name: String,
    pub quantity: i64,
    /// Unix seconds, as stored.
    pub updated_at: Option<i64>,
}

impl Model for Widget {
    fn kind(&self) -> ModelKind {
        WIDGET_KIND
    }

    fn id(&self) -> ModelId {
        self.id
    }
}

/// Second typed fixture, for multi-kind scopes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gadget {
    pub id: ModelId,
    pub label: String,
}

impl Model for Gadget {
    fn kind(&self) -> ModelKind {
        GADGET_KIND
    }

    fn id(&self) -> ModelId {
        self.id
    }
}

/// Generic row whose kind is runtime data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub kind: ModelKind,
    pub id: ModelId,
    pub fields: serde_json::Value,
}

impl Model for Record {
    fn kind(&self) -> ModelKind {
        self.kind
    }

    fn id(&self) -> ModelId {
        self.id
    }
}

// ============================================================================
// SCRIPTED GATEWAY
// ============================================================================

/// One `persist` call seen by a [`ScriptedGateway`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistRecord {
    pub id: ModelId,
    pub transaction: Option<Uuid>,
}

/// Gateway that serves a fixed list of handles.
///
/// Unlike a real store it hands out the SAME handles on every load, which
/// makes identity across repeated loads observable.
pub struct ScriptedGateway<M> {
    kind: ModelKind,
    rows: Vec<ModelHandle<M>>,
    fail_load: bool,
    fail_persist: HashSet<ModelId>,
    persisted: Mutex<Vec<PersistRecord>>,
    load_transactions: Mutex<Vec<Option<Uuid>>>,
}

impl<M: Model> ScriptedGateway<M> {
    pub fn new(kind: ModelKind) -> Self {
        Self {
            kind,
            rows: Vec::new(),
            fail_load: false,
            fail_persist: HashSet::new(),
            persisted: Mutex::new(Vec::new()),
            load_transactions: Mutex::new(Vec::new()),
        }
    }

    /// Serve `rows`, in order, from every load.
    pub fn returning(mut self, rows: Vec<ModelHandle<M>>) -> Self {
        self.rows = rows;
        self
    }

    /// Make every load fail with `StorageError::Unavailable`.
    pub fn failing_load(mut self) -> Self {
        self.fail_load = true;
        self
    }

    /// Make persisting `id` fail with `StorageError::PersistFailed`.
    pub fn failing_persist(mut self, id: ModelId) -> Self {
        self.fail_persist.insert(id);
        self
    }

    pub fn rows(&self) -> &[ModelHandle<M>] {
        &self.rows
    }

    /// Successful persists, oldest first.
    pub async fn persisted(&self) -> Vec<PersistRecord> {
        self.persisted.lock().await.clone()
    }

    pub async fn persisted_ids(&self) -> Vec<u64> {
        self.persisted.lock().await.iter().map(|p| p.id.get()).collect()
    }

    /// Transaction ids passed to `load` / `load_many`, oldest first.
    pub async fn load_transactions(&self) -> Vec<Option<Uuid>> {
        self.load_transactions.lock().await.clone()
    }

    async fn begin_load(&self, tx: Option<&TransactionHandle>) -> CacheResult<()> {
        self.load_transactions.lock().await.push(tx.map(TransactionHandle::id));
        if self.fail_load {
            return Err(StorageError::Unavailable {
                reason: format!("scripted load failure for {}", self.kind),
            }
            .into());
        }
        Ok(())
    }
}

#[async_trait]
impl<M: Model> StoreGateway<M> for ScriptedGateway<M> {
    async fn load(
        &self,
        _criteria: &Criteria,
        tx: Option<&TransactionHandle>,
    ) -> CacheResult<Option<ModelHandle<M>>> {
        self.begin_load(tx).await?;
        Ok(self.rows.first().cloned())
    }

    async fn load_many(
        &self,
        _criteria: &Criteria,
        tx: Option<&TransactionHandle>,
    ) -> CacheResult<Vec<ModelHandle<M>>> {
        self.begin_load(tx).await?;
        Ok(self.rows.clone())
    }

    async fn persist(&self, model: &ModelHandle<M>, tx: Option<&TransactionHandle>) -> CacheResult<()> {
        if self.fail_persist.contains(&model.id()) {
            return Err(StorageError::PersistFailed {
                kind: self.kind,
                id: model.id(),
                reason: "scripted persist failure".to_string(),
            }
            .into());
        }
        self.persisted.lock().await.push(PersistRecord {
            id: model.id(),
            transaction: tx.map(TransactionHandle::id),
        });
        Ok(())
    }
}

// ============================================================================
// TRACING
// ============================================================================

/// Install a test-friendly subscriber once per process.
///
/// Honors `RUST_LOG`; defaults to `warn`. Later calls are no-ops.
pub fn init_test_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_test_writer()
        .try_init();
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for ids, fixtures and cache operations.

    use super::*;
    use proptest::prelude::*;

    /// Ids drawn from a small range so that collisions are common.
    pub fn arb_model_id() -> impl Strategy<Value = ModelId> {
        (1u64..=32).prop_filter_map("ids are positive", |n| ModelId::new(n).ok())
    }

    pub fn arb_id_sequence(max_len: usize) -> impl Strategy<Value = Vec<ModelId>> {
        prop::collection::vec(arb_model_id(), 0..max_len)
    }

    pub fn arb_widget() -> impl Strategy<Value = Widget> {
        (arb_model_id(), "[a-z]{1,12}", -1000i64..1000, prop::option::of(1i64..=i32::MAX as i64)).prop_map(
            |(id, name, quantity, updated_at)| Widget {
                id,
                name,
                quantity,
                updated_at,
            },
        )
    }

    /// A single mutation against one kind's cache.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum CacheOp {
        Add(ModelId),
        Remove(ModelId),
        Clear,
    }

    pub fn arb_cache_op() -> impl Strategy<Value = CacheOp> {
        prop_oneof![
            6 => arb_model_id().prop_map(CacheOp::Add),
            3 => arb_model_id().prop_map(CacheOp::Remove),
            1 => Just(CacheOp::Clear),
        ]
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built models, registries and scopes.

    use std::sync::Arc;

    use chrono::{TimeZone, Utc};
    use scopecache_core::codec::timestamp;

    use super::*;

    /// Build a `ModelId`, panicking on zero.
    #[track_caller]
    pub fn id(value: u64) -> ModelId {
        match ModelId::new(value) {
            Ok(id) => id,
            Err(e) => panic!("fixture id must be positive: {e}"),
        }
    }

    /// Widget with a fixed update time of 2024-01-02T03:04:05Z.
    pub fn widget(value: u64, name: &str) -> Widget {
        let updated = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).single();
        Widget {
            id: id(value),
            name: name.to_string(),
            quantity: 1,
            updated_at: timestamp::to_unix(updated),
        }
    }

    pub fn widget_handle(value: u64, name: &str) -> ModelHandle<Widget> {
        ModelHandle::new(widget(value, name))
    }

    pub fn widget_handles(ids: &[u64]) -> Vec<ModelHandle<Widget>> {
        ids.iter()
            .map(|n| widget_handle(*n, &format!("widget-{n}")))
            .collect()
    }

    pub fn gadget_handle(value: u64, label: &str) -> ModelHandle<Gadget> {
        ModelHandle::new(Gadget {
            id: id(value),
            label: label.to_string(),
        })
    }

    pub fn record_handle(kind: ModelKind, value: u64) -> ModelHandle<Record> {
        ModelHandle::new(Record {
            kind,
            id: id(value),
            fields: serde_json::json!({}),
        })
    }

    /// Registry with Widget, Gadget and Record registered.
    pub fn registry() -> Arc<KindRegistry> {
        let mut registry = KindRegistry::new();
        for result in [
            registry.register::<Widget>(WIDGET_KIND),
            registry.register::<Gadget>(GADGET_KIND),
            registry.register::<Record>(RECORD_KIND),
        ] {
            if let Err(e) = result {
                panic!("fixture registry: {e}");
            }
        }
        Arc::new(registry)
    }

    /// Fresh scope over [`registry`].
    pub fn scope() -> ScopeContext {
        ScopeContext::new(registry())
    }

    #[track_caller]
    pub fn widget_cache() -> ModelCache<Widget> {
        match registry().bind::<Widget>(WIDGET_KIND) {
            Ok(cache) => cache,
            Err(e) => panic!("fixture cache: {e}"),
        }
    }

    pub fn memory_config() -> StoreConfig {
        StoreConfig::new("memory://fixtures")
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertion helpers for cache-specific results.

    use super::*;

    /// Assert that handles carry exactly `expected` ids, in order.
    #[track_caller]
    pub fn assert_ids<M>(handles: &[ModelHandle<M>], expected: &[u64]) {
        let actual: Vec<u64> = handles.iter().map(|h| h.id().get()).collect();
        assert_eq!(actual, expected, "cached ids differ");
    }

    /// Assert that every listed handle is the one indexed under its id.
    #[track_caller]
    pub fn assert_lock_step<M: Model>(store: &scopecache_storage::CacheStore<M>) {
        for handle in store.iter() {
            match store.get(handle.id()) {
                Some(indexed) => assert!(
                    ModelHandle::ptr_eq(indexed, handle),
                    "index and list disagree for id {}",
                    handle.id()
                ),
                None => panic!("listed id {} missing from index", handle.id()),
            }
        }
    }

    #[track_caller]
    pub fn assert_not_found<T: std::fmt::Debug>(result: &CacheResult<T>) {
        match result {
            Err(CacheError::Model(ModelError::NotFound { .. })) => {}
            other => panic!("Expected NotFound error, got: {:?}", other),
        }
    }

    #[track_caller]
    pub fn assert_invalid_kind<T: std::fmt::Debug>(result: &CacheResult<T>) {
        match result {
            Err(CacheError::Model(ModelError::InvalidKind { .. })) => {}
            other => panic!("Expected InvalidKind error, got: {:?}", other),
        }
    }

    #[track_caller]
    pub fn assert_kind_misconfigured<T: std::fmt::Debug>(result: &CacheResult<T>) {
        match result {
            Err(CacheError::Model(ModelError::KindMisconfigured { .. })) => {}
            other => panic!("Expected KindMisconfigured error, got: {:?}", other),
        }
    }

    #[track_caller]
    pub fn assert_store_failure<T: std::fmt::Debug>(result: &CacheResult<T>) {
        match result {
            Err(CacheError::Storage(_)) => {}
            other => panic!("Expected Storage error, got: {:?}", other),
        }
    }
}
