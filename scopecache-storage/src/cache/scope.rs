//! Per-unit-of-work scope context.
//!
//! A [`ScopeContext`] belongs to exactly one unit of work (one request, one
//! job run). It holds at most one [`CacheStore`] per model kind plus the
//! transaction handle that store calls should join. It is owned by the
//! caller; the cache only fills in stores lazily.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use scopecache_core::{CacheResult, Model, ModelError, ModelKind};
use uuid::Uuid;

use super::registry::KindRegistry;
use super::store::CacheStore;

/// Opaque transaction handle forwarded to the store gateway.
///
/// The cache never begins, commits or inspects the transaction. Gateways
/// recover their concrete transaction type with [`TransactionHandle::downcast_ref`].
#[derive(Clone)]
pub struct TransactionHandle {
    id: Uuid,
    inner: Arc<dyn Any + Send + Sync>,
}

impl TransactionHandle {
    pub fn new<T: Any + Send + Sync>(inner: T) -> Self {
        Self::from_arc(Arc::new(inner))
    }

    pub fn from_arc<T: Any + Send + Sync>(inner: Arc<T>) -> Self {
        Self {
            id: Uuid::now_v7(),
            inner,
        }
    }

    /// Identifier used in traces; unrelated to any engine-side transaction id.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }
}

impl fmt::Debug for TransactionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionHandle")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// Cache state for one unit of work.
pub struct ScopeContext {
    scope_id: Uuid,
    registry: Arc<KindRegistry>,
    caches: HashMap<ModelKind, Box<dyn Any + Send + Sync>>,
    transaction: Option<TransactionHandle>,
}

impl ScopeContext {
    pub fn new(registry: Arc<KindRegistry>) -> Self {
        Self {
            scope_id: Uuid::now_v7(),
            registry,
            caches: HashMap::new(),
            transaction: None,
        }
    }

    pub fn scope_id(&self) -> Uuid {
        self.scope_id
    }

    pub fn registry(&self) -> &KindRegistry {
        &self.registry
    }

    pub fn transaction(&self) -> Option<&TransactionHandle> {
        self.transaction.as_ref()
    }

    /// Attach the transaction subsequent store calls should join.
    pub fn set_transaction(&mut self, transaction: TransactionHandle) {
        self.transaction = Some(transaction);
    }

    pub fn take_transaction(&mut self) -> Option<TransactionHandle> {
        self.transaction.take()
    }

    /// Kinds that currently have a store in this scope, sorted by name.
    pub fn cached_kinds(&self) -> Vec<ModelKind> {
        let mut kinds: Vec<_> = self.caches.keys().copied().collect();
        kinds.sort();
        kinds
    }

    pub fn has_store(&self, kind: ModelKind) -> bool {
        self.caches.contains_key(&kind)
    }

    /// Existing store for `kind`, without creating one.
    pub(crate) fn store<M: Model>(&self, kind: ModelKind) -> CacheResult<Option<&CacheStore<M>>> {
        self.registry.check::<M>(kind)?;
        match self.caches.get(&kind) {
            None => Ok(None),
            Some(erased) => erased
                .downcast_ref::<CacheStore<M>>()
                .map(Some)
                .ok_or_else(|| store_type_mismatch(kind).into()),
        }
    }

    /// Store for `kind`, created empty on first access.
    pub(crate) fn store_mut<M: Model>(&mut self, kind: ModelKind) -> CacheResult<&mut CacheStore<M>> {
        self.registry.check::<M>(kind)?;
        self.caches
            .entry(kind)
            .or_insert_with(|| Box::new(CacheStore::<M>::new(kind)) as Box<dyn Any + Send + Sync>)
            .downcast_mut::<CacheStore<M>>()
            .ok_or_else(|| store_type_mismatch(kind).into())
    }
}

fn store_type_mismatch(kind: ModelKind) -> ModelError {
    ModelError::KindMisconfigured {
        kind,
        reason: "scope holds a store of another model type for this kind".to_string(),
    }
}

impl fmt::Debug for ScopeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeContext")
            .field("scope_id", &self.scope_id)
            .field("cached_kinds", &self.cached_kinds())
            .field("transaction", &self.transaction)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scopecache_core::ModelId;

    const CART: ModelKind = ModelKind::new("Cart");

    #[derive(Debug)]
    struct Cart(ModelId);

    impl Model for Cart {
        fn kind(&self) -> ModelKind {
            CART
        }
        fn id(&self) -> ModelId {
            self.0
        }
    }

    #[derive(Debug, PartialEq)]
    struct FakeTx(&'static str);

    fn scope() -> ScopeContext {
        ScopeContext::new(Arc::new(KindRegistry::new().with::<Cart>(CART).unwrap()))
    }

    #[test]
    fn test_store_created_lazily_once() {
        let mut scope = scope();
        assert!(!scope.has_store(CART));
        assert!(scope.store::<Cart>(CART).unwrap().is_none());

        scope.store_mut::<Cart>(CART).unwrap();
        assert!(scope.has_store(CART));
        assert_eq!(scope.cached_kinds(), vec![CART]);

        scope.store_mut::<Cart>(CART).unwrap();
        assert_eq!(scope.cached_kinds().len(), 1);
    }

    #[test]
    fn test_unregistered_kind_is_rejected() {
        let mut scope = scope();
        let err = scope.store_mut::<Cart>(ModelKind::new("Nope")).unwrap_err();
        assert!(err.is_kind_misconfigured());
        assert!(scope.cached_kinds().is_empty());
    }

    #[test]
    fn test_transaction_round_trip() {
        let mut scope = scope();
        assert!(scope.transaction().is_none());

        let tx = TransactionHandle::new(FakeTx("tx-1"));
        let tx_id = tx.id();
        scope.set_transaction(tx);

        let attached = scope.transaction().unwrap();
        assert_eq!(attached.id(), tx_id);
        assert_eq!(attached.downcast_ref::<FakeTx>(), Some(&FakeTx("tx-1")));
        assert!(attached.downcast_ref::<String>().is_none());

        assert!(scope.take_transaction().is_some());
        assert!(scope.transaction().is_none());
    }

    #[test]
    fn test_scopes_are_independent() {
        let mut a = scope();
        let b = scope();
        a.store_mut::<Cart>(CART).unwrap();
        assert!(!b.has_store(CART));
        assert_ne!(a.scope_id(), b.scope_id());
    }
}
