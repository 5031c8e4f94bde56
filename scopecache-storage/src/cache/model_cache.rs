//! Typed per-scope cache facade for one model kind.

use std::fmt;
use std::marker::PhantomData;

use scopecache_core::{CacheResult, Model, ModelHandle, ModelId, ModelKind};

use super::guard;
use super::scope::ScopeContext;
use super::store::CacheStore;

/// Cache facade bound to one declared kind.
///
/// The facade holds no data itself. All state lives in the [`ScopeContext`]
/// passed to each call, so one `ModelCache` can serve any number of scopes.
/// Every operation first checks that the bound kind is registered for `M`
/// and fails with `KindMisconfigured` otherwise.
pub struct ModelCache<M> {
    kind: ModelKind,
    _model: PhantomData<fn() -> M>,
}

impl<M> Clone for ModelCache<M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M> Copy for ModelCache<M> {}

impl<M> fmt::Debug for ModelCache<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelCache").field("kind", &self.kind).finish()
    }
}

impl<M: Model> ModelCache<M> {
    /// Bind a facade to `kind` without checking the registry.
    ///
    /// Prefer [`KindRegistry::bind`](super::KindRegistry::bind), which fails
    /// early on a misconfigured kind.
    pub fn new(kind: ModelKind) -> Self {
        Self {
            kind,
            _model: PhantomData,
        }
    }

    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    /// Validate a model (or its absence) against the bound kind.
    pub fn check_model(&self, model: Option<&ModelHandle<M>>, scope: &ScopeContext) -> CacheResult<()> {
        guard::check_model(model, self.kind, scope.registry())?;
        Ok(())
    }

    /// Ensure the scope holds a store for this kind. Idempotent.
    #[tracing::instrument(level = "debug", skip_all, fields(kind = %self.kind, scope = %scope.scope_id()))]
    pub fn init(&self, scope: &mut ScopeContext) -> CacheResult<()> {
        scope.store_mut::<M>(self.kind)?;
        Ok(())
    }

    /// The scope's store for this kind, created empty if absent.
    #[tracing::instrument(level = "debug", skip_all, fields(kind = %self.kind, scope = %scope.scope_id()))]
    pub fn get<'s>(&self, scope: &'s mut ScopeContext) -> CacheResult<&'s mut CacheStore<M>> {
        scope.store_mut::<M>(self.kind)
    }

    /// Empty this kind's store in the scope. Other kinds are untouched.
    #[tracing::instrument(level = "debug", skip_all, fields(kind = %self.kind, scope = %scope.scope_id()))]
    pub fn clear(&self, scope: &mut ScopeContext) -> CacheResult<()> {
        scope.store_mut::<M>(self.kind)?.clear();
        Ok(())
    }

    /// Cache `model` unless an instance with its id is already cached.
    ///
    /// Returns `true` when the model was newly cached and `false` when the
    /// existing instance was kept.
    #[tracing::instrument(level = "debug", skip_all, fields(kind = %self.kind, scope = %scope.scope_id(), id = %model.id()))]
    pub fn add(&self, model: &ModelHandle<M>, scope: &mut ScopeContext) -> CacheResult<bool> {
        self.check_model(Some(model), scope)?;
        let inserted = scope.store_mut::<M>(self.kind)?.insert(model.clone());
        if !inserted {
            tracing::debug!("id already cached, keeping existing instance");
        }
        Ok(inserted)
    }

    /// Evict the cached instance with `model`'s id.
    ///
    /// Returns `true` when something was evicted; removing an uncached id is
    /// a no-op.
    #[tracing::instrument(level = "debug", skip_all, fields(kind = %self.kind, scope = %scope.scope_id(), id = %model.id()))]
    pub fn remove(&self, model: &ModelHandle<M>, scope: &mut ScopeContext) -> CacheResult<bool> {
        self.check_model(Some(model), scope)?;
        Ok(scope.store_mut::<M>(self.kind)?.remove(model).is_some())
    }

    /// Look up a cached instance by id.
    ///
    /// With `require_found`, a miss is a `NotFound` error instead of `None`.
    #[tracing::instrument(level = "debug", skip_all, fields(kind = %self.kind, scope = %scope.scope_id(), id = %id))]
    pub fn get_by_id(
        &self,
        id: ModelId,
        scope: &ScopeContext,
        require_found: bool,
    ) -> CacheResult<Option<ModelHandle<M>>> {
        let found = scope
            .store::<M>(self.kind)?
            .and_then(|store| store.get(id))
            .cloned();

        if require_found {
            let found = guard::require_found(found, self.kind, Some(id))?;
            return Ok(Some(found));
        }
        Ok(found)
    }

    /// Cached instances in insertion order, optionally filtered.
    ///
    /// The result is a new list; the store is not modified.
    #[tracing::instrument(level = "debug", skip_all, fields(kind = %self.kind, scope = %scope.scope_id()))]
    pub fn get_list(
        &self,
        scope: &ScopeContext,
        predicate: Option<&dyn Fn(&ModelHandle<M>) -> bool>,
    ) -> CacheResult<Vec<ModelHandle<M>>> {
        let Some(store) = scope.store::<M>(self.kind)? else {
            return Ok(Vec::new());
        };
        Ok(match predicate {
            Some(predicate) => store.filtered(|model| predicate(model)),
            None => store.snapshot(),
        })
    }

    /// Number of cached instances of this kind in the scope.
    pub fn count(&self, scope: &ScopeContext) -> CacheResult<usize> {
        Ok(scope.store::<M>(self.kind)?.map_or(0, CacheStore::len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::KindRegistry;
    use scopecache_core::CacheError;
    use std::sync::Arc;

    const TASK: ModelKind = ModelKind::new("Task");
    const STRAY: ModelKind = ModelKind::new("Stray");

    #[derive(Debug, Clone)]
    struct Task {
        kind: ModelKind,
        id: ModelId,
        done: bool,
    }

    impl Model for Task {
        fn kind(&self) -> ModelKind {
            self.kind
        }
        fn id(&self) -> ModelId {
            self.id
        }
    }

    fn task(id: u64, done: bool) -> ModelHandle<Task> {
        ModelHandle::new(Task {
            kind: TASK,
            id: ModelId::new(id).unwrap(),
            done,
        })
    }

    fn id(value: u64) -> ModelId {
        ModelId::new(value).unwrap()
    }

    fn setup() -> (ModelCache<Task>, ScopeContext) {
        let registry = Arc::new(KindRegistry::new().with::<Task>(TASK).unwrap());
        let cache = registry.bind::<Task>(TASK).unwrap();
        (cache, ScopeContext::new(registry))
    }

    fn ids(list: &[ModelHandle<Task>]) -> Vec<u64> {
        list.iter().map(|h| h.id().get()).collect()
    }

    #[test]
    fn test_init_is_idempotent() {
        let (cache, mut scope) = setup();
        cache.init(&mut scope).unwrap();
        cache.add(&task(1, false), &mut scope).unwrap();
        cache.init(&mut scope).unwrap();
        assert_eq!(cache.count(&scope).unwrap(), 1);
    }

    #[test]
    fn test_reads_on_fresh_scope_are_empty() {
        let (cache, scope) = setup();
        assert!(cache.get_list(&scope, None).unwrap().is_empty());
        assert!(cache.get_by_id(id(1), &scope, false).unwrap().is_none());
        assert_eq!(cache.count(&scope).unwrap(), 0);
    }

    #[test]
    fn test_add_then_get_returns_same_instance() {
        let (cache, mut scope) = setup();
        let original = task(7, false);
        assert!(cache.add(&original, &mut scope).unwrap());

        let cached = cache.get_by_id(id(7), &scope, true).unwrap().unwrap();
        assert!(ModelHandle::ptr_eq(&cached, &original));

        original.write().unwrap().done = true;
        assert!(cached.read().unwrap().done);
    }

    #[test]
    fn test_add_duplicate_keeps_first() {
        let (cache, mut scope) = setup();
        let first = task(1, false);
        cache.add(&first, &mut scope).unwrap();
        assert!(!cache.add(&task(1, true), &mut scope).unwrap());

        let cached = cache.get_by_id(id(1), &scope, false).unwrap().unwrap();
        assert!(ModelHandle::ptr_eq(&cached, &first));
    }

    #[test]
    fn test_add_wrong_kind_fails() {
        let (cache, mut scope) = setup();
        let stray = ModelHandle::new(Task {
            kind: STRAY,
            id: id(1),
            done: false,
        });
        let err = cache.add(&stray, &mut scope).unwrap_err();
        assert!(err.is_invalid_kind());
        assert_eq!(cache.count(&scope).unwrap(), 0);
    }

    #[test]
    fn test_unregistered_binding_fails_every_operation() {
        let (_, mut scope) = setup();
        let cache = ModelCache::<Task>::new(STRAY);

        assert!(cache.init(&mut scope).unwrap_err().is_kind_misconfigured());
        assert!(cache.get_list(&scope, None).unwrap_err().is_kind_misconfigured());
        assert!(cache
            .get_by_id(id(1), &scope, false)
            .unwrap_err()
            .is_kind_misconfigured());
    }

    #[test]
    fn test_get_by_id_require_found() {
        let (cache, scope) = setup();
        let err = cache.get_by_id(id(9), &scope, true).unwrap_err();
        assert!(err.is_not_found());
        assert!(matches!(err, CacheError::Model(_)));
    }

    #[test]
    fn test_get_list_order_and_filter() {
        let (cache, mut scope) = setup();
        for (n, done) in [(3, true), (1, false), (2, true)] {
            cache.add(&task(n, done), &mut scope).unwrap();
        }

        assert_eq!(ids(&cache.get_list(&scope, None).unwrap()), vec![3, 1, 2]);

        let done = |h: &ModelHandle<Task>| h.read().map(|t| t.done).unwrap_or(false);
        assert_eq!(ids(&cache.get_list(&scope, Some(&done)).unwrap()), vec![3, 2]);
        assert_eq!(cache.count(&scope).unwrap(), 3);
    }

    #[test]
    fn test_remove_and_clear() {
        let (cache, mut scope) = setup();
        cache.add(&task(1, false), &mut scope).unwrap();
        cache.add(&task(2, false), &mut scope).unwrap();

        assert!(cache.remove(&task(1, true), &mut scope).unwrap());
        assert!(!cache.remove(&task(1, true), &mut scope).unwrap());
        assert_eq!(ids(&cache.get_list(&scope, None).unwrap()), vec![2]);

        cache.clear(&mut scope).unwrap();
        assert!(cache.get_list(&scope, None).unwrap().is_empty());
    }

    #[test]
    fn test_get_exposes_store() {
        let (cache, mut scope) = setup();
        cache.add(&task(4, false), &mut scope).unwrap();
        let store = cache.get(&mut scope).unwrap();
        assert_eq!(store.kind(), TASK);
        assert!(store.contains(id(4)));
    }
}
