//! Model trait and the shared handle the cache hands out.
//!
//! A [`ModelHandle`] is the unit of identity inside a scope: two handles are
//! "the same instance" exactly when [`ModelHandle::ptr_eq`] holds. The cache
//! stores handles, the gateway produces them, and callers mutate the model in
//! place through [`ModelHandle::write`].

use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::{CacheResult, ModelId, ModelKind, StorageError};

/// A persisted record with a stable identity.
///
/// `kind()` is an instance method so that generic record types can carry
/// their kind as data; typed structs simply return a constant.
pub trait Model: Send + Sync + 'static {
    /// Kind descriptor of this instance.
    fn kind(&self) -> ModelKind;

    /// Identity of this instance.
    fn id(&self) -> ModelId;
}

struct Slot<M> {
    id: ModelId,
    kind: ModelKind,
    value: RwLock<M>,
}

/// Shared, mutable reference to one in-memory model instance.
///
/// The id and kind are captured when the handle is created and never change
/// afterwards, even if the wrapped value is rewritten.
pub struct ModelHandle<M> {
    inner: Arc<Slot<M>>,
}

impl<M: Model> ModelHandle<M> {
    /// Wrap a model value in a new handle (a new instance identity).
    pub fn new(model: M) -> Self {
        Self {
            inner: Arc::new(Slot {
                id: model.id(),
                kind: model.kind(),
                value: RwLock::new(model),
            }),
        }
    }
}

impl<M> ModelHandle<M> {
    pub fn id(&self) -> ModelId {
        self.inner.id
    }

    pub fn kind(&self) -> ModelKind {
        self.inner.kind
    }

    /// Whether two handles point at the same instance.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    /// Shared access to the model value.
    pub fn read(&self) -> CacheResult<RwLockReadGuard<'_, M>> {
        self.inner.value.read().map_err(|_| self.poisoned())
    }

    /// Exclusive access to the model value for in-place mutation.
    pub fn write(&self) -> CacheResult<RwLockWriteGuard<'_, M>> {
        self.inner.value.write().map_err(|_| self.poisoned())
    }

    /// Clone the current value out of the handle.
    pub fn snapshot(&self) -> CacheResult<M>
    where
        M: Clone,
    {
        Ok(self.read()?.clone())
    }

    /// Number of live handles to this instance (cache entries included).
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    fn poisoned(&self) -> crate::CacheError {
        StorageError::LockPoisoned {
            kind: self.inner.kind,
            id: self.inner.id,
        }
        .into()
    }
}

impl<M> Clone for ModelHandle<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<M> fmt::Debug for ModelHandle<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelHandle")
            .field("kind", &self.inner.kind)
            .field("id", &self.inner.id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Account {
        id: ModelId,
        balance: i64,
    }

    impl Model for Account {
        fn kind(&self) -> ModelKind {
            ModelKind::new("Account")
        }

        fn id(&self) -> ModelId {
            self.id
        }
    }

    fn account(id: u64, balance: i64) -> Account {
        Account {
            id: ModelId::new(id).unwrap(),
            balance,
        }
    }

    #[test]
    fn test_handle_captures_identity() {
        let handle = ModelHandle::new(account(5, 100));
        assert_eq!(handle.id().get(), 5);
        assert_eq!(handle.kind().name(), "Account");
    }

    #[test]
    fn test_clones_share_instance() {
        let a = ModelHandle::new(account(1, 10));
        let b = a.clone();
        assert!(ModelHandle::ptr_eq(&a, &b));

        b.write().unwrap().balance = 99;
        assert_eq!(a.read().unwrap().balance, 99);
        assert_eq!(a.handle_count(), 2);
    }

    #[test]
    fn test_equal_values_are_distinct_instances() {
        let a = ModelHandle::new(account(1, 10));
        let b = ModelHandle::new(account(1, 10));
        assert!(!ModelHandle::ptr_eq(&a, &b));
        assert_eq!(a.snapshot().unwrap(), b.snapshot().unwrap());
    }

    #[test]
    fn test_id_is_fixed_after_wrapping() {
        let handle = ModelHandle::new(account(3, 0));
        handle.write().unwrap().id = ModelId::new(4).unwrap();
        assert_eq!(handle.id().get(), 3);
    }
}
