//! Dual-indexed container for one model kind within one scope.

use std::collections::HashMap;

use scopecache_core::{Model, ModelHandle, ModelId, ModelKind};

/// Ordered list plus id index of cached model handles.
///
/// # Invariants
///
/// - An id is in the index iff its handle is in the ordered list exactly once.
/// - Insertion is first-write-wins: a second handle with an already cached id
///   is ignored and the original instance stays.
#[derive(Debug)]
pub struct CacheStore<M> {
    kind: ModelKind,
    order: Vec<ModelHandle<M>>,
    index: HashMap<ModelId, ModelHandle<M>>,
}

impl<M: Model> CacheStore<M> {
    pub fn new(kind: ModelKind) -> Self {
        Self {
            kind,
            order: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Kind this store was created for.
    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, id: ModelId) -> bool {
        self.index.contains_key(&id)
    }

    /// Insert a handle unless its id is already cached.
    ///
    /// Returns `true` when the handle was inserted.
    pub fn insert(&mut self, model: ModelHandle<M>) -> bool {
        let id = model.id();
        if self.index.contains_key(&id) {
            return false;
        }
        self.index.insert(id, model.clone());
        self.order.push(model);
        true
    }

    /// Remove the cached instance for `model`'s id.
    ///
    /// The entry under the id is dropped from the index and the indexed
    /// instance is dropped from the ordered list by pointer identity, so a
    /// different instance carrying the same id still evicts the cached one.
    /// Returns the evicted handle, if any.
    pub fn remove(&mut self, model: &ModelHandle<M>) -> Option<ModelHandle<M>> {
        let cached = self.index.remove(&model.id())?;
        if let Some(pos) = self
            .order
            .iter()
            .position(|entry| ModelHandle::ptr_eq(entry, &cached))
        {
            self.order.remove(pos);
        }
        Some(cached)
    }

    pub fn get(&self, id: ModelId) -> Option<&ModelHandle<M>> {
        self.index.get(&id)
    }

    /// Cached handles in insertion order.
    pub fn as_slice(&self) -> &[ModelHandle<M>] {
        &self.order
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModelHandle<M>> {
        self.order.iter()
    }

    /// Owned copy of the ordered list. Handles still point at the cached instances.
    pub fn snapshot(&self) -> Vec<ModelHandle<M>> {
        self.order.clone()
    }

    /// Handles matching `predicate`, in insertion order. The store is not modified.
    pub fn filtered<F>(&self, mut predicate: F) -> Vec<ModelHandle<M>>
    where
        F: FnMut(&ModelHandle<M>) -> bool,
    {
        self.order
            .iter()
            .filter(|entry| predicate(*entry))
            .cloned()
            .collect()
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.index.clear();
    }
}
