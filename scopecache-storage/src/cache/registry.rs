//! Registry of recognized model kinds.
//!
//! Every [`ModelKind`] is bound to exactly one Rust model type. A cache can
//! only be bound to (and a scope can only hold a store for) a kind that is
//! registered for the cache's model type; anything else is a
//! `KindMisconfigured` error.

use std::any::{type_name, TypeId};
use std::collections::HashMap;

use scopecache_core::{CacheResult, ConfigError, Model, ModelError, ModelKind};

use super::model_cache::ModelCache;

#[derive(Debug, Clone, Copy)]
struct Registration {
    type_id: TypeId,
    type_name: &'static str,
}

/// Set of model kinds known to the application.
#[derive(Debug, Clone, Default)]
pub struct KindRegistry {
    kinds: HashMap<ModelKind, Registration>,
}

impl KindRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `kind` for model type `M`.
    ///
    /// Registering the same pair twice is a no-op. Registering a kind that is
    /// already bound to another type fails.
    pub fn register<M: Model>(&mut self, kind: ModelKind) -> CacheResult<()> {
        if !kind.is_named() {
            return Err(ConfigError::InvalidValue {
                field: "kind".to_string(),
                value: kind.name().to_string(),
                reason: "kind name must not be empty".to_string(),
            }
            .into());
        }

        let registration = Registration {
            type_id: TypeId::of::<M>(),
            type_name: type_name::<M>(),
        };
        match self.kinds.get(&kind) {
            Some(existing) if existing.type_id != registration.type_id => {
                Err(ConfigError::DuplicateKind { kind }.into())
            }
            Some(_) => Ok(()),
            None => {
                self.kinds.insert(kind, registration);
                Ok(())
            }
        }
    }

    /// Builder-style [`KindRegistry::register`].
    pub fn with<M: Model>(mut self, kind: ModelKind) -> CacheResult<Self> {
        self.register::<M>(kind)?;
        Ok(self)
    }

    pub fn is_registered(&self, kind: ModelKind) -> bool {
        self.kinds.contains_key(&kind)
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Registered kinds, sorted by name.
    pub fn kinds(&self) -> Vec<ModelKind> {
        let mut kinds: Vec<_> = self.kinds.keys().copied().collect();
        kinds.sort();
        kinds
    }

    /// Verify that `kind` is recognized for model type `M`.
    pub fn check<M: Model>(&self, kind: ModelKind) -> Result<(), ModelError> {
        match self.kinds.get(&kind) {
            None => Err(ModelError::KindMisconfigured {
                kind,
                reason: "kind is not registered".to_string(),
            }),
            Some(existing) if existing.type_id != TypeId::of::<M>() => {
                Err(ModelError::KindMisconfigured {
                    kind,
                    reason: format!(
                        "kind is registered for {}, not {}",
                        existing.type_name,
                        type_name::<M>()
                    ),
                })
            }
            Some(_) => Ok(()),
        }
    }

    /// Bind a cache for `M` to `kind`, checking the binding up front.
    pub fn bind<M: Model>(&self, kind: ModelKind) -> CacheResult<ModelCache<M>> {
        self.check::<M>(kind)?;
        Ok(ModelCache::new(kind))
    }
}
