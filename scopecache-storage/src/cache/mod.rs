//! Scoped model cache.
//!
//! One [`ScopeContext`] per unit of work holds one [`CacheStore`] per model
//! kind. [`ModelCache`] is the typed facade callers use to read and write a
//! kind's store; [`KindRegistry`] decides which kinds exist and which model
//! type each one belongs to.
//!
//! # Example
//!
//! ```ignore
//! let registry = Arc::new(KindRegistry::new().with::<Widget>(WIDGET_KIND)?);
//! let widgets = registry.bind::<Widget>(WIDGET_KIND)?;
//!
//! let mut scope = ScopeContext::new(registry);
//! widgets.add(&ModelHandle::new(widget), &mut scope)?;
//! let cached = widgets.get_by_id(id, &scope, true)?;
//! ```

pub mod guard;
pub mod model_cache;
pub mod registry;
pub mod scope;
pub mod store;

pub use guard::{check_model, require_found};
pub use model_cache::ModelCache;
pub use registry::KindRegistry;
pub use scope::{ScopeContext, TransactionHandle};
pub use store::CacheStore;
