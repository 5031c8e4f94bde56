//! scopecache Storage - Scoped Model Cache and Store Synchronization
//!
//! Per-unit-of-work identity cache over an authoritative store. Within one
//! [`ScopeContext`], repeated lookups of the same model return the same
//! in-memory instance; models are batch-loaded through a [`StoreGateway`],
//! mutated in place, and flushed back by a [`Synchronizer`].

pub mod cache;
pub mod gateway;
pub mod memory;
pub mod policy;
pub mod sync;

pub use cache::{
    check_model, require_found, CacheStore, KindRegistry, ModelCache, ScopeContext,
    TransactionHandle,
};
pub use gateway::StoreGateway;
pub use memory::{InMemoryStore, StoreCall, StoreOp};
pub use policy::ErrorPolicy;
pub use sync::{SyncFailure, SyncReport, Synchronizer};
