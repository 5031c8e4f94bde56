//! scopecache Core - Model and Identity Types
//!
//! Data types shared by the cache, the store gateways and application code:
//! model identity, the shared model handle, query criteria, configuration
//! and the error taxonomy. No cache state lives here.

pub mod codec;
pub mod config;
pub mod criteria;
pub mod error;
pub mod filter;
pub mod identity;
pub mod model;
pub mod rules;

pub use config::StoreConfig;
pub use criteria::{Criteria, Include, LockMode, OrderBy, SortDirection};
pub use error::{
    CacheError, CacheResult, ConfigError, ErrorBody, ModelError, StorageError, ValidationError,
    SYSTEM_ERROR_CODE, SYSTEM_ERROR_MSG,
};
pub use filter::{FilterExpr, FilterOperator};
pub use identity::{ModelId, ModelKind};
pub use model::{Model, ModelHandle};
