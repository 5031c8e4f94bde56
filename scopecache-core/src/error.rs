//! Error types for scopecache operations

use crate::{ModelId, ModelKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Code reported by errors that carry no more specific classification.
pub const SYSTEM_ERROR_CODE: u32 = 10001;

/// Message paired with [`SYSTEM_ERROR_CODE`].
pub const SYSTEM_ERROR_MSG: &str = "system error";

/// Failures raised by (or on behalf of) the backing store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Load failed for {kind}: {reason}")]
    LoadFailed { kind: ModelKind, reason: String },

    #[error("Persist failed for {kind} with id {id}: {reason}")]
    PersistFailed {
        kind: ModelKind,
        id: ModelId,
        reason: String,
    },

    #[error("Transaction failed: {reason}")]
    TransactionFailed { reason: String },

    #[error("Model lock poisoned for {kind} with id {id}")]
    LockPoisoned { kind: ModelKind, id: ModelId },

    #[error("Store unavailable: {reason}")]
    Unavailable { reason: String },
}

/// Model identity and kind errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ModelError {
    /// The declared kind is not recognized for the model type in use.
    #[error("Model kind misconfigured: {kind}: {reason}")]
    KindMisconfigured { kind: ModelKind, reason: String },

    /// A value's runtime kind differs from the kind it was handed to.
    #[error("Invalid model kind: expected {expected}, got {actual}")]
    InvalidKind {
        expected: ModelKind,
        actual: ModelKind,
    },

    /// A required lookup produced no value.
    #[error("Model not found: {kind}{}", id_suffix(.id))]
    NotFound { kind: ModelKind, id: Option<ModelId> },
}

fn id_suffix(id: &Option<ModelId>) -> String {
    id.map(|id| format!(" with id {id}")).unwrap_or_default()
}

/// Field value validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid id {value}: must be a positive integer")]
    InvalidId { value: i128 },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Model kind {kind} is already registered for another model type")]
    DuplicateKind { kind: ModelKind },
}

/// Master error type for all scopecache errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for scopecache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Serializable `{module, code, msg}` view of an error, suitable for API bodies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub module: String,
    pub code: u32,
    pub msg: String,
}

impl Default for ErrorBody {
    fn default() -> Self {
        Self {
            module: "base".to_string(),
            code: SYSTEM_ERROR_CODE,
            msg: SYSTEM_ERROR_MSG.to_string(),
        }
    }
}

impl CacheError {
    /// Module the error originated from.
    pub fn module(&self) -> &'static str {
        match self {
            CacheError::Storage(_) => "storage",
            CacheError::Model(_) => "model",
            CacheError::Validation(_) => "validation",
            CacheError::Config(_) => "config",
        }
    }

    /// Stable numeric code. Store failures are opaque and report the system code.
    pub fn code(&self) -> u32 {
        match self {
            CacheError::Storage(_) => SYSTEM_ERROR_CODE,
            CacheError::Model(ModelError::KindMisconfigured { .. }) => 10002,
            CacheError::Model(ModelError::InvalidKind { .. }) => 10003,
            CacheError::Model(ModelError::NotFound { .. }) => 10004,
            CacheError::Validation(_) => 10005,
            CacheError::Config(_) => 10006,
        }
    }

    pub fn msg(&self) -> String {
        self.to_string()
    }

    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            module: self.module().to_string(),
            code: self.code(),
            msg: self.msg(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CacheError::Model(ModelError::NotFound { .. }))
    }

    pub fn is_invalid_kind(&self) -> bool {
        matches!(self, CacheError::Model(ModelError::InvalidKind { .. }))
    }

    pub fn is_kind_misconfigured(&self) -> bool {
        matches!(self, CacheError::Model(ModelError::KindMisconfigured { .. }))
    }

    pub fn is_store_failure(&self) -> bool {
        matches!(self, CacheError::Storage(_))
    }
}

// =============================================================================
// TESTS
// =============================================================================
