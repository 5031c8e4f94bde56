//! Identity types for cached models

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU64;

use crate::ValidationError;

/// Positive integer identity of a persisted model.
///
/// Zero is never a valid id, which is enforced by the `NonZeroU64` backing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelId(NonZeroU64);

impl ModelId {
    /// Create an id from a raw value, rejecting zero.
    pub fn new(value: u64) -> Result<Self, ValidationError> {
        NonZeroU64::new(value)
            .map(Self)
            .ok_or(ValidationError::InvalidId { value: value as i128 })
    }

    /// Wrap an already non-zero value.
    pub const fn from_non_zero(value: NonZeroU64) -> Self {
        Self(value)
    }

    /// Raw integer value.
    pub const fn get(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u64> for ModelId {
    type Error = ValidationError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<i64> for ModelId {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if value <= 0 {
            return Err(ValidationError::InvalidId { value: value as i128 });
        }
        Self::new(value as u64)
    }
}

impl From<ModelId> for u64 {
    fn from(id: ModelId) -> Self {
        id.get()
    }
}

/// Kind descriptor for a family of models (one table / one entity type).
///
/// Kinds are declared by the application, usually as associated constants:
///
/// ```
/// use scopecache_core::ModelKind;
///
/// const ORDER: ModelKind = ModelKind::new("Order");
/// assert_eq!(ORDER.name(), "Order");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ModelKind(&'static str);

impl ModelKind {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub const fn name(&self) -> &'static str {
        self.0
    }

    /// A kind with an empty name can never be registered.
    pub fn is_named(&self) -> bool {
        !self.0.trim().is_empty()
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_id_rejects_zero() {
        assert!(ModelId::new(0).is_err());
        assert_eq!(ModelId::new(7).unwrap().get(), 7);
    }

    #[test]
    fn test_model_id_from_signed() {
        assert!(ModelId::try_from(-3i64).is_err());
        assert!(ModelId::try_from(0i64).is_err());
        assert_eq!(ModelId::try_from(42i64).unwrap().get(), 42);
    }

    #[test]
    fn test_model_id_serializes_as_integer() {
        let id = ModelId::new(12).unwrap();
        assert_eq!(serde_json::to_value(id).unwrap(), serde_json::json!(12));
        let back: ModelId = serde_json::from_value(serde_json::json!(12)).unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_value::<ModelId>(serde_json::json!(0)).is_err());
    }

    #[test]
    fn test_model_kind_naming() {
        assert!(ModelKind::new("Order").is_named());
        assert!(!ModelKind::new("  ").is_named());
        assert_eq!(ModelKind::new("Order").to_string(), "Order");
    }
}
