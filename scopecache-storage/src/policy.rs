//! Surface/swallow error policy.
//!
//! Cache and synchronizer operations always return [`CacheResult`]. Callers
//! that prefer a boolean success flag or an empty default instead of an
//! error apply an [`ErrorPolicy`] at the boundary.

use scopecache_core::{CacheError, CacheResult};
use serde::{Deserialize, Serialize};

/// What to do with an error at an operation boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Propagate the first error and stop.
    #[default]
    Surface,
    /// Log the error and carry on with a safe default.
    Swallow,
}

impl ErrorPolicy {
    /// `true` maps to [`ErrorPolicy::Surface`].
    pub fn from_flag(surface: bool) -> Self {
        if surface {
            ErrorPolicy::Surface
        } else {
            ErrorPolicy::Swallow
        }
    }

    pub fn surfaces(self) -> bool {
        matches!(self, ErrorPolicy::Surface)
    }

    /// Reduce a result to a success flag.
    ///
    /// Under `Surface` an error is returned as-is; under `Swallow` it is
    /// logged and reported as `Ok(false)`.
    pub fn check<T>(self, result: CacheResult<T>, operation: &'static str) -> CacheResult<bool> {
        match result {
            Ok(_) => Ok(true),
            Err(error) => self.absorb(error, operation).map(|()| false),
        }
    }

    /// Replace a swallowed error with `T::default()` (`None`, empty list).
    pub fn or_default<T: Default>(self, result: CacheResult<T>, operation: &'static str) -> CacheResult<T> {
        match result {
            Ok(value) => Ok(value),
            Err(error) => self.absorb(error, operation).map(|()| T::default()),
        }
    }

    pub(crate) fn absorb(self, error: CacheError, operation: &'static str) -> CacheResult<()> {
        match self {
            ErrorPolicy::Surface => Err(error),
            ErrorPolicy::Swallow => {
                tracing::error!(
                    error = %error,
                    code = error.code(),
                    operation,
                    "Swallowed cache error"
                );
                Ok(())
            }
        }
    }
}
