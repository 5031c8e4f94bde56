//! Store connection configuration.
//!
//! Configuration is an explicit value handed to a gateway when it is built.
//! There is no process-wide connection holder.

use crate::{CacheResult, ConfigError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable holding the store URL.
pub const ENV_STORE_URL: &str = "SCOPECACHE_STORE_URL";
/// Environment variable capping unbounded `load_many` calls.
pub const ENV_MAX_ROWS: &str = "SCOPECACHE_MAX_ROWS";
/// Environment variable for the per-query timeout in milliseconds.
pub const ENV_QUERY_TIMEOUT_MS: &str = "SCOPECACHE_QUERY_TIMEOUT_MS";

const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for a store gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Connection URL, e.g. `postgres://localhost/app` or `memory://tests`.
    pub url: String,
    /// Upper bound on rows returned by a `load_many` without an explicit limit.
    pub max_rows: Option<usize>,
    /// Per-query timeout.
    pub query_timeout: Duration,
}

impl StoreConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_rows: None,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }

    /// Create a StoreConfig from environment variables.
    ///
    /// Environment variables:
    /// - `SCOPECACHE_STORE_URL`: store URL (required)
    /// - `SCOPECACHE_MAX_ROWS`: row cap for unbounded loads (default: none)
    /// - `SCOPECACHE_QUERY_TIMEOUT_MS`: query timeout (default: 30000)
    pub fn from_env() -> CacheResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`StoreConfig::from_env`] but reading from an arbitrary source.
    pub fn from_lookup<F>(lookup: F) -> CacheResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup(ENV_STORE_URL)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ConfigError::MissingRequired {
                field: ENV_STORE_URL.to_string(),
            })?;

        let max_rows = match lookup(ENV_MAX_ROWS) {
            Some(raw) => Some(parse_field(ENV_MAX_ROWS, &raw)?),
            None => None,
        };

        let query_timeout = match lookup(ENV_QUERY_TIMEOUT_MS) {
            Some(raw) => Duration::from_millis(parse_field(ENV_QUERY_TIMEOUT_MS, &raw)?),
            None => DEFAULT_QUERY_TIMEOUT,
        };

        let config = Self {
            url,
            max_rows,
            query_timeout,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = Some(max_rows);
        self
    }

    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    /// URL scheme (the part before `://`), if present.
    pub fn scheme(&self) -> Option<&str> {
        self.url.split_once("://").map(|(scheme, _)| scheme)
    }

    /// Validate the configuration.
    ///
    /// Validates:
    /// - url is non-empty and carries a scheme
    /// - max_rows, when set, is positive
    /// - query_timeout is positive
    pub fn validate(&self) -> CacheResult<()> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "url".to_string(),
            }
            .into());
        }

        match self.scheme() {
            Some(scheme) if !scheme.is_empty() => {}
            _ => {
                return Err(ConfigError::InvalidValue {
                    field: "url".to_string(),
                    value: self.url.clone(),
                    reason: "must be of the form <scheme>://<location>".to_string(),
                }
                .into());
            }
        }

        if self.max_rows == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "max_rows".to_string(),
                value: "0".to_string(),
                reason: "must be positive".to_string(),
            }
            .into());
        }

        if self.query_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "query_timeout".to_string(),
                value: format!("{:?}", self.query_timeout),
                reason: "must be positive".to_string(),
            }
            .into());
        }

        Ok(())
    }
}

fn parse_field<T: std::str::FromStr>(field: &str, raw: &str) -> CacheResult<T> {
    raw.trim().parse().map_err(|_| {
        ConfigError::InvalidValue {
            field: field.to_string(),
            value: raw.to_string(),
            reason: "not a valid number".to_string(),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CacheError;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_new_config_is_valid() {
        let config = StoreConfig::new("memory://unit");
        assert!(config.validate().is_ok());
        assert_eq!(config.scheme(), Some("memory"));
        assert_eq!(config.query_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_builder_setters() {
        let config = StoreConfig::new("postgres://localhost/app")
            .with_max_rows(500)
            .with_query_timeout(Duration::from_millis(250));
        assert_eq!(config.max_rows, Some(500));
        assert_eq!(config.query_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(StoreConfig::new("").validate().is_err());
        assert!(StoreConfig::new("localhost").validate().is_err());
        assert!(StoreConfig::new("memory://x")
            .with_max_rows(0)
            .validate()
            .is_err());
        assert!(StoreConfig::new("memory://x")
            .with_query_timeout(Duration::ZERO)
            .validate()
            .is_err());
    }

    #[test]
    fn test_from_lookup_requires_url() {
        let err = StoreConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(
            err,
            CacheError::Config(ConfigError::MissingRequired { .. })
        ));
    }

    #[test]
    fn test_from_lookup_reads_all_fields() {
        let config = StoreConfig::from_lookup(lookup_from(&[
            (ENV_STORE_URL, "memory://env"),
            (ENV_MAX_ROWS, "25"),
            (ENV_QUERY_TIMEOUT_MS, "1500"),
        ]))
        .unwrap();
        assert_eq!(config.url, "memory://env");
        assert_eq!(config.max_rows, Some(25));
        assert_eq!(config.query_timeout, Duration::from_millis(1500));
    }

    #[test]
    fn test_from_lookup_rejects_garbage_numbers() {
        let err = StoreConfig::from_lookup(lookup_from(&[
            (ENV_STORE_URL, "memory://env"),
            (ENV_MAX_ROWS, "lots"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains(ENV_MAX_ROWS));
    }
}
