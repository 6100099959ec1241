//! Identity cache and store configuration.
//!
//! Defaults suit a single store-front process. Every value can be overridden
//! from the environment.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{ConfigError, ConfigResult};

/// How long a resolved user stays cached.
pub const USER_INFO_TTL: Duration = Duration::from_secs(5 * 60);

/// How long an authorization decision stays cached.
pub const PERMISSION_CHECK_TTL: Duration = Duration::from_secs(60);

/// How long a fetched resource record stays cached.
pub const RESOURCE_INFO_TTL: Duration = Duration::from_secs(2 * 60);

/// Entry count above which the oldest entries are evicted.
pub const MAX_CACHE_SIZE: usize = 1000;

/// Share of the cache evicted when it overflows.
pub const CACHE_EVICT_RATIO: f64 = 0.2;

/// Upper bound on a single store call.
pub const STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Cache and store settings for identity resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityConfig {
    /// TTL of cached users, in milliseconds.
    pub user_info_ttl_ms: u64,

    /// TTL of cached authorization decisions, in milliseconds.
    pub permission_check_ttl_ms: u64,

    /// TTL of cached resource records, in milliseconds.
    pub resource_info_ttl_ms: u64,

    /// Maximum entries per cache before eviction.
    pub max_cache_size: usize,

    /// Share of entries evicted on overflow, in `(0, 1]`.
    pub cache_evict_ratio: f64,

    /// Store call timeout, in milliseconds.
    pub store_timeout_ms: u64,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            user_info_ttl_ms: USER_INFO_TTL.as_millis() as u64,
            permission_check_ttl_ms: PERMISSION_CHECK_TTL.as_millis() as u64,
            resource_info_ttl_ms: RESOURCE_INFO_TTL.as_millis() as u64,
            max_cache_size: MAX_CACHE_SIZE,
            cache_evict_ratio: CACHE_EVICT_RATIO,
            store_timeout_ms: STORE_TIMEOUT.as_millis() as u64,
        }
    }
}

impl IdentityConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `USER_INFO_TTL_MS`: user cache TTL (default: 300000)
    /// - `PERMISSION_CHECK_TTL_MS`: decision cache TTL (default: 60000)
    /// - `RESOURCE_INFO_TTL_MS`: resource cache TTL (default: 120000)
    /// - `MAX_CACHE_SIZE`: maximum entries per cache (default: 1000)
    /// - `CACHE_EVICT_RATIO`: share evicted on overflow (default: 0.2)
    /// - `STORE_TIMEOUT_MS`: store call timeout (default: 5000)
    ///
    /// Unset variables keep their defaults; unparsable ones are an error.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let default = Self::default();
        let config = Self {
            user_info_ttl_ms: parse_or(&lookup, "USER_INFO_TTL_MS", default.user_info_ttl_ms)?,
            permission_check_ttl_ms: parse_or(
                &lookup,
                "PERMISSION_CHECK_TTL_MS",
                default.permission_check_ttl_ms,
            )?,
            resource_info_ttl_ms: parse_or(
                &lookup,
                "RESOURCE_INFO_TTL_MS",
                default.resource_info_ttl_ms,
            )?,
            max_cache_size: parse_or(&lookup, "MAX_CACHE_SIZE", default.max_cache_size)?,
            cache_evict_ratio: parse_or(&lookup, "CACHE_EVICT_RATIO", default.cache_evict_ratio)?,
            store_timeout_ms: parse_or(&lookup, "STORE_TIMEOUT_MS", default.store_timeout_ms)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check that every value is usable.
    pub fn validate(&self) -> ConfigResult<()> {
        let ttls = [
            ("USER_INFO_TTL_MS", self.user_info_ttl_ms),
            ("PERMISSION_CHECK_TTL_MS", self.permission_check_ttl_ms),
            ("RESOURCE_INFO_TTL_MS", self.resource_info_ttl_ms),
            ("STORE_TIMEOUT_MS", self.store_timeout_ms),
        ];
        for (key, value) in ttls {
            if value == 0 {
                return Err(invalid(key, "must be greater than zero"));
            }
        }
        if self.max_cache_size == 0 {
            return Err(invalid("MAX_CACHE_SIZE", "must be greater than zero"));
        }
        if !(self.cache_evict_ratio > 0.0 && self.cache_evict_ratio <= 1.0) {
            return Err(invalid("CACHE_EVICT_RATIO", "must be in (0, 1]"));
        }
        Ok(())
    }

    /// User cache TTL.
    pub fn user_info_ttl(&self) -> Duration {
        Duration::from_millis(self.user_info_ttl_ms)
    }

    /// Decision cache TTL.
    pub fn permission_check_ttl(&self) -> Duration {
        Duration::from_millis(self.permission_check_ttl_ms)
    }

    /// Resource cache TTL.
    pub fn resource_info_ttl(&self) -> Duration {
        Duration::from_millis(self.resource_info_ttl_ms)
    }

    /// Store call timeout.
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> ConfigResult<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| invalid(key, &e.to_string())),
    }
}

fn invalid(key: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    }
}
