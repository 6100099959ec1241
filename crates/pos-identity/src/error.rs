//! Error types for identity resolution
//!
//! [`IdentityResolver`] and [`Authorizer`] log these and degrade to `None`
//! or a denial. Record enrichment hands [`StoreError`] back to the caller.
//!
//! [`IdentityResolver`]: crate::IdentityResolver
//! [`Authorizer`]: crate::Authorizer

use thiserror::Error;

/// Failures of a user or resource store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The backend failed (connection, query, permissions)
    #[error("Store backend error: {0}")]
    Backend(String),

    /// The call did not finish within the configured timeout
    #[error("Store call timed out after {0} ms")]
    Timeout(u64),

    /// The requested record does not exist
    #[error("No {resource} record with id {id}")]
    NotFound {
        /// Resource key
        resource: String,
        /// Record id
        id: String,
    },

    /// A record was found but could not be mapped
    #[error("Invalid store record for {id}: {message}")]
    InvalidRecord {
        /// Record id
        id: String,
        /// What was wrong with it
        message: String,
    },
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Claims that cannot be turned into a user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClaimsError {
    /// The claims value is not a JSON object
    #[error("Claims must be a JSON object")]
    NotAnObject,

    /// A field is present but unusable
    #[error("Invalid claim {field}: {message}")]
    InvalidField {
        /// Claim name
        field: String,
        /// Error message
        message: String,
    },
}

/// Result type for claims extraction.
pub type ClaimsResult<T> = Result<T, ClaimsError>;

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Invalid configuration value.
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue {
        /// Configuration key.
        key: String,
        /// Error message.
        message: String,
    },
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;
