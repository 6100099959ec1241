//! Error types for catalog lookups and business-rule evaluation
//!
//! None of these escape [`PermissionResolver`](crate::PermissionResolver):
//! the resolver turns every one of them into a denial with a reason.

use thiserror::Error;

/// A name that does not exist in the permission catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// Role key not present in the catalog
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    /// Resource key not present in the catalog
    #[error("Unknown resource: {0}")]
    UnknownResource(String),

    /// Action key not present in the catalog
    #[error("Unknown action: {0}")]
    UnknownAction(String),

    /// Business rule name with no registered strategy
    #[error("Unknown business rule: {0}")]
    UnknownRule(String),

    /// Malformed `resource:action[:id]` permission string
    #[error("Invalid permission string: {0}")]
    InvalidPermission(String),
}

/// Result type for catalog lookups.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Why a business rule refused an operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct RuleViolation(pub String);

impl RuleViolation {
    /// Create a violation with a human-readable detail.
    pub fn new(detail: impl Into<String>) -> Self {
        Self(detail.into())
    }
}
