//! # POS Identity
//!
//! This crate resolves who is calling before `pos-rbac` decides what they
//! may do.
//!
//! ## Overview
//!
//! The pos-identity crate handles:
//! - **Claims**: Normalizing verified token claims from mixed naming conventions
//! - **Stores**: Async seams to the user and record stores, with timeouts
//! - **Caching**: TTL + size-bounded caches for users, records and decisions
//! - **Authorizer**: Claims in, [`PermissionResult`](pos_rbac::PermissionResult) out
//!
//! ## Architecture
//!
//! ```text
//! claims ──► IdentityResolver ──► PermissionResolver ──► granted / reason
//!                  │
//!                  │ no usable role
//!                  ▼
//!              UserStore   (cached per uid for USER_INFO_TTL)
//! ```
//!
//! ## Failure Policy
//!
//! Store failures, timeouts and malformed claims are logged with `tracing`
//! and resolve to `None` or a denial. The one exception is
//! [`CachedResourceStore::enrich_context`], which returns the store error so
//! the caller can deny instead of checking without the record.
//!
//! ## Configuration
//!
//! See [`IdentityConfig`]. Defaults:
//! - `USER_INFO_TTL`: 5 minutes
//! - `PERMISSION_CHECK_TTL`: 1 minute
//! - `RESOURCE_INFO_TTL`: 2 minutes
//! - `MAX_CACHE_SIZE`: 1000 entries, evicting the oldest 20% on overflow
//! - `STORE_TIMEOUT`: 5 seconds

pub mod authorizer;
pub mod cache;
pub mod claims;
pub mod clock;
pub mod config;
pub mod error;
pub mod resolver;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export main types for convenience
pub use authorizer::Authorizer;
pub use cache::{prune, CacheEntry, CacheStats, PruneOutcome, TtlCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::IdentityConfig;
pub use error::{ClaimsError, ClaimsResult, ConfigError, ConfigResult, StoreError, StoreResult};
pub use resolver::IdentityResolver;
pub use store::{
    CachedResourceStore, MemoryResourceStore, MemoryUserStore, ResourceStore, UserRecord,
    UserStore,
};
