//! # Identity Resolver
//!
//! Produces the [`UserInfo`] a permission check runs against, either from a
//! user store (cached per uid) or directly from verified token claims.
//!
//! Nothing here returns an error to the caller. Missing users, store
//! failures, timeouts and unusable claims are logged and come back as
//! `None`, which callers must treat as a denial.
//!
//! ```text
//! claims ──► uid ──► role usable? ──yes──► UserInfo
//!                          │
//!                          no
//!                          ▼
//!                 get_user_info(uid) ──found──► UserInfo
//!                          │        └──failed──► None
//!                        absent
//!                          ▼
//!                 UserInfo with role `customer`
//! ```

use serde_json::Value;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use pos_rbac::validators::is_non_empty_id;
use pos_rbac::{Role, UserInfo};

use crate::cache::{CacheStats, PruneOutcome, TtlCache};
use crate::claims;
use crate::clock::{Clock, SystemClock};
use crate::config::IdentityConfig;
use crate::error::StoreResult;
use crate::store::{with_timeout, UserStore};

/// Resolves users from a store or from claims.
pub struct IdentityResolver {
    store: Arc<dyn UserStore>,
    cache: RwLock<TtlCache<String, UserInfo>>,
    clock: Arc<dyn Clock>,
    store_timeout: Duration,
}

impl IdentityResolver {
    /// Create a resolver over `store` using the wall clock.
    pub fn new(store: Arc<dyn UserStore>, config: &IdentityConfig) -> Self {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    /// Create a resolver with an explicit clock.
    pub fn with_clock(
        store: Arc<dyn UserStore>,
        config: &IdentityConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            cache: RwLock::new(TtlCache::new(
                config.user_info_ttl(),
                config.max_cache_size,
                config.cache_evict_ratio,
            )),
            clock,
            store_timeout: config.store_timeout(),
        }
    }

    /// Look a user up by uid.
    ///
    /// A live cached entry is returned as is. Otherwise the store is asked,
    /// and a found user is cached. Unknown users and failures are not.
    pub async fn get_user_info(&self, uid: &str) -> Option<UserInfo> {
        match self.lookup(uid).await {
            Ok(user) => user,
            Err(err) => {
                tracing::error!(uid = %uid, error = %err, "Failed to load user from store");
                None
            }
        }
    }

    /// `Ok(None)` when the store has no usable user, `Err` when it could
    /// not answer.
    async fn lookup(&self, uid: &str) -> StoreResult<Option<UserInfo>> {
        if !is_non_empty_id(uid) {
            tracing::warn!("User lookup with empty uid");
            return Ok(None);
        }

        let key = uid.to_string();
        if let Some(user) = self.cache.read().await.get(&key, self.clock.now_millis()) {
            tracing::debug!(uid = %uid, "User cache hit");
            return Ok(Some(user));
        }

        let Some(record) = with_timeout(self.store_timeout, self.store.get_user(uid)).await? else {
            tracing::warn!(uid = %uid, "User not found in store");
            return Ok(None);
        };

        let user = match record.to_user_info(uid) {
            Ok(Some(user)) => user,
            Ok(None) => return Ok(None),
            Err(err) => {
                tracing::error!(uid = %uid, error = %err, "Failed to map user record");
                return Ok(None);
            }
        };

        self.cache
            .write()
            .await
            .insert(key, user.clone(), self.clock.now_millis());
        Ok(Some(user))
    }

    /// Derive a user from verified token claims.
    ///
    /// Claims are not cached. When they carry no usable role the store is
    /// consulted; if it has no usable user the caller is treated as a
    /// `customer`, but if it fails or times out the result is `None`.
    /// Mistyped claims fall back to the store entirely.
    pub async fn get_user_info_from_claims(&self, claims: &Value) -> Option<UserInfo> {
        let object = match claims::as_object(claims) {
            Ok(object) => object,
            Err(err) => {
                tracing::error!(
                    error = %err,
                    "Claims are not an object; cannot derive user id from claims"
                );
                return None;
            }
        };
        let Some(uid) = claims::extract_uid(object) else {
            tracing::error!("No uid, sub or user_id; cannot derive user id from claims");
            return None;
        };

        let identity = match claims::extract_identity(&uid, object) {
            Ok(identity) => identity,
            Err(err) => {
                tracing::error!(
                    uid = %uid,
                    error = %err,
                    "Failed to read claims; falling back to user store"
                );
                return self.get_user_info(&uid).await;
            }
        };

        if let Some(role) = identity.role {
            return Some(identity.into_user_info(role));
        }

        tracing::warn!(uid = %uid, "No valid role in claims; consulting user store");
        match self.lookup(&uid).await {
            Ok(Some(user)) => Some(user),
            Ok(None) => {
                tracing::warn!(uid = %uid, "No role available; defaulting to customer");
                Some(identity.into_user_info(Role::Customer))
            }
            Err(err) => {
                tracing::error!(
                    uid = %uid,
                    error = %err,
                    "User store unavailable and claims carry no role"
                );
                None
            }
        }
    }

    /// Drop the cached entry for `uid`. Returns whether one was present.
    pub async fn invalidate(&self, uid: &str) -> bool {
        self.cache.write().await.remove(&uid.to_string())
    }

    /// Drop every cached user.
    pub async fn clear_cache(&self) {
        self.cache.write().await.clear();
    }

    /// User cache counters.
    pub async fn stats(&self) -> CacheStats {
        self.cache.read().await.stats()
    }

    /// Prune the user cache now.
    pub async fn prune(&self) -> PruneOutcome {
        let now = self.clock.now_millis();
        self.cache.write().await.prune(now)
    }

    /// Prune the cache every `interval` until the resolver is dropped.
    ///
    /// Each pass holds the cache's write lock, so a pass never overlaps
    /// another pass or a cache write.
    pub fn spawn_prune_task(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let resolver: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(resolver) = resolver.upgrade() else {
                    tracing::debug!("Identity resolver dropped; stopping prune task");
                    break;
                };
                resolver.prune().await;
            }
        })
    }
}

impl std::fmt::Debug for IdentityResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityResolver")
            .field("clock", &self.clock)
            .field("store_timeout", &self.store_timeout)
            .finish_non_exhaustive()
    }
}
