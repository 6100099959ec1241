//! # Stores
//!
//! Seams to the document store holding users and business records, with
//! in-memory implementations for tests and single-process deployments.
//!
//! [`CachedResourceStore`] wraps any [`ResourceStore`] with a TTL cache and
//! a call timeout, and can fill a [`PermissionContext`] with the record a
//! query targets.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use pos_rbac::{PermissionContext, PermissionQuery, Resource, Role, UserInfo};

use crate::cache::{CacheStats, TtlCache};
use crate::claims::{normalize_store_ids, parse_permissions};
use crate::clock::{Clock, SystemClock};
use crate::config::IdentityConfig;
use crate::error::{StoreError, StoreResult};

/// A user document as stored.
///
/// Fields are loosely typed: a record written by an older client may carry
/// a role the catalog no longer knows, or a non-array store list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    /// Role key
    #[serde(default)]
    pub role: Option<String>,

    /// Tenant
    #[serde(default)]
    pub tenant_id: Option<String>,

    /// Primary store
    #[serde(default)]
    pub store_id: Option<String>,

    /// Other stores; anything but an array of strings is ignored
    #[serde(default)]
    pub additional_store_ids: Option<Value>,

    /// Monetary permissions object
    #[serde(default)]
    pub permissions: Option<Value>,
}

impl UserRecord {
    /// A record with only a role.
    pub fn with_role(role: impl Into<String>) -> Self {
        Self {
            role: Some(role.into()),
            ..Self::default()
        }
    }

    /// Map to a [`UserInfo`].
    ///
    /// Returns `Ok(None)` when the role is missing or unknown; the record
    /// exists but cannot be authorized.
    pub fn to_user_info(&self, uid: &str) -> StoreResult<Option<UserInfo>> {
        let Some(role) = self.role.as_deref().and_then(Role::parse) else {
            tracing::warn!(
                uid = %uid,
                role = ?self.role,
                "User record has invalid role"
            );
            return Ok(None);
        };

        let permissions = match &self.permissions {
            Some(value @ Value::Object(_)) => parse_permissions("permissions", value.clone())
                .map_err(|e| StoreError::InvalidRecord {
                    id: uid.to_string(),
                    message: e.to_string(),
                })?,
            _ => Default::default(),
        };

        let mut user = UserInfo::new(uid, role)
            .with_additional_stores(
                self.additional_store_ids
                    .as_ref()
                    .map(normalize_store_ids)
                    .unwrap_or_default(),
            )
            .with_permissions(permissions);
        user.tenant_id = self.tenant_id.clone();
        user.store_id = self.store_id.clone();
        Ok(Some(user))
    }
}

/// Lookup of user documents by uid.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fetch a user, or `None` if there is no such uid.
    async fn get_user(&self, uid: &str) -> StoreResult<Option<UserRecord>>;
}

/// Users held in memory.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<String, UserRecord>>,
    calls: AtomicUsize,
}

impl MemoryUserStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a user.
    pub async fn insert(&self, uid: impl Into<String>, record: UserRecord) {
        self.users.write().await.insert(uid.into(), record);
    }

    /// Remove a user.
    pub async fn remove(&self, uid: &str) -> Option<UserRecord> {
        self.users.write().await.remove(uid)
    }

    /// Number of `get_user` calls served.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn get_user(&self, uid: &str) -> StoreResult<Option<UserRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.users.read().await.get(uid).cloned())
    }
}

/// Lookup of business records by type and id.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Fetch a record's fields, or `None` if it does not exist.
    async fn get_resource(
        &self,
        resource: Resource,
        id: &str,
    ) -> StoreResult<Option<Map<String, Value>>>;
}

/// Records held in memory.
#[derive(Debug, Default)]
pub struct MemoryResourceStore {
    records: RwLock<HashMap<(Resource, String), Map<String, Value>>>,
    calls: AtomicUsize,
}

impl MemoryResourceStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a record.
    pub async fn insert(&self, resource: Resource, id: impl Into<String>, fields: Map<String, Value>) {
        self.records.write().await.insert((resource, id.into()), fields);
    }

    /// Number of `get_resource` calls served.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResourceStore for MemoryResourceStore {
    async fn get_resource(
        &self,
        resource: Resource,
        id: &str,
    ) -> StoreResult<Option<Map<String, Value>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .records
            .read()
            .await
            .get(&(resource, id.to_string()))
            .cloned())
    }
}

/// Run a store call under a timeout.
pub(crate) async fn with_timeout<T, F>(timeout: Duration, call: F) -> StoreResult<T>
where
    F: std::future::Future<Output = StoreResult<T>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(timeout.as_millis() as u64)),
    }
}

type RecordKey = (Resource, String);

/// A [`ResourceStore`] fronted by a TTL cache.
///
/// Only found records are cached. Store failures and timeouts are returned
/// as errors and never cached.
pub struct CachedResourceStore {
    inner: Arc<dyn ResourceStore>,
    cache: RwLock<TtlCache<RecordKey, Map<String, Value>>>,
    clock: Arc<dyn Clock>,
    timeout: Duration,
}

impl CachedResourceStore {
    /// Wrap `inner` using the resource TTL and timeout from `config`.
    pub fn new(inner: Arc<dyn ResourceStore>, config: &IdentityConfig) -> Self {
        Self::with_clock(inner, config, Arc::new(SystemClock))
    }

    /// Wrap `inner` with an explicit clock.
    pub fn with_clock(
        inner: Arc<dyn ResourceStore>,
        config: &IdentityConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            inner,
            cache: RwLock::new(TtlCache::new(
                config.resource_info_ttl(),
                config.max_cache_size,
                config.cache_evict_ratio,
            )),
            clock,
            timeout: config.store_timeout(),
        }
    }

    /// Drop a cached record, e.g. after it was written.
    pub async fn invalidate(&self, resource: Resource, id: &str) -> bool {
        self.cache.write().await.remove(&(resource, id.to_string()))
    }

    /// Cache counters.
    pub async fn stats(&self) -> CacheStats {
        self.cache.read().await.stats()
    }

    /// Add the record targeted by `query` to `context.additional_data`.
    ///
    /// Callers may pass request parameters such as `requestedAmount` in the
    /// context; stored fields win on collision so ownership fields and
    /// `status` always come from the store. Without a resource id the context
    /// is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the record does not exist and
    /// the store's error on failure or timeout. Callers must deny on `Err`;
    /// checking without the record would skip ownership.
    pub async fn enrich_context(
        &self,
        query: &PermissionQuery,
        mut context: PermissionContext,
    ) -> StoreResult<PermissionContext> {
        let Some(id) = query.resource_id.as_deref() else {
            return Ok(context);
        };
        let record = match self.get_resource(query.resource, id).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                tracing::debug!(resource = %query.resource, id = %id, "No record to enrich context");
                return Err(StoreError::NotFound {
                    resource: query.resource.to_string(),
                    id: id.to_string(),
                });
            }
            Err(err) => {
                tracing::error!(
                    resource = %query.resource,
                    id = %id,
                    error = %err,
                    "Failed to load record for permission context"
                );
                return Err(err);
            }
        };

        let mut data = context.additional_data.take().unwrap_or_default();
        data.extend(record);
        context.additional_data = Some(data);
        Ok(context)
    }
}

#[async_trait]
impl ResourceStore for CachedResourceStore {
    async fn get_resource(
        &self,
        resource: Resource,
        id: &str,
    ) -> StoreResult<Option<Map<String, Value>>> {
        let key = (resource, id.to_string());
        if let Some(hit) = self.cache.read().await.get(&key, self.clock.now_millis()) {
            return Ok(Some(hit));
        }

        let found = with_timeout(self.timeout, self.inner.get_resource(resource, id)).await?;
        if let Some(record) = &found {
            self.cache
                .write()
                .await
                .insert(key, record.clone(), self.clock.now_millis());
        }
        Ok(found)
    }
}

impl std::fmt::Debug for CachedResourceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedResourceStore")
            .field("clock", &self.clock)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
