//! Claims in, decision out.
//!
//! [`Authorizer`] chains identity resolution and the permission pipeline,
//! and caches decisions that depend only on the user and the query.

use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;

use pos_rbac::{
    PermissionContext, PermissionQuery, PermissionResolver, PermissionResult, Role, UserInfo,
};

use crate::cache::{CacheStats, TtlCache};
use crate::clock::{Clock, SystemClock};
use crate::config::IdentityConfig;
use crate::resolver::IdentityResolver;

/// Everything a cacheable decision depends on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct DecisionKey {
    uid: String,
    role: Role,
    tenant_id: Option<String>,
    store_id: Option<String>,
    additional_store_ids: Vec<String>,
    query: PermissionQuery,
    context: Option<(Option<String>, Option<String>)>,
}

impl DecisionKey {
    /// `None` when the context carries record data, since ownership and
    /// business rules then depend on more than the key.
    fn for_request(
        user: &UserInfo,
        query: &PermissionQuery,
        context: Option<&PermissionContext>,
    ) -> Option<Self> {
        if context.is_some_and(|c| c.additional_data.is_some()) {
            return None;
        }
        Some(Self {
            uid: user.uid.clone(),
            role: user.role,
            tenant_id: user.tenant_id.clone(),
            store_id: user.store_id.clone(),
            additional_store_ids: user.additional_store_ids.clone(),
            query: query.clone(),
            context: context.map(|c| (c.tenant_id.clone(), c.store_id.clone())),
        })
    }
}

/// Authorizes requests carrying verified token claims.
///
/// # Example
///
/// ```
/// use pos_identity::{Authorizer, IdentityConfig, IdentityResolver, MemoryUserStore};
/// use pos_rbac::{Action, PermissionQuery, PermissionResolver, Resource};
/// use serde_json::json;
/// use std::sync::Arc;
///
/// let rt = tokio::runtime::Runtime::new().unwrap();
/// rt.block_on(async {
///     let config = IdentityConfig::default();
///     let identity = Arc::new(IdentityResolver::new(Arc::new(MemoryUserStore::new()), &config));
///     let authorizer = Authorizer::new(identity, PermissionResolver::new(), &config);
///
///     let claims = json!({"sub": "u1", "role": "customer"});
///     let menu = PermissionQuery::new(Action::Read, Resource::MenuItems);
///     assert!(authorizer.authorize(&claims, &menu, None).await.granted);
///
///     let payroll = PermissionQuery::new(Action::Read, Resource::Payrolls);
///     assert!(!authorizer.authorize(&claims, &payroll, None).await.granted);
/// });
/// ```
pub struct Authorizer {
    identity: Arc<IdentityResolver>,
    permissions: PermissionResolver,
    decisions: RwLock<TtlCache<DecisionKey, PermissionResult>>,
    clock: Arc<dyn Clock>,
}

impl Authorizer {
    /// Create an authorizer using the wall clock.
    pub fn new(
        identity: Arc<IdentityResolver>,
        permissions: PermissionResolver,
        config: &IdentityConfig,
    ) -> Self {
        Self::with_clock(identity, permissions, config, Arc::new(SystemClock))
    }

    /// Create an authorizer with an explicit clock.
    pub fn with_clock(
        identity: Arc<IdentityResolver>,
        permissions: PermissionResolver,
        config: &IdentityConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            identity,
            permissions,
            decisions: RwLock::new(TtlCache::new(
                config.permission_check_ttl(),
                config.max_cache_size,
                config.cache_evict_ratio,
            )),
            clock,
        }
    }

    /// The identity resolver in use.
    pub fn identity(&self) -> &Arc<IdentityResolver> {
        &self.identity
    }

    /// Resolve the caller from `claims`, then check `query`.
    pub async fn authorize(
        &self,
        claims: &Value,
        query: &PermissionQuery,
        context: Option<&PermissionContext>,
    ) -> PermissionResult {
        match self.identity.get_user_info_from_claims(claims).await {
            Some(user) => self.authorize_user(&user, query, context).await,
            None => {
                tracing::warn!(query = %query, "Denying request without resolvable identity");
                PermissionResult::denied("Unable to resolve user identity")
            }
        }
    }

    /// Check `query` for an already resolved user.
    pub async fn authorize_user(
        &self,
        user: &UserInfo,
        query: &PermissionQuery,
        context: Option<&PermissionContext>,
    ) -> PermissionResult {
        let Some(key) = DecisionKey::for_request(user, query, context) else {
            return self.permissions.has_permission(user, query, context);
        };

        if let Some(cached) = self.decisions.read().await.get(&key, self.clock.now_millis()) {
            tracing::debug!(uid = %user.uid, query = %query, "Decision cache hit");
            return cached;
        }

        let result = self.permissions.has_permission(user, query, context);
        self.decisions
            .write()
            .await
            .insert(key, result.clone(), self.clock.now_millis());
        result
    }

    /// Forget every cached decision, e.g. after a catalog or role change.
    pub async fn clear_decisions(&self) {
        self.decisions.write().await.clear();
    }

    /// Decision cache counters.
    pub async fn decision_stats(&self) -> CacheStats {
        self.decisions.read().await.stats()
    }
}

impl std::fmt::Debug for Authorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authorizer")
            .field("identity", &self.identity)
            .field("permissions", &self.permissions)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::store::{MemoryUserStore, UserRecord};
    use pos_rbac::{Action, Resource};
    use serde_json::json;
    use std::time::Duration;

    struct Fixture {
        clock: Arc<ManualClock>,
        authorizer: Authorizer,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryUserStore::new());
        store
            .insert(
                "m1",
                UserRecord {
                    tenant_id: Some("t1".into()),
                    store_id: Some("s1".into()),
                    ..UserRecord::with_role("store_manager")
                },
            )
            .await;
        let config = IdentityConfig::default();
        let clock = Arc::new(ManualClock::new(0));
        let identity = Arc::new(IdentityResolver::with_clock(store, &config, clock.clone()));
        let authorizer =
            Authorizer::with_clock(identity, PermissionResolver::new(), &config, clock.clone());
        Fixture { clock, authorizer }
    }

    #[tokio::test]
    async fn test_unresolvable_identity_is_denied() {
        let fx = fixture().await;
        let query = PermissionQuery::new(Action::Read, Resource::Orders);
        let result = fx.authorizer.authorize(&json!({"role": "staff"}), &query, None).await;
        assert!(!result.granted);
        assert_eq!(result.reason(), "Unable to resolve user identity");
    }

    #[tokio::test]
    async fn test_claims_flow_through_pipeline() {
        let fx = fixture().await;
        let claims = json!({"uid": "s9", "role": "staff", "tenant_id": "t1", "store_id": "s1"});
        let query = PermissionQuery::new(Action::Update, Resource::Orders);

        let ctx = PermissionContext::new().with_tenant("t1").with_store("s1");
        assert!(fx.authorizer.authorize(&claims, &query, Some(&ctx)).await.granted);

        let elsewhere = PermissionContext::new().with_tenant("t1").with_store("s2");
        let result = fx.authorizer.authorize(&claims, &query, Some(&elsewhere)).await;
        assert!(result.reason().contains("Cross-store access"));
    }

    #[tokio::test]
    async fn test_role_from_store_when_claims_lack_one() {
        let fx = fixture().await;
        let query = PermissionQuery::new(Action::Approve, Resource::Payrolls);
        let ctx = PermissionContext::new().with_tenant("t1").with_store("s1");
        let result = fx.authorizer.authorize(&json!({"uid": "m1"}), &query, Some(&ctx)).await;
        assert!(result.granted);
    }

    #[tokio::test]
    async fn test_decisions_are_cached_without_record_data() {
        let fx = fixture().await;
        let user = UserInfo::new("s9", Role::Staff).with_tenant("t1").with_store("s1");
        let query = PermissionQuery::new(Action::Read, Resource::Orders);
        let ctx = PermissionContext::new().with_tenant("t1").with_store("s1");

        for _ in 0..3 {
            assert!(fx.authorizer.authorize_user(&user, &query, Some(&ctx)).await.granted);
        }
        let stats = fx.authorizer.decision_stats().await;
        assert_eq!((stats.hits, stats.misses, stats.entries), (2, 1, 1));

        // A different role is a different decision.
        let trainee = UserInfo::new("s9", Role::Trainee).with_tenant("t1").with_store("s1");
        fx.authorizer.authorize_user(&trainee, &query, Some(&ctx)).await;
        assert_eq!(fx.authorizer.decision_stats().await.entries, 2);

        fx.clock.advance(Duration::from_secs(60));
        fx.authorizer.authorize_user(&user, &query, Some(&ctx)).await;
        assert_eq!(fx.authorizer.decision_stats().await.misses, 3);

        fx.authorizer.clear_decisions().await;
        assert_eq!(fx.authorizer.decision_stats().await.entries, 0);
    }

    #[tokio::test]
    async fn test_record_data_bypasses_decision_cache() {
        let fx = fixture().await;
        let customer = UserInfo::new("c1", Role::Customer).with_tenant("t1");
        let query = PermissionQuery::for_resource(Action::Read, Resource::Orders, "o1");

        let mine = PermissionContext::new().with_tenant("t1").with_data("customerId", "c1");
        let theirs = PermissionContext::new().with_tenant("t1").with_data("customerId", "c2");
        assert!(fx.authorizer.authorize_user(&customer, &query, Some(&mine)).await.granted);
        assert!(!fx.authorizer.authorize_user(&customer, &query, Some(&theirs)).await.granted);
        assert_eq!(fx.authorizer.decision_stats().await, CacheStats::default());
    }
}
