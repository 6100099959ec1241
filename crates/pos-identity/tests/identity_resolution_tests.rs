//! End-to-end tests for identity resolution and authorization.
//!
//! Scenarios:
//! 1. Store-backed lookups are cached, bounded and expire
//! 2. Claims from different issuers normalize to the same user
//! 3. A request flows from claims and a stored record to a decision

use std::sync::Arc;
use std::time::Duration;

use pos_identity::{
    Authorizer, CachedResourceStore, IdentityConfig, IdentityResolver, ManualClock,
    MemoryResourceStore, MemoryUserStore, UserRecord,
};
use pos_rbac::{Action, PermissionContext, PermissionQuery, PermissionResolver, Resource, Role};
use serde_json::{json, Map, Value};

/// Test fixture with a seeded user store and a manual clock.
struct Fixture {
    users: Arc<MemoryUserStore>,
    clock: Arc<ManualClock>,
    resolver: Arc<IdentityResolver>,
}

impl Fixture {
    async fn new(config: IdentityConfig, user_count: usize) -> Self {
        let users = Arc::new(MemoryUserStore::new());
        for i in 0..user_count {
            users
                .insert(
                    format!("user-{i}"),
                    UserRecord {
                        tenant_id: Some("acme".into()),
                        store_id: Some("downtown".into()),
                        ..UserRecord::with_role("staff")
                    },
                )
                .await;
        }
        let clock = Arc::new(ManualClock::new(1_700_000_000_000));
        let resolver = Arc::new(IdentityResolver::with_clock(
            users.clone(),
            &config,
            clock.clone(),
        ));
        Self {
            users,
            clock,
            resolver,
        }
    }
}

fn record(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => panic!("record must be an object"),
    }
}

#[tokio::test]
async fn test_same_uid_twice_within_ttl_hits_store_once() {
    let fx = Fixture::new(IdentityConfig::default(), 1).await;

    let first = fx.resolver.get_user_info("user-0").await.unwrap();
    fx.clock.advance(Duration::from_secs(60));
    let second = fx.resolver.get_user_info("user-0").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(fx.users.calls(), 1);
}

#[tokio::test]
async fn test_cache_stays_bounded_and_evicts_oldest_first() {
    let config = IdentityConfig {
        max_cache_size: 10,
        ..IdentityConfig::default()
    };
    let fx = Fixture::new(config, 11).await;

    for i in 0..11 {
        fx.resolver.get_user_info(&format!("user-{i}")).await.unwrap();
        fx.clock.advance(Duration::from_millis(10));
    }

    // The 11th write overflowed: ceil(0.2 * 11) = 3 oldest evicted.
    let stats = fx.resolver.stats().await;
    assert_eq!(stats.entries, 8);
    assert_eq!(stats.evicted, 3);

    let calls = fx.users.calls();
    for i in 3..11 {
        fx.resolver.get_user_info(&format!("user-{i}")).await.unwrap();
    }
    assert_eq!(fx.users.calls(), calls);

    fx.resolver.get_user_info("user-0").await.unwrap();
    assert_eq!(fx.users.calls(), calls + 1);
}

#[tokio::test]
async fn test_expired_entries_are_pruned() {
    let fx = Fixture::new(IdentityConfig::default(), 2).await;
    fx.resolver.get_user_info("user-0").await.unwrap();
    fx.clock.advance(Duration::from_secs(200));
    fx.resolver.get_user_info("user-1").await.unwrap();

    // user-0 is now 300 s old, user-1 100 s.
    fx.clock.advance(Duration::from_secs(100));
    let outcome = fx.resolver.prune().await;
    assert_eq!(outcome.expired, 1);
    assert_eq!(fx.resolver.stats().await.entries, 1);

    let calls = fx.users.calls();
    fx.resolver.get_user_info("user-1").await.unwrap();
    assert_eq!(fx.users.calls(), calls);
}

#[tokio::test]
async fn test_claims_from_different_issuers_agree() {
    let fx = Fixture::new(IdentityConfig::default(), 0).await;

    let modern = json!({
        "uid": "e-1",
        "role": "shift_leader",
        "tenantId": "acme",
        "storeId": "downtown",
        "additionalStoreIds": ["uptown"],
        "permissions": {"canRefund": true, "maxRefundAmount": 100}
    });
    let legacy = json!({
        "sub": "e-1",
        "roles": ["manager", "shift_leader"],
        "tenant_id": "acme",
        "store_id": "downtown",
        "additional_store_ids": ["uptown", "", null, 7],
        "canRefund": true,
        "maxRefundAmount": 100
    });

    let a = fx.resolver.get_user_info_from_claims(&modern).await.unwrap();
    let b = fx.resolver.get_user_info_from_claims(&legacy).await.unwrap();
    assert_eq!(a, b);
    assert_eq!(a.role, Role::ShiftLeader);
    assert!(a.is_assigned_to_store("uptown"));
}

#[tokio::test]
async fn test_refund_request_end_to_end() {
    let fx = Fixture::new(IdentityConfig::default(), 0).await;
    let config = IdentityConfig::default();

    let records = Arc::new(MemoryResourceStore::new());
    records
        .insert(
            Resource::Orders,
            "o-77",
            record(json!({"customerId": "c-5", "orderTotal": 80, "status": "completed"})),
        )
        .await;
    let records = CachedResourceStore::with_clock(records, &config, fx.clock.clone());
    let authorizer = Authorizer::with_clock(
        fx.resolver.clone(),
        PermissionResolver::new(),
        &config,
        fx.clock.clone(),
    );

    let claims = json!({
        "uid": "e-1",
        "role": "shift_leader",
        "tenantId": "acme",
        "storeId": "downtown",
        "permissions": {"canRefund": true, "maxRefundAmount": 100}
    });
    let query = PermissionQuery::for_resource(Action::Refund, Resource::Orders, "o-77");
    let request = |amount: u32| {
        PermissionContext::new()
            .with_tenant("acme")
            .with_store("downtown")
            .with_data("requestedAmount", amount)
    };

    let ctx = records.enrich_context(&query, request(60)).await.unwrap();
    assert!(authorizer.authorize(&claims, &query, Some(&ctx)).await.granted);

    let ctx = records.enrich_context(&query, request(90)).await.unwrap();
    let result = authorizer.authorize(&claims, &query, Some(&ctx)).await;
    assert!(!result.granted);
    assert!(result.reason().contains("exceeds order total"));

    let other_store = PermissionContext::new().with_tenant("acme").with_store("uptown");
    let result = authorizer.authorize(&claims, &query, Some(&other_store)).await;
    assert!(result.reason().contains("Cross-store access"));
}
