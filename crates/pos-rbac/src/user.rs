//! # User Info
//!
//! Normalized identity of a caller, as consumed by the permission resolver.

use serde::{Deserialize, Serialize};

use crate::roles::Role;

/// Per-user monetary permissions.
///
/// Every field is optional: a missing flag is treated as `false` and a
/// missing ceiling as `0`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPermissions {
    /// May apply discounts to orders.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_discount: Option<bool>,

    /// Highest discount percentage the user may apply.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_discount_percentage: Option<f64>,

    /// May issue refunds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_refund: Option<bool>,

    /// Highest single refund amount the user may issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_refund_amount: Option<f64>,
}

impl UserPermissions {
    /// Check if no permission is set.
    pub fn is_empty(&self) -> bool {
        self == &UserPermissions::default()
    }

    /// Whether discounts are allowed at all.
    pub fn discount_allowed(&self) -> bool {
        self.can_discount.unwrap_or(false)
    }

    /// Whether refunds are allowed at all.
    pub fn refund_allowed(&self) -> bool {
        self.can_refund.unwrap_or(false)
    }

    /// Allow discounts up to `max_percentage`.
    pub fn with_discount(mut self, max_percentage: f64) -> Self {
        self.can_discount = Some(true);
        self.max_discount_percentage = Some(max_percentage);
        self
    }

    /// Allow refunds up to `max_amount`.
    pub fn with_refund(mut self, max_amount: f64) -> Self {
        self.can_refund = Some(true);
        self.max_refund_amount = Some(max_amount);
        self
    }
}

/// Identity of the caller a permission check runs against.
///
/// # Example
///
/// ```
/// use pos_rbac::{Role, UserInfo};
///
/// let user = UserInfo::new("u-1", Role::Staff)
///     .with_tenant("t-1")
///     .with_store("s-1")
///     .with_additional_stores(vec!["s-2".to_string()]);
///
/// assert_eq!(user.role_level, 5);
/// assert!(user.is_assigned_to_store("s-2"));
/// assert!(!user.is_assigned_to_store("s-3"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "UserInfoFields")]
pub struct UserInfo {
    /// User id
    pub uid: String,

    /// Role
    pub role: Role,

    /// Rank of `role`; always `role.level()`
    pub role_level: u8,

    /// Tenant the user belongs to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,

    /// Primary store
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_id: Option<String>,

    /// Other stores the user may work in
    #[serde(default)]
    pub additional_store_ids: Vec<String>,

    /// Monetary permissions
    #[serde(default)]
    pub permissions: UserPermissions,
}

/// Wire form of [`UserInfo`]. `roleLevel` may be omitted but must match
/// `role` when present.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserInfoFields {
    uid: String,
    role: Role,
    #[serde(default)]
    role_level: Option<u8>,
    #[serde(default)]
    tenant_id: Option<String>,
    #[serde(default)]
    store_id: Option<String>,
    #[serde(default)]
    additional_store_ids: Vec<String>,
    #[serde(default)]
    permissions: UserPermissions,
}

impl TryFrom<UserInfoFields> for UserInfo {
    type Error = String;

    fn try_from(fields: UserInfoFields) -> Result<Self, Self::Error> {
        if let Some(level) = fields.role_level {
            if level != fields.role.level() {
                return Err(format!(
                    "roleLevel {} does not match role '{}' (level {})",
                    level,
                    fields.role,
                    fields.role.level()
                ));
            }
        }
        Ok(Self {
            uid: fields.uid,
            role: fields.role,
            role_level: fields.role.level(),
            tenant_id: fields.tenant_id,
            store_id: fields.store_id,
            additional_store_ids: fields.additional_store_ids,
            permissions: fields.permissions,
        })
    }
}

impl UserInfo {
    /// Create a user with no tenant, store or permissions.
    pub fn new(uid: impl Into<String>, role: Role) -> Self {
        Self {
            uid: uid.into(),
            role,
            role_level: role.level(),
            tenant_id: None,
            store_id: None,
            additional_store_ids: Vec::new(),
            permissions: UserPermissions::default(),
        }
    }

    /// Set the tenant.
    pub fn with_tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    /// Set the primary store.
    pub fn with_store(mut self, store_id: impl Into<String>) -> Self {
        self.store_id = Some(store_id.into());
        self
    }

    /// Set the additional stores.
    pub fn with_additional_stores(mut self, store_ids: Vec<String>) -> Self {
        self.additional_store_ids = store_ids;
        self
    }

    /// Set the monetary permissions.
    pub fn with_permissions(mut self, permissions: UserPermissions) -> Self {
        self.permissions = permissions;
        self
    }

    /// Check whether the user works in `store_id`, either as primary
    /// store or as one of the additional stores.
    pub fn is_assigned_to_store(&self, store_id: &str) -> bool {
        self.store_id.as_deref() == Some(store_id)
            || self.additional_store_ids.iter().any(|s| s == store_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_info_level_follows_role() {
        for role in Role::all() {
            assert_eq!(UserInfo::new("u", role).role_level, role.level());
        }
    }

    #[test]
    fn test_store_assignment() {
        let user = UserInfo::new("u", Role::Staff).with_store("s1");
        assert!(user.is_assigned_to_store("s1"));
        assert!(!user.is_assigned_to_store("s2"));

        let user = user.with_additional_stores(vec!["s2".into()]);
        assert!(user.is_assigned_to_store("s2"));

        let storeless = UserInfo::new("u", Role::Staff);
        assert!(!storeless.is_assigned_to_store(""));
    }

    #[test]
    fn test_permissions_defaults() {
        let perms = UserPermissions::default();
        assert!(perms.is_empty());
        assert!(!perms.discount_allowed());
        assert!(!perms.refund_allowed());

        let perms = perms.with_discount(15.0).with_refund(200.0);
        assert!(perms.discount_allowed());
        assert_eq!(perms.max_discount_percentage, Some(15.0));
        assert_eq!(perms.max_refund_amount, Some(200.0));
    }

    #[test]
    fn test_user_info_serde_camel_case() {
        let user = UserInfo::new("u1", Role::Customer).with_tenant("t1");
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["tenantId"], "t1");
        assert_eq!(json["roleLevel"], 7);
        assert_eq!(json["role"], "customer");
        assert!(json.get("storeId").is_none());

        let back: UserInfo = serde_json::from_value(json).unwrap();
        assert_eq!(back, user);
    }

    #[test]
    fn test_user_info_role_level_is_checked() {
        let user: UserInfo =
            serde_json::from_value(serde_json::json!({"uid": "u1", "role": "trainee"})).unwrap();
        assert_eq!(user.role_level, Role::Trainee.level());

        let forged = serde_json::json!({"uid": "u1", "role": "customer", "roleLevel": 0});
        let err = serde_json::from_value::<UserInfo>(forged).unwrap_err();
        assert!(err.to_string().contains("does not match role 'customer'"));
    }
}
