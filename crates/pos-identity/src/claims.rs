//! # Claims Normalization
//!
//! Turns a verified token's claims into the pieces of a [`UserInfo`].
//!
//! Claims come from several issuers and mix naming conventions. Every field
//! is read through one alias table: the canonical camelCase name first, then
//! its aliases in order. Using a legacy alias is logged at info level.
//!
//! | Field                | Accepted names                                   |
//! |----------------------|--------------------------------------------------|
//! | uid                  | `uid`, `sub`, `user_id`                          |
//! | tenant id            | `tenantId`, `tenant_id`                          |
//! | store id             | `storeId`, `store_id`                            |
//! | additional store ids | `additionalStoreIds`, `additional_store_ids`     |
//!
//! Roles come from `role`, then the first valid entry of `roles`.

use serde_json::{Map, Value};

use pos_rbac::validators::is_non_empty_id;
use pos_rbac::{Role, UserInfo, UserPermissions};

use crate::error::{ClaimsError, ClaimsResult};

/// A claim and the names it may appear under.
#[derive(Debug, Clone, Copy)]
pub struct ClaimField {
    /// Preferred name
    pub canonical: &'static str,
    /// Fallback names, in lookup order
    pub aliases: &'static [&'static str],
    /// Log an info note when found under an alias
    pub note_alias: bool,
}

/// User id claim.
pub const UID: ClaimField = ClaimField {
    canonical: "uid",
    aliases: &["sub", "user_id"],
    note_alias: false,
};

/// Tenant claim.
pub const TENANT_ID: ClaimField = ClaimField {
    canonical: "tenantId",
    aliases: &["tenant_id"],
    note_alias: true,
};

/// Primary store claim.
pub const STORE_ID: ClaimField = ClaimField {
    canonical: "storeId",
    aliases: &["store_id"],
    note_alias: true,
};

/// Additional stores claim.
pub const ADDITIONAL_STORE_IDS: ClaimField = ClaimField {
    canonical: "additionalStoreIds",
    aliases: &["additional_store_ids"],
    note_alias: true,
};

/// Permission keys accepted at the root of the claims when there is no
/// nested `permissions` object.
pub const FLAT_PERMISSION_KEYS: &[&str] = &[
    "canDiscount",
    "maxDiscountPercentage",
    "canRefund",
    "maxRefundAmount",
];

/// Everything claims say about a user. `role` is `None` when no claimed
/// role was usable.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimedIdentity {
    /// User id
    pub uid: String,
    /// First valid claimed role
    pub role: Option<Role>,
    /// Tenant
    pub tenant_id: Option<String>,
    /// Primary store
    pub store_id: Option<String>,
    /// Other stores, normalized
    pub additional_store_ids: Vec<String>,
    /// Monetary permissions
    pub permissions: UserPermissions,
}

impl ClaimedIdentity {
    /// Build the user with the given role.
    pub fn into_user_info(self, role: Role) -> UserInfo {
        let mut user = UserInfo::new(self.uid, role)
            .with_additional_stores(self.additional_store_ids)
            .with_permissions(self.permissions);
        user.tenant_id = self.tenant_id;
        user.store_id = self.store_id;
        user
    }
}

/// Borrow the claims as a JSON object.
pub fn as_object(claims: &Value) -> ClaimsResult<&Map<String, Value>> {
    claims.as_object().ok_or(ClaimsError::NotAnObject)
}

/// Find `field` under its canonical name or an alias. Nulls count as absent.
pub fn lookup<'a>(claims: &'a Map<String, Value>, field: &ClaimField) -> Option<&'a Value> {
    if let Some(value) = claims.get(field.canonical).filter(|v| !v.is_null()) {
        return Some(value);
    }
    for alias in field.aliases {
        if let Some(value) = claims.get(*alias).filter(|v| !v.is_null()) {
            if field.note_alias {
                tracing::info!(
                    field = %alias,
                    canonical = %field.canonical,
                    "Claims use non-standard field name '{}' for {}",
                    alias,
                    field.canonical
                );
            }
            return Some(value);
        }
    }
    None
}

/// The user id: `uid`, then `sub`, then `user_id`. Blank strings are skipped.
pub fn extract_uid(claims: &Map<String, Value>) -> Option<String> {
    std::iter::once(UID.canonical)
        .chain(UID.aliases.iter().copied())
        .filter_map(|key| claims.get(key).and_then(Value::as_str))
        .find(|uid| is_non_empty_id(uid))
        .map(str::to_string)
}

/// The first valid role in `role` or `roles`.
///
/// Each invalid value is logged as a warning and skipped.
pub fn extract_role(uid: &str, claims: &Map<String, Value>) -> Option<Role> {
    if let Some(value) = claims.get("role").filter(|v| !v.is_null()) {
        match value.as_str().and_then(Role::parse) {
            Some(role) => return Some(role),
            None => tracing::warn!(uid = %uid, role = %value, "Claims carry an invalid role"),
        }
    }

    if let Some(Value::Array(roles)) = claims.get("roles") {
        for value in roles {
            match value.as_str().and_then(Role::parse) {
                Some(role) => return Some(role),
                None => tracing::warn!(
                    uid = %uid,
                    role = %value,
                    "Skipping invalid role in roles claim"
                ),
            }
        }
    }
    None
}

/// Keep only non-empty string entries. Anything but an array becomes empty.
///
/// ```
/// use pos_identity::claims::normalize_store_ids;
/// use serde_json::json;
///
/// let ids = normalize_store_ids(&json!(["a", "", null, 123, "b"]));
/// assert_eq!(ids, vec!["a", "b"]);
/// assert!(normalize_store_ids(&json!("a")).is_empty());
/// ```
pub fn normalize_store_ids(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .filter(|id| is_non_empty_id(id))
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Monetary permissions from a nested `permissions` object, or from flat
/// root keys when there is no nested object.
pub fn extract_permissions(claims: &Map<String, Value>) -> ClaimsResult<UserPermissions> {
    if let Some(nested @ Value::Object(_)) = claims.get("permissions") {
        return parse_permissions("permissions", nested.clone());
    }

    let flat: Map<String, Value> = FLAT_PERMISSION_KEYS
        .iter()
        .filter_map(|key| claims.get(*key).map(|v| (key.to_string(), v.clone())))
        .collect();
    if flat.is_empty() {
        return Ok(UserPermissions::default());
    }
    parse_permissions("permissions (flat)", Value::Object(flat))
}

/// Deserialize a permissions object, rejecting mistyped fields.
pub fn parse_permissions(field: &str, value: Value) -> ClaimsResult<UserPermissions> {
    serde_json::from_value(value).map_err(|e| ClaimsError::InvalidField {
        field: field.to_string(),
        message: e.to_string(),
    })
}

fn optional_string(
    claims: &Map<String, Value>,
    field: &ClaimField,
) -> ClaimsResult<Option<String>> {
    match lookup(claims, field) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(ClaimsError::InvalidField {
            field: field.canonical.to_string(),
            message: format!("expected a string, got {}", other),
        }),
    }
}

/// Read everything but the uid from the claims.
pub fn extract_identity(uid: &str, claims: &Map<String, Value>) -> ClaimsResult<ClaimedIdentity> {
    Ok(ClaimedIdentity {
        uid: uid.to_string(),
        role: extract_role(uid, claims),
        tenant_id: optional_string(claims, &TENANT_ID)?,
        store_id: optional_string(claims, &STORE_ID)?,
        additional_store_ids: lookup(claims, &ADDITIONAL_STORE_IDS)
            .map(normalize_store_ids)
            .unwrap_or_default(),
        permissions: extract_permissions(claims)?,
    })
}
