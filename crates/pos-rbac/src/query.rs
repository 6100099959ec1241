//! # Permission Queries
//!
//! What a caller asks ([`PermissionQuery`]), what it knows about the target
//! ([`PermissionContext`]) and the answer ([`PermissionResult`]).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::actions::Action;
use crate::error::CatalogError;
use crate::resources::Resource;

/// A requested operation: an action on a resource type, optionally on one
/// specific record.
///
/// # Example
///
/// ```
/// use pos_rbac::{Action, PermissionQuery, Resource};
///
/// let query = PermissionQuery::new(Action::Read, Resource::Orders);
/// assert_eq!(query.to_string(), "orders:read");
///
/// let query = PermissionQuery::for_resource(Action::Cancel, Resource::Orders, "o-42");
/// assert_eq!(query.to_string(), "orders:cancel:o-42");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct PermissionQuery {
    /// The action requested.
    pub action: Action,
    /// The resource type the action applies to.
    pub resource: Resource,
    /// Optional: specific record the action applies to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
}

impl PermissionQuery {
    /// Query an action on a resource type.
    pub fn new(action: Action, resource: Resource) -> Self {
        Self {
            action,
            resource,
            resource_id: None,
        }
    }

    /// Query an action on a specific record.
    pub fn for_resource(action: Action, resource: Resource, resource_id: impl Into<String>) -> Self {
        Self {
            action,
            resource,
            resource_id: Some(resource_id.into()),
        }
    }

    /// Parse from `resource:action` or `resource:action:id`.
    ///
    /// Everything after the second colon is the record id, so ids may
    /// themselves contain colons.
    ///
    /// ```
    /// use pos_rbac::{Action, PermissionQuery, Resource};
    ///
    /// let query = PermissionQuery::parse("payrolls:approve:pr:2024:07").unwrap();
    /// assert_eq!(query.resource, Resource::Payrolls);
    /// assert_eq!(query.action, Action::Approve);
    /// assert_eq!(query.resource_id.as_deref(), Some("pr:2024:07"));
    /// ```
    pub fn parse(s: &str) -> Result<Self, CatalogError> {
        let mut parts = s.splitn(3, ':');
        let (Some(resource), Some(action)) = (parts.next(), parts.next()) else {
            return Err(CatalogError::InvalidPermission(s.to_string()));
        };

        let resource: Resource = resource.parse()?;
        let action: Action = action.parse()?;
        let resource_id = parts.next().filter(|id| !id.is_empty()).map(str::to_string);

        Ok(Self {
            action,
            resource,
            resource_id,
        })
    }

    /// Check if this query targets a specific record.
    pub fn is_specific(&self) -> bool {
        self.resource_id.is_some()
    }
}

impl fmt::Display for PermissionQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.resource_id {
            Some(id) => write!(f, "{}:{}:{}", self.resource, self.action, id),
            None => write!(f, "{}:{}", self.resource, self.action),
        }
    }
}

impl FromStr for PermissionQuery {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// What the caller knows about the record being accessed.
///
/// `additional_data` carries record fields (owner ids, status, amounts)
/// used by the ownership and business-rule stages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionContext {
    /// Tenant the record belongs to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,

    /// Store the record belongs to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_id: Option<String>,

    /// Record fields and business-rule parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_data: Option<Map<String, Value>>,
}

impl PermissionContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the tenant.
    pub fn with_tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    /// Set the store.
    pub fn with_store(mut self, store_id: impl Into<String>) -> Self {
        self.store_id = Some(store_id.into());
        self
    }

    /// Set one field of `additional_data`.
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.additional_data
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    /// Replace `additional_data` wholesale.
    pub fn with_additional_data(mut self, data: Map<String, Value>) -> Self {
        self.additional_data = Some(data);
        self
    }
}

/// Outcome of a permission check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionResult {
    /// Whether the operation is allowed.
    pub granted: bool,
    /// Why not, when denied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl PermissionResult {
    /// A grant.
    pub fn granted() -> Self {
        Self {
            granted: true,
            reason: None,
        }
    }

    /// A denial with a human-readable reason.
    pub fn denied(reason: impl Into<String>) -> Self {
        Self {
            granted: false,
            reason: Some(reason.into()),
        }
    }

    /// The denial reason, or `""` for grants.
    pub fn reason(&self) -> &str {
        self.reason.as_deref().unwrap_or("")
    }
}
