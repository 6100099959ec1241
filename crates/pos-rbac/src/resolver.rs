//! # Permission Resolver
//!
//! Four ordered stages, stopping at the first denial:
//!
//! ```text
//! 1. basic grant    role × resource → actions (catalog)
//! 2. scope          tenant isolation, then store isolation
//! 3. ownership      customers and own-scoped roles touch only their records
//! 4. business rules monetary ceilings, then registered rules
//! ```
//!
//! The resolver never fails: every problem becomes a [`PermissionResult`]
//! with a reason.

use serde_json::{Map, Value};

use crate::actions::Action;
use crate::catalog::{self, AccessScope};
use crate::query::{PermissionContext, PermissionQuery, PermissionResult};
use crate::resources::Resource;
use crate::roles::Role;
use crate::rules::{CorruptRulePolicy, RuleRegistry};
use crate::user::UserInfo;

type Stage = Result<(), String>;

/// Decides whether a user may perform a query.
///
/// # Example
///
/// ```
/// use pos_rbac::{Action, PermissionContext, PermissionQuery, PermissionResolver, Resource, Role, UserInfo};
///
/// let resolver = PermissionResolver::new();
/// let staff = UserInfo::new("u1", Role::Staff).with_tenant("t1").with_store("s1");
///
/// let query = PermissionQuery::new(Action::Create, Resource::Orders);
/// let ctx = PermissionContext::new().with_tenant("t1").with_store("s1");
/// assert!(resolver.has_permission(&staff, &query, Some(&ctx)).granted);
///
/// let elsewhere = PermissionContext::new().with_tenant("t1").with_store("s2");
/// let result = resolver.has_permission(&staff, &query, Some(&elsewhere));
/// assert!(!result.granted);
/// assert!(result.reason().contains("Cross-store access"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct PermissionResolver {
    rules: RuleRegistry,
    corrupt_rule_policy: CorruptRulePolicy,
}

impl PermissionResolver {
    /// Resolver with the standard business rules, failing closed on a
    /// corrupt registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolver with a custom rule registry.
    pub fn with_rules(rules: RuleRegistry) -> Self {
        Self {
            rules,
            corrupt_rule_policy: CorruptRulePolicy::default(),
        }
    }

    /// Set the corrupt-registry policy.
    pub fn with_corrupt_rule_policy(mut self, policy: CorruptRulePolicy) -> Self {
        self.corrupt_rule_policy = policy;
        self
    }

    /// The rule registry in use.
    pub fn rules(&self) -> &RuleRegistry {
        &self.rules
    }

    /// Check whether `user` may perform `query` in `context`.
    pub fn has_permission(
        &self,
        user: &UserInfo,
        query: &PermissionQuery,
        context: Option<&PermissionContext>,
    ) -> PermissionResult {
        match self.evaluate(user, query, context) {
            Ok(()) => PermissionResult::granted(),
            Err(reason) => {
                tracing::debug!(
                    uid = %user.uid,
                    role = %user.role,
                    query = %query,
                    reason = %reason,
                    "Permission denied"
                );
                PermissionResult::denied(reason)
            }
        }
    }

    /// Check a query given as raw strings.
    ///
    /// Unknown action or resource names are denied with a reason naming
    /// the unknown value; otherwise this is [`has_permission`](Self::has_permission).
    pub fn has_permission_raw(
        &self,
        user: &UserInfo,
        action: &str,
        resource: &str,
        resource_id: Option<&str>,
        context: Option<&PermissionContext>,
    ) -> PermissionResult {
        let Some(resource) = Resource::parse(resource) else {
            tracing::warn!(uid = %user.uid, resource = %resource, "Permission check for unknown resource");
            return PermissionResult::denied(format!(
                "Resource '{}' is not defined in the permission catalog",
                resource
            ));
        };
        let Some(action) = Action::parse(action) else {
            tracing::warn!(uid = %user.uid, action = %action, "Permission check for unknown action");
            return PermissionResult::denied(format!(
                "Action '{}' is not defined in the permission catalog",
                action
            ));
        };
        let query = PermissionQuery {
            action,
            resource,
            resource_id: resource_id.map(str::to_string),
        };
        self.has_permission(user, &query, context)
    }

    fn evaluate(
        &self,
        user: &UserInfo,
        query: &PermissionQuery,
        context: Option<&PermissionContext>,
    ) -> Stage {
        check_basic_grant(user, query)?;
        check_scope(user, context)?;
        check_ownership(user, query, context)?;
        self.check_business_rules(user, query, context)
    }

    fn check_business_rules(
        &self,
        user: &UserInfo,
        query: &PermissionQuery,
        context: Option<&PermissionContext>,
    ) -> Stage {
        let Some(ctx) = context else {
            return Ok(());
        };
        let Some(data) = ctx.additional_data.as_ref() else {
            return Ok(());
        };

        if query.resource == Resource::Orders {
            match query.action {
                Action::Discount => check_discount_ceiling(user, data)?,
                Action::Refund => check_refund_ceiling(user, data)?,
                _ => {}
            }
        }

        let rules = match self.rules.matching(query.resource, query.action) {
            Ok(rules) => rules,
            Err(err) => {
                tracing::error!(
                    error = %err,
                    query = %query,
                    policy = ?self.corrupt_rule_policy,
                    "Business rule registry is corrupt"
                );
                return match self.corrupt_rule_policy {
                    CorruptRulePolicy::FailOpen => Ok(()),
                    CorruptRulePolicy::FailClosed => Err(
                        "Access denied: business rule configuration is invalid".to_string(),
                    ),
                };
            }
        };

        for rule in rules {
            if let Err(violation) = rule.evaluate(user, data, ctx) {
                return Err(match query.action {
                    Action::Discount => format!("Discount not allowed: {}", violation),
                    Action::Refund => format!("Refund not allowed: {}", violation),
                    Action::Cancel => format!("Cancellation not allowed: {}", violation),
                    action => format!(
                        "Business rule '{}' denied {} on {}: {}",
                        rule.name(),
                        action,
                        query.resource,
                        violation
                    ),
                });
            }
        }
        Ok(())
    }
}

fn check_basic_grant(user: &UserInfo, query: &PermissionQuery) -> Stage {
    let actions = catalog::allowed_actions(user.role, query.resource);
    if actions.is_empty() {
        return Err(format!(
            "Role '{}' cannot access resource '{}'",
            user.role, query.resource
        ));
    }
    if !actions.contains(query.action) {
        return Err(format!(
            "Role '{}' lacks '{}' permission on resource '{}'",
            user.role, query.action, query.resource
        ));
    }
    Ok(())
}

fn check_scope(user: &UserInfo, context: Option<&PermissionContext>) -> Stage {
    if user.role == Role::SuperAdmin {
        return Ok(());
    }
    let Some(ctx) = context else {
        return Ok(());
    };

    match (ctx.tenant_id.as_deref(), user.tenant_id.as_deref()) {
        (Some(target), Some(own)) if target != own => {
            tracing::warn!(
                uid = %user.uid,
                role = %user.role,
                user_tenant = %own,
                target_tenant = %target,
                "Blocked cross-tenant access attempt"
            );
            return Err(if user.role == Role::TenantAdmin {
                format!(
                    "Tenant admin cannot manage tenant '{}' (cross-tenant access attempt)",
                    target
                )
            } else {
                format!(
                    "Access denied (cross-tenant access attempt): user belongs to tenant '{}', resource to '{}'",
                    own, target
                )
            });
        }
        (Some(target), None) => {
            return Err(format!(
                "User has no tenant association and cannot access tenant '{}'",
                target
            ));
        }
        (Some(_), Some(_)) => {}
        (None, own) => {
            if let Some(own) = own {
                tracing::info!(
                    uid = %user.uid,
                    user_tenant = %own,
                    "Access to non-tenant (global) resource"
                );
            }
            tracing::warn!(
                uid = %user.uid,
                role = %user.role,
                "Data integrity: permission context has no tenantId"
            );
        }
    }

    if user.role.is_store_scoped() {
        if let Some(store) = ctx.store_id.as_deref() {
            if !user.is_assigned_to_store(store) {
                return Err(format!(
                    "Cross-store access denied: user is not assigned to store '{}'",
                    store
                ));
            }
        }
    }
    Ok(())
}

fn check_ownership(
    user: &UserInfo,
    query: &PermissionQuery,
    context: Option<&PermissionContext>,
) -> Stage {
    let Some(data) = context.and_then(|c| c.additional_data.as_ref()) else {
        return Ok(());
    };
    if query.resource_id.is_none() || user.role.bypasses_ownership() {
        return Ok(());
    }
    let fields = catalog::ownership_fields(query.resource);
    if fields.is_empty() {
        return Ok(());
    }
    let own_scoped =
        user.role == Role::Customer || catalog::role_scope(user.role).scope == AccessScope::Own;
    if !own_scoped || owns_record(user, fields, data) {
        return Ok(());
    }

    Err(if user.role == Role::Customer {
        format!(
            "Customers can access own resources only; {} '{}' belongs to someone else",
            query.resource,
            query.resource_id.as_deref().unwrap_or_default()
        )
    } else {
        format!(
            "Role '{}' is limited to own resources only",
            user.role
        )
    })
}

fn owns_record(user: &UserInfo, fields: &[&str], data: &Map<String, Value>) -> bool {
    fields
        .iter()
        .any(|field| data.get(*field).and_then(Value::as_str) == Some(user.uid.as_str()))
}

fn check_discount_ceiling(user: &UserInfo, data: &Map<String, Value>) -> Stage {
    if !user.permissions.discount_allowed() {
        return Err("Discount not allowed: user is not permitted to apply discounts".to_string());
    }
    let max = user.permissions.max_discount_percentage.unwrap_or(0.0);
    match data.get("requestedDiscount") {
        None | Some(Value::Null) => Ok(()),
        Some(value) => match value.as_f64() {
            Some(requested) if requested <= max => Ok(()),
            Some(requested) => Err(format!(
                "Discount not allowed: requested {}% exceeds the maximum of {}%",
                requested, max
            )),
            None => Err("Discount not allowed: requestedDiscount is not a number".to_string()),
        },
    }
}

fn check_refund_ceiling(user: &UserInfo, data: &Map<String, Value>) -> Stage {
    if !user.permissions.refund_allowed() {
        return Err("Refund not allowed: user is not permitted to issue refunds".to_string());
    }
    let max = user.permissions.max_refund_amount.unwrap_or(0.0);
    match data.get("requestedAmount") {
        None | Some(Value::Null) => Ok(()),
        Some(value) => match value.as_f64() {
            Some(requested) if requested <= max => Ok(()),
            Some(requested) => Err(format!(
                "Refund not allowed: requested amount {} exceeds the maximum of {}",
                requested, max
            )),
            None => Err("Refund not allowed: requestedAmount is not a number".to_string()),
        },
    }
}
