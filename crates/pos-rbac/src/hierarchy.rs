//! Role ordering helpers for callers holding raw role names.

use crate::actions::Action;
use crate::catalog;
use crate::resources::Resource;
use crate::roles::Role;

/// Check whether `user_role` ranks at or above `target_role`.
///
/// Unknown names on either side yield `false`, with one warning per
/// unknown value.
///
/// ```
/// use pos_rbac::hierarchy::is_role_at_least;
///
/// assert!(is_role_at_least("super_admin", "tenant_admin"));
/// assert!(!is_role_at_least("staff", "store_manager"));
/// assert!(!is_role_at_least("wizard", "staff"));
/// ```
pub fn is_role_at_least(user_role: &str, target_role: &str) -> bool {
    let user = Role::parse(user_role);
    if user.is_none() {
        tracing::warn!(role = %user_role, "Unknown user role in hierarchy comparison");
    }
    let target = Role::parse(target_role);
    if target.is_none() {
        tracing::warn!(role = %target_role, "Unknown target role in hierarchy comparison");
    }

    match (user, target) {
        (Some(user), Some(target)) => user.is_at_least(target),
        _ => false,
    }
}

/// The least privileged role granted `action` on `resource`, if any.
pub fn minimum_role_for_action(resource: Resource, action: Action) -> Option<Role> {
    if resource == Resource::Orders
        && action == Action::Read
        && catalog::is_granted(Role::Customer, resource, action)
    {
        return Some(Role::Customer);
    }

    let found = Role::ascending_privilege()
        .into_iter()
        .find(|role| catalog::is_granted(*role, resource, action));

    if found.is_none() {
        tracing::info!(
            resource = %resource,
            action = %action,
            "No role holds this permission"
        );
    }
    found
}
