//! # POS RBAC (Role-Based Access Control)
//!
//! This crate decides whether a user of the multi-tenant point-of-sale
//! platform may perform an action on a resource.
//!
//! ## Overview
//!
//! The pos-rbac crate handles:
//! - **Roles**: Eight ranked roles, from `super_admin` down to `customer`
//! - **Resources**: Every record type across sales, catalog, operations and people
//! - **Actions**: Operations that can be performed on resources
//! - **Catalog**: Role × resource → allowed actions, ownership fields, access scopes
//! - **Business Rules**: Named checks over record data (status, amounts, owners)
//! - **Resolver**: The four-stage permission pipeline
//!
//! ## Architecture
//!
//! ```text
//! Query = Resource + Action [+ Resource ID]
//!
//! Examples:
//!   "orders:read"              - Read orders
//!   "orders:refund:o-123"      - Refund one specific order
//!   "payrolls:approve"         - Approve payroll runs
//!
//! Resolution:
//!   basic grant → tenant/store scope → ownership → business rules
//! ```
//!
//! ## Role Hierarchy
//!
//! | Role            | Level | Scope  |
//! |-----------------|-------|--------|
//! | `super_admin`   | 0     | all    |
//! | `tenant_admin`  | 1     | tenant |
//! | `store_manager` | 2     | store  |
//! | `shift_leader`  | 3     | store  |
//! | `senior_staff`  | 4     | store  |
//! | `staff`         | 5     | store  |
//! | `trainee`       | 6     | own    |
//! | `customer`      | 7     | own    |
//!
//! A lower level is more privileged.
//!
//! ## Usage
//!
//! ```rust
//! use pos_rbac::{
//!     Action, PermissionContext, PermissionQuery, PermissionResolver, Resource, Role,
//!     UserInfo, UserPermissions,
//! };
//!
//! let resolver = PermissionResolver::new();
//!
//! let cashier = UserInfo::new("u-7", Role::SeniorStaff)
//!     .with_tenant("acme")
//!     .with_store("downtown")
//!     .with_permissions(UserPermissions::default().with_discount(10.0));
//!
//! let query = PermissionQuery::for_resource(Action::Discount, Resource::Orders, "o-1");
//! let ctx = PermissionContext::new()
//!     .with_tenant("acme")
//!     .with_store("downtown")
//!     .with_data("requestedDiscount", 25);
//!
//! let result = resolver.has_permission(&cashier, &query, Some(&ctx));
//! assert!(!result.granted);
//! assert!(result.reason().contains("exceeds the maximum"));
//! ```

pub mod actions;
pub mod catalog;
pub mod error;
pub mod hierarchy;
pub mod query;
pub mod resolver;
pub mod resources;
pub mod roles;
pub mod rules;
pub mod user;
pub mod validators;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export main types for convenience
pub use actions::{Action, ActionSet};
pub use catalog::{AccessScope, RoleScope};
pub use error::{CatalogError, CatalogResult, RuleViolation};
pub use query::{PermissionContext, PermissionQuery, PermissionResult};
pub use resolver::PermissionResolver;
pub use resources::{Domain, Resource};
pub use roles::Role;
pub use rules::{BusinessRule, CorruptRulePolicy, RuleRegistry};
pub use user::{UserInfo, UserPermissions};
