//! # Permission Catalog
//!
//! Static, process-wide policy tables:
//!
//! - [`allowed_actions`]: total function `Role × Resource → ActionSet`
//! - [`ownership_fields`]: fields that identify a record's owner
//! - [`role_scope`]: how far a role's access reaches (all / tenant / store / own)
//!
//! An empty [`ActionSet`] means the role cannot touch the resource at all.

use serde::Serialize;

use crate::actions::{Action, ActionSet};
use crate::resources::Resource;
use crate::roles::Role;

use Action::*;

const CRUD: ActionSet = ActionSet::of(&[Create, Read, Update, Delete]);
const READ: ActionSet = ActionSet::of(&[Read]);
const READ_UPDATE: ActionSet = ActionSet::of(&[Read, Update]);
const CREATE_READ: ActionSet = ActionSet::of(&[Create, Read]);

/// Actions a role may perform on a resource.
///
/// # Example
///
/// ```
/// use pos_rbac::catalog::allowed_actions;
/// use pos_rbac::{Action, Resource, Role};
///
/// assert!(allowed_actions(Role::Staff, Resource::Orders).contains(Action::Create));
/// assert!(allowed_actions(Role::Customer, Resource::Payrolls).is_empty());
/// ```
pub fn allowed_actions(role: Role, resource: Resource) -> ActionSet {
    match role {
        Role::SuperAdmin => ActionSet::ALL,
        Role::TenantAdmin => tenant_admin(resource),
        Role::StoreManager => store_manager(resource),
        Role::ShiftLeader => shift_leader(resource),
        Role::SeniorStaff => senior_staff(resource),
        Role::Staff => staff(resource),
        Role::Trainee => trainee(resource),
        Role::Customer => customer(resource),
    }
}

/// Check a single grant.
pub fn is_granted(role: Role, resource: Resource, action: Action) -> bool {
    allowed_actions(role, resource).contains(action)
}

/// Resources the role can perform at least one action on.
pub fn accessible_resources(role: Role) -> Vec<Resource> {
    Resource::all()
        .into_iter()
        .filter(|r| !allowed_actions(role, *r).is_empty())
        .collect()
}

fn tenant_admin(resource: Resource) -> ActionSet {
    match resource {
        Resource::Tenants => READ_UPDATE,
        _ => ActionSet::ALL,
    }
}

fn store_manager(resource: Resource) -> ActionSet {
    match resource {
        Resource::Orders => ActionSet::ALL,
        Resource::MenuItems | Resource::Categories | Resource::Inventory => {
            CRUD.union(ActionSet::of(&[Export]))
        }
        Resource::Stores | Resource::Settings => READ_UPDATE,
        Resource::Employees => ActionSet::of(&[Create, Read, Update, Approve]),
        Resource::Payrolls => ActionSet::of(&[Create, Read, Update, Approve, Export]),
        Resource::Schedules => CRUD.union(ActionSet::of(&[Approve, Reject])),
        Resource::Attendance => ActionSet::of(&[Create, Read, Update, Approve, Reject, Export]),
        Resource::Customers => ActionSet::of(&[Create, Read, Update]),
        Resource::Referrals => ActionSet::of(&[Read, Approve, Reject]),
        Resource::Rewards | Resource::Coupons | Resource::Suppliers | Resource::Tables => CRUD,
        Resource::Promotions => CRUD.union(ActionSet::of(&[Approve])),
        Resource::Reports => ActionSet::of(&[Read, Print, Export]),
        Resource::Analytics => ActionSet::of(&[Read, Export]),
        Resource::AuditLogs => READ,
        Resource::Payments => ActionSet::of(&[Create, Read, Refund, Export]),
        Resource::Refunds => ActionSet::of(&[Create, Read, Approve, Reject]),
        Resource::Invoices => ActionSet::of(&[Create, Read, Print, Export]),
        Resource::PurchaseOrders => CRUD.union(ActionSet::of(&[Approve, Reject])),
        Resource::Reservations => CRUD.union(ActionSet::of(&[Cancel, Complete])),
        Resource::Notifications => CREATE_READ,
        Resource::LoyaltyPoints | Resource::Feedback => READ_UPDATE,
        Resource::Tenants => ActionSet::EMPTY,
    }
}

fn shift_leader(resource: Resource) -> ActionSet {
    match resource {
        Resource::Orders => ActionSet::of(&[
            Create, Read, Update, Cancel, Complete, Print, Discount, Refund,
        ]),
        Resource::MenuItems
        | Resource::Inventory
        | Resource::Schedules
        | Resource::Tables
        | Resource::LoyaltyPoints => READ_UPDATE,
        Resource::Categories
        | Resource::Stores
        | Resource::Employees
        | Resource::Referrals
        | Resource::Rewards
        | Resource::Coupons
        | Resource::Promotions
        | Resource::Notifications
        | Resource::Feedback => READ,
        Resource::Attendance => ActionSet::of(&[Read, Update, Approve]),
        Resource::Customers => CREATE_READ,
        Resource::Reports => ActionSet::of(&[Read, Print]),
        Resource::Payments => ActionSet::of(&[Create, Read, Refund]),
        Resource::Refunds => ActionSet::of(&[Create, Read, Approve]),
        Resource::Invoices => ActionSet::of(&[Create, Read, Print]),
        Resource::Reservations => ActionSet::of(&[Create, Read, Update, Cancel, Complete]),
        _ => ActionSet::EMPTY,
    }
}

fn senior_staff(resource: Resource) -> ActionSet {
    match resource {
        Resource::Orders => {
            ActionSet::of(&[Create, Read, Update, Cancel, Complete, Print, Discount])
        }
        Resource::MenuItems
        | Resource::Categories
        | Resource::Stores
        | Resource::Schedules
        | Resource::Rewards
        | Resource::Coupons
        | Resource::Notifications
        | Resource::LoyaltyPoints
        | Resource::Feedback => READ,
        Resource::Inventory | Resource::Tables => READ_UPDATE,
        Resource::Attendance
        | Resource::Customers
        | Resource::Payments
        | Resource::Refunds => CREATE_READ,
        Resource::Invoices => ActionSet::of(&[Create, Read, Print]),
        Resource::Reservations => ActionSet::of(&[Create, Read, Update, Complete]),
        _ => ActionSet::EMPTY,
    }
}

fn staff(resource: Resource) -> ActionSet {
    match resource {
        Resource::Orders => ActionSet::of(&[Create, Read, Update, Complete, Print]),
        Resource::MenuItems
        | Resource::Categories
        | Resource::Inventory
        | Resource::Stores
        | Resource::Schedules
        | Resource::Customers
        | Resource::Notifications => READ,
        Resource::Attendance | Resource::Payments => CREATE_READ,
        Resource::Invoices => ActionSet::of(&[Read, Print]),
        Resource::Tables => READ_UPDATE,
        Resource::Reservations => ActionSet::of(&[Create, Read, Update]),
        _ => ActionSet::EMPTY,
    }
}

fn trainee(resource: Resource) -> ActionSet {
    match resource {
        Resource::Orders | Resource::Attendance => CREATE_READ,
        Resource::MenuItems
        | Resource::Categories
        | Resource::Schedules
        | Resource::Tables
        | Resource::Notifications => READ,
        _ => ActionSet::EMPTY,
    }
}

fn customer(resource: Resource) -> ActionSet {
    match resource {
        Resource::Orders | Resource::Reservations => ActionSet::of(&[Create, Read, Cancel]),
        Resource::MenuItems
        | Resource::Categories
        | Resource::Stores
        | Resource::Rewards
        | Resource::Coupons
        | Resource::LoyaltyPoints
        | Resource::Notifications => READ,
        Resource::Referrals | Resource::Feedback => CREATE_READ,
        Resource::Customers => READ_UPDATE,
        _ => ActionSet::EMPTY,
    }
}

/// Fields on a resource record that identify its owning user.
///
/// An empty slice means the resource has no ownership concept.
pub fn ownership_fields(resource: Resource) -> &'static [&'static str] {
    match resource {
        Resource::Orders => &["customerId", "createdBy"],
        Resource::Customers => &["customerId", "uid"],
        Resource::Referrals => &["referrerId", "refereeId"],
        Resource::Rewards
        | Resource::Reservations
        | Resource::LoyaltyPoints
        | Resource::Feedback => &["customerId"],
        Resource::Attendance | Resource::Schedules | Resource::Payrolls => &["employeeId"],
        Resource::Employees => &["employeeId", "uid"],
        Resource::Notifications => &["recipientId"],
        _ => &[],
    }
}

/// Breadth of access granted to a role.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AccessScope {
    /// Every tenant and store.
    All,
    /// Everything inside the user's tenant.
    Tenant,
    /// The user's assigned stores.
    Store,
    /// Only records the user owns.
    Own,
}

/// Comparison applied by a [`Restriction`].
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RestrictionOperator {
    /// Field equals the source value.
    Equals,
    /// Field is one of the source values.
    In,
}

/// Where a [`Restriction`] takes its comparison value from.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RestrictionSource {
    /// The user's tenant.
    UserTenant,
    /// The user's primary store plus additional stores.
    UserStores,
    /// The user's uid.
    UserUid,
}

/// One data filter implied by a role's scope.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
pub struct Restriction {
    /// Record field the filter applies to.
    pub field: &'static str,
    /// Comparison operator.
    pub operator: RestrictionOperator,
    /// Source of the comparison value.
    pub source: RestrictionSource,
}

impl Restriction {
    const fn new(
        field: &'static str,
        operator: RestrictionOperator,
        source: RestrictionSource,
    ) -> Self {
        Self {
            field,
            operator,
            source,
        }
    }
}

/// Scope and data filters for a role.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct RoleScope {
    /// How far access reaches.
    pub scope: AccessScope,
    /// Filters a data layer should apply when listing records.
    pub restrictions: &'static [Restriction],
}

const TENANT_FILTER: Restriction = Restriction::new(
    "tenantId",
    RestrictionOperator::Equals,
    RestrictionSource::UserTenant,
);
const STORE_FILTER: Restriction = Restriction::new(
    "storeId",
    RestrictionOperator::In,
    RestrictionSource::UserStores,
);

const CREATED_BY_FILTER: Restriction = Restriction::new(
    "createdBy",
    RestrictionOperator::Equals,
    RestrictionSource::UserUid,
);
const CUSTOMER_FILTER: Restriction = Restriction::new(
    "customerId",
    RestrictionOperator::Equals,
    RestrictionSource::UserUid,
);

const TENANT_RESTRICTIONS: &[Restriction] = &[TENANT_FILTER];
const STORE_RESTRICTIONS: &[Restriction] = &[TENANT_FILTER, STORE_FILTER];
const TRAINEE_RESTRICTIONS: &[Restriction] = &[TENANT_FILTER, STORE_FILTER, CREATED_BY_FILTER];
const CUSTOMER_RESTRICTIONS: &[Restriction] = &[CUSTOMER_FILTER];

/// Look up the scope of a role.
pub fn role_scope(role: Role) -> RoleScope {
    let (scope, restrictions) = match role {
        Role::SuperAdmin => (AccessScope::All, &[][..]),
        Role::TenantAdmin => (AccessScope::Tenant, TENANT_RESTRICTIONS),
        Role::StoreManager | Role::ShiftLeader | Role::SeniorStaff | Role::Staff => {
            (AccessScope::Store, STORE_RESTRICTIONS)
        }
        Role::Trainee => (AccessScope::Own, TRAINEE_RESTRICTIONS),
        Role::Customer => (AccessScope::Own, CUSTOMER_RESTRICTIONS),
    };
    RoleScope {
        scope,
        restrictions,
    }
}
