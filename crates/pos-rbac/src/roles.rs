//! Role hierarchy
//!
//! Eight roles ranked by [`Role::level`]. Lower levels are more privileged:
//! `super_admin` (0) sits at the top, `customer` (7) at the bottom.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CatalogError;

/// User role within the platform.
///
/// # Permission Model
///
/// - **SuperAdmin**: Platform operator, unrestricted
/// - **TenantAdmin**: Full control of one tenant and its stores
/// - **StoreManager**: Runs a store, approves staff requests
/// - **ShiftLeader**: Supervises a shift, handles refunds and cancellations
/// - **SeniorStaff**: Experienced staff, may apply discounts
/// - **Staff**: Takes and completes orders
/// - **Trainee**: Limited to their own work
/// - **Customer**: End customer, limited to their own records
///
/// # Examples
///
/// ```
/// use pos_rbac::Role;
///
/// assert_eq!(Role::SuperAdmin.level(), 0);
/// assert!(Role::StoreManager.is_at_least(Role::Staff));
/// assert!(!Role::Staff.is_at_least(Role::StoreManager));
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Platform operator
    SuperAdmin = 0,

    /// Tenant administrator
    TenantAdmin = 1,

    /// Store manager
    StoreManager = 2,

    /// Shift leader
    ShiftLeader = 3,

    /// Senior staff member
    SeniorStaff = 4,

    /// Staff member
    Staff = 5,

    /// Trainee
    Trainee = 6,

    /// End customer
    Customer = 7,
}

impl Role {
    /// Privilege rank of the role. Lower is more privileged.
    pub fn level(&self) -> u8 {
        *self as u8
    }

    /// Check whether this role is at least as privileged as `other`.
    pub fn is_at_least(&self, other: Role) -> bool {
        self.level() <= other.level()
    }

    /// Roles confined to their assigned stores.
    pub fn is_store_scoped(&self) -> bool {
        matches!(
            self,
            Role::StoreManager | Role::ShiftLeader | Role::SeniorStaff | Role::Staff | Role::Trainee
        )
    }

    /// Roles that skip per-record ownership checks.
    pub fn bypasses_ownership(&self) -> bool {
        matches!(self, Role::SuperAdmin | Role::TenantAdmin | Role::StoreManager)
    }

    /// Parse role from its catalog key.
    ///
    /// # Examples
    ///
    /// ```
    /// use pos_rbac::Role;
    ///
    /// assert_eq!(Role::parse("shift_leader"), Some(Role::ShiftLeader));
    /// assert_eq!(Role::parse("admin"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "super_admin" => Some(Self::SuperAdmin),
            "tenant_admin" => Some(Self::TenantAdmin),
            "store_manager" => Some(Self::StoreManager),
            "shift_leader" => Some(Self::ShiftLeader),
            "senior_staff" => Some(Self::SeniorStaff),
            "staff" => Some(Self::Staff),
            "trainee" => Some(Self::Trainee),
            "customer" => Some(Self::Customer),
            _ => None,
        }
    }

    /// Get string representation of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SuperAdmin => "super_admin",
            Self::TenantAdmin => "tenant_admin",
            Self::StoreManager => "store_manager",
            Self::ShiftLeader => "shift_leader",
            Self::SeniorStaff => "senior_staff",
            Self::Staff => "staff",
            Self::Trainee => "trainee",
            Self::Customer => "customer",
        }
    }

    /// Get a human-readable display name for the role.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::SuperAdmin => "Super admin",
            Self::TenantAdmin => "Tenant admin",
            Self::StoreManager => "Store manager",
            Self::ShiftLeader => "Shift leader",
            Self::SeniorStaff => "Senior staff",
            Self::Staff => "Staff",
            Self::Trainee => "Trainee",
            Self::Customer => "Customer",
        }
    }

    /// All roles, most privileged first.
    pub fn all() -> Vec<Self> {
        vec![
            Self::SuperAdmin,
            Self::TenantAdmin,
            Self::StoreManager,
            Self::ShiftLeader,
            Self::SeniorStaff,
            Self::Staff,
            Self::Trainee,
            Self::Customer,
        ]
    }

    /// All roles, least privileged first.
    pub fn ascending_privilege() -> Vec<Self> {
        let mut roles = Self::all();
        roles.reverse();
        roles
    }
}

impl Default for Role {
    fn default() -> Self {
        Self::Customer
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::parse(s).ok_or_else(|| CatalogError::UnknownRole(s.to_string()))
    }
}
