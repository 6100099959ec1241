//! # Resource Types
//!
//! Defines all resource types the permission catalog covers.
//! Resources are grouped by the business domain that owns them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CatalogError;

/// Business domain that owns a resource.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    /// Orders, payments, refunds, invoices.
    Sales,
    /// Menu and stock.
    Catalog,
    /// Stores, tables, reservations, purchasing.
    Operations,
    /// Employees and everything about their work time and pay.
    People,
    /// Customers, loyalty and marketing.
    Engagement,
    /// Reporting and analytics.
    Insights,
    /// Tenants, settings, audit trail, notifications.
    Administration,
}

/// Resource types that can have permissions assigned.
///
/// - **Sales**: Orders, Payments, Refunds, Invoices
/// - **Catalog**: MenuItems, Categories, Inventory
/// - **Operations**: Stores, Tables, Reservations, Suppliers, PurchaseOrders
/// - **People**: Employees, Payrolls, Schedules, Attendance
/// - **Engagement**: Customers, Referrals, Rewards, Coupons, Promotions, LoyaltyPoints, Feedback
/// - **Insights**: Reports, Analytics
/// - **Administration**: Tenants, Settings, AuditLogs, Notifications
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    /// Customer orders.
    Orders,
    /// Menu items.
    MenuItems,
    /// Menu categories.
    Categories,
    /// Stock levels.
    Inventory,
    /// Stores (branches) of a tenant.
    Stores,
    /// Tenants.
    Tenants,
    /// Employee records.
    Employees,
    /// Payroll runs and payslips.
    Payrolls,
    /// Shift schedules.
    Schedules,
    /// Clock-in/clock-out records.
    Attendance,
    /// Customer profiles.
    Customers,
    /// Referral records.
    Referrals,
    /// Reward redemptions.
    Rewards,
    /// Coupons.
    Coupons,
    /// Promotions and campaigns.
    Promotions,
    /// Generated reports.
    Reports,
    /// Analytics dashboards.
    Analytics,
    /// Tenant and store settings.
    Settings,
    /// Audit trail.
    AuditLogs,
    /// Payments.
    Payments,
    /// Refund records.
    Refunds,
    /// Invoices and receipts.
    Invoices,
    /// Suppliers.
    Suppliers,
    /// Purchase orders to suppliers.
    PurchaseOrders,
    /// Dining tables.
    Tables,
    /// Table reservations.
    Reservations,
    /// In-app notifications.
    Notifications,
    /// Loyalty point balances.
    LoyaltyPoints,
    /// Customer feedback.
    Feedback,
}

impl Resource {
    /// Get the string representation of the resource type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Orders => "orders",
            Resource::MenuItems => "menu_items",
            Resource::Categories => "categories",
            Resource::Inventory => "inventory",
            Resource::Stores => "stores",
            Resource::Tenants => "tenants",
            Resource::Employees => "employees",
            Resource::Payrolls => "payrolls",
            Resource::Schedules => "schedules",
            Resource::Attendance => "attendance",
            Resource::Customers => "customers",
            Resource::Referrals => "referrals",
            Resource::Rewards => "rewards",
            Resource::Coupons => "coupons",
            Resource::Promotions => "promotions",
            Resource::Reports => "reports",
            Resource::Analytics => "analytics",
            Resource::Settings => "settings",
            Resource::AuditLogs => "audit_logs",
            Resource::Payments => "payments",
            Resource::Refunds => "refunds",
            Resource::Invoices => "invoices",
            Resource::Suppliers => "suppliers",
            Resource::PurchaseOrders => "purchase_orders",
            Resource::Tables => "tables",
            Resource::Reservations => "reservations",
            Resource::Notifications => "notifications",
            Resource::LoyaltyPoints => "loyalty_points",
            Resource::Feedback => "feedback",
        }
    }

    /// Get the domain that owns this resource type.
    ///
    /// # Example
    ///
    /// ```
    /// use pos_rbac::resources::{Domain, Resource};
    ///
    /// assert_eq!(Resource::Orders.domain(), Domain::Sales);
    /// assert_eq!(Resource::Payrolls.domain(), Domain::People);
    /// ```
    pub fn domain(&self) -> Domain {
        match self {
            Resource::Orders | Resource::Payments | Resource::Refunds | Resource::Invoices => {
                Domain::Sales
            }
            Resource::MenuItems | Resource::Categories | Resource::Inventory => Domain::Catalog,
            Resource::Stores
            | Resource::Tables
            | Resource::Reservations
            | Resource::Suppliers
            | Resource::PurchaseOrders => Domain::Operations,
            Resource::Employees
            | Resource::Payrolls
            | Resource::Schedules
            | Resource::Attendance => Domain::People,
            Resource::Customers
            | Resource::Referrals
            | Resource::Rewards
            | Resource::Coupons
            | Resource::Promotions
            | Resource::LoyaltyPoints
            | Resource::Feedback => Domain::Engagement,
            Resource::Reports | Resource::Analytics => Domain::Insights,
            Resource::Tenants
            | Resource::Settings
            | Resource::AuditLogs
            | Resource::Notifications => Domain::Administration,
        }
    }

    /// Parse resource type from its catalog key.
    ///
    /// # Example
    ///
    /// ```
    /// use pos_rbac::resources::Resource;
    ///
    /// assert_eq!(Resource::parse("orders"), Some(Resource::Orders));
    /// assert_eq!(Resource::parse("loyalty_points"), Some(Resource::LoyaltyPoints));
    /// assert_eq!(Resource::parse("order"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        Self::all().into_iter().find(|r| r.as_str() == s)
    }

    /// Get all resource types.
    pub fn all() -> Vec<Self> {
        vec![
            Resource::Orders,
            Resource::MenuItems,
            Resource::Categories,
            Resource::Inventory,
            Resource::Stores,
            Resource::Tenants,
            Resource::Employees,
            Resource::Payrolls,
            Resource::Schedules,
            Resource::Attendance,
            Resource::Customers,
            Resource::Referrals,
            Resource::Rewards,
            Resource::Coupons,
            Resource::Promotions,
            Resource::Reports,
            Resource::Analytics,
            Resource::Settings,
            Resource::AuditLogs,
            Resource::Payments,
            Resource::Refunds,
            Resource::Invoices,
            Resource::Suppliers,
            Resource::PurchaseOrders,
            Resource::Tables,
            Resource::Reservations,
            Resource::Notifications,
            Resource::LoyaltyPoints,
            Resource::Feedback,
        ]
    }

    /// Get all resource types for a domain.
    pub fn for_domain(domain: Domain) -> Vec<Self> {
        Self::all()
            .into_iter()
            .filter(|r| r.domain() == domain)
            .collect()
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resource {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Resource::parse(s).ok_or_else(|| CatalogError::UnknownResource(s.to_string()))
    }
}
