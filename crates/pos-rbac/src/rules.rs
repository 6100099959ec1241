//! # Business Rules
//!
//! Parameterized checks that go beyond static role grants, such as "a
//! completed order cannot be edited" or "nobody approves their own payroll".
//!
//! Each rule is a named [`BusinessRule`] strategy. A [`RuleRegistry`] is
//! either built from the standard set or resolved from a list of names
//! (typically from configuration). A name that resolves to nothing leaves
//! the registry *corrupt*: the resolver then logs an error and applies its
//! [`CorruptRulePolicy`].

use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

use crate::actions::Action;
use crate::error::{CatalogError, RuleViolation};
use crate::query::PermissionContext;
use crate::resources::Resource;
use crate::roles::Role;
use crate::user::UserInfo;

/// A named authorization predicate over a record's data.
pub trait BusinessRule: Send + Sync + fmt::Debug {
    /// Stable name used for lookup and in denial reasons.
    fn name(&self) -> &'static str;

    /// Whether this rule applies to `action` on `resource`.
    fn matches(&self, resource: Resource, action: Action) -> bool;

    /// Evaluate the rule against the record data supplied by the caller.
    fn evaluate(
        &self,
        user: &UserInfo,
        resource_data: &Map<String, Value>,
        context: &PermissionContext,
    ) -> Result<(), RuleViolation>;
}

/// What to do when the registry could not be loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CorruptRulePolicy {
    /// Deny every request that reaches the business-rule stage.
    #[default]
    FailClosed,
    /// Skip business rules and grant. Legacy behavior.
    FailOpen,
}

fn number(data: &Map<String, Value>, key: &str) -> Option<f64> {
    data.get(key).and_then(Value::as_f64)
}

fn text<'a>(data: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    data.get(key).and_then(Value::as_str)
}

/// Orders can only be cancelled while `pending` or `confirmed`; customers
/// only while `pending`.
///
/// Orders without a `status` field pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderCancellationWindow;

impl BusinessRule for OrderCancellationWindow {
    fn name(&self) -> &'static str {
        "order_cancellation_window"
    }

    fn matches(&self, resource: Resource, action: Action) -> bool {
        resource == Resource::Orders && action == Action::Cancel
    }

    fn evaluate(
        &self,
        user: &UserInfo,
        data: &Map<String, Value>,
        _context: &PermissionContext,
    ) -> Result<(), RuleViolation> {
        let Some(status) = text(data, "status") else {
            return Ok(());
        };
        let cancellable: &[&str] = if user.role == Role::Customer {
            &["pending"]
        } else {
            &["pending", "confirmed"]
        };
        if cancellable.contains(&status) {
            Ok(())
        } else {
            Err(RuleViolation::new(format!(
                "order in status '{}' can no longer be cancelled",
                status
            )))
        }
    }
}

/// Completed and cancelled orders are immutable.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderFinalized;

impl BusinessRule for OrderFinalized {
    fn name(&self) -> &'static str {
        "order_finalized"
    }

    fn matches(&self, resource: Resource, action: Action) -> bool {
        resource == Resource::Orders && action == Action::Update
    }

    fn evaluate(
        &self,
        _user: &UserInfo,
        data: &Map<String, Value>,
        _context: &PermissionContext,
    ) -> Result<(), RuleViolation> {
        match text(data, "status") {
            Some(status @ ("completed" | "cancelled")) => Err(RuleViolation::new(format!(
                "order is {} and can no longer be modified",
                status
            ))),
            _ => Ok(()),
        }
    }
}

/// A refund may not exceed the order total, when the total is known.
#[derive(Debug, Clone, Copy, Default)]
pub struct RefundWithinOrderTotal;

impl BusinessRule for RefundWithinOrderTotal {
    fn name(&self) -> &'static str {
        "refund_within_order_total"
    }

    fn matches(&self, resource: Resource, action: Action) -> bool {
        resource == Resource::Orders && action == Action::Refund
    }

    fn evaluate(
        &self,
        _user: &UserInfo,
        data: &Map<String, Value>,
        _context: &PermissionContext,
    ) -> Result<(), RuleViolation> {
        match (number(data, "requestedAmount"), number(data, "orderTotal")) {
            (Some(amount), Some(total)) if amount > total => Err(RuleViolation::new(format!(
                "refund of {} exceeds order total of {}",
                amount, total
            ))),
            _ => Ok(()),
        }
    }
}

/// Discounts already on the order plus the new one may not exceed 100%.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscountStackingLimit;

impl BusinessRule for DiscountStackingLimit {
    fn name(&self) -> &'static str {
        "discount_stacking_limit"
    }

    fn matches(&self, resource: Resource, action: Action) -> bool {
        resource == Resource::Orders && action == Action::Discount
    }

    fn evaluate(
        &self,
        _user: &UserInfo,
        data: &Map<String, Value>,
        _context: &PermissionContext,
    ) -> Result<(), RuleViolation> {
        let existing = number(data, "existingDiscount").unwrap_or(0.0);
        let requested = number(data, "requestedDiscount").unwrap_or(0.0);
        if existing + requested > 100.0 {
            return Err(RuleViolation::new(format!(
                "combined discount of {}% exceeds 100%",
                existing + requested
            )));
        }
        Ok(())
    }
}

/// Nobody approves a record that belongs to themselves.
#[derive(Debug, Clone, Copy)]
pub struct NoSelfApproval {
    name: &'static str,
    resource: Resource,
    owner_field: &'static str,
}

impl NoSelfApproval {
    /// Payroll runs cannot be approved by the employee they pay.
    pub const PAYROLL: NoSelfApproval = NoSelfApproval {
        name: "payroll_no_self_approval",
        resource: Resource::Payrolls,
        owner_field: "employeeId",
    };

    /// Attendance corrections cannot be approved by the employee concerned.
    pub const ATTENDANCE: NoSelfApproval = NoSelfApproval {
        name: "attendance_no_self_approval",
        resource: Resource::Attendance,
        owner_field: "employeeId",
    };
}

impl BusinessRule for NoSelfApproval {
    fn name(&self) -> &'static str {
        self.name
    }

    fn matches(&self, resource: Resource, action: Action) -> bool {
        resource == self.resource && action == Action::Approve
    }

    fn evaluate(
        &self,
        user: &UserInfo,
        data: &Map<String, Value>,
        _context: &PermissionContext,
    ) -> Result<(), RuleViolation> {
        if text(data, self.owner_field) == Some(user.uid.as_str()) {
            return Err(RuleViolation::new(format!(
                "{} records cannot be approved by their owner",
                self.resource
            )));
        }
        Ok(())
    }
}

/// Names of all built-in rules, in evaluation order.
pub const STANDARD_RULES: &[&str] = &[
    "order_cancellation_window",
    "order_finalized",
    "refund_within_order_total",
    "discount_stacking_limit",
    "payroll_no_self_approval",
    "attendance_no_self_approval",
];

/// Resolve a built-in rule by name.
pub fn lookup(name: &str) -> Option<Arc<dyn BusinessRule>> {
    let rule: Arc<dyn BusinessRule> = match name {
        "order_cancellation_window" => Arc::new(OrderCancellationWindow),
        "order_finalized" => Arc::new(OrderFinalized),
        "refund_within_order_total" => Arc::new(RefundWithinOrderTotal),
        "discount_stacking_limit" => Arc::new(DiscountStackingLimit),
        "payroll_no_self_approval" => Arc::new(NoSelfApproval::PAYROLL),
        "attendance_no_self_approval" => Arc::new(NoSelfApproval::ATTENDANCE),
        _ => return None,
    };
    Some(rule)
}

/// The set of business rules a resolver evaluates.
#[derive(Debug, Clone)]
pub struct RuleRegistry {
    rules: Result<Vec<Arc<dyn BusinessRule>>, CatalogError>,
}

impl RuleRegistry {
    /// A registry with no rules.
    pub fn empty() -> Self {
        Self { rules: Ok(Vec::new()) }
    }

    /// A registry with every built-in rule.
    pub fn standard() -> Self {
        Self::from_names(STANDARD_RULES.iter().copied())
    }

    /// Resolve rules by name.
    ///
    /// The first unknown name makes the whole registry corrupt.
    ///
    /// ```
    /// use pos_rbac::RuleRegistry;
    ///
    /// let ok = RuleRegistry::from_names(["order_finalized"]);
    /// assert!(!ok.is_corrupt());
    ///
    /// let broken = RuleRegistry::from_names(["order_finalized", "no_such_rule"]);
    /// assert!(broken.is_corrupt());
    /// ```
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rules = names
            .into_iter()
            .map(|name| {
                let name = name.as_ref();
                lookup(name).ok_or_else(|| CatalogError::UnknownRule(name.to_string()))
            })
            .collect::<Result<Vec<_>, _>>();

        if let Err(err) = &rules {
            tracing::error!(error = %err, "Business rule registry failed to load");
        }
        Self { rules }
    }

    /// Add a custom rule. Ignored if the registry is corrupt.
    pub fn register(&mut self, rule: Arc<dyn BusinessRule>) {
        if let Ok(rules) = &mut self.rules {
            rules.push(rule);
        }
    }

    /// Builder form of [`register`](Self::register).
    pub fn with_rule(mut self, rule: Arc<dyn BusinessRule>) -> Self {
        self.register(rule);
        self
    }

    /// Check if the registry failed to load.
    pub fn is_corrupt(&self) -> bool {
        self.rules.is_err()
    }

    /// Names of the loaded rules.
    pub fn names(&self) -> Vec<&'static str> {
        match &self.rules {
            Ok(rules) => rules.iter().map(|r| r.name()).collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Rules applying to `action` on `resource`, or the load error.
    pub fn matching(
        &self,
        resource: Resource,
        action: Action,
    ) -> Result<Vec<&Arc<dyn BusinessRule>>, &CatalogError> {
        match &self.rules {
            Ok(rules) => Ok(rules
                .iter()
                .filter(|r| r.matches(resource, action))
                .collect()),
            Err(err) => Err(err),
        }
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("test data must be an object"),
        }
    }

    fn staff() -> UserInfo {
        UserInfo::new("u1", Role::ShiftLeader)
    }

    #[test]
    fn test_cancellation_window() {
        let rule = OrderCancellationWindow;
        let ctx = PermissionContext::new();
        assert!(rule.matches(Resource::Orders, Action::Cancel));
        assert!(!rule.matches(Resource::Reservations, Action::Cancel));

        assert!(rule.evaluate(&staff(), &data(json!({"status": "confirmed"})), &ctx).is_ok());
        assert!(rule.evaluate(&staff(), &data(json!({"status": "delivered"})), &ctx).is_err());
        assert!(rule.evaluate(&staff(), &data(json!({})), &ctx).is_ok());

        let customer = UserInfo::new("c1", Role::Customer);
        assert!(rule.evaluate(&customer, &data(json!({"status": "pending"})), &ctx).is_ok());
        let err = rule
            .evaluate(&customer, &data(json!({"status": "confirmed"})), &ctx)
            .unwrap_err();
        assert!(err.0.contains("confirmed"));
    }

    #[test]
    fn test_order_finalized() {
        let rule = OrderFinalized;
        let ctx = PermissionContext::new();
        assert!(rule.evaluate(&staff(), &data(json!({"status": "completed"})), &ctx).is_err());
        assert!(rule.evaluate(&staff(), &data(json!({"status": "cancelled"})), &ctx).is_err());
        assert!(rule.evaluate(&staff(), &data(json!({"status": "preparing"})), &ctx).is_ok());
    }

    #[test]
    fn test_refund_within_total() {
        let rule = RefundWithinOrderTotal;
        let ctx = PermissionContext::new();
        let ok = data(json!({"requestedAmount": 50, "orderTotal": 80.0}));
        let too_much = data(json!({"requestedAmount": 90, "orderTotal": 80.0}));
        let unknown_total = data(json!({"requestedAmount": 90}));
        assert!(rule.evaluate(&staff(), &ok, &ctx).is_ok());
        assert!(rule.evaluate(&staff(), &too_much, &ctx).is_err());
        assert!(rule.evaluate(&staff(), &unknown_total, &ctx).is_ok());
    }

    #[test]
    fn test_discount_stacking() {
        let rule = DiscountStackingLimit;
        let ctx = PermissionContext::new();
        let ok = data(json!({"existingDiscount": 40, "requestedDiscount": 60}));
        let over = data(json!({"existingDiscount": 50, "requestedDiscount": 60}));
        assert!(rule.evaluate(&staff(), &ok, &ctx).is_ok());
        assert!(rule.evaluate(&staff(), &over, &ctx).is_err());
    }

    #[test]
    fn test_no_self_approval() {
        let rule = NoSelfApproval::PAYROLL;
        let ctx = PermissionContext::new();
        assert!(rule.matches(Resource::Payrolls, Action::Approve));
        assert!(!rule.matches(Resource::Payrolls, Action::Read));
        assert!(rule.evaluate(&staff(), &data(json!({"employeeId": "u1"})), &ctx).is_err());
        assert!(rule.evaluate(&staff(), &data(json!({"employeeId": "u2"})), &ctx).is_ok());
    }

    #[test]
    fn test_lookup_covers_standard_rules() {
        for name in STANDARD_RULES {
            let rule = lookup(name).expect("standard rule must resolve");
            assert_eq!(rule.name(), *name);
        }
        assert!(lookup("unknown").is_none());
    }

    #[test]
    fn test_registry_matching() {
        let registry = RuleRegistry::standard();
        assert!(!registry.is_corrupt());
        assert_eq!(registry.names().len(), STANDARD_RULES.len());

        let cancel = registry.matching(Resource::Orders, Action::Cancel).unwrap();
        assert_eq!(cancel.len(), 1);
        assert_eq!(cancel[0].name(), "order_cancellation_window");

        assert!(registry
            .matching(Resource::MenuItems, Action::Read)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_corrupt_registry() {
        let mut registry = RuleRegistry::from_names(["order_finalized", "bogus"]);
        assert!(registry.is_corrupt());
        assert!(registry.names().is_empty());

        registry.register(Arc::new(OrderFinalized));
        assert!(registry.is_corrupt());

        let err = registry.matching(Resource::Orders, Action::Update).unwrap_err();
        assert_eq!(err, &CatalogError::UnknownRule("bogus".to_string()));
    }

    #[test]
    fn test_custom_rule_registration() {
        let registry = RuleRegistry::empty().with_rule(Arc::new(OrderFinalized));
        assert_eq!(registry.names(), vec!["order_finalized"]);
    }
}
