//! # Actions
//!
//! Defines all actions that can be performed on resources, and the compact
//! [`ActionSet`] the permission catalog is built from.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CatalogError;

/// Actions that can be performed on resources.
///
/// Actions fall into a few groups:
/// - **Data**: Create, Read, Update, Delete
/// - **Workflow**: Approve, Reject, Cancel, Complete
/// - **Output**: Print, Export
/// - **Money**: Discount, Refund (subject to per-user ceilings)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Create new resource instances.
    Create = 0,

    /// Read/view resource data.
    Read = 1,

    /// Modify existing resource data.
    Update = 2,

    /// Permanently remove resource instances.
    Delete = 3,

    /// Approve a pending request (payroll, leave, purchase order...).
    Approve = 4,

    /// Reject a pending request.
    Reject = 5,

    /// Cancel an order or reservation.
    Cancel = 6,

    /// Mark an order or reservation as fulfilled.
    Complete = 7,

    /// Print receipts, invoices, reports.
    Print = 8,

    /// Download or export resource data.
    Export = 9,

    /// Apply a discount.
    ///
    /// Bounded by the user's `maxDiscountPercentage`.
    Discount = 10,

    /// Issue a refund.
    ///
    /// Bounded by the user's `maxRefundAmount`.
    Refund = 11,
}

impl Action {
    /// Get the string representation of the action.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Approve => "approve",
            Action::Reject => "reject",
            Action::Cancel => "cancel",
            Action::Complete => "complete",
            Action::Print => "print",
            Action::Export => "export",
            Action::Discount => "discount",
            Action::Refund => "refund",
        }
    }

    /// Parse action from its catalog key.
    ///
    /// Matching is exact: only the lowercase catalog keys are recognized.
    ///
    /// # Example
    ///
    /// ```
    /// use pos_rbac::actions::Action;
    ///
    /// assert_eq!(Action::parse("refund"), Some(Action::Refund));
    /// assert_eq!(Action::parse("Refund"), None);
    /// assert_eq!(Action::parse("invalid"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "create" => Some(Action::Create),
            "read" => Some(Action::Read),
            "update" => Some(Action::Update),
            "delete" => Some(Action::Delete),
            "approve" => Some(Action::Approve),
            "reject" => Some(Action::Reject),
            "cancel" => Some(Action::Cancel),
            "complete" => Some(Action::Complete),
            "print" => Some(Action::Print),
            "export" => Some(Action::Export),
            "discount" => Some(Action::Discount),
            "refund" => Some(Action::Refund),
            _ => None,
        }
    }

    /// Get all actions.
    pub fn all() -> Vec<Self> {
        vec![
            Action::Create,
            Action::Read,
            Action::Update,
            Action::Delete,
            Action::Approve,
            Action::Reject,
            Action::Cancel,
            Action::Complete,
            Action::Print,
            Action::Export,
            Action::Discount,
            Action::Refund,
        ]
    }

    /// Check if this action moves money (and is subject to ceilings).
    pub fn is_monetary(&self) -> bool {
        matches!(self, Action::Discount | Action::Refund)
    }

    /// Check if this is a read-only action.
    pub fn is_read_only(&self) -> bool {
        matches!(self, Action::Read | Action::Print | Action::Export)
    }

    const fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::parse(s).ok_or_else(|| CatalogError::UnknownAction(s.to_string()))
    }
}

/// A set of actions, stored as a bitmask.
///
/// The permission catalog maps every `(Role, Resource)` pair to one of
/// these; the empty set means no access.
///
/// # Example
///
/// ```
/// use pos_rbac::actions::{Action, ActionSet};
///
/// let set = ActionSet::of(&[Action::Read, Action::Print]);
/// assert!(set.contains(Action::Read));
/// assert!(!set.contains(Action::Delete));
/// assert_eq!(set.len(), 2);
/// ```
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ActionSet(u16);

impl ActionSet {
    /// No actions.
    pub const EMPTY: ActionSet = ActionSet(0);

    /// Every action.
    pub const ALL: ActionSet = ActionSet((1 << 12) - 1);

    /// Build a set from a list of actions.
    pub const fn of(actions: &[Action]) -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < actions.len() {
            bits |= actions[i].bit();
            i += 1;
        }
        ActionSet(bits)
    }

    /// Check whether the set grants an action.
    pub fn contains(self, action: Action) -> bool {
        self.0 & action.bit() != 0
    }

    /// Check if the set grants nothing.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of actions in the set.
    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Union of two sets.
    pub const fn union(self, other: ActionSet) -> ActionSet {
        ActionSet(self.0 | other.0)
    }

    /// Iterate the actions in declaration order.
    pub fn iter(self) -> impl Iterator<Item = Action> {
        Action::all().into_iter().filter(move |a| self.contains(*a))
    }
}

impl fmt::Debug for ActionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter().map(|a| a.as_str())).finish()
    }
}

impl FromIterator<Action> for ActionSet {
    fn from_iter<T: IntoIterator<Item = Action>>(iter: T) -> Self {
        iter.into_iter()
            .fold(ActionSet::EMPTY, |set, a| ActionSet(set.0 | a.bit()))
    }
}
