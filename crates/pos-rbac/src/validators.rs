//! Type guards for raw values arriving from claims, stores and requests.

use uuid::{Uuid, Variant};

use crate::actions::Action;
use crate::resources::Resource;
use crate::roles::Role;

/// `true` if `value` is a role key in the catalog.
pub fn is_role(value: &str) -> bool {
    Role::parse(value).is_some()
}

/// `true` if `value` is a resource key in the catalog.
pub fn is_resource(value: &str) -> bool {
    Resource::parse(value).is_some()
}

/// `true` if `value` is an action key in the catalog.
pub fn is_action(value: &str) -> bool {
    Action::parse(value).is_some()
}

/// `true` if `value` is non-empty after trimming whitespace.
pub fn is_non_empty_id(value: &str) -> bool {
    !value.trim().is_empty()
}

/// `true` if `value` is a hyphenated RFC 4122 UUID of version 1 to 5.
///
/// Case-insensitive. Braced, URN and unhyphenated forms are rejected.
///
/// ```
/// use pos_rbac::validators::is_uuid;
///
/// assert!(is_uuid("123e4567-e89b-12d3-a456-426614174000"));
/// assert!(is_uuid("123E4567-E89B-42D3-A456-426614174000"));
/// assert!(!is_uuid("123e4567e89b12d3a456426614174000"));
/// ```
pub fn is_uuid(value: &str) -> bool {
    if value.len() != 36 {
        return false;
    }
    match Uuid::try_parse(value) {
        Ok(uuid) => {
            matches!(uuid.get_version_num(), 1..=5) && uuid.get_variant() == Variant::RFC4122
        }
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_guards() {
        assert!(is_role("store_manager"));
        assert!(!is_role("manager"));
        assert!(is_resource("payrolls"));
        assert!(!is_resource("payroll"));
        assert!(is_action("discount"));
        assert!(!is_action("Discount"));
    }

    #[test]
    fn test_non_empty_id() {
        assert!(is_non_empty_id("u1"));
        assert!(is_non_empty_id(" u1 "));
        assert!(!is_non_empty_id(""));
        assert!(!is_non_empty_id("   \t"));
    }

    #[test]
    fn test_uuid_versions() {
        assert!(is_uuid("6ba7b810-9dad-11d1-80b4-00c04fd430c8")); // v1
        assert!(is_uuid("6fa459ea-ee8a-3ca4-894e-db77e160355e")); // v3
        assert!(is_uuid("f47ac10b-58cc-4372-a567-0e02b2c3d479")); // v4
        assert!(is_uuid("886313e1-3b8a-5372-9b90-0c9aee199e5d")); // v5
        assert!(!is_uuid("017f22e2-79b0-7cc3-98c4-dc0c0c07398f")); // v7
        assert!(!is_uuid("00000000-0000-0000-0000-000000000000"));
    }

    #[test]
    fn test_uuid_variant_and_shape() {
        // Version 4 but Microsoft variant (c).
        assert!(!is_uuid("f47ac10b-58cc-4372-c567-0e02b2c3d479"));
        assert!(!is_uuid("{f47ac10b-58cc-4372-a567-0e02b2c3d479}"));
        assert!(!is_uuid("urn:uuid:f47ac10b-58cc-4372-a567-0e02b2c3d479"));
        assert!(!is_uuid("f47ac10b-58cc-4372-a567-0e02b2c3d47z"));
        assert!(!is_uuid(""));
    }
}
