//! Optional case-style conversion between the caller's naming convention and
//! the wire convention.
//!
//! Conversion is applied at URL-assembly time to path segments and
//! query-parameter keys only. Cache keys and method inference always see the
//! caller's original spelling, so switching styles never invalidates routes.

use heck::{ToKebabCase, ToLowerCamelCase, ToSnakeCase};

/// Naming convention applied to outgoing path segments and query keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CaseStyle {
    /// Send segments exactly as written.
    #[default]
    Preserve,
    /// `getProfile` → `get_profile`
    Snake,
    /// `get_profile` → `getProfile`
    Camel,
    /// `getProfile` → `get-profile`
    Kebab,
}

impl CaseStyle {
    /// Converts one path segment or query key.
    pub fn apply(&self, segment: &str) -> String {
        match self {
            CaseStyle::Preserve => segment.to_string(),
            CaseStyle::Snake => segment.to_snake_case(),
            CaseStyle::Camel => segment.to_lower_camel_case(),
            CaseStyle::Kebab => segment.to_kebab_case(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserve_is_the_identity() {
        assert_eq!(CaseStyle::Preserve.apply("getProfile"), "getProfile");
    }

    #[test]
    fn styles_convert_between_conventions() {
        assert_eq!(CaseStyle::Snake.apply("getProfile"), "get_profile");
        assert_eq!(CaseStyle::Camel.apply("get_profile"), "getProfile");
        assert_eq!(CaseStyle::Kebab.apply("getProfile"), "get-profile");
    }

    #[test]
    fn numeric_segments_pass_through_unchanged() {
        // Resource ids are path segments too; conversion must not mangle them.
        assert_eq!(CaseStyle::Snake.apply("123"), "123");
        assert_eq!(CaseStyle::Kebab.apply("123"), "123");
    }
}
