//! Input safety rules for submitted login data.
//!
//! User names may be internationalized domain names (`admin@bücher.example`
//! or `bücher.example`); they are converted to their ASCII form before any
//! other check so the user store only ever sees one spelling.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{AuthError, AuthResult};

/// Longest value accepted in a login form field.
pub const MAX_FIELD_LEN: usize = 255;

/// Injection fragments refused in any login field.
static SUSPICIOUS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?ix)
        ["'`]\s*(?:or|and|union|select|insert|update|delete|drop|alter|create)\b
        | \bunion\b\s+(?:all\s+)?\bselect\b
        | /\*|\*/
        | <\s*/?\s*(?:script|iframe|object|embed|applet|form|meta|link|style)\b
        | \bjavascript\s*:
        | \bon[a-z]+\s*=
        "#,
    )
    .unwrap_or_else(|e| panic!("invalid input safety pattern: {e}"))
});

/// Checks a login form value against the input safety rules.
///
/// Empty values pass; emptiness is the caller's concern.
///
/// # Errors
///
/// Returns [`AuthError::InvalidInput`] when the value is too long, contains
/// control characters, or contains an injection fragment.
pub fn check_input(field: &'static str, value: &str) -> AuthResult<()> {
    if value.len() > MAX_FIELD_LEN {
        return Err(AuthError::invalid_input(field, "value too long"));
    }
    if value.chars().any(char::is_control) {
        return Err(AuthError::invalid_input(field, "control character"));
    }
    if SUSPICIOUS.is_match(value) {
        return Err(AuthError::invalid_input(field, "disallowed sequence"));
    }
    Ok(())
}

/// Converts a user name to its IDN ASCII form.
///
/// ASCII names are returned unchanged apart from surrounding whitespace. For
/// `local@domain` names only the domain part is encoded; the local part must
/// already be ASCII.
///
/// # Errors
///
/// Returns [`AuthError::InvalidInput`] when the name cannot be encoded.
pub fn normalize_username(raw: &str) -> AuthResult<String> {
    let name = raw.trim();
    if name.is_ascii() {
        return Ok(name.to_string());
    }

    match name.rsplit_once('@') {
        Some((local, domain)) => {
            if !local.is_ascii() {
                return Err(AuthError::invalid_input("uname", "non-ASCII local part"));
            }
            Ok(format!("{local}@{}", encode_domain(domain)?))
        }
        None => encode_domain(name),
    }
}

fn encode_domain(domain: &str) -> AuthResult<String> {
    idna::domain_to_ascii(domain)
        .map_err(|e| AuthError::invalid_input("uname", format!("IDN encoding failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_names_are_trimmed_only() {
        assert_eq!(normalize_username("  admin ").unwrap(), "admin");
        assert_eq!(normalize_username("Admin@Example.com").unwrap(), "Admin@Example.com");
    }

    #[test]
    fn idn_domain_is_punycoded() {
        assert_eq!(
            normalize_username("bücher.example").unwrap(),
            "xn--bcher-kva.example"
        );
        assert_eq!(
            normalize_username("admin@bücher.example").unwrap(),
            "admin@xn--bcher-kva.example"
        );
    }

    #[test]
    fn non_ascii_local_part_is_rejected() {
        let err = normalize_username("jürgen@example.com").unwrap_err();
        assert!(matches!(err, AuthError::InvalidInput { field: "uname", .. }));
    }

    #[test]
    fn ordinary_values_pass() {
        assert!(check_input("uname", "reseller1").is_ok());
        assert!(check_input("uname", "admin@xn--bcher-kva.example").is_ok());
        assert!(check_input("upass", "c0rrect-h0rse!battery#staple").is_ok());
        assert!(check_input("upass", "").is_ok());
    }

    #[test]
    fn control_characters_are_rejected() {
        assert!(check_input("uname", "admin\0").is_err());
        assert!(check_input("uname", "admin\r\nSet-Cookie: x").is_err());
    }

    #[test]
    fn injection_fragments_are_rejected() {
        assert!(check_input("uname", "admin' OR 1=1").is_err());
        assert!(check_input("uname", "x UNION SELECT password").is_err());
        assert!(check_input("upass", "a/*comment*/").is_err());
        assert!(check_input("uname", "<script>alert(1)</script>").is_err());
        assert!(check_input("uname", "javascript:alert(1)").is_err());
    }

    #[test]
    fn overlong_values_are_rejected() {
        let long = "a".repeat(MAX_FIELD_LEN + 1);
        assert!(check_input("uname", &long).is_err());
    }
}
