//! Identifier validation.
//!
//! Every named entity in a module (blocks, arguments, instructions, globals,
//! functions, nominal types) shares one identifier grammar. The regex is
//! compiled once and shared process-wide.

use once_cell::sync::Lazy;
use regex::Regex;

/// The identifier grammar: `[A-Za-z_][A-Za-z0-9_.]*`.
pub static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_.]*$").expect("identifier regex"));

/// Check whether `name` is a legal identifier.
pub fn is_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_plain_names() {
        assert!(is_identifier("entry"));
        assert!(is_identifier("_tmp"));
        assert!(is_identifier("then_join.0"));
        assert!(is_identifier("x1"));
    }

    #[test]
    fn test_rejects_illegal_names() {
        assert!(!is_identifier(""));
        assert!(!is_identifier("0x"));
        assert!(!is_identifier("a-b"));
        assert!(!is_identifier("a b"));
        assert!(!is_identifier("5^0"));
    }
}
