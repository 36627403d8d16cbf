// SPDX-License-Identifier: MIT OR Apache-2.0
//! Identifier rules for node and port names.

/// Longest allowed name
pub const MAX_NAME_LENGTH: usize = 30;

/// Names that may not be given to children or ports
pub const RESERVED_NAMES: [&str; 2] = ["node", "network"];

/// Check a name against the identifier rules.
///
/// Valid names are 1 to 30 characters of lowercase ASCII letters, digits and
/// underscores, do not start with a digit or with `__`, and are not reserved.
pub fn validate_name(name: &str) -> Result<(), NameError> {
    let Some(first) = name.chars().next() else {
        return Err(NameError::Empty);
    };
    if first.is_ascii_digit() {
        return Err(NameError::LeadingDigit(name.to_string()));
    }
    if name.starts_with("__") {
        return Err(NameError::DoubleUnderscore(name.to_string()));
    }
    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_'))
    {
        return Err(NameError::InvalidCharacter {
            name: name.to_string(),
            character: c,
        });
    }
    if name.len() > MAX_NAME_LENGTH {
        return Err(NameError::TooLong(name.to_string()));
    }
    if RESERVED_NAMES.contains(&name) {
        return Err(NameError::Reserved(name.to_string()));
    }
    Ok(())
}

/// Find the first free name of the form `prefix`, `prefix1`, `prefix2`, ...
///
/// Trailing digits on the prefix are stripped first, so `add3` yields `add`,
/// `add1`, ... The lowest free suffix is reused.
pub fn unique_name(prefix: &str, is_taken: impl Fn(&str) -> bool) -> String {
    let base = prefix.trim_end_matches(|c: char| c.is_ascii_digit());
    let base = if base.is_empty() { prefix } else { base };
    if !is_taken(base) {
        return base.to_string();
    }
    (1..)
        .map(|i| format!("{base}{i}"))
        .find(|candidate| !is_taken(candidate))
        .unwrap_or_else(|| base.to_string())
}

/// Error for an invalid or duplicate identifier
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NameError {
    /// Empty name
    #[error("Name cannot be empty")]
    Empty,

    /// Name starts with a digit
    #[error("Name `{0}` cannot start with a digit")]
    LeadingDigit(String),

    /// Name is too long
    #[error("Name `{0}` is longer than {MAX_NAME_LENGTH} characters")]
    TooLong(String),

    /// Character outside `[a-z0-9_]`
    #[error("Name `{name}` contains invalid character `{character}`")]
    InvalidCharacter {
        /// Offending name
        name: String,
        /// First invalid character
        character: char,
    },

    /// Name starts with `__`
    #[error("Name `{0}` cannot start with a double underscore")]
    DoubleUnderscore(String),

    /// Reserved word
    #[error("Name `{0}` is reserved")]
    Reserved(String),

    /// Name already in use
    #[error("Name `{0}` is already in use")]
    Duplicate(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        for name in ["a", "number42", "_private", "add_1", "x".repeat(30).as_str()] {
            assert_eq!(validate_name(name), Ok(()), "{name}");
        }
    }

    #[test]
    fn test_invalid_names() {
        assert_eq!(validate_name(""), Err(NameError::Empty));
        assert!(matches!(validate_name("1234"), Err(NameError::LeadingDigit(_))));
        assert!(matches!(validate_name("__x"), Err(NameError::DoubleUnderscore(_))));
        assert!(matches!(validate_name(&"a".repeat(31)), Err(NameError::TooLong(_))));
        assert!(matches!(validate_name("node"), Err(NameError::Reserved(_))));
        assert!(matches!(validate_name("network"), Err(NameError::Reserved(_))));
        assert!(matches!(
            validate_name("Add"),
            Err(NameError::InvalidCharacter { character: 'A', .. })
        ));
        assert!(matches!(validate_name("a-b"), Err(NameError::InvalidCharacter { .. })));
    }

    #[test]
    fn test_unique_name_reuses_lowest_suffix() {
        let taken = ["add", "add1", "add3"];
        assert_eq!(unique_name("add", |n| taken.contains(&n)), "add2");
        assert_eq!(unique_name("add7", |n| taken.contains(&n)), "add2");
        assert_eq!(unique_name("rect", |n| taken.contains(&n)), "rect");
        assert_eq!(unique_name("42", |_| false), "42");
    }
}
