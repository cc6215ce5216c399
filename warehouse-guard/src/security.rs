//! Escaping and input validation for generated SQL.
//!
//! Expectation arguments end up inside query text. Identifiers are always
//! quoted and string values always emitted as escaped literals, so a column
//! name or regex pattern can't break out of its position in the query.

use crate::error::{GuardError, Result};

/// Characters removed from a regex pattern before it becomes part of a check name.
pub const CHECK_NAME_STRIPPED_CHARS: &str = "-&é()çà$*%ùè`~!@#";

/// Upper bound on identifier length, matching the strictest supported warehouse.
const MAX_IDENTIFIER_LENGTH: usize = 300;
const MAX_PATTERN_LENGTH: usize = 1000;

/// SQL identifier and literal escaping utilities.
pub struct SqlSecurity;

impl SqlSecurity {
    /// Validates an identifier before it is quoted.
    ///
    /// Quoting makes any character safe, so this only rejects values no
    /// warehouse accepts as a name: empty, NUL-bearing, control characters,
    /// or longer than 300 characters.
    pub fn validate_identifier(identifier: &str) -> Result<()> {
        if identifier.trim().is_empty() {
            return Err(GuardError::invalid_argument(
                "identifier",
                "identifier cannot be empty or whitespace-only",
            ));
        }
        if identifier.chars().count() > MAX_IDENTIFIER_LENGTH {
            return Err(GuardError::invalid_argument(
                "identifier",
                format!("identifier too long (max {MAX_IDENTIFIER_LENGTH} characters)"),
            ));
        }
        if identifier.chars().any(char::is_control) {
            return Err(GuardError::invalid_argument(
                "identifier",
                format!("identifier '{}' contains control characters", identifier.escape_debug()),
            ));
        }
        Ok(())
    }

    /// Quotes an identifier with backticks, escaping embedded backticks and
    /// backslashes.
    ///
    /// ```rust
    /// use warehouse_guard::security::SqlSecurity;
    ///
    /// assert_eq!(SqlSecurity::quote_backtick("order id").unwrap(), "`order id`");
    /// assert_eq!(SqlSecurity::quote_backtick("a`b").unwrap(), r"`a\`b`");
    /// ```
    pub fn quote_backtick(identifier: &str) -> Result<String> {
        Self::validate_identifier(identifier)?;
        let escaped = identifier.replace('\\', "\\\\").replace('`', "\\`");
        Ok(format!("`{escaped}`"))
    }

    /// Quotes an identifier with double quotes, doubling embedded quotes.
    ///
    /// ```rust
    /// use warehouse_guard::security::SqlSecurity;
    ///
    /// assert_eq!(SqlSecurity::quote_double("Amount").unwrap(), "\"Amount\"");
    /// assert_eq!(SqlSecurity::quote_double("a\"b").unwrap(), "\"a\"\"b\"");
    /// ```
    pub fn quote_double(identifier: &str) -> Result<String> {
        Self::validate_identifier(identifier)?;
        let escaped = identifier.replace('"', "\"\"");
        Ok(format!("\"{escaped}\""))
    }

    /// Renders a single-quoted literal for dialects with backslash escapes.
    pub fn backslash_literal(value: &str) -> String {
        let mut out = String::with_capacity(value.len() + 2);
        out.push('\'');
        for c in value.chars() {
            match c {
                '\\' => out.push_str("\\\\"),
                '\'' => out.push_str("\\'"),
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                other => out.push(other),
            }
        }
        out.push('\'');
        out
    }

    /// Renders a single-quoted literal for dialects that escape by doubling.
    pub fn doubled_quote_literal(value: &str) -> String {
        format!("'{}'", value.replace('\'', "''"))
    }

    /// Validates a regex pattern before it is embedded in a predicate.
    ///
    /// The pattern must be non-empty, free of NUL bytes, at most 1000
    /// characters, and compile as a regular expression.
    pub fn validate_regex_pattern(pattern: &str) -> Result<()> {
        if pattern.is_empty() {
            return Err(GuardError::invalid_argument(
                "pattern",
                "regex pattern cannot be empty",
            ));
        }
        if pattern.len() > MAX_PATTERN_LENGTH {
            return Err(GuardError::invalid_argument(
                "pattern",
                format!("regex pattern too long (max {MAX_PATTERN_LENGTH} characters)"),
            ));
        }
        if pattern.contains('\0') {
            return Err(GuardError::invalid_argument(
                "pattern",
                "regex pattern cannot contain null bytes",
            ));
        }
        regex::Regex::new(pattern).map_err(|e| {
            GuardError::invalid_argument("pattern", format!("invalid regex pattern: {e}"))
        })?;
        Ok(())
    }

    /// Strips punctuation from a pattern so it can be appended to a check name.
    ///
    /// This only tidies the name; the pattern itself is embedded unmodified
    /// (and escaped) in the predicate.
    ///
    /// ```rust
    /// use warehouse_guard::security::SqlSecurity;
    ///
    /// assert_eq!(SqlSecurity::sanitize_for_check_name("^[a-z]+@(x|y)$"), "^[az]+x|y");
    /// ```
    pub fn sanitize_for_check_name(pattern: &str) -> String {
        pattern
            .chars()
            .filter(|c| !CHECK_NAME_STRIPPED_CHARS.contains(*c))
            .collect()
    }
}

/// Input validation for numeric arguments.
pub struct InputValidator;

impl InputValidator {
    /// Validates that a bound is a usable number.
    pub fn validate_bound(value: f64, name: &str) -> Result<()> {
        if !value.is_finite() {
            return Err(GuardError::invalid_argument(
                name,
                format!("bound must be a finite number, got {value}"),
            ));
        }
        Ok(())
    }

    /// Validates that `low <= high`.
    pub fn validate_range(low: f64, high: f64) -> Result<()> {
        Self::validate_bound(low, "low")?;
        Self::validate_bound(high, "high")?;
        if low > high {
            return Err(GuardError::invalid_argument(
                "low",
                format!("lower bound {low} is greater than upper bound {high}"),
            ));
        }
        Ok(())
    }
}
