//! Expectations: declarative assertions about a table, and the predicate each
//! one compiles to.
//!
//! An [`Expectation`] pairs a deterministic check name with a typed
//! [`Predicate`]. The predicate is dialect-neutral; it only becomes SQL text
//! when a [`QueryRenderer`](crate::sql::QueryRenderer) renders it.

use crate::error::{GuardError, Result};
use crate::security::{InputValidator, SqlSecurity};
use crate::sql::ast::{Aggregate, Operand, Predicate, RowCondition};
use crate::sql::{Dialect, QueryRenderer};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A numeric bound for range expectations.
///
/// Integers stay integers so the rendered SQL reads `BETWEEN 10 AND 20`
/// rather than `BETWEEN 10.0 AND 20.0`. Bounds that arrive as text or JSON go
/// through `TryFrom`, which is where a non-numeric bound is rejected.
///
/// ```rust
/// use warehouse_guard::expectation::NumericBound;
///
/// assert_eq!(NumericBound::from(10), NumericBound::Integer(10));
/// assert_eq!(NumericBound::try_from("2.5").unwrap(), NumericBound::Float(2.5));
/// assert!(NumericBound::try_from("ten").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumericBound {
    Integer(i64),
    Float(f64),
}

impl NumericBound {
    /// Returns the bound as a float, for comparisons.
    pub fn as_f64(&self) -> f64 {
        match self {
            Self::Integer(v) => *v as f64,
            Self::Float(v) => *v,
        }
    }
}

impl fmt::Display for NumericBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
        }
    }
}

macro_rules! impl_integer_bound {
    ($($t:ty),*) => {
        $(impl From<$t> for NumericBound {
            fn from(value: $t) -> Self {
                Self::Integer(i64::from(value))
            }
        })*
    };
}

impl_integer_bound!(i8, i16, i32, i64, u8, u16, u32);

macro_rules! impl_wide_unsigned_bound {
    ($($t:ty),*) => {
        $(impl TryFrom<$t> for NumericBound {
            type Error = GuardError;

            fn try_from(value: $t) -> Result<Self> {
                i64::try_from(value).map(Self::Integer).map_err(|_| {
                    GuardError::invalid_argument(
                        "bound",
                        format!("{value} exceeds the largest supported bound {}", i64::MAX),
                    )
                })
            }
        })*
    };
}

impl_wide_unsigned_bound!(u64, usize);

impl From<f32> for NumericBound {
    fn from(value: f32) -> Self {
        Self::Float(f64::from(value))
    }
}

impl From<f64> for NumericBound {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl TryFrom<&str> for NumericBound {
    type Error = GuardError;

    fn try_from(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        if let Ok(v) = trimmed.parse::<i64>() {
            return Ok(Self::Integer(v));
        }
        match trimmed.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(Self::Float(v)),
            _ => Err(GuardError::invalid_argument(
                "bound",
                format!("'{value}' is not numeric"),
            )),
        }
    }
}

impl TryFrom<&serde_json::Value> for NumericBound {
    type Error = GuardError;

    fn try_from(value: &serde_json::Value) -> Result<Self> {
        if let Some(v) = value.as_i64() {
            return Ok(Self::Integer(v));
        }
        value.as_f64().map(Self::Float).ok_or_else(|| {
            GuardError::invalid_argument("bound", format!("{value} is not numeric"))
        })
    }
}

/// The kinds of expectation a [`CheckBuilder`](crate::builder::CheckBuilder)
/// can register, with their arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExpectationKind {
    /// No NULL values in the column.
    NotNull { column: String },
    /// `AVG(column)` lies in `[low, high]`.
    MeanBetween {
        column: String,
        low: NumericBound,
        high: NumericBound,
    },
    /// Every non-null value is distinct.
    ValuesUnique { column: String },
    /// Every non-null value, cast to text, contains a match for `pattern`.
    MatchesRegex { column: String, pattern: String },
    /// No value, cast to text, contains a match for `pattern`.
    NotMatchesRegex { column: String, pattern: String },
    /// The table's row count lies in `[low, high]`.
    RowCountBetween {
        low: NumericBound,
        high: NumericBound,
    },
}

impl ExpectationKind {
    /// The column this expectation reads, if it reads one.
    pub fn column(&self) -> Option<&str> {
        match self {
            Self::NotNull { column }
            | Self::MeanBetween { column, .. }
            | Self::ValuesUnique { column }
            | Self::MatchesRegex { column, .. }
            | Self::NotMatchesRegex { column, .. } => Some(column),
            Self::RowCountBetween { .. } => None,
        }
    }

    /// Checks scalar arguments: bounds must be finite and ordered, patterns
    /// must be valid regular expressions.
    pub fn validate_arguments(&self) -> Result<()> {
        match self {
            Self::MeanBetween { low, high, .. } | Self::RowCountBetween { low, high } => {
                InputValidator::validate_range(low.as_f64(), high.as_f64())
            }
            Self::MatchesRegex { pattern, .. } | Self::NotMatchesRegex { pattern, .. } => {
                SqlSecurity::validate_regex_pattern(pattern)
            }
            Self::NotNull { .. } | Self::ValuesUnique { .. } => Ok(()),
        }
    }

    /// The deterministic check name for this expectation.
    ///
    /// Bounds are not part of the name, so registering the same range
    /// expectation twice on one column collides.
    pub fn check_name(&self) -> String {
        match self {
            Self::NotNull { column } => format!("expect_{column}_value_to_not_be_null"),
            Self::MeanBetween { column, .. } => {
                format!("expect_{column}_value_mean_to_be_between")
            }
            Self::ValuesUnique { column } => {
                format!("expect_{column}_column_values_to_be_unique")
            }
            Self::MatchesRegex { column, pattern } => format!(
                "expect_column_{column}_values_to_match_regex_{}",
                SqlSecurity::sanitize_for_check_name(pattern)
            ),
            Self::NotMatchesRegex { column, pattern } => format!(
                "expect_column_{column}_values_to_not_match_regex_{}",
                SqlSecurity::sanitize_for_check_name(pattern)
            ),
            Self::RowCountBetween { .. } => "expect_table_row_count_to_be_between".to_string(),
        }
    }

    /// Builds the whole-table predicate for this expectation.
    pub fn predicate(&self) -> Predicate {
        match self {
            Self::NotNull { column } => Predicate::Equals(
                Aggregate::CountIf(RowCondition::IsNull(column.clone())),
                Operand::Integer(0),
            ),
            Self::MeanBetween { column, low, high } => Predicate::Between {
                value: Aggregate::Avg(column.clone()),
                low: *low,
                high: *high,
            },
            Self::ValuesUnique { column } => Predicate::Equals(
                Aggregate::Count(column.clone()),
                Operand::Aggregate(Aggregate::CountDistinct(column.clone())),
            ),
            Self::MatchesRegex { column, pattern } => Predicate::Equals(
                Aggregate::CountIf(RowCondition::IsNotNull(column.clone()).and(
                    RowCondition::MatchesRegex {
                        column: column.clone(),
                        pattern: pattern.clone(),
                    }
                    .not(),
                )),
                Operand::Integer(0),
            ),
            Self::NotMatchesRegex { column, pattern } => Predicate::Equals(
                Aggregate::CountIf(RowCondition::MatchesRegex {
                    column: column.clone(),
                    pattern: pattern.clone(),
                }),
                Operand::Integer(0),
            ),
            Self::RowCountBetween { low, high } => Predicate::Between {
                value: Aggregate::CountRows,
                low: *low,
                high: *high,
            },
        }
    }
}

/// One registered assertion: a unique check name and the predicate that
/// decides it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expectation {
    check_name: String,
    kind: ExpectationKind,
    predicate: Predicate,
}

impl Expectation {
    /// Validates the arguments of `kind` and builds the expectation.
    ///
    /// Column existence is not checked here; that needs a schema snapshot and
    /// is the builder's job.
    pub fn new(kind: ExpectationKind) -> Result<Self> {
        kind.validate_arguments()?;
        Ok(Self {
            check_name: kind.check_name(),
            predicate: kind.predicate(),
            kind,
        })
    }

    pub fn check_name(&self) -> &str {
        &self.check_name
    }

    pub fn kind(&self) -> &ExpectationKind {
        &self.kind
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    /// Renders the boolean expression fragment for `dialect`, e.g.
    /// ``IF(COUNTIF(`id` IS NULL) = 0, TRUE, FALSE)``.
    pub fn boolean_expression(&self, dialect: Dialect) -> Result<String> {
        QueryRenderer::new(dialect).render_predicate(&self.predicate)
    }
}
