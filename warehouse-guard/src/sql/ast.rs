//! Typed predicate nodes.

use crate::expectation::NumericBound;
use serde::{Deserialize, Serialize};

/// A per-row condition, evaluated inside an aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RowCondition {
    IsNull(String),
    IsNotNull(String),
    /// The column, cast to text, contains a match for `pattern`.
    MatchesRegex { column: String, pattern: String },
    Not(Box<RowCondition>),
    And(Box<RowCondition>, Box<RowCondition>),
}

impl RowCondition {
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::Not(Box::new(self))
    }

    pub fn and(self, other: RowCondition) -> Self {
        Self::And(Box::new(self), Box::new(other))
    }

    fn collect_columns<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::IsNull(c) | Self::IsNotNull(c) | Self::MatchesRegex { column: c, .. } => {
                out.push(c)
            }
            Self::Not(inner) => inner.collect_columns(out),
            Self::And(left, right) => {
                left.collect_columns(out);
                right.collect_columns(out);
            }
        }
    }
}

/// A whole-table aggregate. Every expectation reduces to one of these, which
/// is what guarantees the check query yields exactly one row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Aggregate {
    /// Number of rows for which the condition is true.
    CountIf(RowCondition),
    /// Number of non-null values.
    Count(String),
    CountDistinct(String),
    /// `COUNT(*)`
    CountRows,
    Avg(String),
}

impl Aggregate {
    fn collect_columns<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::CountIf(condition) => condition.collect_columns(out),
            Self::Count(c) | Self::CountDistinct(c) | Self::Avg(c) => out.push(c),
            Self::CountRows => {}
        }
    }
}

/// Right-hand side of an equality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operand {
    Aggregate(Aggregate),
    Integer(i64),
}

/// A boolean over aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    Equals(Aggregate, Operand),
    /// Inclusive on both ends.
    Between {
        value: Aggregate,
        low: NumericBound,
        high: NumericBound,
    },
}

impl Predicate {
    /// Columns referenced anywhere in the predicate, in order of appearance,
    /// without duplicates.
    pub fn columns(&self) -> Vec<&str> {
        let mut out = Vec::new();
        match self {
            Self::Equals(left, right) => {
                left.collect_columns(&mut out);
                if let Operand::Aggregate(agg) = right {
                    agg.collect_columns(&mut out);
                }
            }
            Self::Between { value, .. } => value.collect_columns(&mut out),
        }
        let mut seen = std::collections::HashSet::new();
        out.retain(|c| seen.insert(*c));
        out
    }
}
