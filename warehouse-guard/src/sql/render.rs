//! Rendering of predicates and the full check query.

use super::ast::{Aggregate, Operand, Predicate, RowCondition};
use super::dialect::Dialect;
use crate::config::{DEFAULT_FAIL_GLYPH, DEFAULT_PASS_GLYPH};
use crate::error::{GuardError, Result};
use crate::expectation::Expectation;
use crate::table::TableRef;

/// Column holding the check name in the report.
pub const CHECK_NAME_COLUMN: &str = "check_name";
/// Column holding the boolean outcome in the report.
pub const RESULT_COLUMN: &str = "result";
/// Column holding the execution date in the report.
pub const CHECK_DATE_COLUMN: &str = "check_date";
/// Column holding the status glyph in the report.
pub const PASS_FAIL_COLUMN: &str = "pass_fail";
/// Ordering column, only present in dialects without a native `UNPIVOT`.
pub const CHECK_ORDINAL_COLUMN: &str = "check_ordinal";

const UNPIVOT_ITEM: &str = "item";

/// Renders predicates and check queries for one dialect.
///
/// The wide row aliases every check positionally (`c0`, `c1`, ...); check
/// names only ever appear as escaped string literals.
///
/// # Examples
///
/// ```rust
/// use warehouse_guard::expectation::{Expectation, ExpectationKind};
/// use warehouse_guard::sql::{Dialect, QueryRenderer};
/// use warehouse_guard::table::TableRef;
///
/// let not_null = Expectation::new(ExpectationKind::NotNull { column: "id".into() }).unwrap();
/// let sql = QueryRenderer::new(Dialect::BigQuery)
///     .render_check_query(&TableRef::new("p", "d", "t"), &[not_null])
///     .unwrap();
/// assert!(sql.contains("IF(COUNTIF(`id` IS NULL) = 0, TRUE, FALSE) AS c0"));
/// assert!(sql.contains("UNPIVOT(result FOR check_name IN (c0 AS 'expect_id_value_to_not_be_null'))"));
/// ```
#[derive(Debug, Clone)]
pub struct QueryRenderer {
    dialect: Dialect,
    pass_glyph: String,
    fail_glyph: String,
}

impl QueryRenderer {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            pass_glyph: DEFAULT_PASS_GLYPH.to_string(),
            fail_glyph: DEFAULT_FAIL_GLYPH.to_string(),
        }
    }

    /// Sets the glyphs emitted in the `pass_fail` column.
    pub fn with_glyphs(mut self, pass: impl Into<String>, fail: impl Into<String>) -> Self {
        self.pass_glyph = pass.into();
        self.fail_glyph = fail.into();
        self
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn render_condition(&self, condition: &RowCondition) -> Result<String> {
        let d = self.dialect;
        Ok(match condition {
            RowCondition::IsNull(column) => format!("{} IS NULL", d.quote_identifier(column)?),
            RowCondition::IsNotNull(column) => {
                format!("{} IS NOT NULL", d.quote_identifier(column)?)
            }
            RowCondition::MatchesRegex { column, pattern } => d.regex_contains(
                &d.cast_to_text(&d.quote_identifier(column)?),
                &d.string_literal(pattern),
            ),
            RowCondition::Not(inner) => format!("NOT ({})", self.render_condition(inner)?),
            RowCondition::And(left, right) => format!(
                "({}) AND ({})",
                self.render_condition(left)?,
                self.render_condition(right)?
            ),
        })
    }

    pub fn render_aggregate(&self, aggregate: &Aggregate) -> Result<String> {
        let d = self.dialect;
        Ok(match aggregate {
            Aggregate::CountIf(condition) => d.count_if(&self.render_condition(condition)?),
            Aggregate::Count(column) => format!("COUNT({})", d.quote_identifier(column)?),
            Aggregate::CountDistinct(column) => {
                format!("COUNT(DISTINCT {})", d.quote_identifier(column)?)
            }
            Aggregate::CountRows => "COUNT(*)".to_string(),
            Aggregate::Avg(column) => format!("AVG({})", d.quote_identifier(column)?),
        })
    }

    /// Renders a predicate as a non-null boolean expression.
    ///
    /// The comparison is wrapped in a conditional so an aggregate that comes
    /// back NULL (the mean of an empty column) reads as a failure, not NULL.
    pub fn render_predicate(&self, predicate: &Predicate) -> Result<String> {
        let comparison = match predicate {
            Predicate::Equals(left, right) => {
                let right = match right {
                    Operand::Aggregate(agg) => self.render_aggregate(agg)?,
                    Operand::Integer(v) => v.to_string(),
                };
                format!("{} = {right}", self.render_aggregate(left)?)
            }
            Predicate::Between { value, low, high } => {
                format!("{} BETWEEN {low} AND {high}", self.render_aggregate(value)?)
            }
        };
        Ok(self.dialect.if_else(&comparison, "TRUE", "FALSE"))
    }

    /// Renders the complete check query: one aggregate row over the whole
    /// table, unpivoted to one `(check_name, result, check_date, pass_fail)`
    /// row per expectation.
    pub fn render_check_query(
        &self,
        table: &TableRef,
        expectations: &[Expectation],
    ) -> Result<String> {
        if expectations.is_empty() {
            return Err(GuardError::NoExpectationsRegistered {
                table: table.to_string(),
            });
        }

        let columns = expectations
            .iter()
            .enumerate()
            .map(|(i, e)| {
                Ok(format!(
                    "    {} AS {}",
                    self.render_predicate(e.predicate())?,
                    column_alias(i)
                ))
            })
            .collect::<Result<Vec<_>>>()?
            .join(",\n");
        let table_path = self.dialect.table_path(table)?;
        let pass = self.dialect.string_literal(&self.pass_glyph);
        let fail = self.dialect.string_literal(&self.fail_glyph);

        match self.dialect {
            Dialect::BigQuery => {
                let unpivot = expectations
                    .iter()
                    .enumerate()
                    .map(|(i, e)| {
                        format!(
                            "{} AS {}",
                            column_alias(i),
                            self.dialect.string_literal(e.check_name())
                        )
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                Ok(format!(
                    "SELECT\n  {CHECK_NAME_COLUMN},\n  {RESULT_COLUMN},\n  {} AS {CHECK_DATE_COLUMN},\n  {} AS {PASS_FAIL_COLUMN}\nFROM (\n  SELECT\n{columns}\n  FROM {table_path}\n)\nUNPIVOT({RESULT_COLUMN} FOR {CHECK_NAME_COLUMN} IN ({unpivot}))",
                    self.dialect.current_date(),
                    self.dialect.if_else(RESULT_COLUMN, &pass, &fail),
                ))
            }
            Dialect::DataFusion => {
                // No UNPIVOT: fold the wide row into an array of structs and
                // unnest it, so the table is still scanned once.
                let items = expectations
                    .iter()
                    .enumerate()
                    .map(|(i, e)| {
                        format!(
                            "      named_struct('{CHECK_ORDINAL_COLUMN}', {i}, '{CHECK_NAME_COLUMN}', {}, '{RESULT_COLUMN}', {})",
                            self.dialect.string_literal(e.check_name()),
                            column_alias(i),
                        )
                    })
                    .collect::<Vec<_>>()
                    .join(",\n");
                let field = |name: &str| format!("get_field({UNPIVOT_ITEM}, '{name}')");
                Ok(format!(
                    "SELECT\n  {} AS {CHECK_ORDINAL_COLUMN},\n  {} AS {CHECK_NAME_COLUMN},\n  {} AS {RESULT_COLUMN},\n  {} AS {CHECK_DATE_COLUMN},\n  {} AS {PASS_FAIL_COLUMN}\nFROM (\n  SELECT unnest(make_array(\n{items}\n  )) AS {UNPIVOT_ITEM}\n  FROM (\n  SELECT\n{columns}\n  FROM {table_path}\n  ) AS checks\n) AS unpivoted\nORDER BY {CHECK_ORDINAL_COLUMN}",
                    field(CHECK_ORDINAL_COLUMN),
                    field(CHECK_NAME_COLUMN),
                    field(RESULT_COLUMN),
                    self.dialect.current_date(),
                    self.dialect.if_else(&field(RESULT_COLUMN), &pass, &fail),
                ))
            }
        }
    }
}

fn column_alias(index: usize) -> String {
    format!("c{index}")
}
