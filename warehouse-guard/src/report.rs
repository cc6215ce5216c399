//! The tidy report returned by [`CheckBuilder::run`](crate::builder::CheckBuilder::run).

use crate::columnar::{bool_column, date_column, string_column, string_value};
use crate::error::{GuardError, Result};
use crate::expectation::Expectation;
use crate::sql::render::{CHECK_DATE_COLUMN, CHECK_NAME_COLUMN, PASS_FAIL_COLUMN, RESULT_COLUMN};
use crate::table::TableRef;
use arrow::array::Array;
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::warn;

/// Outcome of one expectation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    pub check_name: String,
    pub result: bool,
    /// Date the warehouse evaluated the check on.
    pub check_date: NaiveDate,
    /// Status glyph, derived from `result` by the query itself.
    pub pass_fail: String,
}

/// Pass/fail counts of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
}

impl ReportSummary {
    /// Percentage of passing checks; 100 for an empty report.
    pub fn pass_rate(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            self.passed as f64 / self.total as f64 * 100.0
        }
    }
}

impl fmt::Display for ReportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} checks: {} passed, {} failed",
            self.total, self.passed, self.failed
        )
    }
}

/// One row per registered expectation, in registration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckReport {
    table: TableRef,
    rows: Vec<ReportRow>,
    /// The query that produced the rows.
    sql: String,
}

impl CheckReport {
    pub fn new(table: TableRef, rows: Vec<ReportRow>, sql: impl Into<String>) -> Self {
        Self {
            table,
            rows,
            sql: sql.into(),
        }
    }

    /// Decodes the warehouse's answer to the check query.
    ///
    /// Rows are matched to `expectations` by check name and returned in
    /// registration order, whatever order the warehouse produced them in.
    ///
    /// # Errors
    ///
    /// [`GuardError::UnexpectedResultShape`] when a report column is missing
    /// or can't be cast, a row names an unknown check or repeats one, a date
    /// is NULL, or the row count differs from the number of expectations.
    pub fn from_batches(
        table: TableRef,
        sql: String,
        batches: &[RecordBatch],
        expectations: &[Expectation],
    ) -> Result<Self> {
        let positions: HashMap<&str, usize> = expectations
            .iter()
            .enumerate()
            .map(|(i, e)| (e.check_name(), i))
            .collect();
        let mut slots: Vec<Option<ReportRow>> = vec![None; expectations.len()];
        let mut seen = 0usize;

        for batch in batches.iter().filter(|b| b.num_rows() > 0) {
            let names = string_column(batch, CHECK_NAME_COLUMN)?;
            let results = bool_column(batch, RESULT_COLUMN)?;
            let dates = date_column(batch, CHECK_DATE_COLUMN)?;
            let glyphs = string_column(batch, PASS_FAIL_COLUMN)?;

            for row in 0..batch.num_rows() {
                seen += 1;
                let check_name = string_value(&names, row).ok_or_else(|| {
                    GuardError::UnexpectedResultShape("NULL check name".to_string())
                })?;
                let position = *positions.get(check_name.as_str()).ok_or_else(|| {
                    GuardError::UnexpectedResultShape(format!("unknown check '{check_name}'"))
                })?;
                if slots[position].is_some() {
                    return Err(GuardError::UnexpectedResultShape(format!(
                        "check '{check_name}' reported more than once"
                    )));
                }

                let result = if results.is_valid(row) {
                    results.value(row)
                } else {
                    warn!(check_name = %check_name, "NULL result, counting the check as failed");
                    false
                };
                let check_date = dates
                    .is_valid(row)
                    .then(|| dates.value_as_date(row))
                    .flatten()
                    .ok_or_else(|| {
                        GuardError::UnexpectedResultShape(format!(
                            "missing check date for '{check_name}'"
                        ))
                    })?;

                slots[position] = Some(ReportRow {
                    check_name,
                    result,
                    check_date,
                    pass_fail: string_value(&glyphs, row).unwrap_or_default(),
                });
            }
        }

        if seen != expectations.len() {
            return Err(GuardError::UnexpectedResultShape(format!(
                "expected {} rows, got {seen}",
                expectations.len()
            )));
        }
        let rows = slots.into_iter().collect::<Option<Vec<_>>>().ok_or_else(|| {
            GuardError::UnexpectedResultShape("a registered check is missing from the result".to_string())
        })?;

        Ok(Self::new(table, rows, sql))
    }

    pub fn table(&self) -> &TableRef {
        &self.table
    }

    pub fn rows(&self) -> &[ReportRow] {
        &self.rows
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn passed(&self) -> impl Iterator<Item = &ReportRow> {
        self.rows.iter().filter(|r| r.result)
    }

    pub fn failed(&self) -> impl Iterator<Item = &ReportRow> {
        self.rows.iter().filter(|r| !r.result)
    }

    pub fn all_passed(&self) -> bool {
        self.rows.iter().all(|r| r.result)
    }

    pub fn summary(&self) -> ReportSummary {
        let passed = self.passed().count();
        ReportSummary {
            total: self.rows.len(),
            passed,
            failed: self.rows.len() - passed,
        }
    }

    /// Looks up the row of one check.
    pub fn get(&self, check_name: &str) -> Option<&ReportRow> {
        self.rows.iter().find(|r| r.check_name == check_name)
    }

    pub fn into_rows(self) -> Vec<ReportRow> {
        self.rows
    }
}
