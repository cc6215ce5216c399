//! Report formatting for [`CheckReport`]s.
//!
//! Three formatters ship with the crate: JSON for programs, a console table
//! for humans, and Markdown for pull requests and documentation.
//!
//! # Examples
//!
//! ```rust
//! use warehouse_guard::formatters::{HumanFormatter, ReportFormatter};
//! use warehouse_guard::report::{CheckReport, ReportRow};
//! use warehouse_guard::table::TableRef;
//!
//! let report = CheckReport::new(
//!     TableRef::new("p", "d", "t"),
//!     vec![ReportRow {
//!         check_name: "expect_id_value_to_not_be_null".to_string(),
//!         result: true,
//!         check_date: chrono::NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
//!         pass_fail: "🟢".to_string(),
//!     }],
//!     "SELECT ...",
//! );
//! let output = HumanFormatter::new().format(&report).unwrap();
//! assert!(output.contains("expect_id_value_to_not_be_null"));
//! ```

use crate::error::{GuardError, Result};
use crate::report::{CheckReport, ReportRow, ReportSummary};
use serde::Serialize;
use std::fmt::{self, Write};

/// Configuration options for formatting reports.
#[derive(Debug, Clone)]
pub struct FormatterConfig {
    /// Whether to use ANSI colors (human formatter only)
    pub use_colors: bool,
    /// Include the compiled check query
    pub include_sql: bool,
    /// Include the check date of each row
    pub include_date: bool,
    /// Maximum number of rows to show; `None` shows all
    pub max_rows: Option<usize>,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            use_colors: true,
            include_sql: false,
            include_date: true,
            max_rows: None,
        }
    }
}

impl FormatterConfig {
    /// Summary and rows only.
    pub fn minimal() -> Self {
        Self {
            use_colors: false,
            include_sql: false,
            include_date: false,
            max_rows: None,
        }
    }

    /// Everything, including the query.
    pub fn detailed() -> Self {
        Self {
            use_colors: true,
            include_sql: true,
            include_date: true,
            max_rows: None,
        }
    }

    /// Creates a configuration suitable for CI/CD environments.
    pub fn ci() -> Self {
        Self {
            use_colors: false,
            include_sql: false,
            include_date: true,
            max_rows: Some(50), // Limit output in CI
        }
    }

    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    pub fn with_sql(mut self, include: bool) -> Self {
        self.include_sql = include;
        self
    }

    pub fn with_max_rows(mut self, max: usize) -> Self {
        self.max_rows = Some(max);
        self
    }

    fn visible_rows<'a>(&self, report: &'a CheckReport) -> &'a [ReportRow] {
        let rows = report.rows();
        match self.max_rows {
            Some(max) => &rows[..max.min(rows.len())],
            None => rows,
        }
    }
}

/// Turns a [`CheckReport`] into text.
///
/// # Examples
///
/// ```rust
/// use warehouse_guard::formatters::ReportFormatter;
/// use warehouse_guard::report::CheckReport;
///
/// struct OneLine;
///
/// impl ReportFormatter for OneLine {
///     fn format(&self, report: &CheckReport) -> warehouse_guard::error::Result<String> {
///         Ok(report.summary().to_string())
///     }
/// }
/// ```
pub trait ReportFormatter {
    fn format(&self, report: &CheckReport) -> Result<String>;

    /// Formats with explicit configuration. The default ignores `config`.
    fn format_with_config(&self, report: &CheckReport, _config: &FormatterConfig) -> Result<String> {
        self.format(report)
    }
}

fn format_error(e: fmt::Error) -> GuardError {
    GuardError::Internal(format!("Failed to format report: {e}"))
}

/// Formats reports as JSON.
#[derive(Debug, Clone)]
pub struct JsonFormatter {
    config: FormatterConfig,
    pretty: bool,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    table: String,
    all_passed: bool,
    summary: ReportSummary,
    checks: Vec<JsonRow<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sql: Option<&'a str>,
}

#[derive(Serialize)]
struct JsonRow<'a> {
    check_name: &'a str,
    result: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    check_date: Option<String>,
    pass_fail: &'a str,
}

impl JsonFormatter {
    /// Pretty-printed JSON with default configuration.
    pub fn new() -> Self {
        Self {
            config: FormatterConfig::default(),
            pretty: true,
        }
    }

    pub fn with_config(config: FormatterConfig) -> Self {
        Self {
            config,
            pretty: true,
        }
    }

    /// Sets whether to pretty-print.
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportFormatter for JsonFormatter {
    fn format(&self, report: &CheckReport) -> Result<String> {
        self.format_with_config(report, &self.config)
    }

    fn format_with_config(&self, report: &CheckReport, config: &FormatterConfig) -> Result<String> {
        let json = JsonReport {
            table: report.table().to_string(),
            all_passed: report.all_passed(),
            summary: report.summary(),
            checks: config
                .visible_rows(report)
                .iter()
                .map(|row| JsonRow {
                    check_name: &row.check_name,
                    result: row.result,
                    check_date: config.include_date.then(|| row.check_date.to_string()),
                    pass_fail: &row.pass_fail,
                })
                .collect(),
            sql: config.include_sql.then(|| report.sql()),
        };

        let serialized = if self.pretty {
            serde_json::to_string_pretty(&json)
        } else {
            serde_json::to_string(&json)
        };
        serialized
            .map_err(|e| GuardError::Serialization(format!("Failed to serialize report to JSON: {e}")))
    }
}

/// Formats reports as a console table.
#[derive(Debug, Clone)]
pub struct HumanFormatter {
    config: FormatterConfig,
}

impl HumanFormatter {
    pub fn new() -> Self {
        Self {
            config: FormatterConfig::default(),
        }
    }

    pub fn with_config(config: FormatterConfig) -> Self {
        Self { config }
    }

    fn write(report: &CheckReport, config: &FormatterConfig, output: &mut String) -> fmt::Result {
        let summary = report.summary();
        let (green, red, reset) = if config.use_colors {
            ("\x1b[32m", "\x1b[31m", "\x1b[0m")
        } else {
            ("", "", "")
        };

        writeln!(output)?;
        if report.all_passed() {
            writeln!(output, "{green}All checks PASSED{reset}")?;
        } else {
            writeln!(output, "{red}Checks FAILED{reset}")?;
        }
        writeln!(output)?;
        writeln!(output, "Table: {}", report.table())?;
        writeln!(
            output,
            "Checks: {} | Passed: {green}{}{reset} | Failed: {red}{}{reset} | Pass rate: {:.1}%",
            summary.total,
            summary.passed,
            summary.failed,
            summary.pass_rate()
        )?;
        writeln!(output)?;

        let rows = config.visible_rows(report);
        let name_width = rows
            .iter()
            .map(|r| r.check_name.chars().count())
            .chain(std::iter::once("check_name".len()))
            .max()
            .unwrap_or(0);

        write!(output, "  {:<name_width$}  result", "check_name")?;
        if config.include_date {
            write!(output, "  check_date")?;
        }
        writeln!(output, "  pass_fail")?;

        for row in rows {
            let color = if row.result { green } else { red };
            write!(
                output,
                "  {:<name_width$}  {color}{:<6}{reset}",
                row.check_name, row.result
            )?;
            if config.include_date {
                write!(output, "  {}", row.check_date)?;
            }
            writeln!(output, "  {}", row.pass_fail)?;
        }

        if report.len() > rows.len() {
            writeln!(output)?;
            writeln!(
                output,
                "  ... and {} more checks",
                report.len() - rows.len()
            )?;
        }

        if config.include_sql {
            writeln!(output)?;
            writeln!(output, "Query:")?;
            writeln!(output, "{}", report.sql())?;
        }

        writeln!(output)
    }
}

impl Default for HumanFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportFormatter for HumanFormatter {
    fn format(&self, report: &CheckReport) -> Result<String> {
        self.format_with_config(report, &self.config)
    }

    fn format_with_config(&self, report: &CheckReport, config: &FormatterConfig) -> Result<String> {
        let mut output = String::new();
        Self::write(report, config, &mut output).map_err(format_error)?;
        Ok(output)
    }
}

/// Formats reports as Markdown.
#[derive(Debug, Clone)]
pub struct MarkdownFormatter {
    config: FormatterConfig,
    heading_level: u8,
}

impl MarkdownFormatter {
    pub fn new() -> Self {
        Self {
            config: FormatterConfig::default(),
            heading_level: 2,
        }
    }

    pub fn with_config(config: FormatterConfig) -> Self {
        Self {
            config,
            heading_level: 2,
        }
    }

    /// Sets the heading level for the main heading, clamped to 1..=6.
    pub fn with_heading_level(mut self, level: u8) -> Self {
        self.heading_level = level.clamp(1, 6);
        self
    }

    fn write(&self, report: &CheckReport, config: &FormatterConfig, output: &mut String) -> fmt::Result {
        let h = "#".repeat(self.heading_level as usize);
        let summary = report.summary();

        if report.all_passed() {
            writeln!(output, "{h} Check Report - PASSED")?;
        } else {
            writeln!(output, "{h} Check Report - FAILED")?;
        }
        writeln!(output)?;
        writeln!(output, "**Table:** `{}`", report.table())?;
        writeln!(output)?;
        writeln!(output, "| Metric | Value |")?;
        writeln!(output, "|--------|-------|")?;
        writeln!(output, "| Total Checks | {} |", summary.total)?;
        writeln!(output, "| Passed | {} |", summary.passed)?;
        writeln!(output, "| Failed | {} |", summary.failed)?;
        writeln!(output, "| Pass Rate | {:.1}% |", summary.pass_rate())?;

        let rows = config.visible_rows(report);
        writeln!(output)?;
        writeln!(output, "{h}# Checks")?;
        writeln!(output)?;
        if config.include_date {
            writeln!(output, "| check_name | result | check_date | pass_fail |")?;
            writeln!(output, "|------------|--------|------------|-----------|")?;
        } else {
            writeln!(output, "| check_name | result | pass_fail |")?;
            writeln!(output, "|------------|--------|-----------|")?;
        }
        for row in rows {
            let name = row.check_name.replace('|', "\\|");
            if config.include_date {
                writeln!(
                    output,
                    "| `{name}` | {} | {} | {} |",
                    row.result, row.check_date, row.pass_fail
                )?;
            } else {
                writeln!(output, "| `{name}` | {} | {} |", row.result, row.pass_fail)?;
            }
        }

        if report.len() > rows.len() {
            writeln!(output)?;
            writeln!(
                output,
                "> **Note:** {} additional checks not shown in this report.",
                report.len() - rows.len()
            )?;
        }

        if config.include_sql {
            writeln!(output)?;
            writeln!(output, "{h}# Query")?;
            writeln!(output)?;
            writeln!(output, "```sql")?;
            writeln!(output, "{}", report.sql())?;
            writeln!(output, "```")?;
        }

        Ok(())
    }
}

impl Default for MarkdownFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportFormatter for MarkdownFormatter {
    fn format(&self, report: &CheckReport) -> Result<String> {
        self.format_with_config(report, &self.config)
    }

    fn format_with_config(&self, report: &CheckReport, config: &FormatterConfig) -> Result<String> {
        let mut output = String::new();
        self.write(report, config, &mut output).map_err(format_error)?;
        Ok(output)
    }
}
