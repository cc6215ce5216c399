//! Table references.

use crate::error::{GuardError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a fully qualified table path is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathStyle {
    /// `` `project.dataset.table` ``
    Standard,
    /// `project:dataset.table`
    Legacy,
}

/// Identifies one table: project (or catalog), dataset (or schema) and table name.
///
/// # Examples
///
/// ```rust
/// use warehouse_guard::table::{PathStyle, TableRef};
///
/// let table = TableRef::new("acme", "sales", "orders");
/// assert_eq!(table.path(PathStyle::Standard, ""), "`acme.sales.orders`");
/// assert_eq!(table.path(PathStyle::Legacy, "20240101"), "acme:sales.orders_20240101");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableRef {
    project: String,
    dataset: String,
    table: String,
}

impl TableRef {
    /// Creates a table reference.
    pub fn new(
        project: impl Into<String>,
        dataset: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            dataset: dataset.into(),
            table: table.into(),
        }
    }

    /// The project (catalog) the table lives in.
    pub fn project(&self) -> &str {
        &self.project
    }

    /// The dataset (schema) the table lives in.
    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    /// The bare table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Renders the table path in the requested style.
    ///
    /// A non-empty `suffix` is joined with `_`; a suffix that is exactly `_` is
    /// appended unchanged, which is how date-sharded table prefixes are named.
    pub fn path(&self, style: PathStyle, suffix: &str) -> String {
        let suffix = match suffix {
            "" => String::new(),
            "_" => "_".to_string(),
            other => format!("_{other}"),
        };
        match style {
            PathStyle::Standard => format!(
                "`{}.{}.{}{suffix}`",
                self.project, self.dataset, self.table
            ),
            PathStyle::Legacy => format!(
                "{}:{}.{}{suffix}",
                self.project, self.dataset, self.table
            ),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.project, self.dataset, self.table)
    }
}

impl FromStr for TableRef {
    type Err = GuardError;

    /// Parses `project.dataset.table`.
    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split('.').collect();
        match parts.as_slice() {
            [project, dataset, table]
                if !project.is_empty() && !dataset.is_empty() && !table.is_empty() =>
            {
                Ok(Self::new(*project, *dataset, *table))
            }
            _ => Err(GuardError::invalid_argument(
                "table",
                format!("expected 'project.dataset.table', got '{s}'"),
            )),
        }
    }
}
