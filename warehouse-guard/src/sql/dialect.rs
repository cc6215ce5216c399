//! SQL dialects.

use crate::error::Result;
use crate::security::SqlSecurity;
use crate::table::TableRef;
use serde::{Deserialize, Serialize};

/// The SQL dialect a warehouse speaks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// GoogleSQL, as accepted by BigQuery.
    #[default]
    BigQuery,
    /// Apache DataFusion's SQL.
    DataFusion,
}

impl Dialect {
    /// Quotes a column or table-part identifier.
    pub fn quote_identifier(&self, identifier: &str) -> Result<String> {
        match self {
            Self::BigQuery => SqlSecurity::quote_backtick(identifier),
            Self::DataFusion => SqlSecurity::quote_double(identifier),
        }
    }

    /// Renders a string literal.
    pub fn string_literal(&self, value: &str) -> String {
        match self {
            Self::BigQuery => SqlSecurity::backslash_literal(value),
            Self::DataFusion => SqlSecurity::doubled_quote_literal(value),
        }
    }

    /// Renders the fully qualified path of `table`, each part quoted.
    pub fn table_path(&self, table: &TableRef) -> Result<String> {
        Ok(format!(
            "{}.{}.{}",
            self.quote_identifier(table.project())?,
            self.quote_identifier(table.dataset())?,
            self.quote_identifier(table.table())?
        ))
    }

    pub fn cast_to_text(&self, expr: &str) -> String {
        match self {
            Self::BigQuery => format!("CAST({expr} AS STRING)"),
            Self::DataFusion => format!("CAST({expr} AS VARCHAR)"),
        }
    }

    /// Renders a partial-match regex test; `pattern` is an already rendered literal.
    pub fn regex_contains(&self, text: &str, pattern: &str) -> String {
        match self {
            Self::BigQuery => format!("REGEXP_CONTAINS({text}, {pattern})"),
            Self::DataFusion => format!("regexp_like({text}, {pattern})"),
        }
    }

    /// Counts rows where `condition` is true. Yields 0, never NULL, on an empty table.
    pub fn count_if(&self, condition: &str) -> String {
        match self {
            Self::BigQuery => format!("COUNTIF({condition})"),
            Self::DataFusion => format!("COUNT(CASE WHEN {condition} THEN 1 END)"),
        }
    }

    /// Two-way conditional. A NULL condition takes the `otherwise` branch.
    pub fn if_else(&self, condition: &str, then: &str, otherwise: &str) -> String {
        match self {
            Self::BigQuery => format!("IF({condition}, {then}, {otherwise})"),
            Self::DataFusion => format!("CASE WHEN {condition} THEN {then} ELSE {otherwise} END"),
        }
    }

    pub fn current_date(&self) -> &'static str {
        match self {
            Self::BigQuery => "CURRENT_DATE()",
            Self::DataFusion => "current_date()",
        }
    }

    /// Renders the column-metadata query for `table`.
    ///
    /// Both variants return `column_name`, `data_type`, `is_partitioning_column`
    /// and `clustering_ordinal_position`, in ordinal order.
    pub fn schema_query(&self, table: &TableRef) -> Result<String> {
        let table_name = self.string_literal(table.table());
        Ok(match self {
            Self::BigQuery => format!(
                "SELECT\n  column_name,\n  data_type,\n  is_partitioning_column,\n  clustering_ordinal_position\nFROM {}.{}.INFORMATION_SCHEMA.COLUMNS\nWHERE table_name = {table_name}\nORDER BY ordinal_position",
                self.quote_identifier(table.project())?,
                self.quote_identifier(table.dataset())?,
            ),
            Self::DataFusion => format!(
                "SELECT\n  column_name,\n  data_type,\n  'NO' AS is_partitioning_column,\n  CAST(NULL AS BIGINT) AS clustering_ordinal_position\nFROM information_schema.columns\nWHERE table_catalog = {}\n  AND table_schema = {}\n  AND table_name = {table_name}\nORDER BY ordinal_position",
                self.string_literal(table.project()),
                self.string_literal(table.dataset()),
            ),
        })
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BigQuery => write!(f, "bigquery"),
            Self::DataFusion => write!(f, "datafusion"),
        }
    }
}
