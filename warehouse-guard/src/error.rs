//! Error types for warehouse-guard.
//!
//! Every fallible operation in the crate returns [`GuardError`] through the
//! [`Result`] alias. Validation errors surface at the `expect_*` call that
//! caused them; warehouse errors surface from `run` without retry.

use thiserror::Error;

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// The main error type for warehouse-guard.
#[derive(Error, Debug)]
pub enum GuardError {
    /// Column metadata for the target table could not be retrieved, or the
    /// table has no columns.
    #[error("Schema unavailable for table '{table}': {message}")]
    SchemaUnavailable {
        /// Fully qualified table name
        table: String,
        /// Detailed error message
        message: String,
        /// Optional underlying error
        #[source]
        source: Option<BoxedSource>,
    },

    /// An expectation referenced a column that is not in the schema snapshot.
    #[error("Column '{column}' not found in table '{table}'")]
    UnknownColumn { column: String, table: String },

    /// An expectation argument was rejected.
    #[error("Invalid argument '{argument}': {message}")]
    InvalidArgument { argument: String, message: String },

    /// `run` was called before any expectation was registered.
    #[error("No expectations registered for table '{table}'")]
    NoExpectationsRegistered { table: String },

    /// Two expectations produced the same check name.
    #[error("Check '{check_name}' is already registered")]
    DuplicateCheckName { check_name: String },

    /// The warehouse rejected or failed the submitted query.
    #[error("Warehouse query failed: {message}")]
    WarehouseQueryFailed {
        /// The warehouse's diagnostic, verbatim
        message: String,
        /// Optional underlying error
        #[source]
        source: Option<BoxedSource>,
    },

    /// The warehouse answered, but not with the report shape we asked for.
    #[error("Unexpected result shape: {0}")]
    UnexpectedResultShape(String),

    /// A polled job did not finish within the configured timeout.
    #[error("Query job '{job_id}' timed out after {elapsed_ms}ms")]
    QueryTimedOut { job_id: String, elapsed_ms: u128 },

    /// A polled job was abandoned because the caller cancelled the wait.
    #[error("Query job '{job_id}' was cancelled")]
    QueryCancelled { job_id: String },

    /// Error from DataFusion operations.
    #[error("DataFusion error: {0}")]
    DataFusion(#[from] datafusion::error::DataFusionError),

    /// Error from Arrow operations.
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Error from serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic internal error for unexpected conditions.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A type alias for `Result<T, GuardError>`.
pub type Result<T> = std::result::Result<T, GuardError>;

impl GuardError {
    /// Creates a schema-unavailable error without an underlying source.
    pub fn schema_unavailable(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SchemaUnavailable {
            table: table.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Creates a schema-unavailable error wrapping the error that caused it.
    pub fn schema_unavailable_with_source(
        table: impl Into<String>,
        message: impl Into<String>,
        source: BoxedSource,
    ) -> Self {
        Self::SchemaUnavailable {
            table: table.into(),
            message: message.into(),
            source: Some(source),
        }
    }

    /// Creates an unknown-column error.
    pub fn unknown_column(column: impl Into<String>, table: impl Into<String>) -> Self {
        Self::UnknownColumn {
            column: column.into(),
            table: table.into(),
        }
    }

    /// Creates an invalid-argument error.
    pub fn invalid_argument(argument: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            argument: argument.into(),
            message: message.into(),
        }
    }

    /// Creates a warehouse failure carrying the collaborator's message.
    pub fn warehouse_query_failed(message: impl Into<String>) -> Self {
        Self::WarehouseQueryFailed {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a warehouse failure from the collaborator's own error value.
    pub fn warehouse_query_failed_with_source(source: BoxedSource) -> Self {
        Self::WarehouseQueryFailed {
            message: source.to_string(),
            source: Some(source),
        }
    }
}

impl From<std::convert::Infallible> for GuardError {
    fn from(never: std::convert::Infallible) -> Self {
        match never {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_unknown_column_message() {
        let err = GuardError::unknown_column("user_id", "proj.ds.users");
        assert_eq!(
            err.to_string(),
            "Column 'user_id' not found in table 'proj.ds.users'"
        );
    }

    #[test]
    fn test_warehouse_failure_keeps_diagnostic_verbatim() {
        let source = std::io::Error::new(std::io::ErrorKind::Other, "Syntax error at [3:7]");
        let err = GuardError::warehouse_query_failed_with_source(Box::new(source));
        assert_eq!(err.to_string(), "Warehouse query failed: Syntax error at [3:7]");
        assert!(err.source().is_some());
    }

    #[test]
    fn test_schema_unavailable_with_source() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "no such dataset");
        let err = GuardError::schema_unavailable_with_source(
            "proj.ds.t",
            "metadata query failed",
            Box::new(source),
        );
        assert!(err.to_string().contains("proj.ds.t"));
        assert!(err.source().is_some());
    }
}
