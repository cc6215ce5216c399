//! Prelude for commonly used types and traits in warehouse-guard.

pub use crate::builder::{BuilderState, CheckBuilder};
pub use crate::config::CheckConfig;
pub use crate::error::{GuardError, Result};
pub use crate::expectation::{Expectation, ExpectationKind, NumericBound};
pub use crate::formatters::{
    FormatterConfig, HumanFormatter, JsonFormatter, MarkdownFormatter, ReportFormatter,
};
pub use crate::logging::LogConfig;
pub use crate::report::{CheckReport, ReportRow, ReportSummary};
pub use crate::schema::{ColumnMetadata, SchemaCatalog};
pub use crate::sql::Dialect;
pub use crate::table::{PathStyle, TableRef};
pub use crate::warehouse::{DataFusionWarehouse, PollingWarehouse, Warehouse};
