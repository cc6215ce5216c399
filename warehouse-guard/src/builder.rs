//! The check builder: accumulates expectations for one table and runs them
//! as a single query.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use warehouse_guard::prelude::*;
//!
//! # async fn example() -> Result<()> {
//! let warehouse = Arc::new(DataFusionWarehouse::new());
//! warehouse.register_csv("users", "data/users.csv").await?;
//! let table = warehouse.table_ref("users");
//!
//! let mut checks = CheckBuilder::new(warehouse, table).await?;
//! checks
//!     .expect_column_value_to_not_be_null("user_id")?
//!     .expect_column_values_to_be_unique("user_id")?
//!     .expect_column_value_mean_to_be_between("age", 18, 65)?
//!     .expect_column_values_to_match_regex("email", r"^[^@]+@[^@]+$")?
//!     .expect_table_row_count_to_be_between(1, 1_000_000)?;
//!
//! let report = checks.run().await?;
//! assert_eq!(report.len(), 5);
//! # Ok(())
//! # }
//! ```
//!
//! A `CheckBuilder` mutates in place and is not meant to be shared across
//! tasks without external synchronization.

use crate::config::CheckConfig;
use crate::error::{GuardError, Result};
use crate::expectation::{Expectation, ExpectationKind, NumericBound};
use crate::logging::{sql_level, truncate_field};
use crate::report::CheckReport;
use crate::schema::SchemaCatalog;
use crate::sql::QueryRenderer;
use crate::table::TableRef;
use crate::warehouse::Warehouse;
use std::sync::Arc;
use tracing::{debug, info, instrument, Level};

/// Lifecycle of a [`CheckBuilder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderState {
    /// No expectation registered yet.
    Empty,
    /// At least one expectation registered since the last compilation.
    Accumulating,
    /// The check query is compiled and cached.
    Ready,
    /// `run` completed at least once and nothing was registered since.
    Executed,
}

/// Accumulates expectations against one table and evaluates them with
/// exactly one warehouse query.
///
/// The schema snapshot is fetched once, when the builder is created. Every
/// `expect_*` call is validated against it immediately and never touches the
/// warehouse; a failed call leaves the builder unchanged.
#[derive(Debug)]
pub struct CheckBuilder {
    warehouse: Arc<dyn Warehouse>,
    catalog: SchemaCatalog,
    config: CheckConfig,
    expectations: Vec<Expectation>,
    compiled: Option<String>,
    state: BuilderState,
    runs: u64,
}

impl CheckBuilder {
    /// Fetches the schema of `table` and creates an empty builder.
    ///
    /// # Errors
    ///
    /// [`GuardError::SchemaUnavailable`] if the metadata query fails or finds
    /// no columns.
    pub async fn new(warehouse: Arc<dyn Warehouse>, table: TableRef) -> Result<Self> {
        Self::with_config(warehouse, table, CheckConfig::default()).await
    }

    /// Like [`CheckBuilder::new`], with custom configuration.
    #[instrument(skip(warehouse, config), fields(table = %table))]
    pub async fn with_config(
        warehouse: Arc<dyn Warehouse>,
        table: TableRef,
        config: CheckConfig,
    ) -> Result<Self> {
        let catalog = SchemaCatalog::fetch(warehouse.as_ref(), &table).await?;
        Ok(Self::from_catalog(warehouse, catalog, config))
    }

    /// Creates a builder over an already fetched schema snapshot.
    pub fn from_catalog(
        warehouse: Arc<dyn Warehouse>,
        catalog: SchemaCatalog,
        config: CheckConfig,
    ) -> Self {
        Self {
            warehouse,
            catalog,
            config,
            expectations: Vec::new(),
            compiled: None,
            state: BuilderState::Empty,
            runs: 0,
        }
    }

    /// Expects no NULL values in `column`.
    pub fn expect_column_value_to_not_be_null(&mut self, column: &str) -> Result<&mut Self> {
        self.register(ExpectationKind::NotNull {
            column: column.to_string(),
        })
    }

    /// Expects the mean of `column` to lie in `[low, high]`, bounds included.
    ///
    /// Bounds may be numbers, or strings and JSON values holding numbers. A
    /// bound that isn't numeric, isn't finite, or a range with `low > high`
    /// fails with [`GuardError::InvalidArgument`].
    pub fn expect_column_value_mean_to_be_between<L, H>(
        &mut self,
        column: &str,
        low: L,
        high: H,
    ) -> Result<&mut Self>
    where
        L: TryInto<NumericBound>,
        L::Error: Into<GuardError>,
        H: TryInto<NumericBound>,
        H::Error: Into<GuardError>,
    {
        self.require_column(column)?;
        let (low, high) = bounds(low, high)?;
        self.register(ExpectationKind::MeanBetween {
            column: column.to_string(),
            low,
            high,
        })
    }

    /// Expects every non-null value of `column` to be distinct.
    pub fn expect_column_values_to_be_unique(&mut self, column: &str) -> Result<&mut Self> {
        self.register(ExpectationKind::ValuesUnique {
            column: column.to_string(),
        })
    }

    /// Expects every non-null value of `column`, cast to text, to contain a
    /// match for `pattern`.
    pub fn expect_column_values_to_match_regex(
        &mut self,
        column: &str,
        pattern: &str,
    ) -> Result<&mut Self> {
        self.register(ExpectationKind::MatchesRegex {
            column: column.to_string(),
            pattern: pattern.to_string(),
        })
    }

    /// Expects no value of `column`, cast to text, to contain a match for `pattern`.
    pub fn expect_column_values_to_not_match_regex(
        &mut self,
        column: &str,
        pattern: &str,
    ) -> Result<&mut Self> {
        self.register(ExpectationKind::NotMatchesRegex {
            column: column.to_string(),
            pattern: pattern.to_string(),
        })
    }

    /// Expects the table's row count to lie in `[low, high]`, bounds included.
    pub fn expect_table_row_count_to_be_between<L, H>(&mut self, low: L, high: H) -> Result<&mut Self>
    where
        L: TryInto<NumericBound>,
        L::Error: Into<GuardError>,
        H: TryInto<NumericBound>,
        H::Error: Into<GuardError>,
    {
        let (low, high) = bounds(low, high)?;
        self.register(ExpectationKind::RowCountBetween { low, high })
    }

    /// Registers an expectation described as data.
    ///
    /// This is what the `expect_*` methods call; it is public so that
    /// expectations loaded from configuration go through the same checks.
    pub fn register(&mut self, kind: ExpectationKind) -> Result<&mut Self> {
        if let Some(column) = kind.column() {
            self.require_column(column)?;
        }
        let expectation = Expectation::new(kind)?;

        if self
            .expectations
            .iter()
            .any(|e| e.check_name() == expectation.check_name())
        {
            return Err(GuardError::DuplicateCheckName {
                check_name: expectation.check_name().to_string(),
            });
        }

        if self.config.log.log_expectations {
            debug!(
                table = %self.table(),
                check_name = expectation.check_name(),
                position = self.expectations.len(),
                "Registered expectation"
            );
        }

        self.expectations.push(expectation);
        self.compiled = None;
        self.state = BuilderState::Accumulating;
        Ok(self)
    }

    fn require_column(&self, column: &str) -> Result<()> {
        if self.catalog.column_exists(column) {
            Ok(())
        } else {
            Err(GuardError::unknown_column(column, self.table().to_string()))
        }
    }

    /// Compiles the check query without executing it.
    pub fn to_sql(&self) -> Result<String> {
        QueryRenderer::new(self.warehouse.dialect())
            .with_glyphs(&self.config.pass_glyph, &self.config.fail_glyph)
            .render_check_query(self.table(), &self.expectations)
    }

    /// Compiles and caches the check query, moving the builder to
    /// [`BuilderState::Ready`].
    ///
    /// Calling it again without registering anything is a no-op.
    ///
    /// # Errors
    ///
    /// [`GuardError::NoExpectationsRegistered`] on an empty builder.
    pub fn finalize(&mut self) -> Result<&mut Self> {
        match self.state {
            BuilderState::Empty => Err(GuardError::NoExpectationsRegistered {
                table: self.table().to_string(),
            }),
            BuilderState::Accumulating => {
                self.compiled = Some(self.to_sql()?);
                self.state = BuilderState::Ready;
                Ok(self)
            }
            BuilderState::Ready | BuilderState::Executed => Ok(self),
        }
    }

    /// Submits the compiled query once and decodes the report.
    ///
    /// Can be called repeatedly; each call re-executes the same query.
    ///
    /// # Errors
    ///
    /// - [`GuardError::NoExpectationsRegistered`] if nothing was registered.
    /// - [`GuardError::WarehouseQueryFailed`] with the warehouse's diagnostic.
    /// - [`GuardError::UnexpectedResultShape`] if the result doesn't hold one
    ///   row per registered expectation.
    #[instrument(skip(self), fields(table = %self.table(), expectations = self.expectations.len()))]
    pub async fn run(&mut self) -> Result<CheckReport> {
        self.finalize()?;
        let sql = match &self.compiled {
            Some(sql) => sql.clone(),
            None => self.to_sql()?,
        };

        for expectation in &self.expectations {
            info!("Checking {}", expectation.check_name());
        }
        if self.config.log.log_sql {
            let logged = truncate_field(&sql, self.config.log.max_field_length);
            if sql_level(self.config.debug) == Level::INFO {
                info!(sql = %logged, "Compiled check query");
            } else {
                debug!(sql = %logged, "Compiled check query");
            }
        }

        let batches = self.warehouse.run_query(&sql).await.map_err(|e| match e {
            e @ (GuardError::WarehouseQueryFailed { .. }
            | GuardError::QueryTimedOut { .. }
            | GuardError::QueryCancelled { .. }) => e,
            other => GuardError::warehouse_query_failed_with_source(Box::new(other)),
        })?;

        let report = CheckReport::from_batches(self.table().clone(), sql, &batches, &self.expectations)?;

        self.state = BuilderState::Executed;
        self.runs += 1;
        let summary = report.summary();
        info!(
            run = self.runs,
            passed = summary.passed,
            failed = summary.failed,
            "Checks completed"
        );
        Ok(report)
    }

    pub fn expectations(&self) -> &[Expectation] {
        &self.expectations
    }

    pub fn table(&self) -> &TableRef {
        self.catalog.table()
    }

    /// The schema snapshot taken when the builder was created.
    pub fn catalog(&self) -> &SchemaCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &CheckConfig {
        &self.config
    }

    pub fn state(&self) -> BuilderState {
        self.state
    }

    /// Number of completed runs.
    pub fn runs(&self) -> u64 {
        self.runs
    }

    pub fn len(&self) -> usize {
        self.expectations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expectations.is_empty()
    }
}

fn bounds<L, H>(low: L, high: H) -> Result<(NumericBound, NumericBound)>
where
    L: TryInto<NumericBound>,
    L::Error: Into<GuardError>,
    H: TryInto<NumericBound>,
    H::Error: Into<GuardError>,
{
    let low = low.try_into().map_err(Into::into)?;
    let high = high.try_into().map_err(Into::into)?;
    Ok((low, high))
}
