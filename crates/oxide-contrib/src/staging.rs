//! Staged bulk operations.
//!
//! Each run is strictly sequential on one session:
//!
//! 1. drop a temp table leaked by an earlier, cancelled run
//! 2. create the temp table with the target's shape
//! 3. bulk-load the payload into it
//! 4. join it back to the target (UPDATE or SELECT)
//! 5. drop it
//!
//! Step 5 runs whenever steps 2-4 complete, successfully or not. A cancelled
//! run (its future dropped mid-way) cannot run step 5; step 1 of the next run
//! on the same session reclaims the table instead.

use std::time::Duration;

use oxide_contrib_core::{
    dedup_values, Params, Row, RowBatch, SqlValue, StagingJob, TableDescriptor,
    DEFAULT_STAGING_PREFIX,
};
use tracing::{debug, info, warn};

use crate::config::ContribConfig;
use crate::error::Result;
use crate::filter::Filter;
use crate::session::Session;

/// Runs staged bulk operations with a fixed temp table prefix and timeout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingCoordinator {
    prefix: String,
    timeout: Option<Duration>,
}

impl Default for StagingCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl StagingCoordinator {
    /// Creates a coordinator with the default prefix and no timeout.
    #[must_use]
    pub fn new() -> Self {
        Self {
            prefix: DEFAULT_STAGING_PREFIX.to_string(),
            timeout: None,
        }
    }

    /// Creates a coordinator from shared settings.
    #[must_use]
    pub fn from_config(config: &ContribConfig) -> Self {
        Self {
            prefix: config.staging_prefix.clone(),
            timeout: config.command_timeout(),
        }
    }

    /// Sets the temp table prefix.
    #[must_use]
    pub fn prefix(mut self, prefix: &str) -> Self {
        self.prefix = prefix.to_string();
        self
    }

    /// Sets the per-statement timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Updates existing `table` rows from `rows`, matched on the identity
    /// columns.
    ///
    /// `columns` restricts the assigned columns; `None` assigns every
    /// updatable column. Returns the number of rows the UPDATE affected.
    ///
    /// # Errors
    ///
    /// `UnsupportedDialect` for sessions without temp tables and native
    /// bulk copy, raised before any SQL is issued. Plan errors
    /// (`MissingKey`, `UnknownColumn`, `EmptyUpdate`, `InvalidEntity`) are
    /// also raised before any SQL. Database errors from any step propagate
    /// after the temp table is dropped.
    pub async fn bulk_update<S: Session>(
        &self,
        session: &mut S,
        table: &TableDescriptor,
        rows: &[Params],
        columns: Option<&[&str]>,
    ) -> Result<u64> {
        session.dialect().ensure_bulk_staging()?;
        let job = StagingJob::for_update(table, columns, &self.prefix)?;

        let mut batch = RowBatch::new(job.payload_columns().to_vec()).keep_identity(true);
        for params in rows {
            batch.push_params(params)?;
        }
        if batch.is_empty() {
            debug!(table = table.name(), "Nothing to bulk update");
            return Ok(0);
        }

        info!(
            table = table.name(),
            temp_table = job.temp_table(),
            rows = batch.len(),
            "Staging bulk update"
        );
        let outcome = async {
            self.stage(session, &job, batch).await?;
            session
                .execute(&job.update_sql(), &Params::new(), self.timeout)
                .await
        }
        .await;
        self.finish(session, &job, outcome).await
    }

    /// Fetches the `table` rows whose `column` holds one of `values`.
    ///
    /// Values are de-duplicated before staging, so each matching row is
    /// returned once. The filter further restricts and orders the joined
    /// rows; refer to target columns through the `T` alias.
    ///
    /// # Errors
    ///
    /// Same as [`StagingCoordinator::bulk_update`], with `UnknownColumn` when
    /// `column` is not mapped.
    pub async fn fetch_by_values<S: Session>(
        &self,
        session: &mut S,
        table: &TableDescriptor,
        column: &str,
        values: Vec<SqlValue>,
        filter: &Filter,
    ) -> Result<Vec<Row>> {
        session.dialect().ensure_bulk_staging()?;
        let job = StagingJob::for_filter(table, column, &self.prefix)?;

        let values = dedup_values(values);
        if values.is_empty() {
            debug!(table = table.name(), "No filter values to stage");
            return Ok(Vec::new());
        }

        let mut batch = RowBatch::new(job.payload_columns().to_vec()).keep_identity(true);
        for value in values {
            batch.push_value(value);
        }

        info!(
            table = table.name(),
            column = %job.join_columns().join(","),
            values = batch.len(),
            "Staging filtered fetch"
        );
        let sql = job.filter_select_sql(&filter.where_sql, &filter.sort_by);
        let outcome = async {
            self.stage(session, &job, batch).await?;
            session.query(&sql, &filter.params, self.timeout).await
        }
        .await;
        self.finish(session, &job, outcome).await
    }

    /// Bulk-copies `rows` straight into `table`.
    ///
    /// Database-generated keys and computed columns are not loaded. Returns
    /// the number of rows handed to the bulk copy.
    ///
    /// # Errors
    ///
    /// `UnsupportedDialect` before any I/O on sessions without native bulk
    /// copy, `InvalidEntity` when a row lacks an insert column.
    pub async fn bulk_insert<S: Session>(
        &self,
        session: &mut S,
        table: &TableDescriptor,
        rows: &[Params],
    ) -> Result<u64> {
        session.dialect().ensure_bulk_staging()?;

        let columns = table.insert_columns().into_iter().map(String::from).collect();
        let mut batch = RowBatch::new(columns);
        for params in rows {
            batch.push_params(params)?;
        }
        if batch.is_empty() {
            return Ok(0);
        }

        let count = batch.len() as u64;
        info!(table = table.name(), rows = count, "Bulk inserting");
        session.bulk_copy(table.name(), batch, self.timeout).await?;
        Ok(count)
    }

    async fn stage<S: Session>(
        &self,
        session: &mut S,
        job: &StagingJob,
        batch: RowBatch,
    ) -> Result<()> {
        let none = Params::new();
        session
            .execute(&job.drop_if_exists_sql(), &none, self.timeout)
            .await?;
        session.execute(&job.create_sql(), &none, self.timeout).await?;
        session
            .bulk_copy(job.temp_table(), batch, self.timeout)
            .await
    }

    async fn finish<S: Session, T>(
        &self,
        session: &mut S,
        job: &StagingJob,
        outcome: Result<T>,
    ) -> Result<T> {
        let dropped = session
            .execute(&job.drop_sql(), &Params::new(), self.timeout)
            .await;
        match (outcome, dropped) {
            (Ok(value), Ok(_)) => Ok(value),
            (Ok(_), Err(err)) | (Err(err), Ok(_)) => Err(err),
            (Err(err), Err(drop_err)) => {
                warn!(
                    temp_table = job.temp_table(),
                    error = %drop_err,
                    "Failed to drop staging table"
                );
                Err(err)
            }
        }
    }
}

