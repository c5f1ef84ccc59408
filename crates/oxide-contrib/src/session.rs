//! The database capability consumed by every operation.
//!
//! A [`Session`] is one live connection (or a transaction on it): it knows
//! its dialect and runs statements with `@name` parameters. Operations never
//! open, commit or roll back anything themselves; they borrow the session for
//! the duration of one call.

use std::future::Future;
use std::time::Duration;

use oxide_contrib_core::{bind_named, CoreError, DialectId, Params, Row, RowBatch, SqlValue};
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Column, Row as _, Sqlite, SqliteConnection, TypeInfo, ValueRef};
use tracing::debug;

use crate::error::{ContribError, Result};

/// A connection-scoped executor.
///
/// Implement this for a driver to make it usable with repositories, the
/// pager and the staging coordinator. The SQLite implementation over sqlx
/// ships with this crate.
#[allow(async_fn_in_trait)]
pub trait Session {
    /// Returns the dialect of the connection.
    fn dialect(&self) -> DialectId;

    /// Runs a statement and returns the number of affected rows.
    async fn execute(
        &mut self,
        sql: &str,
        params: &Params,
        timeout: Option<Duration>,
    ) -> Result<u64>;

    /// Runs a query and returns its rows.
    async fn query(
        &mut self,
        sql: &str,
        params: &Params,
        timeout: Option<Duration>,
    ) -> Result<Vec<Row>>;

    /// Loads rows into `destination` through the driver's native bulk path.
    ///
    /// The default implementation reports the dialect as unsupported.
    async fn bulk_copy(
        &mut self,
        destination: &str,
        batch: RowBatch,
        timeout: Option<Duration>,
    ) -> Result<()> {
        let _ = (destination, batch, timeout);
        Err(CoreError::UnsupportedDialect(self.dialect().name().to_string()).into())
    }
}

impl Session for SqliteConnection {
    fn dialect(&self) -> DialectId {
        DialectId::Sqlite
    }

    async fn execute(
        &mut self,
        sql: &str,
        params: &Params,
        timeout: Option<Duration>,
    ) -> Result<u64> {
        let (sql, values) = bind_named(sql, params)?;
        debug!(sql = %sql, params = values.len(), "Executing SQL");

        let mut query = sqlx::query(&sql);
        for value in values {
            query = bind_param(query, value);
        }
        let result = with_timeout(timeout, async { Ok(query.execute(&mut *self).await?) }).await?;
        Ok(result.rows_affected())
    }

    async fn query(
        &mut self,
        sql: &str,
        params: &Params,
        timeout: Option<Duration>,
    ) -> Result<Vec<Row>> {
        let (sql, values) = bind_named(sql, params)?;
        debug!(sql = %sql, params = values.len(), "Executing query");

        let mut query = sqlx::query(&sql);
        for value in values {
            query = bind_param(query, value);
        }
        let rows = with_timeout(timeout, async { Ok(query.fetch_all(&mut *self).await?) }).await?;
        rows.iter().map(decode_row).collect()
    }
}

/// Applies an optional timeout to one statement.
pub(crate) async fn with_timeout<T, F>(timeout: Option<Duration>, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match timeout {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| ContribError::Timeout(limit))?,
        None => fut.await,
    }
}

/// Binds a SqlValue parameter to a raw query.
fn bind_param<'q>(
    query: sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>,
    value: SqlValue,
) -> sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        SqlValue::Null => query.bind(Option::<i64>::None),
        SqlValue::Bool(b) => query.bind(b),
        SqlValue::Int(i) => query.bind(i),
        SqlValue::Float(f) => query.bind(f),
        SqlValue::Text(s) => query.bind(s),
        SqlValue::Blob(b) => query.bind(b),
    }
}

/// Converts a SQLite row by the storage class of each value.
fn decode_row(row: &SqliteRow) -> Result<Row> {
    let mut out = Row::with_capacity(row.len());
    for (i, column) in row.columns().iter().enumerate() {
        let raw = row.try_get_raw(i)?;
        let value = if raw.is_null() {
            SqlValue::Null
        } else {
            match raw.type_info().name() {
                "INTEGER" | "BOOLEAN" => SqlValue::Int(row.try_get_unchecked(i)?),
                "REAL" => SqlValue::Float(row.try_get_unchecked(i)?),
                "BLOB" => SqlValue::Blob(row.try_get_unchecked(i)?),
                _ => SqlValue::Text(row.try_get_unchecked(i)?),
            }
        };
        out.push(column.name(), value);
    }
    Ok(out)
}
