#![allow(dead_code)]

use std::collections::VecDeque;
use std::time::Duration;

use oxide_contrib::{ContribError, DialectId, Params, Result, Row, RowBatch, Session};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

/// Something the recording session was asked to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Execute(String, Params),
    Query(String, Params),
    BulkCopy(String, RowBatch),
}

/// A session double that records every call and can inject failures.
pub struct RecordingSession {
    pub dialect: DialectId,
    pub calls: Vec<Call>,
    pub query_results: VecDeque<Vec<Row>>,
    pub affected: u64,
    pub fail_on: Vec<String>,
    pub fail_bulk_copy: bool,
}

impl RecordingSession {
    pub fn new(dialect: DialectId) -> Self {
        Self {
            dialect,
            calls: Vec::new(),
            query_results: VecDeque::new(),
            affected: 1,
            fail_on: Vec::new(),
            fail_bulk_copy: false,
        }
    }

    pub fn sql_server() -> Self {
        Self::new(DialectId::SqlServer)
    }

    /// Fails every statement starting with `prefix`.
    pub fn failing_on(mut self, prefix: &str) -> Self {
        self.fail_on.push(prefix.to_string());
        self
    }

    pub fn with_query_result(mut self, rows: Vec<Row>) -> Self {
        self.query_results.push_back(rows);
        self
    }

    /// Returns the SQL of every statement and query, in order.
    pub fn statements(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Execute(sql, _) | Call::Query(sql, _) => Some(sql.as_str()),
                Call::BulkCopy(..) => None,
            })
            .collect()
    }

    pub fn bulk_copies(&self) -> Vec<(&str, &RowBatch)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::BulkCopy(destination, batch) => Some((destination.as_str(), batch)),
                _ => None,
            })
            .collect()
    }

    fn check(&self, sql: &str) -> Result<()> {
        if self.fail_on.iter().any(|prefix| sql.starts_with(prefix.as_str())) {
            return Err(ContribError::Database(sqlx::Error::Protocol(format!(
                "injected failure on: {sql}"
            ))));
        }
        Ok(())
    }
}

impl Session for RecordingSession {
    fn dialect(&self) -> DialectId {
        self.dialect.clone()
    }

    async fn execute(
        &mut self,
        sql: &str,
        params: &Params,
        _timeout: Option<Duration>,
    ) -> Result<u64> {
        self.calls.push(Call::Execute(sql.to_string(), params.clone()));
        self.check(sql)?;
        Ok(self.affected)
    }

    async fn query(
        &mut self,
        sql: &str,
        params: &Params,
        _timeout: Option<Duration>,
    ) -> Result<Vec<Row>> {
        self.calls.push(Call::Query(sql.to_string(), params.clone()));
        self.check(sql)?;
        Ok(self.query_results.pop_front().unwrap_or_default())
    }

    async fn bulk_copy(
        &mut self,
        destination: &str,
        batch: RowBatch,
        _timeout: Option<Duration>,
    ) -> Result<()> {
        self.calls
            .push(Call::BulkCopy(destination.to_string(), batch));
        if self.fail_bulk_copy {
            return Err(ContribError::Database(sqlx::Error::Protocol(String::from(
                "injected bulk copy failure",
            ))));
        }
        Ok(())
    }
}

/// Creates a single-connection in-memory SQLite pool.
pub async fn memory_pool() -> SqlitePool {
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect(":memory:")
        .await
        .unwrap()
}
