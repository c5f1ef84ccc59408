//! Result rows and bulk-load batches.

use crate::error::{CoreError, Result};
use crate::params::Params;
use crate::value::{FromSqlValue, SqlValue};

/// One result row as an ordered `column -> value` record.
///
/// Column lookup ignores ASCII case, matching how SQL Server and SQLite
/// resolve column names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<SqlValue>,
}

impl Row {
    /// Creates an empty row.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            columns: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Creates an empty row with room for `n` columns.
    #[must_use]
    pub fn with_capacity(n: usize) -> Self {
        Self {
            columns: Vec::with_capacity(n),
            values: Vec::with_capacity(n),
        }
    }

    /// Appends a column.
    pub fn push(&mut self, column: impl Into<String>, value: SqlValue) {
        self.columns.push(column.into());
        self.values.push(value);
    }

    /// Appends a column and returns the row, for chaining.
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: SqlValue) -> Self {
        self.push(column, value);
        self
    }

    /// Returns the value of `column`, if present.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(column))
            .map(|i| &self.values[i])
    }

    /// Returns the value at a column position.
    #[must_use]
    pub fn value_at(&self, index: usize) -> Option<&SqlValue> {
        self.values.get(index)
    }

    /// Reads `column` as `T`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ColumnNotFound`] when the column is absent and
    /// [`CoreError::TypeMismatch`] when its value does not convert.
    pub fn get_as<T: FromSqlValue>(&self, column: &str) -> Result<T> {
        let value = self
            .get(column)
            .ok_or_else(|| CoreError::ColumnNotFound(column.to_string()))?;
        T::from_sql_value(value).ok_or_else(|| CoreError::TypeMismatch {
            column: column.to_string(),
            expected: std::any::type_name::<T>(),
            found: value.clone(),
        })
    }

    /// Returns the column names in order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Iterates over `(column, value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    /// Returns the number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns whether the row has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Rows handed to a native bulk-copy path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowBatch {
    /// Destination column names, in value order.
    pub columns: Vec<String>,
    /// One value vector per row, aligned with `columns`.
    pub rows: Vec<Vec<SqlValue>>,
    /// Whether supplied identity values must be kept instead of generated.
    pub keep_identity: bool,
}

impl RowBatch {
    /// Creates an empty batch over `columns`.
    #[must_use]
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
            keep_identity: false,
        }
    }

    /// Sets whether identity values are kept.
    #[must_use]
    pub const fn keep_identity(mut self, keep: bool) -> Self {
        self.keep_identity = keep;
        self
    }

    /// Appends one row built from a parameter mapping, in column order.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidEntity`] when the mapping lacks a column.
    pub fn push_params(&mut self, params: &Params) -> Result<()> {
        let row = self
            .columns
            .iter()
            .map(|column| {
                params.get(column).cloned().ok_or_else(|| {
                    CoreError::InvalidEntity(format!("no value for column '{column}'"))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        self.rows.push(row);
        Ok(())
    }

    /// Appends a single-value row.
    pub fn push_value(&mut self, value: SqlValue) {
        self.rows.push(vec![value]);
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns whether the batch has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_lookup_ignores_case() {
        let row = Row::new().with("CountryId", SqlValue::Int(3));
        assert_eq!(row.get("countryid"), Some(&SqlValue::Int(3)));
        assert_eq!(row.get_as::<i64>("COUNTRYID").unwrap(), 3);
    }

    #[test]
    fn test_row_get_as_errors() {
        let row = Row::new().with("name", SqlValue::Int(1));
        assert_eq!(
            row.get_as::<i64>("missing").unwrap_err(),
            CoreError::ColumnNotFound(String::from("missing"))
        );
        assert!(matches!(
            row.get_as::<String>("name").unwrap_err(),
            CoreError::TypeMismatch { column, .. } if column == "name"
        ));
    }

    #[test]
    fn test_batch_push_params_follows_column_order() {
        let mut batch = RowBatch::new(vec!["id".into(), "name".into()]);
        batch
            .push_params(&Params::new().with("name", "x").with("id", 1_i64))
            .unwrap();
        assert_eq!(
            batch.rows,
            vec![vec![SqlValue::Int(1), SqlValue::Text("x".into())]]
        );
    }

    #[test]
    fn test_batch_push_params_missing_column() {
        let mut batch = RowBatch::new(vec!["id".into()]);
        let err = batch.push_params(&Params::new()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidEntity(_)));
        assert!(batch.is_empty());
    }
}
