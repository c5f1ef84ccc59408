//! Raw filter and ordering clauses with their parameters.

use oxide_contrib_core::fragment::{join_sql, normalize_sort, normalize_where};
use oxide_contrib_core::{DialectId, Params, ToSqlValue};

/// A caller-written `where` clause, `order by` clause and the values for
/// their `@name` placeholders.
///
/// Either clause may omit its keyword. Values belong in the parameters,
/// never in the clause text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    /// Raw filter.
    pub where_sql: String,
    /// Raw ordering.
    pub sort_by: String,
    /// Placeholder values.
    pub params: Params,
}

impl Filter {
    /// Creates an empty filter matching every row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a filter from a `where` clause.
    #[must_use]
    pub fn with_where(where_sql: &str) -> Self {
        Self::new().and_where(where_sql)
    }

    /// Sets the `where` clause.
    #[must_use]
    pub fn and_where(mut self, where_sql: &str) -> Self {
        self.where_sql = where_sql.to_string();
        self
    }

    /// Sets the `order by` clause.
    #[must_use]
    pub fn sort(mut self, sort_by: &str) -> Self {
        self.sort_by = sort_by.to_string();
        self
    }

    /// Binds a placeholder value.
    #[must_use]
    pub fn param<V: ToSqlValue>(mut self, name: &str, value: V) -> Self {
        self.params.insert(name, value);
        self
    }

    /// Renders `SELECT * FROM <table> <where> <order by>`.
    pub(crate) fn select_sql(&self, table: &str) -> String {
        join_sql(&[
            "SELECT * FROM",
            table,
            &normalize_where(&self.where_sql),
            &normalize_sort(&self.sort_by),
        ])
    }

    /// Like [`Filter::select_sql`], bounded to the first row for `dialect`.
    ///
    /// Dialects without a known row limit get the unbounded statement.
    pub(crate) fn select_first_sql(&self, dialect: &DialectId, table: &str) -> String {
        let where_sql = normalize_where(&self.where_sql);
        let sort_by = normalize_sort(&self.sort_by);
        match dialect {
            DialectId::SqlServer | DialectId::SqlCe => {
                join_sql(&["SELECT TOP 1 * FROM", table, &where_sql, &sort_by])
            }
            DialectId::Firebird => {
                join_sql(&["SELECT FIRST 1 * FROM", table, &where_sql, &sort_by])
            }
            DialectId::MySql | DialectId::Sqlite | DialectId::Postgres => {
                join_sql(&["SELECT * FROM", table, &where_sql, &sort_by, "LIMIT 1"])
            }
            DialectId::Unknown(_) => self.select_sql(table),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_sql() {
        assert_eq!(Filter::new().select_sql("users"), "SELECT * FROM users");
        assert_eq!(
            Filter::with_where("age > @age")
                .sort("name")
                .param("age", 18)
                .select_sql("users"),
            "SELECT * FROM users where age > @age order by name"
        );
    }

    #[test]
    fn test_select_first_sql() {
        let filter = Filter::with_where("age > @age").sort("name");
        assert_eq!(
            filter.select_first_sql(&DialectId::SqlServer, "users"),
            "SELECT TOP 1 * FROM users where age > @age order by name"
        );
        assert_eq!(
            filter.select_first_sql(&DialectId::Sqlite, "users"),
            "SELECT * FROM users where age > @age order by name LIMIT 1"
        );
        assert_eq!(
            filter.select_first_sql(&DialectId::MySql, "users"),
            "SELECT * FROM users where age > @age order by name LIMIT 1"
        );
        assert_eq!(
            filter.select_first_sql(&DialectId::Firebird, "users"),
            "SELECT FIRST 1 * FROM users where age > @age order by name"
        );
        assert_eq!(
            filter.select_first_sql(&DialectId::from_name("odbc"), "users"),
            "SELECT * FROM users where age > @age order by name"
        );
    }
}
