//! SQL dialect support.
//!
//! The dialect of a connection decides identifier quoting, which paging
//! syntax is emitted, and whether the staged bulk path is available. It is
//! resolved once at the connection boundary into a closed [`DialectId`], and
//! every decision downstream is an exhaustive `match` on it.

use std::fmt;

use crate::error::{CoreError, Result};

/// The database product a connection talks to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DialectId {
    /// Microsoft SQL Server.
    SqlServer,
    /// MySQL and MariaDB.
    MySql,
    /// SQLite.
    Sqlite,
    /// SQL Server Compact Edition.
    SqlCe,
    /// PostgreSQL.
    Postgres,
    /// Firebird.
    Firebird,
    /// A driver that could not be identified; carries its name.
    Unknown(String),
}

/// How a bounded page is expressed in SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagingStyle {
    /// `ORDER BY ... OFFSET n ROWS FETCH NEXT m ROWS ONLY`, with a 1-based
    /// page index.
    OffsetFetch,
    /// MySQL `LIMIT offset, size`, offset computed as `index * size`.
    LimitComma,
    /// SQLite `LIMIT size OFFSET offset`, offset computed as `index * size`.
    LimitOffset,
}

impl DialectId {
    /// Resolves a driver or product name.
    ///
    /// Accepts connection type names such as `SqlConnection` as well as short
    /// names such as `mssql` or `postgresql`, ignoring case. Anything else
    /// becomes [`DialectId::Unknown`].
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "sqlconnection" | "sqlserver" | "mssql" => Self::SqlServer,
            "mysqlconnection" | "mysql" | "mariadb" => Self::MySql,
            "sqliteconnection" | "sqlite" | "sqlite3" => Self::Sqlite,
            "sqlceconnection" | "sqlce" => Self::SqlCe,
            "npgsqlconnection" | "postgres" | "postgresql" => Self::Postgres,
            "fbconnection" | "firebird" => Self::Firebird,
            _ => Self::Unknown(name.to_string()),
        }
    }

    /// Returns the name of the dialect.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::SqlServer => "sqlserver",
            Self::MySql => "mysql",
            Self::Sqlite => "sqlite",
            Self::SqlCe => "sqlce",
            Self::Postgres => "postgres",
            Self::Firebird => "firebird",
            Self::Unknown(name) => name,
        }
    }

    /// Quotes a column name for assignment and predicate fragments.
    #[must_use]
    pub fn quote_identifier(&self, name: &str) -> String {
        match self {
            Self::SqlServer | Self::SqlCe => format!("[{name}]"),
            Self::MySql => format!("`{name}`"),
            Self::Sqlite | Self::Postgres => format!("\"{name}\""),
            Self::Firebird | Self::Unknown(_) => name.to_string(),
        }
    }

    /// Returns the paging strategy for this dialect.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnsupportedDialect`] for dialects without a
    /// paging implementation.
    pub fn paging_style(&self) -> Result<PagingStyle> {
        match self {
            Self::SqlServer => Ok(PagingStyle::OffsetFetch),
            Self::MySql => Ok(PagingStyle::LimitComma),
            Self::Sqlite => Ok(PagingStyle::LimitOffset),
            Self::SqlCe | Self::Postgres | Self::Firebird | Self::Unknown(_) => Err(self.unsupported()),
        }
    }

    /// Checks that the dialect offers session temp tables and a native bulk
    /// copy, which the staged bulk operations rely on.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnsupportedDialect`] for anything but SQL Server.
    pub fn ensure_bulk_staging(&self) -> Result<()> {
        match self {
            Self::SqlServer => Ok(()),
            Self::MySql
            | Self::Sqlite
            | Self::SqlCe
            | Self::Postgres
            | Self::Firebird
            | Self::Unknown(_) => Err(self.unsupported()),
        }
    }

    fn unsupported(&self) -> CoreError {
        CoreError::UnsupportedDialect(self.name().to_string())
    }
}

impl fmt::Display for DialectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_connection_type_names() {
        assert_eq!(DialectId::from_name("SqlConnection"), DialectId::SqlServer);
        assert_eq!(DialectId::from_name("MySqlConnection"), DialectId::MySql);
        assert_eq!(DialectId::from_name("SqliteConnection"), DialectId::Sqlite);
        assert_eq!(DialectId::from_name("SqlCeConnection"), DialectId::SqlCe);
        assert_eq!(DialectId::from_name("NpgsqlConnection"), DialectId::Postgres);
        assert_eq!(DialectId::from_name("FbConnection"), DialectId::Firebird);
    }

    #[test]
    fn test_from_short_names() {
        assert_eq!(DialectId::from_name("mssql"), DialectId::SqlServer);
        assert_eq!(DialectId::from_name(" PostgreSQL "), DialectId::Postgres);
        assert_eq!(
            DialectId::from_name("OracleConnection"),
            DialectId::Unknown(String::from("OracleConnection"))
        );
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(DialectId::SqlServer.quote_identifier("Name"), "[Name]");
        assert_eq!(DialectId::MySql.quote_identifier("Name"), "`Name`");
        assert_eq!(DialectId::Sqlite.quote_identifier("Name"), "\"Name\"");
        assert_eq!(DialectId::Firebird.quote_identifier("Name"), "Name");
    }

    #[test]
    fn test_paging_support() {
        assert_eq!(
            DialectId::SqlServer.paging_style().unwrap(),
            PagingStyle::OffsetFetch
        );
        assert_eq!(DialectId::MySql.paging_style().unwrap(), PagingStyle::LimitComma);
        assert_eq!(DialectId::Sqlite.paging_style().unwrap(), PagingStyle::LimitOffset);
        for dialect in [
            DialectId::SqlCe,
            DialectId::Postgres,
            DialectId::Firebird,
            DialectId::Unknown(String::from("odbc")),
        ] {
            assert_eq!(
                dialect.paging_style().unwrap_err(),
                CoreError::UnsupportedDialect(dialect.name().to_string())
            );
        }
    }

    #[test]
    fn test_unknown_dialect_error_names_driver() {
        let err = DialectId::from_name("OdbcConnection")
            .paging_style()
            .unwrap_err();
        assert_eq!(err.to_string(), "dialect 'OdbcConnection' is not supported for this operation");
    }

    #[test]
    fn test_bulk_staging_is_sql_server_only() {
        assert!(DialectId::SqlServer.ensure_bulk_staging().is_ok());
        assert!(DialectId::Sqlite.ensure_bulk_staging().is_err());
        assert!(DialectId::MySql.ensure_bulk_staging().is_err());
    }
}
