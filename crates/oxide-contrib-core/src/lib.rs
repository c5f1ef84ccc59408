//! # oxide-contrib-core
//!
//! Dialect-aware SQL generation for CRUD, pagination and staged bulk
//! operations.
//!
//! This crate does no I/O. It turns table metadata and raw caller clauses
//! into SQL text plus named parameters:
//! - A fragment builder normalizing `where` / `order by` text
//! - A pager producing the count statement and a bounded page statement per
//!   dialect, with clamping against the row count
//! - Staging plans for bulk update and bulk filtered fetch through a session
//!   temp table
//!
//! ## Paging
//!
//! ```rust
//! use oxide_contrib_core::{DialectId, PageQuery, PageRequest, TableDescriptor};
//!
//! let table = TableDescriptor::new("pub_Country")
//!     .explicit_key("CountryId")
//!     .column("CnName");
//!
//! let request = PageRequest::new(5, 2)
//!     .filter("CountryId>@id")
//!     .param("id", 10);
//! let query = PageQuery::new(&table, &request).unwrap();
//!
//! let style = DialectId::Sqlite.paging_style().unwrap();
//! let window = query.window(style, 23);
//! let sql = query.page_sql(style, &window).unwrap();
//!
//! assert_eq!(
//!     sql,
//!     "SELECT * FROM pub_Country where CountryId>@id order by CountryId LIMIT 5 OFFSET 10"
//! );
//! ```
//!
//! ## Parameters
//!
//! Statements refer to values as `@name`. Values are never interpolated:
//!
//! ```rust
//! use oxide_contrib_core::{bind_named, Params, SqlValue};
//!
//! let params = Params::new().with("id", 7);
//! let (sql, values) = bind_named("DELETE FROM users WHERE id = @id", &params).unwrap();
//!
//! assert_eq!(sql, "DELETE FROM users WHERE id = ?");
//! assert_eq!(values, vec![SqlValue::Int(7)]);
//! ```

pub mod dialect;
pub mod error;
pub mod fragment;
pub mod pager;
pub mod params;
pub mod row;
pub mod schema;
pub mod staging;
pub mod value;

pub use dialect::{DialectId, PagingStyle};
pub use error::{CoreError, Result};
pub use pager::{PageQuery, PageRequest, PageResult, PageWindow};
pub use params::{bind_named, Params};
pub use row::{Row, RowBatch};
pub use schema::{Entity, TableDescriptor};
pub use staging::{StagingJob, DEFAULT_STAGING_PREFIX};
pub use value::{dedup_values, FromSqlValue, SqlValue, ToSqlValue};
