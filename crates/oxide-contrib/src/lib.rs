//! # oxide-contrib
//!
//! CRUD, pagination and staged bulk operations for structs mapped with
//! `#[derive(Entity)]`, executed on a caller-supplied [`Session`].
//!
//! - [`Repository`] offers get / get_all / insert / update / delete, paging
//!   and bulk operations for one entity type
//! - [`paginate`] runs the count-then-page protocol for any table
//! - [`StagingCoordinator`] runs staged bulk update and filtered fetch
//!   through a session temp table, dropping it on every completed path
//! - [`Tracked`] carries an explicit dirty flag so unchanged entities are
//!   not written back
//!
//! SQL generation lives in `oxide-contrib-core` and is re-exported here.
//!
//! ## Example
//!
//! ```ignore
//! use oxide_contrib::{Entity, EntityExt, Filter, PageRequest};
//! use sqlx::sqlite::SqlitePoolOptions;
//!
//! #[derive(Debug, Clone, Entity)]
//! #[table(name = "pub_Country")]
//! struct Country {
//!     #[column(explicit_key, name = "CountryId")]
//!     id: i64,
//!     #[column(name = "CnName")]
//!     name: String,
//! }
//!
//! let pool = SqlitePoolOptions::new().connect("sqlite::memory:").await?;
//! let mut conn = pool.acquire().await?;
//!
//! let repo = Country::repository();
//! let page = repo
//!     .page(&mut *conn, &PageRequest::new(5, 1).filter("CountryId>@id").param("id", 0))
//!     .await?;
//! println!("{} of {} countries", page.rows.len(), page.total_count);
//! ```

pub mod config;
pub mod error;
pub mod filter;
pub mod pager;
pub mod repository;
pub mod session;
pub mod staging;
pub mod tracked;

pub use config::ContribConfig;
pub use error::{ContribError, Result};
pub use filter::Filter;
pub use pager::paginate;
pub use repository::{EntityExt, Repository, UpdateOptions};
pub use session::Session;
pub use staging::StagingCoordinator;
pub use tracked::Tracked;

pub use oxide_contrib_core::{
    CoreError, DialectId, Entity, PageRequest, PageResult, Params, Row, RowBatch, SqlValue,
    TableDescriptor, ToSqlValue,
};
pub use oxide_contrib_derive::Entity;
