//! Dialect-aware pagination.
//!
//! Paging is a two-statement protocol: a row count under the filter, then a
//! bounded page whose position is clamped against that count. This module
//! builds both statements and does the window arithmetic; running them is
//! left to the caller.
//!
//! # Offsets per dialect
//!
//! SQL Server pages are 1-based: page `i` starts at `(i - 1) * size`. MySQL
//! and SQLite start page `i` at `i * size`. The asymmetry is long-standing
//! behavior that callers depend on, so it is kept as is.
//!
//! ```rust
//! use oxide_contrib_core::dialect::PagingStyle;
//! use oxide_contrib_core::pager::{PageQuery, PageRequest};
//! use oxide_contrib_core::schema::TableDescriptor;
//!
//! let table = TableDescriptor::new("pub_Country").explicit_key("CountryId");
//! let query = PageQuery::new(&table, &PageRequest::new(5, 9)).unwrap();
//! let window = query.window(PagingStyle::OffsetFetch, 23);
//!
//! assert_eq!(window.page_index, 5);
//! assert_eq!(window.offset, 20);
//! assert_eq!(window.take, 3);
//! ```

use crate::dialect::PagingStyle;
use crate::error::{CoreError, Result};
use crate::fragment::{join_sql, normalize_sort, normalize_where};
use crate::params::Params;
use crate::schema::TableDescriptor;
use crate::value::ToSqlValue;

/// A request for one page of rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageRequest {
    /// Rows per page. Zero disables clamping.
    pub page_size: u32,
    /// Requested page. Values below 1 are treated as 0.
    pub page_index: i64,
    /// Raw filter, with or without the `where` keyword.
    pub where_sql: String,
    /// Raw ordering, with or without `order by`.
    pub sort_by: String,
    /// Values for the `@name` placeholders in the filter.
    pub params: Params,
}

impl PageRequest {
    /// Creates a request for page `page_index` of size `page_size`.
    #[must_use]
    pub fn new(page_size: u32, page_index: i64) -> Self {
        Self {
            page_size,
            page_index,
            ..Self::default()
        }
    }

    /// Sets the filter.
    #[must_use]
    pub fn filter(mut self, where_sql: &str) -> Self {
        self.where_sql = where_sql.to_string();
        self
    }

    /// Sets the ordering.
    #[must_use]
    pub fn sort(mut self, sort_by: &str) -> Self {
        self.sort_by = sort_by.to_string();
        self
    }

    /// Binds a filter parameter.
    #[must_use]
    pub fn param<V: ToSqlValue>(mut self, name: &str, value: V) -> Self {
        self.params.insert(name, value);
        self
    }

    /// Replaces all filter parameters.
    #[must_use]
    pub fn params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }
}

/// One page of rows plus the total row count under the filter.
#[derive(Debug, Clone, PartialEq)]
pub struct PageResult<T> {
    /// Rows of the page, at most `page_size` of them when `page_size > 0`.
    pub rows: Vec<T>,
    /// Rows matching the filter across all pages.
    pub total_count: i64,
    /// The page index actually served, after clamping.
    pub page_index: i64,
    /// Rows per page as requested.
    pub page_size: u32,
}

impl<T> PageResult<T> {
    /// Creates a result with no rows.
    #[must_use]
    pub const fn empty(total_count: i64, page_index: i64, page_size: u32) -> Self {
        Self {
            rows: Vec::new(),
            total_count,
            page_index,
            page_size,
        }
    }

    /// Returns the number of pages, or 0 when the page size is 0.
    #[must_use]
    pub fn total_pages(&self) -> i64 {
        total_pages(self.total_count, i64::from(self.page_size))
    }

    /// Converts every row, keeping the paging information.
    ///
    /// # Errors
    ///
    /// Returns the first conversion error.
    pub fn try_map<U, E, F>(self, f: F) -> std::result::Result<PageResult<U>, E>
    where
        F: FnMut(T) -> std::result::Result<U, E>,
    {
        Ok(PageResult {
            rows: self.rows.into_iter().map(f).collect::<std::result::Result<_, _>>()?,
            total_count: self.total_count,
            page_index: self.page_index,
            page_size: self.page_size,
        })
    }
}

/// Where a page falls once the total row count is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// Page index after clamping to the last page.
    pub page_index: i64,
    /// `ceil(total / size)`, or 0 when the size is 0.
    pub total_pages: i64,
    /// First row of the page, 0-based. Negative for SQL Server page 0.
    pub offset: i64,
    /// `min(size, total - offset)`, never negative.
    pub take: i64,
}

/// A page request resolved against a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    table: String,
    where_clause: String,
    sort_clause: String,
    page_size: u32,
    page_index: i64,
}

impl PageQuery {
    /// Normalizes the request's clauses and resolves the default sort.
    ///
    /// With no sort given, the page is ordered by the table's single identity
    /// column.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::AmbiguousSort`] when no sort is given and the
    /// table has zero or several identity columns.
    pub fn new(table: &TableDescriptor, request: &PageRequest) -> Result<Self> {
        let mut sort_clause = normalize_sort(&request.sort_by);
        if sort_clause.is_empty() {
            let identity = table.identity_columns();
            let [key] = identity.as_slice() else {
                return Err(CoreError::AmbiguousSort {
                    table: table.name().to_string(),
                    identity_count: identity.len(),
                });
            };
            sort_clause = normalize_sort(key);
        }

        Ok(Self {
            table: table.name().to_string(),
            where_clause: normalize_where(&request.where_sql),
            sort_clause,
            page_size: request.page_size,
            page_index: request.page_index.max(0),
        })
    }

    /// Returns the normalized filter clause.
    #[must_use]
    pub fn where_clause(&self) -> &str {
        &self.where_clause
    }

    /// Returns the normalized sort clause.
    #[must_use]
    pub fn sort_clause(&self) -> &str {
        &self.sort_clause
    }

    /// Returns the page index after coercing values below 1 to 0.
    #[must_use]
    pub const fn page_index(&self) -> i64 {
        self.page_index
    }

    /// Returns the page size.
    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Builds the row-count statement.
    #[must_use]
    pub fn count_sql(&self) -> String {
        join_sql(&[
            "SELECT COUNT(1) AS recordCount FROM",
            &self.table,
            &self.where_clause,
        ])
    }

    /// Computes the page window for `total` matching rows.
    ///
    /// A page index past the last page is clamped to the last page.
    #[must_use]
    pub fn window(&self, style: PagingStyle, total: i64) -> PageWindow {
        let size = i64::from(self.page_size);
        let total_pages = total_pages(total, size);
        let page_index = if size > 0 && self.page_index > total_pages {
            total_pages
        } else {
            self.page_index
        };

        let offset = match style {
            PagingStyle::OffsetFetch => (page_index - 1) * size,
            PagingStyle::LimitComma | PagingStyle::LimitOffset => page_index * size,
        };
        let take = size.min(total - offset).max(0);

        PageWindow {
            page_index,
            total_pages,
            offset,
            take,
        }
    }

    /// Builds the bounded page statement.
    ///
    /// Returns `None` when the window cannot hold any row and no statement
    /// needs to run: a SQL Server page index of 0, or a window past the end.
    #[must_use]
    pub fn page_sql(&self, style: PagingStyle, window: &PageWindow) -> Option<String> {
        let select = join_sql(&["SELECT * FROM", &self.table, &self.where_clause]);
        match style {
            PagingStyle::OffsetFetch => {
                if window.offset < 0 {
                    return None;
                }
                if self.page_size == 0 {
                    let bounds = format!("OFFSET {} ROWS", window.offset);
                    return Some(join_sql(&[&select, &self.sort_clause, &bounds]));
                }
                if window.take == 0 {
                    return None;
                }
                let bounds = format!(
                    "OFFSET {} ROWS FETCH NEXT {} ROWS ONLY",
                    window.offset, window.take
                );
                Some(join_sql(&[&select, &self.sort_clause, &bounds]))
            }
            PagingStyle::LimitComma => {
                let bounds = format!("LIMIT {}, {}", window.offset, self.page_size);
                Some(join_sql(&[&select, &self.sort_clause, &bounds]))
            }
            PagingStyle::LimitOffset => {
                let bounds = format!("LIMIT {} OFFSET {}", self.page_size, window.offset);
                Some(join_sql(&[&select, &self.sort_clause, &bounds]))
            }
        }
    }
}

fn total_pages(total: i64, size: i64) -> i64 {
    if size > 0 && total > 0 {
        total / size + i64::from(total % size != 0)
    } else {
        0
    }
}
