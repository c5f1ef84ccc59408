//! Runs the two-statement paging protocol against a session.

use std::time::Duration;

use oxide_contrib_core::{PageQuery, PageRequest, PageResult, Row, TableDescriptor};
use tracing::{debug, info};

use crate::error::{ContribError, Result};
use crate::session::Session;

/// Fetches one page of `table` rows.
///
/// The dialect is checked before anything is issued. The count statement
/// runs first; a zero count returns an empty page without a page statement,
/// and a page index past the end is clamped to the last page.
///
/// # Errors
///
/// - `UnsupportedDialect` when the session cannot page.
/// - `AmbiguousSort` when no sort is given and the table has no single
///   identity column.
/// - Any database error from either statement.
pub async fn paginate<S: Session>(
    session: &mut S,
    table: &TableDescriptor,
    request: &PageRequest,
    timeout: Option<Duration>,
) -> Result<PageResult<Row>> {
    let style = session.dialect().paging_style()?;
    let query = PageQuery::new(table, request)?;

    let counted = session
        .query(&query.count_sql(), &request.params, timeout)
        .await?;
    let total = read_count(&counted)?;
    if total == 0 {
        debug!(table = table.name(), "No rows to page");
        return Ok(PageResult::empty(0, query.page_index(), query.page_size()));
    }

    let window = query.window(style, total);
    if window.page_index != query.page_index() {
        info!(
            table = table.name(),
            requested = query.page_index(),
            served = window.page_index,
            "Page index clamped to last page"
        );
    }

    let rows = match query.page_sql(style, &window) {
        Some(sql) => session.query(&sql, &request.params, timeout).await?,
        None => Vec::new(),
    };

    Ok(PageResult {
        rows,
        total_count: total,
        page_index: window.page_index,
        page_size: query.page_size(),
    })
}

fn read_count(rows: &[Row]) -> Result<i64> {
    rows.first()
        .and_then(|row| row.value_at(0))
        .and_then(|value| value.as_int())
        .ok_or_else(|| ContribError::UnexpectedResult(String::from("count query returned no integer")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxide_contrib_core::SqlValue;

    #[test]
    fn test_read_count() {
        let rows = vec![Row::new().with("recordCount", SqlValue::Int(23))];
        assert_eq!(read_count(&rows).unwrap(), 23);
        assert!(matches!(
            read_count(&[]),
            Err(ContribError::UnexpectedResult(_))
        ));
    }
}
