//! Statement plans for staged bulk operations.
//!
//! A staged operation copies rows into a session temp table shaped like the
//! target, then joins that table back to the target. [`StagingJob`] holds
//! the table names and column lists for one run and renders each statement
//! of the sequence. Running them in order, and dropping the temp table on
//! every exit path, is the job of the executing layer.

use crate::dialect::DialectId;
use crate::error::{CoreError, Result};
use crate::fragment::{join_sql, normalize_sort, normalize_where};
use crate::schema::TableDescriptor;

/// Temp table prefix used when the caller does not configure one.
pub const DEFAULT_STAGING_PREFIX: &str = "#tmp_";

/// Names and columns for one staged bulk run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingJob {
    target_table: String,
    temp_table: String,
    payload_columns: Vec<String>,
    join_columns: Vec<String>,
    update_columns: Vec<String>,
    copy_all_columns: bool,
}

/// Derives a session temp table name from a prefix and the target table.
///
/// The result always starts with `#`. Characters that cannot appear in an
/// unquoted identifier are replaced with `_`.
///
/// ```rust
/// use oxide_contrib_core::staging::temp_table_name;
///
/// assert_eq!(temp_table_name("#tmp_", "dbo.pub_Country"), "#tmp_dbo_pub_Country");
/// assert_eq!(temp_table_name("stage_", "users"), "#stage_users");
/// ```
#[must_use]
pub fn temp_table_name(prefix: &str, target: &str) -> String {
    let prefix = if prefix.trim().is_empty() {
        DEFAULT_STAGING_PREFIX
    } else {
        prefix.trim()
    };
    let raw = format!("{}{}", prefix.trim_start_matches('#'), target);
    let cleaned: String = raw
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    format!("#{cleaned}")
}

impl StagingJob {
    /// Plans a bulk update of `table` matched on its identity columns.
    ///
    /// `columns` restricts the assigned columns; `None` assigns every
    /// updatable column. The staged payload always carries every
    /// non-computed column, since the temp table copies the target shape.
    ///
    /// # Errors
    ///
    /// - [`CoreError::MissingKey`] when the table has no identity column.
    /// - [`CoreError::UnknownColumn`] when a requested column is not mapped.
    /// - [`CoreError::EmptyUpdate`] when nothing is left to assign.
    pub fn for_update(
        table: &TableDescriptor,
        columns: Option<&[&str]>,
        prefix: &str,
    ) -> Result<Self> {
        let identity = table.require_identity()?;

        let update_columns: Vec<String> = match columns {
            Some(requested) => {
                let mut resolved = Vec::with_capacity(requested.len());
                for column in requested {
                    let column = table.resolve_column(column)?;
                    if identity.iter().any(|k| k.eq_ignore_ascii_case(column))
                        || table
                            .computed_columns()
                            .iter()
                            .any(|c| c.eq_ignore_ascii_case(column))
                    {
                        continue;
                    }
                    if !resolved.iter().any(|c: &String| c == column) {
                        resolved.push(column.to_string());
                    }
                }
                resolved
            }
            None => table.update_columns().into_iter().map(String::from).collect(),
        };
        if update_columns.is_empty() {
            return Err(CoreError::EmptyUpdate {
                table: table.name().to_string(),
            });
        }

        let payload_columns = table
            .all_columns()
            .iter()
            .filter(|c| {
                !table
                    .computed_columns()
                    .iter()
                    .any(|computed| computed.eq_ignore_ascii_case(c))
            })
            .cloned()
            .collect();

        Ok(Self {
            target_table: table.name().to_string(),
            temp_table: temp_table_name(prefix, table.name()),
            payload_columns,
            join_columns: identity.into_iter().map(String::from).collect(),
            update_columns,
            copy_all_columns: true,
        })
    }

    /// Plans a fetch of the rows of `table` whose `column` is in a staged
    /// value set.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownColumn`] when `column` is not mapped.
    pub fn for_filter(table: &TableDescriptor, column: &str, prefix: &str) -> Result<Self> {
        let column = table.resolve_column(column)?.to_string();
        Ok(Self {
            target_table: table.name().to_string(),
            temp_table: temp_table_name(prefix, table.name()),
            payload_columns: vec![column.clone()],
            join_columns: vec![column],
            update_columns: Vec::new(),
            copy_all_columns: false,
        })
    }

    /// Returns the target table name.
    #[must_use]
    pub fn target_table(&self) -> &str {
        &self.target_table
    }

    /// Returns the temp table name.
    #[must_use]
    pub fn temp_table(&self) -> &str {
        &self.temp_table
    }

    /// Returns the columns loaded into the temp table, in load order.
    #[must_use]
    pub fn payload_columns(&self) -> &[String] {
        &self.payload_columns
    }

    /// Returns the columns the temp table is joined on.
    #[must_use]
    pub fn join_columns(&self) -> &[String] {
        &self.join_columns
    }

    /// Returns the columns assigned by [`StagingJob::update_sql`].
    #[must_use]
    pub fn update_columns(&self) -> &[String] {
        &self.update_columns
    }

    /// Drops a temp table left behind by an earlier run on the session.
    #[must_use]
    pub fn drop_if_exists_sql(&self) -> String {
        format!(
            "IF OBJECT_ID('tempdb..{t}') IS NOT NULL DROP TABLE {t}",
            t = self.temp_table
        )
    }

    /// Creates an empty temp table with the target's column shape.
    #[must_use]
    pub fn create_sql(&self) -> String {
        let projection = if self.copy_all_columns {
            String::from("*")
        } else {
            self.payload_columns
                .iter()
                .map(|c| quote(c))
                .collect::<Vec<_>>()
                .join(", ")
        };
        format!(
            "SELECT TOP 0 {projection} INTO {} FROM {} WHERE 1=0",
            self.temp_table, self.target_table
        )
    }

    /// Assigns the staged values to the matching target rows.
    #[must_use]
    pub fn update_sql(&self) -> String {
        let assignments = self
            .update_columns
            .iter()
            .map(|c| {
                let c = quote(c);
                format!("T.{c} = Temp.{c}")
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "UPDATE T SET {assignments} FROM {} AS T INNER JOIN {} AS Temp ON {}",
            self.target_table,
            self.temp_table,
            self.join_predicate()
        )
    }

    /// Selects the target rows that join to a staged value.
    ///
    /// `where_sql` and `sort_by` are normalized like any other raw clause and
    /// appended after the join.
    #[must_use]
    pub fn filter_select_sql(&self, where_sql: &str, sort_by: &str) -> String {
        let select = format!(
            "SELECT T.* FROM {} AS T INNER JOIN {} AS Temp ON {}",
            self.target_table,
            self.temp_table,
            self.join_predicate()
        );
        join_sql(&[&select, &normalize_where(where_sql), &normalize_sort(sort_by)])
    }

    /// Drops the temp table.
    #[must_use]
    pub fn drop_sql(&self) -> String {
        format!("DROP TABLE {}", self.temp_table)
    }

    fn join_predicate(&self) -> String {
        self.join_columns
            .iter()
            .map(|c| {
                let c = quote(c);
                format!("T.{c} = Temp.{c}")
            })
            .collect::<Vec<_>>()
            .join(" AND ")
    }
}

fn quote(column: &str) -> String {
    DialectId::SqlServer.quote_identifier(column)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn country() -> TableDescriptor {
        TableDescriptor::new("pub_Country")
            .explicit_key("CountryId")
            .column("CnName")
            .column("Status")
            .computed("RowVersion")
    }

    #[test]
    fn test_temp_table_name() {
        assert_eq!(temp_table_name("#tmp_", "pub_Country"), "#tmp_pub_Country");
        assert_eq!(temp_table_name("", "users"), "#tmp_users");
        assert_eq!(temp_table_name("##g_", "a b"), "#g_a_b");
    }

    #[test]
    fn test_update_plan_statements() {
        let job = StagingJob::for_update(&country(), None, DEFAULT_STAGING_PREFIX).unwrap();
        assert_eq!(job.temp_table(), "#tmp_pub_Country");
        assert_eq!(job.payload_columns(), &["CountryId", "CnName", "Status"]);
        assert_eq!(
            job.create_sql(),
            "SELECT TOP 0 * INTO #tmp_pub_Country FROM pub_Country WHERE 1=0"
        );
        assert_eq!(
            job.update_sql(),
            "UPDATE T SET T.[CnName] = Temp.[CnName], T.[Status] = Temp.[Status] \
             FROM pub_Country AS T INNER JOIN #tmp_pub_Country AS Temp \
             ON T.[CountryId] = Temp.[CountryId]"
        );
        assert_eq!(job.drop_sql(), "DROP TABLE #tmp_pub_Country");
        assert_eq!(
            job.drop_if_exists_sql(),
            "IF OBJECT_ID('tempdb..#tmp_pub_Country') IS NOT NULL DROP TABLE #tmp_pub_Country"
        );
    }

    #[test]
    fn test_update_plan_with_selected_columns() {
        let job =
            StagingJob::for_update(&country(), Some(&["status", "CountryId"][..]), "#tmp_").unwrap();
        assert_eq!(job.update_columns(), &["Status"]);
    }

    #[test]
    fn test_update_plan_composite_identity() {
        let table = TableDescriptor::new("grades")
            .key("StudentId")
            .explicit_key("CourseId")
            .column("Score");
        let job = StagingJob::for_update(&table, None, "#tmp_").unwrap();
        assert!(job
            .update_sql()
            .ends_with("ON T.[StudentId] = Temp.[StudentId] AND T.[CourseId] = Temp.[CourseId]"));
    }

    #[test]
    fn test_update_plan_errors() {
        let keyless = TableDescriptor::new("logs").column("message");
        assert!(matches!(
            StagingJob::for_update(&keyless, None, "#tmp_"),
            Err(CoreError::MissingKey { .. })
        ));

        let only_key = TableDescriptor::new("tags").explicit_key("Tag");
        assert!(matches!(
            StagingJob::for_update(&only_key, None, "#tmp_"),
            Err(CoreError::EmptyUpdate { .. })
        ));

        assert!(matches!(
            StagingJob::for_update(&country(), Some(&["Missing"][..]), "#tmp_"),
            Err(CoreError::UnknownColumn { .. })
        ));
    }

    #[test]
    fn test_filter_plan_statements() {
        let job = StagingJob::for_filter(&country(), "countryid", "#tmp_").unwrap();
        assert_eq!(job.payload_columns(), &["CountryId"]);
        assert_eq!(
            job.create_sql(),
            "SELECT TOP 0 [CountryId] INTO #tmp_pub_Country FROM pub_Country WHERE 1=0"
        );
        assert_eq!(
            job.filter_select_sql("T.Status = @status", "T.CnName"),
            "SELECT T.* FROM pub_Country AS T INNER JOIN #tmp_pub_Country AS Temp \
             ON T.[CountryId] = Temp.[CountryId] where T.Status = @status order by T.CnName"
        );
        assert_eq!(
            job.filter_select_sql("", ""),
            "SELECT T.* FROM pub_Country AS T INNER JOIN #tmp_pub_Country AS Temp \
             ON T.[CountryId] = Temp.[CountryId]"
        );
    }
}
