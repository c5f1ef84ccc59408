//! oxide-contrib CLI
//!
//! Prints the SQL generated for paging and staged bulk operations, and runs
//! paged queries against SQLite.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use oxide_contrib::{paginate, ContribConfig};
use oxide_contrib_core::{
    DialectId, PageQuery, PageRequest, Params, Row, SqlValue, StagingJob, TableDescriptor,
};
use sqlx::sqlite::SqlitePoolOptions;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

/// Dialect-aware paging and bulk staging SQL.
#[derive(Parser)]
#[command(name = "oxide-contrib")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database URL (SQLite path or connection string).
    #[arg(short, long, env = "DATABASE_URL", default_value = "sqlite::memory:")]
    database: String,

    /// JSON settings file (command timeout, staging prefix).
    #[arg(short, long, env = "OXIDE_CONTRIB_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Table shape given on the command line.
#[derive(Args, Debug, Clone)]
struct TableArgs {
    /// Table name.
    #[arg(short, long)]
    table: String,

    /// Database-generated key column (repeatable).
    #[arg(long = "key")]
    keys: Vec<String>,

    /// Caller-assigned key column (repeatable).
    #[arg(long = "explicit-key")]
    explicit_keys: Vec<String>,

    /// Plain column (repeatable).
    #[arg(long = "column")]
    columns: Vec<String>,

    /// Database-computed column (repeatable).
    #[arg(long = "computed")]
    computed: Vec<String>,
}

/// Page position, filter and ordering.
#[derive(Args, Debug, Clone)]
struct PageArgs {
    /// Rows per page.
    #[arg(long, default_value_t = 20)]
    page_size: u32,

    /// Page index; SQL Server pages start at 1, MySQL and SQLite at 0.
    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    page_index: i64,

    /// Filter, with or without `where`.
    #[arg(long = "where", default_value = "")]
    where_sql: String,

    /// Ordering, with or without `order by`; defaults to the single key.
    #[arg(long, default_value = "")]
    sort: String,

    /// Filter parameter as `name=value` (repeatable).
    #[arg(long = "param", value_parser = parse_param)]
    params: Vec<(String, SqlValue)>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the count and page statements for a dialect.
    PageSql {
        /// Dialect or driver name (sqlserver, mysql, sqlite, SqlConnection, ...).
        #[arg(long)]
        dialect: String,

        /// Row count the page statement is computed for.
        #[arg(long)]
        total: i64,

        #[command(flatten)]
        table: TableArgs,

        #[command(flatten)]
        page: PageArgs,
    },

    /// Print the SQL Server statement sequence of a staged bulk operation.
    StagingSql {
        #[command(flatten)]
        table: TableArgs,

        /// Column to assign (repeatable); all updatable columns if omitted.
        #[arg(long = "update")]
        update: Vec<String>,

        /// Print a filtered fetch on this column instead of a bulk update.
        #[arg(long)]
        filter_column: Option<String>,
    },

    /// Fetch one page of a SQLite table and print it as JSON.
    Page {
        #[command(flatten)]
        table: TableArgs,

        #[command(flatten)]
        page: PageArgs,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = match &cli.config {
        Some(path) => {
            debug!(path = %path.display(), "Loading settings");
            ContribConfig::from_json(&std::fs::read_to_string(path)?)?
        }
        None => ContribConfig::default(),
    };

    match cli.command {
        Commands::PageSql {
            dialect,
            total,
            table,
            page,
        } => {
            let dialect = DialectId::from_name(&dialect);
            for line in page_statements(&dialect, &table.descriptor(), &page.request(), total)? {
                println!("{line}");
            }
        }

        Commands::StagingSql {
            table,
            update,
            filter_column,
        } => {
            let descriptor = table.descriptor();
            let job = match &filter_column {
                Some(column) => StagingJob::for_filter(&descriptor, column, &config.staging_prefix)?,
                None => {
                    let update: Vec<&str> = update.iter().map(String::as_str).collect();
                    let columns = (!update.is_empty()).then_some(update.as_slice());
                    StagingJob::for_update(&descriptor, columns, &config.staging_prefix)?
                }
            };
            for line in staging_statements(&job, filter_column.is_some()) {
                println!("{line}");
            }
        }

        Commands::Page { table, page } => {
            let pool = SqlitePoolOptions::new()
                .max_connections(1)
                .connect(&cli.database)
                .await?;
            let mut conn = pool.acquire().await?;

            let descriptor = table.descriptor();
            let result = paginate(
                &mut *conn,
                &descriptor,
                &page.request(),
                config.command_timeout(),
            )
            .await?;
            info!(
                table = descriptor.name(),
                total = result.total_count,
                page = result.page_index,
                rows = result.rows.len(),
                "Fetched page"
            );

            let output = serde_json::json!({
                "total_count": result.total_count,
                "page_index": result.page_index,
                "page_size": result.page_size,
                "total_pages": result.total_pages(),
                "rows": result.rows.iter().map(row_to_json).collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

impl TableArgs {
    fn descriptor(&self) -> TableDescriptor {
        let mut table = TableDescriptor::new(self.table.as_str());
        for key in &self.keys {
            table = table.key(key.as_str());
        }
        for key in &self.explicit_keys {
            table = table.explicit_key(key.as_str());
        }
        for column in &self.columns {
            table = table.column(column.as_str());
        }
        for column in &self.computed {
            table = table.computed(column.as_str());
        }
        table
    }
}

impl PageArgs {
    fn request(&self) -> PageRequest {
        let params: Params = self.params.iter().cloned().collect();
        PageRequest::new(self.page_size, self.page_index)
            .filter(&self.where_sql)
            .sort(&self.sort)
            .params(params)
    }
}

fn page_statements(
    dialect: &DialectId,
    table: &TableDescriptor,
    request: &PageRequest,
    total: i64,
) -> anyhow::Result<Vec<String>> {
    let style = dialect.paging_style()?;
    let query = PageQuery::new(table, request)?;

    let mut lines = vec![format!("{};", query.count_sql())];
    if total <= 0 {
        lines.push(String::from("-- no rows: the page statement is not issued"));
        return Ok(lines);
    }

    let window = query.window(style, total);
    lines.push(format!(
        "-- page {} of {}, offset {}, take {}",
        window.page_index, window.total_pages, window.offset, window.take
    ));
    match query.page_sql(style, &window) {
        Some(sql) => lines.push(format!("{sql};")),
        None => lines.push(String::from("-- empty page: the page statement is not issued")),
    }
    Ok(lines)
}

fn staging_statements(job: &StagingJob, filter: bool) -> Vec<String> {
    let consume = if filter {
        job.filter_select_sql("", "")
    } else {
        job.update_sql()
    };
    vec![
        format!("{};", job.drop_if_exists_sql()),
        format!("{};", job.create_sql()),
        format!(
            "-- bulk copy ({}) into {}",
            job.payload_columns().join(", "),
            job.temp_table()
        ),
        format!("{consume};"),
        format!("{};", job.drop_sql()),
    ]
}

fn parse_param(raw: &str) -> Result<(String, SqlValue), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing parameter name in '{raw}'"));
    }

    let value = if value.eq_ignore_ascii_case("null") {
        SqlValue::Null
    } else if let Ok(n) = value.parse::<i64>() {
        SqlValue::Int(n)
    } else if let Ok(f) = value.parse::<f64>() {
        SqlValue::Float(f)
    } else {
        SqlValue::Text(value.to_string())
    };
    Ok((name.to_string(), value))
}

fn row_to_json(row: &Row) -> serde_json::Value {
    let map = row
        .iter()
        .map(|(column, value)| (column.to_string(), value_to_json(value)))
        .collect::<serde_json::Map<_, _>>();
    serde_json::Value::Object(map)
}

fn value_to_json(value: &SqlValue) -> serde_json::Value {
    match value {
        SqlValue::Null => serde_json::Value::Null,
        SqlValue::Bool(b) => serde_json::Value::Bool(*b),
        SqlValue::Int(n) => serde_json::Value::from(*n),
        SqlValue::Float(f) => serde_json::Number::from_f64(*f)
            .map_or(serde_json::Value::Null, serde_json::Value::Number),
        SqlValue::Text(s) => serde_json::Value::String(s.clone()),
        SqlValue::Blob(b) => serde_json::Value::from(b.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn country() -> TableDescriptor {
        TableDescriptor::new("pub_Country")
            .explicit_key("CountryId")
            .column("CnName")
    }

    #[test]
    fn test_parse_param() {
        assert_eq!(
            parse_param("id=10").unwrap(),
            (String::from("id"), SqlValue::Int(10))
        );
        assert_eq!(
            parse_param("@name=France").unwrap().1,
            SqlValue::Text("France".into())
        );
        assert_eq!(parse_param("x=null").unwrap().1, SqlValue::Null);
        assert!(parse_param("novalue").is_err());
        assert!(parse_param("=1").is_err());
    }

    #[test]
    fn test_page_statements_sql_server() {
        let lines = page_statements(
            &DialectId::SqlServer,
            &country(),
            &PageRequest::new(5, 9),
            23,
        )
        .unwrap();
        assert_eq!(
            lines,
            vec![
                "SELECT COUNT(1) AS recordCount FROM pub_Country;",
                "-- page 5 of 5, offset 20, take 3",
                "SELECT * FROM pub_Country order by CountryId OFFSET 20 ROWS FETCH NEXT 3 ROWS ONLY;",
            ]
        );
    }

    #[test]
    fn test_page_statements_empty_table() {
        let lines =
            page_statements(&DialectId::MySql, &country(), &PageRequest::new(5, 1), 0).unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("-- no rows"));
    }

    #[test]
    fn test_page_statements_unsupported_dialect() {
        let err = page_statements(
            &DialectId::from_name("postgres"),
            &country(),
            &PageRequest::new(5, 1),
            10,
        )
        .unwrap_err();
        assert!(err.to_string().contains("postgres"));
    }

    #[test]
    fn test_staging_statements() {
        let job = StagingJob::for_update(&country(), None, "#tmp_").unwrap();
        let lines = staging_statements(&job, false);
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[2], "-- bulk copy (CountryId, CnName) into #tmp_pub_Country");
        assert_eq!(lines[4], "DROP TABLE #tmp_pub_Country;");
    }

    #[test]
    fn test_row_to_json() {
        let row = Row::new()
            .with("id", SqlValue::Int(1))
            .with("name", SqlValue::Text("a".into()))
            .with("gone", SqlValue::Null);
        assert_eq!(
            row_to_json(&row),
            serde_json::json!({ "id": 1, "name": "a", "gone": null })
        );
    }

    #[test]
    fn test_cli_parses_repeated_flags() {
        let cli = Cli::try_parse_from([
            "oxide-contrib",
            "page-sql",
            "--dialect",
            "mysql",
            "--total",
            "23",
            "--table",
            "pub_Country",
            "--explicit-key",
            "CountryId",
            "--column",
            "CnName",
            "--page-size",
            "5",
            "--param",
            "id=3",
            "--param",
            "name=x",
        ])
        .unwrap();
        let Commands::PageSql { table, page, .. } = cli.command else {
            panic!("expected page-sql");
        };
        assert_eq!(table.descriptor().all_columns(), &["CountryId", "CnName"]);
        assert_eq!(page.request().params.len(), 2);
    }
}
