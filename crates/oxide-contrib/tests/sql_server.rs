//! Paging and single-row reads as issued on a SQL Server session double.

mod common;

use common::RecordingSession;
use oxide_contrib::{
    paginate, ContribError, CoreError, DialectId, Entity, EntityExt, Filter, PageRequest, Row,
    SqlValue,
};

#[derive(Debug, Clone, PartialEq, Entity)]
#[table(name = "pub_Country")]
pub struct Country {
    #[column(explicit_key, name = "CountryId")]
    pub id: i64,
    #[column(name = "CnName")]
    pub name: String,
}

fn count_row(total: i64) -> Vec<Row> {
    vec![Row::new().with("recordCount", SqlValue::Int(total))]
}

fn country_row(id: i64) -> Row {
    Row::new()
        .with("CountryId", SqlValue::Int(id))
        .with("CnName", SqlValue::Text(format!("Country {id}")))
}

#[tokio::test]
async fn test_page_past_the_end_is_clamped() {
    let mut session = RecordingSession::sql_server()
        .with_query_result(count_row(23))
        .with_query_result((21..=23).map(country_row).collect());

    let page = paginate(
        &mut session,
        Country::descriptor(),
        &PageRequest::new(5, 9),
        None,
    )
    .await
    .unwrap();

    assert_eq!(
        session.statements(),
        vec![
            "SELECT COUNT(1) AS recordCount FROM pub_Country",
            "SELECT * FROM pub_Country order by CountryId OFFSET 20 ROWS FETCH NEXT 3 ROWS ONLY",
        ]
    );
    assert_eq!(page.page_index, 5);
    assert_eq!(page.total_count, 23);
    assert_eq!(page.rows.len(), 3);
}

#[tokio::test]
async fn test_filter_params_reach_both_statements() {
    let mut session = RecordingSession::sql_server()
        .with_query_result(count_row(13))
        .with_query_result(vec![country_row(23)]);

    let request = PageRequest::new(5, 1)
        .filter("CountryId > @id")
        .sort("CnName desc")
        .param("id", 10);
    paginate(&mut session, Country::descriptor(), &request, None)
        .await
        .unwrap();

    assert_eq!(
        session.statements(),
        vec![
            "SELECT COUNT(1) AS recordCount FROM pub_Country where CountryId > @id",
            "SELECT * FROM pub_Country where CountryId > @id order by CnName desc \
             OFFSET 0 ROWS FETCH NEXT 5 ROWS ONLY",
        ]
    );
    for call in &session.calls {
        let common::Call::Query(_, params) = call else {
            panic!("unexpected call {call:?}");
        };
        assert_eq!(params.get("id"), Some(&SqlValue::Int(10)));
    }
}

#[tokio::test]
async fn test_unsupported_dialect_issues_no_sql() {
    let mut session = RecordingSession::new(DialectId::Postgres);
    let err = paginate(
        &mut session,
        Country::descriptor(),
        &PageRequest::new(5, 1),
        None,
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        ContribError::Core(CoreError::UnsupportedDialect(ref name)) if name == "postgres"
    ));
    assert!(session.calls.is_empty());
}

#[tokio::test]
async fn test_page_index_zero_only_counts() {
    let mut session = RecordingSession::sql_server().with_query_result(count_row(23));
    let page = paginate(
        &mut session,
        Country::descriptor(),
        &PageRequest::new(5, 0),
        None,
    )
    .await
    .unwrap();

    assert_eq!(session.statements().len(), 1);
    assert_eq!(page.total_count, 23);
    assert!(page.rows.is_empty());
}

#[tokio::test]
async fn test_zero_count_skips_page_statement() {
    let mut session = RecordingSession::sql_server().with_query_result(count_row(0));
    let page = paginate(
        &mut session,
        Country::descriptor(),
        &PageRequest::new(5, 3),
        None,
    )
    .await
    .unwrap();

    assert_eq!(
        session.statements(),
        vec!["SELECT COUNT(1) AS recordCount FROM pub_Country"]
    );
    assert_eq!(page.total_count, 0);
    assert!(page.rows.is_empty());
}

#[tokio::test]
async fn test_page_size_zero_omits_fetch() {
    let mut session = RecordingSession::sql_server()
        .with_query_result(count_row(23))
        .with_query_result((1..=23).map(country_row).collect());

    let page = paginate(
        &mut session,
        Country::descriptor(),
        &PageRequest::new(0, 1),
        None,
    )
    .await
    .unwrap();

    let statements = session.statements();
    assert_eq!(statements.len(), 2);
    assert_eq!(
        statements[1],
        "SELECT * FROM pub_Country order by CountryId OFFSET 0 ROWS"
    );
    assert!(!statements[1].contains("FETCH"));
    assert_eq!(page.rows.len(), 23);
}

#[tokio::test]
async fn test_get_reads_a_single_row() {
    let mut session = RecordingSession::sql_server()
        .with_query_result(vec![country_row(3)])
        .with_query_result(vec![country_row(7)]);
    let repo = Country::repository();

    let found = repo
        .get(&mut session, &Filter::with_where("CnName = @name").param("name", "x"))
        .await
        .unwrap();
    assert_eq!(found.map(|c| c.id), Some(3));

    let found = repo.get_by_id(&mut session, 7).await.unwrap();
    assert_eq!(found.map(|c| c.id), Some(7));

    assert_eq!(
        session.statements(),
        vec![
            "SELECT TOP 1 * FROM pub_Country where CnName = @name",
            "SELECT TOP 1 * FROM pub_Country where [CountryId] = @id",
        ]
    );
}
