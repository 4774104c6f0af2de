//! End-to-end query execution: version resolution, criteria, sorting,
//! paging and rendering over the on-disk fixture.

#[path = "../common/mod.rs"]
mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dataquery::catalog::FileCatalogSource;
use dataquery::config::QuerySettings;
use dataquery::model::{DataSetQueryRequest, DataSetVersion, VersionSelector};
use dataquery::query::{
    DataQuery, ErrorCode, ExecutorResult, QueryExecutor, QueryService, Row, WarningCode,
    QUERY_STRING_ROOT,
};
use dataquery::sql::{CompiledSql, Dialect, SqlValue};
use dataquery::versions::FileVersionRepository;
use dataquery::QueryError;

fn request(json: serde_json::Value) -> DataSetQueryRequest {
    serde_json::from_value(json).unwrap()
}

fn query(json: serde_json::Value) -> DataQuery {
    DataQuery::new(common::data_set_id(), request(json))
}

/// The stored row id, recovered from the `enrolments` value.
fn row_ids(page: &dataquery::query::QueryPage) -> Vec<i64> {
    let position = page.catalog.indicator_position("enrolments").unwrap();
    page.rows
        .iter()
        .map(|row| {
            let (_, value) = row.values.iter().find(|(i, _)| *i == position).unwrap();
            value.as_int().unwrap() / 100
        })
        .collect()
}

// ============================================================================
// Paging and default order
// ============================================================================

#[tokio::test]
async fn test_default_order_is_latest_period_first() {
    let fixture = common::Fixture::new();
    let page = fixture
        .service()
        .execute(&query(serde_json::json!({})).page(1, Some(27)))
        .await
        .unwrap();

    assert_eq!(page.paging.total_results, 27);
    assert_eq!(page.version.version.to_string(), "2.0");
    let expected: Vec<i64> = (19..=27).chain(1..=9).chain(10..=18).collect();
    assert_eq!(row_ids(&page), expected);
    assert!(page.warnings.is_empty());
}

#[tokio::test]
async fn test_last_partial_page_and_past_the_end() {
    let fixture = common::Fixture::new();
    let service = fixture.service();

    let page = service
        .execute(&query(serde_json::json!({})).page(3, Some(10)))
        .await
        .unwrap();
    assert_eq!(page.paging.total_results, 27);
    assert_eq!(page.paging.total_pages, 3);
    assert_eq!(row_ids(&page), (12..=18).collect::<Vec<_>>());

    let page = service
        .execute(&query(serde_json::json!({})).page(4, Some(10)))
        .await
        .unwrap();
    assert!(page.rows.is_empty());
    assert_eq!(page.paging.total_results, 27);
    // Rows exist; this page is simply beyond them.
    assert!(page.warnings.is_empty());
}

#[tokio::test]
async fn test_invalid_paging_is_rejected() {
    let fixture = common::Fixture::new();
    let err = fixture
        .service()
        .execute(&query(serde_json::json!({})).page(0, Some(20_000)))
        .await
        .unwrap_err();
    let QueryError::Validation(errors) = err else {
        panic!("expected validation error, got {:?}", err);
    };
    let codes: Vec<(ErrorCode, &str)> = errors.iter().map(|e| (e.code, e.path.as_str())).collect();
    assert_eq!(
        codes,
        vec![
            (ErrorCode::InvalidPage, "page"),
            (ErrorCode::InvalidPageSize, "pageSize"),
        ]
    );
}

// ============================================================================
// Criteria, indicators and sorts
// ============================================================================

#[tokio::test]
async fn test_filtered_sorted_query() {
    let fixture = common::Fixture::new();
    let page = fixture
        .service()
        .execute(
            &query(serde_json::json!({
                "criteria": {"geographicLevels": {"eq": "REG"}},
                "indicators": ["enrolments"],
                "sorts": [{"field": "location|REG", "direction": "Asc"}]
            }))
            .page(1, Some(5)),
        )
        .await
        .unwrap();

    assert_eq!(page.paging.total_results, 18);
    // North East sorts before Yorkshire and The Humber.
    assert_eq!(row_ids(&page), vec![7, 8, 9, 16, 17]);

    let response = page.to_response().unwrap();
    let first = &response.results[0];
    assert_eq!(first.time_period.period, "2020/2021");
    assert_eq!(first.time_period.code, "AY");
    assert_eq!(first.geographic_level.to_string(), "REG");
    let locations: Vec<&str> = first.locations.values().map(String::as_str).collect();
    assert_eq!(locations, vec!["loc-england", "loc-ne"]);
    assert_eq!(first.filters["school_type"], "fo-primary");
    assert_eq!(first.filters["ncyear"], "fo-y1");
    assert_eq!(first.values.len(), 1);
    assert_eq!(first.values["enrolments"], "700");
}

#[tokio::test]
async fn test_missing_values_render_empty() {
    let fixture = common::Fixture::new();
    let page = fixture
        .service()
        .execute(&query(serde_json::json!({
            "criteria": {"and": [
                {"timePeriods": {"eq": "2020/2021|AY"}},
                {"filters": {"eq": "fo-total"}}
            ]}
        })))
        .await
        .unwrap();
    let response = page.to_response().unwrap();
    let values: Vec<&str> = response
        .results
        .iter()
        .map(|r| r.values["sess_auth"].as_str())
        .collect();
    // Rows 3, 6 and 9; row 9 has no value.
    assert_eq!(values, vec!["1.5", "3", ""]);
}

#[tokio::test]
async fn test_unknown_values_warn_and_match_nothing() {
    let fixture = common::Fixture::new();
    let page = fixture
        .service()
        .execute(&query(serde_json::json!({
            "criteria": {"filters": {"eq": "fo-retired"}}
        })))
        .await
        .unwrap();

    assert!(page.rows.is_empty());
    let codes: Vec<WarningCode> = page.warnings.iter().map(|w| w.code).collect();
    assert_eq!(
        codes,
        vec![WarningCode::FiltersNotFound, WarningCode::QueryNoResults]
    );
    assert_eq!(page.warnings[0].path, "criteria.filters.eq");

    let json = serde_json::to_value(page.to_response().unwrap()).unwrap();
    assert_eq!(json["warnings"][1]["code"], "QueryNoResults");
    assert_eq!(json["paging"]["totalResults"], 0);
}

#[tokio::test]
async fn test_errors_are_collected_together() {
    let fixture = common::Fixture::new();
    let err = fixture
        .service()
        .execute(&query(serde_json::json!({
            "criteria": {"locations": {"eq": "REG|postcode|S1"}},
            "indicators": ["enrolments", "exclusions"],
            "sorts": [
                {"field": "filter|missing", "direction": "Asc"},
                {"field": "timePeriod", "direction": "Sideways"}
            ]
        })))
        .await
        .unwrap_err();

    let QueryError::Validation(errors) = err else {
        panic!("expected validation error, got {:?}", err);
    };
    let codes: Vec<(ErrorCode, &str)> = errors.iter().map(|e| (e.code, e.path.as_str())).collect();
    assert_eq!(
        codes,
        vec![
            (ErrorCode::IndicatorsNotFound, "indicators"),
            (ErrorCode::InvalidLocation, "criteria.locations.eq"),
            (ErrorCode::SortFieldNotFound, "sorts[0]"),
            (ErrorCode::InvalidSort, "sorts[1]"),
        ]
    );
}

#[tokio::test]
async fn test_version_selection() {
    let fixture = common::Fixture::new();
    let service = fixture.service();

    // 1.0 predates option fo-y3.
    let page = service
        .execute(
            &query(serde_json::json!({"criteria": {"filters": {"eq": "fo-y3"}}}))
                .version(VersionSelector::parse_optional(Some("1.0")).unwrap()),
        )
        .await
        .unwrap();
    assert_eq!(page.version.version.to_string(), "1.0");
    assert_eq!(page.warnings[0].code, WarningCode::FiltersNotFound);

    let err = service
        .execute(&query(serde_json::json!({})).version(VersionSelector::parse_optional(Some("2.1")).unwrap()))
        .await
        .unwrap_err();
    assert!(matches!(err, QueryError::VersionNotFound { .. }));
}

// ============================================================================
// Plans
// ============================================================================

#[tokio::test]
async fn test_plan_sql() {
    let fixture = common::Fixture::new();
    let plan = fixture
        .service()
        .plan(
            &query(serde_json::json!({
                "criteria": {"geographicLevels": {"in": ["NAT", "LA"]}},
                "indicators": ["sess_auth"],
                "sorts": [{"field": "indicator|sess_auth", "direction": "Desc"}]
            }))
            .page(2, Some(25))
            .criteria_root(QUERY_STRING_ROOT),
        )
        .await
        .unwrap();

    assert_eq!(
        plan.count,
        CompiledSql {
            sql: "SELECT COUNT(*) AS \"total\"\nFROM \"data\"\nWHERE \"geographic_level\" IN (?1)"
                .to_string(),
            params: vec![SqlValue::from("NAT")],
        }
    );
    assert!(
        plan.page
            .sql
            .ends_with("ORDER BY \"sess_auth\" DESC, \"id\" ASC\nLIMIT 25 OFFSET 25"),
        "{}",
        plan.page.sql
    );
    assert!(plan.page.sql.starts_with("SELECT \"time_period_id\", \"geographic_level\""));
    assert!(!plan.page.sql.contains("enrolments"));
    assert_eq!(plan.warnings.len(), 1);
    assert_eq!(plan.warnings[0].path, "geographicLevels.in");
}

// ============================================================================
// Timeouts
// ============================================================================

struct SlowExecutor;

#[async_trait]
impl QueryExecutor for SlowExecutor {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    async fn fetch(&self, _version: &DataSetVersion, _sql: CompiledSql) -> ExecutorResult<Vec<Row>> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(vec![vec![SqlValue::Int(0)]])
    }
}

#[tokio::test]
async fn test_timeout() {
    let fixture = common::Fixture::new();
    let service = QueryService::new(
        Arc::new(FileVersionRepository::new(fixture.root())),
        Arc::new(FileCatalogSource),
        Arc::new(SlowExecutor),
        QuerySettings {
            timeout_seconds: 1,
            ..QuerySettings::default()
        },
    );

    let started = std::time::Instant::now();
    let err = service.execute(&query(serde_json::json!({}))).await.unwrap_err();
    assert!(matches!(err, QueryError::Timeout(1)), "{:?}", err);
    assert!(started.elapsed() < Duration::from_secs(10));
}
