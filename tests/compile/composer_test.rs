//! Integration tests for criteria composition: criteria JSON through the
//! facet parsers and composer to dialect SQL and bound parameters.

#[path = "../common/mod.rs"]
mod common;

use dataquery::model::QueryCriteria;
use dataquery::query::{CriteriaComposer, QueryState, WarningCode, BODY_ROOT, QUERY_STRING_ROOT};
use dataquery::sql::{CompiledSql, Dialect, SqlFragment, SqlValue};
use insta::assert_snapshot;

fn compose(json: &str, root: &str) -> (SqlFragment, QueryState) {
    let catalog = common::catalog();
    let criteria: QueryCriteria = serde_json::from_str(json).unwrap();
    let mut state = QueryState::new();
    let fragment = CriteriaComposer::new(&catalog).compose(&criteria, root, &mut state);
    (fragment, state)
}

// ============================================================================
// Constant folding
// ============================================================================

#[test]
fn test_empty_criteria_matches_everything() {
    let (fragment, state) = compose("{}", BODY_ROOT);
    assert_eq!(fragment, SqlFragment::always_true());
    assert!(fragment.params().is_empty());
    assert!(state.warnings().is_empty());
    assert!(!state.has_errors());
}

#[test]
fn test_unresolved_eq_matches_nothing() {
    let (fragment, state) = compose(r#"{"filters": {"eq": "fo-unknown"}}"#, BODY_ROOT);
    assert_eq!(fragment, SqlFragment::always_false());
    assert_eq!(state.warnings().len(), 1);
    assert_eq!(state.warnings()[0].code, WarningCode::FiltersNotFound);
    assert_eq!(state.warnings()[0].path, "criteria.filters.eq");
}

#[test]
fn test_unresolved_not_eq_matches_everything() {
    let (fragment, state) = compose(r#"{"filters": {"notEq": "fo-unknown"}}"#, BODY_ROOT);
    assert_eq!(fragment, SqlFragment::always_true());
    assert_eq!(state.warnings().len(), 1);
    assert_eq!(state.warnings()[0].path, "criteria.filters.notEq");
}

// ============================================================================
// Facet combinations
// ============================================================================

#[test]
fn test_time_period_and_levels_with_partial_match() {
    let (fragment, state) = compose(
        r#"{"and": [
            {"timePeriods": {"eq": "2020|AY"}},
            {"geographicLevels": {"in": ["REG", "LA"]}}
        ]}"#,
        QUERY_STRING_ROOT,
    );

    let CompiledSql { sql, params } = fragment.compile(Dialect::Sqlite);
    assert_eq!(sql, "\"time_period_id\" = ?1 AND \"geographic_level\" IN (?2)");
    assert_eq!(params, vec![SqlValue::Int(1), SqlValue::from("REG")]);

    assert_eq!(state.warnings().len(), 1);
    let warning = &state.warnings()[0];
    assert_eq!(warning.code, WarningCode::GeographicLevelsNotFound);
    assert_eq!(warning.path, "and[1].geographicLevels.in");
    assert_eq!(warning.detail.as_ref().unwrap().items, vec!["LA"]);
}

#[test]
fn test_mixed_in_and_not_in_one_warning_each() {
    let (fragment, state) = compose(
        r#"{"filters": {
            "in": ["fo-primary", "fo-nope", "fo-y1"],
            "notIn": ["fo-total", "fo-gone", "fo-missing"]
        }}"#,
        BODY_ROOT,
    );

    let sql = fragment.to_sql(Dialect::Sqlite);
    assert_snapshot!(
        sql,
        @r#"("school_type" IN (?1) OR "ncyear" IN (?2)) AND "school_type" NOT IN (?3)"#
    );
    assert_eq!(
        fragment.params(),
        vec![SqlValue::Int(11), SqlValue::Int(21), SqlValue::Int(13)]
    );

    let warnings: Vec<(&str, &Vec<String>)> = state
        .warnings()
        .iter()
        .map(|w| (w.path.as_str(), &w.detail.as_ref().unwrap().items))
        .collect();
    assert_eq!(
        warnings,
        vec![
            ("criteria.filters.in", &vec!["fo-nope".to_string()]),
            (
                "criteria.filters.notIn",
                &vec!["fo-gone".to_string(), "fo-missing".to_string()]
            ),
        ]
    );
}

#[test]
fn test_location_not_eq_is_null_safe() {
    let (fragment, _) = compose(r#"{"locations": {"notEq": "REG|code|E12000003"}}"#, BODY_ROOT);
    let sql = fragment.to_sql(Dialect::Postgres);
    assert_eq!(
        sql,
        "\"locations_reg_id\" IS NULL OR \"locations_reg_id\" <> $1"
    );
    assert_eq!(fragment.params(), vec![SqlValue::Int(201)]);
}

#[test]
fn test_time_period_range() {
    let (fragment, state) = compose(r#"{"timePeriods": {"gte": "2020/2021|AY"}}"#, BODY_ROOT);
    assert!(state.warnings().is_empty());
    assert_eq!(
        fragment.compile(Dialect::DuckDb),
        CompiledSql {
            sql: "\"time_period_id\" IN ($1, $2)".to_string(),
            params: vec![SqlValue::Int(1), SqlValue::Int(3)],
        }
    );
}

#[test]
fn test_time_period_range_unknown_bound() {
    let (fragment, state) = compose(r#"{"timePeriods": {"lt": "2030|AY"}}"#, BODY_ROOT);
    assert_eq!(fragment, SqlFragment::always_false());
    assert_eq!(state.warnings()[0].code, WarningCode::TimePeriodsNotFound);
    assert_eq!(state.warnings()[0].path, "criteria.timePeriods.lt");
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_malformed_values_are_errors_with_paths() {
    let (_, state) = compose(
        r#"{"or": [
            {"locations": {"in": ["REG|nope|x"]}},
            {"not": {"timePeriods": {"eq": "20x0|AY"}}},
            {"geographicLevels": {"eq": "XYZ"}}
        ]}"#,
        BODY_ROOT,
    );
    let paths: Vec<&str> = state.errors().iter().map(|e| e.path.as_str()).collect();
    assert_eq!(
        paths,
        vec![
            "criteria.or[0].locations.in",
            "criteria.or[1].not.timePeriods.eq",
            "criteria.or[2].geographicLevels.eq",
        ]
    );
}

#[test]
fn test_user_strings_never_reach_sql_text() {
    let (fragment, _) = compose(
        r#"{"geographicLevels": {"in": ["NAT", "REG"]}, "filters": {"eq": "fo-primary"}}"#,
        BODY_ROOT,
    );
    for dialect in [Dialect::Sqlite, Dialect::DuckDb, Dialect::Postgres] {
        let compiled = fragment.compile(dialect);
        assert!(!compiled.sql.contains("NAT"), "{}", compiled.sql);
        assert!(!compiled.sql.contains("fo-primary"), "{}", compiled.sql);
        assert_eq!(compiled.params.len(), 3);
    }
}
