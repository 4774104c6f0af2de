//! Facet parsers run against a real store: each compiled predicate is
//! executed in SQLite and the matching row ids checked.

#[path = "../common/mod.rs"]
mod common;

use dataquery::catalog::MetadataCatalog;
use dataquery::model::{FacetCriteria, TimePeriodCriteria};
use dataquery::query::{
    FacetParser, FilterParser, GeographicLevelParser, LocationParser, QueryState,
    TimePeriodParser, WarningCode,
};
use dataquery::sql::{Dialect, Predicate};
use rusqlite::Connection;
use tempfile::TempDir;

struct Store {
    _dir: TempDir,
    conn: Connection,
    catalog: MetadataCatalog,
}

impl Store {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.db");
        common::write_store(&path, &common::rows());
        Self {
            conn: Connection::open(&path).unwrap(),
            _dir: dir,
            catalog: common::catalog(),
        }
    }

    /// Ids of the rows a predicate matches.
    fn matching(&self, predicate: &Predicate) -> Vec<i64> {
        let compiled = predicate.to_fragment().compile(Dialect::Sqlite);
        let sql = format!("SELECT id FROM data WHERE {} ORDER BY id", compiled.sql);
        let mut stmt = self.conn.prepare(&sql).unwrap();
        let ids = stmt
            .query_map(rusqlite::params_from_iter(compiled.params.iter()), |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<i64>, _>>()
            .unwrap();
        ids
    }
}

fn ids_where(f: impl Fn(&common::RowSpec) -> bool) -> Vec<i64> {
    common::rows().iter().filter(|r| f(r)).map(|r| r.id).collect()
}

fn eq(value: &str) -> FacetCriteria {
    FacetCriteria {
        eq: Some(value.into()),
        ..Default::default()
    }
}

fn list(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

// ============================================================================
// Filters
// ============================================================================

#[test]
fn test_filter_eq() {
    let store = Store::new();
    let mut state = QueryState::new();
    let p = FilterParser::new(&store.catalog).parse(&eq("fo-total"), "filters", &mut state);
    assert_eq!(store.matching(&p), ids_where(|r| r.school_type == 13));
}

#[test]
fn test_filter_in_spans_filters() {
    let store = Store::new();
    let mut state = QueryState::new();
    let criteria = FacetCriteria {
        in_: Some(list(&["fo-secondary", "fo-y2"])),
        ..Default::default()
    };
    let p = FilterParser::new(&store.catalog).parse(&criteria, "filters", &mut state);
    assert_eq!(
        store.matching(&p),
        ids_where(|r| r.school_type == 12 || r.ncyear == 22)
    );
}

#[test]
fn test_filter_not_in_excludes_each_filter() {
    let store = Store::new();
    let mut state = QueryState::new();
    let criteria = FacetCriteria {
        not_in: Some(list(&["fo-primary", "fo-y2"])),
        ..Default::default()
    };
    let p = FilterParser::new(&store.catalog).parse(&criteria, "filters", &mut state);
    assert_eq!(store.matching(&p), ids_where(|r| r.school_type == 12));
}

// ============================================================================
// Locations
// ============================================================================

#[test]
fn test_location_eq_by_each_property() {
    let store = Store::new();
    let parser = LocationParser::new(&store.catalog);
    let expected = ids_where(|r| r.reg == Some(202));
    for selector in ["REG|id|loc-ne", "REG|code|E12000001"] {
        let mut state = QueryState::new();
        let p = parser.parse(&eq(selector), "locations", &mut state);
        assert_eq!(store.matching(&p), expected, "selector {}", selector);
    }
}

#[test]
fn test_location_not_eq_keeps_rows_without_that_level() {
    let store = Store::new();
    let mut state = QueryState::new();
    let criteria = FacetCriteria {
        not_eq: Some("REG|code|E12000003".into()),
        ..Default::default()
    };
    let p = LocationParser::new(&store.catalog).parse(&criteria, "locations", &mut state);
    let matched = store.matching(&p);
    assert_eq!(matched, ids_where(|r| r.reg != Some(201)));
    assert_eq!(matched.len(), 18, "national rows must survive the negation");
}

#[test]
fn test_location_not_in_is_null_safe() {
    let store = Store::new();
    let mut state = QueryState::new();
    let criteria = FacetCriteria {
        not_in: Some(list(&["REG|id|loc-yorks", "REG|id|loc-ne", "REG|id|loc-nowhere"])),
        ..Default::default()
    };
    let p = LocationParser::new(&store.catalog).parse(&criteria, "locations", &mut state);
    assert_eq!(store.matching(&p), ids_where(|r| r.reg.is_none()));
    assert_eq!(state.warnings().len(), 1);
    assert_eq!(state.warnings()[0].code, WarningCode::LocationsNotFound);
    assert_eq!(
        state.warnings()[0].detail.as_ref().unwrap().items,
        vec!["REG|id|loc-nowhere"]
    );
}

// ============================================================================
// Geographic levels and time periods
// ============================================================================

#[test]
fn test_geographic_level_in() {
    let store = Store::new();
    let mut state = QueryState::new();
    let criteria = FacetCriteria {
        in_: Some(list(&["NAT"])),
        ..Default::default()
    };
    let p = GeographicLevelParser::new(&store.catalog).parse(&criteria, "geographicLevels", &mut state);
    assert_eq!(store.matching(&p), ids_where(|r| r.level == "NAT"));
}

#[test]
fn test_time_period_range_is_chronological() {
    let store = Store::new();
    let mut state = QueryState::new();
    let criteria = TimePeriodCriteria {
        lte: Some("2020/21|AY".into()),
        ..Default::default()
    };
    let p = TimePeriodParser::new(&store.catalog).parse_periods(&criteria, "timePeriods", &mut state);
    // 2019/2020 is stored as 2 and 2020/2021 as 1.
    assert_eq!(
        store.matching(&p),
        ids_where(|r| r.time_period == 1 || r.time_period == 2)
    );
    assert!(state.warnings().is_empty());
}

#[test]
fn test_time_period_equality_and_range_combine() {
    let store = Store::new();
    let mut state = QueryState::new();
    let criteria = TimePeriodCriteria {
        not_eq: Some("2021/2022|AY".into()),
        gt: Some("2019|AY".into()),
        ..Default::default()
    };
    let p = TimePeriodParser::new(&store.catalog).parse_periods(&criteria, "timePeriods", &mut state);
    assert_eq!(store.matching(&p), ids_where(|r| r.time_period == 1));
}
