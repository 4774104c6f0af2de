//! Change sets between consecutive versions, loaded from disk.

#[path = "../common/mod.rs"]
mod common;

use dataquery::model::VersionNumber;
use dataquery::query::ErrorCode;
use dataquery::versions::ChangeKind;
use dataquery::QueryError;

#[tokio::test]
async fn test_changes_since_previous_version() {
    let fixture = common::Fixture::new();
    let changes = fixture
        .service()
        .changes(common::data_set_id(), "1.1")
        .await
        .unwrap();

    assert_eq!(changes.previous_version, Some(VersionNumber::new(1, 0)));
    assert_eq!(changes.version, VersionNumber::new(1, 1));
    assert!(changes.filters.is_empty());
    assert!(changes.indicators.is_empty());
    assert!(changes.geographic_levels.is_empty());

    let options: Vec<(ChangeKind, &str, &str)> = changes
        .filter_options
        .iter()
        .map(|c| {
            let state = c.current_state.as_ref().unwrap();
            (c.kind(), state.id.as_str(), state.label.as_str())
        })
        .collect();
    assert_eq!(
        options,
        vec![
            (ChangeKind::Updated, "fo-primary", "Primary"),
            (ChangeKind::Added, "fo-y3", "Year 3"),
        ]
    );
    assert_eq!(
        changes.filter_options[0].previous_state.as_ref().unwrap().label,
        "State-funded primary"
    );

    assert_eq!(changes.time_periods.len(), 1);
    let added = changes.time_periods[0].current_state.as_ref().unwrap();
    assert_eq!(added.period, "2022/2023");
    assert_eq!(added.code, "AY");
}

#[tokio::test]
async fn test_first_version_has_no_changes() {
    let fixture = common::Fixture::new();
    let changes = fixture
        .service()
        .changes(common::data_set_id(), "v1.0")
        .await
        .unwrap();
    assert_eq!(changes.previous_version, None);
    assert!(changes.is_empty());

    let json = serde_json::to_value(&changes).unwrap();
    assert!(json.get("previousVersion").is_none());
    assert_eq!(json["version"], "1.0");
}

#[tokio::test]
async fn test_unchanged_catalog() {
    let fixture = common::Fixture::new();
    let changes = fixture
        .service()
        .changes(common::data_set_id(), "2.0")
        .await
        .unwrap();
    assert_eq!(changes.previous_version, Some(VersionNumber::new(1, 1)));
    assert!(changes.is_empty());
}

#[tokio::test]
async fn test_draft_and_malformed_versions() {
    let fixture = common::Fixture::new();
    let service = fixture.service();

    let err = service.changes(common::data_set_id(), "2.1").await.unwrap_err();
    assert!(matches!(err, QueryError::VersionNotFound { .. }));

    match service.changes(common::data_set_id(), "two").await {
        Err(QueryError::Validation(errors)) => {
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].code, ErrorCode::InvalidVersion);
            assert_eq!(errors[0].path, "version");
        }
        other => panic!("expected validation error, got {:?}", other.map(|c| c.version)),
    }
}

#[tokio::test]
async fn test_diff_requires_consecutive_versions() {
    let fixture = common::Fixture::new();
    let service = fixture.service();

    let changes = service
        .diff(
            common::data_set_id(),
            VersionNumber::new(1, 0),
            VersionNumber::new(1, 1),
        )
        .await
        .unwrap();
    assert_eq!(changes.filter_options.len(), 2);

    let err = service
        .diff(
            common::data_set_id(),
            VersionNumber::new(1, 0),
            VersionNumber::new(2, 0),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, QueryError::InvalidVersionComparison(_)));
}
