//! Version resolution against a data set recorded on disk.

#[path = "../common/mod.rs"]
mod common;

use std::sync::Arc;

use dataquery::model::{
    DataSet, DataSetVersion, VersionFiles, VersionNumber, VersionSelector, VersionStatus,
};
use dataquery::versions::{FileVersionRepository, InMemoryVersionRepository, VersionResolver};
use dataquery::QueryError;
use uuid::Uuid;

fn resolver(fixture: &common::Fixture) -> VersionResolver {
    VersionResolver::new(Arc::new(FileVersionRepository::new(fixture.root())))
}

async fn resolve(resolver: &VersionResolver, selector: &str) -> Result<VersionNumber, QueryError> {
    let selector = VersionSelector::parse_optional(Some(selector)).unwrap();
    resolver
        .resolve(common::data_set_id(), &selector)
        .await
        .map(|v| v.version)
}

// ============================================================================
// Selectors
// ============================================================================

#[tokio::test]
async fn test_latest_skips_draft() {
    let fixture = common::Fixture::new();
    let resolver = resolver(&fixture);
    assert_eq!(resolve(&resolver, "*").await.unwrap(), VersionNumber::new(2, 0));
    assert_eq!(resolve(&resolver, "").await.unwrap(), VersionNumber::new(2, 0));
}

#[tokio::test]
async fn test_wildcard_minor() {
    let fixture = common::Fixture::new();
    let resolver = resolver(&fixture);
    assert_eq!(resolve(&resolver, "2.*").await.unwrap(), VersionNumber::new(2, 0));
    assert_eq!(resolve(&resolver, "v1.*").await.unwrap(), VersionNumber::new(1, 1));
    assert!(matches!(
        resolve(&resolver, "3.*").await,
        Err(QueryError::VersionNotFound { .. })
    ));
}

#[tokio::test]
async fn test_exact_versions() {
    let fixture = common::Fixture::new();
    let resolver = resolver(&fixture);
    // Deprecated versions stay queryable by number.
    assert_eq!(resolve(&resolver, "1.0").await.unwrap(), VersionNumber::new(1, 0));
    assert_eq!(resolve(&resolver, "v1.1").await.unwrap(), VersionNumber::new(1, 1));

    match resolve(&resolver, "2.1").await {
        Err(QueryError::VersionNotFound { data_set_id, selector }) => {
            assert_eq!(data_set_id, common::data_set_id());
            assert_eq!(selector, "2.1");
        }
        other => panic!("expected VersionNotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn test_resolved_version_points_at_its_files() {
    let fixture = common::Fixture::new();
    let version = resolver(&fixture)
        .resolve(common::data_set_id(), &VersionSelector::Latest)
        .await
        .unwrap();
    let dir = fixture.root().join(common::DATA_SET_ID).join("v2.0");
    assert_eq!(version.files.store, dir.join("data.db"));
    assert_eq!(version.files.metadata, dir.join("metadata.json"));
    assert!(version.published.is_some());
}

#[tokio::test]
async fn test_unknown_data_set() {
    let fixture = common::Fixture::new();
    let id = Uuid::new_v4();
    let err = resolver(&fixture)
        .resolve(id, &VersionSelector::Latest)
        .await
        .unwrap_err();
    assert!(matches!(err, QueryError::DataSetNotFound(found) if found == id));
}

// ============================================================================
// Listing
// ============================================================================

#[tokio::test]
async fn test_list_newest_first_without_drafts() {
    let fixture = common::Fixture::new();
    let page = fixture
        .service()
        .list_versions(common::data_set_id(), 1, None)
        .await
        .unwrap();
    let versions: Vec<String> = page.results.iter().map(|v| v.version.to_string()).collect();
    assert_eq!(versions, vec!["2.0", "1.1", "1.0"]);
    assert_eq!(page.paging.total_results, 3);
}

#[tokio::test]
async fn test_list_pages() {
    let fixture = common::Fixture::new();
    let service = fixture.service();
    let page = service
        .list_versions(common::data_set_id(), 2, Some(2))
        .await
        .unwrap();
    assert_eq!(page.paging.total_pages, 2);
    assert_eq!(page.results.len(), 1);
    assert_eq!(page.results[0].version, VersionNumber::new(1, 0));

    let err = service
        .list_versions(common::data_set_id(), 0, Some(2))
        .await
        .unwrap_err();
    assert!(matches!(err, QueryError::Validation(_)));
}

// ============================================================================
// In-memory repository
// ============================================================================

#[tokio::test]
async fn test_in_memory_repository() {
    let id = Uuid::new_v4();
    let version = |major, minor, status| DataSetVersion {
        data_set_id: Uuid::nil(),
        version: VersionNumber::new(major, minor),
        status,
        published: None,
        notes: None,
        files: VersionFiles::default(),
    };
    let mut repo = InMemoryVersionRepository::new();
    repo.insert(DataSet {
        id,
        title: "Exclusions".into(),
        summary: None,
        versions: vec![
            version(1, 0, VersionStatus::Withdrawn),
            version(1, 1, VersionStatus::Published),
            version(1, 2, VersionStatus::Draft),
        ],
    });

    let resolver = VersionResolver::new(Arc::new(repo));
    let latest = resolver.resolve(id, &VersionSelector::Latest).await.unwrap();
    assert_eq!(latest.version, VersionNumber::new(1, 1));
    assert_eq!(latest.data_set_id, id);
}
