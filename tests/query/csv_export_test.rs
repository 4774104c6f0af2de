//! Full-version CSV export: batched, gzip-compressed, labelled.

#[path = "../common/mod.rs"]
mod common;

use std::io::Read;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use dataquery::catalog::FileCatalogSource;
use dataquery::config::QuerySettings;
use dataquery::model::{DataSetVersion, VersionSelector};
use dataquery::query::{CsvExport, ExecutorResult, QueryExecutor, QueryService, Row, SqliteExecutor};
use dataquery::sql::{CompiledSql, Dialect, SqlValue};
use dataquery::versions::FileVersionRepository;
use dataquery::QueryError;
use flate2::read::GzDecoder;
use futures::StreamExt;

const HEADER: &str = "Time period,Time identifier,Geographic level,National,Regional,\
School type,National curriculum year,Authorised absence rate,Number of enrolments";

async fn collect(export: CsvExport) -> Vec<Bytes> {
    let mut chunks = Vec::new();
    let mut stream = export.chunks;
    while let Some(chunk) = stream.next().await {
        chunks.push(chunk.unwrap());
    }
    chunks
}

fn gunzip(chunks: &[Bytes]) -> String {
    let compressed: Vec<u8> = chunks.iter().flat_map(|c| c.iter().copied()).collect();
    let mut csv = String::new();
    GzDecoder::new(compressed.as_slice())
        .read_to_string(&mut csv)
        .unwrap();
    csv
}

fn service_with_batch(fixture: &common::Fixture, csv_batch_size: u32) -> QueryService {
    fixture.service_with(QuerySettings {
        csv_batch_size,
        ..QuerySettings::default()
    })
}

#[tokio::test]
async fn test_export_latest_version() {
    let fixture = common::Fixture::new();
    let export = fixture
        .service()
        .export_csv(common::data_set_id(), &VersionSelector::Latest)
        .await
        .unwrap();
    assert_eq!(export.version.version.to_string(), "2.0");

    let csv = gunzip(&collect(export).await);
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 28);
    assert_eq!(lines[0], HEADER);
    assert_eq!(
        lines[1],
        "2020/2021,Academic year,National,England,,Primary,Year 1,0.5,100"
    );
    assert_eq!(
        lines[9],
        "2020/2021,Academic year,Regional,England,North East,Total,Year 2,,900"
    );
    assert_eq!(
        lines[27],
        "2021/2022,Academic year,Regional,England,North East,Total,Year 2,,2700"
    );
}

#[tokio::test]
async fn test_export_has_no_internal_identifiers() {
    let fixture = common::Fixture::new();
    let export = fixture
        .service()
        .export_csv(common::data_set_id(), &VersionSelector::Latest)
        .await
        .unwrap();
    let csv = gunzip(&collect(export).await);
    for internal in ["fo-", "loc-", "school_type", "locations_", "time_period_id"] {
        assert!(!csv.contains(internal), "found {} in export", internal);
    }
}

#[tokio::test]
async fn test_batches_stream_one_gzip_member() {
    let fixture = common::Fixture::new();

    let export = service_with_batch(&fixture, 10)
        .export_csv(common::data_set_id(), &VersionSelector::Latest)
        .await
        .unwrap();
    let chunks = collect(export).await;
    // 10 + 10 + 7 rows; the short batch closes the stream.
    assert_eq!(chunks.len(), 3);
    let batched = gunzip(&chunks);

    let export = fixture
        .service()
        .export_csv(common::data_set_id(), &VersionSelector::Latest)
        .await
        .unwrap();
    assert_eq!(batched, gunzip(&collect(export).await));
    assert_eq!(batched.matches(HEADER).count(), 1);
}

#[tokio::test]
async fn test_exact_batch_multiple_ends_with_empty_batch() {
    let fixture = common::Fixture::new();
    let export = service_with_batch(&fixture, 9)
        .export_csv(common::data_set_id(), &VersionSelector::Latest)
        .await
        .unwrap();
    let chunks = collect(export).await;
    assert_eq!(chunks.len(), 4);
    assert_eq!(gunzip(&chunks).lines().count(), 28);
}

/// Runs statements against the store and keeps each one it was given.
#[derive(Default)]
struct RecordingExecutor {
    statements: Mutex<Vec<CompiledSql>>,
}

#[async_trait]
impl QueryExecutor for RecordingExecutor {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    async fn fetch(&self, version: &DataSetVersion, sql: CompiledSql) -> ExecutorResult<Vec<Row>> {
        self.statements.lock().unwrap().push(sql.clone());
        SqliteExecutor.fetch(version, sql).await
    }
}

#[tokio::test]
async fn test_batches_resume_after_last_id() {
    let fixture = common::Fixture::new();
    let executor = Arc::new(RecordingExecutor::default());
    let service = QueryService::new(
        Arc::new(FileVersionRepository::new(fixture.root())),
        Arc::new(FileCatalogSource),
        executor.clone(),
        QuerySettings {
            csv_batch_size: 10,
            ..QuerySettings::default()
        },
    );
    let export = service
        .export_csv(common::data_set_id(), &VersionSelector::Latest)
        .await
        .unwrap();
    assert_eq!(gunzip(&collect(export).await).lines().count(), 28);

    let statements = executor.statements.lock().unwrap();
    assert_eq!(statements.len(), 3);
    assert!(!statements[0].sql.contains("WHERE"));
    assert!(statements[0].params.is_empty());
    for (statement, after) in statements[1..].iter().zip([10, 20]) {
        assert!(statement.sql.contains("WHERE \"id\" > ?1"), "{}", statement.sql);
        assert_eq!(statement.params, vec![SqlValue::Int(after)]);
    }
    for statement in statements.iter() {
        assert!(!statement.sql.contains("OFFSET"), "{}", statement.sql);
        assert!(statement.sql.ends_with("ORDER BY \"id\" ASC\nLIMIT 10"), "{}", statement.sql);
    }
}

#[tokio::test]
async fn test_export_older_version_uses_its_labels() {
    let fixture = common::Fixture::new();
    let selector = VersionSelector::parse_optional(Some("1.0")).unwrap();
    let export = fixture
        .service()
        .export_csv(common::data_set_id(), &selector)
        .await
        .unwrap();
    let csv = gunzip(&collect(export).await);
    assert!(csv.lines().nth(1).unwrap().contains(",State-funded primary,"));
}

#[tokio::test]
async fn test_export_unknown_version() {
    let fixture = common::Fixture::new();
    let selector = VersionSelector::parse_optional(Some("9.0")).unwrap();
    let result = fixture
        .service()
        .export_csv(common::data_set_id(), &selector)
        .await;
    assert!(matches!(result, Err(QueryError::VersionNotFound { .. })));
}
