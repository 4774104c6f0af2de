//! The query service: request in, page of rows (or CSV stream) out.
//!
//! ```text
//! execute ──► resolve version ──► catalog (cached)
//!                                   │
//!         ┌─────────────────────────┘
//!         ▼
//!   indicators ─► criteria ─► sorts ─► count + page SQL ─► executor
//! ```

use std::sync::Arc;

use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};
use uuid::Uuid;

use crate::catalog::{CatalogCache, CatalogSource, FileCatalogSource, MetadataCatalog};
use crate::config::{QuerySettings, Settings, SettingsError};
use crate::error::{QueryError, QueryResult};
use crate::model::{
    DataSetQueryRequest, DataSetVersion, Page, PagingInfo, SelectorError, VersionNumber,
    VersionSelector,
};
use crate::render::{CsvRenderer, GzipCsvWriter, JsonRenderer, QueryResponse};
use crate::sql::{
    ColumnRef, CompareOp, CompiledSql, FixedColumn, OrderByExpr, OrderKey, Predicate, Query, SqlValue,
};
use crate::versions::{
    diff, FileVersionRepository, VersionChangeSet, VersionRepository, VersionResolver,
};

use super::composer::CriteriaComposer;
use super::executor::{ExecutorError, QueryExecutor, SqliteExecutor};
use super::projection::{DataRow, Projection};
use super::sort::SortResolver;
use super::state::{ErrorCode, QueryState, Warning, WarningCode};

/// Alias of the count column.
const COUNT_ALIAS: &str = "total";

/// One data query.
#[derive(Debug, Clone)]
pub struct DataQuery {
    pub data_set_id: Uuid,
    pub version: VersionSelector,
    pub request: DataSetQueryRequest,
    /// 1-based.
    pub page: u32,
    /// Falls back to the configured default.
    pub page_size: Option<u32>,
    /// Path prefix for criteria errors and warnings.
    pub criteria_root: &'static str,
}

impl DataQuery {
    pub fn new(data_set_id: Uuid, request: DataSetQueryRequest) -> Self {
        Self {
            data_set_id,
            version: VersionSelector::Latest,
            request,
            page: 1,
            page_size: None,
            criteria_root: super::composer::BODY_ROOT,
        }
    }

    pub fn version(mut self, version: VersionSelector) -> Self {
        self.version = version;
        self
    }

    pub fn page(mut self, page: u32, page_size: Option<u32>) -> Self {
        self.page = page;
        self.page_size = page_size;
        self
    }

    pub fn criteria_root(mut self, root: &'static str) -> Self {
        self.criteria_root = root;
        self
    }
}

/// A query compiled against one version, ready to run.
#[derive(Debug, Clone)]
pub struct QueryPlan {
    pub version: DataSetVersion,
    pub catalog: Arc<MetadataCatalog>,
    pub projection: Projection,
    pub count: CompiledSql,
    pub page: CompiledSql,
    pub page_number: u32,
    pub page_size: u32,
    pub warnings: Vec<Warning>,
}

/// One page of results, still in surrogate keys.
#[derive(Debug, Clone)]
pub struct QueryPage {
    pub version: DataSetVersion,
    pub catalog: Arc<MetadataCatalog>,
    pub projection: Projection,
    pub rows: Vec<DataRow>,
    pub paging: PagingInfo,
    pub warnings: Vec<Warning>,
}

impl QueryPage {
    pub fn to_response(&self) -> QueryResult<QueryResponse> {
        Ok(QueryResponse {
            paging: self.paging,
            results: JsonRenderer::new(&self.catalog).rows(&self.rows)?,
            warnings: self.warnings.clone(),
        })
    }
}

/// A CSV export in progress.
pub struct CsvExport {
    pub version: DataSetVersion,
    /// Gzip-compressed CSV chunks.
    pub chunks: BoxStream<'static, QueryResult<Bytes>>,
}

impl std::fmt::Debug for CsvExport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsvExport")
            .field("version", &self.version.version)
            .finish_non_exhaustive()
    }
}

/// Resolves versions, compiles criteria and runs queries.
#[derive(Clone)]
pub struct QueryService {
    versions: VersionResolver,
    catalogs: Arc<CatalogCache>,
    executor: Arc<dyn QueryExecutor>,
    settings: QuerySettings,
}

impl QueryService {
    pub fn new(
        repository: Arc<dyn VersionRepository>,
        source: Arc<dyn CatalogSource>,
        executor: Arc<dyn QueryExecutor>,
        settings: QuerySettings,
    ) -> Self {
        Self {
            versions: VersionResolver::new(repository),
            catalogs: Arc::new(CatalogCache::with_capacity(source, settings.catalog_cache_size)),
            executor,
            settings,
        }
    }

    /// Files under `storage.root`, queried through SQLite.
    pub fn from_settings(settings: &Settings) -> Result<Self, SettingsError> {
        let root = settings.storage.resolved_root()?;
        Ok(Self::new(
            Arc::new(FileVersionRepository::new(root)),
            Arc::new(FileCatalogSource),
            Arc::new(SqliteExecutor),
            settings.query.clone(),
        ))
    }

    pub fn settings(&self) -> &QuerySettings {
        &self.settings
    }

    pub fn versions(&self) -> &VersionResolver {
        &self.versions
    }

    /// The version a selector names, with its catalog.
    pub async fn metadata(
        &self,
        data_set_id: Uuid,
        selector: &VersionSelector,
    ) -> QueryResult<(DataSetVersion, Arc<MetadataCatalog>)> {
        let version = self.versions.resolve(data_set_id, selector).await?;
        let catalog = self.catalogs.get(&version).await?;
        Ok((version, catalog))
    }

    /// Compile a query without running it.
    pub async fn plan(&self, query: &DataQuery) -> QueryResult<QueryPlan> {
        let mut state = QueryState::new();
        let page_size = self.check_paging(query.page, query.page_size, &mut state);

        let (version, catalog) = self.metadata(query.data_set_id, &query.version).await?;

        let indicators = resolve_indicators(&catalog, &query.request.indicators, &mut state);
        let criteria = query.request.criteria.clone().unwrap_or_default();
        let filter = CriteriaComposer::new(&catalog).compose(&criteria, query.criteria_root, &mut state);
        let sorts: Vec<String> = query.request.sorts.iter().map(|s| s.as_selector()).collect();
        let order = SortResolver::new(&catalog).resolve(&sorts, &mut state);

        let (warnings, errors) = state.into_parts();
        if !errors.is_empty() {
            tracing::debug!(
                data_set_id = %query.data_set_id,
                errors = errors.len(),
                "query rejected"
            );
            return Err(QueryError::Validation(errors));
        }

        let projection = Projection::new(&catalog, &indicators);
        let dialect = self.executor.dialect();
        let count = Query::new()
            .select_count(COUNT_ALIAS)
            .filter(filter.clone())
            .compile(dialect);
        let offset = PagingInfo::new(query.page, page_size, 0).offset();
        let page = Query::new()
            .select(projection.column_refs())
            .filter(filter)
            .order_by(order)
            .limit(u64::from(page_size))
            .offset(offset)
            .compile(dialect);

        tracing::debug!(
            data_set_id = %query.data_set_id,
            version = %version.version,
            warnings = warnings.len(),
            sql = %page.sql,
            "compiled query"
        );

        Ok(QueryPlan {
            version,
            catalog,
            projection,
            count,
            page,
            page_number: query.page,
            page_size,
            warnings,
        })
    }

    /// Run a query and return one page of rows.
    pub async fn execute(&self, query: &DataQuery) -> QueryResult<QueryPage> {
        let plan = self.plan(query).await?;
        let QueryPlan {
            version,
            catalog,
            projection,
            count,
            page,
            page_number,
            page_size,
            mut warnings,
        } = plan;

        let limit = self.settings.timeout();
        let work = async {
            futures::try_join!(
                self.executor.count(&version, count),
                self.executor.fetch(&version, page)
            )
        };
        let (total, rows) = tokio::time::timeout(limit, work)
            .await
            .map_err(|_| QueryError::Timeout(self.settings.timeout_seconds))??;

        if total == 0 {
            warnings.push(Warning {
                code: WarningCode::QueryNoResults,
                message: "The query returned no results".to_string(),
                path: String::new(),
                detail: None,
            });
        }

        tracing::info!(
            data_set_id = %query.data_set_id,
            version = %version.version,
            total,
            rows = rows.len(),
            "query executed"
        );

        let rows = rows.into_iter().map(|row| projection.decode(row)).collect();
        Ok(QueryPage {
            paging: PagingInfo::new(page_number, page_size, total),
            version,
            catalog,
            projection,
            rows,
            warnings,
        })
    }

    /// Stream every row of a version as gzip-compressed CSV, ordered by row
    /// id and fetched in batches. Each batch resumes after the last id of the
    /// one before, so the store never skips over rows already sent.
    pub async fn export_csv(
        &self,
        data_set_id: Uuid,
        selector: &VersionSelector,
    ) -> QueryResult<CsvExport> {
        let (version, catalog) = self.metadata(data_set_id, selector).await?;
        tracing::info!(data_set_id = %data_set_id, version = %version.version, "exporting csv");

        let export = ExportState {
            executor: Arc::clone(&self.executor),
            version: version.clone(),
            projection: Projection::all(&catalog),
            catalog,
            writer: Some(GzipCsvWriter::new()),
            after_id: None,
            exported: 0,
            batch_size: self.settings.csv_batch_size.max(1),
            timeout_seconds: self.settings.timeout_seconds,
        };
        let chunks = stream::try_unfold(export, |mut export| async move {
            match export.next_chunk().await? {
                Some(chunk) => Ok(Some((chunk, export))),
                None => Ok(None),
            }
        })
        .boxed();

        Ok(CsvExport { version, chunks })
    }

    /// Non-draft versions, newest first.
    pub async fn list_versions(
        &self,
        data_set_id: Uuid,
        page: u32,
        page_size: Option<u32>,
    ) -> QueryResult<Page<DataSetVersion>> {
        let mut state = QueryState::new();
        let page_size = self.check_paging(page, page_size, &mut state);
        let (_, errors) = state.into_parts();
        if !errors.is_empty() {
            return Err(QueryError::Validation(errors));
        }
        self.versions.list(data_set_id, page, page_size).await
    }

    /// What changed in `version` relative to the version before it. The
    /// first version has no predecessor and an empty change set.
    pub async fn changes(&self, data_set_id: Uuid, version: &str) -> QueryResult<VersionChangeSet> {
        let number: VersionNumber = version
            .parse()
            .map_err(|e: SelectorError| {
                QueryError::invalid(ErrorCode::InvalidVersion, "version", e.to_string())
            })?;
        let (current, previous) = self.versions.with_predecessor(data_set_id, number).await?;
        let Some(previous) = previous else {
            return Ok(VersionChangeSet::initial(current.version));
        };
        self.diff_versions(&previous, &current).await
    }

    /// What changed between two consecutive versions.
    pub async fn diff(
        &self,
        data_set_id: Uuid,
        previous: VersionNumber,
        next: VersionNumber,
    ) -> QueryResult<VersionChangeSet> {
        let (previous, next) = self
            .versions
            .consecutive_pair(data_set_id, previous, next)
            .await?;
        self.diff_versions(&previous, &next).await
    }

    async fn diff_versions(
        &self,
        previous: &DataSetVersion,
        current: &DataSetVersion,
    ) -> QueryResult<VersionChangeSet> {
        let (before, after) =
            futures::try_join!(self.catalogs.get(previous), self.catalogs.get(current))?;
        Ok(diff(previous.version, &before, current.version, &after))
    }

    /// Validate paging, returning the effective page size.
    fn check_paging(&self, page: u32, page_size: Option<u32>, state: &mut QueryState) -> u32 {
        if page < 1 {
            state.error(ErrorCode::InvalidPage, "page", "page must be at least 1");
        }
        let page_size = page_size.unwrap_or(self.settings.default_page_size);
        if page_size < 1 || page_size > self.settings.max_page_size {
            state.error(
                ErrorCode::InvalidPageSize,
                "pageSize",
                format!("pageSize must be between 1 and {}", self.settings.max_page_size),
            );
        }
        page_size
    }
}

/// Indicator positions for the requested ids; all indicators when none are
/// requested.
fn resolve_indicators(
    catalog: &MetadataCatalog,
    requested: &[String],
    state: &mut QueryState,
) -> Vec<usize> {
    if requested.is_empty() {
        return (0..catalog.indicators().len()).collect();
    }

    let mut positions = Vec::with_capacity(requested.len());
    let mut missing = Vec::new();
    for id in requested {
        match catalog.indicator_position(id) {
            Some(i) if !positions.contains(&i) => positions.push(i),
            Some(_) => {}
            None => missing.push(id.as_str()),
        }
    }
    if !missing.is_empty() {
        state.error(
            ErrorCode::IndicatorsNotFound,
            "indicators",
            format!("indicators not found: {}", missing.join(", ")),
        );
    }
    positions
}

/// One export batch: the row id followed by every projected column, for up
/// to `batch_size` rows with ids above `after_id`.
fn export_batch(projection: &Projection, after_id: Option<i64>, batch_size: u32) -> Query {
    let columns = std::iter::once(ColumnRef::from(FixedColumn::Id)).chain(projection.column_refs());
    let query = Query::new()
        .select(columns)
        .order_by(vec![OrderByExpr::asc(OrderKey::Column(FixedColumn::Id.into()))])
        .limit(u64::from(batch_size));
    match after_id {
        Some(id) => query.filter(Predicate::compare(FixedColumn::Id, CompareOp::Gt, id).to_fragment()),
        None => query,
    }
}

/// State threaded through the CSV export stream.
struct ExportState {
    executor: Arc<dyn QueryExecutor>,
    version: DataSetVersion,
    catalog: Arc<MetadataCatalog>,
    projection: Projection,
    /// `None` once the gzip stream is finished.
    writer: Option<GzipCsvWriter>,
    /// Id of the last row sent; `None` before the first batch.
    after_id: Option<i64>,
    exported: u64,
    batch_size: u32,
    timeout_seconds: u64,
}

impl ExportState {
    async fn next_chunk(&mut self) -> QueryResult<Option<Bytes>> {
        let Some(writer) = self.writer.as_mut() else {
            return Ok(None);
        };

        let sql = export_batch(&self.projection, self.after_id, self.batch_size)
            .compile(self.executor.dialect());

        let limit = std::time::Duration::from_secs(self.timeout_seconds);
        let rows = tokio::time::timeout(limit, self.executor.fetch(&self.version, sql))
            .await
            .map_err(|_| QueryError::Timeout(self.timeout_seconds))??;

        let fetched = rows.len();
        let mut decoded: Vec<DataRow> = Vec::with_capacity(fetched);
        for mut row in rows {
            match row.first() {
                Some(SqlValue::Int(id)) => self.after_id = Some(*id),
                _ => return Err(ExecutorError::InvalidRowId.into()),
            }
            row.remove(0);
            decoded.push(self.projection.decode(row));
        }
        let batch = CsvRenderer::new(&self.catalog, &self.projection).record_batch(&decoded)?;
        let mut chunk = writer.write_batch(&batch)?.to_vec();
        self.exported += fetched as u64;
        tracing::trace!(rows = fetched, exported = self.exported, "csv batch");

        if fetched < self.batch_size as usize {
            if let Some(writer) = self.writer.take() {
                chunk.extend_from_slice(&writer.finish()?);
            }
        }
        Ok(Some(Bytes::from(chunk)))
    }
}
