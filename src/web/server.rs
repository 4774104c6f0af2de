//! Axum router for the public data-set API.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::config::Settings;
use crate::model::{DataSetQueryRequest, DataSetVersion, Page, VersionNumber};
use crate::query::{DataQuery, QueryService, BODY_ROOT, QUERY_STRING_ROOT};
use crate::render::{JsonRenderer, MetaView, QueryResponse};
use crate::versions::VersionChangeSet;

use super::error::{ApiError, ApiResult};
use super::params::{version_selector, DataSetGetQuery, PagingQuery, VersionQuery};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: QueryService,
}

/// Build the axum router with all routes.
pub fn router(service: QueryService) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/v1/data-sets/{id}/query", get(query_get).post(query_post))
        .route("/v1/data-sets/{id}/csv", get(download_csv))
        .route("/v1/data-sets/{id}/meta", get(metadata))
        .route("/v1/data-sets/{id}/versions", get(list_versions))
        .route("/v1/data-sets/{id}/versions/{version}/changes", get(changes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::new(AppState { service }))
}

/// Bind `server.bind` and serve until Ctrl+C.
pub async fn serve(settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    let service = QueryService::from_settings(settings)?;
    let app = router(service);

    let listener = tokio::net::TcpListener::bind(&settings.server.bind).await?;
    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("shutting down");
            }
        })
        .await?;
    Ok(())
}

type SharedState = State<Arc<AppState>>;

fn data_set_id(path: Result<Path<Uuid>, PathRejection>) -> ApiResult<Uuid> {
    path.map(|Path(id)| id)
        .map_err(|e| ApiError::not_found(format!("data set not found: {}", e.body_text())))
}

fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> ApiResult<T> {
    query
        .map(|Query(params)| params)
        .map_err(|e| ApiError::bad_request(e.body_text()))
}

/// GET /v1/data-sets/{id}/query
async fn query_get(
    State(state): SharedState,
    path: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<DataSetGetQuery>, QueryRejection>,
) -> ApiResult<Json<QueryResponse>> {
    let id = data_set_id(path)?;
    let params = query_params(query)?;
    let query = DataQuery::new(id, params.to_request())
        .version(version_selector(params.data_set_version.as_deref())?)
        .page(params.page.unwrap_or(1), params.page_size)
        .criteria_root(QUERY_STRING_ROOT);
    run_query(&state.service, &query).await
}

/// POST /v1/data-sets/{id}/query
async fn query_post(
    State(state): SharedState,
    path: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<PagingQuery>, QueryRejection>,
    body: Result<Json<DataSetQueryRequest>, JsonRejection>,
) -> ApiResult<Json<QueryResponse>> {
    let id = data_set_id(path)?;
    let params = query_params(query)?;
    let Json(request) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let query = DataQuery::new(id, request)
        .version(version_selector(params.data_set_version.as_deref())?)
        .page(params.page.unwrap_or(1), params.page_size)
        .criteria_root(BODY_ROOT);
    run_query(&state.service, &query).await
}

async fn run_query(service: &QueryService, query: &DataQuery) -> ApiResult<Json<QueryResponse>> {
    let page = service.execute(query).await?;
    Ok(Json(page.to_response()?))
}

/// GET /v1/data-sets/{id}/csv
async fn download_csv(
    State(state): SharedState,
    path: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<VersionQuery>, QueryRejection>,
) -> ApiResult<Response> {
    let id = data_set_id(path)?;
    let params = query_params(query)?;
    let selector = version_selector(params.data_set_version.as_deref())?;
    let export = state.service.export_csv(id, &selector).await?;

    let filename = format!("attachment; filename=\"{}_v{}.csv\"", id, export.version.version);
    let mut response = Body::from_stream(export.chunks).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/csv"));
    headers.insert(header::CONTENT_ENCODING, HeaderValue::from_static("gzip"));
    headers.insert("x-robots-tag", HeaderValue::from_static("noindex"));
    if let Ok(value) = HeaderValue::from_str(&filename) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    Ok(response)
}

#[derive(Debug, Serialize)]
struct MetaResponse {
    version: VersionNumber,
    #[serde(flatten)]
    meta: MetaView,
}

/// GET /v1/data-sets/{id}/meta
async fn metadata(
    State(state): SharedState,
    path: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<VersionQuery>, QueryRejection>,
) -> ApiResult<Json<MetaResponse>> {
    let id = data_set_id(path)?;
    let params = query_params(query)?;
    let selector = version_selector(params.data_set_version.as_deref())?;
    let (version, catalog) = state.service.metadata(id, &selector).await?;
    Ok(Json(MetaResponse {
        version: version.version,
        meta: JsonRenderer::new(&catalog).meta(),
    }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ListQuery {
    page: Option<u32>,
    #[serde(rename = "pageSize")]
    page_size: Option<u32>,
}

/// GET /v1/data-sets/{id}/versions
async fn list_versions(
    State(state): SharedState,
    path: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Json<Page<DataSetVersion>>> {
    let id = data_set_id(path)?;
    let params = query_params(query)?;
    let page = state
        .service
        .list_versions(id, params.page.unwrap_or(1), params.page_size)
        .await?;
    Ok(Json(page))
}

/// GET /v1/data-sets/{id}/versions/{version}/changes
async fn changes(
    State(state): SharedState,
    path: Result<Path<(Uuid, String)>, PathRejection>,
) -> ApiResult<Json<VersionChangeSet>> {
    let Path((id, version)) =
        path.map_err(|e| ApiError::not_found(format!("data set not found: {}", e.body_text())))?;
    Ok(Json(state.service.changes(id, &version).await?))
}
