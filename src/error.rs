//! Errors surfaced by the query service.

use thiserror::Error;
use uuid::Uuid;

use crate::catalog::CatalogError;
use crate::query::executor::ExecutorError;
use crate::query::state::{ErrorCode, ErrorDetail};

/// Result type for query-service operations.
pub type QueryResult<T> = Result<T, QueryError>;

/// Everything that fails a request. Warnings are not errors and ride on the
/// success value instead.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("data set {0} not found")]
    DataSetNotFound(Uuid),

    #[error("version '{selector}' of data set {data_set_id} not found")]
    VersionNotFound { data_set_id: Uuid, selector: String },

    #[error("invalid version comparison: {0}")]
    InvalidVersionComparison(String),

    /// The request is malformed; every problem found is listed.
    #[error("request failed validation ({} error(s))", .0.len())]
    Validation(Vec<ErrorDetail>),

    #[error("query exceeded the {0} second limit")]
    Timeout(u64),

    #[error(transparent)]
    Catalog(CatalogError),

    #[error(transparent)]
    Executor(#[from] ExecutorError),

    /// The version repository could not be read.
    #[error("storage error: {0}")]
    Storage(String),

    #[error("failed to render results: {0}")]
    Render(String),
}

impl QueryError {
    /// A validation failure with a single error.
    pub fn invalid(code: ErrorCode, path: &str, message: impl Into<String>) -> Self {
        QueryError::Validation(vec![ErrorDetail::new(code, path, message)])
    }

    pub fn is_retriable(&self) -> bool {
        match self {
            QueryError::Timeout(_) => true,
            QueryError::Executor(e) => e.is_retriable(),
            _ => false,
        }
    }
}

impl From<CatalogError> for QueryError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::NotFound {
                data_set_id,
                version,
                ..
            } => QueryError::VersionNotFound {
                data_set_id,
                selector: version.to_string(),
            },
            other => QueryError::Catalog(other),
        }
    }
}
