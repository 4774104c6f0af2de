//! HTTP error mapping.

use axum::http::header::RETRY_AFTER;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::error::QueryError;
use crate::query::ErrorDetail;

pub type ApiResult<T> = Result<T, ApiError>;

/// JSON error body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorBody {
    /// Stable machine-readable error code.
    pub code: &'static str,
    pub message: String,
    /// Every validation failure, each with its request path.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ErrorDetail>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
    errors: Vec<ErrorDetail>,
    retry_after_secs: Option<u64>,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL", message)
    }

    /// A failed request listing each validation error.
    pub fn validation(errors: Vec<ErrorDetail>) -> Self {
        let mut error = Self::new(
            StatusCode::BAD_REQUEST,
            "VALIDATION_FAILED",
            "One or more validation errors occurred",
        );
        error.errors = errors;
        error
    }

    #[must_use]
    pub fn with_retry_after(mut self, seconds: u64) -> Self {
        self.retry_after_secs = Some(seconds);
        self
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            errors: Vec::new(),
            retry_after_secs: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let retry_after_secs = self.retry_after_secs;
        let mut response = (
            self.status,
            Json(ApiErrorBody {
                code: self.code,
                message: self.message,
                errors: self.errors,
            }),
        )
            .into_response();

        if let Some(secs) = retry_after_secs {
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(RETRY_AFTER, value);
            }
        }
        response
    }
}

impl From<QueryError> for ApiError {
    fn from(value: QueryError) -> Self {
        match value {
            QueryError::DataSetNotFound(_) => Self::new(
                StatusCode::NOT_FOUND,
                "DATA_SET_NOT_FOUND",
                value.to_string(),
            ),
            QueryError::VersionNotFound { .. } => Self::new(
                StatusCode::NOT_FOUND,
                "VERSION_NOT_FOUND",
                value.to_string(),
            ),
            QueryError::InvalidVersionComparison(message) => {
                Self::new(StatusCode::BAD_REQUEST, "INVALID_VERSION_COMPARISON", message)
            }
            QueryError::Validation(errors) => Self::validation(errors),
            QueryError::Timeout(secs) => Self::new(
                StatusCode::SERVICE_UNAVAILABLE,
                "QUERY_TIMEOUT",
                format!("query exceeded the {} second limit", secs),
            )
            .with_retry_after(secs),
            err @ (QueryError::Catalog(_)
            | QueryError::Executor(_)
            | QueryError::Storage(_)
            | QueryError::Render(_)) => {
                tracing::error!(error = %err, "request failed");
                Self::internal("An internal error occurred")
            }
        }
    }
}
