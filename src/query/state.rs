//! Request-scoped warnings and validation errors.

use serde::Serialize;

/// Why a value was dropped from a query without failing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WarningCode {
    FiltersNotFound,
    LocationsNotFound,
    GeographicLevelsNotFound,
    TimePeriodsNotFound,
    QueryNoResults,
}

/// A non-fatal problem, returned alongside results.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Warning {
    pub code: WarningCode,
    pub message: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<WarningDetail>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WarningDetail {
    pub items: Vec<String>,
}

/// Why a request was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorCode {
    InvalidLocation,
    InvalidTimePeriod,
    InvalidGeographicLevel,
    InvalidSort,
    SortFieldNotFound,
    IndicatorsNotFound,
    InvalidPage,
    InvalidPageSize,
    InvalidVersion,
    InvalidRequest,
}

/// One validation failure, located by its path in the request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetail {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub path: String,
}

impl ErrorDetail {
    pub fn new(code: ErrorCode, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: path.into(),
        }
    }
}

/// Accumulates warnings and errors while a request compiles.
#[derive(Debug, Default)]
pub struct QueryState {
    warnings: Vec<Warning>,
    errors: Vec<ErrorDetail>,
}

impl QueryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning about values that matched nothing.
    pub fn warn_not_found(&mut self, code: WarningCode, path: &str, items: Vec<String>) {
        let message = match items.len() {
            1 => "One of the requested values could not be found".to_string(),
            n => format!("{} of the requested values could not be found", n),
        };
        self.warnings.push(Warning {
            code,
            message,
            path: path.to_string(),
            detail: Some(WarningDetail { items }),
        });
    }

    pub fn warn(&mut self, warning: Warning) {
        self.warnings.push(warning);
    }

    pub fn error(&mut self, code: ErrorCode, path: &str, message: impl Into<String>) {
        self.errors.push(ErrorDetail::new(code, path, message));
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn errors(&self) -> &[ErrorDetail] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn into_parts(self) -> (Vec<Warning>, Vec<ErrorDetail>) {
        (self.warnings, self.errors)
    }
}

/// Join a path segment onto a parent path with `.`.
pub fn child_path(parent: &str, segment: &str) -> String {
    if parent.is_empty() {
        segment.to_string()
    } else {
        format!("{}.{}", parent, segment)
    }
}

/// `parent.name[index]`
pub fn indexed_path(parent: &str, name: &str, index: usize) -> String {
    child_path(parent, &format!("{}[{}]", name, index))
}
