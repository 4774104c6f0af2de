//! HTTP surface of the query service.

mod error;
mod params;
mod server;

pub use error::{ApiError, ApiErrorBody, ApiResult};
pub use params::{version_selector, DataSetGetQuery, PagingQuery, VersionQuery};
pub use server::{router, serve, AppState};
