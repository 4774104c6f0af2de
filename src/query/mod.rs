//! Query compilation and execution.
//!
//! - [`parsers`] - One facet's criteria to a predicate
//! - [`composer`] - Criteria trees to one WHERE fragment
//! - [`sort`] - Sort specifications to ORDER BY
//! - [`projection`] - Selected columns and row decoding
//! - [`executor`] - Running compiled SQL ([`QueryExecutor`])
//! - [`service`] - The request-level orchestration ([`QueryService`])
//! - [`state`] - Request-scoped warnings and errors

pub mod composer;
pub mod executor;
pub mod parsers;
pub mod projection;
pub mod service;
pub mod sort;
pub mod state;

pub use composer::{CriteriaComposer, BODY_ROOT, QUERY_STRING_ROOT};
pub use executor::{ExecutorError, ExecutorResult, QueryExecutor, Row, SqliteExecutor};
pub use parsers::{
    FacetParser, FilterParser, GeographicLevelParser, LocationParser, TimePeriodParser,
};
pub use projection::{DataRow, ProjectedColumn, Projection};
pub use service::{CsvExport, DataQuery, QueryPage, QueryPlan, QueryService};
pub use sort::SortResolver;
pub use state::{ErrorCode, ErrorDetail, QueryState, Warning, WarningCode, WarningDetail};
