//! # dataquery
//!
//! A query engine for versioned statistical data sets.
//!
//! ## Architecture
//!
//! Public facet criteria compile to parameterized SQL against one stored
//! data-set version:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │        Request (criteria tree, indicators, sorts)        │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [versions]
//! ┌─────────────────────────────────────────────────────────┐
//! │   Version selector ("1.2", "2.*") → DataSetVersion       │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [catalog]
//! ┌─────────────────────────────────────────────────────────┐
//! │   MetadataCatalog (public ids → surrogate keys, cached)  │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [query::parsers, query::composer]
//! ┌─────────────────────────────────────────────────────────┐
//! │   Predicate IR + warnings  →  SqlFragment (sql, params)  │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [query::executor]
//! ┌─────────────────────────────────────────────────────────┐
//! │   Rows in surrogate keys                                 │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [render]
//! ┌─────────────────────────────────────────────────────────┐
//! │   JSON (public ids) or gzip CSV (labels)                 │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod model;
pub mod query;
pub mod render;
pub mod sql;
pub mod versions;
pub mod web;

pub use error::{QueryError, QueryResult};

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::catalog::{CatalogCache, CatalogDocument, CatalogSource, MetadataCatalog};
    pub use crate::config::Settings;
    pub use crate::error::{QueryError, QueryResult};
    pub use crate::model::{
        DataSet, DataSetQueryRequest, DataSetVersion, FacetCriteria, FacetsCriteria,
        GeographicLevel, QueryCriteria, TimeIdentifier, VersionNumber, VersionSelector,
    };
    pub use crate::query::{DataQuery, QueryExecutor, QueryService, SqliteExecutor};
    pub use crate::sql::{Dialect, Predicate, SqlFragment, SqlValue};
    pub use crate::versions::{VersionRepository, VersionResolver};
}
