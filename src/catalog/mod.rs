//! Metadata catalogs: the public-identifier to surrogate-key tables of one
//! data-set version.
//!
//! - [`document`] - The serialized `metadata.json` shape
//! - [`lookup`] - Validated, indexed [`MetadataCatalog`]
//! - [`source`] - Async loading ([`CatalogSource`])
//! - [`cache`] - Shared per-version cache

pub mod cache;
pub mod document;
pub mod lookup;
pub mod source;

#[cfg(test)]
pub(crate) mod test_fixtures;

use std::path::PathBuf;

use uuid::Uuid;

use crate::model::{SelectorError, VersionNumber};

pub use cache::CatalogCache;
pub use document::{
    CatalogDocument, FilterMeta, FilterOptionMeta, IndicatorMeta, LocationLevelMeta,
    LocationOptionMeta, TimePeriodMeta,
};
pub use lookup::{MetadataCatalog, ResolvedFilterOption, ResolvedTimePeriod};
pub use source::{CatalogSource, FileCatalogSource};

/// Errors loading or validating a catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("files for data set {data_set_id} version {version} not found: {}", path.display())]
    NotFound {
        data_set_id: Uuid,
        version: VersionNumber,
        path: PathBuf,
    },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("duplicate {kind} '{id}'")]
    DuplicateId { kind: &'static str, id: String },

    #[error("duplicate {kind} surrogate key {key}")]
    DuplicateKey { kind: &'static str, key: i64 },

    #[error("column '{0}' is used more than once")]
    DuplicateColumn(String),

    #[error("invalid time period '{period}': {source}")]
    InvalidTimePeriod {
        period: String,
        #[source]
        source: SelectorError,
    },
}

pub type CatalogResult<T> = Result<T, CatalogError>;
