//! Domain types shared by every layer: geographic levels, time periods,
//! versions, criteria trees and request shapes.

pub mod criteria;
pub mod geography;
pub mod paging;
pub mod request;
pub mod time;
pub mod version;

pub use criteria::{
    AndCriteria, FacetCriteria, FacetsCriteria, NotCriteria, OrCriteria, QueryCriteria,
    TimePeriodCriteria,
};
pub use geography::{GeographicLevel, LocationProperty, LocationSelector};
pub use paging::{Page, PagingInfo};
pub use request::{DataSetQueryRequest, SortDirection, SortField, SortRequest, SortSpec};
pub use time::{parse_period_year, TimeIdentifier, TimePeriodKey};
pub use version::{
    DataSet, DataSetVersion, VersionFiles, VersionNumber, VersionSelector, VersionStatus,
};

/// A selector string that does not follow its grammar.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    #[error("'{input}' must have the form {expected}")]
    Malformed {
        input: String,
        expected: &'static str,
    },

    #[error("unknown geographic level: '{0}'")]
    UnknownGeographicLevel(String),

    #[error("unknown location property: '{0}'")]
    UnknownLocationProperty(String),

    #[error("unknown time identifier: '{0}'")]
    UnknownTimeIdentifier(String),

    #[error("invalid period: '{0}'")]
    InvalidPeriod(String),

    #[error("invalid version: '{0}'")]
    InvalidVersion(String),

    #[error("unknown sort field: '{0}'")]
    UnknownSortField(String),

    #[error("invalid sort direction: '{0}'")]
    InvalidSortDirection(String),
}
