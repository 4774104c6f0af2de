//! Allow-listed identifiers.
//!
//! Identifiers are the only text that reaches SQL without being bound as a
//! parameter. They come from two places, never from request input:
//!
//! - [`FixedColumn`]: the columns every data table has.
//! - [`CatalogColumn`]: filter, indicator and location columns named by the
//!   version's metadata catalog, validated when the catalog is loaded.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::model::GeographicLevel;

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,127}$").expect("valid identifier regex"));

/// Columns present in every data table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FixedColumn {
    Id,
    TimePeriodId,
    GeographicLevel,
}

impl FixedColumn {
    pub fn name(self) -> &'static str {
        match self {
            FixedColumn::Id => "id",
            FixedColumn::TimePeriodId => "time_period_id",
            FixedColumn::GeographicLevel => "geographic_level",
        }
    }
}

/// The single table each version's store exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableName {
    Data,
}

impl TableName {
    pub fn name(self) -> &'static str {
        match self {
            TableName::Data => "data",
        }
    }
}

/// Rejected catalog column name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid column identifier: '{0}'")]
pub struct InvalidIdentifier(pub String);

/// A column named by catalog metadata.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CatalogColumn(String);

impl CatalogColumn {
    pub fn new(name: impl Into<String>) -> Result<Self, InvalidIdentifier> {
        let name = name.into();
        if IDENTIFIER.is_match(&name) {
            Ok(Self(name))
        } else {
            Err(InvalidIdentifier(name))
        }
    }

    /// `locations_{level}_id`, the surrogate-key column for one geographic level.
    pub fn for_location_level(level: GeographicLevel) -> Self {
        Self(format!("locations_{}_id", level.code().to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CatalogColumn {
    type Error = InvalidIdentifier;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CatalogColumn> for String {
    fn from(column: CatalogColumn) -> Self {
        column.0
    }
}

/// Any identifier that may be interpolated into SQL text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnRef {
    Fixed(FixedColumn),
    Catalog(CatalogColumn),
}

impl ColumnRef {
    pub fn name(&self) -> &str {
        match self {
            ColumnRef::Fixed(c) => c.name(),
            ColumnRef::Catalog(c) => c.as_str(),
        }
    }
}

impl From<FixedColumn> for ColumnRef {
    fn from(column: FixedColumn) -> Self {
        ColumnRef::Fixed(column)
    }
}

impl From<CatalogColumn> for ColumnRef {
    fn from(column: CatalogColumn) -> Self {
        ColumnRef::Catalog(column)
    }
}

impl From<&CatalogColumn> for ColumnRef {
    fn from(column: &CatalogColumn) -> Self {
        ColumnRef::Catalog(column.clone())
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
