//! Query requests and sort specifications.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::criteria::QueryCriteria;
use super::geography::GeographicLevel;
use super::SelectorError;

/// Sort direction as written by callers (`Asc` / `Desc`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortDirection {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("asc") {
            Ok(SortDirection::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Ok(SortDirection::Desc)
        } else {
            Err(SelectorError::InvalidSortDirection(s.to_string()))
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => f.write_str("Asc"),
            SortDirection::Desc => f.write_str("Desc"),
        }
    }
}

/// What a sort orders by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortField {
    TimePeriod,
    GeographicLevel,
    Location(GeographicLevel),
    Filter(String),
    Indicator(String),
}

impl FromStr for SortField {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('|') {
            None => match s {
                "timePeriod" => Ok(SortField::TimePeriod),
                "geographicLevel" => Ok(SortField::GeographicLevel),
                _ => Err(SelectorError::UnknownSortField(s.to_string())),
            },
            Some(("location", level)) => Ok(SortField::Location(level.parse()?)),
            Some(("filter", id)) if !id.is_empty() => Ok(SortField::Filter(id.to_string())),
            Some(("indicator", id)) if !id.is_empty() => Ok(SortField::Indicator(id.to_string())),
            Some(_) => Err(SelectorError::UnknownSortField(s.to_string())),
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortField::TimePeriod => f.write_str("timePeriod"),
            SortField::GeographicLevel => f.write_str("geographicLevel"),
            SortField::Location(level) => write!(f, "location|{}", level),
            SortField::Filter(id) => write!(f, "filter|{}", id),
            SortField::Indicator(id) => write!(f, "indicator|{}", id),
        }
    }
}

/// `{field}|{direction}`, e.g. `filter|ncyear|Desc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// `timePeriod|Desc`
    pub fn default_order() -> Self {
        Self::new(SortField::TimePeriod, SortDirection::Desc)
    }
}

impl FromStr for SortSpec {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field, direction) = s.rsplit_once('|').ok_or_else(|| SelectorError::Malformed {
            input: s.to_string(),
            expected: "{field}|{direction}",
        })?;
        Ok(Self {
            field: field.parse()?,
            direction: direction.parse()?,
        })
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.field, self.direction)
    }
}

/// A sort in a POST body: `{"field": "timePeriod", "direction": "Desc"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortRequest {
    pub field: String,
    #[serde(default = "default_direction")]
    pub direction: String,
}

fn default_direction() -> String {
    SortDirection::Asc.to_string()
}

impl SortRequest {
    /// The `{field}|{direction}` form both request shapes share.
    pub fn as_selector(&self) -> String {
        format!("{}|{}", self.field, self.direction)
    }
}

/// The body of a POST query; GET parameters are converted into it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DataSetQueryRequest {
    #[serde(default)]
    pub criteria: Option<QueryCriteria>,
    #[serde(default)]
    pub indicators: Vec<String>,
    #[serde(default)]
    pub sorts: Vec<SortRequest>,
}
