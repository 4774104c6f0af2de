//! The on-disk catalog document (`metadata.json`).

use serde::{Deserialize, Serialize};

use crate::model::{GeographicLevel, TimeIdentifier};
use crate::sql::CatalogColumn;

/// Everything a version publishes about its facets and indicators.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogDocument {
    #[serde(default)]
    pub filters: Vec<FilterMeta>,
    #[serde(default)]
    pub indicators: Vec<IndicatorMeta>,
    #[serde(default)]
    pub geographic_levels: Vec<GeographicLevel>,
    #[serde(default)]
    pub locations: Vec<LocationLevelMeta>,
    #[serde(default)]
    pub time_periods: Vec<TimePeriodMeta>,
}

/// A filter and its options. Each filter is one column of the data table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterMeta {
    pub id: String,
    pub column: CatalogColumn,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(default)]
    pub options: Vec<FilterOptionMeta>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptionMeta {
    pub id: String,
    pub label: String,
    pub surrogate_key: i64,
    #[serde(default)]
    pub is_aggregate: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorMeta {
    pub id: String,
    pub column: CatalogColumn,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimal_places: Option<u8>,
}

/// The location options of one geographic level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationLevelMeta {
    pub level: GeographicLevel,
    #[serde(default)]
    pub options: Vec<LocationOptionMeta>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationOptionMeta {
    pub id: String,
    pub label: String,
    pub surrogate_key: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub la_estab: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ukprn: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimePeriodMeta {
    /// As published: `2020`, `2020/2021` or `2020/21`.
    pub period: String,
    pub code: TimeIdentifier,
    pub surrogate_key: i64,
}
