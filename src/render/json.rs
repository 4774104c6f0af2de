//! Rows and catalogs as public-facing JSON.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::catalog::MetadataCatalog;
use crate::error::{QueryError, QueryResult};
use crate::model::{GeographicLevel, PagingInfo};
use crate::query::projection::DataRow;
use crate::query::state::Warning;

/// `{"period": "2020/2021", "code": "AY"}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimePeriodView {
    pub period: String,
    pub code: String,
}

/// One result row in public identifiers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataRowView {
    pub time_period: TimePeriodView,
    pub geographic_level: GeographicLevel,
    /// Level code to location id.
    pub locations: BTreeMap<GeographicLevel, String>,
    /// Filter id to option id.
    pub filters: BTreeMap<String, String>,
    /// Indicator id to value. Missing values are empty strings.
    pub values: BTreeMap<String, String>,
}

/// The body of a successful query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    pub paging: PagingInfo,
    pub results: Vec<DataRowView>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<Warning>,
}

/// Maps surrogate keys back to public identifiers.
pub struct JsonRenderer<'a> {
    catalog: &'a MetadataCatalog,
}

impl<'a> JsonRenderer<'a> {
    pub fn new(catalog: &'a MetadataCatalog) -> Self {
        Self { catalog }
    }

    /// A key the catalog does not know means the store and catalog disagree,
    /// which fails the request rather than leaking the key.
    pub fn row(&self, row: &DataRow) -> QueryResult<DataRowView> {
        let key = row
            .time_period
            .ok_or_else(|| QueryError::Render("row has no time period".to_string()))?;
        let time_period = self
            .catalog
            .time_period_by_key(key)
            .ok_or_else(|| unknown("time period", key))?;
        let geographic_level = row
            .geographic_level
            .ok_or_else(|| QueryError::Render("row has no geographic level".to_string()))?;

        let mut locations = BTreeMap::new();
        for &(level, key) in &row.locations {
            let location = self
                .catalog
                .location_by_key(level, key)
                .ok_or_else(|| unknown("location", key))?;
            locations.insert(level, location.id.clone());
        }

        let mut filters = BTreeMap::new();
        for &(_, key) in &row.filters {
            let option = self
                .catalog
                .filter_option_by_key(key)
                .ok_or_else(|| unknown("filter option", key))?;
            filters.insert(option.filter.id.clone(), option.option.id.clone());
        }

        let values = row
            .values
            .iter()
            .filter_map(|(i, value)| {
                self.catalog
                    .indicators()
                    .get(*i)
                    .map(|indicator| (indicator.id.clone(), value.to_string()))
            })
            .collect();

        Ok(DataRowView {
            time_period: TimePeriodView {
                period: time_period.key.period(),
                code: time_period.key.identifier.code(),
            },
            geographic_level,
            locations,
            filters,
            values,
        })
    }

    pub fn rows(&self, rows: &[DataRow]) -> QueryResult<Vec<DataRowView>> {
        rows.iter().map(|row| self.row(row)).collect()
    }

    /// The catalog without surrogate keys or column names.
    pub fn meta(&self) -> MetaView {
        MetaView {
            filters: self
                .catalog
                .filters()
                .iter()
                .map(|f| FilterView {
                    id: f.id.clone(),
                    label: f.label.clone(),
                    hint: f.hint.clone(),
                    options: f
                        .options
                        .iter()
                        .map(|o| FilterOptionView {
                            id: o.id.clone(),
                            label: o.label.clone(),
                            is_aggregate: o.is_aggregate,
                        })
                        .collect(),
                })
                .collect(),
            indicators: self
                .catalog
                .indicators()
                .iter()
                .map(|i| IndicatorView {
                    id: i.id.clone(),
                    label: i.label.clone(),
                    unit: i.unit.clone(),
                    decimal_places: i.decimal_places,
                })
                .collect(),
            geographic_levels: self
                .catalog
                .geographic_levels()
                .iter()
                .map(|&level| LevelView {
                    code: level,
                    label: level.label(),
                })
                .collect(),
            locations: self
                .catalog
                .location_levels()
                .iter()
                .map(|l| LocationGroupView {
                    level: LevelView {
                        code: l.level,
                        label: l.level.label(),
                    },
                    options: l
                        .options
                        .iter()
                        .map(|o| LocationOptionView {
                            id: o.id.clone(),
                            label: o.label.clone(),
                            code: o.code.clone(),
                            old_code: o.old_code.clone(),
                            urn: o.urn.clone(),
                            la_estab: o.la_estab.clone(),
                            ukprn: o.ukprn.clone(),
                        })
                        .collect(),
                })
                .collect(),
            time_periods: self
                .catalog
                .time_periods_chronological()
                .map(|p| TimePeriodMetaView {
                    period: p.key.period(),
                    code: p.key.identifier.code(),
                    label: format!("{} {}", p.key.period(), p.key.identifier.label()),
                })
                .collect(),
        }
    }
}

fn unknown(kind: &str, key: i64) -> QueryError {
    QueryError::Render(format!("{} key {} is not in the catalog", kind, key))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaView {
    pub filters: Vec<FilterView>,
    pub indicators: Vec<IndicatorView>,
    pub geographic_levels: Vec<LevelView>,
    pub locations: Vec<LocationGroupView>,
    pub time_periods: Vec<TimePeriodMetaView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterView {
    pub id: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    pub options: Vec<FilterOptionView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptionView {
    pub id: String,
    pub label: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_aggregate: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorView {
    pub id: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decimal_places: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelView {
    pub code: GeographicLevel,
    pub label: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationGroupView {
    pub level: LevelView,
    pub options: Vec<LocationOptionView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationOptionView {
    pub id: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub la_estab: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ukprn: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimePeriodMetaView {
    pub period: String,
    pub code: String,
    pub label: String,
}
