//! Query-string parameters of the GET endpoints.
//!
//! Facet operators are flat keys (`filters.in`, `timePeriods.gte`, ...) and
//! list values are comma separated.

use serde::Deserialize;

use crate::model::{
    DataSetQueryRequest, FacetCriteria, FacetsCriteria, QueryCriteria, SortRequest,
    TimePeriodCriteria, VersionSelector,
};
use crate::query::{ErrorCode, ErrorDetail};

use super::error::ApiError;

/// `GET /v1/data-sets/{id}/query`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DataSetGetQuery {
    #[serde(rename = "filters.eq")]
    pub filters_eq: Option<String>,
    #[serde(rename = "filters.notEq")]
    pub filters_not_eq: Option<String>,
    #[serde(rename = "filters.in")]
    pub filters_in: Option<String>,
    #[serde(rename = "filters.notIn")]
    pub filters_not_in: Option<String>,

    #[serde(rename = "locations.eq")]
    pub locations_eq: Option<String>,
    #[serde(rename = "locations.notEq")]
    pub locations_not_eq: Option<String>,
    #[serde(rename = "locations.in")]
    pub locations_in: Option<String>,
    #[serde(rename = "locations.notIn")]
    pub locations_not_in: Option<String>,

    #[serde(rename = "geographicLevels.eq")]
    pub geographic_levels_eq: Option<String>,
    #[serde(rename = "geographicLevels.notEq")]
    pub geographic_levels_not_eq: Option<String>,
    #[serde(rename = "geographicLevels.in")]
    pub geographic_levels_in: Option<String>,
    #[serde(rename = "geographicLevels.notIn")]
    pub geographic_levels_not_in: Option<String>,

    #[serde(rename = "timePeriods.eq")]
    pub time_periods_eq: Option<String>,
    #[serde(rename = "timePeriods.notEq")]
    pub time_periods_not_eq: Option<String>,
    #[serde(rename = "timePeriods.in")]
    pub time_periods_in: Option<String>,
    #[serde(rename = "timePeriods.notIn")]
    pub time_periods_not_in: Option<String>,
    #[serde(rename = "timePeriods.gt")]
    pub time_periods_gt: Option<String>,
    #[serde(rename = "timePeriods.gte")]
    pub time_periods_gte: Option<String>,
    #[serde(rename = "timePeriods.lt")]
    pub time_periods_lt: Option<String>,
    #[serde(rename = "timePeriods.lte")]
    pub time_periods_lte: Option<String>,

    pub indicators: Option<String>,
    pub sorts: Option<String>,
    pub page: Option<u32>,
    #[serde(rename = "pageSize")]
    pub page_size: Option<u32>,
    #[serde(rename = "dataSetVersion")]
    pub data_set_version: Option<String>,
}

impl DataSetGetQuery {
    /// The equivalent POST body: one criteria leaf.
    pub fn to_request(&self) -> DataSetQueryRequest {
        let facets = FacetsCriteria {
            filters: facet(
                &self.filters_eq,
                &self.filters_not_eq,
                &self.filters_in,
                &self.filters_not_in,
            ),
            locations: facet(
                &self.locations_eq,
                &self.locations_not_eq,
                &self.locations_in,
                &self.locations_not_in,
            ),
            geographic_levels: facet(
                &self.geographic_levels_eq,
                &self.geographic_levels_not_eq,
                &self.geographic_levels_in,
                &self.geographic_levels_not_in,
            ),
            time_periods: self.time_periods(),
        };

        let sorts = split_list(&self.sorts)
            .unwrap_or_default()
            .into_iter()
            .map(|selector| match selector.rsplit_once('|') {
                Some((field, direction)) => SortRequest {
                    field: field.to_string(),
                    direction: direction.to_string(),
                },
                // Leave the missing direction for the sort parser to reject.
                None => SortRequest {
                    field: selector,
                    direction: String::new(),
                },
            })
            .collect();

        DataSetQueryRequest {
            criteria: (!facets.is_empty()).then_some(QueryCriteria::Facets(facets)),
            indicators: split_list(&self.indicators).unwrap_or_default(),
            sorts,
        }
    }

    fn time_periods(&self) -> Option<TimePeriodCriteria> {
        let criteria = TimePeriodCriteria {
            eq: non_empty(&self.time_periods_eq),
            not_eq: non_empty(&self.time_periods_not_eq),
            in_: split_list(&self.time_periods_in),
            not_in: split_list(&self.time_periods_not_in),
            gt: non_empty(&self.time_periods_gt),
            gte: non_empty(&self.time_periods_gte),
            lt: non_empty(&self.time_periods_lt),
            lte: non_empty(&self.time_periods_lte),
        };
        (criteria != TimePeriodCriteria::default()).then_some(criteria)
    }
}

fn facet(
    eq: &Option<String>,
    not_eq: &Option<String>,
    in_: &Option<String>,
    not_in: &Option<String>,
) -> Option<FacetCriteria> {
    let criteria = FacetCriteria {
        eq: non_empty(eq),
        not_eq: non_empty(not_eq),
        in_: split_list(in_),
        not_in: split_list(not_in),
    };
    (criteria != FacetCriteria::default()).then_some(criteria)
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// `a, b,,c` is `["a", "b", "c"]`.
fn split_list(value: &Option<String>) -> Option<Vec<String>> {
    let items: Vec<String> = value
        .as_deref()?
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect();
    Some(items)
}

/// `page`, `pageSize` and `dataSetVersion` of the POST query and CSV endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PagingQuery {
    pub page: Option<u32>,
    #[serde(rename = "pageSize")]
    pub page_size: Option<u32>,
    #[serde(rename = "dataSetVersion")]
    pub data_set_version: Option<String>,
}

/// `dataSetVersion` alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VersionQuery {
    #[serde(rename = "dataSetVersion")]
    pub data_set_version: Option<String>,
}

/// Parse `dataSetVersion`, absent meaning the latest published version.
pub fn version_selector(value: Option<&str>) -> Result<VersionSelector, ApiError> {
    VersionSelector::parse_optional(value).map_err(|e| {
        ApiError::validation(vec![ErrorDetail::new(
            ErrorCode::InvalidVersion,
            "dataSetVersion",
            e.to_string(),
        )])
    })
}
