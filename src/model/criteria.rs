//! The declarative criteria tree callers send.
//!
//! A node is either a facet leaf or one of the logical groups `and`, `or`,
//! `not`. Unknown keys are rejected so a typo never silently widens a query.

use serde::{Deserialize, Serialize};

/// A criteria node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryCriteria {
    And(AndCriteria),
    Or(OrCriteria),
    Not(NotCriteria),
    Facets(FacetsCriteria),
}

impl Default for QueryCriteria {
    fn default() -> Self {
        QueryCriteria::Facets(FacetsCriteria::default())
    }
}

impl QueryCriteria {
    pub fn and(children: Vec<QueryCriteria>) -> Self {
        QueryCriteria::And(AndCriteria { and: children })
    }

    pub fn or(children: Vec<QueryCriteria>) -> Self {
        QueryCriteria::Or(OrCriteria { or: children })
    }

    pub fn not(child: QueryCriteria) -> Self {
        QueryCriteria::Not(NotCriteria {
            not: Box::new(child),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AndCriteria {
    pub and: Vec<QueryCriteria>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrCriteria {
    pub or: Vec<QueryCriteria>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NotCriteria {
    pub not: Box<QueryCriteria>,
}

/// A leaf: up to one block per facet. Absent blocks do not constrain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FacetsCriteria {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<FacetCriteria>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locations: Option<FacetCriteria>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geographic_levels: Option<FacetCriteria>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_periods: Option<TimePeriodCriteria>,
}

impl FacetsCriteria {
    pub fn is_empty(&self) -> bool {
        self.filters.is_none()
            && self.locations.is_none()
            && self.geographic_levels.is_none()
            && self.time_periods.is_none()
    }
}

/// Equality operators shared by every facet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FacetCriteria {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eq: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_eq: Option<String>,
    #[serde(default, rename = "in", skip_serializing_if = "Option::is_none")]
    pub in_: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_in: Option<Vec<String>>,
}

/// Time periods add range comparisons.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TimePeriodCriteria {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eq: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_eq: Option<String>,
    #[serde(default, rename = "in", skip_serializing_if = "Option::is_none")]
    pub in_: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_in: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gte: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lte: Option<String>,
}

impl TimePeriodCriteria {
    /// The equality operators alone.
    pub fn equality(&self) -> FacetCriteria {
        FacetCriteria {
            eq: self.eq.clone(),
            not_eq: self.not_eq.clone(),
            in_: self.in_.clone(),
            not_in: self.not_in.clone(),
        }
    }
}
