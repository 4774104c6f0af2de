//! Criteria tree to predicate.
//!
//! Leaves AND their facet predicates; `and`/`or` groups join their children
//! and `not` negates its child. Constants fold as the tree is built, so an
//! empty tree is `true` and a branch with an unresolvable `eq` collapses.

use crate::catalog::MetadataCatalog;
use crate::model::{FacetsCriteria, QueryCriteria};
use crate::sql::{Predicate, SqlFragment};

use super::parsers::{
    FacetParser, FilterParser, GeographicLevelParser, LocationParser, TimePeriodParser,
};
use super::state::{child_path, indexed_path, QueryState};

/// Path root for criteria in a POST body.
pub const BODY_ROOT: &str = "criteria";

/// Path root for criteria read from query-string parameters.
pub const QUERY_STRING_ROOT: &str = "";

pub struct CriteriaComposer<'a> {
    catalog: &'a MetadataCatalog,
}

impl<'a> CriteriaComposer<'a> {
    pub fn new(catalog: &'a MetadataCatalog) -> Self {
        Self { catalog }
    }

    /// Compile a criteria tree to one SQL fragment.
    pub fn compose(&self, criteria: &QueryCriteria, path: &str, state: &mut QueryState) -> SqlFragment {
        self.compose_predicate(criteria, path, state).to_fragment()
    }

    pub fn compose_predicate(
        &self,
        criteria: &QueryCriteria,
        path: &str,
        state: &mut QueryState,
    ) -> Predicate {
        match criteria {
            QueryCriteria::Facets(facets) => self.compose_facets(facets, path, state),

            // An empty group places no constraint, like an empty leaf.
            QueryCriteria::And(group) if group.and.is_empty() => Predicate::Const(true),
            QueryCriteria::Or(group) if group.or.is_empty() => Predicate::Const(true),

            QueryCriteria::And(group) => Predicate::and(
                group
                    .and
                    .iter()
                    .enumerate()
                    .map(|(i, child)| self.compose_predicate(child, &indexed_path(path, "and", i), state))
                    .collect::<Vec<_>>(),
            ),
            QueryCriteria::Or(group) => Predicate::or(
                group
                    .or
                    .iter()
                    .enumerate()
                    .map(|(i, child)| self.compose_predicate(child, &indexed_path(path, "or", i), state))
                    .collect::<Vec<_>>(),
            ),
            QueryCriteria::Not(group) => {
                Predicate::negate(self.compose_predicate(&group.not, &child_path(path, "not"), state))
            }
        }
    }

    fn compose_facets(&self, facets: &FacetsCriteria, path: &str, state: &mut QueryState) -> Predicate {
        let mut parts = Vec::with_capacity(4);
        if let Some(filters) = &facets.filters {
            parts.push(FilterParser::new(self.catalog).parse(
                filters,
                &child_path(path, "filters"),
                state,
            ));
        }
        if let Some(locations) = &facets.locations {
            parts.push(LocationParser::new(self.catalog).parse(
                locations,
                &child_path(path, "locations"),
                state,
            ));
        }
        if let Some(levels) = &facets.geographic_levels {
            parts.push(GeographicLevelParser::new(self.catalog).parse(
                levels,
                &child_path(path, "geographicLevels"),
                state,
            ));
        }
        if let Some(periods) = &facets.time_periods {
            parts.push(TimePeriodParser::new(self.catalog).parse_periods(
                periods,
                &child_path(path, "timePeriods"),
                state,
            ));
        }
        Predicate::and(parts)
    }
}
