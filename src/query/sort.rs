//! Sort specifications to ORDER BY expressions.
//!
//! Surrogate keys carry no meaning, so facet sorts order by an explicit
//! ranking of the keys: chronological for time periods, broadest-first for
//! geographic levels, by label for locations and filter options.

use crate::catalog::MetadataCatalog;
use crate::model::{SortDirection, SortField, SortSpec};
use crate::sql::{CatalogColumn, FixedColumn, OrderByExpr, OrderKey, SortDir, SqlValue};

use super::state::{indexed_path, ErrorCode, QueryState};

pub struct SortResolver<'a> {
    catalog: &'a MetadataCatalog,
}

impl<'a> SortResolver<'a> {
    pub fn new(catalog: &'a MetadataCatalog) -> Self {
        Self { catalog }
    }

    /// Resolve every sort, recording an error for each one that fails.
    ///
    /// No sorts means `timePeriod|Desc`. The row id is appended as a final
    /// key so pages are stable.
    pub fn resolve(&self, sorts: &[String], state: &mut QueryState) -> Vec<OrderByExpr> {
        let mut exprs = Vec::with_capacity(sorts.len() + 1);

        if sorts.is_empty() {
            exprs.extend(self.resolve_spec(&SortSpec::default_order()));
        }
        for (i, raw) in sorts.iter().enumerate() {
            let path = indexed_path("", "sorts", i);
            let spec: SortSpec = match raw.parse() {
                Ok(spec) => spec,
                Err(e) => {
                    state.error(ErrorCode::InvalidSort, &path, e.to_string());
                    continue;
                }
            };
            match self.resolve_spec(&spec) {
                Some(expr) => exprs.push(expr),
                None => state.error(
                    ErrorCode::SortFieldNotFound,
                    &path,
                    format!("sort field '{}' does not exist in this data set version", spec.field),
                ),
            }
        }

        exprs.push(OrderByExpr::asc(OrderKey::Column(FixedColumn::Id.into())));
        exprs
    }

    fn resolve_spec(&self, spec: &SortSpec) -> Option<OrderByExpr> {
        let key = match &spec.field {
            SortField::TimePeriod => OrderKey::Ordinal {
                column: FixedColumn::TimePeriodId.into(),
                values: self
                    .catalog
                    .time_periods_chronological()
                    .map(|p| SqlValue::Int(p.meta.surrogate_key))
                    .collect(),
            },
            SortField::GeographicLevel => OrderKey::Ordinal {
                column: FixedColumn::GeographicLevel.into(),
                values: self
                    .catalog
                    .geographic_levels()
                    .iter()
                    .map(|level| SqlValue::from(level.code()))
                    .collect(),
            },
            SortField::Location(level) => {
                let meta = self.catalog.location_level(*level)?;
                let mut options: Vec<_> = meta.options.iter().collect();
                options.sort_by(|a, b| a.label.to_lowercase().cmp(&b.label.to_lowercase()));
                OrderKey::Ordinal {
                    column: CatalogColumn::for_location_level(*level).into(),
                    values: options
                        .into_iter()
                        .map(|o| SqlValue::Int(o.surrogate_key))
                        .collect(),
                }
            }
            SortField::Filter(id) => {
                let filter = self.catalog.lookup_filter(id)?;
                let mut options: Vec<_> = filter.options.iter().collect();
                options.sort_by(|a, b| a.label.to_lowercase().cmp(&b.label.to_lowercase()));
                OrderKey::Ordinal {
                    column: (&filter.column).into(),
                    values: options
                        .into_iter()
                        .map(|o| SqlValue::Int(o.surrogate_key))
                        .collect(),
                }
            }
            SortField::Indicator(id) => {
                OrderKey::Column((&self.catalog.lookup_indicator(id)?.column).into())
            }
        };

        let dir = match spec.direction {
            SortDirection::Asc => SortDir::Asc,
            SortDirection::Desc => SortDir::Desc,
        };
        Some(OrderByExpr::new(key, dir))
    }
}
