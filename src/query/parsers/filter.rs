use crate::catalog::MetadataCatalog;
use crate::query::state::{QueryState, WarningCode};
use crate::sql::SqlValue;

use super::{ColumnMatch, FacetParser, Resolution};

/// Filter option IDs to their filter's column and surrogate key.
pub struct FilterParser<'a> {
    catalog: &'a MetadataCatalog,
}

impl<'a> FilterParser<'a> {
    pub fn new(catalog: &'a MetadataCatalog) -> Self {
        Self { catalog }
    }
}

impl FacetParser for FilterParser<'_> {
    const NOT_FOUND: WarningCode = WarningCode::FiltersNotFound;

    fn resolve(&self, raw: &str, _path: &str, _state: &mut QueryState) -> Resolution {
        match self.catalog.lookup_filter_option(raw) {
            Some(found) => Resolution::Found(ColumnMatch {
                column: (&found.filter.column).into(),
                value: SqlValue::Int(found.option.surrogate_key),
            }),
            None => Resolution::NotFound,
        }
    }
}
