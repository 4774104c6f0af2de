use crate::catalog::MetadataCatalog;
use crate::model::LocationSelector;
use crate::query::state::{ErrorCode, QueryState, WarningCode};
use crate::sql::{CatalogColumn, SqlValue};

use super::{ColumnMatch, FacetParser, Resolution};

/// `{level}|{property}|{value}` selectors to the level's location column.
///
/// A row carries a location key only for the levels it reports at, so the
/// columns are nullable.
pub struct LocationParser<'a> {
    catalog: &'a MetadataCatalog,
}

impl<'a> LocationParser<'a> {
    pub fn new(catalog: &'a MetadataCatalog) -> Self {
        Self { catalog }
    }
}

impl FacetParser for LocationParser<'_> {
    const NOT_FOUND: WarningCode = WarningCode::LocationsNotFound;
    const NULLABLE: bool = true;

    fn resolve(&self, raw: &str, path: &str, state: &mut QueryState) -> Resolution {
        let selector: LocationSelector = match raw.parse() {
            Ok(selector) => selector,
            Err(e) => {
                state.error(ErrorCode::InvalidLocation, path, e.to_string());
                return Resolution::Invalid;
            }
        };
        match self
            .catalog
            .lookup_location(selector.level, selector.property, &selector.value)
        {
            Some(option) => Resolution::Found(ColumnMatch {
                column: CatalogColumn::for_location_level(selector.level).into(),
                value: SqlValue::Int(option.surrogate_key),
            }),
            None => Resolution::NotFound,
        }
    }
}
