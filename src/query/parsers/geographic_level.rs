use crate::catalog::MetadataCatalog;
use crate::model::GeographicLevel;
use crate::query::state::{ErrorCode, QueryState, WarningCode};
use crate::sql::{FixedColumn, SqlValue};

use super::{ColumnMatch, FacetParser, Resolution};

/// Level codes against the `geographic_level` column.
pub struct GeographicLevelParser<'a> {
    catalog: &'a MetadataCatalog,
}

impl<'a> GeographicLevelParser<'a> {
    pub fn new(catalog: &'a MetadataCatalog) -> Self {
        Self { catalog }
    }
}

impl FacetParser for GeographicLevelParser<'_> {
    const NOT_FOUND: WarningCode = WarningCode::GeographicLevelsNotFound;

    fn resolve(&self, raw: &str, path: &str, state: &mut QueryState) -> Resolution {
        let level: GeographicLevel = match raw.parse() {
            Ok(level) => level,
            Err(e) => {
                state.error(ErrorCode::InvalidGeographicLevel, path, e.to_string());
                return Resolution::Invalid;
            }
        };
        if self.catalog.lookup_geographic_level(level) {
            Resolution::Found(ColumnMatch {
                column: FixedColumn::GeographicLevel.into(),
                value: SqlValue::from(level.code()),
            })
        } else {
            Resolution::NotFound
        }
    }
}
