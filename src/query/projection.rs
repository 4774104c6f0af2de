//! The columns a query reads and how result cells map back onto them.

use crate::catalog::MetadataCatalog;
use crate::model::GeographicLevel;
use crate::sql::{CatalogColumn, ColumnRef, FixedColumn, SqlValue};

/// One selected column, in catalog terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectedColumn {
    TimePeriod,
    GeographicLevel,
    Location(GeographicLevel),
    /// Position in the catalog's filters.
    Filter(usize),
    /// Position in the catalog's indicators.
    Indicator(usize),
}

/// The SELECT list of a data query.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    columns: Vec<ProjectedColumn>,
    refs: Vec<ColumnRef>,
}

impl Projection {
    /// Every facet column plus the given indicators.
    pub fn new(catalog: &MetadataCatalog, indicators: &[usize]) -> Self {
        let mut columns = vec![ProjectedColumn::TimePeriod, ProjectedColumn::GeographicLevel];
        let mut refs: Vec<ColumnRef> = vec![
            FixedColumn::TimePeriodId.into(),
            FixedColumn::GeographicLevel.into(),
        ];

        for level in catalog.location_levels() {
            columns.push(ProjectedColumn::Location(level.level));
            refs.push(CatalogColumn::for_location_level(level.level).into());
        }
        for (i, filter) in catalog.filters().iter().enumerate() {
            columns.push(ProjectedColumn::Filter(i));
            refs.push((&filter.column).into());
        }
        for &i in indicators {
            if let Some(indicator) = catalog.indicators().get(i) {
                columns.push(ProjectedColumn::Indicator(i));
                refs.push((&indicator.column).into());
            }
        }

        Self { columns, refs }
    }

    /// Every facet column and every indicator.
    pub fn all(catalog: &MetadataCatalog) -> Self {
        let indicators: Vec<usize> = (0..catalog.indicators().len()).collect();
        Self::new(catalog, &indicators)
    }

    pub fn columns(&self) -> &[ProjectedColumn] {
        &self.columns
    }

    pub fn column_refs(&self) -> impl Iterator<Item = ColumnRef> + '_ {
        self.refs.iter().cloned()
    }

    /// Selected indicator positions, in output order.
    pub fn indicators(&self) -> impl Iterator<Item = usize> + '_ {
        self.columns.iter().filter_map(|c| match c {
            ProjectedColumn::Indicator(i) => Some(*i),
            _ => None,
        })
    }

    /// Split a result row into its facet keys and indicator values.
    pub fn decode(&self, cells: Vec<SqlValue>) -> DataRow {
        let mut row = DataRow::default();
        for (column, cell) in self.columns.iter().zip(cells) {
            match column {
                ProjectedColumn::TimePeriod => row.time_period = cell.as_int(),
                ProjectedColumn::GeographicLevel => {
                    row.geographic_level = cell.as_text().and_then(GeographicLevel::from_code)
                }
                ProjectedColumn::Location(level) => {
                    if let Some(key) = cell.as_int() {
                        row.locations.push((*level, key));
                    }
                }
                ProjectedColumn::Filter(i) => {
                    if let Some(key) = cell.as_int() {
                        row.filters.push((*i, key));
                    }
                }
                ProjectedColumn::Indicator(i) => row.values.push((*i, cell)),
            }
        }
        row
    }
}

/// One result row, still in surrogate keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataRow {
    pub time_period: Option<i64>,
    pub geographic_level: Option<GeographicLevel>,
    /// Location keys for the levels this row reports at.
    pub locations: Vec<(GeographicLevel, i64)>,
    /// (filter position, option key)
    pub filters: Vec<(usize, i64)>,
    /// (indicator position, value)
    pub values: Vec<(usize, SqlValue)>,
}
