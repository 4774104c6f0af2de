//! Indexed, immutable lookup tables over one version's catalog document.
//!
//! Entries are stored once in the document; every index maps a public
//! identifier (or surrogate key) to a position in the document's vectors.

use std::collections::{HashMap, HashSet};

use super::document::{
    CatalogDocument, FilterMeta, FilterOptionMeta, IndicatorMeta, LocationLevelMeta,
    LocationOptionMeta, TimePeriodMeta,
};
use super::CatalogError;
use crate::model::{parse_period_year, GeographicLevel, LocationProperty, TimePeriodKey};
use crate::sql::{CatalogColumn, FixedColumn};

/// A filter option together with the filter it belongs to.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedFilterOption<'a> {
    pub filter: &'a FilterMeta,
    pub option: &'a FilterOptionMeta,
}

/// A catalog time period with its normalized key.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedTimePeriod<'a> {
    pub key: TimePeriodKey,
    pub meta: &'a TimePeriodMeta,
}

#[derive(Debug, Default)]
struct LocationIndex {
    level_position: usize,
    by_property: HashMap<LocationProperty, HashMap<String, usize>>,
    by_key: HashMap<i64, usize>,
}

/// The metadata catalog for one data-set version.
#[derive(Debug)]
pub struct MetadataCatalog {
    document: CatalogDocument,
    filters_by_id: HashMap<String, usize>,
    filter_options_by_id: HashMap<String, (usize, usize)>,
    filter_options_by_key: HashMap<i64, (usize, usize)>,
    indicators_by_id: HashMap<String, usize>,
    geographic_levels: Vec<GeographicLevel>,
    geographic_level_set: HashSet<GeographicLevel>,
    locations: HashMap<GeographicLevel, LocationIndex>,
    time_period_keys: Vec<TimePeriodKey>,
    time_periods_by_key: HashMap<TimePeriodKey, usize>,
    time_periods_by_surrogate: HashMap<i64, usize>,
    chronological: Vec<usize>,
}

impl MetadataCatalog {
    /// Validate a document and build its indexes.
    pub fn from_document(document: CatalogDocument) -> Result<Self, CatalogError> {
        let mut columns: HashSet<String> = [
            FixedColumn::Id,
            FixedColumn::TimePeriodId,
            FixedColumn::GeographicLevel,
        ]
        .iter()
        .map(|c| c.name().to_string())
        .collect();
        let mut claim_column = |column: &CatalogColumn| -> Result<(), CatalogError> {
            if columns.insert(column.as_str().to_string()) {
                Ok(())
            } else {
                Err(CatalogError::DuplicateColumn(column.as_str().to_string()))
            }
        };

        let mut filters_by_id = HashMap::new();
        let mut filter_options_by_id = HashMap::new();
        let mut filter_options_by_key = HashMap::new();
        for (fi, filter) in document.filters.iter().enumerate() {
            insert_unique(&mut filters_by_id, filter.id.clone(), fi, "filter")?;
            claim_column(&filter.column)?;
            for (oi, option) in filter.options.iter().enumerate() {
                insert_unique(&mut filter_options_by_id, option.id.clone(), (fi, oi), "filter option")?;
                if filter_options_by_key
                    .insert(option.surrogate_key, (fi, oi))
                    .is_some()
                {
                    return Err(CatalogError::DuplicateKey {
                        kind: "filter option",
                        key: option.surrogate_key,
                    });
                }
            }
        }

        let mut indicators_by_id = HashMap::new();
        for (ii, indicator) in document.indicators.iter().enumerate() {
            insert_unique(&mut indicators_by_id, indicator.id.clone(), ii, "indicator")?;
            claim_column(&indicator.column)?;
        }

        let mut geographic_levels = document.geographic_levels.clone();
        let mut locations: HashMap<GeographicLevel, LocationIndex> = HashMap::new();
        let mut location_keys = HashSet::new();
        for (li, level) in document.locations.iter().enumerate() {
            if locations.contains_key(&level.level) {
                return Err(CatalogError::DuplicateId {
                    kind: "location level",
                    id: level.level.code().to_string(),
                });
            }
            claim_column(&CatalogColumn::for_location_level(level.level))?;
            if !geographic_levels.contains(&level.level) {
                geographic_levels.push(level.level);
            }

            let mut index = LocationIndex {
                level_position: li,
                ..LocationIndex::default()
            };
            let mut ids = HashMap::new();
            for (oi, option) in level.options.iter().enumerate() {
                insert_unique(&mut ids, option.id.clone(), oi, "location")?;
                if !location_keys.insert(option.surrogate_key) {
                    return Err(CatalogError::DuplicateKey {
                        kind: "location",
                        key: option.surrogate_key,
                    });
                }
                index.by_key.insert(option.surrogate_key, oi);
                for (property, value) in location_properties(option) {
                    index
                        .by_property
                        .entry(property)
                        .or_default()
                        .entry(value.to_string())
                        .or_insert(oi);
                }
            }
            locations.insert(level.level, index);
        }
        geographic_levels.sort();
        geographic_levels.dedup();
        let geographic_level_set = geographic_levels.iter().copied().collect();

        let mut time_period_keys = Vec::with_capacity(document.time_periods.len());
        let mut time_periods_by_key = HashMap::new();
        let mut time_periods_by_surrogate = HashMap::new();
        for (ti, period) in document.time_periods.iter().enumerate() {
            let year = parse_period_year(&period.period).map_err(|source| {
                CatalogError::InvalidTimePeriod {
                    period: period.period.clone(),
                    source,
                }
            })?;
            let key = TimePeriodKey::new(year, period.code);
            if time_periods_by_key.insert(key, ti).is_some() {
                return Err(CatalogError::DuplicateId {
                    kind: "time period",
                    id: key.to_string(),
                });
            }
            if time_periods_by_surrogate
                .insert(period.surrogate_key, ti)
                .is_some()
            {
                return Err(CatalogError::DuplicateKey {
                    kind: "time period",
                    key: period.surrogate_key,
                });
            }
            time_period_keys.push(key);
        }
        let mut chronological: Vec<usize> = (0..time_period_keys.len()).collect();
        chronological.sort_by_key(|&i| time_period_keys[i]);

        Ok(Self {
            document,
            filters_by_id,
            filter_options_by_id,
            filter_options_by_key,
            indicators_by_id,
            geographic_levels,
            geographic_level_set,
            locations,
            time_period_keys,
            time_periods_by_key,
            time_periods_by_surrogate,
            chronological,
        })
    }

    pub fn document(&self) -> &CatalogDocument {
        &self.document
    }

    // =========================================================================
    // Filters
    // =========================================================================

    pub fn filters(&self) -> &[FilterMeta] {
        &self.document.filters
    }

    pub fn lookup_filter(&self, id: &str) -> Option<&FilterMeta> {
        self.filters_by_id.get(id).map(|&i| &self.document.filters[i])
    }

    pub fn lookup_filter_option(&self, id: &str) -> Option<ResolvedFilterOption<'_>> {
        self.filter_options_by_id
            .get(id)
            .map(|&(fi, oi)| self.filter_option_at(fi, oi))
    }

    pub fn filter_option_by_key(&self, key: i64) -> Option<ResolvedFilterOption<'_>> {
        self.filter_options_by_key
            .get(&key)
            .map(|&(fi, oi)| self.filter_option_at(fi, oi))
    }

    fn filter_option_at(&self, fi: usize, oi: usize) -> ResolvedFilterOption<'_> {
        let filter = &self.document.filters[fi];
        ResolvedFilterOption {
            filter,
            option: &filter.options[oi],
        }
    }

    // =========================================================================
    // Indicators
    // =========================================================================

    pub fn indicators(&self) -> &[IndicatorMeta] {
        &self.document.indicators
    }

    pub fn lookup_indicator(&self, id: &str) -> Option<&IndicatorMeta> {
        self.indicator_position(id)
            .map(|i| &self.document.indicators[i])
    }

    /// Position of an indicator in [`MetadataCatalog::indicators`].
    pub fn indicator_position(&self, id: &str) -> Option<usize> {
        self.indicators_by_id.get(id).copied()
    }

    // =========================================================================
    // Geography
    // =========================================================================

    /// Levels present in this version, broadest first.
    pub fn geographic_levels(&self) -> &[GeographicLevel] {
        &self.geographic_levels
    }

    pub fn lookup_geographic_level(&self, level: GeographicLevel) -> bool {
        self.geographic_level_set.contains(&level)
    }

    /// Location levels in document order.
    pub fn location_levels(&self) -> &[LocationLevelMeta] {
        &self.document.locations
    }

    pub fn location_level(&self, level: GeographicLevel) -> Option<&LocationLevelMeta> {
        self.locations
            .get(&level)
            .map(|index| &self.document.locations[index.level_position])
    }

    pub fn lookup_location(
        &self,
        level: GeographicLevel,
        property: LocationProperty,
        value: &str,
    ) -> Option<&LocationOptionMeta> {
        let index = self.locations.get(&level)?;
        let position = *index.by_property.get(&property)?.get(value)?;
        Some(&self.document.locations[index.level_position].options[position])
    }

    pub fn location_by_key(&self, level: GeographicLevel, key: i64) -> Option<&LocationOptionMeta> {
        let index = self.locations.get(&level)?;
        let position = *index.by_key.get(&key)?;
        Some(&self.document.locations[index.level_position].options[position])
    }

    // =========================================================================
    // Time periods
    // =========================================================================

    pub fn lookup_time_period(&self, key: &TimePeriodKey) -> Option<ResolvedTimePeriod<'_>> {
        self.time_periods_by_key
            .get(key)
            .map(|&i| self.time_period_at(i))
    }

    pub fn time_period_by_key(&self, surrogate_key: i64) -> Option<ResolvedTimePeriod<'_>> {
        self.time_periods_by_surrogate
            .get(&surrogate_key)
            .map(|&i| self.time_period_at(i))
    }

    /// All time periods, earliest first.
    pub fn time_periods_chronological(&self) -> impl Iterator<Item = ResolvedTimePeriod<'_>> + '_ {
        self.chronological.iter().map(|&i| self.time_period_at(i))
    }

    fn time_period_at(&self, i: usize) -> ResolvedTimePeriod<'_> {
        ResolvedTimePeriod {
            key: self.time_period_keys[i],
            meta: &self.document.time_periods[i],
        }
    }
}

fn insert_unique<V>(
    map: &mut HashMap<String, V>,
    id: String,
    value: V,
    kind: &'static str,
) -> Result<(), CatalogError> {
    if map.contains_key(&id) {
        return Err(CatalogError::DuplicateId { kind, id });
    }
    map.insert(id, value);
    Ok(())
}

fn location_properties(option: &LocationOptionMeta) -> Vec<(LocationProperty, &str)> {
    let mut properties = vec![(LocationProperty::Id, option.id.as_str())];
    let optional = [
        (LocationProperty::Code, &option.code),
        (LocationProperty::OldCode, &option.old_code),
        (LocationProperty::Urn, &option.urn),
        (LocationProperty::LaEstab, &option.la_estab),
        (LocationProperty::Ukprn, &option.ukprn),
    ];
    for (property, value) in optional {
        if let Some(value) = value {
            properties.push((property, value.as_str()));
        }
    }
    properties
}
