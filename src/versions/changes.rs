//! Differences between two consecutive versions' catalogs.

use std::collections::HashMap;
use std::hash::Hash;

use serde::Serialize;

use crate::catalog::MetadataCatalog;
use crate::model::{GeographicLevel, TimePeriodKey, VersionNumber};

/// How an entry changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChangeKind {
    Added,
    Removed,
    Updated,
}

/// One changed entry. Added entries have no previous state, removed entries
/// no current state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Change<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_state: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_state: Option<T>,
}

impl<T> Change<T> {
    pub fn kind(&self) -> ChangeKind {
        match (&self.previous_state, &self.current_state) {
            (None, _) => ChangeKind::Added,
            (_, None) => ChangeKind::Removed,
            _ => ChangeKind::Updated,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    pub id: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptionState {
    pub filter_id: String,
    pub id: String,
    pub label: String,
    pub is_aggregate: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorState {
    pub id: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decimal_places: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeographicLevelState {
    pub code: GeographicLevel,
    pub label: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimePeriodState {
    pub period: String,
    pub code: String,
    pub label: String,
}

/// Everything that changed from one version to the next.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionChangeSet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_version: Option<VersionNumber>,
    pub version: VersionNumber,
    pub filters: Vec<Change<FilterState>>,
    pub filter_options: Vec<Change<FilterOptionState>>,
    pub indicators: Vec<Change<IndicatorState>>,
    pub geographic_levels: Vec<Change<GeographicLevelState>>,
    pub time_periods: Vec<Change<TimePeriodState>>,
}

impl VersionChangeSet {
    /// The change set of a version with no predecessor.
    pub fn initial(version: VersionNumber) -> Self {
        Self {
            previous_version: None,
            version,
            filters: Vec::new(),
            filter_options: Vec::new(),
            indicators: Vec::new(),
            geographic_levels: Vec::new(),
            time_periods: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
            && self.filter_options.is_empty()
            && self.indicators.is_empty()
            && self.geographic_levels.is_empty()
            && self.time_periods.is_empty()
    }
}

/// Compare two catalogs. Entries are matched on their public identifiers.
pub fn diff(
    previous_version: VersionNumber,
    previous: &MetadataCatalog,
    version: VersionNumber,
    current: &MetadataCatalog,
) -> VersionChangeSet {
    VersionChangeSet {
        previous_version: Some(previous_version),
        version,
        filters: diff_keyed(filter_states(previous), filter_states(current)),
        filter_options: diff_keyed(option_states(previous), option_states(current)),
        indicators: diff_keyed(indicator_states(previous), indicator_states(current)),
        geographic_levels: diff_keyed(level_states(previous), level_states(current)),
        time_periods: diff_keyed(time_period_states(previous), time_period_states(current)),
    }
}

/// Removed and updated entries in previous order, then added entries in
/// current order.
fn diff_keyed<K, T>(previous: Vec<(K, T)>, current: Vec<(K, T)>) -> Vec<Change<T>>
where
    K: Eq + Hash + Clone,
    T: PartialEq,
{
    let mut current_by_key: HashMap<K, usize> = HashMap::with_capacity(current.len());
    for (i, (key, _)) in current.iter().enumerate() {
        current_by_key.entry(key.clone()).or_insert(i);
    }

    let mut current: Vec<Option<(K, T)>> = current.into_iter().map(Some).collect();
    let mut changes = Vec::new();
    for (key, before) in previous {
        match current_by_key.get(&key).and_then(|&i| current[i].take()) {
            Some((_, after)) => {
                if before != after {
                    changes.push(Change {
                        previous_state: Some(before),
                        current_state: Some(after),
                    });
                }
            }
            None => changes.push(Change {
                previous_state: Some(before),
                current_state: None,
            }),
        }
    }
    changes.extend(current.into_iter().flatten().map(|(_, after)| Change {
        previous_state: None,
        current_state: Some(after),
    }));
    changes
}

fn filter_states(catalog: &MetadataCatalog) -> Vec<(String, FilterState)> {
    catalog
        .filters()
        .iter()
        .map(|f| {
            (
                f.id.clone(),
                FilterState {
                    id: f.id.clone(),
                    label: f.label.clone(),
                    hint: f.hint.clone(),
                },
            )
        })
        .collect()
}

fn option_states(catalog: &MetadataCatalog) -> Vec<(String, FilterOptionState)> {
    catalog
        .filters()
        .iter()
        .flat_map(|f| {
            f.options.iter().map(move |o| {
                (
                    o.id.clone(),
                    FilterOptionState {
                        filter_id: f.id.clone(),
                        id: o.id.clone(),
                        label: o.label.clone(),
                        is_aggregate: o.is_aggregate,
                    },
                )
            })
        })
        .collect()
}

fn indicator_states(catalog: &MetadataCatalog) -> Vec<(String, IndicatorState)> {
    catalog
        .indicators()
        .iter()
        .map(|i| {
            (
                i.id.clone(),
                IndicatorState {
                    id: i.id.clone(),
                    label: i.label.clone(),
                    unit: i.unit.clone(),
                    decimal_places: i.decimal_places,
                },
            )
        })
        .collect()
}

fn level_states(catalog: &MetadataCatalog) -> Vec<(GeographicLevel, GeographicLevelState)> {
    catalog
        .geographic_levels()
        .iter()
        .map(|&level| {
            (
                level,
                GeographicLevelState {
                    code: level,
                    label: level.label(),
                },
            )
        })
        .collect()
}

fn time_period_states(catalog: &MetadataCatalog) -> Vec<(TimePeriodKey, TimePeriodState)> {
    catalog
        .time_periods_chronological()
        .map(|p| {
            (
                p.key,
                TimePeriodState {
                    period: p.key.period(),
                    code: p.key.identifier.code(),
                    label: format!("{} {}", p.key.period(), p.key.identifier.label()),
                },
            )
        })
        .collect()
}
