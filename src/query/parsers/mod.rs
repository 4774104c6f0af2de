//! Facet parsers: one facet's criteria to one predicate.
//!
//! Each parser resolves public values against the catalog. The shared
//! [`FacetParser::parse`] handles `eq`, `notEq`, `in` and `notIn`:
//!
//! - unresolved `eq` is `false`, unresolved `notEq` is `true`, each with a warning
//! - `in`/`notIn` drop unresolved values and emit one warning listing them
//! - resolved values are grouped per physical column, the groups OR'd for
//!   `in` and AND'd for `notIn`

mod filter;
mod geographic_level;
mod location;
mod time_period;

pub use filter::FilterParser;
pub use geographic_level::GeographicLevelParser;
pub use location::LocationParser;
pub use time_period::TimePeriodParser;

use crate::model::FacetCriteria;
use crate::sql::{CompareOp, ColumnRef, Predicate, SqlValue};

use super::state::{child_path, QueryState, WarningCode};

/// Outcome of resolving one public value.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The value names this column and bound value.
    Found(ColumnMatch),
    /// Well-formed but absent from the catalog.
    NotFound,
    /// Malformed; an error has been recorded.
    Invalid,
}

/// The physical column and surrogate value a public value resolves to.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMatch {
    pub column: ColumnRef,
    pub value: SqlValue,
}

/// A parser for one facet.
pub trait FacetParser {
    /// Warning code for values that resolve to nothing.
    const NOT_FOUND: WarningCode;

    /// Whether rows may hold NULL in the matched column. Negations are then
    /// written so those rows still match.
    const NULLABLE: bool = false;

    fn resolve(&self, raw: &str, path: &str, state: &mut QueryState) -> Resolution;

    /// Compile the equality operators of one facet block.
    fn parse(&self, criteria: &FacetCriteria, path: &str, state: &mut QueryState) -> Predicate {
        let mut parts = Vec::new();

        if let Some(raw) = &criteria.eq {
            let path = child_path(path, "eq");
            parts.push(match self.resolve(raw, &path, state) {
                Resolution::Found(m) => Predicate::eq(m.column, m.value),
                Resolution::NotFound => {
                    state.warn_not_found(Self::NOT_FOUND, &path, vec![raw.clone()]);
                    Predicate::Const(false)
                }
                Resolution::Invalid => Predicate::Const(false),
            });
        }

        if let Some(raw) = &criteria.not_eq {
            let path = child_path(path, "notEq");
            parts.push(match self.resolve(raw, &path, state) {
                Resolution::Found(m) if Self::NULLABLE => Predicate::ne_or_null(m.column, m.value),
                Resolution::Found(m) => Predicate::compare(m.column, CompareOp::Ne, m.value),
                Resolution::NotFound => {
                    state.warn_not_found(Self::NOT_FOUND, &path, vec![raw.clone()]);
                    Predicate::Const(true)
                }
                Resolution::Invalid => Predicate::Const(true),
            });
        }

        if let Some(values) = &criteria.in_ {
            let path = child_path(path, "in");
            let groups = self.resolve_grouped(values, &path, state);
            parts.push(Predicate::or(
                groups
                    .into_iter()
                    .map(|(column, values)| Predicate::in_list(column, values)),
            ));
        }

        if let Some(values) = &criteria.not_in {
            let path = child_path(path, "notIn");
            let groups = self.resolve_grouped(values, &path, state);
            parts.push(Predicate::and(groups.into_iter().map(|(column, values)| {
                if Self::NULLABLE {
                    Predicate::not_in_or_null(column, values)
                } else {
                    Predicate::not_in_list(column, values)
                }
            })));
        }

        Predicate::and(parts)
    }

    /// Resolve a value list, grouping matches by column in first-seen order.
    ///
    /// Unresolved values are reported in a single warning.
    fn resolve_grouped(
        &self,
        values: &[String],
        path: &str,
        state: &mut QueryState,
    ) -> Vec<(ColumnRef, Vec<SqlValue>)> {
        let mut groups: Vec<(ColumnRef, Vec<SqlValue>)> = Vec::new();
        let mut missing: Vec<String> = Vec::new();

        for raw in values {
            match self.resolve(raw, path, state) {
                Resolution::Found(m) => {
                    match groups.iter_mut().find(|(column, _)| *column == m.column) {
                        Some((_, group)) => {
                            if !group.contains(&m.value) {
                                group.push(m.value);
                            }
                        }
                        None => groups.push((m.column, vec![m.value])),
                    }
                }
                Resolution::NotFound => {
                    if !missing.contains(raw) {
                        missing.push(raw.clone());
                    }
                }
                Resolution::Invalid => {}
            }
        }

        if !missing.is_empty() {
            state.warn_not_found(Self::NOT_FOUND, path, missing);
        }
        groups
    }
}
