use std::cmp::Ordering;

use crate::catalog::MetadataCatalog;
use crate::model::{TimePeriodCriteria, TimePeriodKey};
use crate::query::state::{child_path, ErrorCode, QueryState, WarningCode};
use crate::sql::{FixedColumn, Predicate, SqlValue};

use super::{ColumnMatch, FacetParser, Resolution};

/// `{period}|{code}` selectors against the `time_period_id` column.
///
/// Range operators compare in (start year, identifier) order and compile to
/// the set of catalog periods on the requested side of the bound.
pub struct TimePeriodParser<'a> {
    catalog: &'a MetadataCatalog,
}

#[derive(Debug, Clone, Copy)]
enum RangeOp {
    Gt,
    Gte,
    Lt,
    Lte,
}

impl RangeOp {
    fn name(self) -> &'static str {
        match self {
            RangeOp::Gt => "gt",
            RangeOp::Gte => "gte",
            RangeOp::Lt => "lt",
            RangeOp::Lte => "lte",
        }
    }

    /// Whether a period ordered `ordering` relative to the bound is kept.
    fn admits(self, ordering: Ordering) -> bool {
        match self {
            RangeOp::Gt => ordering == Ordering::Greater,
            RangeOp::Gte => ordering != Ordering::Less,
            RangeOp::Lt => ordering == Ordering::Less,
            RangeOp::Lte => ordering != Ordering::Greater,
        }
    }
}

impl<'a> TimePeriodParser<'a> {
    pub fn new(catalog: &'a MetadataCatalog) -> Self {
        Self { catalog }
    }

    /// Compile a full time-period block: equality operators AND'd with ranges.
    pub fn parse_periods(
        &self,
        criteria: &TimePeriodCriteria,
        path: &str,
        state: &mut QueryState,
    ) -> Predicate {
        let mut parts = vec![self.parse(&criteria.equality(), path, state)];
        let ranges = [
            (RangeOp::Gt, &criteria.gt),
            (RangeOp::Gte, &criteria.gte),
            (RangeOp::Lt, &criteria.lt),
            (RangeOp::Lte, &criteria.lte),
        ];
        for (op, bound) in ranges {
            if let Some(raw) = bound {
                parts.push(self.parse_range(op, raw, &child_path(path, op.name()), state));
            }
        }
        Predicate::and(parts)
    }

    fn parse_range(&self, op: RangeOp, raw: &str, path: &str, state: &mut QueryState) -> Predicate {
        let Some(bound) = self.parse_key(raw, path, state) else {
            return Predicate::Const(false);
        };
        if self.catalog.lookup_time_period(&bound).is_none() {
            state.warn_not_found(Self::NOT_FOUND, path, vec![raw.to_string()]);
            return Predicate::Const(false);
        }

        let ids = self
            .catalog
            .time_periods_chronological()
            .filter(|period| op.admits(period.key.cmp(&bound)))
            .map(|period| SqlValue::Int(period.meta.surrogate_key))
            .collect();
        Predicate::in_list(FixedColumn::TimePeriodId, ids)
    }

    fn parse_key(&self, raw: &str, path: &str, state: &mut QueryState) -> Option<TimePeriodKey> {
        match raw.parse::<TimePeriodKey>() {
            Ok(key) => Some(key),
            Err(e) => {
                state.error(ErrorCode::InvalidTimePeriod, path, e.to_string());
                None
            }
        }
    }
}

impl FacetParser for TimePeriodParser<'_> {
    const NOT_FOUND: WarningCode = WarningCode::TimePeriodsNotFound;

    fn resolve(&self, raw: &str, path: &str, state: &mut QueryState) -> Resolution {
        let Some(key) = self.parse_key(raw, path, state) else {
            return Resolution::Invalid;
        };
        match self.catalog.lookup_time_period(&key) {
            Some(period) => Resolution::Found(ColumnMatch {
                column: FixedColumn::TimePeriodId.into(),
                value: SqlValue::Int(period.meta.surrogate_key),
            }),
            None => Resolution::NotFound,
        }
    }
}
