//! Time identifiers, periods and time-period selectors.
//!
//! A time period is a start year plus a [`TimeIdentifier`]. Periods spanning
//! two calendar years can be written `2020`, `2020/2021` or `2020/21`; all
//! three name the same period.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::SelectorError;

/// The kind of period a row's time period refers to.
///
/// Declaration order (then the month/week number) is the order periods within
/// the same start year sort in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TimeIdentifier {
    AcademicYear,
    AcademicYearQ1,
    AcademicYearQ2,
    AcademicYearQ3,
    AcademicYearQ4,
    CalendarYear,
    CalendarYearQ1,
    CalendarYearQ2,
    CalendarYearQ3,
    CalendarYearQ4,
    FinancialYear,
    FinancialYearQ1,
    FinancialYearQ2,
    FinancialYearQ3,
    FinancialYearQ4,
    TaxYear,
    TaxYearQ1,
    TaxYearQ2,
    TaxYearQ3,
    TaxYearQ4,
    ReportingYear,
    AutumnTerm,
    AutumnSpringTerm,
    SpringTerm,
    SummerTerm,
    /// `M1` to `M12`.
    Month(u8),
    /// `W1` to `W53`.
    Week(u8),
}

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const FIXED: [(TimeIdentifier, &str, &str); 25] = [
    (TimeIdentifier::AcademicYear, "AY", "Academic year"),
    (TimeIdentifier::AcademicYearQ1, "AYQ1", "Academic year Q1"),
    (TimeIdentifier::AcademicYearQ2, "AYQ2", "Academic year Q2"),
    (TimeIdentifier::AcademicYearQ3, "AYQ3", "Academic year Q3"),
    (TimeIdentifier::AcademicYearQ4, "AYQ4", "Academic year Q4"),
    (TimeIdentifier::CalendarYear, "CY", "Calendar year"),
    (TimeIdentifier::CalendarYearQ1, "CYQ1", "Calendar year Q1"),
    (TimeIdentifier::CalendarYearQ2, "CYQ2", "Calendar year Q2"),
    (TimeIdentifier::CalendarYearQ3, "CYQ3", "Calendar year Q3"),
    (TimeIdentifier::CalendarYearQ4, "CYQ4", "Calendar year Q4"),
    (TimeIdentifier::FinancialYear, "FY", "Financial year"),
    (TimeIdentifier::FinancialYearQ1, "FYQ1", "Financial year Q1"),
    (TimeIdentifier::FinancialYearQ2, "FYQ2", "Financial year Q2"),
    (TimeIdentifier::FinancialYearQ3, "FYQ3", "Financial year Q3"),
    (TimeIdentifier::FinancialYearQ4, "FYQ4", "Financial year Q4"),
    (TimeIdentifier::TaxYear, "TY", "Tax year"),
    (TimeIdentifier::TaxYearQ1, "TYQ1", "Tax year Q1"),
    (TimeIdentifier::TaxYearQ2, "TYQ2", "Tax year Q2"),
    (TimeIdentifier::TaxYearQ3, "TYQ3", "Tax year Q3"),
    (TimeIdentifier::TaxYearQ4, "TYQ4", "Tax year Q4"),
    (TimeIdentifier::ReportingYear, "RY", "Reporting year"),
    (TimeIdentifier::AutumnTerm, "T1", "Autumn term"),
    (TimeIdentifier::AutumnSpringTerm, "T1T2", "Autumn and spring term"),
    (TimeIdentifier::SpringTerm, "T2", "Spring term"),
    (TimeIdentifier::SummerTerm, "T3", "Summer term"),
];

impl TimeIdentifier {
    /// Public code, e.g. `AY` or `M3`.
    pub fn code(self) -> String {
        match self {
            TimeIdentifier::Month(m) => format!("M{}", m),
            TimeIdentifier::Week(w) => format!("W{}", w),
            fixed => FIXED
                .iter()
                .find(|(id, _, _)| *id == fixed)
                .map(|(_, code, _)| (*code).to_string())
                .unwrap_or_default(),
        }
    }

    /// Human-readable label, used in CSV cells.
    pub fn label(self) -> String {
        match self {
            TimeIdentifier::Month(m) => MONTHS
                .get(usize::from(m).saturating_sub(1))
                .map(|s| (*s).to_string())
                .unwrap_or_default(),
            TimeIdentifier::Week(w) => format!("Week {}", w),
            fixed => FIXED
                .iter()
                .find(|(id, _, _)| *id == fixed)
                .map(|(_, _, label)| (*label).to_string())
                .unwrap_or_default(),
        }
    }

    /// Parse a public code.
    pub fn from_code(code: &str) -> Option<Self> {
        if let Some((id, _, _)) = FIXED.iter().find(|(_, c, _)| *c == code) {
            return Some(*id);
        }
        if let Some(n) = code.strip_prefix('M').and_then(|n| n.parse::<u8>().ok()) {
            return (1..=12).contains(&n).then_some(TimeIdentifier::Month(n));
        }
        if let Some(n) = code.strip_prefix('W').and_then(|n| n.parse::<u8>().ok()) {
            return (1..=53).contains(&n).then_some(TimeIdentifier::Week(n));
        }
        None
    }

    /// Whether periods of this kind span two calendar years.
    pub fn spans_two_years(self) -> bool {
        matches!(
            self,
            TimeIdentifier::AcademicYear
                | TimeIdentifier::AcademicYearQ1
                | TimeIdentifier::AcademicYearQ2
                | TimeIdentifier::AcademicYearQ3
                | TimeIdentifier::AcademicYearQ4
                | TimeIdentifier::FinancialYear
                | TimeIdentifier::FinancialYearQ1
                | TimeIdentifier::FinancialYearQ2
                | TimeIdentifier::FinancialYearQ3
                | TimeIdentifier::FinancialYearQ4
                | TimeIdentifier::TaxYear
                | TimeIdentifier::TaxYearQ1
                | TimeIdentifier::TaxYearQ2
                | TimeIdentifier::TaxYearQ3
                | TimeIdentifier::TaxYearQ4
                | TimeIdentifier::AutumnTerm
                | TimeIdentifier::AutumnSpringTerm
                | TimeIdentifier::SpringTerm
                | TimeIdentifier::SummerTerm
        )
    }

    /// Position within a year.
    pub fn ordinal(self) -> usize {
        match self {
            TimeIdentifier::Month(m) => FIXED.len() + usize::from(m),
            TimeIdentifier::Week(w) => FIXED.len() + 12 + usize::from(w),
            fixed => FIXED
                .iter()
                .position(|(id, _, _)| *id == fixed)
                .unwrap_or(0),
        }
    }
}

impl fmt::Display for TimeIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code())
    }
}

impl FromStr for TimeIdentifier {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s).ok_or_else(|| SelectorError::UnknownTimeIdentifier(s.to_string()))
    }
}

impl TryFrom<String> for TimeIdentifier {
    type Error = SelectorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeIdentifier> for String {
    fn from(id: TimeIdentifier) -> Self {
        id.code()
    }
}

/// Parse the year part of a period: `2020`, `2020/2021` or `2020/21`.
///
/// Returns the start year.
pub fn parse_period_year(period: &str) -> Result<i32, SelectorError> {
    let invalid = || SelectorError::InvalidPeriod(period.to_string());
    let parse_year = |s: &str| -> Result<i32, SelectorError> {
        if s.len() == 4 && s.bytes().all(|b| b.is_ascii_digit()) {
            s.parse().map_err(|_| invalid())
        } else {
            Err(invalid())
        }
    };

    match period.split_once('/') {
        None => parse_year(period),
        Some((start, end)) => {
            let start = parse_year(start)?;
            let next = start + 1;
            let matches = match end.len() {
                4 => parse_year(end)? == next,
                2 if end.bytes().all(|b| b.is_ascii_digit()) => {
                    end.parse::<i32>().map_err(|_| invalid())? == next % 100
                }
                _ => false,
            };
            if matches {
                Ok(start)
            } else {
                Err(invalid())
            }
        }
    }
}

/// A normalized time period: start year plus identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimePeriodKey {
    pub year: i32,
    pub identifier: TimeIdentifier,
}

impl TimePeriodKey {
    pub fn new(year: i32, identifier: TimeIdentifier) -> Self {
        Self { year, identifier }
    }

    /// Canonical period text: `2020/2021` for two-year identifiers, else `2020`.
    pub fn period(&self) -> String {
        if self.identifier.spans_two_years() {
            format!("{}/{}", self.year, self.year + 1)
        } else {
            self.year.to_string()
        }
    }
}

impl Ord for TimePeriodKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.year
            .cmp(&other.year)
            .then_with(|| self.identifier.ordinal().cmp(&other.identifier.ordinal()))
    }
}

impl PartialOrd for TimePeriodKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for TimePeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.period(), self.identifier)
    }
}

impl FromStr for TimePeriodKey {
    type Err = SelectorError;

    /// `{period}|{code}`, e.g. `2020/2021|AY`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((period, code)) = s.split_once('|') else {
            return Err(SelectorError::Malformed {
                input: s.to_string(),
                expected: "{period}|{code}",
            });
        };
        Ok(Self {
            year: parse_period_year(period)?,
            identifier: code.parse()?,
        })
    }
}
