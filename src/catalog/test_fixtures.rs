//! A small catalog shared by unit tests.

use super::document::*;
use crate::model::{GeographicLevel, TimeIdentifier};
use crate::sql::CatalogColumn;

fn column(name: &str) -> CatalogColumn {
    CatalogColumn::new(name).unwrap()
}

fn filter_option(id: &str, label: &str, key: i64) -> FilterOptionMeta {
    FilterOptionMeta {
        id: id.into(),
        label: label.into(),
        surrogate_key: key,
        is_aggregate: false,
    }
}

fn location(id: &str, label: &str, key: i64, code: &str, old_code: Option<&str>) -> LocationOptionMeta {
    LocationOptionMeta {
        id: id.into(),
        label: label.into(),
        surrogate_key: key,
        code: Some(code.into()),
        old_code: old_code.map(Into::into),
        urn: None,
        la_estab: None,
        ukprn: None,
    }
}

/// Two filters, two indicators, NAT/REG/LA locations and three academic years
/// whose surrogate keys are not in chronological order.
pub fn sample_document() -> CatalogDocument {
    CatalogDocument {
        filters: vec![
            FilterMeta {
                id: "school_type".into(),
                column: column("school_type"),
                label: "School type".into(),
                hint: None,
                options: vec![
                    filter_option("fo-primary", "State-funded primary", 11),
                    filter_option("fo-secondary", "State-funded secondary", 12),
                    FilterOptionMeta {
                        is_aggregate: true,
                        ..filter_option("fo-total", "Total", 13)
                    },
                ],
            },
            FilterMeta {
                id: "ncyear".into(),
                column: column("ncyear"),
                label: "National curriculum year".into(),
                hint: Some("Year group".into()),
                options: vec![
                    filter_option("fo-y1", "Year 1", 21),
                    filter_option("fo-y2", "Year 2", 22),
                ],
            },
        ],
        indicators: vec![
            IndicatorMeta {
                id: "sess_auth".into(),
                column: column("sess_auth"),
                label: "Authorised absence rate".into(),
                unit: Some("%".into()),
                decimal_places: Some(1),
            },
            IndicatorMeta {
                id: "enrolments".into(),
                column: column("enrolments"),
                label: "Number of enrolments".into(),
                unit: None,
                decimal_places: Some(0),
            },
        ],
        geographic_levels: vec![
            GeographicLevel::Country,
            GeographicLevel::Region,
            GeographicLevel::LocalAuthority,
        ],
        locations: vec![
            LocationLevelMeta {
                level: GeographicLevel::Country,
                options: vec![location("loc-england", "England", 101, "E92000001", None)],
            },
            LocationLevelMeta {
                level: GeographicLevel::Region,
                options: vec![location(
                    "loc-yorks",
                    "Yorkshire and The Humber",
                    201,
                    "E12000003",
                    None,
                )],
            },
            LocationLevelMeta {
                level: GeographicLevel::LocalAuthority,
                options: vec![
                    location("loc-sheffield", "Sheffield", 301, "E08000019", Some("373")),
                    location("loc-leeds", "Leeds", 302, "E08000035", Some("383")),
                ],
            },
        ],
        time_periods: vec![
            TimePeriodMeta {
                period: "2020/2021".into(),
                code: TimeIdentifier::AcademicYear,
                surrogate_key: 1,
            },
            TimePeriodMeta {
                period: "2019/2020".into(),
                code: TimeIdentifier::AcademicYear,
                surrogate_key: 2,
            },
            TimePeriodMeta {
                period: "2021/2022".into(),
                code: TimeIdentifier::AcademicYear,
                surrogate_key: 3,
            },
        ],
    }
}
