//! Geographic levels and location selectors.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::SelectorError;

/// A geographic level a location option belongs to.
///
/// Declaration order is the order levels sort in (broadest first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GeographicLevel {
    #[serde(rename = "NAT")]
    Country,
    #[serde(rename = "REG")]
    Region,
    #[serde(rename = "RSC")]
    RscRegion,
    #[serde(rename = "EDA")]
    EnglishDevolvedArea,
    #[serde(rename = "MCA")]
    MayoralCombinedAuthority,
    #[serde(rename = "LEP")]
    LocalEnterprisePartnership,
    #[serde(rename = "LSIP")]
    LocalSkillsImprovementPlanArea,
    #[serde(rename = "OA")]
    OpportunityArea,
    #[serde(rename = "PFA")]
    PoliceForceArea,
    #[serde(rename = "LA")]
    LocalAuthority,
    #[serde(rename = "LAD")]
    LocalAuthorityDistrict,
    #[serde(rename = "PCON")]
    ParliamentaryConstituency,
    #[serde(rename = "PA")]
    PlanningArea,
    #[serde(rename = "WARD")]
    Ward,
    #[serde(rename = "MAT")]
    MultiAcademyTrust,
    #[serde(rename = "SPON")]
    Sponsor,
    #[serde(rename = "INST")]
    Institution,
    #[serde(rename = "PROV")]
    Provider,
    #[serde(rename = "SCH")]
    School,
}

impl GeographicLevel {
    pub const ALL: [GeographicLevel; 19] = [
        GeographicLevel::Country,
        GeographicLevel::Region,
        GeographicLevel::RscRegion,
        GeographicLevel::EnglishDevolvedArea,
        GeographicLevel::MayoralCombinedAuthority,
        GeographicLevel::LocalEnterprisePartnership,
        GeographicLevel::LocalSkillsImprovementPlanArea,
        GeographicLevel::OpportunityArea,
        GeographicLevel::PoliceForceArea,
        GeographicLevel::LocalAuthority,
        GeographicLevel::LocalAuthorityDistrict,
        GeographicLevel::ParliamentaryConstituency,
        GeographicLevel::PlanningArea,
        GeographicLevel::Ward,
        GeographicLevel::MultiAcademyTrust,
        GeographicLevel::Sponsor,
        GeographicLevel::Institution,
        GeographicLevel::Provider,
        GeographicLevel::School,
    ];

    /// Public code, e.g. `LA`.
    pub fn code(self) -> &'static str {
        match self {
            GeographicLevel::Country => "NAT",
            GeographicLevel::Region => "REG",
            GeographicLevel::RscRegion => "RSC",
            GeographicLevel::EnglishDevolvedArea => "EDA",
            GeographicLevel::MayoralCombinedAuthority => "MCA",
            GeographicLevel::LocalEnterprisePartnership => "LEP",
            GeographicLevel::LocalSkillsImprovementPlanArea => "LSIP",
            GeographicLevel::OpportunityArea => "OA",
            GeographicLevel::PoliceForceArea => "PFA",
            GeographicLevel::LocalAuthority => "LA",
            GeographicLevel::LocalAuthorityDistrict => "LAD",
            GeographicLevel::ParliamentaryConstituency => "PCON",
            GeographicLevel::PlanningArea => "PA",
            GeographicLevel::Ward => "WARD",
            GeographicLevel::MultiAcademyTrust => "MAT",
            GeographicLevel::Sponsor => "SPON",
            GeographicLevel::Institution => "INST",
            GeographicLevel::Provider => "PROV",
            GeographicLevel::School => "SCH",
        }
    }

    /// Human-readable label, used as a CSV header.
    pub fn label(self) -> &'static str {
        match self {
            GeographicLevel::Country => "National",
            GeographicLevel::Region => "Regional",
            GeographicLevel::RscRegion => "RSC region",
            GeographicLevel::EnglishDevolvedArea => "English devolved area",
            GeographicLevel::MayoralCombinedAuthority => "Mayoral combined authority",
            GeographicLevel::LocalEnterprisePartnership => "Local enterprise partnership",
            GeographicLevel::LocalSkillsImprovementPlanArea => "Local skills improvement plan area",
            GeographicLevel::OpportunityArea => "Opportunity area",
            GeographicLevel::PoliceForceArea => "Police force area",
            GeographicLevel::LocalAuthority => "Local authority",
            GeographicLevel::LocalAuthorityDistrict => "Local authority district",
            GeographicLevel::ParliamentaryConstituency => "Parliamentary constituency",
            GeographicLevel::PlanningArea => "Planning area",
            GeographicLevel::Ward => "Ward",
            GeographicLevel::MultiAcademyTrust => "Multi-academy trust",
            GeographicLevel::Sponsor => "Sponsor",
            GeographicLevel::Institution => "Institution",
            GeographicLevel::Provider => "Provider",
            GeographicLevel::School => "School",
        }
    }

    /// Sort position (broadest level first).
    pub fn ordinal(self) -> usize {
        self as usize
    }

    /// Parse a public code. Case-sensitive, as published.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|level| level.code() == code)
    }
}

impl fmt::Display for GeographicLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for GeographicLevel {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s).ok_or_else(|| SelectorError::UnknownGeographicLevel(s.to_string()))
    }
}

/// The property a location selector matches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocationProperty {
    Id,
    Code,
    OldCode,
    Urn,
    LaEstab,
    Ukprn,
}

impl LocationProperty {
    pub fn name(self) -> &'static str {
        match self {
            LocationProperty::Id => "id",
            LocationProperty::Code => "code",
            LocationProperty::OldCode => "oldCode",
            LocationProperty::Urn => "urn",
            LocationProperty::LaEstab => "laEstab",
            LocationProperty::Ukprn => "ukprn",
        }
    }
}

impl FromStr for LocationProperty {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(LocationProperty::Id),
            "code" => Ok(LocationProperty::Code),
            "oldCode" => Ok(LocationProperty::OldCode),
            "urn" => Ok(LocationProperty::Urn),
            "laEstab" => Ok(LocationProperty::LaEstab),
            "ukprn" => Ok(LocationProperty::Ukprn),
            other => Err(SelectorError::UnknownLocationProperty(other.to_string())),
        }
    }
}

/// `{levelCode}|{property}|{value}`, e.g. `LA|code|E08000019`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationSelector {
    pub level: GeographicLevel,
    pub property: LocationProperty,
    pub value: String,
}

impl FromStr for LocationSelector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, '|');
        let (Some(level), Some(property), Some(value)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(SelectorError::Malformed {
                input: s.to_string(),
                expected: "{level}|{property}|{value}",
            });
        };
        if value.is_empty() {
            return Err(SelectorError::Malformed {
                input: s.to_string(),
                expected: "{level}|{property}|{value}",
            });
        }
        Ok(Self {
            level: level.parse()?,
            property: property.parse()?,
            value: value.to_string(),
        })
    }
}

impl fmt::Display for LocationSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}|{}", self.level, self.property.name(), self.value)
    }
}
