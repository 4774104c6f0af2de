//! Data sets, versions and version selectors.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::SelectorError;

/// `{major}.{minor}`, e.g. `1.2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionNumber {
    pub major: u32,
    pub minor: u32,
}

impl VersionNumber {
    pub fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Directory name holding this version's files, e.g. `v1.2`.
    pub fn directory_name(&self) -> String {
        format!("v{}", self)
    }
}

impl fmt::Display for VersionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for VersionNumber {
    type Err = SelectorError;

    /// Accepts `1.2` and `v1.2`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SelectorError::InvalidVersion(s.to_string());
        let body = s.strip_prefix('v').unwrap_or(s);
        let (major, minor) = body.split_once('.').ok_or_else(invalid)?;
        let major: u32 = major.parse().map_err(|_| invalid())?;
        let minor: u32 = minor.parse().map_err(|_| invalid())?;
        if major == 0 {
            return Err(invalid());
        }
        Ok(Self { major, minor })
    }
}

impl TryFrom<String> for VersionNumber {
    type Error = SelectorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<VersionNumber> for String {
    fn from(version: VersionNumber) -> Self {
        version.to_string()
    }
}

/// A requested version: exact, a wildcard minor, or the latest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VersionSelector {
    #[default]
    Latest,
    Exact(VersionNumber),
    /// `{major}.*`
    LatestMinor { major: u32 },
}

impl VersionSelector {
    /// Parse an optional selector; absent or blank means latest.
    pub fn parse_optional(value: Option<&str>) -> Result<Self, SelectorError> {
        match value.map(str::trim) {
            None | Some("") => Ok(VersionSelector::Latest),
            Some(s) => s.parse(),
        }
    }
}

impl FromStr for VersionSelector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "*" {
            return Ok(VersionSelector::Latest);
        }
        let body = s.strip_prefix('v').unwrap_or(s);
        if let Some(major) = body.strip_suffix(".*") {
            let major: u32 = major
                .parse()
                .map_err(|_| SelectorError::InvalidVersion(s.to_string()))?;
            if major == 0 {
                return Err(SelectorError::InvalidVersion(s.to_string()));
            }
            return Ok(VersionSelector::LatestMinor { major });
        }
        Ok(VersionSelector::Exact(s.parse()?))
    }
}

impl fmt::Display for VersionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionSelector::Latest => f.write_str("*"),
            VersionSelector::Exact(v) => write!(f, "{}", v),
            VersionSelector::LatestMinor { major } => write!(f, "{}.*", major),
        }
    }
}

/// Lifecycle state of a version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionStatus {
    Draft,
    Published,
    Deprecated,
    Withdrawn,
}

impl VersionStatus {
    pub fn is_draft(self) -> bool {
        matches!(self, VersionStatus::Draft)
    }
}

/// Where a version's store and catalog live.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionFiles {
    pub store: PathBuf,
    pub metadata: PathBuf,
}

/// One published (or draft) version of a data set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSetVersion {
    #[serde(skip)]
    pub data_set_id: Uuid,
    pub version: VersionNumber,
    pub status: VersionStatus,
    #[serde(default)]
    pub published: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(skip)]
    pub files: VersionFiles,
}

/// A data set and its versions, as stored in `data_set.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSet {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub versions: Vec<DataSetVersion>,
}
