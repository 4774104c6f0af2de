//! Version selectors to stored versions.
//!
//! - `1.2` / `v1.2`: that exact version, unless it is a draft
//! - `2.*`: the highest published minor of major 2
//! - `*` or nothing: the latest published version

use std::sync::Arc;

use uuid::Uuid;

use crate::error::{QueryError, QueryResult};
use crate::model::{DataSet, DataSetVersion, Page, VersionNumber, VersionSelector, VersionStatus};

use super::repository::VersionRepository;

/// Pick the version a selector names. Pure; the async resolver delegates here.
pub fn select_version<'a>(
    versions: &'a [DataSetVersion],
    selector: &VersionSelector,
) -> Option<&'a DataSetVersion> {
    match selector {
        VersionSelector::Exact(number) => versions
            .iter()
            .find(|v| v.version == *number && !v.status.is_draft()),
        VersionSelector::LatestMinor { major } => versions
            .iter()
            .filter(|v| v.version.major == *major && v.status == VersionStatus::Published)
            .max_by_key(|v| v.version),
        VersionSelector::Latest => versions
            .iter()
            .filter(|v| v.status == VersionStatus::Published)
            .max_by_key(|v| v.version),
    }
}

/// Non-draft versions, oldest first.
pub fn visible_versions(versions: &[DataSetVersion]) -> Vec<&DataSetVersion> {
    let mut visible: Vec<&DataSetVersion> =
        versions.iter().filter(|v| !v.status.is_draft()).collect();
    visible.sort_by_key(|v| v.version);
    visible
}

/// The non-draft version released immediately before `version`.
pub fn predecessor(versions: &[DataSetVersion], version: VersionNumber) -> Option<&DataSetVersion> {
    visible_versions(versions)
        .into_iter()
        .take_while(|v| v.version < version)
        .last()
}

/// Check that `next` directly follows `previous` among non-draft versions.
pub fn check_successor(
    versions: &[DataSetVersion],
    previous: VersionNumber,
    next: VersionNumber,
) -> Result<(), String> {
    let visible = visible_versions(versions);
    let position = |n: VersionNumber| visible.iter().position(|v| v.version == n);
    match (position(previous), position(next)) {
        (Some(a), Some(b)) if b == a + 1 => Ok(()),
        (Some(_), Some(_)) => Err(format!(
            "version {} is not the version released after {}",
            next, previous
        )),
        (None, _) => Err(format!("version {} does not exist", previous)),
        (_, None) => Err(format!("version {} does not exist", next)),
    }
}

/// Resolves selectors against a [`VersionRepository`].
#[derive(Clone)]
pub struct VersionResolver {
    repository: Arc<dyn VersionRepository>,
}

impl VersionResolver {
    pub fn new(repository: Arc<dyn VersionRepository>) -> Self {
        Self { repository }
    }

    pub async fn data_set(&self, data_set_id: Uuid) -> QueryResult<DataSet> {
        self.repository
            .data_set(data_set_id)
            .await?
            .ok_or(QueryError::DataSetNotFound(data_set_id))
    }

    pub async fn resolve(
        &self,
        data_set_id: Uuid,
        selector: &VersionSelector,
    ) -> QueryResult<DataSetVersion> {
        let data_set = self.data_set(data_set_id).await?;
        let version = select_version(&data_set.versions, selector)
            .cloned()
            .ok_or_else(|| QueryError::VersionNotFound {
                data_set_id,
                selector: selector.to_string(),
            })?;
        tracing::debug!(
            data_set_id = %data_set_id,
            requested = %selector,
            resolved = %version.version,
            "resolved version"
        );
        Ok(version)
    }

    /// Non-draft versions, newest first.
    pub async fn list(
        &self,
        data_set_id: Uuid,
        page: u32,
        page_size: u32,
    ) -> QueryResult<Page<DataSetVersion>> {
        let data_set = self.data_set(data_set_id).await?;
        let mut visible: Vec<DataSetVersion> = visible_versions(&data_set.versions)
            .into_iter()
            .cloned()
            .collect();
        visible.reverse();
        Ok(Page::slice(&visible, page, page_size))
    }

    /// A version and the one released before it, if any.
    pub async fn with_predecessor(
        &self,
        data_set_id: Uuid,
        version: VersionNumber,
    ) -> QueryResult<(DataSetVersion, Option<DataSetVersion>)> {
        let data_set = self.data_set(data_set_id).await?;
        let current = select_version(&data_set.versions, &VersionSelector::Exact(version))
            .cloned()
            .ok_or_else(|| QueryError::VersionNotFound {
                data_set_id,
                selector: version.to_string(),
            })?;
        let previous = predecessor(&data_set.versions, version).cloned();
        Ok((current, previous))
    }

    /// Both versions of a comparison, checking they are consecutive.
    pub async fn consecutive_pair(
        &self,
        data_set_id: Uuid,
        previous: VersionNumber,
        next: VersionNumber,
    ) -> QueryResult<(DataSetVersion, DataSetVersion)> {
        let data_set = self.data_set(data_set_id).await?;
        check_successor(&data_set.versions, previous, next)
            .map_err(QueryError::InvalidVersionComparison)?;
        let find = |n: VersionNumber| {
            select_version(&data_set.versions, &VersionSelector::Exact(n))
                .cloned()
                .ok_or_else(|| QueryError::VersionNotFound {
                    data_set_id,
                    selector: n.to_string(),
                })
        };
        Ok((find(previous)?, find(next)?))
    }
}
