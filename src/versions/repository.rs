//! Where data sets and their versions are recorded.
//!
//! Layout under the storage root:
//!
//! ```text
//! {root}/{dataSetId}/data_set.json
//! {root}/{dataSetId}/v{major}.{minor}/data.db
//! {root}/{dataSetId}/v{major}.{minor}/metadata.json
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::{QueryError, QueryResult};
use crate::model::{DataSet, VersionFiles, VersionNumber};

pub const DATA_SET_FILE: &str = "data_set.json";
pub const STORE_FILE: &str = "data.db";
pub const METADATA_FILE: &str = "metadata.json";

/// Looks up data sets and their version lists.
#[async_trait]
pub trait VersionRepository: Send + Sync {
    /// The data set with every version, drafts included. `None` if unknown.
    async fn data_set(&self, id: Uuid) -> QueryResult<Option<DataSet>>;
}

/// Reads `data_set.json` files under a root directory.
#[derive(Debug, Clone)]
pub struct FileVersionRepository {
    root: PathBuf,
}

impl FileVersionRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Files of one version under this root.
    pub fn version_files(&self, data_set_id: Uuid, version: VersionNumber) -> VersionFiles {
        let dir = self
            .root
            .join(data_set_id.to_string())
            .join(version.directory_name());
        VersionFiles {
            store: dir.join(STORE_FILE),
            metadata: dir.join(METADATA_FILE),
        }
    }
}

#[async_trait]
impl VersionRepository for FileVersionRepository {
    async fn data_set(&self, id: Uuid) -> QueryResult<Option<DataSet>> {
        let path = self.root.join(id.to_string()).join(DATA_SET_FILE);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(QueryError::Storage(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        let mut data_set: DataSet = serde_json::from_slice(&bytes).map_err(|e| {
            QueryError::Storage(format!("failed to parse {}: {}", path.display(), e))
        })?;
        if data_set.id != id {
            return Err(QueryError::Storage(format!(
                "{} describes data set {}",
                path.display(),
                data_set.id
            )));
        }

        for version in &mut data_set.versions {
            version.data_set_id = id;
            version.files = self.version_files(id, version.version);
        }
        Ok(Some(data_set))
    }
}

/// Data sets held in memory, for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryVersionRepository {
    data_sets: HashMap<Uuid, DataSet>,
}

impl InMemoryVersionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, mut data_set: DataSet) {
        for version in &mut data_set.versions {
            version.data_set_id = data_set.id;
        }
        self.data_sets.insert(data_set.id, data_set);
    }
}

#[async_trait]
impl VersionRepository for InMemoryVersionRepository {
    async fn data_set(&self, id: Uuid) -> QueryResult<Option<DataSet>> {
        Ok(self.data_sets.get(&id).cloned())
    }
}
