//! Where catalogs come from.

use async_trait::async_trait;

use super::document::CatalogDocument;
use super::lookup::MetadataCatalog;
use super::{CatalogError, CatalogResult};
use crate::model::DataSetVersion;

/// Loads the catalog of one data-set version.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn load(&self, version: &DataSetVersion) -> CatalogResult<MetadataCatalog>;
}

/// Reads `metadata.json` beside the version's store file.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileCatalogSource;

#[async_trait]
impl CatalogSource for FileCatalogSource {
    async fn load(&self, version: &DataSetVersion) -> CatalogResult<MetadataCatalog> {
        let not_found = |path: &std::path::Path| CatalogError::NotFound {
            data_set_id: version.data_set_id,
            version: version.version,
            path: path.to_path_buf(),
        };

        let store = &version.files.store;
        if !tokio::fs::try_exists(store).await.unwrap_or(false) {
            return Err(not_found(store));
        }

        let path = &version.files.metadata;
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(not_found(path)),
            Err(source) => {
                return Err(CatalogError::Io {
                    path: path.clone(),
                    source,
                })
            }
        };

        let document: CatalogDocument =
            serde_json::from_slice(&bytes).map_err(|source| CatalogError::Parse {
                path: path.clone(),
                source,
            })?;

        let catalog = MetadataCatalog::from_document(document)?;
        tracing::debug!(
            data_set_id = %version.data_set_id,
            version = %version.version,
            filters = catalog.filters().len(),
            indicators = catalog.indicators().len(),
            "loaded catalog"
        );
        Ok(catalog)
    }
}
