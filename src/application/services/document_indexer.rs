use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use crate::application::ports::{ObjectSource, ObjectSourceError};
use crate::domain::{Document, ObjectLocation};

use super::{IngestionError, IngestionService, IngestionSummary};

/// Handles object-created notifications: downloads the object, then ingests it.
pub struct DocumentIndexer {
    object_source: Arc<dyn ObjectSource>,
    ingestion_service: Arc<IngestionService>,
    download_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedObject {
    pub location: ObjectLocation,
    pub local_path: PathBuf,
    pub summary: IngestionSummary,
}

impl DocumentIndexer {
    pub fn new(
        object_source: Arc<dyn ObjectSource>,
        ingestion_service: Arc<IngestionService>,
        download_dir: PathBuf,
    ) -> Self {
        Self {
            object_source,
            ingestion_service,
            download_dir,
        }
    }

    #[tracing::instrument(skip(self), fields(bucket = %location.bucket, key = %location.key))]
    pub async fn index_object(
        &self,
        location: &ObjectLocation,
    ) -> Result<IndexedObject, IndexerError> {
        if !location.has_plain_bucket() {
            return Err(IndexerError::InvalidBucket(location.bucket.clone()));
        }
        let local_path = self.local_path_for(&location.key)?;

        let data = self
            .object_source
            .fetch(location)
            .await
            .map_err(IndexerError::Download)?;

        if let Some(parent) = local_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| IndexerError::Io(local_path.clone(), e))?;
        }
        tokio::fs::write(&local_path, &data)
            .await
            .map_err(|e| IndexerError::Io(local_path.clone(), e))?;

        tracing::info!(
            path = %local_path.display(),
            bytes = data.len(),
            "Downloaded document"
        );

        let text = String::from_utf8(data)
            .map_err(|e| IndexerError::InvalidEncoding(location.to_string(), e.to_string()))?;
        let document = Document::new(location.to_string(), text);

        let summary = self.ingestion_service.ingest(&document).await?;

        Ok(IndexedObject {
            location: location.clone(),
            local_path,
            summary,
        })
    }

    /// Maps an object key onto the download directory, refusing keys that
    /// would escape it.
    fn local_path_for(&self, key: &str) -> Result<PathBuf, IndexerError> {
        if key.is_empty() || key.split('/').any(|segment| segment.is_empty()) {
            return Err(IndexerError::InvalidKey(key.to_string()));
        }

        let relative = Path::new(key);
        let is_plain = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !is_plain {
            return Err(IndexerError::InvalidKey(key.to_string()));
        }

        Ok(self.download_dir.join(relative))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IndexerError {
    #[error("invalid bucket name: {0}")]
    InvalidBucket(String),
    #[error("invalid object key: {0}")]
    InvalidKey(String),
    #[error("download: {0}")]
    Download(#[from] ObjectSourceError),
    #[error("writing {}: {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),
    #[error("object {0} is not valid UTF-8: {1}")]
    InvalidEncoding(String, String),
    #[error(transparent)]
    Ingestion(#[from] IngestionError),
}
