use std::path::PathBuf;

use object_store::local::LocalFileSystem;

use crate::application::ports::{ObjectSource, ObjectSourceError};
use crate::domain::ObjectLocation;

/// Serves buckets as directories under a base path: `{base}/{bucket}/{key}`.
pub struct LocalObjectSource {
    base_path: PathBuf,
}

impl LocalObjectSource {
    pub fn new(base_path: PathBuf) -> Result<Self, ObjectSourceError> {
        std::fs::create_dir_all(&base_path)?;
        Ok(Self { base_path })
    }
}

#[async_trait::async_trait]
impl ObjectSource for LocalObjectSource {
    async fn fetch(&self, location: &ObjectLocation) -> Result<Vec<u8>, ObjectSourceError> {
        if !location.has_plain_bucket() {
            return Err(ObjectSourceError::NotFound(location.to_string()));
        }

        let bucket_root = self.base_path.join(&location.bucket);
        if !bucket_root.is_dir() {
            return Err(ObjectSourceError::NotFound(location.to_string()));
        }

        let fs = LocalFileSystem::new_with_prefix(bucket_root)
            .map_err(|e| ObjectSourceError::Configuration(e.to_string()))?;

        super::read_object(&fs, &location.key).await
    }
}
