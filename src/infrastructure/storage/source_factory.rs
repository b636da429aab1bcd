use std::path::PathBuf;
use std::sync::Arc;

use crate::application::ports::{ObjectSource, ObjectSourceError};
use crate::presentation::config::{StorageProvider, StorageSettings};

use super::local_source::LocalObjectSource;
use super::s3_source::S3ObjectSource;

pub struct ObjectSourceFactory;

impl ObjectSourceFactory {
    pub fn create(settings: &StorageSettings) -> Result<Arc<dyn ObjectSource>, ObjectSourceError> {
        match settings.provider {
            StorageProvider::Local => {
                let source = LocalObjectSource::new(PathBuf::from(&settings.local_path))?;
                Ok(Arc::new(source))
            }
            StorageProvider::S3 => Ok(Arc::new(S3ObjectSource::new(
                settings.region.clone(),
                settings.endpoint.clone(),
                settings.allow_http,
            ))),
        }
    }
}
