use async_trait::async_trait;

use crate::domain::ObjectLocation;

/// Read access to the bucket that emits object-created events.
#[async_trait]
pub trait ObjectSource: Send + Sync {
    async fn fetch(&self, location: &ObjectLocation) -> Result<Vec<u8>, ObjectSourceError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ObjectSourceError {
    #[error("object not found: {0}")]
    NotFound(String),
    #[error("download failed: {0}")]
    DownloadFailed(String),
    #[error("invalid store configuration: {0}")]
    Configuration(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
