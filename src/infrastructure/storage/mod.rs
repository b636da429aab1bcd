mod local_source;
mod s3_source;
mod source_factory;

pub use local_source::LocalObjectSource;
pub use s3_source::S3ObjectSource;
pub use source_factory::ObjectSourceFactory;

use object_store::ObjectStore;
use object_store::path::Path as StorePath;

use crate::application::ports::ObjectSourceError;

async fn read_object(store: &dyn ObjectStore, key: &str) -> Result<Vec<u8>, ObjectSourceError> {
    let store_path = StorePath::from(key);
    let result = store.get(&store_path).await.map_err(|e| match e {
        object_store::Error::NotFound { path, .. } => ObjectSourceError::NotFound(path),
        other => ObjectSourceError::DownloadFailed(other.to_string()),
    })?;

    let bytes = result
        .bytes()
        .await
        .map_err(|e| ObjectSourceError::DownloadFailed(e.to_string()))?;

    Ok(bytes.to_vec())
}
