use object_store::aws::AmazonS3Builder;

use crate::application::ports::{ObjectSource, ObjectSourceError};
use crate::domain::ObjectLocation;

/// Reads objects from S3. Credentials come from the standard AWS environment.
pub struct S3ObjectSource {
    region: Option<String>,
    endpoint: Option<String>,
    allow_http: bool,
}

impl S3ObjectSource {
    pub fn new(region: Option<String>, endpoint: Option<String>, allow_http: bool) -> Self {
        Self {
            region,
            endpoint,
            allow_http,
        }
    }

    fn builder_for(&self, bucket: &str) -> AmazonS3Builder {
        let mut builder = AmazonS3Builder::from_env()
            .with_bucket_name(bucket)
            .with_allow_http(self.allow_http);
        if let Some(region) = &self.region {
            builder = builder.with_region(region);
        }
        if let Some(endpoint) = &self.endpoint {
            builder = builder.with_endpoint(endpoint);
        }
        builder
    }
}

#[async_trait::async_trait]
impl ObjectSource for S3ObjectSource {
    #[tracing::instrument(skip(self), fields(bucket = %location.bucket, key = %location.key))]
    async fn fetch(&self, location: &ObjectLocation) -> Result<Vec<u8>, ObjectSourceError> {
        // Events may come from any bucket the function is subscribed to.
        let store = self
            .builder_for(&location.bucket)
            .build()
            .map_err(|e| ObjectSourceError::Configuration(e.to_string()))?;

        super::read_object(&store, &location.key).await
    }
}
