use std::sync::Arc;

use reqwest::Client;

use super::{EndpointEmbedder, OpenAiEmbedder};
use crate::application::ports::{Embedder, EmbedderError};
use crate::infrastructure::auth::{AuthError, AwsCredentials, SigV4Signer};
use crate::presentation::config::{AuthMode, AuthSettings, EmbeddingProvider, EmbeddingsSettings};

const SAGEMAKER_SERVICE: &str = "sagemaker";

pub struct EmbedderFactory;

#[derive(Debug, thiserror::Error)]
pub enum EmbedderFactoryError {
    #[error("missing API key: OpenAI embedder requires embeddings.api_key")]
    MissingApiKey,
    #[error("embeddings.endpoint_url or embeddings.endpoint_name is required")]
    MissingEndpoint,
    #[error("credentials: {0}")]
    Credentials(#[from] AuthError),
    #[error("initialization failed: {0}")]
    InitializationFailed(#[from] EmbedderError),
}

impl EmbedderFactory {
    pub fn create(
        settings: &EmbeddingsSettings,
        auth: &AuthSettings,
        client: Client,
    ) -> Result<Arc<dyn Embedder>, EmbedderFactoryError> {
        match settings.provider {
            EmbeddingProvider::Endpoint => {
                let region = settings.region.as_deref().unwrap_or(&auth.region);
                let url = match (&settings.endpoint_url, &settings.endpoint_name) {
                    (Some(url), _) => url.clone(),
                    (None, Some(name)) => EndpointEmbedder::sagemaker_url(region, name),
                    (None, None) => return Err(EmbedderFactoryError::MissingEndpoint),
                };
                let signer = match auth.mode {
                    AuthMode::Signed => Some(SigV4Signer::new(
                        AwsCredentials::from_env()?,
                        region,
                        SAGEMAKER_SERVICE,
                    )),
                    AuthMode::Static => None,
                };
                tracing::info!(
                    url = %url,
                    signed = signer.is_some(),
                    "Using endpoint embedding model"
                );
                Ok(Arc::new(EndpointEmbedder::new(client, &url, signer)?))
            }
            EmbeddingProvider::OpenAi => {
                let key = settings
                    .api_key
                    .clone()
                    .filter(|k| !k.is_empty())
                    .ok_or(EmbedderFactoryError::MissingApiKey)?;
                tracing::info!(model = %settings.model, "Using OpenAI embedding model");
                Ok(Arc::new(OpenAiEmbedder::new(client, key, settings.model.clone())))
            }
        }
    }
}
