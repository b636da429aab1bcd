use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

/// Generated text, one token at a time, in arrival order.
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String, InferenceClientError>> + Send>>;

#[async_trait]
pub trait InferenceClient: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, InferenceClientError>;

    async fn generate_stream(&self, prompt: &str) -> Result<TokenStream, InferenceClientError>;
}

#[derive(Debug, thiserror::Error)]
pub enum InferenceClientError {
    #[error("inference request failed: {0}")]
    ApiRequestFailed(String),
    #[error("inference rate limited")]
    RateLimited,
    #[error("invalid inference response: {0}")]
    InvalidResponse(String),
}
