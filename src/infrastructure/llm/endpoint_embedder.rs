use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::application::ports::{Embedder, EmbedderError};
use crate::domain::Embedding;
use crate::infrastructure::auth::SigV4Signer;

/// Hosted embedding model behind an HTTP inference endpoint.
///
/// Speaks the `{"text_inputs": [...]}` / `{"embedding": [[...]]}` contract
/// of a SageMaker JumpStart text-embedding container.
pub struct EndpointEmbedder {
    client: Client,
    url: Url,
    signer: Option<SigV4Signer>,
}

#[derive(Serialize)]
struct InvocationRequest<'a> {
    text_inputs: &'a [&'a str],
}

#[derive(Deserialize)]
struct InvocationResponse {
    embedding: Vec<Vec<f32>>,
}

impl EndpointEmbedder {
    pub fn new(
        client: Client,
        url: &str,
        signer: Option<SigV4Signer>,
    ) -> Result<Self, EmbedderError> {
        let url = Url::parse(url)
            .map_err(|e| EmbedderError::ApiRequestFailed(format!("invalid endpoint url: {}", e)))?;
        Ok(Self { client, url, signer })
    }

    pub fn sagemaker_url(region: &str, endpoint_name: &str) -> String {
        format!(
            "https://runtime.sagemaker.{}.amazonaws.com/endpoints/{}/invocations",
            region, endpoint_name
        )
    }
}

#[async_trait]
impl Embedder for EndpointEmbedder {
    async fn embed(&self, text: &str) -> Result<Embedding, EmbedderError> {
        self.embed_batch(&[text])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| EmbedderError::InvalidResponse("empty response".to_string()))
    }

    #[instrument(skip(self, texts), fields(count = texts.len()))]
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, EmbedderError> {
        let body = serde_json::to_vec(&InvocationRequest { text_inputs: texts })
            .map_err(|e| EmbedderError::ApiRequestFailed(e.to_string()))?;

        let mut request = self
            .client
            .post(self.url.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .build()
            .map_err(|e| EmbedderError::ApiRequestFailed(e.to_string()))?;

        if let Some(signer) = &self.signer {
            signer
                .sign(&mut request)
                .map_err(|e| EmbedderError::Authorization(e.to_string()))?;
        }

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| EmbedderError::ApiRequestFailed(e.to_string()))?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(EmbedderError::RateLimited);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbedderError::ApiRequestFailed(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        let invocation: InvocationResponse = response
            .json()
            .await
            .map_err(|e| EmbedderError::InvalidResponse(e.to_string()))?;

        if invocation.embedding.len() != texts.len() {
            return Err(EmbedderError::InvalidResponse(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                invocation.embedding.len()
            )));
        }

        Ok(invocation.embedding.into_iter().map(Embedding::new).collect())
    }
}
