use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::application::ports::{InferenceClient, InferenceClientError, TokenStream};
use crate::presentation::config::InferenceSettings;

/// Text Generation Inference server: `/generate` for whole answers,
/// `/generate_stream` for server-sent token events.
pub struct HttpInferenceClient {
    client: Client,
    generate_url: String,
    stream_url: String,
    parameters: GenerationParameters,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationParameters {
    pub do_sample: bool,
    pub max_new_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    pub typical_p: f32,
    pub seed: u64,
}

impl From<&InferenceSettings> for GenerationParameters {
    fn from(settings: &InferenceSettings) -> Self {
        Self {
            do_sample: settings.do_sample,
            max_new_tokens: settings.max_new_tokens,
            temperature: settings.temperature,
            typical_p: settings.typical_p,
            seed: settings.seed,
        }
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    inputs: &'a str,
    parameters: &'a GenerationParameters,
}

#[derive(Deserialize)]
struct GenerateResponse {
    generated_text: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StreamFrame {
    Token { token: StreamToken },
    Error { error: String },
}

#[derive(Deserialize)]
struct StreamToken {
    text: String,
    #[serde(default)]
    special: bool,
}

/// One SSE line. `None` for blank lines, comments, other fields and special tokens.
fn parse_frame(line: &str) -> Option<Result<String, InferenceClientError>> {
    let data = line.strip_prefix("data:")?.trim_start();
    if data.is_empty() {
        return None;
    }

    match serde_json::from_str::<StreamFrame>(data) {
        Ok(StreamFrame::Token { token }) if token.special => None,
        Ok(StreamFrame::Token { token }) => Some(Ok(token.text)),
        Ok(StreamFrame::Error { error }) => {
            Some(Err(InferenceClientError::ApiRequestFailed(error)))
        }
        Err(e) => Some(Err(InferenceClientError::InvalidResponse(e.to_string()))),
    }
}

/// Takes every complete line out of `buffer`; a trailing partial line stays for the next chunk.
fn drain_frames(buffer: &mut Vec<u8>) -> Vec<Result<String, InferenceClientError>> {
    let mut tokens = Vec::new();
    while let Some(end) = buffer.iter().position(|b| *b == b'\n') {
        let line: Vec<u8> = buffer.drain(..=end).collect();
        let line = String::from_utf8_lossy(&line);
        if let Some(token) = parse_frame(line.trim_end()) {
            tokens.push(token);
        }
    }
    tokens
}

async fn ensure_success(response: Response) -> Result<Response, InferenceClientError> {
    if response.status() == StatusCode::TOO_MANY_REQUESTS {
        return Err(InferenceClientError::RateLimited);
    }

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(InferenceClientError::ApiRequestFailed(format!(
            "HTTP {}: {}",
            status, body
        )));
    }

    Ok(response)
}

impl HttpInferenceClient {
    pub fn new(client: Client, base_url: &str, parameters: GenerationParameters) -> Self {
        let base_url = base_url.trim_end_matches('/');
        Self {
            client,
            generate_url: format!("{base_url}/generate"),
            stream_url: format!("{base_url}/generate_stream"),
            parameters,
        }
    }

    async fn post(&self, url: &str, prompt: &str) -> Result<Response, InferenceClientError> {
        let response = self
            .client
            .post(url)
            .json(&GenerateRequest {
                inputs: prompt,
                parameters: &self.parameters,
            })
            .send()
            .await
            .map_err(|e| InferenceClientError::ApiRequestFailed(e.to_string()))?;

        ensure_success(response).await
    }

    pub fn from_settings(client: Client, settings: &InferenceSettings) -> Self {
        Self::new(client, &settings.url, GenerationParameters::from(settings))
    }
}

#[async_trait]
impl InferenceClient for HttpInferenceClient {
    #[instrument(skip(self, prompt), fields(url = %self.generate_url, prompt_len = prompt.len()))]
    async fn generate(&self, prompt: &str) -> Result<String, InferenceClientError> {
        let response = self.post(&self.generate_url, prompt).await?;

        let generated: GenerateResponse = response
            .json()
            .await
            .map_err(|e| InferenceClientError::InvalidResponse(e.to_string()))?;

        debug!(answer_len = generated.generated_text.len(), "generation_completed");
        Ok(generated.generated_text)
    }

    #[instrument(skip(self, prompt), fields(url = %self.stream_url, prompt_len = prompt.len()))]
    async fn generate_stream(&self, prompt: &str) -> Result<TokenStream, InferenceClientError> {
        let response = self.post(&self.stream_url, prompt).await?;
        debug!("generation_stream_opened");

        let tokens = response
            .bytes_stream()
            .scan(Vec::new(), |buffer, chunk| {
                let items = match chunk {
                    Ok(bytes) => {
                        buffer.extend_from_slice(&bytes);
                        drain_frames(buffer)
                    }
                    Err(e) => vec![Err(InferenceClientError::ApiRequestFailed(e.to_string()))],
                };
                futures::future::ready(Some(items))
            })
            .flat_map(futures::stream::iter);

        Ok(Box::pin(tokens))
    }
}
