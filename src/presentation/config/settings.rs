use std::collections::HashMap;
use std::num::{NonZeroU32, NonZeroUsize};
use std::path::PathBuf;

use config::builder::DefaultState;
use config::{
    Config, ConfigBuilder, ConfigError, Environment as EnvironmentSource, File, FileFormat,
};
use serde::Deserialize;

use super::Environment;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub environment: Environment,
    pub server: ServerSettings,
    pub ingestion: IngestionSettings,
    pub storage: StorageSettings,
    pub vector_store: VectorStoreSettings,
    pub opensearch: OpenSearchSettings,
    pub qdrant: QdrantSettings,
    pub auth: AuthSettings,
    pub embeddings: EmbeddingsSettings,
    pub inference: InferenceSettings,
    pub quota: QuotaSettings,
    pub answer: AnswerSettings,
    pub http: HttpSettings,
    pub http_client: HttpClientSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IngestionSettings {
    pub chunk_size: NonZeroUsize,
    pub batch_size: NonZeroUsize,
    pub download_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    pub provider: StorageProvider,
    pub local_path: String,
    pub region: Option<String>,
    pub endpoint: Option<String>,
    pub allow_http: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageProvider {
    Local,
    S3,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VectorStoreSettings {
    pub provider: VectorStoreProvider,
    pub create_if_missing: bool,
    pub dimensions: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorStoreProvider {
    #[serde(rename = "opensearch")]
    OpenSearch,
    Qdrant,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenSearchSettings {
    pub url: String,
    pub index_name: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub assign_document_ids: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QdrantSettings {
    pub url: String,
    pub collection_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    pub mode: AuthMode,
    pub region: String,
    pub service: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    Static,
    Signed,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingsSettings {
    pub provider: EmbeddingProvider,
    pub endpoint_url: Option<String>,
    pub endpoint_name: Option<String>,
    pub region: Option<String>,
    pub model: String,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    Endpoint,
    #[serde(rename = "openai")]
    OpenAi,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InferenceSettings {
    pub url: String,
    pub max_new_tokens: u32,
    pub temperature: Option<f32>,
    pub typical_p: f32,
    pub seed: u64,
    pub do_sample: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuotaSettings {
    pub provider: QuotaProvider,
    pub max_spend_attempts: NonZeroU32,
    pub table_name: String,
    pub region: Option<String>,
    pub endpoint: Option<String>,
    pub database_url: Option<String>,
    pub max_connections: u32,
    /// Balances loaded into the in-memory store at startup.
    #[serde(default)]
    pub seed: HashMap<String, u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuotaProvider {
    Memory,
    Postgres,
    #[serde(rename = "dynamodb")]
    DynamoDb,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnswerSettings {
    pub top_k: NonZeroUsize,
    pub sse_keep_alive_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpSettings {
    pub error_status: ErrorStatusPolicy,
}

/// Whether error responses carry a status per error kind or the legacy fixed 402.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorStatusPolicy {
    #[default]
    Mapped,
    Fixed,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpClientSettings {
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    pub json: bool,
    pub filter: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid environment: {0}")]
    Environment(String),
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),
}

impl Settings {
    /// Layers defaults, `appsettings.toml`, `appsettings.{env}.toml` and
    /// `APP_`-prefixed environment variables (`__` separates nesting).
    pub fn load() -> Result<Self, SettingsError> {
        let environment = Environment::from_env().map_err(SettingsError::Environment)?;

        let config = Self::defaults(environment)?
            .add_source(File::with_name("appsettings").required(false))
            .add_source(
                File::with_name(&format!("appsettings.{}", environment.as_str())).required(false),
            )
            .add_source(
                EnvironmentSource::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Defaults overlaid with an inline TOML document.
    pub fn from_toml(environment: Environment, toml: &str) -> Result<Self, SettingsError> {
        let config = Self::defaults(environment)?
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    pub fn defaults(
        environment: Environment,
    ) -> Result<ConfigBuilder<DefaultState>, SettingsError> {
        let local = environment == Environment::Local;

        let builder = Config::builder()
            .set_default("environment", environment.as_str())?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000_i64)?
            .set_default("ingestion.chunk_size", 1000_i64)?
            .set_default("ingestion.batch_size", 10_i64)?
            .set_default("ingestion.download_dir", "/tmp")?
            .set_default("storage.provider", if local { "local" } else { "s3" })?
            .set_default("storage.local_path", "./data/buckets")?
            .set_default("storage.allow_http", false)?
            .set_default("vector_store.provider", if local { "memory" } else { "opensearch" })?
            .set_default("vector_store.create_if_missing", local)?
            .set_default("vector_store.dimensions", 4096_i64)?
            .set_default("opensearch.url", "https://localhost:9200")?
            .set_default("opensearch.index_name", "index-document-vector")?
            .set_default("opensearch.assign_document_ids", true)?
            .set_default("qdrant.url", "http://localhost:6334")?
            .set_default("qdrant.collection_name", "document_chunks")?
            .set_default("auth.mode", if local { "static" } else { "signed" })?
            .set_default("auth.region", "us-east-1")?
            .set_default("auth.service", "aoss")?
            .set_default("embeddings.provider", "endpoint")?
            .set_default("embeddings.model", "text-embedding-3-small")?
            .set_default("inference.url", "http://localhost:8080")?
            .set_default("inference.max_new_tokens", 200_i64)?
            .set_default("inference.typical_p", 0.2_f64)?
            .set_default("inference.seed", 1_i64)?
            .set_default("inference.do_sample", true)?
            .set_default("quota.provider", if local { "memory" } else { "dynamodb" })?
            .set_default("quota.max_spend_attempts", 3_i64)?
            .set_default("quota.table_name", "tenant_management")?
            .set_default("quota.max_connections", 5_i64)?
            .set_default("answer.top_k", 1_i64)?
            .set_default("answer.sse_keep_alive_secs", 15_i64)?
            .set_default("http.error_status", "mapped")?
            .set_default("http_client.timeout_secs", 300_i64)?
            .set_default("logging.json", !local)?;

        // Local runs expect an embedding server next to the inference server.
        let builder = if local {
            builder.set_default("embeddings.endpoint_url", "http://localhost:8081/invocations")?
        } else {
            builder
        };

        Ok(builder)
    }
}
