use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, StatusCode, Url};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::application::ports::{CollectionConfig, SearchResult, VectorStore, VectorStoreError};
use crate::domain::{Chunk, ChunkId, Embedding};
use crate::infrastructure::auth::CredentialProvider;

const VECTOR_FIELD: &str = "vector_field";
const NDJSON: &str = "application/x-ndjson";
const COSINE_SPACE_TYPE: &str = "cosinesimil";

/// k-NN index on OpenSearch (managed or serverless), addressed over REST.
pub struct OpenSearchAdapter {
    client: Client,
    base_url: Url,
    index_name: String,
    credentials: CredentialProvider,
    assign_document_ids: bool,
}

#[derive(Deserialize)]
struct BulkResponse {
    errors: bool,
    #[serde(default)]
    items: Vec<Value>,
}

#[derive(Deserialize)]
struct SearchResponse {
    hits: Hits,
}

#[derive(Deserialize)]
struct Hits {
    hits: Vec<Hit>,
}

#[derive(Deserialize)]
struct Hit {
    #[serde(rename = "_id")]
    id: Option<String>,
    #[serde(rename = "_score")]
    score: Option<f32>,
    #[serde(rename = "_source")]
    source: HitSource,
}

#[derive(Deserialize)]
struct HitSource {
    text: String,
    #[serde(default)]
    metadata: HitMetadata,
}

#[derive(Deserialize, Default)]
struct HitMetadata {
    #[serde(default)]
    source: String,
    #[serde(default)]
    chunk_index: usize,
    #[serde(default)]
    offset: usize,
}

impl OpenSearchAdapter {
    pub fn new(
        client: Client,
        url: &str,
        index_name: impl Into<String>,
        credentials: CredentialProvider,
    ) -> Result<Self, VectorStoreError> {
        let base_url = Url::parse(url)
            .map_err(|e| VectorStoreError::ConnectionFailed(format!("invalid url: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            index_name: index_name.into(),
            credentials,
            assign_document_ids: true,
        })
    }

    /// OpenSearch Serverless vector collections reject caller-supplied ids.
    pub fn with_document_ids(mut self, assign: bool) -> Self {
        self.assign_document_ids = assign;
        self
    }

    fn url(&self, path: &str) -> Result<Url, VectorStoreError> {
        self.base_url
            .join(path)
            .map_err(|e| VectorStoreError::ConnectionFailed(e.to_string()))
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        content_type: &str,
        body: Option<Vec<u8>>,
    ) -> Result<reqwest::Response, VectorStoreError> {
        let mut builder = self.client.request(method, self.url(path)?);
        if let Some(body) = body {
            builder = builder.header(CONTENT_TYPE, content_type).body(body);
        }

        let mut request = builder
            .build()
            .map_err(|e| VectorStoreError::ConnectionFailed(e.to_string()))?;

        self.credentials
            .authorize(&mut request)
            .map_err(|e| VectorStoreError::Authorization(e.to_string()))?;

        self.client
            .execute(request)
            .await
            .map_err(|e| VectorStoreError::ConnectionFailed(e.to_string()))
    }

    fn bulk_body(
        &self,
        chunks: &[Chunk],
        embeddings: &[Embedding],
    ) -> Result<Vec<u8>, serde_json::Error> {
        let mut body = Vec::new();
        for (chunk, embedding) in chunks.iter().zip(embeddings) {
            let action = if self.assign_document_ids {
                json!({ "index": { "_index": self.index_name, "_id": chunk.id.to_string() } })
            } else {
                json!({ "index": { "_index": self.index_name } })
            };
            let document = json!({
                VECTOR_FIELD: embedding.values,
                "text": chunk.text,
                "metadata": {
                    "source": chunk.source,
                    "chunk_index": chunk.index,
                    "offset": chunk.offset,
                },
            });

            serde_json::to_writer(&mut body, &action)?;
            body.push(b'\n');
            serde_json::to_writer(&mut body, &document)?;
            body.push(b'\n');
        }
        Ok(body)
    }
}

fn first_bulk_error(items: &[Value]) -> String {
    items
        .iter()
        .filter_map(|item| item.as_object()?.values().next())
        .find_map(|result| {
            let error = result.get("error")?;
            Some(
                error
                    .get("reason")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| error.to_string()),
            )
        })
        .unwrap_or_else(|| "bulk request reported errors".to_string())
}

async fn failure_body(response: reqwest::Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    format!("HTTP {}: {}", status, body)
}

#[async_trait]
impl VectorStore for OpenSearchAdapter {
    #[instrument(skip(self, config), fields(index = %self.index_name))]
    async fn create_collection(&self, config: &CollectionConfig) -> Result<bool, VectorStoreError> {
        if self.collection_exists().await? {
            info!(index = %self.index_name, "index already exists");
            return Ok(false);
        }

        let body = json!({
            "settings": { "index.knn": true },
            "mappings": {
                "properties": {
                    VECTOR_FIELD: {
                        "type": "knn_vector",
                        "dimension": config.vector_dimensions,
                        "method": {
                            "name": "hnsw",
                            "engine": "faiss",
                            "space_type": COSINE_SPACE_TYPE,
                        },
                    },
                    "text": { "type": "text" },
                },
            },
        });
        let payload = serde_json::to_vec(&body)
            .map_err(|e| VectorStoreError::CollectionCreationFailed(e.to_string()))?;

        let response = self
            .send(Method::PUT, &self.index_name, "application/json", Some(payload))
            .await?;

        if !response.status().is_success() {
            return Err(VectorStoreError::CollectionCreationFailed(
                failure_body(response).await,
            ));
        }

        info!(index = %self.index_name, "index_created");
        Ok(true)
    }

    #[instrument(skip(self), fields(index = %self.index_name))]
    async fn collection_exists(&self) -> Result<bool, VectorStoreError> {
        let response = self
            .send(Method::HEAD, &self.index_name, "application/json", None)
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => Err(VectorStoreError::ConnectionFailed(format!(
                "HTTP {} checking index",
                status
            ))),
        }
    }

    #[instrument(
        skip(self, chunks, embeddings),
        fields(index = %self.index_name, count = chunks.len())
    )]
    async fn upsert(
        &self,
        chunks: &[Chunk],
        embeddings: &[Embedding],
    ) -> Result<(), VectorStoreError> {
        if chunks.len() != embeddings.len() {
            return Err(VectorStoreError::UpsertFailed(
                "chunks and embeddings count mismatch".to_string(),
            ));
        }
        if chunks.is_empty() {
            return Ok(());
        }

        let body = self
            .bulk_body(chunks, embeddings)
            .map_err(|e| VectorStoreError::UpsertFailed(e.to_string()))?;

        let response = self.send(Method::POST, "_bulk", NDJSON, Some(body)).await?;
        if !response.status().is_success() {
            return Err(VectorStoreError::UpsertFailed(failure_body(response).await));
        }

        let result: BulkResponse = response
            .json()
            .await
            .map_err(|e| VectorStoreError::UpsertFailed(format!("invalid bulk response: {}", e)))?;

        if result.errors {
            let reason = first_bulk_error(&result.items);
            warn!(index = %self.index_name, reason = %reason, "bulk_insert_rejected");
            return Err(VectorStoreError::UpsertFailed(reason));
        }

        info!(index = %self.index_name, count = chunks.len(), "documents_indexed");
        Ok(())
    }

    #[instrument(skip(self, embedding), fields(index = %self.index_name, top_k = top_k))]
    async fn search(
        &self,
        embedding: &Embedding,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, VectorStoreError> {
        let body = json!({
            "size": top_k,
            "query": {
                "knn": {
                    VECTOR_FIELD: {
                        "vector": embedding.values,
                        "k": top_k,
                    },
                },
            },
            "_source": { "excludes": [VECTOR_FIELD] },
        });
        let payload =
            serde_json::to_vec(&body).map_err(|e| VectorStoreError::SearchFailed(e.to_string()))?;

        let path = format!("{}/_search", self.index_name);
        let response = self
            .send(Method::POST, &path, "application/json", Some(payload))
            .await?;
        if !response.status().is_success() {
            return Err(VectorStoreError::SearchFailed(failure_body(response).await));
        }

        let result: SearchResponse = response
            .json()
            .await
            .map_err(|e| {
                VectorStoreError::SearchFailed(format!("invalid search response: {}", e))
            })?;

        Ok(result
            .hits
            .hits
            .into_iter()
            .map(|hit| {
                let metadata = hit.source.metadata;
                let id = hit
                    .id
                    .as_deref()
                    .and_then(|id| Uuid::parse_str(id).ok())
                    .map(ChunkId::from_uuid)
                    .unwrap_or_else(|| ChunkId::derive(&metadata.source, metadata.chunk_index));

                SearchResult {
                    chunk: Chunk {
                        id,
                        text: hit.source.text,
                        source: metadata.source,
                        index: metadata.chunk_index,
                        offset: metadata.offset,
                    },
                    score: hit.score.unwrap_or_default(),
                }
            })
            .collect())
    }
}
