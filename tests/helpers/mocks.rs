use std::num::{NonZeroU32, NonZeroUsize};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use kinabalu::application::ports::{
    CollectionConfig, Embedder, EmbedderError, InferenceClient, InferenceClientError,
    SearchResult, TokenStream, VectorStore, VectorStoreError,
};
use kinabalu::application::services::{IngestionService, QuotaService};
use kinabalu::domain::{Chunk, Embedding, TenantId, TenantRecord};
use kinabalu::infrastructure::persistence::{InMemoryTenantRepository, InMemoryVectorStore};
use kinabalu::infrastructure::text_processing::FixedSizeSplitter;

pub const EMBEDDING_DIMENSIONS: usize = 27;

/// Letter-frequency vectors: texts sharing letters land close together.
pub fn letter_embedding(text: &str) -> Embedding {
    let mut values = vec![0.0f32; EMBEDDING_DIMENSIONS];
    for c in text.chars() {
        let slot = if c.is_ascii_alphabetic() {
            (c.to_ascii_lowercase() as u8 - b'a') as usize
        } else {
            EMBEDDING_DIMENSIONS - 1
        };
        values[slot] += 1.0;
    }
    Embedding::new(values)
}

#[derive(Default)]
pub struct LetterEmbedder {
    pub calls: AtomicUsize,
}

#[async_trait]
impl Embedder for LetterEmbedder {
    async fn embed(&self, text: &str) -> Result<Embedding, EmbedderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(letter_embedding(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, EmbedderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| letter_embedding(t)).collect())
    }
}

/// Returns one embedding fewer than requested.
pub struct ShortEmbedder;

#[async_trait]
impl Embedder for ShortEmbedder {
    async fn embed(&self, text: &str) -> Result<Embedding, EmbedderError> {
        Ok(letter_embedding(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, EmbedderError> {
        Ok(texts.iter().skip(1).map(|t| letter_embedding(t)).collect())
    }
}

/// In-memory index that records every upsert call and can be told to fail one.
#[derive(Default)]
pub struct RecordingVectorStore {
    pub inner: InMemoryVectorStore,
    pub upserts: Mutex<Vec<usize>>,
    pub fail_on_upsert: Option<usize>,
}

impl RecordingVectorStore {
    pub fn failing_on(call: usize) -> Self {
        Self {
            fail_on_upsert: Some(call),
            ..Self::default()
        }
    }

    pub fn upsert_sizes(&self) -> Vec<usize> {
        self.upserts.lock().unwrap().clone()
    }
}

#[async_trait]
impl VectorStore for RecordingVectorStore {
    async fn create_collection(&self, config: &CollectionConfig) -> Result<bool, VectorStoreError> {
        self.inner.create_collection(config).await
    }

    async fn collection_exists(&self) -> Result<bool, VectorStoreError> {
        self.inner.collection_exists().await
    }

    async fn upsert(
        &self,
        chunks: &[Chunk],
        embeddings: &[Embedding],
    ) -> Result<(), VectorStoreError> {
        let call = {
            let mut upserts = self.upserts.lock().unwrap();
            upserts.push(chunks.len());
            upserts.len() - 1
        };
        if self.fail_on_upsert == Some(call) {
            return Err(VectorStoreError::UpsertFailed("index unavailable".to_string()));
        }
        self.inner.upsert(chunks, embeddings).await
    }

    async fn search(
        &self,
        embedding: &Embedding,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, VectorStoreError> {
        self.inner.search(embedding, top_k).await
    }
}

/// Answers every prompt with a fixed text; streams it word by word.
pub struct StubInferenceClient {
    pub answer: String,
    pub prompts: Mutex<Vec<String>>,
    pub fail_stream_after: Option<usize>,
}

impl StubInferenceClient {
    pub fn answering(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            prompts: Mutex::new(Vec::new()),
            fail_stream_after: None,
        }
    }

    /// Streams `tokens` words, then fails.
    pub fn breaking_after(answer: &str, tokens: usize) -> Self {
        Self {
            fail_stream_after: Some(tokens),
            ..Self::answering(answer)
        }
    }

    pub fn stream_tokens(&self) -> Vec<String> {
        self.answer.split_inclusive(' ').map(str::to_string).collect()
    }
}

#[async_trait]
impl InferenceClient for StubInferenceClient {
    async fn generate(&self, prompt: &str) -> Result<String, InferenceClientError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.answer.clone())
    }

    async fn generate_stream(&self, prompt: &str) -> Result<TokenStream, InferenceClientError> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        let mut items: Vec<Result<String, InferenceClientError>> =
            self.stream_tokens().into_iter().map(Ok).collect();
        if let Some(limit) = self.fail_stream_after {
            items.truncate(limit);
            items.push(Err(InferenceClientError::ApiRequestFailed(
                "connection reset".to_string(),
            )));
        }

        Ok(Box::pin(futures::stream::iter(items)))
    }
}

pub fn tenant(id: &str) -> TenantId {
    TenantId::new(id).unwrap()
}

pub fn quota_service_with(tenants: &[(&str, u64)]) -> Arc<QuotaService> {
    let repository = InMemoryTenantRepository::with_tenants(
        tenants
            .iter()
            .map(|(id, tokens)| TenantRecord::new(tenant(id), *tokens)),
    );
    Arc::new(QuotaService::new(
        Arc::new(repository),
        NonZeroU32::new(3).unwrap(),
    ))
}

pub fn ingestion_service(
    embedder: Arc<dyn Embedder>,
    vector_store: Arc<dyn VectorStore>,
    chunk_size: usize,
    batch_size: usize,
) -> IngestionService {
    IngestionService::new(
        embedder,
        vector_store,
        Arc::new(FixedSizeSplitter::new(NonZeroUsize::new(chunk_size).unwrap())),
        NonZeroUsize::new(batch_size).unwrap(),
    )
}
