use std::num::NonZeroUsize;
use std::sync::Arc;

use crate::application::ports::{
    Embedder, EmbedderError, TextSplitter, VectorStore, VectorStoreError,
};
use crate::domain::{Batch, Document};

/// Splits documents into chunks and writes them to the vector index batch by batch.
pub struct IngestionService {
    embedder: Arc<dyn Embedder>,
    vector_store: Arc<dyn VectorStore>,
    text_splitter: Arc<dyn TextSplitter>,
    batch_size: NonZeroUsize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionSummary {
    pub source: String,
    pub chunk_count: usize,
    pub batch_count: usize,
}

impl IngestionService {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        vector_store: Arc<dyn VectorStore>,
        text_splitter: Arc<dyn TextSplitter>,
        batch_size: NonZeroUsize,
    ) -> Self {
        Self {
            embedder,
            vector_store,
            text_splitter,
            batch_size,
        }
    }

    pub fn batch_size(&self) -> NonZeroUsize {
        self.batch_size
    }

    /// Batches are inserted in order, one at a time. The first failing batch
    /// aborts the rest; batches already written stay in the index.
    #[tracing::instrument(skip(self, document), fields(source = %document.source))]
    pub async fn ingest(&self, document: &Document) -> Result<IngestionSummary, IngestionError> {
        if document.is_empty() {
            return Err(IngestionError::EmptyDocument(document.source.clone()));
        }

        let chunks = self.text_splitter.split(document);

        let batch_count = Batch::count(chunks.len(), self.batch_size);
        tracing::info!(
            chunks = chunks.len(),
            batches = batch_count,
            "Document split into chunks"
        );

        for batch in Batch::partition(&chunks, self.batch_size) {
            if let Err(e) = self.insert_batch(&batch).await {
                tracing::error!(
                    batch = batch.index,
                    error = %e,
                    "Batch insertion failed, aborting remaining batches"
                );
                return Err(e);
            }
            tracing::debug!(batch = batch.index, size = batch.len(), "Batch inserted");
        }

        tracing::info!(chunks = chunks.len(), batches = batch_count, "Ingestion completed");

        Ok(IngestionSummary {
            source: document.source.clone(),
            chunk_count: chunks.len(),
            batch_count,
        })
    }

    async fn insert_batch(&self, batch: &Batch<'_>) -> Result<(), IngestionError> {
        let texts = batch.texts();
        let embeddings = self
            .embedder
            .embed_batch(&texts)
            .await
            .map_err(IngestionError::Embedding)?;

        if embeddings.len() != batch.len() {
            return Err(IngestionError::EmbeddingCountMismatch {
                expected: batch.len(),
                actual: embeddings.len(),
            });
        }

        self.vector_store
            .upsert(batch.chunks, &embeddings)
            .await
            .map_err(IngestionError::Storage)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IngestionError {
    #[error("document is empty: {0}")]
    EmptyDocument(String),
    #[error("embedding: {0}")]
    Embedding(#[from] EmbedderError),
    #[error("embedding count mismatch: expected {expected}, got {actual}")]
    EmbeddingCountMismatch { expected: usize, actual: usize },
    #[error("storage: {0}")]
    Storage(#[from] VectorStoreError),
}
