use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::application::ports::{CollectionConfig, SearchResult, VectorStore, VectorStoreError};
use crate::domain::{Chunk, ChunkId, Embedding};

/// Brute-force cosine search over entries held in process memory.
#[derive(Default)]
pub struct InMemoryVectorStore {
    entries: RwLock<HashMap<ChunkId, (Chunk, Embedding)>>,
    dimensions: RwLock<Option<u64>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn get(&self, id: &ChunkId) -> Option<Chunk> {
        self.entries.read().await.get(id).map(|(c, _)| c.clone())
    }
}

#[async_trait::async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn create_collection(&self, config: &CollectionConfig) -> Result<bool, VectorStoreError> {
        let mut dimensions = self.dimensions.write().await;
        if dimensions.is_some() {
            return Ok(false);
        }
        *dimensions = Some(config.vector_dimensions);
        Ok(true)
    }

    async fn collection_exists(&self) -> Result<bool, VectorStoreError> {
        Ok(self.dimensions.read().await.is_some())
    }

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

        if let Some(expected) = *self.dimensions.read().await {
            if let Some(bad) = embeddings
                .iter()
                .find(|e| e.dimensions() as u64 != expected)
            {
                return Err(VectorStoreError::UpsertFailed(format!(
                    "expected {} dimensions, got {}",
                    expected,
                    bad.dimensions()
                )));
            }
        }

        let mut entries = self.entries.write().await;
        for (chunk, embedding) in chunks.iter().zip(embeddings) {
            entries.insert(chunk.id, (chunk.clone(), embedding.clone()));
        }
        Ok(())
    }

    async fn search(
        &self,
        embedding: &Embedding,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, VectorStoreError> {
        let entries = self.entries.read().await;
        let mut results: Vec<SearchResult> = entries
            .values()
            .map(|(chunk, stored)| SearchResult {
                chunk: chunk.clone(),
                score: embedding.cosine_similarity(stored),
            })
            .collect();

        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(top_k);
        Ok(results)
    }
}
