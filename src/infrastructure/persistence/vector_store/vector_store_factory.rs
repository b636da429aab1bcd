use std::sync::Arc;

use reqwest::Client;
use tracing::info;

use super::{InMemoryVectorStore, OpenSearchAdapter, QdrantAdapter};
use crate::application::ports::{VectorStore, VectorStoreError};
use crate::infrastructure::auth::CredentialProvider;
use crate::presentation::config::{
    OpenSearchSettings, QdrantSettings, VectorStoreProvider, VectorStoreSettings,
};

#[derive(Debug, thiserror::Error)]
pub enum VectorStoreFactoryError {
    #[error(transparent)]
    VectorStore(#[from] VectorStoreError),
}

pub struct VectorStoreFactory;

impl VectorStoreFactory {
    pub fn create(
        settings: &VectorStoreSettings,
        opensearch: &OpenSearchSettings,
        qdrant: &QdrantSettings,
        client: Client,
        credentials: CredentialProvider,
    ) -> Result<Arc<dyn VectorStore>, VectorStoreFactoryError> {
        match settings.provider {
            VectorStoreProvider::OpenSearch => {
                info!(
                    url = %opensearch.url,
                    index = %opensearch.index_name,
                    auth = credentials.mode(),
                    "Using OpenSearch vector store"
                );
                let adapter = OpenSearchAdapter::new(
                    client,
                    &opensearch.url,
                    &opensearch.index_name,
                    credentials,
                )?
                .with_document_ids(opensearch.assign_document_ids);
                Ok(Arc::new(adapter))
            }
            VectorStoreProvider::Qdrant => {
                info!(
                    url = %qdrant.url,
                    collection = %qdrant.collection_name,
                    "Using Qdrant vector store"
                );
                let adapter = QdrantAdapter::new(&qdrant.url, qdrant.collection_name.clone())?;
                Ok(Arc::new(adapter))
            }
            VectorStoreProvider::Memory => {
                info!("Using in-memory vector store");
                Ok(Arc::new(InMemoryVectorStore::new()))
            }
        }
    }
}
