mod collection_config;
mod embedder;
mod inference_client;
mod object_source;
mod repository_error;
mod tenant_repository;
mod text_splitter;
mod vector_store;
mod vector_store_error;

pub use collection_config::CollectionConfig;
pub use embedder::{Embedder, EmbedderError};
pub use inference_client::{InferenceClient, InferenceClientError, TokenStream};
pub use object_source::{ObjectSource, ObjectSourceError};
pub use repository_error::RepositoryError;
pub use tenant_repository::TenantRepository;
pub use text_splitter::TextSplitter;
pub use vector_store::{SearchResult, VectorStore};
pub use vector_store_error::VectorStoreError;
