mod in_memory_vector_store;
mod opensearch_adapter;
mod qdrant_adapter;
mod vector_store_factory;

pub use in_memory_vector_store::InMemoryVectorStore;
pub use opensearch_adapter::OpenSearchAdapter;
pub use qdrant_adapter::QdrantAdapter;
pub use vector_store_factory::{VectorStoreFactory, VectorStoreFactoryError};
