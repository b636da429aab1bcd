mod pg_pool;
pub mod tenants;
pub mod vector_store;

pub use pg_pool::create_pool;
pub use tenants::{
    DynamoTenantRepository, InMemoryTenantRepository, PgTenantRepository, TenantRepositoryFactory,
    TenantRepositoryFactoryError,
};
pub use vector_store::{
    InMemoryVectorStore, OpenSearchAdapter, QdrantAdapter, VectorStoreFactory,
    VectorStoreFactoryError,
};
