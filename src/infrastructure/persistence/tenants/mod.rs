mod dynamo_tenant_repository;
mod in_memory_tenant_repository;
mod pg_tenant_repository;
mod tenant_repository_factory;

pub use dynamo_tenant_repository::DynamoTenantRepository;
pub use in_memory_tenant_repository::InMemoryTenantRepository;
pub use pg_tenant_repository::PgTenantRepository;
pub use tenant_repository_factory::{TenantRepositoryFactory, TenantRepositoryFactoryError};
