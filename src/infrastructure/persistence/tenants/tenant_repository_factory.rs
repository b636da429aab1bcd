use std::sync::Arc;

use reqwest::Client;

use crate::application::ports::{RepositoryError, TenantRepository};
use crate::domain::{TenantId, TenantIdError, TenantRecord};
use crate::infrastructure::auth::{AuthError, AwsCredentials, SigV4Signer};
use crate::infrastructure::persistence::create_pool;
use crate::presentation::config::{AuthSettings, QuotaProvider, QuotaSettings};

use super::{DynamoTenantRepository, InMemoryTenantRepository, PgTenantRepository};

pub struct TenantRepositoryFactory;

#[derive(Debug, thiserror::Error)]
pub enum TenantRepositoryFactoryError {
    #[error("quota.database_url is required for the postgres provider")]
    MissingDatabaseUrl,
    #[error("invalid seed tenant: {0}")]
    InvalidSeed(#[from] TenantIdError),
    #[error("credentials: {0}")]
    Credentials(#[from] AuthError),
    #[error("repository: {0}")]
    Repository(#[from] RepositoryError),
}

impl TenantRepositoryFactory {
    pub async fn create(
        settings: &QuotaSettings,
        auth: &AuthSettings,
        client: Client,
    ) -> Result<Arc<dyn TenantRepository>, TenantRepositoryFactoryError> {
        match settings.provider {
            QuotaProvider::Memory => {
                let records = settings
                    .seed
                    .iter()
                    .map(|(id, tokens)| Ok(TenantRecord::new(TenantId::new(id.clone())?, *tokens)))
                    .collect::<Result<Vec<_>, TenantIdError>>()?;
                tracing::info!(tenants = records.len(), "Using in-memory tenant store");
                Ok(Arc::new(InMemoryTenantRepository::with_tenants(records)))
            }
            QuotaProvider::Postgres => {
                let url = settings
                    .database_url
                    .as_deref()
                    .ok_or(TenantRepositoryFactoryError::MissingDatabaseUrl)?;
                let pool = create_pool(url, settings.max_connections).await?;
                tracing::info!("Using PostgreSQL tenant store");
                Ok(Arc::new(PgTenantRepository::new(pool)))
            }
            QuotaProvider::DynamoDb => {
                let region = settings.region.as_deref().unwrap_or(&auth.region);
                let endpoint = settings
                    .endpoint
                    .clone()
                    .unwrap_or_else(|| DynamoTenantRepository::regional_endpoint(region));
                let signer = SigV4Signer::new(AwsCredentials::from_env()?, region, "dynamodb");
                tracing::info!(
                    table = %settings.table_name,
                    endpoint = %endpoint,
                    "Using DynamoDB tenant store"
                );
                Ok(Arc::new(DynamoTenantRepository::new(
                    client,
                    &endpoint,
                    settings.table_name.clone(),
                    signer,
                )?))
            }
        }
    }
}
