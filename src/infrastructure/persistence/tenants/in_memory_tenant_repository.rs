use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::application::ports::{RepositoryError, TenantRepository};
use crate::domain::{TenantId, TenantRecord};

/// Process-local tenant balances for local runs and tests.
#[derive(Default)]
pub struct InMemoryTenantRepository {
    balances: RwLock<HashMap<TenantId, u64>>,
}

impl InMemoryTenantRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tenants(records: impl IntoIterator<Item = TenantRecord>) -> Self {
        let balances = records
            .into_iter()
            .map(|r| (r.tenant_id, r.tokens))
            .collect();
        Self {
            balances: RwLock::new(balances),
        }
    }

    pub async fn put(&self, record: TenantRecord) {
        self.balances
            .write()
            .await
            .insert(record.tenant_id, record.tokens);
    }
}

#[async_trait::async_trait]
impl TenantRepository for InMemoryTenantRepository {
    async fn get(&self, tenant_id: &TenantId) -> Result<Option<TenantRecord>, RepositoryError> {
        Ok(self
            .balances
            .read()
            .await
            .get(tenant_id)
            .map(|tokens| TenantRecord::new(tenant_id.clone(), *tokens)))
    }

    async fn compare_and_swap(
        &self,
        tenant_id: &TenantId,
        expected: u64,
        new: u64,
    ) -> Result<bool, RepositoryError> {
        let mut balances = self.balances.write().await;
        match balances.get_mut(tenant_id) {
            Some(tokens) if *tokens == expected => {
                *tokens = new;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
