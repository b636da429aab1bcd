use async_trait::async_trait;

use super::RepositoryError;
use crate::domain::{TenantId, TenantRecord};

/// Key-value storage of tenant token balances.
#[async_trait]
pub trait TenantRepository: Send + Sync {
    async fn get(&self, tenant_id: &TenantId) -> Result<Option<TenantRecord>, RepositoryError>;

    /// Sets the balance to `new` only if it still equals `expected`.
    ///
    /// Returns `Ok(false)` when the stored balance changed in between, or
    /// when the record no longer exists.
    async fn compare_and_swap(
        &self,
        tenant_id: &TenantId,
        expected: u64,
        new: u64,
    ) -> Result<bool, RepositoryError>;
}
