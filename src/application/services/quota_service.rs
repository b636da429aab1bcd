use std::num::NonZeroU32;
use std::sync::Arc;

use crate::application::ports::{RepositoryError, TenantRepository};
use crate::domain::{TenantId, TenantRecord};

/// Per-tenant token bookkeeping.
///
/// Spending commits through a conditional write, so two concurrent spenders
/// cannot both commit against the same balance. A lost race re-reads the
/// balance and tries again, up to `max_attempts` times.
pub struct QuotaService {
    repository: Arc<dyn TenantRepository>,
    max_attempts: NonZeroU32,
}

impl QuotaService {
    pub fn new(repository: Arc<dyn TenantRepository>, max_attempts: NonZeroU32) -> Self {
        Self {
            repository,
            max_attempts,
        }
    }

    pub async fn get_tenant(&self, tenant_id: &TenantId) -> Result<TenantRecord, QuotaError> {
        self.repository
            .get(tenant_id)
            .await?
            .ok_or_else(|| QuotaError::NotFound(tenant_id.clone()))
    }

    /// True iff the balance left after spending `amount` would be strictly positive.
    #[tracing::instrument(skip(self), fields(tenant_id = %tenant_id))]
    pub async fn check(&self, tenant_id: &TenantId, amount: u64) -> Result<bool, QuotaError> {
        let tenant = self.get_tenant(tenant_id).await?;
        Ok(tenant.can_afford(amount))
    }

    /// Deducts `amount` and returns the new balance. Nothing is written when
    /// the balance would go negative.
    #[tracing::instrument(skip(self), fields(tenant_id = %tenant_id))]
    pub async fn spend(&self, tenant_id: &TenantId, amount: u64) -> Result<u64, QuotaError> {
        let attempts = self.max_attempts.get();

        for attempt in 1..=attempts {
            let tenant = self.get_tenant(tenant_id).await?;

            let remaining =
                tenant
                    .remaining_after(amount)
                    .ok_or_else(|| QuotaError::InvalidBalance {
                        tenant_id: tenant_id.clone(),
                        balance: tenant.tokens,
                        requested: amount,
                    })?;

            if self
                .repository
                .compare_and_swap(tenant_id, tenant.tokens, remaining)
                .await?
            {
                tracing::info!(amount, remaining, "Tokens spent");
                return Ok(remaining);
            }

            tracing::warn!(
                attempt,
                max_attempts = attempts,
                "Balance changed concurrently, retrying spend"
            );
        }

        Err(QuotaError::Contention {
            tenant_id: tenant_id.clone(),
            attempts,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum QuotaError {
    #[error("tenant not found: {0}")]
    NotFound(TenantId),
    #[error("invalid balance for tenant {tenant_id}: {requested} requested, {balance} available")]
    InvalidBalance {
        tenant_id: TenantId,
        balance: u64,
        requested: u64,
    },
    #[error("balance of tenant {tenant_id} kept changing after {attempts} attempts")]
    Contention { tenant_id: TenantId, attempts: u32 },
    #[error("repository: {0}")]
    Repository(#[from] RepositoryError),
}
