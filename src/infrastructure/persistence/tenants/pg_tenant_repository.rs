use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::instrument;

use crate::application::ports::{RepositoryError, TenantRepository};
use crate::domain::{TenantId, TenantRecord};

pub struct PgTenantRepository {
    pool: PgPool,
}

impl PgTenantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates or replaces a tenant balance. Tenants are provisioned out of
    /// band; this exists for seeding and tests.
    #[instrument(skip(self, record), fields(tenant_id = %record.tenant_id))]
    pub async fn upsert(&self, record: &TenantRecord) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO tenants (tenant_id, tokens, updated_at)
            VALUES ($1, $2, now())
            ON CONFLICT (tenant_id) DO UPDATE SET tokens = EXCLUDED.tokens, updated_at = now()
            "#,
        )
        .bind(record.tenant_id.as_str())
        .bind(to_db(record.tokens)?)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        Ok(())
    }
}

fn to_db(tokens: u64) -> Result<i64, RepositoryError> {
    i64::try_from(tokens).map_err(|_| {
        RepositoryError::ConstraintViolation(format!("balance {} exceeds BIGINT", tokens))
    })
}

fn from_db(tokens: i64) -> Result<u64, RepositoryError> {
    u64::try_from(tokens)
        .map_err(|_| RepositoryError::MalformedRecord(format!("negative balance {}", tokens)))
}

#[async_trait]
impl TenantRepository for PgTenantRepository {
    #[instrument(skip(self), fields(tenant_id = %tenant_id))]
    async fn get(&self, tenant_id: &TenantId) -> Result<Option<TenantRecord>, RepositoryError> {
        let row = sqlx::query("SELECT tokens FROM tenants WHERE tenant_id = $1")
            .bind(tenant_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        match row {
            Some(r) => {
                let tokens: i64 = r
                    .try_get("tokens")
                    .map_err(|e| RepositoryError::MalformedRecord(e.to_string()))?;
                Ok(Some(TenantRecord::new(tenant_id.clone(), from_db(tokens)?)))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id))]
    async fn compare_and_swap(
        &self,
        tenant_id: &TenantId,
        expected: u64,
        new: u64,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE tenants
            SET tokens = $3, updated_at = now()
            WHERE tenant_id = $1 AND tokens = $2
            "#,
        )
        .bind(tenant_id.as_str())
        .bind(to_db(expected)?)
        .bind(to_db(new)?)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        Ok(result.rows_affected() == 1)
    }
}
