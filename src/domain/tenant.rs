use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TenantId(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TenantIdError {
    #[error("tenant id must not be empty")]
    Empty,
}

impl TenantId {
    pub fn new(id: impl Into<String>) -> Result<Self, TenantIdError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(TenantIdError::Empty);
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Token balance of a tenant. Unsigned, so a negative balance cannot be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantRecord {
    pub tenant_id: TenantId,
    pub tokens: u64,
}

impl TenantRecord {
    pub fn new(tenant_id: TenantId, tokens: u64) -> Self {
        Self { tenant_id, tokens }
    }

    /// True when spending `amount` would leave a strictly positive balance.
    pub fn can_afford(&self, amount: u64) -> bool {
        self.tokens > amount
    }

    /// Balance after spending `amount`, or `None` if it would go negative.
    pub fn remaining_after(&self, amount: u64) -> Option<u64> {
        self.tokens.checked_sub(amount)
    }
}
