//! Quota guard — external collaborator bounding how often a caller may
//! invoke the pipeline. Consulted, never owned: a failing quota backend
//! fails OPEN and the run proceeds with a warning.

use async_trait::async_trait;

/// Outcome of a quota check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuotaDecision {
    Allowed,
    Denied { reason: String },
}

#[async_trait]
pub trait QuotaStore: Send + Sync {
    async fn check(&self, user_id: &str) -> anyhow::Result<QuotaDecision>;
}

/// Default guard for deployments that enforce quota elsewhere.
pub struct UnlimitedQuota;

#[async_trait]
impl QuotaStore for UnlimitedQuota {
    async fn check(&self, _user_id: &str) -> anyhow::Result<QuotaDecision> {
        Ok(QuotaDecision::Allowed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unlimited_quota_always_allows() {
        let quota = UnlimitedQuota;
        assert_eq!(quota.check("user-1").await.unwrap(), QuotaDecision::Allowed);
    }
}
