//! Run history collaborator. Both calls are best-effort: a failing store
//! must never fail the orchestrator call, so the driver logs and moves on.

use async_trait::async_trait;

use crate::models::run::{RunState, RunType};

#[async_trait]
pub trait RunStore: Send + Sync {
    async fn create_run(
        &self,
        user_id: &str,
        run_id: &str,
        run_type: RunType,
        resume_hash: &str,
        token_budget_total: u32,
    ) -> anyhow::Result<()>;

    async fn complete_run(&self, run_id: &str, state: &RunState) -> anyhow::Result<()>;
}

/// Default store for embedders that persist run history themselves.
pub struct NoopRunStore;

#[async_trait]
impl RunStore for NoopRunStore {
    async fn create_run(
        &self,
        _user_id: &str,
        _run_id: &str,
        _run_type: RunType,
        _resume_hash: &str,
        _token_budget_total: u32,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    async fn complete_run(&self, _run_id: &str, _state: &RunState) -> anyhow::Result<()> {
        Ok(())
    }
}
