//! Job parser agent — posting text → [`JobRecord`].

use crate::agents::{issue_call, parse_payload, prompts, AgentOutcome, StageError};
use crate::budget::BudgetTracker;
use crate::llm_client::{ModelTier, ProviderClient};
use crate::models::job::JobRecord;
use crate::schema;

pub const AGENT: &str = "job_parser";
const MAX_COMPLETION_TOKENS: u32 = 1536;

pub async fn parse_job(
    provider: &dyn ProviderClient,
    budget: &BudgetTracker,
    job_text: &str,
) -> Result<AgentOutcome<JobRecord>, StageError> {
    let prompt = prompts::JOB_PARSE_TEMPLATE.replace("{job_text}", job_text);
    let (text, tokens_used) = issue_call(
        provider,
        budget,
        AGENT,
        ModelTier::Fast,
        MAX_COMPLETION_TOKENS,
        prompts::JOB_PARSE_SYSTEM,
        &prompt,
    )
    .await?;

    let raw = parse_payload(AGENT, &text)?;
    let job = schema::validate_job(AGENT, raw)?;
    Ok(AgentOutcome {
        value: job,
        tokens_used,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::{Completion, ProviderError};
    use crate::models::job::VisaSponsorship;
    use async_trait::async_trait;

    struct CannedProvider(&'static str);

    #[async_trait]
    impl ProviderClient for CannedProvider {
        async fn complete(
            &self,
            _tier: ModelTier,
            _max_tokens: u32,
            _system: &str,
            _user: &str,
        ) -> Result<Completion, ProviderError> {
            Ok(Completion {
                text: self.0.to_string(),
                usage: None,
            })
        }
    }

    #[tokio::test]
    async fn test_parse_job_applies_defaults() {
        let provider = CannedProvider(
            r#"{"title": "Rust Engineer", "must_have_skills": ["Rust"]}"#,
        );
        let budget = BudgetTracker::new(100_000);
        let outcome = parse_job(&provider, &budget, "Rust Engineer wanted")
            .await
            .unwrap();
        assert_eq!(outcome.value.visa_sponsorship, VisaSponsorship::Unknown);
        assert!(outcome.value.nice_to_have_skills.is_empty());
        assert!(outcome.value.salary_min.is_none());
    }

    #[tokio::test]
    async fn test_parse_job_rejects_overlapping_lists() {
        let provider = CannedProvider(
            r#"{"must_have_skills": ["Rust"], "nice_to_have_skills": ["Rust"]}"#,
        );
        let budget = BudgetTracker::new(100_000);
        let err = parse_job(&provider, &budget, "posting").await.unwrap_err();
        assert!(matches!(err, StageError::Schema(_)));
    }
}
