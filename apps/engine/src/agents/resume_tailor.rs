//! Resume tailor agent — reorganizes the source resume for one job.
//! Facts only: unsupported strengthening metrics surface as bracketed
//! placeholders that the guard later routes to `requires_confirmation`.

use crate::agents::{issue_call, parse_payload, prompts, to_prompt_json, AgentOutcome, StageError};
use crate::budget::BudgetTracker;
use crate::llm_client::{ModelTier, ProviderClient};
use crate::models::job::JobRecord;
use crate::models::resume::ResumeRecord;
use crate::models::tailoring::TailoredResume;
use crate::schema;

pub const AGENT: &str = "resume_tailor";
const MAX_COMPLETION_TOKENS: u32 = 3072;

pub async fn tailor_resume(
    provider: &dyn ProviderClient,
    budget: &BudgetTracker,
    resume: &ResumeRecord,
    job: &JobRecord,
) -> Result<AgentOutcome<TailoredResume>, StageError> {
    let prompt = prompts::TAILOR_TEMPLATE
        .replace("{resume_json}", &to_prompt_json(AGENT, resume)?)
        .replace("{job_json}", &to_prompt_json(AGENT, job)?);

    let (text, tokens_used) = issue_call(
        provider,
        budget,
        AGENT,
        ModelTier::Quality,
        MAX_COMPLETION_TOKENS,
        prompts::TAILOR_SYSTEM,
        &prompt,
    )
    .await?;

    let raw = parse_payload(AGENT, &text)?;
    let tailored = schema::validate_tailored_resume(AGENT, raw)?;
    Ok(AgentOutcome {
        value: tailored,
        tokens_used,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::{Completion, ProviderError};
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
    async fn test_tailor_resume_validates_experience_blocks() {
        let provider = CannedProvider(
            r#"{
                "summary": "Backend engineer focused on billing systems",
                "skills": ["Rust"],
                "experience": [{
                    "company": "Acme",
                    "title": "Engineer",
                    "period": "2021 - present",
                    "bullets": ["Reworked billing pipeline, cutting failures [X%]"]
                }],
                "change_log": ["summary: rewritten toward billing"]
            }"#,
        );
        let budget = BudgetTracker::new(100_000);
        let outcome = tailor_resume(
            &provider,
            &budget,
            &ResumeRecord::default(),
            &JobRecord::default(),
        )
        .await
        .unwrap();
        assert_eq!(outcome.value.experience.len(), 1);
        assert_eq!(outcome.value.change_log.len(), 1);
        assert!(outcome.value.warnings.is_empty());
    }
}
