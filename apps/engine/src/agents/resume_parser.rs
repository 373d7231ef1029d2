//! Resume parser agent — resume text → [`ResumeRecord`].

use crate::agents::{issue_call, parse_payload, prompts, AgentOutcome, StageError};
use crate::budget::BudgetTracker;
use crate::llm_client::{ModelTier, ProviderClient};
use crate::models::resume::ResumeRecord;
use crate::schema;

pub const AGENT: &str = "resume_parser";
const MAX_COMPLETION_TOKENS: u32 = 2048;

pub async fn parse_resume(
    provider: &dyn ProviderClient,
    budget: &BudgetTracker,
    resume_text: &str,
) -> Result<AgentOutcome<ResumeRecord>, StageError> {
    let prompt = prompts::RESUME_PARSE_TEMPLATE.replace("{resume_text}", resume_text);
    let (text, tokens_used) = issue_call(
        provider,
        budget,
        AGENT,
        ModelTier::Fast,
        MAX_COMPLETION_TOKENS,
        prompts::RESUME_PARSE_SYSTEM,
        &prompt,
    )
    .await?;

    let raw = parse_payload(AGENT, &text)?;
    let record = schema::validate_resume(AGENT, raw)?;
    Ok(AgentOutcome {
        value: record,
        tokens_used,
    })
}
