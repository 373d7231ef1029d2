//! Cover letter writer agent. The writer reports its own word count; the
//! pipeline re-checks it against [`count_words`] with a ±30 tolerance.

use crate::agents::{issue_call, parse_payload, prompts, to_prompt_json, AgentOutcome, StageError};
use crate::budget::BudgetTracker;
use crate::llm_client::{ModelTier, ProviderClient};
use crate::models::job::JobRecord;
use crate::models::resume::ResumeRecord;
use crate::models::tailoring::{CoverLetterPack, TailoredResume};
use crate::schema;

pub const AGENT: &str = "cover_letter_writer";
const MAX_COMPLETION_TOKENS: u32 = 1024;

/// Allowed drift between the writer's reported word count and ours.
pub const WORD_COUNT_TOLERANCE: u32 = 30;

pub async fn write_cover_letter(
    provider: &dyn ProviderClient,
    budget: &BudgetTracker,
    resume: &ResumeRecord,
    job: &JobRecord,
    tailored: &TailoredResume,
) -> Result<AgentOutcome<CoverLetterPack>, StageError> {
    let prompt = prompts::COVER_LETTER_TEMPLATE
        .replace("{resume_json}", &to_prompt_json(AGENT, resume)?)
        .replace("{job_json}", &to_prompt_json(AGENT, job)?)
        .replace("{tailored_json}", &to_prompt_json(AGENT, tailored)?);

    let (text, tokens_used) = issue_call(
        provider,
        budget,
        AGENT,
        ModelTier::Quality,
        MAX_COMPLETION_TOKENS,
        prompts::COVER_LETTER_SYSTEM,
        &prompt,
    )
    .await?;

    let raw = parse_payload(AGENT, &text)?;
    let pack = schema::validate_cover_letter(AGENT, raw)?;
    Ok(AgentOutcome {
        value: pack,
        tokens_used,
    })
}

/// The engine's own word count of a letter body.
pub fn count_words(body: &str) -> u32 {
    body.split_whitespace().count() as u32
}

/// True when the writer's reported count is within tolerance of ours.
pub fn word_count_plausible(pack: &CoverLetterPack) -> bool {
    count_words(&pack.body).abs_diff(pack.word_count) <= WORD_COUNT_TOLERANCE
}
