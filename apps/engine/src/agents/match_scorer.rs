//! Match scorer agent — the model assesses skill coverage and fit flags;
//! the deterministic rubric below turns that assessment into the final
//! [`MatchResult`]. The model never decides scores or thresholds.

use crate::agents::{issue_call, parse_payload, prompts, to_prompt_json, AgentOutcome, StageError};
use crate::budget::BudgetTracker;
use crate::llm_client::{ModelTier, ProviderClient};
use crate::models::job::JobRecord;
use crate::models::matching::{MatchAssessment, MatchResult, Recommendation, SeniorityMatch};
use crate::models::resume::ResumeRecord;
use crate::schema;

pub const AGENT: &str = "match_scorer";
const MAX_COMPLETION_TOKENS: u32 = 1024;

pub async fn score_match(
    provider: &dyn ProviderClient,
    budget: &BudgetTracker,
    resume: &ResumeRecord,
    job: &JobRecord,
    profile_hints: Option<&str>,
) -> Result<AgentOutcome<MatchResult>, StageError> {
    let prompt = prompts::MATCH_TEMPLATE
        .replace("{resume_json}", &to_prompt_json(AGENT, resume)?)
        .replace("{job_json}", &to_prompt_json(AGENT, job)?)
        .replace("{profile_hints}", profile_hints.unwrap_or(""));

    let (text, tokens_used) = issue_call(
        provider,
        budget,
        AGENT,
        ModelTier::Fast,
        MAX_COMPLETION_TOKENS,
        prompts::MATCH_SYSTEM,
        &prompt,
    )
    .await?;

    let raw = parse_payload(AGENT, &text)?;
    let assessment = schema::validate_match_assessment(AGENT, raw)?;
    Ok(AgentOutcome {
        value: compute_match(assessment),
        tokens_used,
    })
}

/// Percentage of a skill list the candidate covers; an empty list counts
/// as fully covered.
fn coverage_pct(matched: usize, missing: usize) -> u8 {
    let total = matched + missing;
    if total == 0 {
        100
    } else {
        ((matched as f64 / total as f64) * 100.0).round() as u8
    }
}

fn seniority_score(seniority: SeniorityMatch) -> f64 {
    match seniority {
        SeniorityMatch::Match => 100.0,
        SeniorityMatch::Over => 60.0,
        SeniorityMatch::Under => 40.0,
        SeniorityMatch::Unknown => 50.0,
    }
}

/// The scoring rubric, applied in a fixed order:
/// coverage percentages → weighted skill match → seniority score →
/// location/authorization score → final weighted score → recommendation.
pub fn compute_match(assessment: MatchAssessment) -> MatchResult {
    let must_have_coverage_pct = coverage_pct(
        assessment.matched_must_haves.len(),
        assessment.missing_must_haves.len(),
    );
    let nice_to_have_coverage_pct = coverage_pct(
        assessment.matched_nice_to_haves.len(),
        assessment.missing_nice_to_haves.len(),
    );

    let skill_match_pct =
        f64::from(must_have_coverage_pct) * 0.7 + f64::from(nice_to_have_coverage_pct) * 0.3;

    let seniority = seniority_score(assessment.seniority_match);

    let mut location_auth_score: f64 = 0.0;
    if assessment.location_match {
        location_auth_score += 50.0;
    }
    if assessment.work_auth_ok {
        location_auth_score += 30.0;
    }
    if assessment.visa_ok {
        location_auth_score += 20.0;
    }
    let location_auth_score = location_auth_score.min(100.0);

    let score = (skill_match_pct * 0.50
        + seniority * 0.20
        + location_auth_score * 0.20
        + f64::from(assessment.other_score) * 0.10)
        .round() as u8;

    let MatchAssessment {
        matched_must_haves,
        missing_must_haves,
        matched_nice_to_haves,
        missing_nice_to_haves,
        location_match,
        work_auth_ok,
        visa_ok,
        seniority_match,
        explanation,
        ..
    } = assessment;

    let mut matched_skills = matched_must_haves;
    matched_skills.extend(matched_nice_to_haves);
    let mut missing_skills = missing_must_haves;
    missing_skills.extend(missing_nice_to_haves);

    MatchResult {
        score,
        must_have_coverage_pct,
        nice_to_have_coverage_pct,
        matched_skills,
        missing_skills,
        location_match,
        work_auth_ok,
        visa_ok,
        seniority_match,
        recommendation: Recommendation::from_score(score),
        explanation,
    }
}
