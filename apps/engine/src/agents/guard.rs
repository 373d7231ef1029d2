//! Truth-consistency guard agent — audits generated materials against the
//! original resume. The model finds issues; the verdict and the confidence
//! cap are re-derived here so control flow never rests on the model's word.

use tracing::warn;

use crate::agents::{issue_call, parse_payload, prompts, to_prompt_json, AgentOutcome, StageError};
use crate::budget::BudgetTracker;
use crate::llm_client::{ModelTier, ProviderClient};
use crate::models::resume::ResumeRecord;
use crate::models::tailoring::{
    CoverLetterPack, GuardIssue, GuardReport, GuardVerdict, IssueSeverity, TailoredResume,
};
use crate::schema;

pub const AGENT: &str = "truth_guard";
const MAX_COMPLETION_TOKENS: u32 = 1536;

/// Confidence ceiling when the original resume offers fewer than 3
/// experience entries to cross-check against.
const THIN_SOURCE_CONFIDENCE_CAP: f32 = 0.7;
const THIN_SOURCE_EXPERIENCE_MIN: usize = 3;

pub async fn audit(
    provider: &dyn ProviderClient,
    budget: &BudgetTracker,
    original: &ResumeRecord,
    tailored: &TailoredResume,
    cover_letter: &CoverLetterPack,
) -> Result<AgentOutcome<GuardReport>, StageError> {
    let prompt = prompts::GUARD_TEMPLATE
        .replace("{original_json}", &to_prompt_json(AGENT, original)?)
        .replace("{tailored_json}", &to_prompt_json(AGENT, tailored)?)
        .replace("{cover_json}", &to_prompt_json(AGENT, cover_letter)?);

    let (text, tokens_used) = issue_call(
        provider,
        budget,
        AGENT,
        ModelTier::Quality,
        MAX_COMPLETION_TOKENS,
        prompts::GUARD_SYSTEM,
        &prompt,
    )
    .await?;

    let raw = parse_payload(AGENT, &text)?;
    let mut report = schema::validate_guard_findings(AGENT, raw)?;

    let derived = derive_verdict(&report.issues);
    if derived != report.verdict {
        warn!(
            stated = ?report.verdict,
            derived = ?derived,
            "guard verdict disagreed with its own issue list; using derived verdict"
        );
        report.verdict = derived;
    }
    report.confidence = cap_confidence(report.confidence, original.experience.len());

    Ok(AgentOutcome {
        value: report,
        tokens_used,
    })
}

/// FAIL on any single high-severity issue, or on two or more mediums.
pub fn derive_verdict(issues: &[GuardIssue]) -> GuardVerdict {
    let any_high = issues.iter().any(|i| i.severity == IssueSeverity::High);
    let mediums = issues
        .iter()
        .filter(|i| i.severity == IssueSeverity::Medium)
        .count();
    if any_high || mediums >= 2 {
        GuardVerdict::Fail
    } else {
        GuardVerdict::Pass
    }
}

fn cap_confidence(confidence: f32, experience_entries: usize) -> f32 {
    if experience_entries < THIN_SOURCE_EXPERIENCE_MIN {
        confidence.min(THIN_SOURCE_CONFIDENCE_CAP)
    } else {
        confidence
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tailoring::IssueType;

    fn issue(severity: IssueSeverity) -> GuardIssue {
        GuardIssue {
            issue_type: IssueType::Exaggeration,
            field: "summary".to_string(),
            original_value: Some("led a team of 3".to_string()),
            fabricated_value: Some("led a large organization".to_string()),
            severity,
        }
    }

    #[test]
    fn test_no_issues_passes() {
        assert_eq!(derive_verdict(&[]), GuardVerdict::Pass);
    }

    #[test]
    fn test_single_high_fails() {
        assert_eq!(
            derive_verdict(&[issue(IssueSeverity::High)]),
            GuardVerdict::Fail
        );
    }

    #[test]
    fn test_single_medium_passes_two_fail() {
        assert_eq!(
            derive_verdict(&[issue(IssueSeverity::Medium)]),
            GuardVerdict::Pass
        );
        assert_eq!(
            derive_verdict(&[issue(IssueSeverity::Medium), issue(IssueSeverity::Medium)]),
            GuardVerdict::Fail
        );
    }

    #[test]
    fn test_lows_never_fail() {
        let lows = vec![issue(IssueSeverity::Low); 5];
        assert_eq!(derive_verdict(&lows), GuardVerdict::Pass);
    }

    #[test]
    fn test_confidence_capped_for_thin_source() {
        assert_eq!(cap_confidence(0.95, 2), 0.7);
        assert_eq!(cap_confidence(0.95, 3), 0.95);
        assert_eq!(cap_confidence(0.5, 0), 0.5);
    }
}
