//! Run-level types: orchestrator input, run state, and the budget report.

use serde::{Deserialize, Serialize};

use crate::models::job::JobRecord;
use crate::models::matching::MatchResult;
use crate::models::resume::ResumeRecord;
use crate::models::tailoring::{CoverLetterPack, GuardReport, TailoredResume};

/// How far the pipeline proceeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunType {
    ResumeReview,
    JobMatch,
    ApplyPack,
}

impl RunType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunType::ResumeReview => "resume_review",
            RunType::JobMatch => "job_match",
            RunType::ApplyPack => "apply_pack",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Ok,
    Partial,
    Blocked,
}

/// Token spend for one run. `stopped_reason` is set whenever the budget
/// cut the pipeline short.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BudgetReport {
    pub token_used_estimate: u32,
    pub token_budget_total: u32,
    #[serde(default)]
    pub stopped_reason: Option<String>,
}

/// One job posting supplied by the caller. `job_id` is preserved verbatim
/// in the output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    pub raw_text: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RunLimits {
    #[serde(default)]
    pub max_tailored_jobs: Option<usize>,
    #[serde(default)]
    pub token_budget_total: Option<u32>,
}

/// Previously computed sub-results the caller may hand back in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CachedInputs {
    #[serde(default)]
    pub resume_json: Option<ResumeRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorInput {
    pub run_type: RunType,
    pub user_id: String,
    pub resume_text: String,
    #[serde(default)]
    pub candidate_profile: Option<String>,
    #[serde(default)]
    pub jobs: Vec<JobPosting>,
    #[serde(default)]
    pub limits: Option<RunLimits>,
    #[serde(default)]
    pub cached: Option<CachedInputs>,
}

/// One scored job, carried in descending-score order (input order on ties).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedJob {
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    /// Position in the caller's job list; tie-break key for ranking.
    pub input_index: usize,
    pub job: JobRecord,
    pub match_result: MatchResult,
}

/// Tailoring-chain output for one job that cleared the quality thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TailoredOutput {
    #[serde(default)]
    pub job_id: Option<String>,
    pub input_index: usize,
    pub tailored_resume: TailoredResume,
    pub cover_letter_pack: CoverLetterPack,
    pub guard_report: GuardReport,
}

/// The orchestrator's output. Created at pipeline start, mutated only by
/// the pipeline driver, immutable once returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    pub run_id: String,
    pub run_type: RunType,
    pub status: RunStatus,
    pub budget: BudgetReport,
    #[serde(default)]
    pub resume_json: Option<ResumeRecord>,
    #[serde(default)]
    pub ranked_jobs: Vec<RankedJob>,
    #[serde(default)]
    pub tailored_outputs: Vec<TailoredOutput>,
    #[serde(default)]
    pub notes_for_ui: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_type_serde_snake_case() {
        assert_eq!(
            serde_json::to_string(&RunType::ApplyPack).unwrap(),
            r#""apply_pack""#
        );
        let parsed: RunType = serde_json::from_str(r#""resume_review""#).unwrap();
        assert_eq!(parsed, RunType::ResumeReview);
    }

    #[test]
    fn test_orchestrator_input_minimal_deserialization() {
        let json = r#"{
            "run_type": "resume_review",
            "user_id": "user-1",
            "resume_text": "Jane Doe, backend engineer."
        }"#;
        let input: OrchestratorInput = serde_json::from_str(json).unwrap();
        assert!(input.jobs.is_empty());
        assert!(input.limits.is_none());
        assert!(input.cached.is_none());
    }

    #[test]
    fn test_job_posting_preserves_job_id() {
        let json = r#"{"job_id": "ext-42", "raw_text": "Rust engineer wanted"}"#;
        let posting: JobPosting = serde_json::from_str(json).unwrap();
        assert_eq!(posting.job_id.as_deref(), Some("ext-42"));
        assert!(posting.source.is_none());
    }
}
