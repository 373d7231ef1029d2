//! Match scoring output — the model assesses, the rubric decides.

use serde::{Deserialize, Serialize};

/// How the candidate's seniority relates to the role's.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeniorityMatch {
    Match,
    Over,
    Under,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recommendation {
    Apply,
    Stretch,
    Skip,
}

impl Recommendation {
    /// The only authority on recommendation thresholds. Whatever the model
    /// says, the orchestrator re-derives the recommendation through here.
    pub fn from_score(score: u8) -> Self {
        if score >= 70 {
            Recommendation::Apply
        } else if score >= 55 {
            Recommendation::Stretch
        } else {
            Recommendation::Skip
        }
    }
}

/// Raw skill/fit assessment returned by the match scorer's model call.
/// Percentages and the final score are NOT part of this contract — they
/// are computed deterministically from it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchAssessment {
    #[serde(default)]
    pub matched_must_haves: Vec<String>,
    #[serde(default)]
    pub missing_must_haves: Vec<String>,
    #[serde(default)]
    pub matched_nice_to_haves: Vec<String>,
    #[serde(default)]
    pub missing_nice_to_haves: Vec<String>,
    #[serde(default)]
    pub location_match: bool,
    #[serde(default)]
    pub work_auth_ok: bool,
    #[serde(default)]
    pub visa_ok: bool,
    #[serde(default)]
    pub seniority_match: SeniorityMatch,
    /// Experience/education fit bucket: 0, 50 or 100.
    #[serde(default = "default_other_score")]
    pub other_score: u8,
    #[serde(default)]
    pub explanation: String,
}

fn default_other_score() -> u8 {
    50
}

/// Final scored match for one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub score: u8,
    pub must_have_coverage_pct: u8,
    pub nice_to_have_coverage_pct: u8,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub location_match: bool,
    pub work_auth_ok: bool,
    pub visa_ok: bool,
    pub seniority_match: SeniorityMatch,
    pub recommendation: Recommendation,
    pub explanation: String,
}
