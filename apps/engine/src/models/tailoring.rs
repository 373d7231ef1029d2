//! Outputs of the tailoring chain: tailored resume, cover letter, guard audit.

use serde::{Deserialize, Serialize};

/// One rewritten experience block in a tailored resume.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TailoredExperience {
    pub company: String,
    pub title: String,
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default)]
    pub bullets: Vec<String>,
}

/// Resume reorganized for a specific job. Facts only — any strengthening
/// metric absent from the source appears as a bracketed placeholder
/// (e.g. `[X%]`) and is logged in `change_log`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TailoredResume {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub experience: Vec<TailoredExperience>,
    #[serde(default)]
    pub ats_keywords: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
    /// One entry per modified unit.
    #[serde(default)]
    pub change_log: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LetterTone {
    #[default]
    Professional,
    Warm,
    Direct,
}

/// Cover letter with a three-paragraph body and the writer's own word count.
/// The orchestrator re-checks `word_count` against the body (±30 words).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoverLetterPack {
    #[serde(default)]
    pub subject_line: String,
    #[serde(default)]
    pub salutation: String,
    pub body: String,
    #[serde(default)]
    pub closing: String,
    #[serde(default)]
    pub tone: LetterTone,
    pub word_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GuardVerdict {
    Pass,
    Fail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueType {
    Fabrication,
    Inconsistency,
    Exaggeration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    High,
    Medium,
    Low,
}

/// A single truth-consistency finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardIssue {
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    pub field: String,
    #[serde(default)]
    pub original_value: Option<String>,
    #[serde(default)]
    pub fabricated_value: Option<String>,
    pub severity: IssueSeverity,
}

/// Fabrication/consistency audit of generated content against the source
/// resume. The verdict is re-derived mechanically from the issue list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardReport {
    pub verdict: GuardVerdict,
    #[serde(default)]
    pub issues: Vec<GuardIssue>,
    /// Bracketed placeholders awaiting user confirmation — not issues.
    #[serde(default)]
    pub requires_confirmation: Vec<String>,
    pub confidence: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_verdict_serde_uppercase() {
        assert_eq!(serde_json::to_string(&GuardVerdict::Fail).unwrap(), r#""FAIL""#);
        let parsed: GuardVerdict = serde_json::from_str(r#""PASS""#).unwrap();
        assert_eq!(parsed, GuardVerdict::Pass);
    }

    #[test]
    fn test_guard_issue_uses_type_key() {
        let json = r#"{
            "type": "fabrication",
            "field": "experience[0].metrics",
            "original_value": null,
            "fabricated_value": "Grew revenue 300%",
            "severity": "high"
        }"#;
        let issue: GuardIssue = serde_json::from_str(json).unwrap();
        assert_eq!(issue.issue_type, IssueType::Fabrication);
        assert_eq!(issue.severity, IssueSeverity::High);
        assert!(issue.original_value.is_none());
    }

    #[test]
    fn test_letter_tone_default_is_professional() {
        assert_eq!(LetterTone::default(), LetterTone::Professional);
    }
}
