//! Job posting as extracted by the job parser agent.

use serde::{Deserialize, Serialize};

/// Whether the posting states visa sponsorship is available.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VisaSponsorship {
    Yes,
    No,
    #[default]
    Unknown,
}

/// Structured job posting. `must_have_skills` and `nice_to_have_skills`
/// are disjoint — the parser partitions on lexical cues ("required" vs
/// "preferred").
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub employment_type: Option<String>,
    #[serde(default)]
    pub seniority: Option<String>,
    /// Absent salary stays None — never coerced to zero.
    #[serde(default)]
    pub salary_min: Option<u64>,
    #[serde(default)]
    pub salary_max: Option<u64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub must_have_skills: Vec<String>,
    #[serde(default)]
    pub nice_to_have_skills: Vec<String>,
    #[serde(default)]
    pub visa_sponsorship: VisaSponsorship,
    #[serde(default)]
    pub relocation_assistance: bool,
    /// ISO-3166 alpha-2 codes.
    #[serde(default)]
    pub eligible_countries: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub responsibilities: Vec<String>,
}
