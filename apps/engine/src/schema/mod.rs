//! Schema gate — the validation boundary between raw model output and
//! typed internal data.
//!
//! Every agent response passes through here before anything downstream may
//! read it. Documented defaults (missing optional arrays → empty, plus the
//! per-contract defaults noted on each validator) are applied first; after
//! that, checking is strict. Validation stops after the first three
//! mismatches so diagnostics stay actionable without flooding the notes.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::errors::SchemaViolation;
use crate::models::job::JobRecord;
use crate::models::matching::MatchAssessment;
use crate::models::resume::ResumeRecord;
use crate::models::tailoring::{CoverLetterPack, GuardReport, TailoredResume};

const MAX_VIOLATIONS: usize = 3;

struct Gate {
    agent: &'static str,
    violations: Vec<(String, String)>,
}

impl Gate {
    fn new(agent: &'static str) -> Self {
        Self {
            agent,
            violations: Vec::new(),
        }
    }

    fn record(&mut self, path: impl Into<String>, message: impl Into<String>) {
        if self.violations.len() < MAX_VIOLATIONS {
            self.violations.push((path.into(), message.into()));
        }
    }

    fn is_full(&self) -> bool {
        self.violations.len() >= MAX_VIOLATIONS
    }

    fn finish<T: DeserializeOwned>(self, obj: Map<String, Value>) -> Result<T, SchemaViolation> {
        if let Some((first_path, _)) = self.violations.first() {
            let message = self
                .violations
                .iter()
                .map(|(p, m)| format!("{p}: {m}"))
                .collect::<Vec<_>>()
                .join("; ");
            return Err(SchemaViolation {
                agent: self.agent,
                path: first_path.clone(),
                message,
            });
        }
        serde_json::from_value(Value::Object(obj)).map_err(|e| SchemaViolation {
            agent: self.agent,
            path: "$".to_string(),
            message: e.to_string(),
        })
    }
}

fn require_object(
    agent: &'static str,
    raw: Value,
) -> Result<Map<String, Value>, SchemaViolation> {
    match raw {
        Value::Object(map) => Ok(map),
        other => Err(SchemaViolation {
            agent,
            path: "$".to_string(),
            message: format!("expected a JSON object, got {}", type_name(&other)),
        }),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Missing or null array fields become empty arrays — the one documented
/// lenient default shared by all contracts.
fn default_array(obj: &mut Map<String, Value>, key: &str) {
    match obj.get(key) {
        None | Some(Value::Null) => {
            obj.insert(key.to_string(), Value::Array(Vec::new()));
        }
        _ => {}
    }
}

fn default_value(obj: &mut Map<String, Value>, key: &str, fallback: Value) {
    match obj.get(key) {
        None | Some(Value::Null) => {
            obj.insert(key.to_string(), fallback);
        }
        _ => {}
    }
}

fn check_opt_string(gate: &mut Gate, obj: &Map<String, Value>, path: &str, key: &str) {
    if let Some(value) = obj.get(key) {
        if !value.is_null() && !value.is_string() {
            gate.record(
                format!("{path}.{key}"),
                format!("expected string or null, got {}", type_name(value)),
            );
        }
    }
}

fn check_string(gate: &mut Gate, obj: &Map<String, Value>, path: &str, key: &str) {
    match obj.get(key) {
        Some(Value::String(_)) => {}
        Some(other) => gate.record(
            format!("{path}.{key}"),
            format!("expected string, got {}", type_name(other)),
        ),
        None => gate.record(format!("{path}.{key}"), "required field is missing"),
    }
}

fn check_bool(gate: &mut Gate, obj: &Map<String, Value>, path: &str, key: &str) {
    if let Some(value) = obj.get(key) {
        if !value.is_boolean() {
            gate.record(
                format!("{path}.{key}"),
                format!("expected boolean, got {}", type_name(value)),
            );
        }
    }
}

fn check_string_array(gate: &mut Gate, obj: &Map<String, Value>, path: &str, key: &str) {
    match obj.get(key) {
        Some(Value::Array(items)) => {
            for (i, item) in items.iter().enumerate() {
                if gate.is_full() {
                    return;
                }
                if !item.is_string() {
                    gate.record(
                        format!("{path}.{key}[{i}]"),
                        format!("expected string, got {}", type_name(item)),
                    );
                }
            }
        }
        Some(other) => gate.record(
            format!("{path}.{key}"),
            format!("expected array, got {}", type_name(other)),
        ),
        None => {}
    }
}

fn check_opt_unsigned(gate: &mut Gate, obj: &Map<String, Value>, path: &str, key: &str) {
    if let Some(value) = obj.get(key) {
        if value.is_null() {
            return;
        }
        if value.as_u64().is_none() {
            gate.record(
                format!("{path}.{key}"),
                format!("expected non-negative integer or null, got {value}"),
            );
        }
    }
}

fn check_enum(gate: &mut Gate, obj: &Map<String, Value>, path: &str, key: &str, allowed: &[&str]) {
    match obj.get(key) {
        Some(Value::String(s)) if allowed.contains(&s.as_str()) => {}
        Some(other) => gate.record(
            format!("{path}.{key}"),
            format!("expected one of {}, got {other}", allowed.join(", ")),
        ),
        None => gate.record(
            format!("{path}.{key}"),
            format!("required field is missing (one of {})", allowed.join(", ")),
        ),
    }
}

/// Resume contract. Defaults: all list fields (top-level and per entry).
pub fn validate_resume(agent: &'static str, raw: Value) -> Result<ResumeRecord, SchemaViolation> {
    let mut obj = require_object(agent, raw)?;
    let mut gate = Gate::new(agent);

    for key in ["skills", "languages", "certifications", "experience", "education"] {
        default_array(&mut obj, key);
    }

    for key in [
        "name",
        "email",
        "phone",
        "location",
        "headline",
        "summary",
        "work_authorization",
    ] {
        check_opt_string(&mut gate, &obj, "$", key);
    }

    if let Some(value) = obj.get("years_of_experience") {
        if !value.is_null() {
            match value.as_f64() {
                Some(years) if years >= 0.0 => {}
                _ => gate.record(
                    "$.years_of_experience",
                    format!("expected non-negative number or null, got {value}"),
                ),
            }
        }
    }

    for key in ["skills", "languages", "certifications"] {
        check_string_array(&mut gate, &obj, "$", key);
    }

    if let Some(Value::Array(entries)) = obj.get_mut("experience") {
        for (i, entry) in entries.iter_mut().enumerate() {
            let path = format!("$.experience[{i}]");
            match entry {
                Value::Object(map) => {
                    default_array(map, "metrics");
                    default_array(map, "technologies");
                    check_string(&mut gate, map, &path, "company");
                    check_string(&mut gate, map, &path, "title");
                    check_opt_string(&mut gate, map, &path, "start_date");
                    check_opt_string(&mut gate, map, &path, "end_date");
                    check_opt_string(&mut gate, map, &path, "description");
                    check_string_array(&mut gate, map, &path, "metrics");
                    check_string_array(&mut gate, map, &path, "technologies");
                }
                other => gate.record(path, format!("expected object, got {}", type_name(other))),
            }
            if gate.is_full() {
                break;
            }
        }
    }

    if let Some(Value::Array(entries)) = obj.get("education") {
        for (i, entry) in entries.iter().enumerate() {
            let path = format!("$.education[{i}]");
            match entry {
                Value::Object(map) => {
                    check_string(&mut gate, map, &path, "institution");
                    check_opt_string(&mut gate, map, &path, "degree");
                    check_opt_string(&mut gate, map, &path, "field");
                    check_opt_unsigned(&mut gate, map, &path, "graduation_year");
                }
                other => gate.record(path, format!("expected object, got {}", type_name(other))),
            }
            if gate.is_full() {
                break;
            }
        }
    }

    gate.finish(obj)
}

/// Job contract. Defaults: list fields, `visa_sponsorship` → UNKNOWN,
/// `relocation_assistance` → false.
pub fn validate_job(agent: &'static str, raw: Value) -> Result<JobRecord, SchemaViolation> {
    let mut obj = require_object(agent, raw)?;
    let mut gate = Gate::new(agent);

    for key in [
        "must_have_skills",
        "nice_to_have_skills",
        "eligible_countries",
        "requirements",
        "responsibilities",
    ] {
        default_array(&mut obj, key);
    }
    default_value(&mut obj, "visa_sponsorship", Value::String("UNKNOWN".into()));
    default_value(&mut obj, "relocation_assistance", Value::Bool(false));

    for key in [
        "title",
        "company",
        "location",
        "employment_type",
        "seniority",
        "currency",
        "description",
    ] {
        check_opt_string(&mut gate, &obj, "$", key);
    }

    check_opt_unsigned(&mut gate, &obj, "$", "salary_min");
    check_opt_unsigned(&mut gate, &obj, "$", "salary_max");
    if let (Some(min), Some(max)) = (
        obj.get("salary_min").and_then(Value::as_u64),
        obj.get("salary_max").and_then(Value::as_u64),
    ) {
        if min > max {
            gate.record("$.salary_min", format!("salary_min {min} exceeds salary_max {max}"));
        }
    }

    for key in [
        "must_have_skills",
        "nice_to_have_skills",
        "eligible_countries",
        "requirements",
        "responsibilities",
    ] {
        check_string_array(&mut gate, &obj, "$", key);
    }

    check_enum(&mut gate, &obj, "$", "visa_sponsorship", &["YES", "NO", "UNKNOWN"]);
    check_bool(&mut gate, &obj, "$", "relocation_assistance");

    if let Some(Value::Array(codes)) = obj.get("eligible_countries") {
        for (i, code) in codes.iter().enumerate() {
            if gate.is_full() {
                break;
            }
            if let Some(s) = code.as_str() {
                if s.len() != 2 || !s.chars().all(|c| c.is_ascii_uppercase()) {
                    gate.record(
                        format!("$.eligible_countries[{i}]"),
                        format!("expected ISO-3166 alpha-2 code, got {s:?}"),
                    );
                }
            }
        }
    }

    // The two skill lists must stay disjoint.
    if let (Some(Value::Array(must)), Some(Value::Array(nice))) =
        (obj.get("must_have_skills"), obj.get("nice_to_have_skills"))
    {
        let must_lower: Vec<String> = must
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_lowercase)
            .collect();
        for (i, skill) in nice.iter().filter_map(Value::as_str).enumerate() {
            if gate.is_full() {
                break;
            }
            if must_lower.contains(&skill.to_lowercase()) {
                gate.record(
                    format!("$.nice_to_have_skills[{i}]"),
                    format!("{skill:?} also appears in must_have_skills"),
                );
            }
        }
    }

    gate.finish(obj)
}

/// Match assessment contract. Defaults: list fields, fit flags → false,
/// `seniority_match` → unknown, `other_score` → 50, `explanation` → "".
pub fn validate_match_assessment(
    agent: &'static str,
    raw: Value,
) -> Result<MatchAssessment, SchemaViolation> {
    let mut obj = require_object(agent, raw)?;
    let mut gate = Gate::new(agent);

    for key in [
        "matched_must_haves",
        "missing_must_haves",
        "matched_nice_to_haves",
        "missing_nice_to_haves",
    ] {
        default_array(&mut obj, key);
        check_string_array(&mut gate, &obj, "$", key);
    }
    for key in ["location_match", "work_auth_ok", "visa_ok"] {
        default_value(&mut obj, key, Value::Bool(false));
        check_bool(&mut gate, &obj, "$", key);
    }
    default_value(&mut obj, "seniority_match", Value::String("unknown".into()));
    default_value(&mut obj, "other_score", Value::from(50u32));
    default_value(&mut obj, "explanation", Value::String(String::new()));

    check_enum(
        &mut gate,
        &obj,
        "$",
        "seniority_match",
        &["match", "over", "under", "unknown"],
    );
    match obj.get("other_score").and_then(Value::as_u64) {
        Some(0) | Some(50) | Some(100) => {}
        other => gate.record(
            "$.other_score",
            format!("expected 0, 50 or 100, got {other:?}"),
        ),
    }
    check_opt_string(&mut gate, &obj, "$", "explanation");

    gate.finish(obj)
}

/// Tailored resume contract. Defaults: list fields (top-level and per
/// experience block).
pub fn validate_tailored_resume(
    agent: &'static str,
    raw: Value,
) -> Result<TailoredResume, SchemaViolation> {
    let mut obj = require_object(agent, raw)?;
    let mut gate = Gate::new(agent);

    for key in ["skills", "experience", "ats_keywords", "warnings", "change_log"] {
        default_array(&mut obj, key);
    }

    check_string(&mut gate, &obj, "$", "summary");
    for key in ["skills", "ats_keywords", "warnings", "change_log"] {
        check_string_array(&mut gate, &obj, "$", key);
    }

    if let Some(Value::Array(blocks)) = obj.get_mut("experience") {
        for (i, block) in blocks.iter_mut().enumerate() {
            let path = format!("$.experience[{i}]");
            match block {
                Value::Object(map) => {
                    default_array(map, "bullets");
                    check_string(&mut gate, map, &path, "company");
                    check_string(&mut gate, map, &path, "title");
                    check_opt_string(&mut gate, map, &path, "period");
                    check_string_array(&mut gate, map, &path, "bullets");
                }
                other => gate.record(path, format!("expected object, got {}", type_name(other))),
            }
            if gate.is_full() {
                break;
            }
        }
    }

    gate.finish(obj)
}

/// Cover letter contract. Defaults: subject_line/salutation/closing → "",
/// tone → professional. The body must be exactly three paragraphs
/// separated by blank lines.
pub fn validate_cover_letter(
    agent: &'static str,
    raw: Value,
) -> Result<CoverLetterPack, SchemaViolation> {
    let mut obj = require_object(agent, raw)?;
    let mut gate = Gate::new(agent);

    for key in ["subject_line", "salutation", "closing"] {
        default_value(&mut obj, key, Value::String(String::new()));
        check_opt_string(&mut gate, &obj, "$", key);
    }
    default_value(&mut obj, "tone", Value::String("professional".into()));
    check_enum(&mut gate, &obj, "$", "tone", &["professional", "warm", "direct"]);

    check_string(&mut gate, &obj, "$", "body");
    if let Some(body) = obj.get("body").and_then(Value::as_str) {
        let paragraphs = body
            .trim()
            .split("\n\n")
            .filter(|p| !p.trim().is_empty())
            .count();
        if paragraphs != 3 {
            gate.record(
                "$.body",
                format!("expected exactly 3 blank-line-separated paragraphs, got {paragraphs}"),
            );
        }
    }

    match obj.get("word_count").and_then(Value::as_u64) {
        Some(_) => {}
        None => gate.record("$.word_count", "expected non-negative integer"),
    }

    gate.finish(obj)
}

/// Guard findings contract. Defaults: issue and confirmation lists.
/// The verdict is validated here but re-derived mechanically by the guard
/// agent — the model's stated verdict is never the final word.
pub fn validate_guard_findings(
    agent: &'static str,
    raw: Value,
) -> Result<GuardReport, SchemaViolation> {
    let mut obj = require_object(agent, raw)?;
    let mut gate = Gate::new(agent);

    default_array(&mut obj, "issues");
    default_array(&mut obj, "requires_confirmation");

    check_enum(&mut gate, &obj, "$", "verdict", &["PASS", "FAIL"]);
    check_string_array(&mut gate, &obj, "$", "requires_confirmation");

    match obj.get("confidence").and_then(Value::as_f64) {
        Some(c) if (0.0..=1.0).contains(&c) => {}
        other => gate.record(
            "$.confidence",
            format!("expected number in [0.0, 1.0], got {other:?}"),
        ),
    }

    if let Some(Value::Array(issues)) = obj.get("issues") {
        for (i, issue) in issues.iter().enumerate() {
            if gate.is_full() {
                break;
            }
            let path = format!("$.issues[{i}]");
            match issue {
                Value::Object(map) => {
                    check_enum(
                        &mut gate,
                        map,
                        &path,
                        "type",
                        &["fabrication", "inconsistency", "exaggeration"],
                    );
                    check_enum(&mut gate, map, &path, "severity", &["high", "medium", "low"]);
                    check_string(&mut gate, map, &path, "field");
                    check_opt_string(&mut gate, map, &path, "original_value");
                    check_opt_string(&mut gate, map, &path, "fabricated_value");
                }
                other => gate.record(path, format!("expected object, got {}", type_name(other))),
            }
        }
    }

    gate.finish(obj)
}
