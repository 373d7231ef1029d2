//! End-to-end pipeline tests over a scripted provider. The provider routes
//! on each agent's system contract and on markers in the user prompt, so a
//! whole run executes without a network.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::agents::cover_letter::count_words;
use crate::cache::InMemoryCache;
use crate::config::EngineConfig;
use crate::errors::EngineError;
use crate::llm_client::{Completion, ModelTier, ProviderClient, ProviderError, TokenUsage};
use crate::models::matching::Recommendation;
use crate::models::run::{
    CachedInputs, JobPosting, OrchestratorInput, RunLimits, RunState, RunStatus, RunType,
};
use crate::models::tailoring::GuardVerdict;
use crate::persistence::{NoopRunStore, RunStore};
use crate::pipeline::Orchestrator;
use crate::quota::{QuotaDecision, QuotaStore, UnlimitedQuota};

/// Every scripted completion reports this usage: 150 tokens per stage.
const STAGE_USAGE: TokenUsage = TokenUsage {
    input_tokens: 100,
    output_tokens: 50,
};

struct ScriptedProvider {
    resume: Value,
    /// (marker expected in the user prompt, job payload)
    jobs: Vec<(&'static str, Value)>,
    /// (marker expected in the user prompt, assessment payload)
    assessments: Vec<(&'static str, Value)>,
    tailor: Value,
    cover: Value,
    guard: Value,
    /// Simulated provider outage for prompts containing this marker.
    fail_when_contains: Option<&'static str>,
    resume_calls: AtomicU32,
}

impl ScriptedProvider {
    fn new() -> Self {
        Self {
            resume: resume_payload(),
            jobs: vec![
                ("PayFlow", strong_job_payload()),
                ("PayBridge", second_job_payload()),
                ("DeepLab", weak_job_payload()),
            ],
            assessments: vec![
                ("PayFlow", strong_assessment_payload()),
                ("PayBridge", second_assessment_payload()),
                ("DeepLab", weak_assessment_payload()),
            ],
            tailor: tailor_payload(),
            cover: cover_payload(),
            guard: guard_pass_payload(),
            fail_when_contains: None,
            resume_calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl ProviderClient for ScriptedProvider {
    async fn complete(
        &self,
        _tier: ModelTier,
        _max_tokens: u32,
        system: &str,
        user: &str,
    ) -> Result<Completion, ProviderError> {
        if let Some(marker) = self.fail_when_contains {
            if user.contains(marker) {
                return Err(ProviderError::Api {
                    status: 500,
                    message: "scripted outage".to_string(),
                });
            }
        }

        let payload = if system.contains("resume parser") {
            self.resume_calls.fetch_add(1, Ordering::SeqCst);
            self.resume.clone()
        } else if system.contains("job posting analyst") {
            self.jobs
                .iter()
                .find(|(marker, _)| user.contains(marker))
                .map(|(_, v)| v.clone())
                .unwrap_or_else(|| json!({"title": "Unknown role"}))
        } else if system.contains("job-match assessor") {
            self.assessments
                .iter()
                .find(|(marker, _)| user.contains(marker))
                .map(|(_, v)| v.clone())
                .unwrap_or_else(|| json!({}))
        } else if system.contains("resume editor") {
            self.tailor.clone()
        } else if system.contains("cover letter writer") {
            self.cover.clone()
        } else {
            self.guard.clone()
        };

        Ok(Completion {
            text: payload.to_string(),
            usage: Some(STAGE_USAGE),
        })
    }
}

fn resume_payload() -> Value {
    json!({
        "name": "Jane Doe",
        "location": "Amsterdam, Netherlands",
        "years_of_experience": 7,
        "skills": ["TypeScript", "Node.js", "Postgres", "REST", "payments"],
        "experience": [
            {
                "company": "PayCo",
                "title": "Senior Backend Engineer",
                "metrics": ["cut chargebacks 12%"],
                "technologies": ["Node.js", "Postgres"]
            },
            {"company": "ShopCo", "title": "Backend Engineer"},
            {"company": "DevShop", "title": "Engineer"}
        ],
        "education": [{"institution": "TU Delft", "degree": "BSc"}],
        "work_authorization": "EU citizen"
    })
}

fn strong_job_payload() -> Value {
    json!({
        "title": "Senior Backend Engineer",
        "company": "PayFlow",
        "location": "Amsterdam, Netherlands",
        "seniority": "senior",
        "must_have_skills": ["TypeScript", "Node.js", "Postgres", "REST", "payments"],
        "nice_to_have_skills": []
    })
}

fn second_job_payload() -> Value {
    json!({
        "title": "Backend Engineer",
        "company": "PayBridge",
        "must_have_skills": ["TypeScript", "Node.js", "Postgres", "REST", "Kafka"],
        "nice_to_have_skills": []
    })
}

fn weak_job_payload() -> Value {
    json!({
        "title": "Research Scientist",
        "company": "DeepLab",
        "must_have_skills": ["PhD in ML", "PyTorch"],
        "nice_to_have_skills": ["Publications"]
    })
}

/// All five must-haves matched, seniority match, location and work auth
/// fine: score 91 under the rubric.
fn strong_assessment_payload() -> Value {
    json!({
        "matched_must_haves": ["TypeScript", "Node.js", "Postgres", "REST", "payments"],
        "missing_must_haves": [],
        "matched_nice_to_haves": [],
        "missing_nice_to_haves": [],
        "location_match": true,
        "work_auth_ok": true,
        "visa_ok": false,
        "seniority_match": "match",
        "other_score": 50,
        "explanation": "Direct payments background."
    })
}

/// Four of five must-haves: score 84, still clears both tailoring gates.
fn second_assessment_payload() -> Value {
    json!({
        "matched_must_haves": ["TypeScript", "Node.js", "Postgres", "REST"],
        "missing_must_haves": ["Kafka"],
        "matched_nice_to_haves": [],
        "missing_nice_to_haves": [],
        "location_match": true,
        "work_auth_ok": true,
        "visa_ok": false,
        "seniority_match": "match",
        "other_score": 50,
        "explanation": "Strong overlap, missing Kafka."
    })
}

/// Nothing matches and the role is above/below the candidate: score 23.
fn weak_assessment_payload() -> Value {
    json!({
        "matched_must_haves": [],
        "missing_must_haves": ["PhD in ML", "PyTorch"],
        "matched_nice_to_haves": [],
        "missing_nice_to_haves": ["Publications"],
        "location_match": false,
        "work_auth_ok": false,
        "visa_ok": false,
        "seniority_match": "under",
        "other_score": 0,
        "explanation": "Research role with no overlap."
    })
}

fn tailor_payload() -> Value {
    json!({
        "summary": "Senior backend engineer with payments platform experience",
        "skills": ["TypeScript", "Node.js", "Postgres"],
        "experience": [{
            "company": "PayCo",
            "title": "Senior Backend Engineer",
            "period": "2019 - present",
            "bullets": ["Cut chargebacks 12% on the payments platform, improving margin [X%]"]
        }],
        "ats_keywords": ["payments", "Node.js", "Postgres"],
        "warnings": [],
        "change_log": ["summary: rewritten toward payments platform work"]
    })
}

fn cover_payload() -> Value {
    json!({
        "subject_line": "Application for Senior Backend Engineer",
        "salutation": "Dear Hiring Team,",
        "body": "I am writing to apply for the senior backend engineer role at PayFlow.\n\nAt PayCo I built payment systems in TypeScript and Node.js on Postgres, cutting chargebacks twelve percent.\n\nI would welcome the chance to bring that experience to your team.",
        "closing": "Kind regards,\nJane Doe",
        "tone": "professional",
        "word_count": 45
    })
}

fn guard_pass_payload() -> Value {
    json!({
        "verdict": "PASS",
        "issues": [],
        "requires_confirmation": ["[X%] in experience[0].bullets[0]"],
        "confidence": 0.9
    })
}

fn guard_fail_payload() -> Value {
    json!({
        "verdict": "PASS",
        "issues": [{
            "type": "fabrication",
            "field": "experience[0].bullets[0]",
            "original_value": null,
            "fabricated_value": "Scaled the team to 40 engineers",
            "severity": "high"
        }],
        "requires_confirmation": [],
        "confidence": 0.95
    })
}

fn orchestrator(provider: ScriptedProvider) -> Orchestrator {
    Orchestrator::new(
        Arc::new(provider),
        Arc::new(InMemoryCache::new()),
        Arc::new(UnlimitedQuota),
        Arc::new(NoopRunStore),
        EngineConfig::default(),
    )
}

fn posting(job_id: &str, raw_text: &str) -> JobPosting {
    JobPosting {
        job_id: Some(job_id.to_string()),
        source: None,
        raw_text: raw_text.to_string(),
    }
}

fn input(run_type: RunType, jobs: Vec<JobPosting>) -> OrchestratorInput {
    OrchestratorInput {
        run_type,
        user_id: "user-1".to_string(),
        resume_text: "x".repeat(100),
        candidate_profile: None,
        jobs,
        limits: None,
        cached: None,
    }
}

fn strong_posting() -> JobPosting {
    posting("strong-1", "PayFlow is hiring a senior backend engineer for payments.")
}

fn second_posting() -> JobPosting {
    posting("second-1", "PayBridge needs a backend engineer for its ledger team.")
}

fn weak_posting() -> JobPosting {
    posting("weak-1", "DeepLab seeks a research scientist, PhD required.")
}

#[tokio::test]
async fn test_resume_review_returns_parsed_resume_only() {
    let orch = orchestrator(ScriptedProvider::new());
    let state = orch.run(input(RunType::ResumeReview, vec![])).await.unwrap();

    assert_eq!(state.status, RunStatus::Ok);
    assert!(state.resume_json.is_some());
    assert!(state.ranked_jobs.is_empty());
    assert!(state.tailored_outputs.is_empty());
    assert_eq!(state.budget.token_used_estimate, 150);
    assert!(state.budget.stopped_reason.is_none());
}

#[tokio::test]
async fn test_second_identical_review_hits_the_cache() {
    let provider = Arc::new(ScriptedProvider::new());
    let orch = Orchestrator::new(
        provider.clone(),
        Arc::new(InMemoryCache::new()),
        Arc::new(UnlimitedQuota),
        Arc::new(NoopRunStore),
        EngineConfig::default(),
    );

    let first = orch.run(input(RunType::ResumeReview, vec![])).await.unwrap();
    assert_eq!(first.budget.token_used_estimate, 150);

    let second = orch.run(input(RunType::ResumeReview, vec![])).await.unwrap();
    assert_eq!(second.budget.token_used_estimate, 0);
    assert!(second.notes_for_ui.iter().any(|n| n.contains("cache")));
    assert_eq!(second.resume_json, first.resume_json);
    assert_eq!(provider.resume_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_caller_supplied_resume_skips_parsing() {
    let provider = Arc::new(ScriptedProvider::new());
    let orch = Orchestrator::new(
        provider.clone(),
        Arc::new(InMemoryCache::new()),
        Arc::new(UnlimitedQuota),
        Arc::new(NoopRunStore),
        EngineConfig::default(),
    );

    let resume = serde_json::from_value(resume_payload()).unwrap();
    let mut request = input(RunType::ResumeReview, vec![]);
    request.cached = Some(CachedInputs {
        resume_json: Some(resume),
    });

    let state = orch.run(request).await.unwrap();
    assert_eq!(state.budget.token_used_estimate, 0);
    assert_eq!(provider.resume_calls.load(Ordering::SeqCst), 0);
    assert!(state
        .notes_for_ui
        .iter()
        .any(|n| n.contains("caller supplied")));
}

#[tokio::test]
async fn test_job_match_ranks_strong_fit_first() {
    let orch = orchestrator(ScriptedProvider::new());
    let state = orch
        .run(input(RunType::JobMatch, vec![weak_posting(), strong_posting()]))
        .await
        .unwrap();

    assert_eq!(state.status, RunStatus::Ok);
    assert_eq!(state.ranked_jobs.len(), 2);

    let first = &state.ranked_jobs[0];
    assert_eq!(first.job_id.as_deref(), Some("strong-1"));
    assert!(first.match_result.score >= 70);
    assert_eq!(first.match_result.recommendation, Recommendation::Apply);

    let second = &state.ranked_jobs[1];
    assert_eq!(second.job_id.as_deref(), Some("weak-1"));
    assert_ne!(second.match_result.recommendation, Recommendation::Apply);
    assert!(state.tailored_outputs.is_empty());
}

#[tokio::test]
async fn test_apply_pack_produces_one_guarded_output() {
    let orch = orchestrator(ScriptedProvider::new());
    let mut request = input(RunType::ApplyPack, vec![strong_posting()]);
    request.limits = Some(RunLimits {
        max_tailored_jobs: Some(1),
        token_budget_total: None,
    });

    let state = orch.run(request).await.unwrap();
    assert_eq!(state.status, RunStatus::Ok);
    assert_eq!(state.tailored_outputs.len(), 1);

    let output = &state.tailored_outputs[0];
    assert_eq!(output.job_id.as_deref(), Some("strong-1"));
    assert_eq!(output.guard_report.verdict, GuardVerdict::Pass);
    assert!(!output.guard_report.requires_confirmation.is_empty());

    let counted = count_words(&output.cover_letter_pack.body);
    assert!(counted.abs_diff(output.cover_letter_pack.word_count) <= 30);
}

#[tokio::test]
async fn test_budget_below_any_stage_yields_partial() {
    let orch = orchestrator(ScriptedProvider::new());
    let mut request = input(RunType::ApplyPack, vec![strong_posting()]);
    request.limits = Some(RunLimits {
        max_tailored_jobs: None,
        token_budget_total: Some(100),
    });

    let state = orch.run(request).await.unwrap();
    assert_eq!(state.status, RunStatus::Partial);
    assert!(state.budget.stopped_reason.is_some());
    assert!(state.resume_json.is_none());
    assert!(state.ranked_jobs.is_empty());
    assert!(state.tailored_outputs.is_empty());
}

#[tokio::test]
async fn test_low_scoring_job_is_never_tailored() {
    let orch = orchestrator(ScriptedProvider::new());
    let state = orch
        .run(input(RunType::ApplyPack, vec![weak_posting()]))
        .await
        .unwrap();

    assert_eq!(state.status, RunStatus::Ok);
    assert_eq!(state.ranked_jobs.len(), 1);
    assert!(state.ranked_jobs[0].match_result.score < 55);
    assert!(state.tailored_outputs.is_empty());
}

#[tokio::test]
async fn test_provider_failure_isolates_to_one_job() {
    let mut provider = ScriptedProvider::new();
    provider.fail_when_contains = Some("DeepLab");

    let orch = orchestrator(provider);
    let state = orch
        .run(input(RunType::JobMatch, vec![strong_posting(), weak_posting()]))
        .await
        .unwrap();

    assert_eq!(state.status, RunStatus::Partial);
    assert_eq!(state.ranked_jobs.len(), 1);
    assert_eq!(state.ranked_jobs[0].job_id.as_deref(), Some("strong-1"));
    assert!(state
        .notes_for_ui
        .iter()
        .any(|n| n.contains("weak-1") && n.contains("dropped")));
}

#[tokio::test]
async fn test_resume_parse_provider_failure_is_fatal() {
    let mut provider = ScriptedProvider::new();
    // The resume parse prompt embeds the resume text.
    provider.fail_when_contains = Some("xxxx");

    let orch = orchestrator(provider);
    let err = orch.run(input(RunType::ResumeReview, vec![])).await.unwrap_err();
    assert!(matches!(err, EngineError::Provider(_)));
}

#[tokio::test]
async fn test_guard_fail_blocks_but_returns_output() {
    let mut provider = ScriptedProvider::new();
    provider.guard = guard_fail_payload();

    let orch = orchestrator(provider);
    let state = orch
        .run(input(RunType::ApplyPack, vec![strong_posting()]))
        .await
        .unwrap();

    assert_eq!(state.status, RunStatus::Blocked);
    assert_eq!(state.tailored_outputs.len(), 1);
    // The model said PASS; the derived verdict from its own high-severity
    // issue wins.
    assert_eq!(state.tailored_outputs[0].guard_report.verdict, GuardVerdict::Fail);
    assert!(state.notes_for_ui.iter().any(|n| n.contains("FAILED")));
}

#[tokio::test]
async fn test_eligible_jobs_beyond_cap_are_skipped_with_note() {
    let orch = orchestrator(ScriptedProvider::new());
    let mut request = input(
        RunType::ApplyPack,
        vec![strong_posting(), second_posting()],
    );
    request.limits = Some(RunLimits {
        max_tailored_jobs: Some(1),
        token_budget_total: None,
    });

    let state = orch.run(request).await.unwrap();
    assert_eq!(state.status, RunStatus::Partial);
    assert_eq!(state.tailored_outputs.len(), 1);
    // Ranked order: the 91-scoring job wins the single slot.
    assert_eq!(state.tailored_outputs[0].job_id.as_deref(), Some("strong-1"));
    assert!(state.notes_for_ui.iter().any(|n| n.contains("cap")));
}

struct DenyingQuota;

#[async_trait]
impl QuotaStore for DenyingQuota {
    async fn check(&self, _user_id: &str) -> anyhow::Result<QuotaDecision> {
        Ok(QuotaDecision::Denied {
            reason: "daily run limit reached".to_string(),
        })
    }
}

struct BrokenQuota;

#[async_trait]
impl QuotaStore for BrokenQuota {
    async fn check(&self, _user_id: &str) -> anyhow::Result<QuotaDecision> {
        Err(anyhow::anyhow!("quota backend unreachable"))
    }
}

#[tokio::test]
async fn test_denied_quota_rejects_the_run() {
    let orch = Orchestrator::new(
        Arc::new(ScriptedProvider::new()),
        Arc::new(InMemoryCache::new()),
        Arc::new(DenyingQuota),
        Arc::new(NoopRunStore),
        EngineConfig::default(),
    );
    let err = orch.run(input(RunType::ResumeReview, vec![])).await.unwrap_err();
    assert!(matches!(err, EngineError::Quota(_)));
}

#[tokio::test]
async fn test_broken_quota_fails_open() {
    let orch = Orchestrator::new(
        Arc::new(ScriptedProvider::new()),
        Arc::new(InMemoryCache::new()),
        Arc::new(BrokenQuota),
        Arc::new(NoopRunStore),
        EngineConfig::default(),
    );
    let state = orch.run(input(RunType::ResumeReview, vec![])).await.unwrap();
    assert_eq!(state.status, RunStatus::Ok);
}

#[derive(Default)]
struct RecordingStore {
    events: Mutex<Vec<String>>,
}

#[async_trait]
impl RunStore for RecordingStore {
    async fn create_run(
        &self,
        _user_id: &str,
        run_id: &str,
        _run_type: RunType,
        _resume_hash: &str,
        _token_budget_total: u32,
    ) -> anyhow::Result<()> {
        self.events
            .lock()
            .unwrap()
            .push(format!("create:{run_id}"));
        Ok(())
    }

    async fn complete_run(&self, run_id: &str, _state: &RunState) -> anyhow::Result<()> {
        self.events
            .lock()
            .unwrap()
            .push(format!("complete:{run_id}"));
        Ok(())
    }
}

struct FailingStore;

#[async_trait]
impl RunStore for FailingStore {
    async fn create_run(
        &self,
        _user_id: &str,
        _run_id: &str,
        _run_type: RunType,
        _resume_hash: &str,
        _token_budget_total: u32,
    ) -> anyhow::Result<()> {
        Err(anyhow::anyhow!("database unavailable"))
    }

    async fn complete_run(&self, _run_id: &str, _state: &RunState) -> anyhow::Result<()> {
        Err(anyhow::anyhow!("database unavailable"))
    }
}

#[tokio::test]
async fn test_run_store_sees_create_then_complete() {
    let store = Arc::new(RecordingStore::default());
    let orch = Orchestrator::new(
        Arc::new(ScriptedProvider::new()),
        Arc::new(InMemoryCache::new()),
        Arc::new(UnlimitedQuota),
        store.clone(),
        EngineConfig::default(),
    );
    let state = orch.run(input(RunType::ResumeReview, vec![])).await.unwrap();

    let events = store.events.lock().unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0], format!("create:{}", state.run_id));
    assert_eq!(events[1], format!("complete:{}", state.run_id));
}

#[tokio::test]
async fn test_failing_run_store_never_fails_the_run() {
    let orch = Orchestrator::new(
        Arc::new(ScriptedProvider::new()),
        Arc::new(InMemoryCache::new()),
        Arc::new(UnlimitedQuota),
        Arc::new(FailingStore),
        EngineConfig::default(),
    );
    let state = orch.run(input(RunType::ResumeReview, vec![])).await.unwrap();
    assert_eq!(state.status, RunStatus::Ok);
}

#[tokio::test]
async fn test_empty_resume_text_is_rejected_before_any_call() {
    let provider = Arc::new(ScriptedProvider::new());
    let orch = Orchestrator::new(
        provider.clone(),
        Arc::new(InMemoryCache::new()),
        Arc::new(UnlimitedQuota),
        Arc::new(NoopRunStore),
        EngineConfig::default(),
    );

    let mut request = input(RunType::ResumeReview, vec![]);
    request.resume_text = "   ".to_string();
    let err = orch.run(request).await.unwrap_err();
    assert!(matches!(err, EngineError::Validation { field: "resume_text", .. }));
    assert_eq!(provider.resume_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_blank_job_text_is_rejected() {
    let orch = orchestrator(ScriptedProvider::new());
    let request = input(RunType::JobMatch, vec![posting("j1", "  ")]);
    let err = orch.run(request).await.unwrap_err();
    assert!(matches!(err, EngineError::Validation { field: "jobs", .. }));
}
