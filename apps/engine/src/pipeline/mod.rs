//! Pipeline driver — the per-request state machine.
//!
//! Flow: parse resume (or cache) → [per job: parse → score] → rank →
//! [for jobs clearing thresholds, up to the cap: tailor → cover letter →
//! guard] → assemble.
//!
//! The driver exclusively owns the run's `RunState` and `BudgetTracker`.
//! Agent failures isolate to their job and become notes; running out of
//! budget downgrades the run to `partial`; only malformed input, denied
//! quota, and resume-parse failures abort the call.

pub mod select;

#[cfg(test)]
mod tests;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};
use uuid::Uuid;

use crate::agents::{cover_letter, guard, job_parser, match_scorer, resume_parser, resume_tailor};
use crate::agents::StageError;
use crate::budget::BudgetTracker;
use crate::cache::{content_key, CacheStore};
use crate::config::EngineConfig;
use crate::errors::EngineError;
use crate::llm_client::ProviderClient;
use crate::models::job::JobRecord;
use crate::models::matching::MatchResult;
use crate::models::resume::ResumeRecord;
use crate::models::run::{
    BudgetReport, JobPosting, OrchestratorInput, RankedJob, RunState, RunStatus, RunType,
    TailoredOutput,
};
use crate::models::tailoring::{CoverLetterPack, GuardReport, GuardVerdict, TailoredResume};
use crate::persistence::RunStore;
use crate::quota::{QuotaDecision, QuotaStore};

/// The orchestration engine. All collaborators are injected; nothing here
/// reaches for process-global state.
pub struct Orchestrator {
    provider: Arc<dyn ProviderClient>,
    cache: Arc<dyn CacheStore>,
    quota: Arc<dyn QuotaStore>,
    runs: Arc<dyn RunStore>,
    config: EngineConfig,
}

/// Per-job worker result, keyed back to input order.
type JobOutcome = (usize, JobPosting, Result<(JobRecord, MatchResult), StageError>);

impl Orchestrator {
    pub fn new(
        provider: Arc<dyn ProviderClient>,
        cache: Arc<dyn CacheStore>,
        quota: Arc<dyn QuotaStore>,
        runs: Arc<dyn RunStore>,
        config: EngineConfig,
    ) -> Self {
        Self {
            provider,
            cache,
            quota,
            runs,
            config,
        }
    }

    /// Runs one request through the pipeline. The returned `RunState` is
    /// final — the driver never mutates it after this returns.
    pub async fn run(&self, input: OrchestratorInput) -> Result<RunState, EngineError> {
        validate_input(&input)?;

        match self.quota.check(&input.user_id).await {
            Ok(QuotaDecision::Allowed) => {}
            Ok(QuotaDecision::Denied { reason }) => return Err(EngineError::Quota(reason)),
            // Quota backend trouble fails open by policy.
            Err(e) => warn!(error = %e, "quota backend unavailable; allowing the run"),
        }

        let limits = input.limits.unwrap_or_default();
        let budget = Arc::new(BudgetTracker::new(
            limits
                .token_budget_total
                .unwrap_or(self.config.token_budget_default),
        ));
        let max_tailored_jobs = limits
            .max_tailored_jobs
            .unwrap_or(self.config.max_tailored_jobs);

        let run_id = Uuid::new_v4().to_string();
        let resume_hash = content_key("resume", &[&input.resume_text]);
        if let Err(e) = self
            .runs
            .create_run(
                &input.user_id,
                &run_id,
                input.run_type,
                &resume_hash,
                budget.total(),
            )
            .await
        {
            warn!(error = %e, %run_id, "run store create_run failed; continuing");
        }

        info!(%run_id, run_type = input.run_type.as_str(), jobs = input.jobs.len(), "run started");

        let mut notes: Vec<String> = Vec::new();
        let mut stopped_reason: Option<String> = None;
        let mut degraded = false;
        let mut guard_failed = false;

        // PARSE_RESUME — caller-supplied record, then cache, then the agent.
        let mut resume: Option<ResumeRecord> = None;
        if let Some(supplied) = input.cached.as_ref().and_then(|c| c.resume_json.clone()) {
            notes.push("resume parse skipped: caller supplied a parsed resume".to_string());
            resume = Some(supplied);
        }

        let resume_cache_key = content_key("resume_parse", &[&input.resume_text]);
        if resume.is_none() {
            if let Some(hit) = self.cache.get(&resume_cache_key).await {
                match serde_json::from_value::<ResumeRecord>(hit) {
                    Ok(record) => {
                        notes.push("resume parse served from cache; 0 tokens consumed".to_string());
                        resume = Some(record);
                    }
                    Err(e) => warn!(error = %e, "discarding undecodable cache entry"),
                }
            }
        }

        if resume.is_none() {
            match resume_parser::parse_resume(
                self.provider.as_ref(),
                &budget,
                &input.resume_text,
            )
            .await
            {
                Ok(outcome) => {
                    match serde_json::to_value(&outcome.value) {
                        Ok(value) => {
                            self.cache
                                .put(
                                    resume_cache_key,
                                    value,
                                    Duration::seconds(self.config.cache_ttl_secs),
                                )
                                .await
                        }
                        Err(e) => warn!(error = %e, "resume not cached"),
                    }
                    resume = Some(outcome.value);
                }
                Err(err) if err.is_budget() => {
                    stopped_reason =
                        Some("token budget exhausted before resume parsing".to_string());
                    notes.push("resume not parsed: token budget too small".to_string());
                }
                // Everything downstream needs the parsed resume, so this
                // failure is fatal to the whole run.
                Err(err) => return Err(fatal(err)),
            }
        }

        // PARSE_AND_SCORE_JOBS → RANK
        let mut ranked_jobs: Vec<RankedJob> = Vec::new();
        if input.run_type != RunType::ResumeReview && stopped_reason.is_none() {
            if let Some(record) = resume.clone() {
                let outcomes = self
                    .parse_and_score_jobs(
                        &input.jobs,
                        Arc::new(record),
                        input.candidate_profile.clone(),
                        Arc::clone(&budget),
                    )
                    .await;

                for (index, posting, result) in outcomes {
                    let label = job_label(&posting, index);
                    match result {
                        Ok((job, match_result)) => ranked_jobs.push(RankedJob {
                            job_id: posting.job_id,
                            source: posting.source,
                            input_index: index,
                            job,
                            match_result,
                        }),
                        Err(err) if err.is_budget() => {
                            if stopped_reason.is_none() {
                                stopped_reason = Some(format!(
                                    "token budget exhausted while scoring job {label}"
                                ));
                            }
                            notes.push(format!("job {label} skipped: token budget exhausted"));
                        }
                        Err(err) => {
                            degraded = true;
                            notes.push(format!("job {label} dropped: {err}"));
                        }
                    }
                }
                ranked_jobs = select::rank_jobs(ranked_jobs);
            }
        }

        // SELECT_FOR_TAILORING → TAILOR_LOOP
        let mut tailored_outputs: Vec<TailoredOutput> = Vec::new();
        if input.run_type == RunType::ApplyPack && stopped_reason.is_none() {
            if let Some(record) = resume.as_ref() {
                let eligible: Vec<&RankedJob> = ranked_jobs
                    .iter()
                    .filter(|j| select::eligible_for_tailoring(&j.match_result))
                    .collect();

                if eligible.len() > max_tailored_jobs {
                    let skipped = eligible.len() - max_tailored_jobs;
                    degraded = true;
                    notes.push(format!(
                        "{skipped} eligible job(s) beyond the tailoring cap of {max_tailored_jobs} skipped for cost"
                    ));
                }

                for ranked in eligible.into_iter().take(max_tailored_jobs) {
                    let label = ranked
                        .job_id
                        .clone()
                        .unwrap_or_else(|| format!("#{}", ranked.input_index + 1));
                    match self.tailor_chain(record, ranked, &budget).await {
                        Ok((tailored_resume, cover_letter_pack, guard_report)) => {
                            if !cover_letter::word_count_plausible(&cover_letter_pack) {
                                let counted = cover_letter::count_words(&cover_letter_pack.body);
                                warn!(
                                    reported = cover_letter_pack.word_count,
                                    counted, "cover letter word count off tolerance"
                                );
                                notes.push(format!(
                                    "cover letter for job {label}: reported word count {} but body has {counted} words",
                                    cover_letter_pack.word_count
                                ));
                            }
                            if guard_report.verdict == GuardVerdict::Fail {
                                guard_failed = true;
                                notes.push(format!(
                                    "truth check FAILED for job {label}: output returned for explicit review, do not send as-is"
                                ));
                            }
                            tailored_outputs.push(TailoredOutput {
                                job_id: ranked.job_id.clone(),
                                input_index: ranked.input_index,
                                tailored_resume,
                                cover_letter_pack,
                                guard_report,
                            });
                        }
                        Err(err) if err.is_budget() => {
                            stopped_reason = Some(format!(
                                "token budget exhausted while tailoring job {label}"
                            ));
                            notes.push(format!(
                                "tailoring for job {label} and later jobs skipped: token budget exhausted"
                            ));
                            break;
                        }
                        Err(err) => {
                            degraded = true;
                            notes.push(format!("tailoring for job {label} abandoned: {err}"));
                        }
                    }
                }
            }
        }

        // ASSEMBLE
        let status = if guard_failed {
            RunStatus::Blocked
        } else if stopped_reason.is_some() || degraded {
            RunStatus::Partial
        } else {
            RunStatus::Ok
        };

        let state = RunState {
            run_id,
            run_type: input.run_type,
            status,
            budget: BudgetReport {
                token_used_estimate: budget.used(),
                token_budget_total: budget.total(),
                stopped_reason,
            },
            resume_json: resume,
            ranked_jobs,
            tailored_outputs,
            notes_for_ui: notes,
        };

        if let Err(e) = self.runs.complete_run(&state.run_id, &state).await {
            warn!(error = %e, run_id = %state.run_id, "run store complete_run failed; continuing");
        }
        info!(
            run_id = %state.run_id,
            status = ?state.status,
            tokens = state.budget.token_used_estimate,
            "run finished"
        );

        Ok(state)
    }

    /// Fans jobs out to bounded concurrent workers. Each worker parses and
    /// scores one job; all of them serialize on the shared budget tracker.
    /// The first budget refusal raises a stop flag so queued workers bail
    /// out instead of racing for the remaining tokens.
    async fn parse_and_score_jobs(
        &self,
        jobs: &[JobPosting],
        resume: Arc<ResumeRecord>,
        candidate_profile: Option<String>,
        budget: Arc<BudgetTracker>,
    ) -> Vec<JobOutcome> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_jobs.max(1)));
        let stop = Arc::new(AtomicBool::new(false));
        let profile = Arc::new(candidate_profile);
        let mut workers: JoinSet<JobOutcome> = JoinSet::new();

        for (index, posting) in jobs.iter().cloned().enumerate() {
            let provider = Arc::clone(&self.provider);
            let resume = Arc::clone(&resume);
            let budget = Arc::clone(&budget);
            let semaphore = Arc::clone(&semaphore);
            let stop = Arc::clone(&stop);
            let profile = Arc::clone(&profile);

            workers.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("semaphore is never closed");
                if stop.load(Ordering::SeqCst) {
                    return (index, posting, Err(StageError::Budget { agent: job_parser::AGENT }));
                }

                let job = match job_parser::parse_job(provider.as_ref(), &budget, &posting.raw_text)
                    .await
                {
                    Ok(outcome) => outcome.value,
                    Err(err) => {
                        if err.is_budget() {
                            stop.store(true, Ordering::SeqCst);
                        }
                        return (index, posting, Err(err));
                    }
                };

                if stop.load(Ordering::SeqCst) {
                    return (index, posting, Err(StageError::Budget { agent: match_scorer::AGENT }));
                }

                let hints = (*profile).as_deref();
                match match_scorer::score_match(provider.as_ref(), &budget, &resume, &job, hints)
                    .await
                {
                    Ok(outcome) => (index, posting, Ok((job, outcome.value))),
                    Err(err) => {
                        if err.is_budget() {
                            stop.store(true, Ordering::SeqCst);
                        }
                        (index, posting, Err(err))
                    }
                }
            });
        }

        let mut outcomes: Vec<JobOutcome> = Vec::with_capacity(jobs.len());
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => warn!(error = %e, "job worker aborted"),
            }
        }
        // Workers finish in arbitrary order; notes and ranking tie-breaks
        // depend on input order.
        outcomes.sort_by_key(|(index, _, _)| *index);
        outcomes
    }

    /// One job's tailoring chain. Strictly sequential: each stage consumes
    /// the previous stage's validated output.
    async fn tailor_chain(
        &self,
        resume: &ResumeRecord,
        ranked: &RankedJob,
        budget: &BudgetTracker,
    ) -> Result<(TailoredResume, CoverLetterPack, GuardReport), StageError> {
        let tailored = resume_tailor::tailor_resume(self.provider.as_ref(), budget, resume, &ranked.job)
            .await?
            .value;
        let letter = cover_letter::write_cover_letter(
            self.provider.as_ref(),
            budget,
            resume,
            &ranked.job,
            &tailored,
        )
        .await?
        .value;
        let report = guard::audit(self.provider.as_ref(), budget, resume, &tailored, &letter)
            .await?
            .value;
        Ok((tailored, letter, report))
    }
}

fn validate_input(input: &OrchestratorInput) -> Result<(), EngineError> {
    if input.user_id.trim().is_empty() {
        return Err(EngineError::validation("user_id", "must not be empty"));
    }
    if input.resume_text.trim().is_empty() {
        return Err(EngineError::validation("resume_text", "must not be empty"));
    }
    for (i, job) in input.jobs.iter().enumerate() {
        if job.raw_text.trim().is_empty() {
            return Err(EngineError::validation(
                "jobs",
                format!("jobs[{i}].raw_text must not be empty"),
            ));
        }
    }
    if let Some(limits) = &input.limits {
        if limits.token_budget_total == Some(0) {
            return Err(EngineError::validation(
                "limits",
                "token_budget_total must be positive",
            ));
        }
    }
    Ok(())
}

/// Resume-parse failures abort the run; everything else got isolated
/// before reaching here.
fn fatal(err: StageError) -> EngineError {
    match err {
        StageError::Schema(violation) => EngineError::Schema(violation),
        StageError::Provider { source, .. } => EngineError::Provider(source),
        StageError::Internal { source, .. } => EngineError::Internal(source),
        StageError::Budget { agent } => {
            EngineError::Internal(anyhow::anyhow!("unhandled budget stop in {agent}"))
        }
    }
}

fn job_label(posting: &JobPosting, index: usize) -> String {
    posting
        .job_id
        .clone()
        .unwrap_or_else(|| format!("#{}", index + 1))
}
