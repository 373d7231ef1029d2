//! Ranking and tailoring selection — pure, deterministic, no model calls.

use crate::models::matching::MatchResult;
use crate::models::run::RankedJob;

/// A job must score at least this to enter the tailoring stage.
pub const MIN_TAILOR_SCORE: u8 = 55;
/// ...and cover at least this share of the must-have skills.
pub const MIN_MUST_HAVE_COVERAGE: u8 = 60;

/// Sorts descending by score. The sort is stable and the input arrives in
/// caller order, so ties keep their original input order.
pub fn rank_jobs(mut jobs: Vec<RankedJob>) -> Vec<RankedJob> {
    jobs.sort_by(|a, b| b.match_result.score.cmp(&a.match_result.score));
    jobs
}

/// Quality gate between scoring and the expensive tailoring chain.
pub fn eligible_for_tailoring(result: &MatchResult) -> bool {
    result.score >= MIN_TAILOR_SCORE && result.must_have_coverage_pct >= MIN_MUST_HAVE_COVERAGE
}
