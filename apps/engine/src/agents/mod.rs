//! Specialist agents — each issues exactly one model completion under a
//! fixed instruction contract, extracts the JSON payload, and passes it
//! through the schema gate. No agent result flows downstream unvalidated.

pub mod cover_letter;
pub mod guard;
pub mod job_parser;
pub mod match_scorer;
pub mod prompts;
pub mod resume_parser;
pub mod resume_tailor;

use serde::Serialize;
use thiserror::Error;

use crate::budget::BudgetTracker;
use crate::errors::SchemaViolation;
use crate::llm_client::{extract_json, ModelTier, ProviderClient, ProviderError};

/// A validated agent result plus what the call cost.
#[derive(Debug, Clone)]
pub struct AgentOutcome<T> {
    pub value: T,
    pub tokens_used: u32,
}

/// Why one pipeline stage did not produce a result. The driver isolates
/// these per job; only resume parsing escalates to a run failure.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("{agent}: token budget exhausted before the call")]
    Budget { agent: &'static str },

    #[error("{agent}: provider failure: {source}")]
    Provider {
        agent: &'static str,
        #[source]
        source: ProviderError,
    },

    #[error(transparent)]
    Schema(#[from] SchemaViolation),

    #[error("{agent}: internal failure: {source}")]
    Internal {
        agent: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl StageError {
    pub fn is_budget(&self) -> bool {
        matches!(self, StageError::Budget { .. })
    }

    pub fn agent(&self) -> &'static str {
        match self {
            StageError::Budget { agent }
            | StageError::Provider { agent, .. }
            | StageError::Internal { agent, .. } => agent,
            StageError::Schema(v) => v.agent,
        }
    }
}

fn chars_to_tokens(chars: usize) -> u32 {
    chars.div_ceil(4) as u32
}

/// Fallback token estimate when the provider reports no usage:
/// `ceil(prompt_chars/4) + ceil(completion_chars/4)`.
pub fn estimate_tokens(prompt_chars: usize, completion: &str) -> u32 {
    chars_to_tokens(prompt_chars) + chars_to_tokens(completion.chars().count())
}

/// Reserves budget, issues the single completion, and reconciles the
/// reservation to the call's actual usage. A refused reservation never
/// starts the call; a provider failure frees the reservation.
pub(crate) async fn issue_call(
    provider: &dyn ProviderClient,
    budget: &BudgetTracker,
    agent: &'static str,
    tier: ModelTier,
    max_tokens: u32,
    system: &str,
    user: &str,
) -> Result<(String, u32), StageError> {
    let prompt_chars = system.chars().count() + user.chars().count();
    let reservation = chars_to_tokens(prompt_chars) + max_tokens;
    if !budget.reserve(reservation) {
        return Err(StageError::Budget { agent });
    }

    let completion = match provider.complete(tier, max_tokens, system, user).await {
        Ok(completion) => completion,
        Err(source) => {
            budget.reconcile(reservation, 0);
            return Err(StageError::Provider { agent, source });
        }
    };

    let actual = completion
        .usage
        .map(|usage| usage.total())
        .unwrap_or_else(|| estimate_tokens(prompt_chars, &completion.text));
    budget.reconcile(reservation, actual);

    Ok((completion.text, actual))
}

/// Normalizes a raw model response into a JSON value, or fails the gate.
pub(crate) fn parse_payload(
    agent: &'static str,
    text: &str,
) -> Result<serde_json::Value, SchemaViolation> {
    serde_json::from_str(extract_json(text)).map_err(|e| SchemaViolation {
        agent,
        path: "$".to_string(),
        message: format!("response is not valid JSON: {e}"),
    })
}

/// Serializes a typed value for prompt embedding.
pub(crate) fn to_prompt_json<T: Serialize>(
    agent: &'static str,
    value: &T,
) -> Result<String, StageError> {
    serde_json::to_string_pretty(value).map_err(|e| StageError::Internal {
        agent,
        source: anyhow::anyhow!("failed to serialize prompt input: {e}"),
    })
}
