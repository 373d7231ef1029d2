//! Multi-agent orchestration engine turning a candidate resume and a set
//! of job postings into structured matches, ranked recommendations, and
//! optional tailored application materials.
//!
//! A language model is the computation primitive, wrapped in strict
//! controls: every model output passes a schema gate before anything
//! trusts it, every call reserves against a shared token budget first,
//! quality thresholds gate the expensive tailoring stage, and a
//! truth-consistency guard audits generated content against the source
//! resume. All collaborators (provider, cache, quota, run store) are
//! injected traits, so embedders and tests swap them freely.

pub mod agents;
pub mod budget;
pub mod cache;
pub mod config;
pub mod errors;
pub mod llm_client;
pub mod models;
pub mod persistence;
pub mod pipeline;
pub mod quota;
pub mod schema;
pub mod telemetry;

pub use crate::budget::BudgetTracker;
pub use crate::cache::{content_key, CacheStore, InMemoryCache};
pub use crate::config::EngineConfig;
pub use crate::errors::{EngineError, SchemaViolation};
pub use crate::llm_client::{AnthropicClient, Completion, ModelTier, ProviderClient, ProviderError};
pub use crate::models::run::{OrchestratorInput, RunState, RunStatus, RunType};
pub use crate::persistence::{NoopRunStore, RunStore};
pub use crate::pipeline::Orchestrator;
pub use crate::quota::{QuotaDecision, QuotaStore, UnlimitedQuota};
