use anyhow::{Context, Result};

/// Engine configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub anthropic_api_key: String,
    /// Result-cache entry lifetime in seconds.
    pub cache_ttl_secs: i64,
    /// Default cap on tailoring chains per run; callers may lower it.
    pub max_tailored_jobs: usize,
    /// Token ceiling applied when the caller sets no limit.
    pub token_budget_default: u32,
    /// Bounded worker count for the per-job parse/score fan-out.
    pub max_concurrent_jobs: usize,
    pub rust_log: String,
}

impl EngineConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(EngineConfig {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            cache_ttl_secs: parse_env("CACHE_TTL_SECS", 3_600)?,
            max_tailored_jobs: parse_env("MAX_TAILORED_JOBS", 3)?,
            token_budget_default: parse_env("TOKEN_BUDGET_DEFAULT", 60_000)?,
            max_concurrent_jobs: parse_env("MAX_CONCURRENT_JOBS", 4)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            anthropic_api_key: String::new(),
            cache_ttl_secs: 3_600,
            max_tailored_jobs: 3,
            token_budget_default: 60_000,
            max_concurrent_jobs: 4,
            rust_log: "info".to_string(),
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T: std::str::FromStr>(key: &str, fallback: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' is not a valid value")),
        Err(_) => Ok(fallback),
    }
}
