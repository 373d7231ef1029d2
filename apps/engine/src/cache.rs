//! Result cache — content-addressed memoization of expensive deterministic
//! sub-results (a parsed resume, chiefly), bounded by TTL.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use tracing::debug;

/// Stable content hash over an operation name and its ordered arguments.
/// Also used as the resume hash handed to the run store.
pub fn content_key(operation: &str, args: &[&str]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(operation.as_bytes());
    for arg in args {
        hasher.update([0u8]);
        hasher.update(arg.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

/// Shared cache abstraction, injected into the orchestrator.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Option<Value>;
    async fn put(&self, key: String, value: Value, ttl: Duration);
}

struct CacheEntry {
    value: Value,
    expires_at: DateTime<Utc>,
}

/// Process-wide in-memory cache with lazy expiry on lookup.
#[derive(Default)]
pub struct InMemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for InMemoryCache {
    async fn get(&self, key: &str) -> Option<Value> {
        let mut entries = self.entries.write().await;
        match entries.get(key) {
            Some(entry) if entry.expires_at > Utc::now() => {
                debug!(key, "cache hit");
                Some(entry.value.clone())
            }
            Some(_) => {
                entries.remove(key);
                debug!(key, "cache entry expired");
                None
            }
            None => None,
        }
    }

    async fn put(&self, key: String, value: Value, ttl: Duration) {
        let mut entries = self.entries.write().await;
        entries.insert(
            key,
            CacheEntry {
                value,
                expires_at: Utc::now() + ttl,
            },
        );
    }
}
