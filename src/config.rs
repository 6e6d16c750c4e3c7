//! Runtime configuration (§6.5), read from the environment with typed
//! defaults. No config-file crate is warranted: §6.5 names five scalar
//! settings, so `std::env` plus defaults is the idiomatic choice (matching
//! §11's ambient-stack reasoning for keeping the dependency surface
//! proportionate to what it backs).

use std::time::Duration;

/// Process-wide configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// How long an idle Session lives before the sweep removes it.
    pub session_ttl: Duration,
    /// Inline request body cap; above this, clients must use a Session (§4.7).
    pub request_size_limit_bytes: usize,
    /// Soft per-Operation budget; exceeding it flags the op in the report
    /// but does not abort it (§5).
    pub operation_soft_timeout: Duration,
    /// TTL for signed upload/download URLs handed out by `/session`.
    pub signed_url_ttl: Duration,
    /// Object-store bucket identifier. Unset disables session mode.
    pub object_store_bucket: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            session_ttl: Duration::from_secs(env_u64("SESSION_TTL_SECONDS", 1800)),
            request_size_limit_bytes: env_u64("REQUEST_SIZE_LIMIT_BYTES", 26_214_400) as usize,
            operation_soft_timeout: Duration::from_millis(env_u64("OPERATION_SOFT_TIMEOUT_MS", 5000)),
            signed_url_ttl: Duration::from_secs(env_u64("SIGNED_URL_TTL_SECONDS", 900)),
            object_store_bucket: std::env::var("OBJECT_STORE_BUCKET").ok().filter(|s| !s.is_empty()),
        }
    }

    pub fn sessions_enabled(&self) -> bool {
        self.object_store_bucket.is_some()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}
