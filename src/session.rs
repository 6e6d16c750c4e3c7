//! The Session Store (C6): opaque tokens backing large-file uploads and
//! downloads via signed URLs, for documents larger than the inline
//! request size limit.
//!
//! Grounded on §5's "process-local map protected by a mutex", with the
//! expire-by-age idiom taken from `GeneralBots-botserver`'s
//! `PRESENTATION_CACHE` (`HashMap` + `retain` by age); that example uses
//! `RwLock`, but this store's mutations are all O(1) map operations on
//! the hot path, so a single `tokio::sync::Mutex` fits §5's "only
//! contended lock... held only during O(1) map operations" more exactly.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::config::Config;

/// A server-side session record (§3). The engine owns no document bytes
/// here; `gcs_in`/`gcs_out` are opaque identifiers the client uploads to
/// and downloads from directly.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub gcs_in: String,
    pub gcs_out: String,
    pub upload_url: String,
    pub download_url: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Set while a `/process`-class request is using this session;
    /// a second concurrent reference fails `S019` (§4.6).
    in_use: bool,
}

/// Error raised when a session cannot be referenced.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session '{0}' not found or expired")]
    NotFound(String),
    #[error("session '{0}' is already in use by another request")]
    InUse(String),
}

impl SessionError {
    pub fn code(&self) -> &'static str {
        match self {
            SessionError::NotFound(_) => "S014",
            SessionError::InUse(_) => "S019",
        }
    }
}

/// The process-local session map (§5). Cheaply cloneable; every clone
/// shares the same underlying map via `Arc`.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<String, Session>>>,
    bucket: Option<String>,
    ttl: chrono::Duration,
    signed_url_ttl_secs: i64,
}

impl SessionStore {
    pub fn new(config: &Config) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            bucket: config.object_store_bucket.clone(),
            ttl: chrono::Duration::from_std(config.session_ttl).unwrap_or(chrono::Duration::seconds(1800)),
            signed_url_ttl_secs: config.signed_url_ttl.as_secs() as i64,
        }
    }

    /// Create a new session, unless session mode is disabled (no bucket
    /// configured). Signed URLs are opaque tokens pointing at the
    /// configured bucket; no actual object-store interaction happens here.
    pub async fn create(&self) -> Option<Session> {
        let bucket = self.bucket.as_ref()?;
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let gcs_in = format!("gs://{bucket}/sessions/{id}/in");
        let gcs_out = format!("gs://{bucket}/sessions/{id}/out");
        let session = Session {
            id: id.clone(),
            upload_url: signed_url(&gcs_in, self.signed_url_ttl_secs),
            download_url: signed_url(&gcs_out, self.signed_url_ttl_secs),
            gcs_in,
            gcs_out,
            created_at: now,
            expires_at: now + self.ttl,
            in_use: false,
        };
        self.sessions.lock().await.insert(id, session.clone());
        Some(session)
    }

    /// Acquire a session for exclusive use during one request. Fails
    /// `S014` if absent/expired, `S019` if already in use.
    pub async fn acquire(&self, id: &str) -> Result<Session, SessionError> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions.get_mut(id).ok_or_else(|| SessionError::NotFound(id.to_string()))?;
        if session.expires_at < Utc::now() {
            sessions.remove(id);
            return Err(SessionError::NotFound(id.to_string()));
        }
        if session.in_use {
            return Err(SessionError::InUse(id.to_string()));
        }
        session.in_use = true;
        Ok(session.clone())
    }

    /// Release a session after the request referencing it completes.
    pub async fn release(&self, id: &str) {
        if let Some(session) = self.sessions.lock().await.get_mut(id) {
            session.in_use = false;
        }
    }

    /// Drop every session past its TTL. Intended to run on a
    /// `tokio::time::interval` background task (§12).
    pub async fn sweep(&self) {
        let now = Utc::now();
        self.sessions.lock().await.retain(|_, session| session.expires_at >= now);
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }
}

fn signed_url(object: &str, ttl_secs: i64) -> String {
    format!("{object}?X-Signed-Expires={ttl_secs}&X-Signed-Token={}", Uuid::new_v4())
}

/// Extract the session id embedded in a `gcsIn`/`gcsOut` reference of the
/// form `gs://{bucket}/sessions/{id}/{in|out}`.
pub fn id_from_ref(reference: &str) -> Option<&str> {
    let after = reference.split_once("/sessions/")?.1;
    after.split('/').next().filter(|s| !s.is_empty())
}
