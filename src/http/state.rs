//! Shared axum handler state: configuration plus the process-wide
//! Session Store (§5's only process-wide, explicitly injected dependency
//! per DESIGN NOTES' "global singletons" re-architecture).

use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::objectstore::ObjectStore;
use crate::session::SessionStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub sessions: SessionStore,
    pub object_store: ObjectStore,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let sessions = SessionStore::new(&config);
        Self { config: Arc::new(config), sessions, object_store: ObjectStore::new(), started_at: Instant::now() }
    }
}
