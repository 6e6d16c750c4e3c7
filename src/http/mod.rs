//! The HTTP Surface (C7): `unwrap`, `rewrap`, `process`, `session`,
//! `health` over JSON (§6.1).
//!
//! Grounded on `stencila-stencila/rust/server`'s dependency choice
//! (`axum` + `tower-http`); no handler source was retrieved from that
//! crate, so handler shape follows axum's own idiomatic extractor/
//! response pattern (see DESIGN.md).

pub mod dto;
pub mod error;
pub mod handlers;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Build the service's axum `Router`, wired with the inline body-size
/// cap (§4.7) and request tracing (§11).
pub fn router(state: AppState) -> Router {
    let limit = state.config.request_size_limit_bytes;
    Router::new()
        .route("/unwrap", post(handlers::unwrap))
        .route("/rewrap", post(handlers::rewrap))
        .route("/process", post(handlers::process))
        .route("/session", post(handlers::create_session))
        .route("/health", get(handlers::health))
        .layer(RequestBodyLimitLayer::new(limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
