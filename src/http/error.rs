//! Maps [`ServiceError`] onto the `{ok:false, error:{...}}` envelope and
//! the HTTP status codes §6.1 names.

use std::collections::BTreeMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use uuid::Uuid;

use crate::error::{ErrorEnvelope, ServiceError};

/// A [`ServiceError`] carrying the request's correlation ID and context,
/// ready to render as an axum response.
#[derive(Debug)]
pub struct ApiError {
    pub error: ServiceError,
    pub correlation: Uuid,
    pub context: BTreeMap<String, String>,
}

impl ApiError {
    pub fn new(error: ServiceError, correlation: Uuid) -> Self {
        Self { error, correlation, context: BTreeMap::new() }
    }

    pub fn with_context(mut self, key: &str, value: impl Into<String>) -> Self {
        self.context.insert(key.to_string(), value.into());
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let envelope = ErrorEnvelope::new(&self.error, self.correlation, self.context);
        envelope.log();
        let status = StatusCode::from_u16(self.error.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(serde_json::json!({ "ok": false, "error": envelope }))).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(error: ServiceError) -> Self {
        Self::new(error, Uuid::new_v4())
    }
}
