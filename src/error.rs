//! Crate-wide error taxonomy (C8): stable codes grouped by category,
//! correlation IDs, and the `ERR[code] message ctx={…} corr=…` log line.
//!
//! Grounded on the teacher's per-module `thiserror` enums (the way
//! `ooxml::error::OoxmlError` composes `opc::error::OpcError` via
//! `#[from]`); code strings and severity grouping are new, per §4.8/§7.

use std::collections::BTreeMap;

use thiserror::Error;
use uuid::Uuid;

use crate::engine::operation::EngineError;
use crate::opc::error::OpcError;
use crate::session::SessionError;

/// A category-grouped, stable error code (§4.8): `C0xx` core archive/XML,
/// `S0xx` transport/session, `V0xx` validation.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Opc(#[from] OpcError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("request body exceeds the inline size limit")]
    Oversize,

    #[error("request timed out")]
    Timeout,

    #[error("unrecognized operation type")]
    UnknownOperation,

    #[error("rate limited")]
    RateLimited,
}

impl ServiceError {
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Opc(e) => e.code(),
            ServiceError::Engine(e) => e.code(),
            ServiceError::Session(e) => e.code(),
            ServiceError::Oversize => "S018",
            ServiceError::Timeout => "S012",
            ServiceError::UnknownOperation => "V043",
            ServiceError::RateLimited => "S017",
        }
    }

    /// Whether a client may usefully retry this error (§4.8: `S012, S014,
    /// S015, S017` are retryable).
    pub fn retryable(&self) -> bool {
        matches!(self.code(), "S012" | "S014" | "S015" | "S017")
    }

    /// The HTTP status this error maps to (§6.1's exit semantics).
    pub fn status(&self) -> u16 {
        match self.code() {
            code if code.starts_with('C') || code.starts_with('V') => 400,
            "S014" => 404,
            "S012" => 408,
            "S018" => 413,
            _ => 500,
        }
    }
}

/// The JSON error envelope returned on `{ok:false, error:…}` (§4.8).
#[derive(Debug, serde::Serialize)]
pub struct ErrorEnvelope {
    pub code: &'static str,
    pub message: String,
    pub context: BTreeMap<String, String>,
    pub correlation: String,
}

impl ErrorEnvelope {
    pub fn new(err: &ServiceError, correlation: Uuid, context: BTreeMap<String, String>) -> Self {
        Self { code: err.code(), message: err.to_string(), context, correlation: correlation.to_string() }
    }

    /// Emit the structured `ERR[code] message ctx={…} corr=…` log line
    /// (§4.8, §12's "every non-error request also gets a completion
    /// line" sibling).
    pub fn log(&self) {
        tracing::error!(
            code = self.code,
            context = ?self.context,
            correlation = %self.correlation,
            "ERR[{}] {} ctx={:?} corr={}",
            self.code,
            self.message,
            self.context,
            self.correlation
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oversize_maps_to_413() {
        assert_eq!(ServiceError::Oversize.status(), 413);
    }

    #[test]
    fn opc_error_status_is_400() {
        let err = ServiceError::Opc(OpcError::MissingContentTypes);
        assert_eq!(err.status(), 400);
        assert_eq!(err.code(), "C008");
    }

    #[test]
    fn session_not_found_maps_to_404() {
        let err = ServiceError::Session(SessionError::NotFound("abc".to_string()));
        assert_eq!(err.status(), 404);
    }

    #[test]
    fn session_in_use_is_retryable_surface() {
        let err = ServiceError::Session(SessionError::InUse("abc".to_string()));
        assert_eq!(err.code(), "S019");
        assert!(!err.retryable());
    }
}
