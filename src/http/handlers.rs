//! The five HTTP handlers (§6.1): `unwrap`, `rewrap`, `process`,
//! `session`, `health`.

use axum::extract::State;
use axum::http::HeaderValue;
use axum::response::{IntoResponse, Response};
use axum::Json;
use base64::Engine;
use uuid::Uuid;

use crate::engine::operation::apply_batch;
use crate::error::ServiceError;
use crate::manifest::{from_manifest, to_manifest};
use crate::opc::archive;
use crate::opc::content_types::ContentTypes;
use crate::opc::error::OpcError;
use crate::session::SessionError;

use super::dto::{
    HealthResponse, ProcessRequest, ProcessResponse, RewrapRequest, RewrapResponse, SessionResponse,
    UnwrapRequest, UnwrapResponse,
};
use super::error::ApiError;
use super::state::AppState;

const CORRELATION_HEADER: &str = "x-correlation-id";

fn ok_response(correlation: Uuid, body: impl serde::Serialize) -> Response {
    let mut response = Json(body).into_response();
    if let Ok(value) = HeaderValue::from_str(&correlation.to_string()) {
        response.headers_mut().insert(CORRELATION_HEADER, value);
    }
    response
}

fn decode_zip_b64(zip_b64: &str) -> Result<Vec<u8>, ServiceError> {
    base64::engine::general_purpose::STANDARD
        .decode(zip_b64)
        .map_err(|e| ServiceError::Opc(OpcError::MalformedArchive(e.to_string())))
}

/// Resolve a `gcsIn`/`gcsOut` reference to its session and acquire it for
/// exclusive use (§4.6): the single in-flight guarantee `S019` lives here.
/// Callers must pair a successful acquire with [`SessionStore::release`]
/// once the request is done with the session, on every exit path.
async fn acquire_session(state: &AppState, reference: &str, correlation: Uuid) -> Result<String, ApiError> {
    let id = crate::session::id_from_ref(reference)
        .ok_or_else(|| ApiError::new(ServiceError::Session(SessionError::NotFound(reference.to_string())), correlation))?
        .to_string();
    state.sessions.acquire(&id).await.map_err(|e| ApiError::new(ServiceError::Session(e), correlation))?;
    Ok(id)
}

/// Resolve the input bytes for `unwrap`/`process`: inline `zipB64` takes
/// precedence; otherwise the bytes are fetched from the Session's
/// `gcsIn`-addressed slot in the object store (§4.6).
async fn resolve_input_bytes(
    state: &AppState,
    zip_b64: Option<&str>,
    gcs_in: Option<&str>,
) -> Result<Vec<u8>, ServiceError> {
    if let Some(zip_b64) = zip_b64 {
        return decode_zip_b64(zip_b64);
    }
    if let Some(gcs_in) = gcs_in {
        return state
            .object_store
            .get(gcs_in)
            .await
            .ok_or_else(|| ServiceError::Opc(OpcError::MissingPartContent(format!("no bytes uploaded for session reference '{gcs_in}'"))));
    }
    Err(ServiceError::Opc(OpcError::MissingPartContent("zipB64 or gcsIn required".to_string())))
}

pub async fn unwrap(State(state): State<AppState>, Json(req): Json<UnwrapRequest>) -> Result<Response, ApiError> {
    let correlation = Uuid::new_v4();

    let session_id = match req.gcs_in.as_deref() {
        Some(gcs_in) => Some(acquire_session(&state, gcs_in, correlation).await?),
        None => None,
    };

    let outcome = resolve_input_bytes(&state, req.zip_b64.as_deref(), req.gcs_in.as_deref())
        .await
        .map_err(|e| ApiError::new(e, correlation))
        .and_then(|bytes| archive::decode(&bytes).map_err(|e| ApiError::new(ServiceError::Opc(e), correlation)));

    if let Some(id) = &session_id {
        state.sessions.release(id).await;
    }

    let (doc, _content_types) = outcome?;
    let manifest = to_manifest(&doc);
    Ok(ok_response(correlation, UnwrapResponse { ok: true, manifest }))
}

pub async fn rewrap(State(state): State<AppState>, Json(req): Json<RewrapRequest>) -> Result<Response, ApiError> {
    let correlation = Uuid::new_v4();

    let session_ref = req.gcs_out.as_deref().or(req.gcs_in.as_deref());
    let session_id = match session_ref {
        Some(reference) => Some(acquire_session(&state, reference, correlation).await?),
        None => None,
    };

    let outcome = rewrap_inner(&state, &req, correlation).await;

    if let Some(id) = &session_id {
        state.sessions.release(id).await;
    }

    outcome
}

async fn rewrap_inner(state: &AppState, req: &RewrapRequest, correlation: Uuid) -> Result<Response, ApiError> {
    let mut content_types = ContentTypes::new();
    let doc = from_manifest(&req.manifest, &mut content_types)
        .map_err(|e| ApiError::new(ServiceError::Opc(e), correlation))?;
    let bytes = archive::encode(&doc, &content_types).map_err(|e| ApiError::new(ServiceError::Opc(e), correlation))?;

    if let Some(gcs_out) = &req.gcs_out {
        state.object_store.put(gcs_out, bytes).await;
        Ok(ok_response(correlation, RewrapResponse { ok: true, zip_b64: None, gcs_out: Some(gcs_out.clone()) }))
    } else {
        let zip_b64 = base64::engine::general_purpose::STANDARD.encode(&bytes);
        Ok(ok_response(correlation, RewrapResponse { ok: true, zip_b64: Some(zip_b64), gcs_out: None }))
    }
}

pub async fn process(State(state): State<AppState>, Json(req): Json<ProcessRequest>) -> Result<Response, ApiError> {
    let correlation = Uuid::new_v4();

    let session_ref = req.gcs_in.as_deref().or(req.gcs_out.as_deref());
    let session_id = match session_ref {
        Some(reference) => Some(acquire_session(&state, reference, correlation).await?),
        None => None,
    };

    let outcome = process_inner(&state, &req, correlation).await;

    if let Some(id) = &session_id {
        state.sessions.release(id).await;
    }

    outcome
}

async fn process_inner(state: &AppState, req: &ProcessRequest, correlation: Uuid) -> Result<Response, ApiError> {
    let bytes = resolve_input_bytes(state, req.zip_b64.as_deref(), req.gcs_in.as_deref())
        .await
        .map_err(|e| ApiError::new(e, correlation))?;
    let (mut doc, mut content_types) =
        archive::decode(&bytes).map_err(|e| ApiError::new(ServiceError::Opc(e), correlation))?;

    let report = match apply_batch(&mut doc, &mut content_types, &req.ops) {
        Ok(report) => report,
        Err(boxed) => {
            let (_partial_report, engine_err) = *boxed;
            return Err(ApiError::new(ServiceError::Engine(engine_err), correlation)
                .with_context("opCount", req.ops.len().to_string()));
        },
    };

    let output = archive::encode(&doc, &content_types).map_err(|e| ApiError::new(ServiceError::Opc(e), correlation))?;

    if let Some(gcs_out) = &req.gcs_out {
        state.object_store.put(gcs_out, output).await;
        return Ok(ok_response(
            correlation,
            ProcessResponse { ok: true, manifest: None, zip_b64: None, gcs_out: Some(gcs_out.clone()), report },
        ));
    }

    let zip_b64 = base64::engine::general_purpose::STANDARD.encode(&output);
    Ok(ok_response(correlation, ProcessResponse { ok: true, manifest: None, zip_b64: Some(zip_b64), gcs_out: None, report }))
}

pub async fn create_session(State(state): State<AppState>) -> Result<Response, ApiError> {
    let correlation = Uuid::new_v4();
    let session = state
        .sessions
        .create()
        .await
        .ok_or_else(|| ApiError::new(ServiceError::Session(crate::session::SessionError::NotFound("session mode disabled".to_string())), correlation))?;

    Ok(ok_response(
        correlation,
        SessionResponse {
            ok: true,
            id: session.id,
            upload_url: session.upload_url,
            download_url: session.download_url,
            gcs_in: session.gcs_in,
            gcs_out: session.gcs_out,
            expires_at: session.expires_at,
        },
    ))
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        version: env!("CARGO_PKG_VERSION"),
        uptime_ms: state.started_at.elapsed().as_millis() as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::engine::operation::Operation;

    fn enabled_state() -> AppState {
        let mut config = Config::from_env();
        config.object_store_bucket = Some("test-bucket".to_string());
        AppState::new(config)
    }

    fn minimal_pptx_b64() -> String {
        let mut buf = std::io::Cursor::new(Vec::new());
        {
            use std::io::Write;
            let mut writer = zip::ZipWriter::new(&mut buf);
            let options = zip::write::SimpleFileOptions::default();

            writer.start_file("[Content_Types].xml", options).unwrap();
            writer.write_all(br#"<?xml version="1.0"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/>
</Types>"#).unwrap();

            writer.start_file("_rels/.rels", options).unwrap();
            writer.write_all(br#"<?xml version="1.0"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="ppt/presentation.xml"/>
</Relationships>"#).unwrap();

            writer.start_file("ppt/presentation.xml", options).unwrap();
            writer.write_all(b"<presentation>ACME</presentation>").unwrap();

            writer.finish().unwrap();
        }
        base64::engine::general_purpose::STANDARD.encode(buf.into_inner())
    }

    #[tokio::test]
    async fn process_with_session_writes_output_to_object_store() {
        let state = enabled_state();
        let session = state.sessions.create().await.unwrap();

        let req = ProcessRequest {
            zip_b64: Some(minimal_pptx_b64()),
            gcs_in: None,
            ops: vec![Operation::ReplaceText {
                find: "ACME".to_string(),
                replace: "DeltaQuad".to_string(),
                scope: None,
                regex: false,
                flags: None,
            }],
            gcs_out: Some(session.gcs_out.clone()),
            filename: None,
        };

        process(State(state.clone()), Json(req)).await.unwrap();

        let stored = state.object_store.get(&session.gcs_out).await.unwrap();
        let (doc, _ct) = archive::decode(&stored).unwrap();
        let part = doc.get(&crate::opc::path::PartPath::new("ppt/presentation.xml")).unwrap();
        assert!(matches!(part.content(), crate::opc::part::PartContent::Xml(text) if text.contains("DeltaQuad")));

        assert!(!state.sessions.acquire(&session.id).await.is_err_and(|e| e.code() == "S019"));
        state.sessions.release(&session.id).await;
    }

    #[tokio::test]
    async fn unwrap_with_session_reads_input_from_object_store() {
        let state = enabled_state();
        let session = state.sessions.create().await.unwrap();
        let bytes = base64::engine::general_purpose::STANDARD.decode(minimal_pptx_b64()).unwrap();
        state.object_store.put(&session.gcs_in, bytes).await;

        let req = UnwrapRequest { zip_b64: None, gcs_in: Some(session.gcs_in.clone()) };
        let response = unwrap(State(state), Json(req)).await;
        assert!(response.is_ok());
    }

    #[tokio::test]
    async fn unwrap_with_unknown_session_reference_is_not_found() {
        let state = enabled_state();
        let req = UnwrapRequest { zip_b64: None, gcs_in: Some("gs://test-bucket/sessions/does-not-exist/in".to_string()) };
        let err = unwrap(State(state), Json(req)).await.unwrap_err();
        assert_eq!(err.error.code(), "S014");
    }

    #[tokio::test]
    async fn process_fails_s019_when_session_already_in_use() {
        let state = enabled_state();
        let session = state.sessions.create().await.unwrap();
        state.sessions.acquire(&session.id).await.unwrap();

        let req = ProcessRequest {
            zip_b64: Some(minimal_pptx_b64()),
            gcs_in: None,
            ops: vec![],
            gcs_out: Some(session.gcs_out.clone()),
            filename: None,
        };
        let err = process(State(state), Json(req)).await.unwrap_err();
        assert_eq!(err.error.code(), "S019");
    }
}
