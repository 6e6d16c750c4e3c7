//! Request/response DTOs for the HTTP surface (§6.1-6.3).

use serde::{Deserialize, Serialize};

use crate::engine::operation::Operation;
use crate::manifest::Manifest;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnwrapRequest {
    #[serde(default, rename = "zipB64")]
    pub zip_b64: Option<String>,
    #[serde(default, rename = "gcsIn")]
    pub gcs_in: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnwrapResponse {
    pub ok: bool,
    pub manifest: Manifest,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewrapRequest {
    pub manifest: Manifest,
    #[serde(default, rename = "gcsIn")]
    pub gcs_in: Option<String>,
    #[serde(default, rename = "gcsOut")]
    pub gcs_out: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RewrapResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none", rename = "zipB64")]
    pub zip_b64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "gcsOut")]
    pub gcs_out: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRequest {
    #[serde(default, rename = "zipB64")]
    pub zip_b64: Option<String>,
    #[serde(default, rename = "gcsIn")]
    pub gcs_in: Option<String>,
    #[serde(default)]
    pub ops: Vec<Operation>,
    #[serde(default, rename = "gcsOut")]
    pub gcs_out: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest: Option<Manifest>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "zipB64")]
    pub zip_b64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "gcsOut")]
    pub gcs_out: Option<String>,
    pub report: crate::engine::operation::Report,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub ok: bool,
    pub id: String,
    #[serde(rename = "uploadUrl")]
    pub upload_url: String,
    #[serde(rename = "downloadUrl")]
    pub download_url: String,
    #[serde(rename = "gcsIn")]
    pub gcs_in: String,
    #[serde(rename = "gcsOut")]
    pub gcs_out: String,
    #[serde(rename = "expiresAt")]
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub version: &'static str,
    #[serde(rename = "uptimeMs")]
    pub uptime_ms: u64,
}
