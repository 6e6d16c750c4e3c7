//! The wire Manifest format (§6.2): a JSON representation of a
//! [`crate::opc::Document`], and conversions between the two.
//!
//! `serde`-derived like every data type in the teacher and in
//! `wilson-anysphere-formula`'s `formula-model` crate.

use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::opc::content_types::ContentTypes;
use crate::opc::document::{Document, Kind};
use crate::opc::error::{OpcError, Result};
use crate::opc::part::{Part, PartContent};
use crate::opc::path::PartPath;

/// One entry in a [`Manifest`] (§6.2). Exactly one of `text`/`data_b64` is
/// populated, decided by `kind`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, rename = "dataB64", skip_serializing_if = "Option::is_none")]
    pub data_b64: Option<String>,
    #[serde(default, rename = "contentType", skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Xml,
    Bin,
}

/// Wire representation of a Document (§6.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub kind: Kind,
    pub entries: Vec<Entry>,
}

/// Flatten a Document's Part Store into its wire Manifest, in insertion order.
pub fn to_manifest(doc: &Document) -> Manifest {
    let entries = doc
        .list(None)
        .into_iter()
        .map(|part| match part.content() {
            PartContent::Xml(text) => Entry {
                path: part.path().membername().to_string(),
                kind: EntryKind::Xml,
                text: Some(text.clone()),
                data_b64: None,
                content_type: Some(part.content_type().to_string()),
            },
            PartContent::Binary(bytes) => Entry {
                path: part.path().membername().to_string(),
                kind: EntryKind::Bin,
                text: None,
                data_b64: Some(base64::engine::general_purpose::STANDARD.encode(bytes)),
                content_type: Some(part.content_type().to_string()),
            },
        })
        .collect();
    Manifest { kind: doc.kind(), entries }
}

/// Rebuild a Document's Part Store from a wire Manifest. Relationships are
/// not reconstructed here: `.rels` entries land as ordinary XML Parts (as
/// they do in `decode`), and the caller is expected to re-derive the
/// parsed `Relationships` map the same way the Archive Codec does, via
/// [`crate::opc::archive::decode`]'s rels-parsing path, when round-tripping
/// through a manifest alone (`unwrap` always produces both together).
pub fn from_manifest(manifest: &Manifest, content_types: &mut ContentTypes) -> Result<Document> {
    let mut doc = Document::empty(manifest.kind);

    for entry in &manifest.entries {
        let path = PartPath::new(entry.path.clone());
        let content = match entry.kind {
            EntryKind::Xml => {
                let text = entry
                    .text
                    .clone()
                    .ok_or_else(|| OpcError::MissingPartContent(entry.path.clone()))?;
                PartContent::Xml(text)
            },
            EntryKind::Bin => {
                let b64 = entry
                    .data_b64
                    .as_ref()
                    .ok_or_else(|| OpcError::MissingPartContent(entry.path.clone()))?;
                let bytes = base64::engine::general_purpose::STANDARD
                    .decode(b64)
                    .map_err(|e| OpcError::MissingPartContent(e.to_string()))?;
                PartContent::Binary(bytes)
            },
        };

        let content_type = content_types.register_part(&path, entry.content_type.clone())?;

        doc.put(Part::new(path, content_type, content));
    }

    Ok(doc)
}
