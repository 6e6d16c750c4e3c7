//! The Operation Engine (C4): a tagged edit list applied sequentially
//! against one [`Document`], producing a [`Report`].
//!
//! Grounded on DESIGN NOTES' "dynamic dispatch on operation kind" call to
//! reimplement as a discriminated union with a per-variant handler table,
//! and on the teacher's `OpcPackage` mutation methods (`relate_to`,
//! `next_partname`) as the thing each variant drives against the Part
//! Store / Content-Types & Rels Maintainer.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::opc::content_types::ContentTypes;
use crate::opc::document::Document;
use crate::opc::error::OpcError;
use crate::opc::part::{Part, PartContent};
use crate::opc::path::PartPath;

use super::text_scan;

/// Errors raised while applying an Operation, beyond the `opc` taxonomy.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("invalid regex syntax: {0}")]
    RegexCompile(String),

    #[error("invalid replacement: {0}")]
    BadReplacement(String),

    #[error(transparent)]
    Opc(#[from] OpcError),
}

impl EngineError {
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::RegexCompile(_) => "V042",
            EngineError::BadReplacement(_) => "V041",
            EngineError::Opc(e) => e.code(),
        }
    }
}

/// A single declarative edit, as it arrives on the wire (§6.3).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Operation {
    ReplaceText {
        find: String,
        replace: String,
        #[serde(default)]
        scope: Option<String>,
        #[serde(default)]
        regex: bool,
        #[serde(default)]
        flags: Option<String>,
    },
    UpsertPart {
        path: String,
        #[serde(default)]
        text: Option<String>,
        #[serde(default, rename = "dataB64")]
        data_b64: Option<String>,
        #[serde(default, rename = "contentType")]
        content_type: Option<String>,
    },
    RemovePart {
        path: String,
    },
    RenamePart {
        from: String,
        to: String,
        #[serde(default, rename = "contentType")]
        content_type: Option<String>,
    },
}

/// The outcome of one Operation within a batch.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpOutcome {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_found: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replacements: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl OpOutcome {
    fn ok() -> Self {
        Self { ok: true, not_found: None, replacements: None, warning: None }
    }

    fn replaced(count: usize) -> Self {
        Self { ok: true, not_found: None, replacements: Some(count), warning: None }
    }

    fn not_found() -> Self {
        Self { ok: true, not_found: Some(true), replacements: None, warning: None }
    }

    fn warned(message: String) -> Self {
        Self { ok: true, not_found: None, replacements: None, warning: Some(message) }
    }
}

/// The per-batch outcome record returned with every `process` response (§3).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub total_ops: usize,
    pub outcomes: Vec<OpOutcome>,
    pub replacements: usize,
    pub parts_added: usize,
    pub parts_removed: usize,
    pub parts_renamed: usize,
    pub warnings: Vec<String>,
    pub elapsed_ms: u64,
}

/// Apply every Operation in `ops` to `doc` and `content_types`, in order.
///
/// Short-circuits on the first fatal error: the partial report and the
/// error are both returned, and per §4.4 the caller must discard `doc`
/// (operations already applied to it are not undone).
pub fn apply_batch(
    doc: &mut Document,
    content_types: &mut ContentTypes,
    ops: &[Operation],
) -> Result<Report, Box<(Report, EngineError)>> {
    let start = std::time::Instant::now();
    let mut outcomes = Vec::with_capacity(ops.len());
    let mut replacements = 0;
    let mut parts_added = 0;
    let mut parts_removed = 0;
    let mut parts_renamed = 0;
    let mut warnings = Vec::new();

    for op in ops {
        let upsert_is_new = matches!(op, Operation::UpsertPart { path, .. } if !doc.contains(&PartPath::new(path.clone())));
        match apply_one(doc, content_types, op) {
            Ok(outcome) => {
                match &outcome {
                    OpOutcome { replacements: Some(n), .. } => replacements += n,
                    OpOutcome { warning: Some(w), .. } => warnings.push(w.clone()),
                    _ => {},
                }
                match op {
                    Operation::UpsertPart { .. } if upsert_is_new => parts_added += 1,
                    Operation::RemovePart { .. } if outcome.not_found != Some(true) => parts_removed += 1,
                    Operation::RenamePart { .. } => parts_renamed += 1,
                    _ => {},
                }
                outcomes.push(outcome);
            },
            Err(e) => {
                let report = Report {
                    total_ops: ops.len(),
                    outcomes,
                    replacements,
                    parts_added,
                    parts_removed,
                    parts_renamed,
                    warnings,
                    elapsed_ms: start.elapsed().as_millis() as u64,
                };
                return Err(Box::new((report, e)));
            },
        }
    }

    Ok(Report {
        total_ops: ops.len(),
        outcomes,
        replacements,
        parts_added,
        parts_removed,
        parts_renamed,
        warnings,
        elapsed_ms: start.elapsed().as_millis() as u64,
    })
}

fn apply_one(doc: &mut Document, content_types: &mut ContentTypes, op: &Operation) -> Result<OpOutcome, EngineError> {
    match op {
        Operation::ReplaceText { find, replace, scope, regex, flags } => {
            let pattern = text_scan::compile(find, replace, *regex)?;
            let global = flags.as_deref().is_none_or(|f| f.contains('g'));
            let count = text_scan::rewrite(doc, scope.as_deref().unwrap_or(""), &pattern, replace, global);
            Ok(OpOutcome::replaced(count))
        },

        Operation::UpsertPart { path, text, data_b64, content_type } => {
            let content = match (text, data_b64) {
                (Some(text), None) => PartContent::Xml(text.clone()),
                (None, Some(b64)) => {
                    use base64::Engine;
                    let bytes = base64::engine::general_purpose::STANDARD
                        .decode(b64)
                        .map_err(|e| EngineError::Opc(OpcError::MissingPartContent(e.to_string())))?;
                    PartContent::Binary(bytes)
                },
                _ => {
                    return Err(EngineError::Opc(OpcError::MissingPartContent(format!(
                        "upsertPart '{path}' requires exactly one of text/dataB64"
                    ))));
                },
            };

            let part_path = PartPath::new(path.clone());
            let registered_type = content_types.register_part(&part_path, content_type.clone())?;
            let is_new = !doc.contains(&part_path);

            if let Some(existing) = doc.get_mut(&part_path) {
                existing.set_content(content);
                existing.set_content_type(registered_type);
            } else {
                doc.put(Part::new(part_path.clone(), registered_type, content));
            }

            if is_new {
                doc.package_rels_mut().get_or_add(
                    crate::opc::constants::relationship_type::GENERIC_PACKAGE_PART,
                    part_path.membername(),
                );
            }
            Ok(OpOutcome::ok())
        },

        Operation::RemovePart { path } => {
            let part_path = PartPath::new(path.clone());
            if !doc.contains(&part_path) {
                return Ok(OpOutcome::not_found());
            }
            doc.remove(&part_path);
            content_types.on_remove(doc, &part_path);
            Ok(OpOutcome::ok())
        },

        Operation::RenamePart { from, to, content_type } => {
            let from_path = PartPath::new(from.clone());
            let to_path = PartPath::new(to.clone());
            if !doc.contains(&from_path) {
                return Err(EngineError::Opc(OpcError::InvalidRelationship(format!(
                    "renamePart: source '{from}' does not exist"
                ))));
            }
            if doc.contains(&to_path) {
                return Err(EngineError::Opc(OpcError::InvalidRelationship(format!(
                    "renamePart: target '{to}' already exists"
                ))));
            }

            doc.rename(&from_path, to_path.clone())?;
            doc.rekey_rels(&from_path, to_path.clone());

            let from_rels_path = from_path.rels_path();
            if doc.contains(&from_rels_path) {
                doc.rename(&from_rels_path, to_path.rels_path())?;
            }

            content_types.on_rename(doc, &from_path, &to_path)?;

            if let Some(ct) = content_type
                && let Some(part) = doc.get_mut(&to_path)
            {
                part.set_content_type(ct.clone());
            }

            let warnings = content_types.validate(doc);
            if let Some(w) = warnings.into_iter().next() {
                return Ok(OpOutcome::warned(w.0));
            }
            Ok(OpOutcome::ok())
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opc::document::Kind;

    fn pptx_doc() -> Document {
        let mut doc = Document::empty(Kind::Pptx);
        doc.put(Part::new(
            PartPath::new("ppt/slides/slide1.xml"),
            "application/vnd.openxmlformats-officedocument.presentationml.slide+xml".to_string(),
            PartContent::Xml("<a>ACME Corp</a>".to_string()),
        ));
        doc
    }

    #[test]
    fn replace_text_counts_and_marks_modified() {
        let mut doc = pptx_doc();
        let mut ct = ContentTypes::new();
        let ops = vec![Operation::ReplaceText {
            find: "ACME Corp".to_string(),
            replace: "DeltaQuad Inc".to_string(),
            scope: Some("ppt/slides/".to_string()),
            regex: false,
            flags: None,
        }];
        let report = apply_batch(&mut doc, &mut ct, &ops).unwrap();
        assert_eq!(report.replacements, 1);
        assert!(doc.get(&PartPath::new("ppt/slides/slide1.xml")).unwrap().is_modified());
    }

    #[test]
    fn upsert_new_part_registers_content_type() {
        let mut doc = pptx_doc();
        let mut ct = ContentTypes::new();
        let ops = vec![Operation::UpsertPart {
            path: "docProps/custom.xml".to_string(),
            text: Some("<p/>".to_string()),
            data_b64: None,
            content_type: Some("application/xml".to_string()),
        }];
        apply_batch(&mut doc, &mut ct, &ops).unwrap();
        assert!(doc.contains(&PartPath::new("docProps/custom.xml")));
    }

    #[test]
    fn upsert_new_part_adds_root_relationship() {
        let mut doc = pptx_doc();
        let mut ct = ContentTypes::new();
        let ops = vec![Operation::UpsertPart {
            path: "docProps/custom.xml".to_string(),
            text: Some("<p/>".to_string()),
            data_b64: None,
            content_type: Some("application/xml".to_string()),
        }];
        apply_batch(&mut doc, &mut ct, &ops).unwrap();
        assert!(doc.package_rels().iter().any(|r| r.target_ref() == "docProps/custom.xml"));
    }

    #[test]
    fn upsert_counts_insert_but_not_replace() {
        let mut doc = pptx_doc();
        let mut ct = ContentTypes::new();
        let insert_ops = vec![Operation::UpsertPart {
            path: "docProps/custom.xml".to_string(),
            text: Some("<p/>".to_string()),
            data_b64: None,
            content_type: Some("application/xml".to_string()),
        }];
        let report = apply_batch(&mut doc, &mut ct, &insert_ops).unwrap();
        assert_eq!(report.parts_added, 1);

        let replace_ops = vec![Operation::UpsertPart {
            path: "docProps/custom.xml".to_string(),
            text: Some("<p>replaced</p>".to_string()),
            data_b64: None,
            content_type: Some("application/xml".to_string()),
        }];
        let report = apply_batch(&mut doc, &mut ct, &replace_ops).unwrap();
        assert_eq!(report.parts_added, 0);
    }

    #[test]
    fn remove_missing_part_is_not_an_error() {
        let mut doc = pptx_doc();
        let mut ct = ContentTypes::new();
        let ops = vec![Operation::RemovePart { path: "ppt/slides/doesNotExist.xml".to_string() }];
        let report = apply_batch(&mut doc, &mut ct, &ops).unwrap();
        assert_eq!(report.outcomes[0].not_found, Some(true));
        assert_eq!(report.parts_removed, 0);
    }

    #[test]
    fn rename_nonexistent_source_fails_batch() {
        let mut doc = pptx_doc();
        let mut ct = ContentTypes::new();
        let ops = vec![Operation::RenamePart {
            from: "ppt/slides/missing.xml".to_string(),
            to: "ppt/slides/intro.xml".to_string(),
            content_type: None,
        }];
        let err = apply_batch(&mut doc, &mut ct, &ops).unwrap_err();
        assert_eq!(err.1.code(), "C009");
    }

    #[test]
    fn rename_cascades_content_type() {
        let mut doc = pptx_doc();
        let mut ct = ContentTypes::new();
        ct.register_part(&PartPath::new("ppt/slides/slide1.xml"), None).unwrap();
        let ops = vec![Operation::RenamePart {
            from: "ppt/slides/slide1.xml".to_string(),
            to: "ppt/slides/intro.xml".to_string(),
            content_type: None,
        }];
        apply_batch(&mut doc, &mut ct, &ops).unwrap();
        assert!(doc.contains(&PartPath::new("ppt/slides/intro.xml")));
        assert!(!doc.contains(&PartPath::new("ppt/slides/slide1.xml")));
    }
}
