//! The in-memory representation of one OOXML file: an ordered Part Store
//! (C2) plus the document-kind detection used to locate the format's main
//! part.
//!
//! Relationships are kept separately from the raw `.rels` Parts, as a
//! `rels-source-path -> Relationships` map (§3): the `.rels` XML text is
//! still present verbatim as an ordinary Part (the archive codec decodes
//! every entry unconditionally), but the parsed, structurally-editable
//! form used by the Content-Types & Rels Maintainer lives here, keyed by
//! the path of the part the relationships originate from (`/` for the
//! package root).

use std::collections::HashMap;

use crate::opc::error::{OpcError, Result};
use crate::opc::part::Part;
use crate::opc::path::{PartPath, PACKAGE_PATH};
use crate::opc::rel::Relationships;

/// The OOXML document kind, decided by which main part is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Pptx,
    Docx,
    Xlsx,
    Generic,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Pptx => "pptx",
            Kind::Docx => "docx",
            Kind::Xlsx => "xlsx",
            Kind::Generic => "generic",
        }
    }

    /// Detect the kind from the main part's content type, per
    /// `constants::MAIN_PART_CONTENT_TYPE`.
    fn from_main_content_type(content_type: &str) -> Kind {
        crate::opc::constants::MAIN_PART_CONTENT_TYPE
            .iter()
            .find(|(_, ct)| *ct == content_type)
            .map(|(kind, _)| match *kind {
                "pptx" => Kind::Pptx,
                "docx" => Kind::Docx,
                "xlsx" => Kind::Xlsx,
                _ => unreachable!(),
            })
            .unwrap_or(Kind::Generic)
    }
}

/// A Document: the Part Store (C2) plus its parsed relationship graph.
#[derive(Debug)]
pub struct Document {
    kind: Kind,
    order: Vec<PartPath>,
    parts: HashMap<PartPath, Part>,
    rels: HashMap<PartPath, Relationships>,
}

impl Document {
    /// An empty Document of the given kind (used by tests and by the
    /// Operation Engine before any parts are registered).
    pub fn empty(kind: Kind) -> Self {
        Self { kind, order: Vec::new(), parts: HashMap::new(), rels: HashMap::new() }
    }

    /// Build a Document from a decoded part set and its parsed rels map,
    /// resolving `kind` from the package's office-document relationship.
    pub fn new(parts: Vec<Part>, rels: HashMap<PartPath, Relationships>) -> Self {
        let mut doc = Self::empty(Kind::Generic);
        doc.rels = rels;
        for part in parts {
            doc.put(part);
        }

        let main_content_type = doc
            .main_part_path()
            .ok()
            .and_then(|path| doc.get(&path))
            .map(|p| p.content_type().to_string());

        doc.kind = main_content_type
            .map(|ct| Kind::from_main_content_type(&ct))
            .unwrap_or(Kind::Generic);
        doc
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn set_kind(&mut self, kind: Kind) {
        self.kind = kind;
    }

    /// Look up the path of the format's main part via the package-level
    /// `officeDocument` relationship.
    pub fn main_part_path(&self) -> Result<PartPath> {
        let package_rels = self.package_rels();
        let rel = package_rels
            .part_with_reltype(crate::opc::constants::relationship_type::OFFICE_DOCUMENT)?;
        rel.target_path()
    }

    /// Relationships whose source is the package root.
    pub fn package_rels(&self) -> &Relationships {
        static EMPTY: std::sync::OnceLock<Relationships> = std::sync::OnceLock::new();
        self.rels
            .get(&PartPath::new(PACKAGE_PATH))
            .unwrap_or_else(|| EMPTY.get_or_init(|| Relationships::new(PACKAGE_PATH.to_string())))
    }

    pub fn package_rels_mut(&mut self) -> &mut Relationships {
        self.rels
            .entry(PartPath::new(PACKAGE_PATH))
            .or_insert_with(|| Relationships::new(PACKAGE_PATH.to_string()))
    }

    /// Relationships originating from `path`, if any are registered.
    pub fn rels_for(&self, path: &PartPath) -> Option<&Relationships> {
        self.rels.get(path)
    }

    pub fn rels_for_mut(&mut self, path: &PartPath) -> &mut Relationships {
        self.rels
            .entry(path.clone())
            .or_insert_with(|| Relationships::new(path.base_dir().to_string()))
    }

    /// All (source path, Relationships) pairs, for serialization.
    pub fn iter_rels(&self) -> impl Iterator<Item = (&PartPath, &Relationships)> {
        self.rels.iter()
    }

    pub fn remove_rels_for(&mut self, path: &PartPath) -> Option<Relationships> {
        self.rels.remove(path)
    }

    /// Re-key a relationships entry when its owning part is renamed.
    pub fn rekey_rels(&mut self, from: &PartPath, to: PartPath) {
        if let Some(mut rels) = self.rels.remove(from) {
            rels = Relationships::new(to.base_dir().to_string()).merge_from(rels);
            self.rels.insert(to, rels);
        }
    }

    pub fn get(&self, path: &PartPath) -> Option<&Part> {
        self.parts.get(path)
    }

    pub fn get_mut(&mut self, path: &PartPath) -> Option<&mut Part> {
        self.parts.get_mut(path)
    }

    pub fn contains(&self, path: &PartPath) -> bool {
        self.parts.contains_key(path)
    }

    /// Insert or replace a part, preserving its position if it already
    /// existed, appending it otherwise.
    pub fn put(&mut self, part: Part) {
        let path = part.path().clone();
        if !self.parts.contains_key(&path) {
            self.order.push(path.clone());
        }
        self.parts.insert(path, part);
    }

    pub fn remove(&mut self, path: &PartPath) -> Option<Part> {
        self.order.retain(|p| p != path);
        self.parts.remove(path)
    }

    /// Move a part to a new path, preserving its body. Fails if `from` is
    /// absent (checked again, with `to`-occupied semantics, by the caller
    /// per §4.4's `renamePart` contract; this is the mechanical move only).
    pub fn rename(&mut self, from: &PartPath, to: PartPath) -> Result<()> {
        let mut part = self.remove(from).ok_or_else(|| OpcError::PartNotFound(from.to_string()))?;
        part.set_path(to);
        self.put(part);
        Ok(())
    }

    /// Parts in insertion order, optionally filtered by path prefix.
    pub fn list(&self, prefix_filter: Option<&str>) -> Vec<&Part> {
        self.order
            .iter()
            .filter_map(|p| self.parts.get(p))
            .filter(|p| match prefix_filter {
                Some(prefix) => p.path().membername().starts_with(prefix),
                None => true,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}
