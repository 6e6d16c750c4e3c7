/// Relationship-related objects for OPC packages.
///
/// This module provides types for managing relationships between parts in an OPC package,
/// including internal and external relationships.
use std::collections::HashMap;

use crate::opc::error::{OpcError, Result};
use crate::opc::path::PartPath;

/// A single relationship from a source part to a target.
///
/// Represents a connection between parts in an OPC package, identified by an rId
/// (relationship ID). Can be either internal (pointing to another part) or external
/// (pointing to an external URL).
#[derive(Debug, Clone)]
pub struct Relationship {
    /// Relationship ID (e.g., "rId1", "rId2")
    r_id: String,

    /// Relationship type URI
    reltype: String,

    /// Target reference - either a part path or external URL
    target_ref: String,

    /// Directory of the source part, for resolving relative references
    base_dir: String,

    /// Whether this is an external relationship
    is_external: bool,
}

impl Relationship {
    /// Create a new relationship.
    pub fn new(
        r_id: String,
        reltype: String,
        target_ref: String,
        base_dir: String,
        is_external: bool,
    ) -> Self {
        Self { r_id, reltype, target_ref, base_dir, is_external }
    }

    #[inline]
    pub fn r_id(&self) -> &str {
        &self.r_id
    }

    #[inline]
    pub fn reltype(&self) -> &str {
        &self.reltype
    }

    /// Target reference as written in the `.rels` XML: a relative part
    /// reference for internal relationships, an absolute URL for external ones.
    #[inline]
    pub fn target_ref(&self) -> &str {
        &self.target_ref
    }

    #[inline]
    pub fn is_external(&self) -> bool {
        self.is_external
    }

    /// Resolve the absolute target path for an internal relationship.
    ///
    /// Returns an error if this is an external relationship.
    pub fn target_path(&self) -> Result<PartPath> {
        if self.is_external {
            return Err(OpcError::InvalidRelationship(
                "cannot resolve target_path for an external relationship".to_string(),
            ));
        }
        Ok(PartPath::from_rel_ref(&self.base_dir, &self.target_ref))
    }
}

/// Collection of relationships from a single source (a part, or the package root).
#[derive(Debug)]
pub struct Relationships {
    /// Directory of the source part, for resolving relative references
    base_dir: String,

    /// Map of relationship ID to Relationship
    rels: HashMap<String, Relationship>,
}

impl Relationships {
    pub fn new(base_dir: String) -> Self {
        Self { base_dir, rels: HashMap::new() }
    }

    pub fn add_relationship(
        &mut self,
        reltype: String,
        target_ref: String,
        r_id: String,
        is_external: bool,
    ) -> &Relationship {
        let rel =
            Relationship::new(r_id.clone(), reltype, target_ref, self.base_dir.clone(), is_external);
        self.rels.insert(r_id.clone(), rel);
        self.rels.get(r_id.as_str()).unwrap()
    }

    #[inline]
    pub fn get(&self, r_id: &str) -> Option<&Relationship> {
        self.rels.get(r_id)
    }

    /// Get or add a relationship to an internal target.
    ///
    /// If a relationship of the given type to the target already exists,
    /// returns that relationship. Otherwise creates a new one with the next
    /// available rId.
    pub fn get_or_add(&mut self, reltype: &str, target_ref: &str) -> &Relationship {
        for rel in self.rels.values() {
            if rel.reltype() == reltype && rel.target_ref() == target_ref && !rel.is_external() {
                let r_id = rel.r_id().to_string();
                return self.rels.get(&r_id).unwrap();
            }
        }
        let r_id = self.next_r_id();
        self.add_relationship(reltype.to_string(), target_ref.to_string(), r_id, false)
    }

    /// Get or add an external relationship, returning its rId.
    pub fn get_or_add_ext_rel(&mut self, reltype: &str, target_ref: &str) -> String {
        for rel in self.rels.values() {
            if rel.reltype() == reltype && rel.target_ref() == target_ref && rel.is_external() {
                return rel.r_id().to_string();
            }
        }
        let r_id = self.next_r_id();
        self.add_relationship(reltype.to_string(), target_ref.to_string(), r_id.clone(), true);
        r_id
    }

    /// The smallest positive integer N such that `rId{N}` is unused.
    fn next_r_id(&self) -> String {
        let mut used_numbers: Vec<u32> = self
            .rels
            .keys()
            .filter_map(|r_id| r_id.strip_prefix("rId").and_then(|n| n.parse::<u32>().ok()))
            .collect();
        used_numbers.sort_unstable();

        let mut next_num = 1u32;
        for &num in &used_numbers {
            match num.cmp(&next_num) {
                std::cmp::Ordering::Equal => next_num += 1,
                std::cmp::Ordering::Greater => break,
                std::cmp::Ordering::Less => {},
            }
        }
        format!("rId{}", next_num)
    }

    /// All relationships pointing at `path`, of any type.
    pub fn targeting(&self, path: &PartPath) -> impl Iterator<Item = &Relationship> {
        self.rels.values().filter(move |rel| rel.target_path().ok().as_ref() == Some(path))
    }

    /// Repoint every internal relationship currently targeting `from` to `to`,
    /// rewriting the relative `target_ref` in place. Used by rename cascades.
    pub fn retarget(&mut self, from: &PartPath, to: &PartPath) {
        let base_dir = self.base_dir.clone();
        for rel in self.rels.values_mut() {
            if rel.is_external {
                continue;
            }
            if PartPath::from_rel_ref(&base_dir, &rel.target_ref) == *from {
                rel.target_ref = relative_ref(&base_dir, to);
            }
        }
    }

    /// Absorb every relationship from `other` into `self`, keeping rIds and
    /// target refs as-is. Used when re-keying a Relationships entry to a
    /// new base directory after its owning part was renamed.
    pub fn merge_from(mut self, other: Relationships) -> Self {
        for rel in other.rels.into_values() {
            self.rels.insert(rel.r_id.clone(), rel);
        }
        self
    }

    /// Drop every internal relationship targeting `path`. Used by remove cascades.
    pub fn remove_targeting(&mut self, path: &PartPath) {
        let base_dir = self.base_dir.clone();
        self.rels.retain(|_, rel| {
            rel.is_external || PartPath::from_rel_ref(&base_dir, &rel.target_ref) != *path
        });
    }

    pub fn part_with_reltype(&self, reltype: &str) -> Result<&Relationship> {
        let matching: Vec<&Relationship> =
            self.rels.values().filter(|rel| rel.reltype() == reltype).collect();
        match matching.len() {
            0 => Err(OpcError::RelationshipNotFound(format!("no relationship of type '{}'", reltype))),
            1 => Ok(matching[0]),
            _ => Err(OpcError::InvalidRelationship(format!(
                "multiple relationships of type '{}'",
                reltype
            ))),
        }
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.rels.values()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rels.is_empty()
    }

    pub fn remove(&mut self, r_id: &str) -> Option<Relationship> {
        self.rels.remove(r_id)
    }

    /// Serialize to the XML body of a `.rels` part, relationships sorted by
    /// rId for deterministic output.
    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(1024);
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push('\n');
        xml.push_str(
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );
        xml.push('\n');

        let mut rels: Vec<&Relationship> = self.rels.values().collect();
        rels.sort_by_key(|rel| rel.r_id());

        for rel in rels {
            let target_mode =
                if rel.is_external() { r#" TargetMode="External""# } else { "" };
            xml.push_str(&format!(
                r#"  <Relationship Id="{}" Type="{}" Target="{}"{}/>"#,
                Self::escape_xml(rel.r_id()),
                Self::escape_xml(rel.reltype()),
                Self::escape_xml(rel.target_ref()),
                target_mode
            ));
            xml.push('\n');
        }

        xml.push_str("</Relationships>");
        xml
    }

    #[inline]
    fn escape_xml(s: &str) -> String {
        s.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
            .replace('\'', "&apos;")
    }
}

impl Default for Relationships {
    fn default() -> Self {
        Self::new("/".to_string())
    }
}

/// Compute the relative reference from `base_dir` to `target`, the reverse
/// of `PartPath::from_rel_ref`. Used when a rename needs to rewrite an
/// existing relative `target_ref`.
fn relative_ref(base_dir: &str, target: &PartPath) -> String {
    let base_segments: Vec<&str> = base_dir.trim_matches('/').split('/').filter(|s| !s.is_empty()).collect();
    let target_segments: Vec<&str> =
        target.membername().split('/').filter(|s| !s.is_empty()).collect();

    let common = base_segments.iter().zip(target_segments.iter()).take_while(|(a, b)| a == b).count();

    let mut parts: Vec<String> = Vec::new();
    for _ in common..base_segments.len() {
        parts.push("..".to_string());
    }
    parts.extend(target_segments[common..].iter().map(|s| s.to_string()));
    parts.join("/")
}
