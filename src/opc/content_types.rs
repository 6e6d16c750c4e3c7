//! The Content-Types & Rels Maintainer (C3): structural upkeep of
//! `[Content_Types].xml` and the relationship graph as parts are
//! registered, unregistered, renamed, or removed.
//!
//! Parsing follows the teacher's `pkgreader::ContentTypeMap`; serialization
//! follows `pkgwriter::ContentTypesItem`; here the two are merged into one
//! structurally-editable model with the mutation/cascade contract §4.3
//! names, instead of being rebuilt wholesale on every write.

use std::collections::BTreeMap;

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::opc::constants;
use crate::opc::document::Document;
use crate::opc::error::{OpcError, Result};
use crate::opc::path::PartPath;

/// `[Content_Types].xml`'s Default/Override mapping.
#[derive(Debug, Default)]
pub struct ContentTypes {
    /// Extension (lowercased, no dot) -> content type.
    defaults: BTreeMap<String, String>,
    /// Absolute part path -> content type, for parts whose type isn't
    /// covered by a Default.
    overrides: BTreeMap<String, String>,
}

/// Non-fatal issues found by [`ContentTypes::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning(pub String);

impl ContentTypes {
    pub fn new() -> Self {
        let mut defaults = BTreeMap::new();
        for (ext, ct) in constants::DEFAULT_EXTENSIONS {
            defaults.insert((*ext).to_string(), (*ct).to_string());
        }
        Self { defaults, overrides: BTreeMap::new() }
    }

    pub fn parse(xml: &str) -> Result<Self> {
        let mut content_types = Self { defaults: BTreeMap::new(), overrides: BTreeMap::new() };
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                    b"Default" => {
                        let mut extension = None;
                        let mut content_type = None;
                        for attr in e.attributes() {
                            let attr = attr?;
                            match attr.key.as_ref() {
                                b"Extension" => extension = Some(attr.unescape_value()?.to_string()),
                                b"ContentType" => content_type = Some(attr.unescape_value()?.to_string()),
                                _ => {},
                            }
                        }
                        if let (Some(ext), Some(ct)) = (extension, content_type) {
                            content_types.defaults.insert(ext.to_lowercase(), ct);
                        }
                    },
                    b"Override" => {
                        let mut part_name = None;
                        let mut content_type = None;
                        for attr in e.attributes() {
                            let attr = attr?;
                            match attr.key.as_ref() {
                                b"PartName" => part_name = Some(attr.unescape_value()?.to_string()),
                                b"ContentType" => content_type = Some(attr.unescape_value()?.to_string()),
                                _ => {},
                            }
                        }
                        if let (Some(pn), Some(ct)) = (part_name, content_type) {
                            content_types.overrides.insert(pn, ct);
                        }
                    },
                    _ => {},
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(OpcError::XmlError(e)),
                _ => {},
            }
            buf.clear();
        }

        Ok(content_types)
    }

    /// Content type for `path`: an Override if present, else the extension's
    /// Default, else `None`.
    pub fn get(&self, path: &PartPath) -> Option<&str> {
        self.overrides
            .get(path.as_str())
            .or_else(|| self.defaults.get(path.ext()))
            .map(|s| s.as_str())
    }

    /// Ensure `[Content_Types].xml` covers `path`. No-op if a Default
    /// already matches. Otherwise inserts/overwrites an Override, inferring
    /// the content type from the directory-pattern table when
    /// `content_type` is `None`. Fails `C008` if neither is available.
    pub fn register_part(&mut self, path: &PartPath, content_type: Option<String>) -> Result<String> {
        let inferred = content_type.or_else(|| constants::infer_from_path(path.as_str()).map(str::to_string));

        if let Some(existing) = self.defaults.get(path.ext())
            && inferred.as_deref().is_none_or(|ct| ct == existing)
        {
            return Ok(existing.clone());
        }
        let content_type = inferred.ok_or_else(|| {
            OpcError::InvalidContentTypes(format!("no content type inferable for '{path}'"))
        })?;
        self.overrides.insert(path.as_str().to_string(), content_type.clone());
        Ok(content_type)
    }

    /// Remove any Override for `path`. Defaults are never touched.
    pub fn unregister_part(&mut self, path: &PartPath) {
        self.overrides.remove(path.as_str());
    }

    /// `unregisterPart(from)` then `registerPart(to, preservedType)`, and
    /// rewrite every Relationship across the Document whose internal
    /// target resolves to `from` so it instead points at `to`.
    pub fn on_rename(&mut self, doc: &mut Document, from: &PartPath, to: &PartPath) -> Result<()> {
        let preserved = self.get(from).map(str::to_string);
        self.unregister_part(from);
        self.register_part(to, preserved)?;

        let package_rels = doc.package_rels_mut();
        package_rels.retarget(from, to);
        let source_paths: Vec<PartPath> = doc.iter_rels().map(|(p, _)| p.clone()).collect();
        for source in source_paths {
            doc.rels_for_mut(&source).retarget(from, to);
        }
        Ok(())
    }

    /// `unregisterPart(path)`; every Relationship whose target resolves to
    /// `path` is removed from its parent rels Part.
    pub fn on_remove(&mut self, doc: &mut Document, path: &PartPath) {
        self.unregister_part(path);
        doc.package_rels_mut().remove_targeting(path);
        let source_paths: Vec<PartPath> = doc.iter_rels().map(|(p, _)| p.clone()).collect();
        for source in source_paths {
            doc.rels_for_mut(&source).remove_targeting(path);
        }
    }

    /// Every non-default Part has an Override; every Override references an
    /// existing Part; every internal Relationship target resolves to an
    /// existing Part. Violations are warnings, never fatal (§9).
    pub fn validate(&self, doc: &Document) -> Vec<Warning> {
        let mut warnings = Vec::new();

        for part in doc.list(None) {
            if self.get(part.path()).is_none() {
                warnings.push(Warning(format!("part '{}' has no content type", part.path())));
            }
        }

        for part_name in self.overrides.keys() {
            if !doc.contains(&PartPath::new(part_name.clone())) {
                warnings.push(Warning(format!(
                    "Override '{}' references a part that does not exist",
                    part_name
                )));
            }
        }

        let check_rels = |source: &PartPath, rels: &crate::opc::rel::Relationships, warnings: &mut Vec<Warning>| {
            for rel in rels.iter() {
                if rel.is_external() {
                    continue;
                }
                match rel.target_path() {
                    Ok(target) if doc.contains(&target) => {},
                    _ => warnings.push(Warning(format!(
                        "relationship '{}' from '{}' does not resolve to an existing part",
                        rel.r_id(),
                        source
                    ))),
                }
            }
        };
        check_rels(&PartPath::new(crate::opc::path::PACKAGE_PATH), doc.package_rels(), &mut warnings);
        for (source, rels) in doc.iter_rels() {
            check_rels(source, rels, &mut warnings);
        }

        warnings
    }

    /// Serialize to the XML body of `[Content_Types].xml`, Default/Override
    /// entries sorted for deterministic output.
    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(1024);
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push('\n');
        xml.push_str(r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#);
        xml.push('\n');

        for (ext, ct) in &self.defaults {
            xml.push_str(&format!(
                r#"  <Default Extension="{}" ContentType="{}"/>"#,
                escape_xml(ext),
                escape_xml(ct)
            ));
            xml.push('\n');
        }
        for (part_name, ct) in &self.overrides {
            xml.push_str(&format!(
                r#"  <Override PartName="{}" ContentType="{}"/>"#,
                escape_xml(part_name),
                escape_xml(ct)
            ));
            xml.push('\n');
        }

        xml.push_str("</Types>");
        xml
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;").replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opc::document::Kind;
    use crate::opc::part::{Part, PartContent};

    fn xml_part(path: &str) -> Part {
        Part::new(PartPath::new(path), "application/xml".to_string(), PartContent::Xml("<a/>".into()))
    }

    #[test]
    fn parse_roundtrips_defaults_and_overrides() {
        let xml = r#"<?xml version="1.0"?>
            <Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
                <Default Extension="xml" ContentType="application/xml"/>
                <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
            </Types>"#;
        let ct = ContentTypes::parse(xml).unwrap();
        assert_eq!(ct.get(&PartPath::new("anything.xml")), Some("application/xml"));
        assert_eq!(
            ct.get(&PartPath::new("word/document.xml")),
            Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml")
        );
    }

    #[test]
    fn register_part_no_op_when_default_matches() {
        let mut ct = ContentTypes::new();
        let result = ct.register_part(&PartPath::new("foo.xml"), Some("application/xml".to_string()));
        assert_eq!(result.unwrap(), "application/xml");
        assert!(ct.overrides.is_empty());
    }

    #[test]
    fn register_part_infers_from_directory_pattern() {
        let mut ct = ContentTypes::new();
        let result = ct.register_part(&PartPath::new("ppt/slides/slide3.xml"), None).unwrap();
        assert_eq!(result, constants::content_type::PML_SLIDE);
        assert!(ct.overrides.contains_key("/ppt/slides/slide3.xml"));
    }

    #[test]
    fn register_part_fails_without_inferable_type() {
        let mut ct = ContentTypes::new();
        let err = ct.register_part(&PartPath::new("custom/blob.dat"), None);
        assert!(err.is_err());
    }

    #[test]
    fn unregister_part_removes_override_only() {
        let mut ct = ContentTypes::new();
        ct.register_part(&PartPath::new("ppt/slides/slide1.xml"), None).unwrap();
        ct.unregister_part(&PartPath::new("ppt/slides/slide1.xml"));
        assert!(ct.overrides.is_empty());
        assert!(ct.defaults.contains_key("xml"));
    }

    #[test]
    fn on_rename_cascades_relationship_targets() {
        let mut doc = Document::empty(Kind::Pptx);
        doc.put(xml_part("ppt/slides/slide1.xml"));
        doc.package_rels_mut().add_relationship(
            crate::opc::constants::relationship_type::OFFICE_DOCUMENT.to_string(),
            "ppt/slides/slide1.xml".to_string(),
            "rId1".to_string(),
            false,
        );

        let mut ct = ContentTypes::new();
        ct.register_part(&PartPath::new("ppt/slides/slide1.xml"), None).unwrap();
        doc.rename(&PartPath::new("ppt/slides/slide1.xml"), PartPath::new("ppt/slides/slide2.xml")).unwrap();
        ct.on_rename(&mut doc, &PartPath::new("ppt/slides/slide1.xml"), &PartPath::new("ppt/slides/slide2.xml"))
            .unwrap();

        assert!(!ct.overrides.contains_key("/ppt/slides/slide1.xml"));
        assert!(ct.overrides.contains_key("/ppt/slides/slide2.xml"));
        let rel = doc.package_rels().part_with_reltype(crate::opc::constants::relationship_type::OFFICE_DOCUMENT).unwrap();
        assert_eq!(rel.target_path().unwrap(), PartPath::new("ppt/slides/slide2.xml"));
    }

    #[test]
    fn validate_flags_dangling_override() {
        let doc = Document::empty(Kind::Generic);
        let mut ct = ContentTypes::new();
        ct.overrides.insert("/missing.xml".to_string(), "application/xml".to_string());
        let warnings = ct.validate(&doc);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn validate_clean_document_has_no_warnings() {
        let mut doc = Document::empty(Kind::Generic);
        doc.put(xml_part("word/document.xml"));
        let ct = ContentTypes::new();
        assert!(ct.validate(&doc).is_empty());
    }
}
