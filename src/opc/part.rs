/// Open Packaging Convention (OPC) objects related to package parts.
///
/// A part is the fundamental unit of content in an OPC package: a path, a
/// content type, and a body (XML text or opaque binary). Relationships
/// don't live on the Part itself — a Document keeps a separate
/// rels-source-path -> Relationships map (§3), since the `.rels` sidecar is
/// itself decoded as an ordinary XML Part.
use crate::opc::path::PartPath;

/// A part's body: either parsed-as-UTF-8 XML text, or opaque binary content.
///
/// The kind is decided once at decode time by the archive codec's XML/rels
/// predicate (extension `.xml`/`.rels`, or the exact `[Content_Types].xml`
/// path) and does not change for the part's lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartContent {
    Xml(String),
    Binary(Vec<u8>),
}

impl PartContent {
    pub fn is_xml(&self) -> bool {
        matches!(self, PartContent::Xml(_))
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            PartContent::Xml(s) => s.as_bytes(),
            PartContent::Binary(b) => b,
        }
    }

    pub fn as_xml_str(&self) -> Option<&str> {
        match self {
            PartContent::Xml(s) => Some(s),
            PartContent::Binary(_) => None,
        }
    }
}

/// A single part of an OOXML package.
#[derive(Debug, Clone)]
pub struct Part {
    path: PartPath,
    content_type: String,
    content: PartContent,
    modified: bool,
}

impl Part {
    pub fn new(path: PartPath, content_type: String, content: PartContent) -> Self {
        Self { path, content_type, content, modified: false }
    }

    pub fn path(&self) -> &PartPath {
        &self.path
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn set_content_type(&mut self, content_type: String) {
        self.content_type = content_type;
        self.modified = true;
    }

    pub fn content(&self) -> &PartContent {
        &self.content
    }

    pub fn set_content(&mut self, content: PartContent) {
        self.content = content;
        self.modified = true;
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn mark_modified(&mut self) {
        self.modified = true;
    }

    /// Re-root this part at a new path, used when renaming. Does not
    /// rewrite other parts' references to it — that cascade is the
    /// Content-Types & Rels Maintainer's job.
    pub fn set_path(&mut self, path: PartPath) {
        self.path = path;
        self.modified = true;
    }
}

/// Returns whether a content type denotes XML content, the way
/// `[Content_Types].xml` Override/Default entries do (`+xml` or `/xml` suffix).
pub fn is_xml_content_type(content_type: &str) -> bool {
    content_type.ends_with("+xml") || content_type.ends_with("/xml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xml_part_round_trips_content() {
        let path = PartPath::new("word/document.xml");
        let part = Part::new(
            path.clone(),
            "application/xml".to_string(),
            PartContent::Xml("<root/>".to_string()),
        );
        assert_eq!(part.path(), &path);
        assert!(part.content().is_xml());
        assert!(!part.is_modified());
    }

    #[test]
    fn binary_part_stores_opaque_bytes() {
        let part = Part::new(
            PartPath::new("ppt/media/image1.png"),
            "image/png".to_string(),
            PartContent::Binary(vec![0x89, 0x50, 0x4E, 0x47]),
        );
        assert!(!part.content().is_xml());
        assert_eq!(part.content().as_bytes(), &[0x89, 0x50, 0x4E, 0x47]);
    }

    #[test]
    fn set_content_marks_modified() {
        let mut part = Part::new(
            PartPath::new("word/document.xml"),
            "application/xml".to_string(),
            PartContent::Xml("<root/>".to_string()),
        );
        part.set_content(PartContent::Xml("<root>x</root>".to_string()));
        assert!(part.is_modified());
    }

    #[test]
    fn is_xml_content_type_checks_suffix() {
        assert!(is_xml_content_type("application/xml"));
        assert!(is_xml_content_type(
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"
        ));
        assert!(!is_xml_content_type("image/png"));
    }
}
