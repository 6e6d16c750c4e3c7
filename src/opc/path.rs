//! `PartPath`: the canonical, slash-normalized path identifying a part within
//! an OOXML package.
//!
//! Paths always begin with a forward slash internally and use forward
//! slashes as separators, following the Open Packaging Conventions. The
//! wire format (manifest entries, operation `path`/`from`/`to` fields)
//! omits the leading slash; [`PartPath::membername`] gives that form back.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartPath {
    path: String,
}

impl PartPath {
    /// Build a `PartPath` from a wire-format path (no leading slash, may
    /// contain one anyway — both are accepted and normalized).
    pub fn new<S: Into<String>>(path: S) -> Self {
        let path = path.into();
        let path = path.strip_prefix('/').unwrap_or(&path).to_string();
        PartPath { path: format!("/{path}") }
    }

    /// Resolve a relationship's relative target against the directory of
    /// its source part, per OPC relative-reference semantics (`..` allowed).
    pub fn from_rel_ref(base_dir: &str, relative_ref: &str) -> Self {
        let joined = if base_dir.ends_with('/') {
            format!("{base_dir}{relative_ref}")
        } else {
            format!("{base_dir}/{relative_ref}")
        };
        PartPath::new(Self::normalize(&joined))
    }

    fn normalize(path: &str) -> String {
        let mut parts: Vec<&str> = Vec::new();
        for segment in path.split('/') {
            match segment {
                "" | "." => {},
                ".." => {
                    parts.pop();
                },
                other => parts.push(other),
            }
        }
        parts.join("/")
    }

    /// Directory portion, e.g. `/ppt/slides` for `/ppt/slides/slide1.xml`.
    pub fn base_dir(&self) -> &str {
        match self.path.rfind('/') {
            Some(0) => "/",
            Some(pos) => &self.path[..pos],
            None => "/",
        }
    }

    /// File name portion, e.g. `slide1.xml`.
    pub fn filename(&self) -> &str {
        match self.path.rfind('/') {
            Some(pos) => &self.path[pos + 1..],
            None => &self.path,
        }
    }

    /// Extension without the leading period, lowercased is the caller's job.
    pub fn ext(&self) -> &str {
        let filename = self.filename();
        match filename.rfind('.') {
            Some(pos) => &filename[pos + 1..],
            None => "",
        }
    }

    /// Archive member name: the path with its leading slash stripped. This
    /// is both the ZIP entry name and the wire-format `path` value.
    pub fn membername(&self) -> &str {
        self.path.trim_start_matches('/')
    }

    /// The `.rels` sidecar path for this part, e.g.
    /// `/ppt/slides/_rels/slide1.xml.rels` for `/ppt/slides/slide1.xml`.
    pub fn rels_path(&self) -> PartPath {
        let base_dir = self.base_dir();
        let rels_filename = format!("{}.rels", self.filename());
        let rels_path = if base_dir == "/" {
            format!("/_rels/{rels_filename}")
        } else {
            format!("{base_dir}/_rels/{rels_filename}")
        };
        PartPath::new(rels_path)
    }

    pub fn as_str(&self) -> &str {
        &self.path
    }

    /// If this path is a `.rels` part, the path of the part it carries
    /// relationships for (the inverse of [`PartPath::rels_path`]); `None`
    /// otherwise. `/_rels/.rels` maps to the package root (`/`).
    pub fn rels_owner(&self) -> Option<PartPath> {
        let base_dir = self.base_dir();
        let rels_dir = base_dir.strip_suffix("/_rels").or_else(|| {
            if base_dir == "/_rels" { Some("") } else { None }
        })?;
        let filename = self.filename().strip_suffix(".rels")?;
        if filename.is_empty() {
            Some(PartPath::new(PACKAGE_PATH))
        } else if rels_dir.is_empty() {
            Some(PartPath::new(filename))
        } else {
            Some(PartPath::new(format!("{rels_dir}/{filename}")))
        }
    }
}

impl fmt::Display for PartPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.membername())
    }
}

impl AsRef<str> for PartPath {
    fn as_ref(&self) -> &str {
        &self.path
    }
}

/// The pseudo-path of the package itself, used as the source of
/// package-level relationships.
pub const PACKAGE_PATH: &str = "/";

/// The path of the content-types part, always present in a well-formed package.
pub const CONTENT_TYPES_PATH: &str = "/[Content_Types].xml";

/// The path of the package-level relationships part.
pub const ROOT_RELS_PATH: &str = "/_rels/.rels";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_leading_slash() {
        assert_eq!(PartPath::new("word/document.xml").as_str(), "/word/document.xml");
        assert_eq!(PartPath::new("/word/document.xml").as_str(), "/word/document.xml");
    }

    #[test]
    fn base_dir_and_filename() {
        let p = PartPath::new("ppt/slides/slide1.xml");
        assert_eq!(p.base_dir(), "/ppt/slides");
        assert_eq!(p.filename(), "slide1.xml");
        assert_eq!(p.ext(), "xml");
    }

    #[test]
    fn base_dir_of_root_level_part() {
        let p = PartPath::new("presentation.xml");
        assert_eq!(p.base_dir(), "/");
    }

    #[test]
    fn rels_path_nested() {
        let p = PartPath::new("ppt/slides/slide1.xml");
        assert_eq!(p.rels_path().as_str(), "/ppt/slides/_rels/slide1.xml.rels");
    }

    #[test]
    fn rels_path_root_level() {
        let p = PartPath::new("presentation.xml");
        assert_eq!(p.rels_path().as_str(), "/_rels/presentation.xml.rels");
    }

    #[test]
    fn from_rel_ref_resolves_dotdot() {
        let resolved = PartPath::from_rel_ref("/ppt/slides", "../media/image1.png");
        assert_eq!(resolved.as_str(), "/ppt/media/image1.png");
    }

    #[test]
    fn membername_strips_slash() {
        assert_eq!(PartPath::new("word/document.xml").membername(), "word/document.xml");
    }

    #[test]
    fn rels_owner_is_inverse_of_rels_path() {
        let p = PartPath::new("ppt/slides/slide1.xml");
        assert_eq!(p.rels_path().rels_owner(), Some(p));
    }

    #[test]
    fn rels_owner_of_root_rels() {
        assert_eq!(PartPath::new(ROOT_RELS_PATH).rels_owner(), Some(PartPath::new(PACKAGE_PATH)));
    }

    #[test]
    fn rels_owner_none_for_non_rels_path() {
        assert_eq!(PartPath::new("word/document.xml").rels_owner(), None);
    }
}
