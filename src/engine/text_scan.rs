//! The Text Scanner (C5): scoped literal/regex search-replace over XML
//! part text, abstracted out of the Operation Engine so it is reusable.
//!
//! Grounded on `yingkitw-pptx-rs`'s use of `regex` for slide text
//! replacement — the closest pack example of text-replace-in-OOXML.
//! All offsets are byte offsets on the UTF-8 text; no XML node identity
//! is involved.

use regex::Regex;

use crate::opc::document::Document;
use crate::opc::part::PartContent;
use crate::opc::path::PartPath;

use super::operation::EngineError;

/// A compiled `find` pattern: either a literal substring or a regex.
#[derive(Debug)]
pub enum Pattern {
    Literal(String),
    Regex(Regex),
}

/// One match location within a part's text.
pub struct ScanMatch {
    pub path: PartPath,
    pub start: usize,
    pub end: usize,
}

/// Compile `find` per `regex`, validating `replace` against the pattern's
/// capture groups when compiled as a regex.
///
/// Fails `V042` if the pattern doesn't compile, `V041` if `replace`
/// references a capture group the pattern doesn't have.
pub fn compile(find: &str, replace: &str, regex: bool) -> Result<Pattern, EngineError> {
    if !regex {
        return Ok(Pattern::Literal(find.to_string()));
    }
    let compiled = Regex::new(find).map_err(|e| EngineError::RegexCompile(e.to_string()))?;
    validate_replacement(replace, compiled.captures_len())?;
    Ok(Pattern::Regex(compiled))
}

/// Check every `$N` / `${N}` backreference in `replace` against the
/// pattern's group count (group 0 is the whole match, always valid).
fn validate_replacement(replace: &str, group_count: usize) -> Result<(), EngineError> {
    let bytes = replace.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'$' && i + 1 < bytes.len() {
            let rest = &replace[i + 1..];
            let (digits, braced) = if let Some(stripped) = rest.strip_prefix('{') {
                (stripped.split('}').next().unwrap_or(""), true)
            } else {
                (rest, false)
            };
            let numeric: String = digits.chars().take_while(|c| c.is_ascii_digit()).collect();
            if !numeric.is_empty() {
                let n: usize = numeric.parse().unwrap_or(usize::MAX);
                if n >= group_count {
                    return Err(EngineError::BadReplacement(format!(
                        "replacement references capture group {n}, pattern has {group_count}"
                    )));
                }
                i += 1 + numeric.len() + if braced { 2 } else { 0 };
                continue;
            }
        }
        i += 1;
    }
    Ok(())
}

/// Find every match of `pattern` within `scope` (a path-prefix filter;
/// empty matches every XML part).
pub fn scan(doc: &Document, scope: &str, pattern: &Pattern) -> Vec<ScanMatch> {
    let mut matches = Vec::new();
    for part in doc.list(Some(scope)) {
        let PartContent::Xml(text) = part.content() else { continue };
        match pattern {
            Pattern::Literal(needle) if !needle.is_empty() => {
                let mut start = 0;
                while let Some(pos) = text[start..].find(needle.as_str()) {
                    let abs = start + pos;
                    matches.push(ScanMatch { path: part.path().clone(), start: abs, end: abs + needle.len() });
                    start = abs + needle.len();
                }
            },
            Pattern::Literal(_) => {},
            Pattern::Regex(re) => {
                for m in re.find_iter(text) {
                    matches.push(ScanMatch { path: part.path().clone(), start: m.start(), end: m.end() });
                }
            },
        }
    }
    matches
}

/// Replace matches of `pattern` within `scope` with `replace`. Sets the
/// modification flag only on parts whose text actually changed. When
/// `global` is false, only the first match per part is replaced (the
/// `flags` field omitting `g`). Returns the total replacement count.
pub fn rewrite(doc: &mut Document, scope: &str, pattern: &Pattern, replace: &str, global: bool) -> usize {
    let paths: Vec<PartPath> = doc.list(Some(scope)).iter().map(|p| p.path().clone()).collect();
    let mut total = 0;

    for path in paths {
        let Some(part) = doc.get_mut(&path) else { continue };
        let PartContent::Xml(text) = part.content() else { continue };

        let (rewritten, count) = match pattern {
            Pattern::Literal(needle) if !needle.is_empty() => {
                if global {
                    let count = text.matches(needle.as_str()).count();
                    (text.replace(needle.as_str(), replace), count)
                } else {
                    let count = usize::from(text.contains(needle.as_str()));
                    (text.replacen(needle.as_str(), replace, 1), count)
                }
            },
            Pattern::Literal(_) => (text.clone(), 0),
            Pattern::Regex(re) => {
                if global {
                    let count = re.find_iter(text).count();
                    (re.replace_all(text, replace).into_owned(), count)
                } else {
                    let count = usize::from(re.is_match(text));
                    (re.replace(text, replace).into_owned(), count)
                }
            },
        };

        if count > 0 && rewritten != *text {
            part.set_content(PartContent::Xml(rewritten));
            total += count;
        }
    }

    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opc::document::Kind;
    use crate::opc::part::Part;

    fn doc_with(path: &str, xml: &str) -> Document {
        let mut doc = Document::empty(Kind::Pptx);
        doc.put(Part::new(PartPath::new(path), "application/xml".to_string(), PartContent::Xml(xml.to_string())));
        doc
    }

    #[test]
    fn literal_rewrite_counts_replacements() {
        let mut doc = doc_with("ppt/slides/slide1.xml", "<a>ACME Corp and ACME Corp</a>");
        let pattern = compile("ACME Corp", "DeltaQuad Inc", false).unwrap();
        let count = rewrite(&mut doc, "ppt/slides/", &pattern, "DeltaQuad Inc", true);
        assert_eq!(count, 2);
        let PartContent::Xml(text) = doc.get(&PartPath::new("ppt/slides/slide1.xml")).unwrap().content() else {
            panic!("expected xml")
        };
        assert_eq!(text, "<a>DeltaQuad Inc and DeltaQuad Inc</a>");
    }

    #[test]
    fn find_equals_replace_is_noop() {
        let mut doc = doc_with("ppt/slides/slide1.xml", "<a>same</a>");
        let pattern = compile("same", "same", false).unwrap();
        rewrite(&mut doc, "", &pattern, "same", true);
        assert!(!doc.get(&PartPath::new("ppt/slides/slide1.xml")).unwrap().is_modified());
    }

    #[test]
    fn regex_rewrite_supports_capture_groups() {
        let mut doc = doc_with("word/document.xml", "<a>2024-01-01</a>");
        let pattern = compile(r"(\d{4})-(\d{2})-(\d{2})", "$3/$2/$1", true).unwrap();
        let count = rewrite(&mut doc, "", &pattern, "$3/$2/$1", true);
        assert_eq!(count, 1);
        let PartContent::Xml(text) = doc.get(&PartPath::new("word/document.xml")).unwrap().content() else {
            panic!("expected xml")
        };
        assert_eq!(text, "<a>01/01/2024</a>");
    }

    #[test]
    fn compile_rejects_unknown_capture_group() {
        let err = compile(r"(\d+)", "$5", true).unwrap_err();
        assert!(matches!(err, EngineError::BadReplacement(_)));
    }

    #[test]
    fn compile_rejects_invalid_regex() {
        let err = compile(r"(unclosed", "x", true).unwrap_err();
        assert!(matches!(err, EngineError::RegexCompile(_)));
    }

    #[test]
    fn scan_never_descends_into_binary_parts() {
        let mut doc = Document::empty(Kind::Pptx);
        doc.put(Part::new(
            PartPath::new("ppt/media/image1.png"),
            "image/png".to_string(),
            PartContent::Binary(b"ACME Corp".to_vec()),
        ));
        let pattern = compile("ACME Corp", "x", false).unwrap();
        assert!(scan(&doc, "", &pattern).is_empty());
    }
}
