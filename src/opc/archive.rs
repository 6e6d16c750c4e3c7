//! The Archive Codec (C1): ZIP byte stream <-> [`Document`].
//!
//! Grounded on the teacher's `phys_pkg::{PhysPkgReader, PhysPkgWriter}`
//! (direct `zip::ZipArchive`/`ZipWriter` usage) and `pkgwriter`'s write
//! ordering (content types, then rels, then parts). Diverges from the
//! teacher's `PackageReader`, which only loads parts reachable by walking
//! the relationship graph outward from the package root: `decode` here
//! reads every archive entry unconditionally, per §4.1.

use std::collections::HashMap;
use std::io::{Cursor, Read, Write};

use zip::write::SimpleFileOptions;
use zip::{DateTime, ZipArchive, ZipWriter};

use crate::opc::content_types::ContentTypes;
use crate::opc::document::Document;
use crate::opc::error::{OpcError, Result};
use crate::opc::part::{Part, PartContent};
use crate::opc::path::{PartPath, CONTENT_TYPES_PATH};
use crate::opc::rel::Relationships;

/// Fixed timestamp written for every entry (§6.4): 1980-01-01 00:00:00,
/// the DOS epoch and the earliest datetime the ZIP format can represent.
fn fixed_mtime() -> DateTime {
    DateTime::from_date_and_time(1980, 1, 1, 0, 0, 0).expect("1980-01-01 is a valid ZIP datetime")
}

/// True for parts the codec decodes as UTF-8 XML text rather than opaque
/// binary: extension `.xml`/`.rels`, or the exact `[Content_Types].xml` path.
fn is_xml_member(membername: &str) -> bool {
    membername.ends_with(".xml") || membername.ends_with(".rels")
}

/// Read every archive entry into a [`Document`] and its [`ContentTypes`].
pub fn decode(bytes: &[u8]) -> Result<(Document, ContentTypes)> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(|e| match e {
        zip::result::ZipError::InvalidArchive(msg) => OpcError::CorruptCentralDirectory(msg.to_string()),
        other => OpcError::MalformedArchive(other.to_string()),
    })?;

    let mut raw: Vec<(String, Vec<u8>)> = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let mut buf = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut buf)?;
        raw.push((entry.name().to_string(), buf));
    }

    let content_types_xml = raw
        .iter()
        .find(|(name, _)| name == CONTENT_TYPES_PATH.trim_start_matches('/'))
        .map(|(_, blob)| blob)
        .ok_or(OpcError::MissingContentTypes)?;
    let content_types = ContentTypes::parse(
        std::str::from_utf8(content_types_xml).map_err(OpcError::Utf8Error)?,
    )?;

    let mut parts = Vec::with_capacity(raw.len());
    let mut rels: HashMap<PartPath, Relationships> = HashMap::new();

    for (membername, blob) in raw {
        let path = PartPath::new(membername.clone());

        if let Some(owner) = path.rels_owner() {
            let text = String::from_utf8(blob.clone()).map_err(|e| OpcError::Utf8Error(e.utf8_error()))?;
            rels.insert(owner, parse_rels_xml(&text, &path)?);
        }

        let content_type =
            content_types.get(&path).map(str::to_string).unwrap_or_else(|| "application/xml".to_string());

        let content = if is_xml_member(&membername) {
            PartContent::Xml(String::from_utf8(blob).map_err(|e| OpcError::Utf8Error(e.utf8_error()))?)
        } else {
            PartContent::Binary(blob)
        };

        parts.push(Part::new(path, content_type, content));
    }

    let doc = Document::new(parts, rels);
    if doc.main_part_path().is_err() && matches!(doc.kind(), crate::opc::document::Kind::Generic) {
        // A generic document (no officeDocument relationship) is valid;
        // only pptx/docx/xlsx require a resolvable main part, and kind
        // detection already fell back to Generic if none was found.
    }
    Ok((doc, content_types))
}

fn parse_rels_xml(xml: &str, rels_path: &PartPath) -> Result<Relationships> {
    use quick_xml::events::Event;
    use quick_xml::Reader;

    let base_dir = rels_path.rels_owner().map(|p| p.base_dir().to_string()).unwrap_or_else(|| "/".to_string());
    let mut rels = Relationships::new(base_dir);
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"Relationship" => {
                let mut id = None;
                let mut reltype = None;
                let mut target = None;
                let mut external = false;
                for attr in e.attributes() {
                    let attr = attr?;
                    match attr.key.as_ref() {
                        b"Id" => id = Some(attr.unescape_value()?.to_string()),
                        b"Type" => reltype = Some(attr.unescape_value()?.to_string()),
                        b"Target" => target = Some(attr.unescape_value()?.to_string()),
                        b"TargetMode" => {
                            external = attr.unescape_value()?.as_ref() == crate::opc::constants::target_mode::EXTERNAL
                        },
                        _ => {},
                    }
                }
                if let (Some(id), Some(reltype), Some(target)) = (id, reltype, target) {
                    rels.add_relationship(reltype, target, id, external);
                }
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(OpcError::XmlError(e)),
            _ => {},
        }
        buf.clear();
    }

    Ok(rels)
}

/// Write every Part to a ZIP byte stream, deterministically ordered:
/// `[Content_Types].xml`, then `.rels` parts, then the remaining parts
/// lexicographically by path.
pub fn encode(doc: &Document, content_types: &ContentTypes) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    {
        let mut writer = ZipWriter::new(&mut buf);
        let options = SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated)
            .last_modified_time(fixed_mtime())
            .unix_permissions(0);

        write_entry(&mut writer, options, CONTENT_TYPES_PATH, content_types.to_xml().as_bytes())?;

        let root_rels_xml = doc.package_rels().to_xml();
        write_entry(&mut writer, options, crate::opc::path::ROOT_RELS_PATH, root_rels_xml.as_bytes())?;

        let mut rels_sources: Vec<&PartPath> =
            doc.iter_rels().map(|(p, _)| p).filter(|p| p.as_str() != crate::opc::path::PACKAGE_PATH).collect();
        rels_sources.sort();
        for source in rels_sources {
            let rels = doc.rels_for(source).expect("source came from iter_rels");
            if rels.is_empty() {
                continue;
            }
            write_entry(&mut writer, options, source.rels_path().as_str(), rels.to_xml().as_bytes())?;
        }

        let mut parts: Vec<_> = doc
            .list(None)
            .into_iter()
            .filter(|p| p.path().as_str() != CONTENT_TYPES_PATH && p.path().rels_owner().is_none())
            .collect();
        parts.sort_by(|a, b| a.path().cmp(b.path()));
        for part in parts {
            write_entry(&mut writer, options, part.path().as_str(), part.content().as_bytes())?;
        }

        writer.finish().map_err(|e| OpcError::CompressionFailure(e.to_string()))?;
    }
    Ok(buf.into_inner())
}

fn write_entry<W: Write + std::io::Seek>(
    writer: &mut ZipWriter<W>,
    options: SimpleFileOptions,
    path: &str,
    content: &[u8],
) -> Result<()> {
    writer.start_file(path.trim_start_matches('/'), options)?;
    writer.write_all(content).map_err(OpcError::IoError)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_pptx_bytes() -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut writer = ZipWriter::new(&mut buf);
            let options = SimpleFileOptions::default();

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
            writer.write_all(b"<presentation/>").unwrap();

            writer.finish().unwrap();
        }
        buf.into_inner()
    }

    #[test]
    fn decode_reads_every_entry() {
        let bytes = minimal_pptx_bytes();
        let (doc, _ct) = decode(&bytes).unwrap();
        assert_eq!(doc.len(), 3);
        assert_eq!(doc.kind(), crate::opc::document::Kind::Pptx);
    }

    #[test]
    fn decode_fails_without_content_types() {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut writer = ZipWriter::new(&mut buf);
            writer.start_file("word/document.xml", SimpleFileOptions::default()).unwrap();
            writer.write_all(b"<document/>").unwrap();
            writer.finish().unwrap();
        }
        let err = decode(&buf.into_inner()).unwrap_err();
        assert_eq!(err.code(), "C008");
    }

    #[test]
    fn decode_preserves_zip_entry_order() {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut writer = ZipWriter::new(&mut buf);
            let options = SimpleFileOptions::default();

            writer.start_file("[Content_Types].xml", options).unwrap();
            writer.write_all(br#"<?xml version="1.0"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
</Types>"#).unwrap();

            writer.start_file("_rels/.rels", options).unwrap();
            writer.write_all(br#"<?xml version="1.0"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"/>"#).unwrap();

            writer.start_file("ppt/slides/slide3.xml", options).unwrap();
            writer.write_all(b"<s3/>").unwrap();
            writer.start_file("ppt/slides/slide1.xml", options).unwrap();
            writer.write_all(b"<s1/>").unwrap();
            writer.start_file("ppt/slides/slide2.xml", options).unwrap();
            writer.write_all(b"<s2/>").unwrap();

            writer.finish().unwrap();
        }
        let bytes = buf.into_inner();

        let (doc1, _) = decode(&bytes).unwrap();
        let order1: Vec<String> = doc1.list(None).into_iter().map(|p| p.path().as_str().to_string()).collect();

        let (doc2, _) = decode(&bytes).unwrap();
        let order2: Vec<String> = doc2.list(None).into_iter().map(|p| p.path().as_str().to_string()).collect();

        assert_eq!(order1, order2);
        let slide_pos: Vec<&String> = order1.iter().filter(|p| p.contains("slide")).collect();
        assert_eq!(slide_pos, vec!["/ppt/slides/slide3.xml", "/ppt/slides/slide1.xml", "/ppt/slides/slide2.xml"]);
    }

    #[test]
    fn decode_then_encode_preserves_parts() {
        let bytes = minimal_pptx_bytes();
        let (doc, ct) = decode(&bytes).unwrap();
        let encoded = encode(&doc, &ct).unwrap();
        let (doc2, _) = decode(&encoded).unwrap();
        assert_eq!(doc2.len(), doc.len());
        assert_eq!(doc2.kind(), doc.kind());
        assert!(doc2.get(&PartPath::new("ppt/presentation.xml")).is_some());
    }
}
