/// Open Packaging Conventions (OPC) implementation.
///
/// This module provides the archive codec, data model, and content-type /
/// relationship maintenance for Office Open XML packages (PPTX/DOCX/XLSX):
///
/// - `path`: canonical part paths
/// - `constants`: content-type and relationship-type strings
/// - `error`: the C001-C009 error taxonomy
/// - `rel`: relationships and the `.rels` wire format
/// - `part`, `document`: the in-memory Part Store
/// - `content_types`: `[Content_Types].xml` maintenance and rename/remove cascades
/// - `archive`: ZIP byte stream <-> Document codec
pub mod archive;
pub mod constants;
pub mod content_types;
pub mod document;
pub mod error;
pub mod part;
pub mod path;
pub mod rel;

pub use archive::{decode, encode};
pub use content_types::ContentTypes;
pub use document::{Document, Kind};
pub use error::{OpcError, Result};
pub use part::{Part, PartContent};
pub use path::PartPath;
pub use rel::{Relationship, Relationships};
