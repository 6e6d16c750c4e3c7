/// Error types for OPC package operations.
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OpcError {
    #[error("malformed ZIP archive: {0}")]
    MalformedArchive(String),

    #[error("ZIP error: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("corrupt central directory: {0}")]
    CorruptCentralDirectory(String),

    #[error("missing or ambiguous part content for '{0}'")]
    MissingPartContent(String),

    #[error("missing format main part for kind '{0}'")]
    MissingMainPart(String),

    #[error("compression failure: {0}")]
    CompressionFailure(String),

    #[error("missing [Content_Types].xml")]
    MissingContentTypes,

    #[error("invalid [Content_Types].xml: {0}")]
    InvalidContentTypes(String),

    #[error("invalid part path: {0}")]
    InvalidPath(String),

    #[error("part not found: {0}")]
    PartNotFound(String),

    #[error("relationship not found: {0}")]
    RelationshipNotFound(String),

    #[error("invalid relationship: {0}")]
    InvalidRelationship(String),

    #[error("malformed relationships part: {0}")]
    MalformedRels(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("XML error: {0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("UTF-8 conversion error: {0}")]
    Utf8Error(#[from] std::str::Utf8Error),

    #[error("attribute error: {0}")]
    AttrError(String),
}

impl From<quick_xml::events::attributes::AttrError> for OpcError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        OpcError::AttrError(err.to_string())
    }
}

impl OpcError {
    /// Stable error code per the service's error taxonomy (`spec.md` §7).
    pub fn code(&self) -> &'static str {
        match self {
            OpcError::MalformedArchive(_) | OpcError::ZipError(_) | OpcError::IoError(_) => "C001",
            OpcError::PartNotFound(_) | OpcError::MissingPartContent(_) => "C002",
            OpcError::XmlError(_) | OpcError::Utf8Error(_) | OpcError::AttrError(_) => "C003",
            OpcError::CorruptCentralDirectory(_) => "C004",
            OpcError::MissingMainPart(_) => "C005",
            OpcError::CompressionFailure(_) => "C006",
            OpcError::MissingContentTypes | OpcError::InvalidContentTypes(_) => "C008",
            OpcError::RelationshipNotFound(_)
            | OpcError::InvalidRelationship(_)
            | OpcError::MalformedRels(_)
            | OpcError::InvalidPath(_) => "C009",
        }
    }
}

pub type Result<T> = std::result::Result<T, OpcError>;
