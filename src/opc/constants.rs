//! Constant values related to the Open Packaging Convention.
//!
//! This module contains content type URIs (like MIME-types) that specify a part's format,
//! and relationship types used in OPC packages.

/// Content type URIs (like MIME-types) that specify a part's format
pub mod content_type {
    // Image content types
    pub const BMP: &str = "image/bmp";
    pub const GIF: &str = "image/gif";
    pub const JPEG: &str = "image/jpeg";
    pub const PNG: &str = "image/png";
    pub const TIFF: &str = "image/tiff";
    pub const X_EMF: &str = "image/x-emf";
    pub const X_WMF: &str = "image/x-wmf";

    // Office common content types
    pub const OFC_CUSTOM_PROPERTIES: &str =
        "application/vnd.openxmlformats-officedocument.custom-properties+xml";
    pub const OFC_EXTENDED_PROPERTIES: &str =
        "application/vnd.openxmlformats-officedocument.extended-properties+xml";
    pub const OFC_THEME: &str = "application/vnd.openxmlformats-officedocument.theme+xml";

    // OPC core content types
    pub const OPC_CORE_PROPERTIES: &str =
        "application/vnd.openxmlformats-package.core-properties+xml";
    pub const OPC_RELATIONSHIPS: &str = "application/vnd.openxmlformats-package.relationships+xml";

    // WordprocessingML content types
    pub const WML_COMMENTS: &str =
        "application/vnd.openxmlformats-officedocument.wordprocessingml.comments+xml";
    pub const WML_DOCUMENT_MAIN: &str =
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";
    pub const WML_FOOTER: &str =
        "application/vnd.openxmlformats-officedocument.wordprocessingml.footer+xml";
    pub const WML_HEADER: &str =
        "application/vnd.openxmlformats-officedocument.wordprocessingml.header+xml";
    pub const WML_SETTINGS: &str =
        "application/vnd.openxmlformats-officedocument.wordprocessingml.settings+xml";
    pub const WML_STYLES: &str =
        "application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml";

    // SpreadsheetML content types
    pub const SML_SHEET_MAIN: &str =
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml";
    pub const SML_WORKSHEET: &str =
        "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml";
    pub const SML_STYLES: &str =
        "application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml";
    pub const SML_SHARED_STRINGS: &str =
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml";

    // PresentationML content types
    pub const PML_PRESENTATION_MAIN: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml";
    pub const PML_SLIDE: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";
    pub const PML_SLIDE_LAYOUT: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml";
    pub const PML_SLIDE_MASTER: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml";

    // Generic XML
    pub const XML: &str = "application/xml";
}

/// Open XML relationship target modes
pub mod target_mode {
    /// Internal relationship target mode (default)
    pub const INTERNAL: &str = "Internal";

    /// External relationship target mode (e.g., hyperlinks to external URLs)
    pub const EXTERNAL: &str = "External";
}

/// Relationship type URIs used in OPC packages
pub mod relationship_type {
    // Core relationships
    pub const CORE_PROPERTIES: &str =
        "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";
    pub const EXTENDED_PROPERTIES: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties";
    pub const CUSTOM_PROPERTIES: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/custom-properties";

    // Office document
    pub const OFFICE_DOCUMENT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";

    // Images and media
    pub const IMAGE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

    // Theme
    pub const THEME: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";

    // External links
    pub const HYPERLINK: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink";

    /// Generic relationship type used for newly upserted parts with no
    /// closer-matching type (custom XML, arbitrary attachments).
    pub const GENERIC_PACKAGE_PART: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/package";
}

/// Default extension -> content-type mappings always present in
/// `[Content_Types].xml`, independent of document kind.
pub const DEFAULT_EXTENSIONS: &[(&str, &str)] = &[
    ("rels", content_type::OPC_RELATIONSHIPS),
    ("xml", content_type::XML),
    ("png", content_type::PNG),
    ("jpg", content_type::JPEG),
    ("jpeg", content_type::JPEG),
    ("gif", content_type::GIF),
    ("bmp", content_type::BMP),
    ("tiff", content_type::TIFF),
    ("emf", content_type::X_EMF),
    ("wmf", content_type::X_WMF),
];

/// The document kind's main part content type, keyed by `kind`.
pub const MAIN_PART_CONTENT_TYPE: &[(&str, &str)] = &[
    ("pptx", content_type::PML_PRESENTATION_MAIN),
    ("docx", content_type::WML_DOCUMENT_MAIN),
    ("xlsx", content_type::SML_SHEET_MAIN),
];

/// Infer a content type from an OOXML part's directory/name pattern, the
/// way `[Content_Types].xml` Override entries are conventionally assigned
/// by Office itself. Returns `None` if no pattern matches, in which case
/// the caller must supply an explicit content type.
pub fn infer_from_path(path: &str) -> Option<&'static str> {
    let path = path.trim_start_matches('/');
    if !path.ends_with(".xml") {
        return None;
    }
    let patterns: &[(&str, &str)] = &[
        ("ppt/slides/slide", content_type::PML_SLIDE),
        ("ppt/slideLayouts/slideLayout", content_type::PML_SLIDE_LAYOUT),
        ("ppt/slideMasters/slideMaster", content_type::PML_SLIDE_MASTER),
        ("ppt/presentation.xml", content_type::PML_PRESENTATION_MAIN),
        ("ppt/theme/theme", content_type::OFC_THEME),
        ("word/document.xml", content_type::WML_DOCUMENT_MAIN),
        ("word/styles.xml", content_type::WML_STYLES),
        ("word/settings.xml", content_type::WML_SETTINGS),
        ("word/comments.xml", content_type::WML_COMMENTS),
        ("word/header", content_type::WML_HEADER),
        ("word/footer", content_type::WML_FOOTER),
        ("xl/workbook.xml", content_type::SML_SHEET_MAIN),
        ("xl/worksheets/sheet", content_type::SML_WORKSHEET),
        ("xl/styles.xml", content_type::SML_STYLES),
        ("xl/sharedStrings.xml", content_type::SML_SHARED_STRINGS),
        ("docProps/core.xml", content_type::OPC_CORE_PROPERTIES),
        ("docProps/app.xml", content_type::OFC_EXTENDED_PROPERTIES),
        ("docProps/custom.xml", content_type::OFC_CUSTOM_PROPERTIES),
    ];
    patterns
        .iter()
        .find(|(prefix, _)| path.starts_with(prefix))
        .map(|(_, ct)| *ct)
}
