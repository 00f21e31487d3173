//! Error types for the converter.
//!
//! Uses the dual-error pattern: `ConverterError` for library consumers
//! with file context, and `ExtractError` for the structure-only failures
//! of the field extractor, which never sees a path.

use std::path::PathBuf;

use thiserror::Error;

/// Structural failure while extracting fields from a parsed document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    /// Root element is not a QTI assessment item.
    #[error("Root element is <{found}>, expected <assessmentItem> in the QTI 2.1 namespace")]
    UnexpectedRoot { found: String },

    /// A required element is absent at its expected path.
    #[error("Missing required element: {path}")]
    MissingElement { path: String },
}

/// Main error type for the converter library.
#[derive(Debug, Error)]
pub enum ConverterError {
    /// File could not be read.
    #[error("Failed to read {}: {source}", .path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// XML parsing failed after markup recovery.
    #[error("XML parsing failed for {}: {source}", .path.display())]
    XmlParse {
        path: PathBuf,
        #[source]
        source: roxmltree::Error,
    },

    /// Markup needed more repairs than the recovery budget allows.
    #[error("Malformed markup in {}: {repairs} repairs needed, at most {limit} allowed", .path.display())]
    MalformedMarkup {
        path: PathBuf,
        repairs: usize,
        limit: usize,
    },

    /// Structural extraction failed for a file.
    #[error("{}: {source}", .file.display())]
    Extraction {
        file: PathBuf,
        #[source]
        source: ExtractError,
    },

    /// File or directory name does not carry the expected numeric prefix.
    #[error("Cannot order '{name}': expected a name like {expected}")]
    NamingConvention { name: String, expected: &'static str },

    /// A row does not match the published column schema.
    #[error("Row has {found} cells, the column schema has {expected}")]
    SchemaViolation { expected: usize, found: usize },

    /// The input root contains no chapter directories.
    #[error("No chapter directories found in {}", .root.display())]
    NoChapters { root: PathBuf },

    /// A run under skip-and-continue finished with skipped items.
    #[error("{failures} item(s) could not be converted")]
    Incomplete { failures: usize },

    /// Invalid user input (paths, options).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Workbook generation failed.
    #[error("Workbook generation failed: {0}")]
    Workbook(#[from] rust_xlsxwriter::XlsxError),

    /// JSON serialization error.
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConverterError {
    /// Path of the file or directory the error is about, if any.
    #[must_use]
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Self::ReadFile { path, .. }
            | Self::XmlParse { path, .. }
            | Self::MalformedMarkup { path, .. } => Some(path),
            Self::Extraction { file, .. } => Some(file),
            Self::NoChapters { root } => Some(root),
            _ => None,
        }
    }
}

/// Result type alias for converter operations.
pub type Result<T> = std::result::Result<T, ConverterError>;
