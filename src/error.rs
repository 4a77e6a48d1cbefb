//! Centralized error types for mailpdf.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the mailpdf library.
///
/// A payload that cannot be decoded in any candidate encoding is *not* an
/// error; see [`crate::parser::payload::decode_payload`].
#[derive(Error, Debug)]
pub enum ConvertError {
    /// I/O error with the associated file path.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The specified input file does not exist.
    #[error("Input file not found: {0}")]
    FileNotFound(PathBuf),

    /// The email message could not be parsed.
    #[error("Malformed email message: {0}")]
    Mail(String),

    /// A PDF could not be read or written.
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// A PDF was readable but unusable (no pages, missing page tree, bad MediaBox).
    #[error("Invalid PDF: {0}")]
    InvalidPdf(String),

    /// An image attachment could not be decoded.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// The text converter input is not valid UTF-8.
    #[error("Input is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
}

/// Convenience alias for `Result<T, ConvertError>`.
pub type Result<T> = std::result::Result<T, ConvertError>;

impl ConvertError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<mailparse::MailParseError> for ConvertError {
    fn from(source: mailparse::MailParseError) -> Self {
        Self::Mail(source.to_string())
    }
}

/// Allow `?` on `std::io::Error` when no path context is available
/// (rare, prefer `ConvertError::io`).
impl From<std::io::Error> for ConvertError {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            path: PathBuf::from("<unknown>"),
            source,
        }
    }
}
