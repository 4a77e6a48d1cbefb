//! Conversion entry points: bytes in, PDF bytes and a report out.
//!
//! The converters work on in-memory buffers. [`convert_file`] adds the file
//! I/O around them and only writes the output once conversion succeeded.

pub mod eml;
pub mod text;

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::Config;
use crate::error::{ConvertError, Result};

/// Supported input formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    /// An RFC 5322 message, rendered on US Letter with its attachments.
    Eml,
    /// UTF-8 plain text, rendered on A4.
    Text,
}

/// A finished PDF and what went into it.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub pdf: Vec<u8>,
    pub report: ConversionReport,
}

/// Summary of one conversion, printed by the CLI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConversionReport {
    /// Paragraphs rendered (header lines included).
    pub paragraphs: usize,
    /// Pages holding the rendered text.
    pub body_pages: usize,
    /// Pages copied from PDF attachments.
    pub attachment_pages: usize,
    /// One page per image attachment.
    pub image_pages: usize,
    /// Attachments of an unsupported type.
    pub skipped_parts: usize,
    /// Encoding shared by all encoded header fields, if there was exactly one.
    pub header_encoding: Option<String>,
    /// Size of the PDF in bytes.
    pub output_bytes: usize,
}

impl ConversionReport {
    pub fn total_pages(&self) -> usize {
        self.body_pages + self.attachment_pages + self.image_pages
    }
}

/// Convert `input` to a PDF at `output`.
pub fn convert_file(
    format: InputFormat,
    input: &Path,
    output: &Path,
    config: &Config,
) -> Result<ConversionReport> {
    let raw = read_input(input)?;
    let conversion = match format {
        InputFormat::Eml => eml::eml_to_pdf(&raw, config)?,
        InputFormat::Text => text::txt_to_pdf(&raw, config)?,
    };

    std::fs::write(output, &conversion.pdf).map_err(|e| ConvertError::io(output, e))?;
    tracing::info!(
        input = %input.display(),
        output = %output.display(),
        pages = conversion.report.total_pages(),
        bytes = conversion.report.output_bytes,
        "Wrote PDF"
    );
    Ok(conversion.report)
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ConvertError::FileNotFound(PathBuf::from(path)),
        _ => ConvertError::io(path, e),
    })
}
