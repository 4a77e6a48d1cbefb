//! Email to PDF: header lines, body text, then attachment pages.

use tracing::info;

use crate::config::Config;
use crate::convert::{Conversion, ConversionReport};
use crate::error::Result;
use crate::model::story::Story;
use crate::parser::body::assemble_body;
use crate::parser::eml::parse_message;
use crate::parser::header::assemble_headers;
use crate::render::compose::compose_message;

/// Convert a raw RFC 5322 message.
///
/// The encoding shared by the header fields, if there is exactly one, is
/// tried first for the body; the configured fallback encodings follow.
pub fn eml_to_pdf(raw: &[u8], config: &Config) -> Result<Conversion> {
    let message = parse_message(raw)?;

    let headers = assemble_headers(&message);
    let mut story: Story = headers.paragraphs().collect();
    story.extend(assemble_body(
        &message,
        headers.encoding.as_deref(),
        &config.decoding.fallback_encodings,
    ));

    let (pdf, stats) = compose_message(&message, &story, &config.layout)?;

    let report = ConversionReport {
        paragraphs: story.len(),
        body_pages: stats.body_pages,
        attachment_pages: stats.attachment_pages,
        image_pages: stats.image_pages,
        skipped_parts: stats.skipped_parts,
        header_encoding: headers.encoding,
        output_bytes: pdf.len(),
    };
    info!(
        paragraphs = report.paragraphs,
        pages = report.total_pages(),
        skipped = report.skipped_parts,
        "Converted message"
    );
    Ok(Conversion { pdf, report })
}
