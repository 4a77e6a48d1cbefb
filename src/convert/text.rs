//! Plain text to PDF: one paragraph per line on A4.

use crate::config::Config;
use crate::convert::{Conversion, ConversionReport};
use crate::error::Result;
use crate::model::story::Story;
use crate::render::layout::{layout_story, PageSize};
use crate::render::pdf::render_pages;

/// Render UTF-8 `raw` text. Invalid UTF-8 is an error; there is no
/// encoding fallback here.
pub fn txt_to_pdf(raw: &[u8], config: &Config) -> Result<Conversion> {
    let text = std::str::from_utf8(raw)?;
    let story = Story::from_lines(text);
    let pages = layout_story(&story, PageSize::A4, &config.layout);
    let pdf = render_pages(&pages, PageSize::A4, config.layout.font_size)?;

    let report = ConversionReport {
        paragraphs: story.len(),
        body_pages: pages.len(),
        output_bytes: pdf.len(),
        ..ConversionReport::default()
    };
    Ok(Conversion { pdf, report })
}
