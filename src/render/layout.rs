//! Flowing a [`Story`] onto fixed-size pages.
//!
//! Text is set in the built-in Helvetica font with WinAnsi encoding, so
//! lines are stored as WinAnsi bytes ready for a PDF content stream.

use crate::config::LayoutConfig;
use crate::model::story::Story;

/// Page dimensions in PDF points (1/72 inch).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    /// US Letter, 8.5 × 11 in.
    pub const LETTER: Self = Self {
        width: 612.0,
        height: 792.0,
    };

    /// ISO A4, 210 × 297 mm.
    pub const A4: Self = Self {
        width: 595.2756,
        height: 841.8898,
    };
}

/// A line of text placed at an absolute baseline position.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub x: f32,
    pub y: f32,
    /// WinAnsi-encoded text.
    pub text: Vec<u8>,
}

/// The lines that fit on one page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LaidOutPage {
    pub lines: Vec<PlacedLine>,
}

/// Lay out every paragraph of `story`, breaking onto new pages as needed.
///
/// Always returns at least one page. Empty paragraphs produce no text but
/// still take one line of vertical space.
pub fn layout_story(story: &Story, page: PageSize, cfg: &LayoutConfig) -> Vec<LaidOutPage> {
    let inset = cfg.margin + cfg.padding;
    let frame_width = (page.width - 2.0 * inset).max(cfg.font_size);
    let first_baseline = page.height - inset - cfg.font_size;
    let bottom = inset;

    let mut pages = Vec::new();
    let mut current = LaidOutPage::default();
    let mut y = first_baseline;

    for paragraph in story.paragraphs() {
        for line in wrap_paragraph(&paragraph.text, frame_width, cfg.font_size) {
            if y < bottom {
                pages.push(std::mem::take(&mut current));
                y = first_baseline;
            }
            if !line.is_empty() {
                current.lines.push(PlacedLine { x: inset, y, text: line });
            }
            y -= cfg.leading;
        }
    }

    pages.push(current);
    pages
}

/// Greedy word wrap. Runs of whitespace collapse to one space; a word wider
/// than the frame is broken between characters.
fn wrap_paragraph(text: &str, max_width: f32, font_size: f32) -> Vec<Vec<u8>> {
    let encoded = to_win_ansi(text);
    let space = char_width(b' ', font_size);

    let mut lines = Vec::new();
    let mut current: Vec<u8> = Vec::new();
    let mut current_width = 0.0;

    for word in encoded
        .split(|b| b.is_ascii_whitespace())
        .filter(|w| !w.is_empty())
    {
        let word_width = text_width(word, font_size);

        if !current.is_empty() && current_width + space + word_width <= max_width {
            current.push(b' ');
            current.extend_from_slice(word);
            current_width += space + word_width;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
            current_width = 0.0;
        }

        if word_width <= max_width {
            current.extend_from_slice(word);
            current_width = word_width;
        } else {
            for &b in word {
                let w = char_width(b, font_size);
                if !current.is_empty() && current_width + w > max_width {
                    lines.push(std::mem::take(&mut current));
                    current_width = 0.0;
                }
                current.push(b);
                current_width += w;
            }
        }
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Encode text as WinAnsi (Windows-1252) for the standard PDF fonts.
///
/// Characters outside the code page become `?`; ASCII control characters
/// other than tab are dropped.
pub fn to_win_ansi(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    let mut buf = [0u8; 4];

    for c in text.chars() {
        if c.is_ascii() {
            if !c.is_ascii_control() || c == '\t' {
                out.push(c as u8);
            }
            continue;
        }
        let (bytes, _, had_errors) = encoding_rs::WINDOWS_1252.encode(c.encode_utf8(&mut buf));
        match (had_errors, bytes.as_ref()) {
            (false, [b]) => out.push(*b),
            _ => out.push(b'?'),
        }
    }
    out
}

/// Width of WinAnsi-encoded `text` in points.
pub fn text_width(text: &[u8], font_size: f32) -> f32 {
    text.iter().map(|&b| char_width(b, font_size)).sum()
}

fn char_width(b: u8, font_size: f32) -> f32 {
    let units = match b {
        32..=126 => HELVETICA_ASCII[(b - 32) as usize],
        0xA0 => 278,
        _ => 556,
    };
    f32::from(units) * font_size / 1000.0
}

/// Helvetica advance widths (1/1000 em) for printable ASCII, from the AFM.
#[rustfmt::skip]
const HELVETICA_ASCII: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' ' … '/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0' … '?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@' … 'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P' … '_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`' … 'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,      // 'p' … '~'
];
