//! Header decoding: RFC 2047 encoded-words, and assembly of the header block
//! shown at the top of a converted message.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use tracing::warn;

use crate::model::header::EncodedHeader;
use crate::model::message::Message;
use crate::model::story::Paragraph;

/// Fields rendered at the top of the document, in this order.
pub const HEADER_FIELDS: [&str; 4] = ["Subject", "From", "To", "Date"];

/// Base64 for `B` words; senders are inconsistent about padding.
const B_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// A decoded header value and the encoding it declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedHeader {
    pub text: String,
    /// Lowercase charset of the *last* encoded-word in the value.
    ///
    /// Earlier words with a different charset are not reported.
    pub encoding: Option<String>,
}

/// Decode raw header bytes to a string.
///
/// Tries UTF-8 first, then falls back to Windows-1252 (which accepts every byte).
pub fn header_bytes_to_string(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            decoded.into_owned()
        }
    }
}

/// Decode RFC 2047 encoded-words in a header value.
///
/// Example: `"=?UTF-8?B?SG9sYQ==?= =?UTF-8?B?IG11bmRv?="` → `"Hola mundo"`, `utf-8`.
///
/// Malformed words are kept literally. Whitespace between two adjacent
/// encoded-words is dropped (RFC 2047 §6.2).
pub fn decode_header(input: &str) -> DecodedHeader {
    let mut text = String::with_capacity(input.len());
    let mut encoding = None;
    let mut remaining = input;
    let mut last_was_encoded = false;

    while let Some(start) = remaining.find("=?") {
        let before = &remaining[..start];
        let after_start = &remaining[start + 2..];

        match try_decode_one_word(after_start) {
            Some(word) => {
                if !last_was_encoded || !before.trim().is_empty() {
                    text.push_str(before);
                }
                text.push_str(&word.text);
                encoding = Some(word.charset);
                remaining = &after_start[word.consumed..];
                last_was_encoded = true;
            }
            None => {
                text.push_str(before);
                text.push_str("=?");
                remaining = after_start;
                last_was_encoded = false;
            }
        }
    }

    text.push_str(remaining);
    DecodedHeader { text, encoding }
}

struct DecodedWord {
    text: String,
    charset: String,
    consumed: usize, // bytes consumed from the string *after* the initial "=?"
}

fn try_decode_one_word(s: &str) -> Option<DecodedWord> {
    // Format: charset?encoding?encoded_text?=
    let first_q = s.find('?')?;
    let charset = &s[..first_q];
    if charset.is_empty() || charset.contains(char::is_whitespace) {
        return None;
    }

    let rest = &s[first_q + 1..];
    let second_q = rest.find('?')?;
    let encoding = &rest[..second_q];

    let rest2 = &rest[second_q + 1..];
    let end = rest2.find("?=")?;
    let encoded_text = &rest2[..end];

    let consumed = first_q + 1 + second_q + 1 + end + 2;

    let bytes = match encoding {
        "B" | "b" => B_ENGINE.decode(encoded_text.trim()).ok()?,
        "Q" | "q" => decode_q_encoding(encoded_text),
        _ => return None,
    };

    // RFC 2231 language suffix: "utf-8*en"
    let charset = charset.split('*').next().unwrap_or(charset).to_lowercase();
    let text = decode_charset(&charset, &bytes);

    Some(DecodedWord {
        text,
        charset,
        consumed,
    })
}

/// Decode Q-encoding (RFC 2047): underscores → spaces, `=XX` → byte.
fn decode_q_encoding(input: &str) -> Vec<u8> {
    let bytes = input.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'_' => {
                result.push(b' ');
                i += 1;
            }
            b'=' if i + 2 < bytes.len() => match (hex_val(bytes[i + 1]), hex_val(bytes[i + 2])) {
                (Some(hi), Some(lo)) => {
                    result.push((hi << 4) | lo);
                    i += 3;
                }
                _ => {
                    result.push(b'=');
                    i += 1;
                }
            },
            b => {
                result.push(b);
                i += 1;
            }
        }
    }
    result
}

fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

/// Decode bytes using a named charset.
fn decode_charset(charset: &str, bytes: &[u8]) -> String {
    match charset {
        "utf-8" | "utf8" => String::from_utf8_lossy(bytes).into_owned(),
        _ => {
            if let Some(encoding) = encoding_rs::Encoding::for_label(charset.as_bytes()) {
                let (decoded, _, _) = encoding.decode(bytes);
                decoded.into_owned()
            } else {
                warn!(
                    charset = charset,
                    "Unknown charset, falling back to UTF-8 lossy"
                );
                String::from_utf8_lossy(bytes).into_owned()
            }
        }
    }
}

// ── Header block ────────────────────────────────────────────────

/// The decoded header fields of a message plus the single encoding they
/// agree on, if any.
#[derive(Debug, Clone)]
pub struct HeaderBlock {
    /// Subject, From, To, Date, always in that order.
    pub headers: Vec<EncodedHeader>,
    /// `Some` only if exactly one distinct encoding was seen across the fields.
    pub encoding: Option<String>,
}

impl HeaderBlock {
    /// The header lines as story paragraphs.
    pub fn paragraphs(&self) -> impl Iterator<Item = Paragraph> + '_ {
        self.headers.iter().map(|h| Paragraph::new(h.display_line()))
    }
}

/// Extract and decode the fixed header fields of `message`.
///
/// A missing field renders with an empty value.
pub fn assemble_headers(message: &Message) -> HeaderBlock {
    let mut encodings: Vec<String> = Vec::new();
    let mut headers = Vec::with_capacity(HEADER_FIELDS.len());

    for name in HEADER_FIELDS {
        let raw = message.header(name).unwrap_or_default();
        let decoded = decode_header(raw);

        if let Some(enc) = &decoded.encoding {
            if !encodings.contains(enc) {
                encodings.push(enc.clone());
            }
        }

        let value = if name == "From" || name == "To" {
            normalize_address(&decoded.text)
        } else {
            decoded.text
        };

        headers.push(EncodedHeader {
            name,
            raw: raw.to_string(),
            value,
            encoding: decoded.encoding,
        });
    }

    let encoding = if encodings.len() == 1 {
        encodings.pop()
    } else {
        None
    };

    HeaderBlock { headers, encoding }
}

/// Remove angle brackets from an address field that contains `<`, `>` and `@`.
///
/// `"Alice <alice@example.com>"` → `"Alice alice@example.com"`. Values
/// missing any of the three markers are returned unchanged.
pub fn normalize_address(value: &str) -> String {
    if ['<', '>', '@'].iter().all(|c| value.contains(*c)) {
        value.chars().filter(|c| !matches!(c, '<' | '>')).collect()
    } else {
        value.to_string()
    }
}
