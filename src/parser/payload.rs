//! Character decoding of part payloads with an ordered list of candidate encodings.
//!
//! Labels are resolved with `encoding_rs` (WHATWG names), so `iso-8859-1`
//! and `windows-1252` are the same candidate and only tried once.

use std::borrow::Cow;

use encoding_rs::{Encoding, UTF_16BE, UTF_16LE};
use tracing::{debug, warn};

/// Build the ordered candidate list: `hint` first, then `fallbacks`.
///
/// Duplicates (including the hint reappearing in `fallbacks`) are dropped.
/// Labels `encoding_rs` does not know are skipped.
pub fn candidate_encodings(hint: Option<&str>, fallbacks: &[String]) -> Vec<&'static Encoding> {
    let mut candidates: Vec<&'static Encoding> = Vec::with_capacity(fallbacks.len() + 1);

    for label in hint.into_iter().chain(fallbacks.iter().map(String::as_str)) {
        match Encoding::for_label(label.trim().as_bytes()) {
            Some(encoding) if !candidates.contains(&encoding) => candidates.push(encoding),
            Some(_) => {}
            None => warn!(label = label, "Unknown encoding label, skipping"),
        }
    }

    candidates
}

/// Decode `bytes` with the first candidate encoding that accepts them.
///
/// Returns `None` when no candidate decodes the payload without errors.
/// This is different from `Some("")`, which is an empty body.
pub fn decode_payload(bytes: &[u8], hint: Option<&str>, fallbacks: &[String]) -> Option<String> {
    let decoded = candidate_encodings(hint, fallbacks)
        .into_iter()
        .find_map(|encoding| {
            let attempt = decode_strict(encoding, bytes);
            debug!(
                encoding = encoding.name(),
                success = attempt.is_some(),
                "Payload decode attempt"
            );
            attempt
        });

    if decoded.is_none() {
        debug!(len = bytes.len(), "No candidate encoding decoded the payload");
    }
    decoded
}

/// Decode without replacement characters; malformed input yields `None`.
///
/// UTF-16 honors a byte-order mark in either direction and otherwise reads
/// little-endian. Other encodings treat a BOM as ordinary bytes.
fn decode_strict(encoding: &'static Encoding, bytes: &[u8]) -> Option<String> {
    if encoding == UTF_16LE || encoding == UTF_16BE {
        if let Some((bom_encoding, bom_len)) = Encoding::for_bom(bytes) {
            if bom_encoding == UTF_16LE || bom_encoding == UTF_16BE {
                return bom_encoding
                    .decode_without_bom_handling_and_without_replacement(&bytes[bom_len..])
                    .map(Cow::into_owned);
            }
        }
    }

    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(Cow::into_owned)
}
