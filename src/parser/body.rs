//! Body text extraction: every `text/plain` part, decoded and concatenated.

use tracing::debug;

use crate::model::message::{Message, Part, PartKind};
use crate::model::story::{Paragraph, Story};
use crate::parser::payload::decode_payload;

/// Decode the message body into one paragraph per line.
///
/// For a multipart message every `text/plain` part (at any depth, attachments
/// included) is decoded with `hint` first, then `fallbacks`, and the results
/// are concatenated in document order. A single-part message is decoded as a
/// whole regardless of its content type. Undecodable parts are skipped, and
/// so are parts whose transfer encoding is broken.
pub fn assemble_body(message: &Message, hint: Option<&str>, fallbacks: &[String]) -> Vec<Paragraph> {
    let mut body = String::new();

    if message.is_multipart() {
        for part in message.walk() {
            if part.kind() != PartKind::PlainText {
                continue;
            }
            match decode_text(part, hint, fallbacks) {
                Some(text) => body.push_str(&text),
                None => debug!(part = part.label(), "Skipping undecodable text part"),
            }
        }
    } else {
        match decode_text(&message.root, hint, fallbacks) {
            Some(text) => body = text,
            None => debug!("Skipping undecodable message body"),
        }
    }

    Story::from_lines(&body).into_paragraphs()
}

fn decode_text(part: &Part, hint: Option<&str>, fallbacks: &[String]) -> Option<String> {
    match part.body() {
        Ok(bytes) => decode_payload(bytes, hint, fallbacks),
        Err(e) => {
            debug!(error = %e, "Bad transfer encoding");
            None
        }
    }
}
