//! Parser for individual `.eml` files (RFC 5322 messages without MBOX framing).

use mailparse::{DispositionType, MailHeaderMap, ParsedMail};

use crate::error::Result;
use crate::model::message::{Disposition, Message, Part};
use crate::parser::header::header_bytes_to_string;

/// Parse a complete raw message (headers + body) into a [`Message`] tree.
///
/// Part bodies are transfer-decoded here; their character encoding is not
/// touched. A message that cannot be parsed is a fatal error, but a part
/// with a broken transfer encoding is not: the failure is kept on the part.
pub fn parse_message(raw: &[u8]) -> Result<Message> {
    let message_bytes = skip_from_line(raw);
    let parsed = mailparse::parse_mail(message_bytes)?;

    let headers = parsed
        .headers
        .iter()
        .map(|h| (h.get_key(), unfold(&header_bytes_to_string(h.get_value_raw()))))
        .collect();
    let root = convert_part(&parsed);

    Ok(Message { headers, root })
}

fn convert_part(parsed: &ParsedMail<'_>) -> Part {
    let content_type = parsed.ctype.mimetype.trim().to_lowercase();
    let charset = parsed.ctype.params.get("charset").cloned();

    let disposition = parsed
        .headers
        .get_first_header("Content-Disposition")
        .map(|_| match parsed.get_content_disposition().disposition {
            DispositionType::Attachment => Disposition::Attachment,
            DispositionType::Inline => Disposition::Inline,
            _ => Disposition::Other,
        });

    let filename = parsed
        .get_content_disposition()
        .params
        .get("filename")
        .or_else(|| parsed.ctype.params.get("name"))
        .cloned();

    let payload = if parsed.subparts.is_empty() {
        parsed.get_body_raw().map_err(|e| e.to_string())
    } else {
        Ok(Vec::new())
    };

    let subparts = parsed
        .subparts
        .iter()
        .map(convert_part)
        .collect();

    Part {
        content_type,
        charset,
        disposition,
        filename,
        payload,
        subparts,
    }
}

/// Join folded header lines: line breaks are removed, the indentation kept.
fn unfold(value: &str) -> String {
    value
        .chars()
        .filter(|&c| c != '\r' && c != '\n')
        .collect::<String>()
        .trim()
        .to_string()
}

/// Skip a UTF-8 BOM and a leading MBOX `From ` separator line, if present.
fn skip_from_line(data: &[u8]) -> &[u8] {
    let data = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);

    if data.starts_with(b"From ") {
        if let Some(pos) = data.iter().position(|&b| b == b'\n') {
            return &data[pos + 1..];
        }
    }
    data
}
