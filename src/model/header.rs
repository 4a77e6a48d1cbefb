//! Decoded header fields.

/// A header field's raw encoded form plus its displayable value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedHeader {
    /// Canonical field name (`"Subject"`, `"From"`, …).
    pub name: &'static str,
    /// Raw value as it appeared in the message (RFC 2047 words still encoded).
    pub raw: String,
    /// Decoded, display-ready value.
    pub value: String,
    /// Lowercase charset label of the last encoded-word, if any.
    pub encoding: Option<String>,
}

impl EncodedHeader {
    /// Render as a story line: `"Subject: Hello"`.
    pub fn display_line(&self) -> String {
        format!("{}: {}", self.name, self.value)
    }
}
