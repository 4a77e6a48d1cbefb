//! Parsed email message tree.
//!
//! A [`Message`] is built once from the input bytes (see
//! [`crate::parser::eml::parse_message`]) and only read afterwards.

use crate::error::{ConvertError, Result};

/// Image formats accepted as attachment pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
}

impl ImageKind {
    /// The matching decoder format for the `image` crate.
    pub fn format(self) -> image::ImageFormat {
        match self {
            Self::Jpeg => image::ImageFormat::Jpeg,
            Self::Png => image::ImageFormat::Png,
        }
    }
}

/// How a part is handled during conversion, derived from its content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartKind {
    /// A `multipart/*` container; only its children carry content.
    Multipart,
    /// `text/plain`, contributes to the body text.
    PlainText,
    /// `application/pdf`, pages are appended when it has a disposition.
    PdfAttachment,
    /// `image/jpeg`, `image/jpg` or `image/png`, becomes one page when it has a disposition.
    ImageAttachment(ImageKind),
    /// Anything else: ignored.
    Unsupported,
}

impl PartKind {
    /// Classify a lowercase `type/subtype` string.
    pub fn from_content_type(content_type: &str) -> Self {
        if content_type.starts_with("multipart/") {
            return Self::Multipart;
        }
        match content_type {
            "text/plain" => Self::PlainText,
            "application/pdf" => Self::PdfAttachment,
            "image/jpeg" | "image/jpg" => Self::ImageAttachment(ImageKind::Jpeg),
            "image/png" => Self::ImageAttachment(ImageKind::Png),
            _ => Self::Unsupported,
        }
    }
}

/// The value of a part's `Content-Disposition` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Attachment,
    Inline,
    /// Any other disposition token (`form-data`, extensions).
    Other,
}

/// One node of the MIME tree.
#[derive(Debug, Clone)]
pub struct Part {
    /// Lowercase `type/subtype` (`"text/plain"` when the header is missing).
    pub content_type: String,
    /// Charset parameter of `Content-Type`, only if the message declared one.
    pub charset: Option<String>,
    /// `None` when the part has no `Content-Disposition` header.
    pub disposition: Option<Disposition>,
    /// Filename from the disposition or content-type parameters.
    pub filename: Option<String>,
    /// Payload with the transfer encoding (base64, quoted-printable) removed,
    /// or the reason that failed. Character decoding is left to
    /// [`crate::parser::payload`].
    ///
    /// A bad transfer encoding only matters for parts that are used; see
    /// [`Part::body`].
    pub payload: std::result::Result<Vec<u8>, String>,
    /// Child parts of a multipart container, in document order.
    pub subparts: Vec<Part>,
}

impl Part {
    pub fn kind(&self) -> PartKind {
        PartKind::from_content_type(&self.content_type)
    }

    pub fn is_multipart(&self) -> bool {
        self.kind() == PartKind::Multipart
    }

    /// This part followed by all of its descendants, depth-first in document order.
    pub fn walk(&self) -> Walk<'_> {
        Walk { stack: vec![self] }
    }

    /// The transfer-decoded payload.
    ///
    /// Fails with [`ConvertError::Mail`] if the transfer encoding was broken.
    pub fn body(&self) -> Result<&[u8]> {
        self.payload
            .as_deref()
            .map_err(|e| ConvertError::Mail(format!("{}: {e}", self.label())))
    }

    /// Short human-readable label for log lines.
    pub fn label(&self) -> &str {
        self.filename.as_deref().unwrap_or(&self.content_type)
    }
}

/// Depth-first iterator over a part tree. See [`Part::walk`].
pub struct Walk<'a> {
    stack: Vec<&'a Part>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a Part;

    fn next(&mut self) -> Option<Self::Item> {
        let part = self.stack.pop()?;
        self.stack.extend(part.subparts.iter().rev());
        Some(part)
    }
}

/// A parsed email message.
#[derive(Debug, Clone)]
pub struct Message {
    /// Top-level headers as `(name, raw value)`, in message order. Folded
    /// continuation lines are joined; encoded-words are left untouched.
    pub headers: Vec<(String, String)>,
    /// The root part (the message body itself).
    pub root: Part,
}

impl Message {
    /// First raw value of a header, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_multipart(&self) -> bool {
        self.root.is_multipart()
    }

    /// Every part of the message, root first.
    pub fn walk(&self) -> Walk<'_> {
        self.root.walk()
    }
}
