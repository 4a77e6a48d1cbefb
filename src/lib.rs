//! `mailpdf` — convert email messages and plain text files to PDF.
//!
//! An EML file becomes a PDF with its Subject, From, To and Date lines,
//! the decoded `text/plain` body, and then every PDF and JPEG/PNG
//! attachment as further pages. Plain text becomes one paragraph per line.

pub mod config;
pub mod convert;
pub mod error;
pub mod model;
pub mod parser;
pub mod render;
