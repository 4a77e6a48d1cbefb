//! Email parsing and decoding: EML parsing, header decoding, payload decoding, body assembly.

pub mod body;
pub mod eml;
pub mod header;
pub mod payload;
