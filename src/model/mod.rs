//! Core data model: the parsed message tree, decoded headers, and the document story.

pub mod header;
pub mod message;
pub mod story;
