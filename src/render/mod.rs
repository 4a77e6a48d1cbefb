//! PDF output: text layout, page rendering and attachment composition.

pub mod compose;
pub mod layout;
pub mod pdf;

pub use layout::PageSize;
