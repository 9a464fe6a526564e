//! PDF manipulation module

pub mod merge;
pub mod split;
pub mod validate;

// Re-export commonly used items
pub use merge::{extract_pages, merge_documents, merge_page_buffers, write_document};
pub use split::{split_into_pairs, SplitOptions, SplitSummary};
pub use validate::{is_empty_page, is_valid_pdf, load_valid_pdf};
