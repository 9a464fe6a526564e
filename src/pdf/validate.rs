//! Checks applied to downloaded page buffers

use lopdf::Document;

use crate::config::EMPTY_PAGE_THRESHOLD;
use crate::error::{Error, Result};

/// Parse a buffer as a PDF with at least one page
///
/// Any parse failure, and a document without pages, is `Error::InvalidPdf`.
pub fn load_valid_pdf(bytes: &[u8]) -> Result<Document> {
    let doc = Document::load_mem(bytes).map_err(|e| {
        Error::InvalidPdf(format!("buffer of {} bytes does not parse: {e}", bytes.len()))
    })?;

    if doc.get_pages().is_empty() {
        return Err(Error::InvalidPdf("document has no pages".to_string()));
    }

    Ok(doc)
}

/// Whether the buffer parses as a PDF with at least one page
///
/// Parse failures are not errors here, they simply make the buffer invalid.
pub fn is_valid_pdf(bytes: &[u8]) -> bool {
    match load_valid_pdf(bytes) {
        Ok(_) => true,
        Err(e) => {
            tracing::debug!("{}", e);
            false
        }
    }
}

/// Whether the buffer is a placeholder for a page that does not exist
///
/// Only the size is considered, never the content.
pub fn is_empty_page(bytes: &[u8]) -> bool {
    bytes.len() < EMPTY_PAGE_THRESHOLD
}
