//! Error types for the page feed library

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for fetching, merging and splitting pages
#[derive(Error, Debug)]
pub enum Error {
    /// PDF processing error
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Network-level failure (timeout, connection error, non-success status)
    #[error("Failed to download {url}: {reason}")]
    Transport { url: String, reason: String },

    /// A page could not be fetched within the retry budget
    #[error("Giving up on page {page} after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        page: u32,
        attempts: u32,
        last_error: String,
    },

    /// Buffer does not parse as a PDF with at least one page
    #[error("Invalid PDF: {0}")]
    InvalidPdf(String),

    /// Requested page is outside the document
    #[error("Page {page} is out of range (1-{total})")]
    PageOutOfRange { page: u32, total: u32 },

    /// Name is not present in the text catalog
    #[error("Unknown text '{name}'. Known names: {}", .known.join(", "))]
    UnknownText { name: String, known: Vec<String> },

    /// Invalid or unreadable configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// File not found
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Serializing a document to disk failed
    #[error("Failed to write {}: {reason}", .path.display())]
    WriteFailed { path: PathBuf, reason: String },
}

impl Error {
    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}
