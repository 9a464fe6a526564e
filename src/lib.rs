//! Pagefeed Pairs Library
//!
//! Downloads single-page PDFs from an online book archive and merges them two
//! at a time into `merged_pdfs/<name>/<N>.pdf`. This library provides
//! functionality to:
//! - Fetch numbered pages over HTTP with bounded retries
//! - Detect the archive's placeholder pages by size
//! - Merge one or two page buffers into a single document
//! - Split an already assembled PDF into the same paired layout
//!
//! # Example
//!
//! ```no_run
//! use pagefeed_pairs::config::{output_dir_for, SourceConfig, DEFAULT_OUTPUT_ROOT};
//! use pagefeed_pairs::fetch::{HttpPageSource, RetryPolicy};
//! use pagefeed_pairs::pairing::{run_pairing, PairingOptions};
//! use std::path::Path;
//!
//! let config = SourceConfig::default();
//! let source = HttpPageSource::new(&config, config.feed_id("BR")?)?;
//!
//! let options = PairingOptions {
//!     name: "BR".to_string(),
//!     output_dir: output_dir_for(Path::new(DEFAULT_OUTPUT_ROOT), "BR"),
//!     start_page: 1,
//!     retry: RetryPolicy::from_config(&config.retry),
//! };
//!
//! let summary = run_pairing(&source, &options)?;
//! println!("Last page: {}", summary.last_processed_page);
//! # Ok::<(), pagefeed_pairs::Error>(())
//! ```

pub mod config;
pub mod error;
pub mod fetch;
pub mod pairing;
pub mod pdf;

#[cfg(test)]
mod test_support;

// Re-export commonly used items
pub use error::{Error, Result};
