//! Network pairing loop
//!
//! Walks a text's page feed from a start page, merging pages two at a time
//! into `<output_dir>/<N>.pdf`. The run ends when the archive answers with a
//! placeholder page (see [`is_empty_page`]) or when only one page of a pair is
//! left. A merge failure or a page that cannot be fetched within the retry
//! budget halts the run with an error.

use std::path::PathBuf;

use tracing::{info, warn};

use crate::config::{output_file, FIRST_OUTPUT_INDEX};
use crate::error::Result;
use crate::fetch::{fetch_with_retry, PageSource, RetryPolicy};
use crate::pdf::{is_empty_page, merge_page_buffers};

/// Settings for one pairing run
#[derive(Debug, Clone)]
pub struct PairingOptions {
    /// Text name, used for progress messages
    pub name: String,
    /// Directory receiving the numbered output files
    pub output_dir: PathBuf,
    /// First page to request (1-based)
    pub start_page: u32,
    pub retry: RetryPolicy,
}

/// Why a run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The first page of a pair was a placeholder
    EndOfText,
    /// The last file held a single page because its partner was missing
    FinalSinglePage,
}

/// Outcome of a completed run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairingSummary {
    /// Last page written to an output file, `start_page - 1` if none was
    pub last_processed_page: u32,
    pub files_written: Vec<PathBuf>,
    pub stop_reason: StopReason,
}

/// Output index of the first file for a run starting at `start_page`
///
/// Keeps numbering aligned with a run that started at page 1, so resuming
/// mid-text continues the same sequence of file names.
pub fn first_output_index(start_page: u32) -> u32 {
    (start_page.saturating_sub(1) / 2 + 2).max(FIRST_OUTPUT_INDEX)
}

/// Download, pair and merge pages until the text runs out
pub fn run_pairing<S: PageSource + ?Sized>(
    source: &S,
    options: &PairingOptions,
) -> Result<PairingSummary> {
    std::fs::create_dir_all(&options.output_dir)?;

    let mut page = options.start_page;
    let mut output_index = first_output_index(options.start_page);
    let mut last_processed_page = options.start_page.saturating_sub(1);
    let mut files_written = Vec::new();

    loop {
        // The partner of the last addressable page does not exist
        let next_page = page.checked_add(1);
        match next_page {
            Some(next) => info!("Processing pages {} and {}", page, next),
            None => info!("Processing page {}", page),
        }

        let primary = fetch_with_retry(source, page, &options.retry)?;
        if is_empty_page(&primary) {
            info!("Reached end of text after page {}", last_processed_page);
            finished(&options.name, last_processed_page);
            return Ok(PairingSummary {
                last_processed_page,
                files_written,
                stop_reason: StopReason::EndOfText,
            });
        }

        let secondary = next_page.map(|next| fetch_with_retry(source, next, &options.retry));
        let secondary = match secondary {
            Some(Ok(bytes)) if !is_empty_page(&bytes) => Some(bytes),
            Some(Ok(_)) | None => None,
            Some(Err(e)) => {
                warn!("No second page for {}: {}", page, e);
                None
            }
        };

        let output_path = output_file(&options.output_dir, output_index);

        match secondary {
            None => {
                merge_page_buffers(&primary, None, &output_path)?;
                info!("Created {} (single page)", output_path.display());

                files_written.push(output_path);
                finished(&options.name, page);
                return Ok(PairingSummary {
                    last_processed_page: page,
                    files_written,
                    stop_reason: StopReason::FinalSinglePage,
                });
            }
            Some(secondary) => {
                merge_page_buffers(&primary, Some(&secondary), &output_path)?;
                info!("Created {}", output_path.display());

                files_written.push(output_path);
                last_processed_page = page.saturating_add(1);
                output_index = output_index.saturating_add(1);

                let Some(next) = page.checked_add(2) else {
                    info!("No page numbers left after page {}", last_processed_page);
                    finished(&options.name, last_processed_page);
                    return Ok(PairingSummary {
                        last_processed_page,
                        files_written,
                        stop_reason: StopReason::EndOfText,
                    });
                };
                page = next;
            }
        }
    }
}

fn finished(name: &str, last_processed_page: u32) {
    info!(
        "Finished processing {}; last page processed: {}",
        name, last_processed_page
    );
}
