//! Split an assembled PDF into the paired-page layout

use std::path::PathBuf;

use lopdf::{Document, ObjectId};

use crate::config::{output_file, FIRST_OUTPUT_INDEX};
use crate::error::{Error, Result};
use crate::pdf::merge::{extract_page_ids, write_document};

/// Options for splitting a local PDF into page pairs
#[derive(Debug, Clone)]
pub struct SplitOptions {
    /// Assembled PDF to split
    pub input_path: PathBuf,
    /// Directory receiving `2.pdf`, `3.pdf`, ...
    pub output_dir: PathBuf,
    /// First page to process (1-based)
    pub start_page: u32,
    /// Last page to process (1-based, inclusive)
    pub end_page: u32,
}

/// What a split actually did
#[derive(Debug, Clone)]
pub struct SplitSummary {
    /// Page count of the input document
    pub total_pages: u32,
    pub start_page: u32,
    /// End page after clamping to the document length
    pub end_page: u32,
    pub files_written: Vec<PathBuf>,
}

/// Write pages `start_page..=end_page` two at a time to sequentially numbered files
///
/// Output numbering always starts at 2, whatever the start page. An end page
/// past the last page is clamped with a warning. Any read or write error aborts
/// the whole split; files written before the error are left in place.
pub fn split_into_pairs(options: &SplitOptions) -> Result<SplitSummary> {
    if !options.input_path.exists() {
        return Err(Error::FileNotFound(options.input_path.clone()));
    }

    let doc = Document::load(&options.input_path)?;
    let pages = doc.get_pages();
    let total = u32::try_from(pages.len()).unwrap_or(u32::MAX);

    if options.start_page < 1 || options.start_page > total {
        return Err(Error::PageOutOfRange {
            page: options.start_page,
            total,
        });
    }

    let mut end_page = options.end_page;
    if end_page > total {
        tracing::warn!(
            "End page {} exceeds PDF length. Using last page ({}) instead.",
            end_page,
            total
        );
        end_page = total;
    }

    if end_page < options.start_page {
        tracing::warn!(
            "End page {} is before start page {}; nothing to split",
            end_page,
            options.start_page
        );
    }

    std::fs::create_dir_all(&options.output_dir)?;

    let mut files_written = Vec::new();
    let mut output_index = FIRST_OUTPUT_INDEX;
    let mut page = options.start_page;

    while page <= end_page {
        let pair: Vec<ObjectId> = pages
            .range(page..=end_page.min(page.saturating_add(1)))
            .map(|(_, &id)| id)
            .collect();

        let mut pair_doc = extract_page_ids(&doc, &pair)?;
        pair_doc.compress();

        let output_path = output_file(&options.output_dir, output_index);
        write_document(&mut pair_doc, &output_path)?;
        tracing::info!("Created {}", output_path.display());

        files_written.push(output_path);
        output_index += 1;
        page = match page.checked_add(2) {
            Some(next) => next,
            None => break,
        };
    }

    Ok(SplitSummary {
        total_pages: total,
        start_page: options.start_page,
        end_page,
        files_written,
    })
}
