//! Pagefeed fetch CLI
//!
//! Downloads a text page by page and writes consecutive pairs to
//! `merged_pdfs/<NAME>/<N>.pdf`.

use anyhow::Context;
use clap::{CommandFactory, Parser};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use pagefeed_pairs::config::{output_dir_for, SourceConfig, DEFAULT_OUTPUT_ROOT};
use pagefeed_pairs::fetch::{HttpPageSource, RetryPolicy};
use pagefeed_pairs::pairing::{run_pairing, PairingOptions, StopReason};

/// Pagefeed Fetch - Download a text and merge its pages in pairs
#[derive(Parser)]
#[command(name = "pagefeed-fetch")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    # Fetch Berakhot from the first page
    pagefeed-fetch BR

    # Resume Shabbat from page 41 (first file written is 22.pdf)
    pagefeed-fetch SB --start-page 41

    # Use a custom catalog and output directory
    pagefeed-fetch XY --catalog texts.toml --output-root ~/pdfs")]
struct Cli {
    /// Text name as listed in the catalog (e.g. BR, SB, KT)
    name: String,

    /// First page to download
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    start_page: u32,

    /// TOML catalog overriding the built-in text list and request settings
    #[arg(short, long)]
    catalog: Option<PathBuf>,

    /// Root directory for output; files go to <ROOT>/<NAME>/
    #[arg(short, long, default_value = DEFAULT_OUTPUT_ROOT)]
    output_root: PathBuf,

    /// Attempts per page before giving up (overrides the catalog)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    max_attempts: Option<u32>,

    /// Verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    if std::env::args_os().len() <= 1 {
        let _ = Cli::command().write_help(&mut std::io::stderr());
        process::exit(1);
    }

    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = match &cli.catalog {
        Some(path) => SourceConfig::from_file(path)
            .with_context(|| format!("Failed to load catalog {}", path.display()))?,
        None => SourceConfig::default(),
    };
    if let Some(max_attempts) = cli.max_attempts {
        config.retry.max_attempts = max_attempts;
    }

    let feed_id = config.feed_id(&cli.name)?;
    let source = HttpPageSource::new(&config, feed_id)?;

    let options = PairingOptions {
        name: cli.name.clone(),
        output_dir: output_dir_for(&cli.output_root, &cli.name),
        start_page: cli.start_page,
        retry: RetryPolicy::from_config(&config.retry),
    };

    eprintln!(
        "Fetching {} (feed {}) from page {} into {}",
        cli.name,
        feed_id,
        cli.start_page,
        options.output_dir.display()
    );

    let summary = run_pairing(&source, &options)
        .with_context(|| format!("Failed while processing {}", cli.name))?;

    let ending = match summary.stop_reason {
        StopReason::EndOfText => "end of text",
        StopReason::FinalSinglePage => "final single page",
    };
    eprintln!(
        "Wrote {} files; last page processed: {} ({})",
        summary.files_written.len(),
        summary.last_processed_page,
        ending
    );

    Ok(())
}
