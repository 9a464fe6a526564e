//! Pagefeed split CLI
//!
//! Cuts an assembled PDF into the same paired layout the fetcher produces.

use anyhow::Context;
use clap::{CommandFactory, Parser};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use pagefeed_pairs::config::{output_dir_for, DEFAULT_OUTPUT_ROOT};
use pagefeed_pairs::pdf::{split_into_pairs, SplitOptions};

/// Pagefeed Split - Split a local PDF into two-page files
#[derive(Parser)]
#[command(name = "pagefeed-split")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    # Split pages 3 to 20 of a scan into merged_pdfs/BR/2.pdf, 3.pdf, ...
    pagefeed-split berakhot.pdf BR --start-page 3 --end-page 20")]
struct Cli {
    /// Assembled PDF to split
    input: PathBuf,

    /// Name of the output subdirectory
    name: String,

    /// First page to include (1-based)
    #[arg(short, long)]
    start_page: u32,

    /// Last page to include; clamped to the page count
    #[arg(short, long)]
    end_page: u32,

    /// Root directory for output; files go to <ROOT>/<NAME>/
    #[arg(short, long, default_value = DEFAULT_OUTPUT_ROOT)]
    output_root: PathBuf,

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
    let options = SplitOptions {
        input_path: cli.input.clone(),
        output_dir: output_dir_for(&cli.output_root, &cli.name),
        start_page: cli.start_page,
        end_page: cli.end_page,
    };

    let summary = split_into_pairs(&options)
        .with_context(|| format!("Failed to split {}", cli.input.display()))?;

    eprintln!(
        "Split pages {}-{} of {} into {} files in {}",
        summary.start_page,
        summary.end_page,
        summary.total_pages,
        summary.files_written.len(),
        options.output_dir.display()
    );

    Ok(())
}
