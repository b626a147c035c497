//! Payment Recon CLI
//!
//! Reconciles a payment-gateway CSV export into a deduplicated revenue
//! report for one reporting window.
//!
//! # Usage
//!
//! ```bash
//! # Daily revenue for the last 30 days as CSV
//! cargo run -- transactions.csv > revenue.csv
//!
//! # An explicit range as JSON, figures and listing together
//! cargo run -- transactions.csv --start 2024-01-01 --end 2024-01-31 --format json
//!
//! # Failed attempts that survived deduplication
//! cargo run -- transactions.csv --transactions --status FAILED
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Set to `debug` or `warn` to control logging verbosity

use chrono::{Local, NaiveDate};
use clap::{Parser, ValueEnum};
use payment_recon::{ReconEngine, ReportWindow, Result};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::process;

#[derive(Parser, Debug)]
#[command(name = "payment-recon")]
#[command(about = "Reconciles payment-gateway exports into revenue reports")]
struct Cli {
    /// Gateway CSV export to reconcile.
    input: PathBuf,

    /// Report on the last N calendar days, reference date inclusive.
    #[arg(long, default_value_t = 30, conflicts_with_all = ["start", "end"])]
    days: u32,

    /// First day of an explicit reporting range (inclusive).
    #[arg(long, value_name = "YYYY-MM-DD", requires = "end")]
    start: Option<NaiveDate>,

    /// Last day of an explicit reporting range (inclusive).
    #[arg(long, value_name = "YYYY-MM-DD", requires = "start")]
    end: Option<NaiveDate>,

    /// Reference date anchoring relative windows; defaults to today.
    #[arg(long, value_name = "YYYY-MM-DD")]
    as_of: Option<NaiveDate>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = Format::Csv)]
    format: Format,

    /// Emit the canonical transaction listing instead of the per-day
    /// revenue table (CSV only; JSON always carries both).
    #[arg(long)]
    transactions: bool,

    /// Keep only this status (case-insensitive) in the transaction
    /// listing. Revenue figures are unaffected.
    #[arg(long, value_name = "STATUS")]
    status: Option<String>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Csv,
    Json,
}

fn main() {
    env_logger::init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let window = match (cli.start, cli.end) {
        (Some(start), Some(end)) => ReportWindow::Range { start, end },
        _ => ReportWindow::LastDays(cli.days),
    };
    let as_of = cli.as_of.unwrap_or_else(|| Local::now().date_naive());

    let file = File::open(&cli.input)?;
    let reader = BufReader::new(file);

    let mut engine = ReconEngine::new(window);
    engine.ingest_csv(reader)?;

    let report = engine.reconcile(as_of, cli.status.as_deref())?;

    let stdout = io::stdout();
    let handle = stdout.lock();
    match cli.format {
        Format::Json => report.write_json(handle)?,
        Format::Csv if cli.transactions => report.write_transactions_csv(handle)?,
        Format::Csv => report.write_summary_csv(handle)?,
    }

    Ok(())
}
