//! Headless workbook export.
//!
//! Fetches a ticker, builds the model, and writes the xlsx to disk without
//! starting the server. Useful for batch generation and smoke checks.

use std::path::PathBuf;

use clap::Parser;
use model_core::{FinancialDataProvider, Timeline, PROJECTION_YEARS};
use projection_engine::{derive_drivers, flat_forward, fmt_money, project};
use workbook_builder::{build_workbook, workbook_filename};
use yahoo_client::YahooClient;

#[derive(Parser)]
#[command(name = "export", about = "Generate a 3-statement model workbook for a ticker")]
struct Args {
    /// Ticker symbol to model
    #[arg(short, long)]
    ticker: String,

    /// Output directory or file path; defaults to <TICKER>_Model.xlsx in the
    /// current directory
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let ticker = args.ticker.trim().to_uppercase();

    let provider = YahooClient::new();
    let company = provider.fetch_company(&ticker).await?;
    tracing::info!(
        "{} ({}): {} historical periods",
        company.meta.name,
        ticker,
        company.rows.len()
    );

    let drivers = derive_drivers(&company.rows);
    let timeline = Timeline::from_rows(&company.rows);

    // Numeric preview of what the workbook formulas will evaluate to.
    if let Some(ratios) = flat_forward(&drivers) {
        let projected = project(&company.rows, ratios, PROJECTION_YEARS);
        if let (Some(label), Some(last)) = (timeline.projected.last(), projected.last()) {
            tracing::info!(
                "{label}: revenue {}, net income {}",
                fmt_money(last.revenue),
                fmt_money(last.net_income)
            );
        }
    }

    let buffer = build_workbook(&company.meta, &company.rows, &drivers, &timeline)?;
    let out = resolve_out_path(args.out, &ticker);
    std::fs::write(&out, &buffer)?;
    tracing::info!("wrote {} ({} bytes)", out.display(), buffer.len());

    Ok(())
}

/// Resolve `--out` into the file to write: an existing directory gets the
/// canonical `{TICKER}_Model.xlsx` name inside it, any other path is the
/// target file itself.
fn resolve_out_path(out: Option<PathBuf>, ticker: &str) -> PathBuf {
    match out {
        Some(dir) if dir.is_dir() => dir.join(workbook_filename(ticker)),
        Some(file) => file,
        None => PathBuf::from(workbook_filename(ticker)),
    }
}
