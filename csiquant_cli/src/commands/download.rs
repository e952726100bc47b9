//! The `download` subcommand: full-range daily-bar download.

use std::time::Duration;

use anyhow::{bail, Result};
use chrono::Local;
use clap::Args;
use csiquant_lib::baostock_api::Client;
use csiquant_lib::{sync, universe, validation, CacheStore};
use indicatif::{ProgressBar, ProgressStyle};

/// Arguments for the `download` subcommand.
#[derive(Args)]
pub struct DownloadArgs {
    /// Start date (YYYY-MM-DD)
    #[arg(long)]
    pub start: String,

    /// End date (YYYY-MM-DD, default: today)
    #[arg(long)]
    pub end: Option<String>,

    /// Delay between per-instrument requests in milliseconds
    #[arg(long, default_value = "100")]
    pub delay_ms: u64,
}

pub async fn run(args: &DownloadArgs, store: &CacheStore, client: &Client) -> Result<()> {
    let start = validation::validate_date(&args.start)?;
    let end = match &args.end {
        Some(end) => validation::validate_date(end)?,
        None => Local::now().date_naive(),
    };
    validation::validate_date_range(start, end)?;

    let universe = universe::ensure_constituents(store, client).await?;
    let codes = universe.codes();
    if codes.is_empty() {
        bail!("constituent list is empty; run `csiquant constituents` first");
    }
    eprintln!(
        "Downloading {} instruments for {} .. {} (this can take a while)",
        codes.len(),
        start,
        end
    );

    let pb = ProgressBar::new(codes.len() as u64);
    pb.set_style(
        ProgressStyle::with_template(
            "[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} ({eta}) {msg}",
        )
        .unwrap(),
    );
    pb.set_message("downloading history...");

    let summary = sync::download_all(
        store,
        client,
        &codes,
        start,
        end,
        Duration::from_millis(args.delay_ms),
        |done, _total| {
            pb.set_position(done as u64);
        },
    )
    .await;
    pb.finish_with_message("done");

    eprintln!(
        "Download complete: {} downloaded, {} empty, {} failed",
        summary.downloaded, summary.empty, summary.failed
    );
    Ok(())
}
