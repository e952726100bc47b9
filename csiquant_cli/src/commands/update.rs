//! The `update` subcommand: incrementally extend cached daily bars.

use anyhow::{bail, Result};
use chrono::Local;
use clap::Args;
use csiquant_lib::baostock_api::Client;
use csiquant_lib::{sync, universe, validation, CacheStore};
use indicatif::{ProgressBar, ProgressStyle};

/// Arguments for the `update` subcommand.
#[derive(Args)]
pub struct UpdateArgs {
    /// Sync caches through this date (YYYY-MM-DD, default: today)
    #[arg(long)]
    pub end: Option<String>,
}

pub async fn run(args: &UpdateArgs, store: &CacheStore, client: &Client) -> Result<()> {
    let end = match &args.end {
        Some(end) => validation::validate_date(end)?,
        None => Local::now().date_naive(),
    };

    let universe = universe::ensure_constituents(store, client).await?;
    let codes = universe.codes();
    if codes.is_empty() {
        bail!("constituent list is empty; run `csiquant constituents` first");
    }
    eprintln!("Updating {} instruments through {}", codes.len(), end);

    let pb = ProgressBar::new(codes.len() as u64);
    pb.set_style(
        ProgressStyle::with_template(
            "[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} ({eta}) {msg}",
        )
        .unwrap(),
    );
    pb.set_message("updating caches...");

    let summary = sync::update_all(store, client, &codes, end, |done, _total| {
        pb.set_position(done as u64);
    })
    .await;
    pb.finish_with_message("done");

    eprintln!(
        "Update complete: {} updated, {} already current, {} not cached, {} failed",
        summary.updated, summary.current, summary.not_cached, summary.failed
    );
    if summary.not_cached > 0 {
        eprintln!("Run `csiquant download` to bootstrap instruments without a cache.");
    }
    Ok(())
}
