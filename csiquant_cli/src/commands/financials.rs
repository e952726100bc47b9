//! The `financials` subcommand: quarterly statement download, batch
//! consolidation, metric catalog, and series export.

use std::fs::File;
use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use csiquant_lib::baostock_api::Client;
use csiquant_lib::metrics::{self, CATALOG};
use csiquant_lib::statements::{self, Quarter, STAT_DATE};
use csiquant_lib::{universe, validation, CacheStore};
use indicatif::{ProgressBar, ProgressStyle};

/// Arguments for the `financials` subcommand.
#[derive(Args)]
pub struct FinancialsArgs {
    #[command(subcommand)]
    pub command: FinancialsCommand,
}

#[derive(Subcommand)]
pub enum FinancialsCommand {
    /// Download and consolidate one instrument's quarter
    Fetch(FetchArgs),
    /// Batch download over a quarter range, then merge each instrument's history
    Batch(BatchArgs),
    /// List the metric catalog
    Metrics(MetricsArgs),
    /// Export one metric's time series as CSV
    Export(ExportArgs),
}

#[derive(Args)]
pub struct FetchArgs {
    /// Instrument code (e.g. sh.600000)
    #[arg(long)]
    pub code: String,

    /// Fiscal year (e.g. 2023)
    #[arg(long)]
    pub year: i32,

    /// Fiscal quarter (1-4)
    #[arg(long)]
    pub quarter: u32,
}

#[derive(Args)]
pub struct BatchArgs {
    /// Comma-separated instrument codes
    #[arg(long)]
    pub codes: Option<String>,

    /// Watchlist file with one code per line (used when --codes is absent)
    #[arg(long)]
    pub watchlist: Option<PathBuf>,

    /// First quarter of the range, e.g. 2020Q1
    #[arg(long)]
    pub from: String,

    /// Last quarter of the range, e.g. 2023Q4
    #[arg(long)]
    pub to: String,
}

#[derive(Args)]
pub struct MetricsArgs {
    /// Only list one category group (e.g. Profitability)
    #[arg(long)]
    pub category: Option<String>,
}

#[derive(Args)]
pub struct ExportArgs {
    /// Instrument code (e.g. sh.600000)
    #[arg(long)]
    pub code: String,

    /// Metric column key, e.g. profit_roeAvg (see `financials metrics`)
    #[arg(long)]
    pub field: String,

    /// Output file (default: <data-dir>/series/<code>_<field>.csv)
    #[arg(long)]
    pub out: Option<PathBuf>,
}

pub async fn run(args: &FinancialsArgs, store: &CacheStore, client: &Client) -> Result<()> {
    match &args.command {
        FinancialsCommand::Fetch(fetch) => run_fetch(fetch, store, client).await,
        FinancialsCommand::Batch(batch) => run_batch(batch, store, client).await,
        FinancialsCommand::Metrics(metrics) => run_metrics(metrics),
        FinancialsCommand::Export(export) => run_export(export, store),
    }
}

async fn run_fetch(args: &FetchArgs, store: &CacheStore, client: &Client) -> Result<()> {
    let code = validation::validate_code(&args.code)?;
    let quarter = Quarter::new(args.year, args.quarter)?;

    match statements::fetch_quarter(client, &code, quarter).await {
        Some(table) => {
            let path = store.period_path(&code, quarter);
            store.write_table(&path, &table)?;
            eprintln!("Saved {} {} to {}", code, quarter, path.display());
        }
        None => eprintln!("No statement data for {} {}", code, quarter),
    }
    Ok(())
}

async fn run_batch(args: &BatchArgs, store: &CacheStore, client: &Client) -> Result<()> {
    let codes = match (&args.codes, &args.watchlist) {
        (Some(codes), _) => validation::validate_code_list(codes)?,
        (None, Some(path)) => universe::read_watchlist(path)?,
        (None, None) => bail!("pass --codes or --watchlist"),
    };
    let from = validation::validate_quarter(&args.from)?;
    let to = validation::validate_quarter(&args.to)?;
    validation::validate_quarter_range(from, to)?;

    let total = codes.len() * Quarter::range(from, to).len();
    eprintln!(
        "Consolidating {} instruments over {} .. {} ({} quarters total)",
        codes.len(),
        from,
        to,
        total
    );

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::with_template(
            "[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} ({eta}) {msg}",
        )
        .unwrap(),
    );
    pb.set_message("downloading financials...");

    let summary = statements::download_range(store, client, &codes, from, to, |done, _total| {
        pb.set_position(done as u64);
    })
    .await?;
    pb.finish_with_message("done");

    eprintln!(
        "Financials batch complete: {} fetched, {} already cached, {} empty, {} failed",
        summary.fetched, summary.cached, summary.empty, summary.failed
    );
    eprintln!("{} instrument histories merged and normalized", summary.merged);
    Ok(())
}

fn run_metrics(args: &MetricsArgs) -> Result<()> {
    let groups: Vec<_> = match &args.category {
        Some(category) => {
            let wanted = category.to_lowercase();
            let filtered: Vec<_> = CATALOG
                .iter()
                .filter(|group| group.name.to_lowercase().contains(&wanted))
                .collect();
            if filtered.is_empty() {
                let names: Vec<&str> = CATALOG.iter().map(|g| g.name).collect();
                bail!(
                    "unknown category '{}'. Valid categories: {}",
                    category,
                    names.join(", ")
                );
            }
            filtered
        }
        None => CATALOG.iter().collect(),
    };

    for group in groups {
        println!("{}", group.name);
        for metric in group.metrics {
            println!("  {:<28} {} ({})", metric.field, metric.label, metric.formula);
        }
        println!();
    }
    Ok(())
}

fn run_export(args: &ExportArgs, store: &CacheStore) -> Result<()> {
    let code = validation::validate_code(&args.code)?;
    let cleaned = store.cleaned_path(&code);
    if !cleaned.exists() {
        bail!(
            "no normalized history for {}; run `csiquant financials batch` first",
            code
        );
    }

    let history = store.read_table(&cleaned)?;
    let series = metrics::metric_series(&history, &args.field)?;
    if series.is_empty() {
        eprintln!("No data points for {} {}", code, args.field);
        return Ok(());
    }

    let out = args
        .out
        .clone()
        .unwrap_or_else(|| store.series_path(&code, &args.field));
    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut wtr = csv::Writer::from_writer(File::create(&out)?);
    wtr.write_record([STAT_DATE, args.field.as_str()])?;
    for (date, value) in &series {
        wtr.write_record([date.to_string(), value.to_string()])?;
    }
    wtr.flush()?;

    if let Some(metric) = metrics::find_metric(&args.field) {
        eprintln!("{}: {} ({})", args.field, metric.label, metric.formula);
    }
    eprintln!("Wrote {} points to {}", series.len(), out.display());
    Ok(())
}
