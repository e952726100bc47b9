//! The `screen` subcommand: limit-move and top-gainer scans over the cache.

use anyhow::Result;
use clap::{Args, Subcommand};
use csiquant_lib::screen::{self, LimitDirection};
use csiquant_lib::{validation, CacheStore};

use crate::output::{self, OutputFormat};

/// Arguments for the `screen` subcommand.
#[derive(Args)]
pub struct ScreenArgs {
    #[command(subcommand)]
    pub command: ScreenCommand,
}

#[derive(Subcommand)]
pub enum ScreenCommand {
    /// Instruments with limit-up days in the trailing window
    LimitUp(LimitArgs),
    /// Instruments with limit-down days in the trailing window
    LimitDown(LimitArgs),
    /// Best single-day gainers in the trailing window
    Gainers(GainersArgs),
    /// Largest close-to-close gainers over the trailing span
    RangeGainers(GainersArgs),
}

#[derive(Args)]
pub struct LimitArgs {
    /// Trailing window in trading days
    #[arg(long, default_value = "30")]
    pub days: usize,

    /// Single-day move threshold as a decimal (0.098 = 9.8%)
    #[arg(long, default_value = "0.098")]
    pub threshold: f64,

    /// Also write the result as CSV into the data directory
    #[arg(long)]
    pub save: bool,
}

#[derive(Args)]
pub struct GainersArgs {
    /// Trailing window in trading days
    #[arg(long, default_value = "30")]
    pub days: usize,

    /// Number of instruments to show
    #[arg(long, default_value = "10")]
    pub top: usize,

    /// Also write the result as CSV into the data directory
    #[arg(long)]
    pub save: bool,
}

pub fn run(args: &ScreenArgs, store: &CacheStore, format: &OutputFormat) -> Result<()> {
    match &args.command {
        ScreenCommand::LimitUp(limit) => run_limit(limit, store, format, LimitDirection::Up),
        ScreenCommand::LimitDown(limit) => run_limit(limit, store, format, LimitDirection::Down),
        ScreenCommand::Gainers(gainers) => run_gainers(gainers, store, format),
        ScreenCommand::RangeGainers(gainers) => run_range_gainers(gainers, store, format),
    }
}

fn run_limit(
    args: &LimitArgs,
    store: &CacheStore,
    format: &OutputFormat,
    direction: LimitDirection,
) -> Result<()> {
    let days = validation::validate_window(args.days)?;
    let threshold = validation::validate_threshold(args.threshold)?;
    let label = match direction {
        LimitDirection::Up => "limit-up",
        LimitDirection::Down => "limit-down",
    };

    let results = screen::limit_moves(store, days, threshold, direction)?;
    if results.is_empty() {
        eprintln!("No {} instruments in the last {} days", label, days);
        return Ok(());
    }
    output::print_limit_moves(&results, format)?;

    if args.save {
        let path = store
            .root()
            .join(format!("{}_last{}d.csv", label.replace('-', "_"), days));
        output::save_limit_moves(&results, &path)?;
        eprintln!("Results saved to {}", path.display());
    }
    Ok(())
}

fn run_gainers(args: &GainersArgs, store: &CacheStore, format: &OutputFormat) -> Result<()> {
    let days = validation::validate_window(args.days)?;
    let top = validation::validate_top_n(args.top)?;

    let results = screen::top_single_day_gainers(store, days, top)?;
    if results.is_empty() {
        eprintln!("No cached instruments to screen");
        return Ok(());
    }
    output::print_best_days(&results, format)?;

    if args.save {
        let path = store
            .root()
            .join(format!("gainers_top{}_last{}d.csv", top, days));
        output::save_best_days(&results, &path)?;
        eprintln!("Results saved to {}", path.display());
    }
    Ok(())
}

fn run_range_gainers(args: &GainersArgs, store: &CacheStore, format: &OutputFormat) -> Result<()> {
    let days = validation::validate_window(args.days)?;
    let top = validation::validate_top_n(args.top)?;

    let results = screen::top_range_gainers(store, days, top)?;
    if results.is_empty() {
        eprintln!("No cached instruments with at least {} days of history", days + 1);
        return Ok(());
    }
    output::print_range_gains(&results, format)?;

    if args.save {
        let path = store
            .root()
            .join(format!("range_gainers_top{}_last{}d.csv", top, days));
        output::save_range_gains(&results, &path)?;
        eprintln!("Results saved to {}", path.display());
    }
    Ok(())
}
