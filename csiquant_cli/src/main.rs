mod commands;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use csiquant_lib::baostock_api::Client;
use csiquant_lib::CacheStore;

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "csiquant")]
#[command(about = "Download, cache, and screen CSI 500 market data")]
struct Cli {
    /// Data directory for cached bars, statements, and list files
    #[arg(long, default_value = "data", global = true)]
    data_dir: PathBuf,

    /// Gateway base URL (overrides BAOSTOCK_GATEWAY_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Output format: table, json, or csv
    #[arg(long, default_value = "table", global = true)]
    output: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Refresh the CSI 500 constituent list
    Constituents,
    /// Download full daily-bar history for every constituent
    Download(commands::download::DownloadArgs),
    /// Incrementally update cached daily bars
    Update(commands::update::UpdateArgs),
    /// Screen cached daily bars for limit moves and top gainers
    Screen(commands::screen::ScreenArgs),
    /// Download, consolidate, and export quarterly financials
    Financials(commands::financials::FinancialsArgs),
    /// Search the security list by display name
    Search(commands::search::SearchArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("csiquant_lib=info".parse().unwrap()),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let format = OutputFormat::from_flag(&cli.output);
    let store = CacheStore::new(&cli.data_dir);
    let client = match cli
        .base_url
        .clone()
        .or_else(|| std::env::var("BAOSTOCK_GATEWAY_URL").ok())
    {
        Some(url) => Client::with_base_url(&url),
        None => Client::new(),
    };

    match &cli.command {
        Commands::Constituents => commands::constituents::run(&store, &client).await?,
        Commands::Download(args) => commands::download::run(args, &store, &client).await?,
        Commands::Update(args) => commands::update::run(args, &store, &client).await?,
        Commands::Screen(args) => commands::screen::run(args, &store, &format)?,
        Commands::Financials(args) => commands::financials::run(args, &store, &client).await?,
        Commands::Search(args) => commands::search::run(args, &store, &client).await?,
    }

    Ok(())
}
