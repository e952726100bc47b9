//! The `search` subcommand: look up instrument codes by display name.

use anyhow::Result;
use clap::Args;
use csiquant_lib::baostock_api::Client;
use csiquant_lib::{universe, CacheStore};

/// Arguments for the `search` subcommand.
#[derive(Args)]
pub struct SearchArgs {
    /// Substring of the display name to match (e.g. 银行)
    pub keyword: String,

    /// Refresh the cached security list before searching
    #[arg(long)]
    pub refresh: bool,
}

pub async fn run(args: &SearchArgs, store: &CacheStore, client: &Client) -> Result<()> {
    let securities = if args.refresh || !store.securities_path().exists() {
        universe::refresh_securities(store, client).await?
    } else {
        universe::load_securities(store)?
    };

    let matches = universe::search_by_name(&securities, &args.keyword);
    if matches.is_empty() {
        eprintln!("No securities match '{}'", args.keyword);
        return Ok(());
    }
    for security in &matches {
        println!("{}  {}", security.code, security.code_name);
    }
    eprintln!("{} matches", matches.len());
    Ok(())
}
