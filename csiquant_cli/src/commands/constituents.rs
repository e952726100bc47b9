//! The `constituents` subcommand: refresh the CSI 500 membership list.

use anyhow::Result;
use csiquant_lib::baostock_api::Client;
use csiquant_lib::{universe, CacheStore};

pub async fn run(store: &CacheStore, client: &Client) -> Result<()> {
    let universe = universe::refresh_constituents(store, client).await?;
    let as_of = universe
        .constituents()
        .iter()
        .map(|c| c.update_date)
        .max();
    match as_of {
        Some(date) => eprintln!(
            "Saved {} CSI 500 constituents (as of {}) to {}",
            universe.len(),
            date,
            store.constituents_path().display()
        ),
        None => eprintln!("Gateway returned an empty constituent list"),
    }
    Ok(())
}
