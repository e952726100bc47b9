//! CSI 500 constituents and the full-market security list.
//!
//! Both lists are fetched from the gateway and cached as CSV; display names
//! live here as metadata and never become part of a cache file's identity.

use std::fs;
use std::fs::File;
use std::path::Path;

use baostock_api::types::{Constituent, Security};
use baostock_api::Client;

use crate::error::CsiQuantError;
use crate::store::CacheStore;
use crate::validation::validate_code;

/// The parsed constituent list: codes plus code↔display-name lookups.
pub struct Universe {
    constituents: Vec<Constituent>,
}

impl Universe {
    pub fn new(constituents: Vec<Constituent>) -> Self {
        Self { constituents }
    }

    pub fn len(&self) -> usize {
        self.constituents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constituents.is_empty()
    }

    /// Instrument codes in list order.
    pub fn codes(&self) -> Vec<String> {
        self.constituents.iter().map(|c| c.code.clone()).collect()
    }

    /// Display name for a code, if the code is a constituent.
    pub fn name_of(&self, code: &str) -> Option<&str> {
        self.constituents
            .iter()
            .find(|c| c.code == code)
            .map(|c| c.code_name.as_str())
    }

    pub fn constituents(&self) -> &[Constituent] {
        &self.constituents
    }
}

/// Fetch the CSI 500 membership list and persist it to the store.
pub async fn refresh_constituents(
    store: &CacheStore,
    client: &Client,
) -> Result<Universe, CsiQuantError> {
    let constituents = client.get_csi500_constituents().await?;
    write_records(&store.constituents_path(), &constituents)?;
    tracing::info!("fetched {} CSI 500 constituents", constituents.len());
    Ok(Universe::new(constituents))
}

/// Load the cached constituent list, fetching it on first use.
pub async fn ensure_constituents(
    store: &CacheStore,
    client: &Client,
) -> Result<Universe, CsiQuantError> {
    let path = store.constituents_path();
    if !path.exists() {
        tracing::info!("no cached constituent list, fetching");
        return refresh_constituents(store, client).await;
    }
    Ok(Universe::new(read_records(&path)?))
}

/// Fetch the full-market security list and persist it to the store.
pub async fn refresh_securities(
    store: &CacheStore,
    client: &Client,
) -> Result<Vec<Security>, CsiQuantError> {
    let securities = client.get_all_securities().await?;
    write_records(&store.securities_path(), &securities)?;
    tracing::info!("fetched {} securities", securities.len());
    Ok(securities)
}

/// Load the cached security list.
pub fn load_securities(store: &CacheStore) -> Result<Vec<Security>, CsiQuantError> {
    read_records(&store.securities_path())
}

/// Substring search over display names, in list order.
pub fn search_by_name<'a>(securities: &'a [Security], keyword: &str) -> Vec<&'a Security> {
    securities
        .iter()
        .filter(|s| s.code_name.contains(keyword))
        .collect()
}

/// Read a watchlist file: one instrument code per line, blank lines ignored,
/// every code validated.
pub fn read_watchlist(path: &Path) -> Result<Vec<String>, CsiQuantError> {
    let contents = fs::read_to_string(path)?;
    let mut codes = Vec::new();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        codes.push(validate_code(line)?);
    }
    if codes.is_empty() {
        return Err(CsiQuantError::InvalidInput(format!(
            "watchlist {} contains no instrument codes",
            path.display()
        )));
    }
    Ok(codes)
}

fn write_records<T: serde::Serialize>(path: &Path, records: &[T]) -> Result<(), CsiQuantError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_writer(File::create(path)?);
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

fn read_records<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>, CsiQuantError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| CsiQuantError::Cache {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let mut records = Vec::new();
    for record in reader.deserialize() {
        let record: T = record.map_err(|e| CsiQuantError::Cache {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        records.push(record);
    }
    Ok(records)
}
