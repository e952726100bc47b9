//! Flat-file cache store for daily bars, statement tables, and list files.
//!
//! Every path derives from the stable instrument code only (`sh.600000` maps
//! to `sh_600000.csv`); display names are metadata in the constituent list
//! and never part of a file's identity, so a renamed company keeps its cache.

use std::collections::BTreeMap;
use std::fs;
use std::fs::File;
use std::path::{Path, PathBuf};

use baostock_api::types::DailyBar;

use crate::error::CsiQuantError;
use crate::statements::Quarter;
use crate::table::Table;

/// Flat-file cache rooted at a data directory.
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn code_stem(code: &str) -> String {
        code.replace('.', "_")
    }

    fn stem_to_code(stem: &str) -> String {
        stem.replacen('_', ".", 1)
    }

    /// Daily-bar cache file for one instrument.
    pub fn daily_path(&self, code: &str) -> PathBuf {
        self.root
            .join("daily")
            .join(format!("{}.csv", Self::code_stem(code)))
    }

    /// Statement file for one instrument and fiscal quarter.
    pub fn period_path(&self, code: &str, quarter: Quarter) -> PathBuf {
        self.root
            .join("financials")
            .join(format!("{}_{}.csv", Self::code_stem(code), quarter))
    }

    /// Merged statement history for one instrument.
    pub fn merged_path(&self, code: &str) -> PathBuf {
        self.root
            .join("financials")
            .join(format!("{}.csv", Self::code_stem(code)))
    }

    /// Date-normalized statement history for one instrument.
    pub fn cleaned_path(&self, code: &str) -> PathBuf {
        self.root
            .join("cleaned")
            .join(format!("{}.csv", Self::code_stem(code)))
    }

    /// Exported metric series for one instrument and metric column.
    pub fn series_path(&self, code: &str, field: &str) -> PathBuf {
        self.root
            .join("series")
            .join(format!("{}_{}.csv", Self::code_stem(code), field))
    }

    /// CSI 500 constituent list.
    pub fn constituents_path(&self) -> PathBuf {
        self.root.join("csi500.csv")
    }

    /// Full-market security list.
    pub fn securities_path(&self) -> PathBuf {
        self.root.join("securities.csv")
    }

    // -- Daily bars --

    pub fn has_daily(&self, code: &str) -> bool {
        self.daily_path(code).exists()
    }

    /// Reads one instrument's cached daily bars. A file that exists but does
    /// not parse is reported as [`CsiQuantError::Cache`]; callers treat that
    /// as "no usable cache" rather than aborting a batch.
    pub fn read_daily(&self, code: &str) -> Result<Vec<DailyBar>, CsiQuantError> {
        let path = self.daily_path(code);
        let mut reader = csv::Reader::from_path(&path).map_err(|e| CsiQuantError::Cache {
            path: path.clone(),
            message: e.to_string(),
        })?;
        let mut bars = Vec::new();
        for record in reader.deserialize() {
            let bar: DailyBar = record.map_err(|e| CsiQuantError::Cache {
                path: path.clone(),
                message: e.to_string(),
            })?;
            bars.push(bar);
        }
        Ok(bars)
    }

    /// Rewrites one instrument's daily-bar cache in full. The bars are keyed
    /// by trading date before writing (later entries win), so the persisted
    /// table is always duplicate-free and strictly ascending.
    pub fn write_daily(&self, code: &str, bars: &[DailyBar]) -> Result<(), CsiQuantError> {
        let path = self.daily_path(code);
        ensure_parent(&path)?;
        let mut by_date = BTreeMap::new();
        for bar in bars {
            by_date.insert(bar.date, bar.clone());
        }
        let mut writer = csv::Writer::from_writer(File::create(&path)?);
        for bar in by_date.values() {
            writer.serialize(bar)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Codes of every instrument with a daily-bar cache file, sorted.
    pub fn cached_daily_codes(&self) -> Result<Vec<String>, CsiQuantError> {
        let dir = self.root.join("daily");
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut codes = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().map_or(false, |ext| ext == "csv") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    codes.push(Self::stem_to_code(stem));
                }
            }
        }
        codes.sort();
        Ok(codes)
    }

    // -- Statement tables --

    /// True when a non-empty statement file already exists for the period.
    /// Unreadable files count as absent so a re-run fetches them again.
    pub fn has_period(&self, code: &str, quarter: Quarter) -> bool {
        let path = self.period_path(code, quarter);
        if !path.exists() {
            return false;
        }
        match csv::Reader::from_path(&path) {
            Ok(mut reader) => matches!(reader.records().next(), Some(Ok(_))),
            Err(_) => false,
        }
    }

    /// Fiscal quarters with a statement file for this instrument, sorted.
    pub fn cached_quarters(&self, code: &str) -> Result<Vec<Quarter>, CsiQuantError> {
        let dir = self.root.join("financials");
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let prefix = format!("{}_", Self::code_stem(code));
        let mut quarters = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if !path.extension().map_or(false, |ext| ext == "csv") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if let Some(rest) = stem.strip_prefix(&prefix) {
                if let Ok(quarter) = rest.parse::<Quarter>() {
                    quarters.push(quarter);
                }
            }
        }
        quarters.sort();
        Ok(quarters)
    }

    pub fn read_table(&self, path: &Path) -> Result<Table, CsiQuantError> {
        Table::read_csv(path)
    }

    pub fn write_table(&self, path: &Path, table: &Table) -> Result<(), CsiQuantError> {
        ensure_parent(path)?;
        table.write_csv(path)
    }
}

fn ensure_parent(path: &Path) -> Result<(), CsiQuantError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}
