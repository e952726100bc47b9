//! Incremental and full-range synchronization of daily-bar caches.
//!
//! Both batch loops process one instrument at a time, in order. A failing
//! instrument is logged and counted; the loop always continues, so an
//! interrupted or partly failed batch can simply be re-run.

use std::time::Duration;

use baostock_api::Client;
use chrono::{Days, NaiveDate};

use crate::error::CsiQuantError;
use crate::store::CacheStore;

/// Result of syncing one instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// No usable cache exists. Incremental update never bootstraps missing
    /// instruments; the full download path does.
    NotCached,
    /// The cache already covers the requested end date, or the source
    /// returned nothing new. The file is left untouched.
    Current,
    /// The cache was extended with `fetched` freshly downloaded rows.
    Updated { fetched: usize },
}

/// Counters for an incremental batch run.
#[derive(Debug, Default, Clone, Copy)]
pub struct SyncSummary {
    pub updated: usize,
    pub current: usize,
    pub not_cached: usize,
    pub failed: usize,
}

/// Counters for a full-range download run.
#[derive(Debug, Default, Clone, Copy)]
pub struct DownloadSummary {
    pub downloaded: usize,
    pub empty: usize,
    pub failed: usize,
}

/// Incrementally extend one instrument's cache through `end_date`.
///
/// The delta range starts the day after the latest cached bar; only that
/// range is fetched. The merged table is rewritten in full, which is safe
/// because it is a strict superset of the previous contents.
pub async fn sync_instrument(
    store: &CacheStore,
    client: &Client,
    code: &str,
    end_date: NaiveDate,
) -> Result<SyncOutcome, CsiQuantError> {
    if !store.has_daily(code) {
        return Ok(SyncOutcome::NotCached);
    }
    let cached = store.read_daily(code)?;
    let Some(last) = cached.last() else {
        // A header-only file has no date to extend from; treat it like a
        // missing cache and leave bootstrapping to the full download path.
        return Ok(SyncOutcome::NotCached);
    };
    let start = last
        .date
        .checked_add_days(Days::new(1))
        .ok_or_else(|| CsiQuantError::InvalidInput(format!("cached date out of range for {}", code)))?;
    if start > end_date {
        return Ok(SyncOutcome::Current);
    }

    let fresh = client.get_daily_bars(code, start, end_date).await?;
    if fresh.is_empty() {
        return Ok(SyncOutcome::Current);
    }

    let fetched = fresh.len();
    let mut merged = cached;
    merged.extend(fresh);
    store.write_daily(code, &merged)?;
    Ok(SyncOutcome::Updated { fetched })
}

/// Incremental sync over an instrument list, one instrument at a time.
/// `progress` is called with (processed, total) after each instrument.
pub async fn update_all(
    store: &CacheStore,
    client: &Client,
    codes: &[String],
    end_date: NaiveDate,
    mut progress: impl FnMut(usize, usize),
) -> SyncSummary {
    let mut summary = SyncSummary::default();
    let total = codes.len();
    for (idx, code) in codes.iter().enumerate() {
        match sync_instrument(store, client, code, end_date).await {
            Ok(SyncOutcome::Updated { fetched }) => {
                tracing::debug!("{}: {} new rows", code, fetched);
                summary.updated += 1;
            }
            Ok(SyncOutcome::Current) => summary.current += 1,
            Ok(SyncOutcome::NotCached) => {
                tracing::warn!("no local cache for {}, skipping", code);
                summary.not_cached += 1;
            }
            Err(e) => {
                tracing::warn!("update failed for {}: {}", code, e);
                summary.failed += 1;
            }
        }
        progress(idx + 1, total);
    }
    summary
}

/// Full-range download over an instrument list: one fetch per instrument,
/// overwriting any existing cache file. Used for first-time population or a
/// full refresh. A fixed `delay` between instruments keeps the request rate
/// down; instruments with no data in the range are skipped without writing.
pub async fn download_all(
    store: &CacheStore,
    client: &Client,
    codes: &[String],
    start: NaiveDate,
    end: NaiveDate,
    delay: Duration,
    mut progress: impl FnMut(usize, usize),
) -> DownloadSummary {
    let mut summary = DownloadSummary::default();
    let total = codes.len();
    for (idx, code) in codes.iter().enumerate() {
        match client.get_daily_bars(code, start, end).await {
            Ok(bars) if bars.is_empty() => {
                tracing::warn!("{} returned no data for {}..{}", code, start, end);
                summary.empty += 1;
            }
            Ok(bars) => match store.write_daily(code, &bars) {
                Ok(()) => summary.downloaded += 1,
                Err(e) => {
                    tracing::warn!("failed to persist {}: {}", code, e);
                    summary.failed += 1;
                }
            },
            Err(e) => {
                tracing::warn!("download failed for {}: {}", code, e);
                summary.failed += 1;
            }
        }
        progress(idx + 1, total);
        if idx + 1 < total && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
    summary
}
