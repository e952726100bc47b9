//! Threshold screeners over cached daily-bar tables.
//!
//! All screeners are read-only scans of the local cache; instruments whose
//! files fail to parse are skipped with a warning.

use std::cmp::Ordering;

use baostock_api::types::DailyBar;
use chrono::NaiveDate;
use serde::Serialize;

use crate::error::CsiQuantError;
use crate::store::CacheStore;

/// Direction of a limit-move scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitDirection {
    Up,
    Down,
}

/// Per-instrument result of a limit-move scan.
#[derive(Debug, Clone, Serialize)]
pub struct LimitMoves {
    pub code: String,
    pub count: usize,
    pub dates: Vec<NaiveDate>,
    /// Percentage change on each qualifying day, in percent.
    pub changes_pct: Vec<f64>,
}

/// An instrument's best single trading day within the trailing window.
#[derive(Debug, Clone, Serialize)]
pub struct BestDay {
    pub code: String,
    pub date: NaiveDate,
    pub open: f64,
    pub close: f64,
    pub change_pct: f64,
}

/// An instrument's close-to-close change over the trailing span.
#[derive(Debug, Clone, Serialize)]
pub struct RangeGain {
    pub code: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_close: f64,
    pub end_close: f64,
    pub change_pct: f64,
}

/// Single-day percentage change, `(close - open) / open`.
fn pct_change(bar: &DailyBar) -> Option<f64> {
    if bar.open == 0.0 || !bar.open.is_finite() || !bar.close.is_finite() {
        return None;
    }
    Some((bar.close - bar.open) / bar.open)
}

fn trailing(bars: &[DailyBar], window: usize) -> &[DailyBar] {
    &bars[bars.len().saturating_sub(window)..]
}

fn read_or_skip(store: &CacheStore, code: &str) -> Option<Vec<DailyBar>> {
    match store.read_daily(code) {
        Ok(bars) => Some(bars),
        Err(e) => {
            tracing::warn!("skipping unreadable cache for {}: {}", code, e);
            None
        }
    }
}

/// Scan every cached instrument for single-day moves at or beyond
/// `threshold` within the trailing `window` days. `threshold` is a positive
/// decimal (0.098 = 9.8%); for [`LimitDirection::Down`] the move must be at
/// or below its negation. Instruments with fewer than `window` cached days
/// are skipped. Results are ranked by count descending, ties stable by code
/// order.
pub fn limit_moves(
    store: &CacheStore,
    window: usize,
    threshold: f64,
    direction: LimitDirection,
) -> Result<Vec<LimitMoves>, CsiQuantError> {
    let mut results = Vec::new();
    for code in store.cached_daily_codes()? {
        let Some(bars) = read_or_skip(store, &code) else {
            continue;
        };
        if bars.len() < window {
            continue;
        }
        let mut dates = Vec::new();
        let mut changes_pct = Vec::new();
        for bar in trailing(&bars, window) {
            let Some(change) = pct_change(bar) else {
                continue;
            };
            let hit = match direction {
                LimitDirection::Up => change >= threshold,
                LimitDirection::Down => change <= -threshold,
            };
            if hit {
                dates.push(bar.date);
                changes_pct.push(change * 100.0);
            }
        }
        if dates.is_empty() {
            continue;
        }
        results.push(LimitMoves {
            code,
            count: dates.len(),
            dates,
            changes_pct,
        });
    }
    results.sort_by(|a, b| b.count.cmp(&a.count));
    Ok(results)
}

/// Find each instrument's best single-day percentage change in the trailing
/// `window` days and return the top `top_n`, ranked descending. Ties keep
/// the instruments' input order.
pub fn top_single_day_gainers(
    store: &CacheStore,
    window: usize,
    top_n: usize,
) -> Result<Vec<BestDay>, CsiQuantError> {
    let mut results = Vec::new();
    for code in store.cached_daily_codes()? {
        let Some(bars) = read_or_skip(store, &code) else {
            continue;
        };
        let mut best: Option<(&DailyBar, f64)> = None;
        for bar in trailing(&bars, window) {
            let Some(change) = pct_change(bar) else {
                continue;
            };
            // Strictly-greater keeps the earliest day on equal changes.
            if best.map_or(true, |(_, best_change)| change > best_change) {
                best = Some((bar, change));
            }
        }
        if let Some((bar, change)) = best {
            results.push(BestDay {
                code,
                date: bar.date,
                open: bar.open,
                close: bar.close,
                change_pct: change * 100.0,
            });
        }
    }
    results.sort_by(|a, b| {
        b.change_pct
            .partial_cmp(&a.change_pct)
            .unwrap_or(Ordering::Equal)
    });
    results.truncate(top_n);
    Ok(results)
}

/// Rank instruments by close-to-close change over the trailing `days` span
/// (latest close against the close `days` trading days earlier). Instruments
/// with insufficient history or an unusable start price are skipped.
pub fn top_range_gainers(
    store: &CacheStore,
    days: usize,
    top_n: usize,
) -> Result<Vec<RangeGain>, CsiQuantError> {
    let mut results = Vec::new();
    for code in store.cached_daily_codes()? {
        let Some(bars) = read_or_skip(store, &code) else {
            continue;
        };
        if bars.len() < days + 1 {
            continue;
        }
        let span = &bars[bars.len() - (days + 1)..];
        let first = &span[0];
        let last = &span[days];
        if first.close == 0.0 || !first.close.is_finite() || !last.close.is_finite() {
            continue;
        }
        let change = (last.close - first.close) / first.close;
        results.push(RangeGain {
            code,
            start_date: first.date,
            end_date: last.date,
            start_close: first.close,
            end_close: last.close,
            change_pct: change * 100.0,
        });
    }
    results.sort_by(|a, b| {
        b.change_pct
            .partial_cmp(&a.change_pct)
            .unwrap_or(Ordering::Equal)
    });
    results.truncate(top_n);
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn bar(code: &str, date: &str, open: f64, close: f64) -> DailyBar {
        DailyBar {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            code: code.to_string(),
            open,
            high: open.max(close) + 0.1,
            low: open.min(close) - 0.1,
            close,
            volume: 1_000_000,
        }
    }

    fn store_with(bars_by_code: &[(&str, Vec<DailyBar>)]) -> (TempDir, CacheStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        for (code, bars) in bars_by_code {
            store.write_daily(code, bars).unwrap();
        }
        (dir, store)
    }

    #[test]
    fn one_qualifying_limit_up_day() {
        // Five-day window; only day 3 moves 10%, above the 9.8% cutoff.
        let bars = vec![
            bar("sh.600000", "2024-01-02", 10.0, 10.1),
            bar("sh.600000", "2024-01-03", 10.0, 10.2),
            bar("sh.600000", "2024-01-04", 10.0, 11.0),
            bar("sh.600000", "2024-01-05", 10.0, 10.3),
            bar("sh.600000", "2024-01-08", 10.0, 9.9),
        ];
        let (_dir, store) = store_with(&[("sh.600000", bars)]);

        let results = limit_moves(&store, 5, 0.098, LimitDirection::Up).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].count, 1);
        assert_eq!(
            results[0].dates,
            vec![NaiveDate::from_ymd_opt(2024, 1, 4).unwrap()]
        );
        assert!((results[0].changes_pct[0] - 10.0).abs() < 1e-9);
    }

    #[test]
    fn limit_down_uses_negated_threshold() {
        let bars = vec![
            bar("sh.600000", "2024-01-02", 10.0, 9.0),
            bar("sh.600000", "2024-01-03", 10.0, 10.1),
        ];
        let (_dir, store) = store_with(&[("sh.600000", bars)]);

        let results = limit_moves(&store, 2, 0.098, LimitDirection::Down).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].count, 1);
        assert!(results[0].changes_pct[0] < 0.0);

        assert!(limit_moves(&store, 2, 0.098, LimitDirection::Up)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn limit_moves_skips_short_histories_and_ranks_by_count() {
        let busy = vec![
            bar("sh.600001", "2024-01-02", 10.0, 11.0),
            bar("sh.600001", "2024-01-03", 10.0, 11.1),
        ];
        let quiet = vec![
            bar("sh.600002", "2024-01-02", 10.0, 10.0),
            bar("sh.600002", "2024-01-03", 10.0, 11.2),
        ];
        let short = vec![bar("sh.600003", "2024-01-03", 10.0, 11.2)];
        let (_dir, store) = store_with(&[
            ("sh.600001", busy),
            ("sh.600002", quiet),
            ("sh.600003", short),
        ]);

        let results = limit_moves(&store, 2, 0.098, LimitDirection::Up).unwrap();
        let codes: Vec<&str> = results.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["sh.600001", "sh.600002"]);
        assert_eq!(results[0].count, 2);
    }

    #[test]
    fn gainers_pick_best_day_and_rank_stable() {
        let a = vec![
            bar("sh.600001", "2024-01-02", 10.0, 10.5),
            bar("sh.600001", "2024-01-03", 10.0, 10.2),
        ];
        // Same best change as a: the tie keeps code order.
        let b = vec![bar("sh.600002", "2024-01-03", 20.0, 21.0)];
        let c = vec![bar("sh.600003", "2024-01-03", 10.0, 10.9)];
        let (_dir, store) = store_with(&[("sh.600001", a), ("sh.600002", b), ("sh.600003", c)]);

        let results = top_single_day_gainers(&store, 30, 10).unwrap();
        let codes: Vec<&str> = results.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["sh.600003", "sh.600001", "sh.600002"]);
        assert_eq!(
            results[1].date,
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
        );

        let top_one = top_single_day_gainers(&store, 30, 1).unwrap();
        assert_eq!(top_one.len(), 1);
        assert_eq!(top_one[0].code, "sh.600003");
    }

    #[test]
    fn range_gainers_need_days_plus_one_rows() {
        let a = vec![
            bar("sh.600001", "2024-01-02", 10.0, 10.0),
            bar("sh.600001", "2024-01-03", 10.0, 10.4),
            bar("sh.600001", "2024-01-04", 10.0, 12.0),
        ];
        let short = vec![
            bar("sh.600002", "2024-01-03", 10.0, 10.0),
            bar("sh.600002", "2024-01-04", 10.0, 30.0),
        ];
        let (_dir, store) = store_with(&[("sh.600001", a), ("sh.600002", short)]);

        let results = top_range_gainers(&store, 2, 10).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].code, "sh.600001");
        assert!((results[0].change_pct - 20.0).abs() < 1e-9);
        assert_eq!(
            results[0].start_date,
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
        );
    }

    #[test]
    fn zero_open_days_are_ignored() {
        let bars = vec![
            bar("sh.600000", "2024-01-02", 0.0, 10.0),
            bar("sh.600000", "2024-01-03", 10.0, 10.1),
        ];
        let (_dir, store) = store_with(&[("sh.600000", bars)]);
        let results = limit_moves(&store, 2, 0.098, LimitDirection::Up).unwrap();
        assert!(results.is_empty());
    }
}
