//! Quarterly statement download, consolidation, and history maintenance.
//!
//! Each fiscal quarter of an instrument is assembled from up to six
//! category tables (profitability, operational efficiency, growth, solvency,
//! cash flow, DuPont). Non-empty categories are tagged with a column prefix
//! and concatenated side by side into one period file; all period files of an
//! instrument are later stacked into a history file and the per-category date
//! columns collapsed to one canonical pair.

use std::fmt;
use std::str::FromStr;

use baostock_api::types::{StatementCategory, StatementTable};
use baostock_api::Client;
use chrono::NaiveDate;

use crate::error::CsiQuantError;
use crate::store::CacheStore;
use crate::table::Table;

/// Canonical statement-date column name.
pub const STAT_DATE: &str = "statDate";
/// Canonical publication-date column name.
pub const PUB_DATE: &str = "pubDate";

/// Column prefix a category's fields are tagged with after consolidation.
pub fn category_prefix(category: StatementCategory) -> &'static str {
    match category {
        StatementCategory::Profit => "profit",
        StatementCategory::Operation => "operation",
        StatementCategory::Growth => "growth",
        StatementCategory::Balance => "balance",
        StatementCategory::CashFlow => "cash",
        StatementCategory::Dupont => "dupont",
    }
}

/// A fiscal quarter, e.g. `2023Q2`. Ordering is lexicographic by
/// (year, quarter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quarter {
    year: i32,
    quarter: u32,
}

impl Quarter {
    pub fn new(year: i32, quarter: u32) -> Result<Self, CsiQuantError> {
        if !(1..=4).contains(&quarter) {
            return Err(CsiQuantError::InvalidInput(format!(
                "quarter must be between 1 and 4, got {}",
                quarter
            )));
        }
        if !(1990..=2100).contains(&year) {
            return Err(CsiQuantError::InvalidInput(format!(
                "year must be between 1990 and 2100, got {}",
                year
            )));
        }
        Ok(Self { year, quarter })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn quarter(&self) -> u32 {
        self.quarter
    }

    /// Calendar end date of the quarter (Q1 → 03-31, … Q4 → 12-31).
    pub fn end_date(&self) -> NaiveDate {
        let (month, day) = match self.quarter {
            1 => (3, 31),
            2 => (6, 30),
            3 => (9, 30),
            _ => (12, 31),
        };
        NaiveDate::from_ymd_opt(self.year, month, day).expect("quarter end date is valid")
    }

    pub fn next(&self) -> Quarter {
        if self.quarter == 4 {
            Quarter {
                year: self.year + 1,
                quarter: 1,
            }
        } else {
            Quarter {
                year: self.year,
                quarter: self.quarter + 1,
            }
        }
    }

    /// Every quarter from `start` through `end`, inclusive. Empty when
    /// `start > end`.
    pub fn range(start: Quarter, end: Quarter) -> Vec<Quarter> {
        let mut quarters = Vec::new();
        let mut current = start;
        while current <= end {
            quarters.push(current);
            current = current.next();
        }
        quarters
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}Q{}", self.year, self.quarter)
    }
}

impl FromStr for Quarter {
    type Err = CsiQuantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let parsed = trimmed
            .split_once(['Q', 'q'])
            .and_then(|(year, quarter)| {
                Some((year.parse::<i32>().ok()?, quarter.parse::<u32>().ok()?))
            });
        match parsed {
            Some((year, quarter)) => Quarter::new(year, quarter),
            None => Err(CsiQuantError::InvalidInput(format!(
                "invalid quarter '{}'. Expected format: YYYYQn (e.g. 2023Q2)",
                trimmed
            ))),
        }
    }
}

/// Coerce a statDate cell to a calendar date. Accepts `YYYY-MM-DD` and the
/// synthesized `YYYYQn` form (mapped to the quarter's end date).
pub(crate) fn parse_stat_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }
    trimmed.parse::<Quarter>().ok().map(|q| q.end_date())
}

/// Counters for a batch consolidation run.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsolidationSummary {
    /// Quarters fetched and persisted.
    pub fetched: usize,
    /// Quarters skipped because a non-empty file already existed.
    pub cached: usize,
    /// Quarters where every category came back empty.
    pub empty: usize,
    /// Quarters that could not be persisted.
    pub failed: usize,
    /// Instruments whose history was merged and normalized.
    pub merged: usize,
}

/// Canonical statement date for one consolidated period: the profitability
/// fragment's statDate column if present, else the operational fragment's,
/// else the synthesized `YYYYQn` label. Only non-empty fragments are passed
/// in, so presence in the list implies the category returned data.
fn canonical_stat_date(
    fragments: &[(StatementCategory, StatementTable)],
    quarter: Quarter,
) -> Vec<String> {
    for wanted in [StatementCategory::Profit, StatementCategory::Operation] {
        if let Some((_, fragment)) = fragments.iter().find(|(category, _)| *category == wanted) {
            if let Some(idx) = fragment.column(STAT_DATE) {
                return fragment
                    .rows
                    .iter()
                    .map(|row| row.get(idx).cloned().unwrap_or_default())
                    .collect();
            }
        }
    }
    vec![quarter.to_string()]
}

/// Merge non-empty category fragments into one period table: each fragment's
/// columns are prefixed with its category tag and concatenated side by side
/// in declaration order, then the canonical `statDate` column is appended.
/// Returns `None` when there is nothing to merge.
pub fn consolidate(
    fragments: Vec<(StatementCategory, StatementTable)>,
    quarter: Quarter,
) -> Option<Table> {
    let fragments: Vec<_> = fragments
        .into_iter()
        .filter(|(_, fragment)| !fragment.is_empty())
        .collect();
    if fragments.is_empty() {
        return None;
    }

    let mut stat_date = canonical_stat_date(&fragments, quarter);

    let mut merged = Table::default();
    for (category, fragment) in fragments {
        let part = Table::from_parts(fragment.fields, fragment.rows)
            .prefixed(category_prefix(category));
        merged.hconcat(part);
    }

    let fill = stat_date.last().cloned().unwrap_or_default();
    stat_date.resize(merged.n_rows(), fill);
    merged.push_column(STAT_DATE, stat_date);
    Some(merged)
}

/// Query all six categories for one instrument and quarter and consolidate
/// the results. A failing or empty category contributes nothing; `None` means
/// every category was empty (or failed) and nothing should be persisted.
pub async fn fetch_quarter(client: &Client, code: &str, quarter: Quarter) -> Option<Table> {
    let mut fragments = Vec::new();
    for category in StatementCategory::ALL {
        match client
            .get_statement(category, code, quarter.year(), quarter.quarter())
            .await
        {
            Ok(fragment) if !fragment.is_empty() => fragments.push((category, fragment)),
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(
                    "{} {} {} query failed: {}",
                    code,
                    quarter,
                    category.as_str(),
                    e
                );
            }
        }
    }
    consolidate(fragments, quarter)
}

/// Batch consolidation over an inclusive quarter range. Quarters with an
/// existing non-empty file are not re-fetched, so a re-run after a successful
/// pass issues no requests and rewrites the same merged output. Per-quarter
/// and per-instrument failures are logged and counted, never fatal.
pub async fn download_range(
    store: &CacheStore,
    client: &Client,
    codes: &[String],
    start: Quarter,
    end: Quarter,
    mut progress: impl FnMut(usize, usize),
) -> Result<ConsolidationSummary, CsiQuantError> {
    if start > end {
        return Err(CsiQuantError::InvalidInput(format!(
            "quarter range start {} is after end {}",
            start, end
        )));
    }
    let quarters = Quarter::range(start, end);
    let total = codes.len() * quarters.len();
    let mut done = 0;
    let mut summary = ConsolidationSummary::default();

    for code in codes {
        for &quarter in &quarters {
            done += 1;
            if store.has_period(code, quarter) {
                summary.cached += 1;
                progress(done, total);
                continue;
            }
            match fetch_quarter(client, code, quarter).await {
                Some(table) => {
                    let path = store.period_path(code, quarter);
                    match store.write_table(&path, &table) {
                        Ok(()) => summary.fetched += 1,
                        Err(e) => {
                            tracing::warn!("failed to persist {} {}: {}", code, quarter, e);
                            summary.failed += 1;
                        }
                    }
                }
                None => summary.empty += 1,
            }
            progress(done, total);
        }

        match merge_periods(store, code) {
            Ok(true) => match normalize_dates(store, code) {
                Ok(()) => summary.merged += 1,
                Err(e) => tracing::warn!("date normalization failed for {}: {}", code, e),
            },
            Ok(false) => {}
            Err(e) => tracing::warn!("history merge failed for {}: {}", code, e),
        }
    }

    Ok(summary)
}

/// Rebuild an instrument's full statement history from its period files.
/// Returns `false` when there was nothing to merge. Unreadable period files
/// are skipped with a warning.
pub fn merge_periods(store: &CacheStore, code: &str) -> Result<bool, CsiQuantError> {
    let quarters = store.cached_quarters(code)?;
    if quarters.is_empty() {
        tracing::warn!("no quarterly files found for {}", code);
        return Ok(false);
    }

    let mut history = Table::default();
    let mut read = 0;
    for quarter in quarters {
        let path = store.period_path(code, quarter);
        match store.read_table(&path) {
            Ok(table) if !table.is_empty() => {
                history.vconcat(table);
                read += 1;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("skipping unreadable period file {}: {}", path.display(), e);
            }
        }
    }
    if read == 0 {
        tracing::warn!("all quarterly files unreadable or empty for {}", code);
        return Ok(false);
    }

    sort_by_stat_date(&mut history, code);
    store.write_table(&store.merged_path(code), &history)?;
    Ok(true)
}

fn sort_by_stat_date(history: &mut Table, code: &str) {
    let Some(idx) = history.column_index(STAT_DATE) else {
        tracing::warn!("no statDate column in merged history for {}", code);
        return;
    };
    let coercible = history
        .rows()
        .iter()
        .all(|row| parse_stat_date(&row[idx]).is_some());
    if coercible {
        history.sort_rows_by_key(idx, |value| {
            parse_stat_date(value).unwrap_or(NaiveDate::MIN)
        });
    } else {
        tracing::warn!("statDate coercion failed for {}, leaving history unsorted", code);
    }
}

/// Ordered candidate columns for one canonical date field: the canonical name
/// first, then each category's prefixed variant in declaration order.
fn date_candidates(canonical: &str) -> Vec<String> {
    let mut candidates = vec![canonical.to_string()];
    for category in StatementCategory::ALL {
        candidates.push(format!("{}_{}", category_prefix(category), canonical));
    }
    candidates
}

/// Collapse the per-category statDate/pubDate duplicates down to one
/// canonical column each (first candidate with any data wins, the rest are
/// dropped) and move the date columns to the front. Running this on an
/// already-normalized table changes nothing.
pub fn normalize_table(history: &mut Table) {
    for canonical in [STAT_DATE, PUB_DATE] {
        let candidates = date_candidates(canonical);
        let winner = candidates
            .iter()
            .find(|name| history.column_has_data(name))
            .cloned();
        match winner {
            Some(winner) => {
                let values = history
                    .column_values(&winner)
                    .unwrap_or_default();
                history.drop_columns(&candidates);
                history.push_column(canonical, values);
            }
            None => {
                // No candidate carries data; drop the stale duplicates but
                // leave an existing (all-blank) canonical column alone.
                history.drop_columns(&candidates[1..]);
            }
        }
    }
    history.move_columns_front(&[STAT_DATE, PUB_DATE]);
}

/// Read the merged history, normalize its date columns, and persist the
/// cleaned file.
pub fn normalize_dates(store: &CacheStore, code: &str) -> Result<(), CsiQuantError> {
    let mut history = store.read_table(&store.merged_path(code))?;
    normalize_table(&mut history);
    store.write_table(&store.cleaned_path(code), &history)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quarter(s: &str) -> Quarter {
        s.parse().unwrap()
    }

    fn fragment(fields: &[&str], row: &[&str]) -> StatementTable {
        StatementTable {
            fields: fields.iter().map(|f| f.to_string()).collect(),
            rows: vec![row.iter().map(|c| c.to_string()).collect()],
        }
    }

    // -- Quarter --

    #[test]
    fn quarter_parse_and_display() {
        let q = quarter("2023Q2");
        assert_eq!(q.year(), 2023);
        assert_eq!(q.quarter(), 2);
        assert_eq!(q.to_string(), "2023Q2");
        assert_eq!(quarter("2020q4"), quarter("2020Q4"));
    }

    #[test]
    fn quarter_parse_rejects_garbage() {
        assert!("2023".parse::<Quarter>().is_err());
        assert!("2023Q5".parse::<Quarter>().is_err());
        assert!("2023Q0".parse::<Quarter>().is_err());
        assert!("Q2".parse::<Quarter>().is_err());
        assert!("20a3Q2".parse::<Quarter>().is_err());
    }

    #[test]
    fn quarter_ordering_is_lexicographic() {
        assert!(quarter("2020Q4") < quarter("2021Q1"));
        assert!(quarter("2021Q2") < quarter("2021Q3"));
    }

    #[test]
    fn quarter_range_inclusive() {
        let range = Quarter::range(quarter("2020Q3"), quarter("2021Q2"));
        let labels: Vec<String> = range.iter().map(|q| q.to_string()).collect();
        assert_eq!(labels, vec!["2020Q3", "2020Q4", "2021Q1", "2021Q2"]);

        assert_eq!(
            Quarter::range(quarter("2021Q1"), quarter("2021Q1")).len(),
            1
        );
        assert!(Quarter::range(quarter("2021Q2"), quarter("2021Q1")).is_empty());
    }

    #[test]
    fn quarter_end_dates() {
        assert_eq!(quarter("2023Q1").end_date().to_string(), "2023-03-31");
        assert_eq!(quarter("2023Q2").end_date().to_string(), "2023-06-30");
        assert_eq!(quarter("2023Q4").end_date().to_string(), "2023-12-31");
    }

    #[test]
    fn stat_date_coercion_accepts_both_forms() {
        assert_eq!(
            parse_stat_date("2023-06-30").unwrap().to_string(),
            "2023-06-30"
        );
        assert_eq!(
            parse_stat_date("2023Q2").unwrap().to_string(),
            "2023-06-30"
        );
        assert!(parse_stat_date("first half 2023").is_none());
    }

    // -- Consolidation --

    #[test]
    fn consolidate_tags_and_joins_non_empty_fragments() {
        let profit = fragment(
            &["code", "statDate", "roeAvg"],
            &["AAA", "2023-06-30", "0.05"],
        );
        let cash = fragment(&["code", "statDate", "CFOToOR"], &["AAA", "2023-06-30", "0.31"]);
        let empty = StatementTable::default();

        let merged = consolidate(
            vec![
                (StatementCategory::Profit, profit),
                (StatementCategory::Operation, empty.clone()),
                (StatementCategory::Growth, empty.clone()),
                (StatementCategory::Balance, empty.clone()),
                (StatementCategory::CashFlow, cash),
                (StatementCategory::Dupont, empty),
            ],
            quarter("2023Q2"),
        )
        .unwrap();

        assert_eq!(
            merged.columns(),
            &[
                "profit_code",
                "profit_statDate",
                "profit_roeAvg",
                "cash_code",
                "cash_statDate",
                "cash_CFOToOR",
                "statDate",
            ]
        );
        assert_eq!(merged.n_rows(), 1);
        assert_eq!(merged.rows()[0][6], "2023-06-30");
    }

    #[test]
    fn consolidate_stat_date_falls_back_to_operation() {
        let operation = fragment(&["statDate", "NRTurnRatio"], &["2023-06-30", "4.2"]);
        let merged = consolidate(
            vec![(StatementCategory::Operation, operation)],
            quarter("2023Q2"),
        )
        .unwrap();
        let idx = merged.column_index(STAT_DATE).unwrap();
        assert_eq!(merged.rows()[0][idx], "2023-06-30");
    }

    #[test]
    fn consolidate_synthesizes_stat_date_when_absent() {
        let growth = fragment(&["YOYNI"], &["0.12"]);
        let merged = consolidate(
            vec![(StatementCategory::Growth, growth)],
            quarter("2023Q2"),
        )
        .unwrap();
        let idx = merged.column_index(STAT_DATE).unwrap();
        assert_eq!(merged.rows()[0][idx], "2023Q2");
    }

    #[test]
    fn consolidate_all_empty_is_none() {
        let fragments = StatementCategory::ALL
            .iter()
            .map(|&category| (category, StatementTable::default()))
            .collect();
        assert!(consolidate(fragments, quarter("2023Q2")).is_none());
    }

    // -- Normalization --

    fn history_with_duplicate_dates() -> Table {
        Table::from_parts(
            vec![
                "profit_statDate".to_string(),
                "profit_pubDate".to_string(),
                "profit_roeAvg".to_string(),
                "operation_statDate".to_string(),
                "statDate".to_string(),
            ],
            vec![vec![
                "2023-06-30".to_string(),
                "2023-08-31".to_string(),
                "0.05".to_string(),
                "2023-06-30".to_string(),
                "2023-06-30".to_string(),
            ]],
        )
    }

    #[test]
    fn normalize_collapses_duplicates_and_leads_with_dates() {
        let mut history = history_with_duplicate_dates();
        normalize_table(&mut history);
        assert_eq!(history.columns(), &["statDate", "pubDate", "profit_roeAvg"]);
        assert_eq!(
            history.rows()[0],
            vec!["2023-06-30", "2023-08-31", "0.05"]
        );
    }

    #[test]
    fn normalize_prefers_canonical_column_when_it_has_data() {
        let mut history = Table::from_parts(
            vec!["profit_statDate".to_string(), "statDate".to_string()],
            vec![vec!["1999-01-01".to_string(), "2023-06-30".to_string()]],
        );
        normalize_table(&mut history);
        assert_eq!(history.columns(), &["statDate"]);
        assert_eq!(history.rows()[0], vec!["2023-06-30"]);
    }

    #[test]
    fn normalize_is_idempotent() {
        let mut once = history_with_duplicate_dates();
        normalize_table(&mut once);
        let mut twice = once.clone();
        normalize_table(&mut twice);
        assert_eq!(once, twice);
    }

    #[test]
    fn normalize_without_any_date_columns_keeps_data() {
        let mut history = Table::from_parts(
            vec!["profit_roeAvg".to_string()],
            vec![vec!["0.05".to_string()]],
        );
        normalize_table(&mut history);
        assert_eq!(history.columns(), &["profit_roeAvg"]);
    }
}
