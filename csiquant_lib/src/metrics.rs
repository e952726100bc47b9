//! Financial metric catalog and chart-ready series extraction.
//!
//! The catalog mirrors the six statement categories: each entry maps a
//! prefixed column of a normalized history file to a display label and the
//! formula behind it. Rendering is left to external tooling; the library
//! only extracts the `(statDate, value)` series.

use chrono::NaiveDate;

use crate::error::CsiQuantError;
use crate::statements::{parse_stat_date, STAT_DATE};
use crate::table::Table;

/// One plottable metric column.
pub struct Metric {
    pub field: &'static str,
    pub label: &'static str,
    pub formula: &'static str,
}

/// A named group of metrics, one per statement category.
pub struct MetricGroup {
    pub name: &'static str,
    pub metrics: &'static [Metric],
}

macro_rules! metric {
    ($field:expr, $label:expr, $formula:expr) => {
        Metric {
            field: $field,
            label: $label,
            formula: $formula,
        }
    };
}

pub const CATALOG: &[MetricGroup] = &[
    MetricGroup {
        name: "Profitability",
        metrics: &[
            metric!("profit_roeAvg", "ROE (%)", "Net Profit / Avg. Net Assets"),
            metric!("profit_npMargin", "Net Profit Margin (%)", "Net Profit / Revenue"),
            metric!("profit_gpMargin", "Gross Margin (%)", "Gross Profit / Revenue"),
            metric!("profit_netProfit", "Net Profit", "Total Profit - Tax"),
            metric!("profit_epsTTM", "EPS (Yuan)", "Net Profit / Total Shares"),
        ],
    },
    MetricGroup {
        name: "Operational Efficiency",
        metrics: &[
            metric!("operation_NRTurnRatio", "AR Turnover", "Net Sales / Avg. AR"),
            metric!("operation_NRTurnDays", "AR Turnover Days", "365 / AR Turnover"),
            metric!("operation_INVTurnRatio", "Inventory Turnover", "COGS / Avg. Inventory"),
            metric!("operation_INVTurnDays", "Inventory Turnover Days", "365 / Inventory Turnover"),
            metric!("operation_CATurnRatio", "Current Asset Turnover", "Revenue / Avg. Current Assets"),
            metric!("operation_AssetTurnRatio", "Total Asset Turnover", "Revenue / Avg. Total Assets"),
        ],
    },
    MetricGroup {
        name: "Growth",
        metrics: &[
            metric!("growth_YOYEquity", "Equity YoY (%)", "(Current - Prev) / Prev"),
            metric!("growth_YOYAsset", "Assets YoY (%)", "(Current - Prev) / Prev"),
            metric!("growth_YOYNI", "Net Profit YoY (%)", "(Current - Prev) / Prev"),
            metric!("growth_YOYEPSBasic", "EPS YoY (%)", "(Current - Prev) / Prev"),
            metric!("growth_YOYPNI", "Non-recurring Net Profit YoY (%)", "(Current - Prev) / Prev"),
        ],
    },
    MetricGroup {
        name: "Solvency",
        metrics: &[
            metric!("balance_currentRatio", "Current Ratio", "Current Assets / Current Liabilities"),
            metric!("balance_quickRatio", "Quick Ratio", "Quick Assets / Current Liabilities"),
            metric!("balance_cashRatio", "Cash Ratio", "Cash / Current Liabilities"),
            metric!("balance_YOYLiability", "Liability YoY", "(Current - Prev) / Prev"),
            metric!("balance_liabilityToAsset", "Debt-to-Asset Ratio", "Total Liabilities / Total Assets"),
            metric!("balance_assetToEquity", "Equity Multiplier", "Total Assets / Shareholder Equity"),
        ],
    },
    MetricGroup {
        name: "Cash Flow",
        metrics: &[
            metric!("cash_CAToAsset", "Current Assets / Total Assets", "Current Assets / Total Assets"),
            metric!("cash_NCAToAsset", "Non-Current Assets / Total", "Non-Current Assets / Total Assets"),
            metric!("cash_tangibleAssetToAsset", "Tangible / Total Assets", "Tangible Assets / Total"),
            metric!("cash_ebitToInterest", "EBIT / Interest", "EBIT / Interest Expense"),
            metric!("cash_CFOToOR", "Operating CF / Revenue", "Operating Cash Flow / Revenue"),
            metric!("cash_CFOToNP", "Operating CF / Net Profit", "OCF / Net Profit"),
            metric!("cash_CFOToGr", "Operating CF / Capex", "OCF / Capital Expenditure"),
        ],
    },
    MetricGroup {
        name: "DuPont Analysis",
        metrics: &[
            metric!("dupont_dupontROE", "DuPont ROE", "Net Profit / Equity"),
            metric!("dupont_dupontAssetStoEquity", "Equity Multiplier", "Assets / Equity"),
            metric!("dupont_dupontAssetTurn", "Asset Turnover", "Revenue / Assets"),
            metric!("dupont_dupontPnitoni", "Net Profit Margin", "Net Profit / Revenue"),
            metric!("dupont_dupontNitogr", "Net Margin", "Net Profit / Revenue"),
            metric!("dupont_dupontTaxBurden", "Tax Burden", "Net Profit / Pre-Tax Profit"),
            metric!("dupont_dupontIntburden", "Interest Burden", "Pre-Tax Profit / EBIT"),
            metric!("dupont_dupontEbittogr", "EBIT Margin", "EBIT / Revenue"),
        ],
    },
];

/// Look up a metric by its column key.
pub fn find_metric(field: &str) -> Option<&'static Metric> {
    CATALOG
        .iter()
        .flat_map(|group| group.metrics.iter())
        .find(|metric| metric.field == field)
}

/// Extract the `(statDate, value)` series for one metric column from a
/// normalized history table. Blank and unparseable cells are dropped; the
/// series is returned ascending by date.
pub fn metric_series(
    history: &Table,
    field: &str,
) -> Result<Vec<(NaiveDate, f64)>, CsiQuantError> {
    let date_idx = history.column_index(STAT_DATE).ok_or_else(|| {
        CsiQuantError::InvalidInput(format!(
            "history has no {} column; normalize it first",
            STAT_DATE
        ))
    })?;
    let value_idx = history.column_index(field).ok_or_else(|| {
        CsiQuantError::InvalidInput(format!("column '{}' not found in history", field))
    })?;

    let mut series: Vec<(NaiveDate, f64)> = history
        .rows()
        .iter()
        .filter_map(|row| {
            let date = parse_stat_date(&row[date_idx])?;
            let value = row[value_idx].trim().parse::<f64>().ok()?;
            Some((date, value))
        })
        .collect();
    series.sort_by_key(|(date, _)| *date);
    Ok(series)
}
