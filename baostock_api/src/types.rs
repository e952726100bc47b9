//! Wire types for the A-share market data gateway.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One trading day's forward-adjusted OHLCV record for an instrument.
///
/// The gateway returns daily history as a JSON array of these records,
/// ordered ascending by date. An empty array means the requested range
/// contains no trading days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub code: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

/// One row of the CSI 500 membership list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constituent {
    /// Exchange-qualified code, e.g. `sh.600000`.
    pub code: String,
    /// Display name; may contain non-ASCII characters.
    pub code_name: String,
    /// Date the membership list was last revised upstream.
    pub update_date: NaiveDate,
}

/// One row of the full-market security list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Security {
    pub code: String,
    pub code_name: String,
    /// `"1"` when the security traded on the list's reference day.
    pub trade_status: String,
}

/// One of the six quarterly statement categories served by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementCategory {
    Profit,
    Operation,
    Growth,
    Balance,
    CashFlow,
    Dupont,
}

impl StatementCategory {
    /// Every category, in the fixed declaration order consolidation relies on.
    pub const ALL: [StatementCategory; 6] = [
        StatementCategory::Profit,
        StatementCategory::Operation,
        StatementCategory::Growth,
        StatementCategory::Balance,
        StatementCategory::CashFlow,
        StatementCategory::Dupont,
    ];

    /// Path segment the gateway uses for this category.
    pub fn as_str(&self) -> &'static str {
        match self {
            StatementCategory::Profit => "profit",
            StatementCategory::Operation => "operation",
            StatementCategory::Growth => "growth",
            StatementCategory::Balance => "balance",
            StatementCategory::CashFlow => "cash_flow",
            StatementCategory::Dupont => "dupont",
        }
    }
}

/// A column table in the gateway's fields/rows shape.
///
/// Statement categories carry category-specific column sets whose order
/// matters downstream, so the gateway serves them as an ordered field list
/// plus string rows rather than fixed structs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatementTable {
    pub fields: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl StatementTable {
    /// True when the table holds no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a column by exact field name.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f == name)
    }
}
