use std::fs::File;
use std::path::Path;

use anyhow::Result;
use csiquant_lib::screen::{BestDay, LimitMoves, RangeGain};
use serde::Serialize;
use tabled::{Table, Tabled};

#[derive(Clone, Debug)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn from_flag(flag: &str) -> Self {
        match flag {
            "json" => OutputFormat::Json,
            "csv" => OutputFormat::Csv,
            _ => OutputFormat::Table,
        }
    }
}

#[derive(Tabled, Serialize)]
struct LimitRow {
    #[tabled(rename = "Code")]
    #[serde(rename = "Code")]
    code: String,
    #[tabled(rename = "Count")]
    #[serde(rename = "Count")]
    count: usize,
    #[tabled(rename = "Dates")]
    #[serde(rename = "Dates")]
    dates: String,
    #[tabled(rename = "Change % List")]
    #[serde(rename = "Change % List")]
    changes: String,
}

#[derive(Tabled, Serialize)]
struct BestDayRow {
    #[tabled(rename = "Code")]
    #[serde(rename = "Code")]
    code: String,
    #[tabled(rename = "Date")]
    #[serde(rename = "Date")]
    date: String,
    #[tabled(rename = "Open")]
    #[serde(rename = "Open")]
    open: String,
    #[tabled(rename = "Close")]
    #[serde(rename = "Close")]
    close: String,
    #[tabled(rename = "Change %")]
    #[serde(rename = "Change %")]
    change_pct: String,
}

#[derive(Tabled, Serialize)]
struct RangeGainRow {
    #[tabled(rename = "Code")]
    #[serde(rename = "Code")]
    code: String,
    #[tabled(rename = "From")]
    #[serde(rename = "From")]
    start_date: String,
    #[tabled(rename = "To")]
    #[serde(rename = "To")]
    end_date: String,
    #[tabled(rename = "Start Close")]
    #[serde(rename = "Start Close")]
    start_close: String,
    #[tabled(rename = "End Close")]
    #[serde(rename = "End Close")]
    end_close: String,
    #[tabled(rename = "Change %")]
    #[serde(rename = "Change %")]
    change_pct: String,
}

// -- Row builders --

fn build_limit_rows(results: &[LimitMoves]) -> Vec<LimitRow> {
    results
        .iter()
        .map(|r| LimitRow {
            code: r.code.clone(),
            count: r.count,
            dates: r
                .dates
                .iter()
                .map(|d| d.to_string())
                .collect::<Vec<_>>()
                .join(", "),
            changes: r
                .changes_pct
                .iter()
                .map(|c| format!("{:.2}", c))
                .collect::<Vec<_>>()
                .join(", "),
        })
        .collect()
}

fn build_best_day_rows(results: &[BestDay]) -> Vec<BestDayRow> {
    results
        .iter()
        .map(|r| BestDayRow {
            code: r.code.clone(),
            date: r.date.to_string(),
            open: format!("{:.2}", r.open),
            close: format!("{:.2}", r.close),
            change_pct: format!("{:.2}", r.change_pct),
        })
        .collect()
}

fn build_range_gain_rows(results: &[RangeGain]) -> Vec<RangeGainRow> {
    results
        .iter()
        .map(|r| RangeGainRow {
            code: r.code.clone(),
            start_date: r.start_date.to_string(),
            end_date: r.end_date.to_string(),
            start_close: format!("{:.2}", r.start_close),
            end_close: format!("{:.2}", r.end_close),
            change_pct: format!("{:.2}", r.change_pct),
        })
        .collect()
}

// -- Printing --

fn print_rows<T: Tabled + Serialize>(rows: Vec<T>, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", Table::new(rows)),
        OutputFormat::Json => print_json(&rows),
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(std::io::stdout());
            for row in rows {
                wtr.serialize(row)?;
            }
            wtr.flush()?;
        }
    }
    Ok(())
}

pub fn print_limit_moves(results: &[LimitMoves], format: &OutputFormat) -> Result<()> {
    print_rows(build_limit_rows(results), format)
}

pub fn print_best_days(results: &[BestDay], format: &OutputFormat) -> Result<()> {
    print_rows(build_best_day_rows(results), format)
}

pub fn print_range_gains(results: &[RangeGain], format: &OutputFormat) -> Result<()> {
    print_rows(build_range_gain_rows(results), format)
}

pub fn print_json<T: serde::Serialize>(data: &T) {
    match serde_json::to_string_pretty(data) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize output: {}", e),
    }
}

// -- Saving --

pub fn save_limit_moves(results: &[LimitMoves], path: &Path) -> Result<()> {
    save_rows(build_limit_rows(results), path)
}

pub fn save_best_days(results: &[BestDay], path: &Path) -> Result<()> {
    save_rows(build_best_day_rows(results), path)
}

pub fn save_range_gains(results: &[RangeGain], path: &Path) -> Result<()> {
    save_rows(build_range_gain_rows(results), path)
}

fn save_rows<T: Serialize>(rows: Vec<T>, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut wtr = csv::Writer::from_writer(File::create(path)?);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}
