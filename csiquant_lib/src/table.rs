//! Ordered column table backing statement consolidation.
//!
//! Statement fragments carry category-specific column sets, so consolidation
//! works on a plain columns-plus-rows table rather than fixed structs. Cells
//! are strings exactly as the gateway and the CSV files carry them; numeric
//! interpretation happens at the edges (screeners, metric export).
//!
//! Invariant: every row is exactly as wide as the column list. Constructors
//! and mutators pad or truncate to keep that true.

use std::fs::File;
use std::path::Path;

use crate::error::CsiQuantError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Builds a table from raw parts, normalizing every row to the column width.
    pub fn from_parts(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// True when the table holds no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a column by exact name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Owned copy of one column's cells.
    pub fn column_values(&self, name: &str) -> Option<Vec<String>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| row[idx].clone()).collect())
    }

    /// True when the named column has at least one non-blank cell.
    pub fn column_has_data(&self, name: &str) -> bool {
        match self.column_index(name) {
            Some(idx) => self.rows.iter().any(|row| !row[idx].trim().is_empty()),
            None => false,
        }
    }

    /// Renames every column to `prefix_name`.
    pub fn prefixed(mut self, prefix: &str) -> Self {
        for column in &mut self.columns {
            *column = format!("{}_{}", prefix, column);
        }
        self
    }

    /// Appends `other`'s columns to the right, padding the shorter side's
    /// rows with blank cells.
    pub fn hconcat(&mut self, other: Table) {
        if self.columns.is_empty() {
            *self = other;
            return;
        }
        let left_width = self.columns.len();
        let height = self.rows.len().max(other.rows.len());
        self.columns.extend(other.columns);
        let full_width = self.columns.len();
        self.rows.resize_with(height, || vec![String::new(); left_width]);
        for (i, row) in self.rows.iter_mut().enumerate() {
            if let Some(extra) = other.rows.get(i) {
                row.extend(extra.iter().cloned());
            }
            row.resize(full_width, String::new());
        }
    }

    /// Appends `other`'s rows below, aligning columns by name. Columns missing
    /// on either side are filled with blank cells.
    pub fn vconcat(&mut self, other: Table) {
        if self.columns.is_empty() {
            *self = other;
            return;
        }
        for column in &other.columns {
            if self.column_index(column).is_none() {
                self.columns.push(column.clone());
            }
        }
        let width = self.columns.len();
        for row in &mut self.rows {
            row.resize(width, String::new());
        }
        for other_row in other.rows {
            let mut row = vec![String::new(); width];
            for (j, column) in self.columns.iter().enumerate() {
                if let Some(src) = other.columns.iter().position(|c| c == column) {
                    row[j] = other_row[src].clone();
                }
            }
            self.rows.push(row);
        }
    }

    /// Appends a column on the right, padding `values` with blanks (or the
    /// rows, if `values` is longer).
    pub fn push_column(&mut self, name: &str, mut values: Vec<String>) {
        let height = self.rows.len().max(values.len());
        let width = self.columns.len();
        values.resize(height, String::new());
        self.rows.resize_with(height, || vec![String::new(); width]);
        self.columns.push(name.to_string());
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
    }

    /// Drops every listed column that exists; unknown names are ignored.
    pub fn drop_columns(&mut self, names: &[String]) {
        let keep: Vec<usize> = (0..self.columns.len())
            .filter(|&i| !names.contains(&self.columns[i]))
            .collect();
        self.columns = keep.iter().map(|&i| self.columns[i].clone()).collect();
        for row in &mut self.rows {
            *row = keep.iter().map(|&i| row[i].clone()).collect();
        }
    }

    /// Moves the listed columns (those that exist) to the front, in the given
    /// order, keeping the relative order of the rest.
    pub fn move_columns_front(&mut self, names: &[&str]) {
        let mut order: Vec<usize> = Vec::with_capacity(self.columns.len());
        for name in names {
            if let Some(idx) = self.column_index(name) {
                order.push(idx);
            }
        }
        for i in 0..self.columns.len() {
            if !order.contains(&i) {
                order.push(i);
            }
        }
        self.columns = order.iter().map(|&i| self.columns[i].clone()).collect();
        for row in &mut self.rows {
            *row = order.iter().map(|&i| row[i].clone()).collect();
        }
    }

    /// Stable-sorts the rows by a key derived from one column's cells.
    pub fn sort_rows_by_key<K, F>(&mut self, column: usize, key: F)
    where
        K: Ord,
        F: Fn(&str) -> K,
    {
        self.rows.sort_by_key(|row| key(&row[column]));
    }

    /// Reads a table from a CSV file with a header row.
    pub fn read_csv(path: &Path) -> Result<Self, CsiQuantError> {
        let mut reader = csv::Reader::from_path(path)?;
        let columns: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.to_string())
            .collect();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(|cell| cell.to_string()).collect());
        }
        Ok(Self::from_parts(columns, rows))
    }

    /// Writes the table as CSV, header row first, overwriting any existing file.
    pub fn write_csv(&self, path: &Path) -> Result<(), CsiQuantError> {
        let mut writer = csv::Writer::from_writer(File::create(path)?);
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn from_parts_normalizes_row_width() {
        let t = Table::from_parts(strings(&["a", "b"]), vec![strings(&["1"]), strings(&["1", "2", "3"])]);
        assert_eq!(t.rows()[0], strings(&["1", ""]));
        assert_eq!(t.rows()[1], strings(&["1", "2"]));
    }

    #[test]
    fn prefixed_renames_all_columns() {
        let t = Table::from_parts(strings(&["statDate", "roeAvg"]), vec![]).prefixed("profit");
        assert_eq!(t.columns(), &["profit_statDate", "profit_roeAvg"]);
    }

    #[test]
    fn hconcat_pads_shorter_side() {
        let mut left = Table::from_parts(strings(&["a"]), vec![strings(&["1"]), strings(&["2"])]);
        let right = Table::from_parts(strings(&["b"]), vec![strings(&["x"])]);
        left.hconcat(right);
        assert_eq!(left.columns(), &["a", "b"]);
        assert_eq!(left.rows()[0], strings(&["1", "x"]));
        assert_eq!(left.rows()[1], strings(&["2", ""]));
    }

    #[test]
    fn hconcat_into_empty_takes_other() {
        let mut empty = Table::default();
        empty.hconcat(Table::from_parts(strings(&["a"]), vec![strings(&["1"])]));
        assert_eq!(empty.columns(), &["a"]);
        assert_eq!(empty.n_rows(), 1);
    }

    #[test]
    fn vconcat_unions_columns() {
        let mut top = Table::from_parts(strings(&["a", "b"]), vec![strings(&["1", "2"])]);
        let bottom = Table::from_parts(strings(&["b", "c"]), vec![strings(&["20", "30"])]);
        top.vconcat(bottom);
        assert_eq!(top.columns(), &["a", "b", "c"]);
        assert_eq!(top.rows()[0], strings(&["1", "2", ""]));
        assert_eq!(top.rows()[1], strings(&["", "20", "30"]));
    }

    #[test]
    fn push_column_pads_both_directions() {
        let mut t = Table::from_parts(strings(&["a"]), vec![strings(&["1"]), strings(&["2"])]);
        t.push_column("b", strings(&["x"]));
        assert_eq!(t.rows()[1], strings(&["2", ""]));

        let mut t = Table::from_parts(strings(&["a"]), vec![strings(&["1"])]);
        t.push_column("b", strings(&["x", "y"]));
        assert_eq!(t.rows()[1], strings(&["", "y"]));
    }

    #[test]
    fn drop_and_reorder_columns() {
        let mut t = Table::from_parts(
            strings(&["x", "statDate", "y", "pubDate"]),
            vec![strings(&["1", "2023-06-30", "2", "2023-08-31"])],
        );
        t.drop_columns(&strings(&["y", "missing"]));
        t.move_columns_front(&["statDate", "pubDate"]);
        assert_eq!(t.columns(), &["statDate", "pubDate", "x"]);
        assert_eq!(t.rows()[0], strings(&["2023-06-30", "2023-08-31", "1"]));
    }

    #[test]
    fn csv_round_trip_preserves_non_ascii() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.csv");
        let t = Table::from_parts(
            strings(&["code", "code_name"]),
            vec![strings(&["sh.600004", "白云机场"])],
        );
        t.write_csv(&path).unwrap();
        let back = Table::read_csv(&path).unwrap();
        assert_eq!(back, t);
    }
}
