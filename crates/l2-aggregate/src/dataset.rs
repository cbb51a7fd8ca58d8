//! In-memory table of merged log rows.
//!
//! Cells are kept as the text read from the partition files; numeric views
//! are parsed on demand so a malformed cell surfaces as a validation
//! finding instead of a read failure.

use l2_common::schema::{BLOCK_NUM, EXP_NUM, EXP_STATUS, EXP_STATUS_COMPLETE, REGIME_NUM};
use l2_common::{Error, Result};

/// A rectangular table with named columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Dataset {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// All cells of one column, in row order.
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| r[idx].as_str()).collect())
    }

    pub fn cell(&self, row: usize, name: &str) -> Option<&str> {
        let idx = self.column_index(name)?;
        self.rows.get(row).map(|r| r[idx].as_str())
    }

    /// Append a row; its length must match the column count.
    pub fn push_row(&mut self, row: Vec<String>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(Error::SchemaMismatch(format!(
                "row has {} cells, dataset has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Add a column filled with `fill`, or leave an existing one alone.
    /// Returns the column's index.
    pub fn ensure_column(&mut self, name: &str, fill: &str) -> usize {
        if let Some(idx) = self.column_index(name) {
            return idx;
        }
        self.columns.push(name.to_string());
        for row in &mut self.rows {
            row.push(fill.to_string());
        }
        self.columns.len() - 1
    }

    /// Replace or add a column with one value per row.
    pub fn set_column(&mut self, name: &str, values: Vec<String>) -> Result<()> {
        if values.len() != self.rows.len() {
            return Err(Error::SchemaMismatch(format!(
                "column '{name}' has {} values, dataset has {} rows",
                values.len(),
                self.rows.len()
            )));
        }
        let idx = self.ensure_column(name, "");
        for (row, value) in self.rows.iter_mut().zip(values) {
            row[idx] = value;
        }
        Ok(())
    }

    /// Rewrite every cell of a column in place. Missing columns are ignored.
    pub fn map_column(&mut self, name: &str, f: impl Fn(&str) -> String) {
        if let Some(idx) = self.column_index(name) {
            for row in &mut self.rows {
                row[idx] = f(&row[idx]);
            }
        }
    }

    /// Concatenate `other` below this dataset.
    ///
    /// Columns are unioned: a column only one side has is filled with empty
    /// cells on the other.
    pub fn append(&mut self, other: Dataset) {
        if self.columns.is_empty() && self.rows.is_empty() {
            *self = other;
            return;
        }
        let mapping: Vec<usize> = other
            .columns
            .iter()
            .map(|c| self.ensure_column(c, ""))
            .collect();
        let width = self.columns.len();
        for row in other.rows {
            let mut merged = vec![String::new(); width];
            for (value, &idx) in row.into_iter().zip(&mapping) {
                merged[idx] = value;
            }
            self.rows.push(merged);
        }
    }

    /// Rows for which `keep` returns true.
    pub fn filter(&self, keep: impl Fn(&Dataset, usize) -> bool) -> Dataset {
        let rows = (0..self.rows.len())
            .filter(|&i| keep(self, i))
            .map(|i| self.rows[i].clone())
            .collect();
        Dataset {
            columns: self.columns.clone(),
            rows,
        }
    }

    /// Rows whose `exp_status` is `complete`.
    pub fn completed_only(&self) -> Dataset {
        self.filter(|ds, i| ds.cell(i, EXP_STATUS) == Some(EXP_STATUS_COMPLETE))
    }

    /// Stable sort by `(exp_num, block_num)` ascending.
    pub fn sort_by_exp_block(&mut self) {
        self.sort_by_int_columns(EXP_NUM, BLOCK_NUM);
    }

    /// Stable sort by `(regime_num, exp_num)` ascending.
    pub fn sort_by_regime(&mut self) {
        self.sort_by_int_columns(REGIME_NUM, EXP_NUM);
    }

    fn sort_by_int_columns(&mut self, primary: &str, secondary: &str) {
        let p = self.column_index(primary);
        let s = self.column_index(secondary);
        let key = |row: &Vec<String>| {
            (
                p.and_then(|i| int_cell(&row[i])),
                s.and_then(|i| int_cell(&row[i])),
            )
        };
        self.rows.sort_by_key(key);
    }
}

/// Parse an integer cell. Pandas-style float text such as `3.0` is accepted.
pub fn int_cell(cell: &str) -> Option<i64> {
    let cell = cell.trim();
    if let Ok(n) = cell.parse::<i64>() {
        return Some(n);
    }
    let f = cell.parse::<f64>().ok()?;
    // `i64::MAX as f64` rounds up to 2^63, so the upper bound is exclusive.
    let in_range = f >= i64::MIN as f64 && f < i64::MAX as f64;
    (f.fract() == 0.0 && in_range).then_some(f as i64)
}
