// src/table.rs
use std::cmp::Ordering;

use anyhow::{bail, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One spreadsheet cell, as handed over by the workbook adapter or as
/// produced by a derivation step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Cell {
    Blank,
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl Cell {
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Blank => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// String form used for group keys and for writing output. Numbers drop
    /// a trailing `.0` so integer-valued cells read like integers.
    pub fn display(&self) -> String {
        match self {
            Cell::Blank => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            Cell::Date(d) => d.format("%d/%m/%Y").to_string(),
        }
    }
}

/// Total order over cells for stable sorting: blanks first, then numbers,
/// dates, text. NaN sorts before every other number.
pub fn cmp_cells(a: &Cell, b: &Cell) -> Ordering {
    fn rank(c: &Cell) -> u8 {
        match c {
            Cell::Blank => 0,
            Cell::Number(_) => 1,
            Cell::Date(_) => 2,
            Cell::Text(_) => 3,
        }
    }
    match (a, b) {
        (Cell::Number(x), Cell::Number(y)) => x.partial_cmp(y).unwrap_or_else(|| {
            match (x.is_nan(), y.is_nan()) {
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                _ => Ordering::Equal,
            }
        }),
        (Cell::Date(x), Cell::Date(y)) => x.cmp(y),
        (Cell::Text(x), Cell::Text(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// An ordered grid of named columns. Serves both as the raw table handed over
/// by the workbook adapter (all `Text`/`Blank` cells) and as the normalized
/// form after canonicalization, where cells carry their parsed types.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Table {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the column named `name`, if present.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        &self.rows[row][col]
    }

    /// Pad or truncate `row` to the header width and append it.
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.headers.len(), Cell::Blank);
        self.rows.push(row);
    }

    /// Index of `name`, appending a new all-blank column when absent.
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(idx) = self.column(name) {
            return idx;
        }
        self.headers.push(name.to_string());
        for row in &mut self.rows {
            row.push(Cell::Blank);
        }
        self.headers.len() - 1
    }

    /// Prepend a column whose every row holds `value`.
    pub fn insert_column_front(&mut self, name: &str, value: Cell) {
        self.headers.insert(0, name.to_string());
        for row in &mut self.rows {
            row.insert(0, value.clone());
        }
    }

    /// Project onto `columns`, in that order; missing columns come out blank.
    pub fn select(&self, columns: &[&str]) -> Table {
        let indices: Vec<Option<usize>> = columns.iter().map(|c| self.column(c)).collect();
        let mut out = Table::new(columns.iter().map(|c| c.to_string()).collect());
        for row in &self.rows {
            let cells = indices
                .iter()
                .map(|idx| match idx {
                    Some(i) => row.get(*i).cloned().unwrap_or(Cell::Blank),
                    None => Cell::Blank,
                })
                .collect();
            out.rows.push(cells);
        }
        out
    }

    /// Keep only the rows for which `pred(row_index)` holds.
    pub fn retain_rows<F: FnMut(usize) -> bool>(&mut self, mut pred: F) {
        let mut idx = 0;
        self.rows.retain(|_| {
            let keep = pred(idx);
            idx += 1;
            keep
        });
    }

    /// Stable sort by the named key columns, in order. Unknown key columns
    /// are ignored so a report's sort spec tolerates optional columns.
    pub fn sort_by_columns(&mut self, keys: &[&str]) {
        let indices: Vec<usize> = keys.iter().filter_map(|k| self.column(k)).collect();
        if indices.is_empty() {
            return;
        }
        self.rows.sort_by(|a, b| {
            for &i in &indices {
                let ord = cmp_cells(&a[i], &b[i]);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        });
    }

    /// Stack tables that share an identical header list.
    pub fn concat(parts: Vec<Table>) -> Result<Table> {
        let mut iter = parts.into_iter();
        let mut out = match iter.next() {
            Some(t) => t,
            None => return Ok(Table::default()),
        };
        for part in iter {
            if part.headers != out.headers {
                bail!(
                    "cannot stack tables with diverging columns: {:?} vs {:?}",
                    out.headers,
                    part.headers
                );
            }
            out.rows.extend(part.rows);
        }
        Ok(out)
    }
}
