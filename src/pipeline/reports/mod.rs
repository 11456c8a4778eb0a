// src/pipeline/reports/mod.rs
//! The five report descriptors. Each module owns one [`ReportSpec`] entry:
//! its schema, row filter, derived columns, and closure/rounding rules.

pub mod curve;
pub mod module;
pub mod schedule;
pub mod wall;
pub mod weighted;

use crate::table::{Cell, Table};

/// Trim whitespace in the named text columns, in place.
pub(crate) fn trim_text_columns(table: &mut Table, columns: &[&str]) {
    for name in columns {
        let col = match table.column(name) {
            Some(c) => c,
            None => continue,
        };
        for row in &mut table.rows {
            if let Cell::Text(s) = &row[col] {
                let trimmed = s.trim();
                if trimmed.len() != s.len() {
                    row[col] = Cell::Text(trimmed.to_string());
                }
            }
        }
    }
}
