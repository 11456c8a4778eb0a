// src/closure.rs
//! Percentage closure: force a grouped percentage-of-whole column to sum to
//! exactly 1.000 at fixed decimal precision. The correction is layered:
//! proportional rescale preserves relative weights, the residual goes to the
//! largest contributor, and a final pass pins any leftover onto the first
//! element so the tolerance holds even on adversarial inputs such as many
//! equal small values.

use crate::group::{group_rows, KeyCascade};
use crate::parse::number::parse_number;
use crate::table::{Cell, Table};

/// Round `v` to `precision` decimal places, half away from zero.
pub fn round_to(v: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision as i32);
    (v * factor).round() / factor
}

/// Close one group's values onto a sum of 1.0 at `precision` decimals.
/// Missing values count as 0.0. The output preserves input order.
pub fn close_group(values: &[Option<f64>], precision: u32) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    let target = 1.0;
    let tolerance = 0.5 * 10f64.powi(-(precision as i32));

    // 1) missing → 0.0, round everything first
    let mut vals: Vec<f64> = values
        .iter()
        .map(|v| round_to(v.unwrap_or(0.0), precision))
        .collect();

    // 2) proportional rescale when the sum is off target; zero-sum groups
    //    get an equal split instead
    let sum: f64 = vals.iter().sum();
    if (sum - target).abs() > tolerance {
        if sum > 0.0 {
            let factor = target / sum;
            for v in &mut vals {
                *v = round_to(*v * factor, precision);
            }
        } else {
            let share = target / vals.len() as f64;
            for v in &mut vals {
                *v = round_to(share, precision);
            }
        }
    }

    // 3) push the rounded residual onto the largest element, first
    //    occurrence on ties
    let sum: f64 = vals.iter().sum();
    let diff = round_to(target - sum, precision);
    if diff != 0.0 {
        let mut max_idx = 0;
        for (i, v) in vals.iter().enumerate() {
            if *v > vals[max_idx] {
                max_idx = i;
            }
        }
        vals[max_idx] = round_to(vals[max_idx] + diff, precision);
    }

    // 4) backstop: the push above can pathologically reshuffle the max
    //    ranking; pin whatever residual remains onto the first element
    let final_sum = round_to(vals.iter().sum(), precision);
    if (final_sum - target).abs() > 10f64.powi(-(precision as i32)) {
        vals[0] = round_to(vals[0] + round_to(target - final_sum, precision), precision);
    }

    vals
}

/// Apply [`close_group`] to `column`, once per group resolved through
/// `cascade`. Cells that fail numeric parsing count as missing and come back
/// as part of the closed group.
pub fn close_column(table: &mut Table, column: &str, cascade: &KeyCascade, precision: u32) {
    let col = match table.column(column) {
        Some(c) => c,
        None => return,
    };
    let keys = cascade.resolve(table);
    let groups = group_rows(table, &keys);
    for rows in groups.values() {
        let values: Vec<Option<f64>> = rows
            .iter()
            .map(|&r| parse_number(&table.rows[r][col]))
            .collect();
        let closed = close_group(&values, precision);
        for (&r, v) in rows.iter().zip(closed) {
            table.rows[r][col] = Cell::Number(v);
        }
    }
}

/// Round plain numeric columns to a fixed per-column precision, without
/// closure. Unparseable cells become blank, mirroring a coerced missing.
pub fn round_columns(table: &mut Table, spec: &[(&str, u32)]) {
    for (name, precision) in spec {
        let col = match table.column(name) {
            Some(c) => c,
            None => continue,
        };
        for row in &mut table.rows {
            row[col] = match parse_number(&row[col]) {
                Some(v) => Cell::Number(round_to(v, *precision)),
                None => Cell::Blank,
            };
        }
    }
}
