// src/duration.rs
//! Calendar duration between two named milestones, in whole months. A
//! partial final month is not counted: when the end date falls earlier in
//! its month than the start date did, one month is subtracted.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use tracing::debug;

use crate::parse::date::parse_date_cell;
use crate::parse::text::contains_folded;
use crate::table::{Cell, Table};

pub const START_MARKER: &str = "Fundação";
pub const END_MARKER: &str = "Fim Físico";

/// Whole months from `start` to `end`, truncating a partial final month and
/// flooring at zero.
pub fn months_between(start: NaiveDate, end: NaiveDate) -> i64 {
    let mut months =
        (end.year() - start.year()) as i64 * 12 + (end.month() as i64 - start.month() as i64);
    if end.day() < start.day() {
        months -= 1;
    }
    months.max(0)
}

/// Per-work duration: earliest `Início` among rows whose `Nome` contains the
/// start marker, latest `Término` among rows matching the end marker. Either
/// milestone absent → `None` for that work.
pub fn work_durations(table: &Table) -> HashMap<String, Option<i64>> {
    let mut out: HashMap<String, Option<i64>> = HashMap::new();
    let (obra, nome, inicio, termino) = match (
        table.column("Obra"),
        table.column("Nome"),
        table.column("Início"),
        table.column("Término"),
    ) {
        (Some(o), Some(n), Some(i), Some(t)) => (o, n, i, t),
        _ => return out,
    };

    let mut starts: HashMap<String, NaiveDate> = HashMap::new();
    let mut ends: HashMap<String, NaiveDate> = HashMap::new();
    for row in &table.rows {
        let work = row[obra].display();
        let name = row[nome].display();
        out.entry(work.clone()).or_insert(None);
        if contains_folded(&name, START_MARKER) {
            if let Some(d) = parse_date_cell(&row[inicio]) {
                starts
                    .entry(work.clone())
                    .and_modify(|cur| *cur = (*cur).min(d))
                    .or_insert(d);
            }
        }
        if contains_folded(&name, END_MARKER) {
            if let Some(d) = parse_date_cell(&row[termino]) {
                ends.entry(work)
                    .and_modify(|cur| *cur = (*cur).max(d))
                    .or_insert(d);
            }
        }
    }

    for (work, duration) in &mut out {
        match (starts.get(work), ends.get(work)) {
            (Some(s), Some(e)) => *duration = Some(months_between(*s, *e)),
            _ => debug!(work = %work, "missing start or end milestone"),
        }
    }
    out
}

/// Add the `Duração obra (meses)` column, mapping each row's work onto its
/// derived duration.
pub fn derive_work_duration(table: &mut Table) {
    let durations = work_durations(table);
    let obra = table.column("Obra");
    let col = table.ensure_column("Duração obra (meses)");
    for row in &mut table.rows {
        let cell = obra
            .and_then(|o| durations.get(&row[o].display()))
            .and_then(|d| *d)
            .map(|m| Cell::Number(m as f64))
            .unwrap_or(Cell::Blank);
        row[col] = cell;
    }
}
