// src/pipeline/reports/wall.rs
//! Wall-milestone report: only the masonry / concrete-wall rows of each
//! schedule, with the per-work construction window (earliest start, latest
//! end over those rows) attached, plus a companion per-module window table.

use std::collections::HashMap;

use anyhow::Result;
use chrono::NaiveDate;

use crate::parse::date::parse_date_cell;
use crate::parse::text::{contains_folded, fold};
use crate::pipeline::registry::{Finished, ReportKind, ReportSpec};
use crate::schema::{ReportSchema, SCHEDULE_CANON};
use crate::table::{Cell, Table};

pub const WALL_MARKER: &str = "ALVENARIA / PAREDE DE CONCRETO";

pub static OUTPUT: &[&str] = &[
    "NET",
    "Nome",
    "Duração",
    "Início",
    "Término",
    "Obra",
    "M",
    "IdEmpreendimento",
    "SimulacaoId",
    "Início PC Obra",
    "Término PC Obra",
];

pub static MODULE_OUTPUT: &[&str] = &[
    "IdEmpreendimento",
    "Obra",
    "Módulo",
    "Início PC Módulo",
    "Término PC Módulo",
];

pub static SPEC: ReportSpec = ReportSpec {
    kind: ReportKind::WallMilestone,
    max_files: 300,
    row_cap: None,
    schema: ReportSchema {
        canonical: SCHEDULE_CANON,
        required: &["Nome", "Obra"],
    },
    cache_columns: None,
    prepare,
    finish,
    output_columns: OUTPUT,
    secondary_tag: Some("modulos"),
    rounding: &[],
    sort_keys: &["IdEmpreendimento", "Obra", "Fonte"],
};

fn prepare(mut table: Table) -> Result<Table> {
    let nome = table.column("Nome").expect("required column");
    let obra = table.column("Obra").expect("required column");
    let inicio = table.column("Início");
    let termino = table.column("Término");

    // windows are derived from the wall rows of this sheet only
    let mut windows: HashMap<String, (Option<NaiveDate>, Option<NaiveDate>)> = HashMap::new();
    let mut is_wall = vec![false; table.rows.len()];
    for (i, row) in table.rows.iter().enumerate() {
        if !contains_folded(&row[nome].display(), WALL_MARKER) {
            continue;
        }
        is_wall[i] = true;
        let entry = windows.entry(fold(&row[obra].display())).or_default();
        if let Some(d) = inicio.and_then(|c| parse_date_cell(&row[c])) {
            entry.0 = Some(entry.0.map_or(d, |cur| cur.min(d)));
        }
        if let Some(d) = termino.and_then(|c| parse_date_cell(&row[c])) {
            entry.1 = Some(entry.1.map_or(d, |cur| cur.max(d)));
        }
    }

    table.retain_rows(|i| is_wall[i]);

    let obra = table.column("Obra").expect("required column");
    let start_col = table.ensure_column("Início PC Obra");
    let end_col = table.ensure_column("Término PC Obra");
    for row in &mut table.rows {
        let window = windows.get(&fold(&row[obra].display()));
        row[start_col] = window
            .and_then(|w| w.0)
            .map(Cell::Date)
            .unwrap_or(Cell::Blank);
        row[end_col] = window
            .and_then(|w| w.1)
            .map(Cell::Date)
            .unwrap_or(Cell::Blank);
    }

    Ok(table.select(OUTPUT))
}

/// The stacked table already holds only wall rows; the companion table
/// groups them into one window per (work, module, enterprise).
fn finish(table: Table) -> Result<Finished> {
    let secondary = module_windows(&table);
    Ok(Finished {
        table,
        secondary: Some(secondary),
    })
}

fn module_windows(table: &Table) -> Table {
    let mut out = Table::new(MODULE_OUTPUT.iter().map(|c| c.to_string()).collect());
    let (obra, m, emp) = match (
        table.column("Obra"),
        table.column("M"),
        table.column("IdEmpreendimento"),
    ) {
        (Some(o), Some(m), Some(e)) => (o, m, e),
        _ => return out,
    };
    let inicio = table.column("Início");
    let termino = table.column("Término");

    // first-seen group order keeps the output independent of map iteration
    let mut order: Vec<(String, String, String)> = Vec::new();
    let mut windows: HashMap<(String, String, String), (Option<NaiveDate>, Option<NaiveDate>)> =
        HashMap::new();
    for row in &table.rows {
        let key = (
            fold(&row[obra].display()),
            row[m].display(),
            row[emp].display(),
        );
        if !windows.contains_key(&key) {
            order.push(key.clone());
        }
        let entry = windows.entry(key).or_default();
        if let Some(d) = inicio.and_then(|c| parse_date_cell(&row[c])) {
            entry.0 = Some(entry.0.map_or(d, |cur| cur.min(d)));
        }
        if let Some(d) = termino.and_then(|c| parse_date_cell(&row[c])) {
            entry.1 = Some(entry.1.map_or(d, |cur| cur.max(d)));
        }
    }

    // module index is one-based in the companion table; non-numeric module
    // values pass through as-is
    let mut seen: Vec<(String, String, String)> = Vec::new();
    for key in order {
        let module_cell = match key.1.trim().replace(',', ".").parse::<f64>() {
            Ok(v) => Cell::Number(v as i64 as f64 + 1.0),
            Err(_) => {
                if key.1.is_empty() {
                    Cell::Blank
                } else {
                    Cell::Text(key.1.clone())
                }
            }
        };
        let dedup_key = (key.2.clone(), key.0.clone(), module_cell.display());
        if seen.contains(&dedup_key) {
            continue;
        }
        seen.push(dedup_key);

        let (start, end) = windows[&key];
        out.push_row(vec![
            Cell::Text(key.2.clone()),
            Cell::Text(key.0.clone()),
            module_cell,
            start.map(Cell::Date).unwrap_or(Cell::Blank),
            end.map(Cell::Date).unwrap_or(Cell::Blank),
        ]);
    }

    out.sort_by_columns(&["IdEmpreendimento", "Obra", "Módulo"]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    fn sheet(rows: &[(&str, &str, &str, &str, &str, &str)]) -> Table {
        let mut t = Table::new(
            ["Nome", "Obra", "Início", "Término", "M", "IdEmpreendimento"]
                .iter()
                .map(|h| h.to_string())
                .collect(),
        );
        for (nome, obra, inicio, termino, m, emp) in rows {
            t.push_row(vec![
                text(nome),
                text(obra),
                text(inicio),
                text(termino),
                text(m),
                text(emp),
            ]);
        }
        t
    }

    #[test]
    fn only_wall_rows_survive_with_the_work_window() {
        let t = sheet(&[
            ("Alvenaria / Parede de Concreto M01", "Obra A", "01/02/2024", "15/03/2024", "0", "E1"),
            ("Fundação", "Obra A", "01/01/2024", "30/01/2024", "0", "E1"),
            ("ALVENARIA / PAREDE DE CONCRETO M02", "Obra A", "10/03/2024", "20/04/2024", "1", "E1"),
        ]);
        let out = prepare(t).unwrap();
        assert_eq!(out.rows.len(), 2);

        let start = out.column("Início PC Obra").unwrap();
        let end = out.column("Término PC Obra").unwrap();
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
        // window spans both wall rows, attached to each of them
        assert_eq!(out.rows[0][start], Cell::Date(d(2024, 2, 1)));
        assert_eq!(out.rows[1][end], Cell::Date(d(2024, 4, 20)));
    }

    #[test]
    fn module_windows_group_and_deduplicate() {
        let t = sheet(&[
            ("Alvenaria / Parede de Concreto", "Obra A", "01/02/2024", "15/03/2024", "0", "E1"),
            ("Alvenaria / Parede de Concreto", "obra a", "05/02/2024", "20/03/2024", "0", "E1"),
            ("Alvenaria / Parede de Concreto", "Obra A", "01/04/2024", "15/05/2024", "1", "E1"),
        ]);
        let stacked = prepare(t).unwrap();
        let sec = module_windows(&stacked);

        assert_eq!(sec.headers, MODULE_OUTPUT);
        assert_eq!(sec.rows.len(), 2);
        let module = sec.column("Módulo").unwrap();
        assert_eq!(sec.rows[0][module], Cell::Number(1.0));
        assert_eq!(sec.rows[1][module], Cell::Number(2.0));

        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
        let start = sec.column("Início PC Módulo").unwrap();
        // obra casing folds into one group, window is the min over both rows
        assert_eq!(sec.rows[0][start], Cell::Date(d(2024, 2, 1)));
    }
}
