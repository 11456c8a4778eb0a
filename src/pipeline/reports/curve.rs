// src/pipeline/reports/curve.rs
//! Production-curve report: locale-parses the curve columns, formats the
//! reference month, and closes `VPObra` to 100% per curve. Closure runs per
//! source after normalization AND again per final group once every source is
//! stacked, so curves split across files still close exactly once combined.

use anyhow::Result;

use crate::closure::{close_column, round_columns, round_to};
use crate::group::{group_rows, CURVE_KEYS};
use crate::parse::date::format_reference_month;
use crate::parse::number::{parse_number, parse_percent};
use crate::pipeline::registry::{Finished, ReportKind, ReportSpec};
use crate::pipeline::reports::trim_text_columns;
use crate::schema::{ReportSchema, CURVE_CANON, CURVE_REQUIRED};
use crate::table::{Cell, Table};

/// Plain numeric columns, rounded to 2 decimals without closure.
static PLAIN_NUMERIC: &[&str] = &["VPCurva", "PesoModulo", "Unidades"];

/// Fixed output precision: closure column at 3 decimals, the rest at 2.
pub static ROUNDING: &[(&str, u32)] = &[
    ("VPCurva", 2),
    ("PesoModulo", 2),
    ("Unidades", 2),
    ("VPModulo", 2),
    ("VPObra", 3),
];

pub const CLOSURE_COLUMN: &str = "VPObra";
pub const CLOSURE_PRECISION: u32 = 3;

pub static SPEC: ReportSpec = ReportSpec {
    kind: ReportKind::ProductionCurve,
    max_files: 300,
    row_cap: None,
    schema: ReportSchema {
        canonical: CURVE_CANON,
        required: CURVE_REQUIRED,
    },
    cache_columns: None,
    prepare,
    finish,
    output_columns: CURVE_REQUIRED,
    secondary_tag: Some("verificacao"),
    rounding: ROUNDING,
    sort_keys: &[
        "SimulacaoId",
        "IdEmpreendimento",
        "Obra",
        "IdModulo",
        "DataReferencia",
    ],
};

fn prepare(table: Table) -> Result<Table> {
    let mut out = table.select(CURVE_REQUIRED);

    for name in PLAIN_NUMERIC {
        let col = out.column(name).expect("required column");
        for row in &mut out.rows {
            row[col] = parse_number(&row[col]).map(Cell::Number).unwrap_or(Cell::Blank);
        }
    }
    for name in ["VPModulo", CLOSURE_COLUMN] {
        let col = out.column(name).expect("required column");
        for row in &mut out.rows {
            row[col] = parse_percent(&row[col]).map(Cell::Number).unwrap_or(Cell::Blank);
        }
    }

    trim_text_columns(&mut out, &["IdEmpreendimento", "IdModulo", "Obra", "SimulacaoId"]);

    let col = out.column("DataReferencia").expect("required column");
    for row in &mut out.rows {
        row[col] = Cell::Text(format_reference_month(&row[col].display()));
    }

    close_column(&mut out, CLOSURE_COLUMN, &CURVE_KEYS, CLOSURE_PRECISION);
    round_columns(&mut out, ROUNDING);
    Ok(out)
}

/// Re-close per final group: curves that arrive split across sources only
/// become whole after concatenation. The per-curve sum audit rides along as
/// the companion table.
fn finish(mut table: Table) -> Result<Finished> {
    close_column(&mut table, CLOSURE_COLUMN, &CURVE_KEYS, CLOSURE_PRECISION);
    round_columns(&mut table, ROUNDING);
    let audit = verify_sums(&table);
    Ok(Finished {
        table,
        secondary: Some(audit),
    })
}

/// Per-curve audit rows: `(key columns, sum of VPObra, delta from 100% in
/// percentage points)`. Sorted by key so the audit output is reproducible.
pub fn verify_sums(table: &Table) -> Table {
    let mut out = Table::new(
        ["IdEmpreendimento", "Obra", "SimulacaoId", "Soma_VPObra", "Diferenca_100"]
            .iter()
            .map(|c| c.to_string())
            .collect(),
    );
    let col = match table.column(CLOSURE_COLUMN) {
        Some(c) => c,
        None => return out,
    };
    let keys = CURVE_KEYS.resolve(table);
    let groups = group_rows(table, &keys);

    let mut entries: Vec<(Vec<String>, f64)> = groups
        .into_iter()
        .map(|(key, rows)| {
            let sum: f64 = rows
                .iter()
                .filter_map(|&r| table.rows[r][col].as_number())
                .sum();
            (key, round_to(sum, CLOSURE_PRECISION))
        })
        .collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    for (key, sum) in entries {
        let component = |name: &str| -> Cell {
            match keys.iter().position(|k| k == name) {
                Some(i) => Cell::Text(key[i].clone()),
                None => Cell::Text(String::new()),
            }
        };
        let id = component("IdEmpreendimento");
        let obra = component("Obra");
        let sim = component("SimulacaoId");
        out.push_row(vec![
            id,
            obra,
            sim,
            Cell::Number(sum),
            Cell::Number(round_to((sum - 1.0) * 100.0, CLOSURE_PRECISION)),
        ]);
    }
    out
}
