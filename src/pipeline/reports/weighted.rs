// src/pipeline/reports/weighted.rs
//! Weighted-plan (PP) report: keeps the work total rows (NET 1), the module
//! total rows (NET 2) and the pre-project rows (NET 4), then weighs each
//! pre-project cost against its work and module cost totals.

use std::collections::HashMap;

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::parse::number::parse_number;
use crate::parse::text::{fold, module_label, normalize_hyphen_spaces};
use crate::pipeline::registry::{Finished, ReportKind, ReportSpec};
use crate::schema::{ReportSchema, PLAN_CANON, PLAN_REQUIRED};
use crate::table::{Cell, Table};

static MODULO_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bMODULO\b").unwrap());

const PRE_PROJECT: &str = "PRE - PROJETO";

pub static OUTPUT: &[&str] = &[
    "SimulacaoId",
    "IdEmpreendimento",
    "NET",
    "Nome",
    "M",
    "Custo",
];

pub static SPEC: ReportSpec = ReportSpec {
    kind: ReportKind::WeightedPlan,
    max_files: 1000,
    row_cap: None,
    schema: ReportSchema {
        canonical: PLAN_CANON,
        required: PLAN_REQUIRED,
    },
    cache_columns: Some(PLAN_REQUIRED),
    prepare,
    finish,
    output_columns: OUTPUT,
    secondary_tag: None,
    rounding: &[("Custo", 2), ("Peso PP Obra", 2), ("Peso PP Módulo", 2)],
    sort_keys: &["SimulacaoId", "IdEmpreendimento", "M", "Fonte"],
};

fn folded_name(cell: &Cell) -> String {
    normalize_hyphen_spaces(&fold(&cell.display()))
}

fn row_of_interest(net: Option<f64>, name: &str) -> bool {
    match net {
        Some(n) if n == 1.0 => true,
        Some(n) if n == 2.0 => MODULO_WORD.is_match(name),
        Some(n) if n == 4.0 => name == PRE_PROJECT,
        _ => false,
    }
}

fn prepare(table: Table) -> Result<Table> {
    let selected = table.select(OUTPUT);
    let mut out = Table::new(OUTPUT.iter().map(|c| c.to_string()).collect());

    for row in &selected.rows {
        let net = parse_number(&row[2]);
        if !row_of_interest(net, &folded_name(&row[3])) {
            continue;
        }
        out.push_row(vec![
            Cell::Text(row[0].display().trim().to_string()),
            Cell::Text(row[1].display().trim().to_string()),
            Cell::Number(net.unwrap_or(0.0)),
            Cell::Text(row[3].display().trim().to_string()),
            Cell::Text(module_label(&row[4].display())),
            parse_number(&row[5]).map(Cell::Number).unwrap_or(Cell::Blank),
        ]);
    }
    Ok(out)
}

/// Weight ratios are computed over the whole stacked table: the denominators
/// are cost sums per (SimulacaoId, IdEmpreendimento) over NET 1 rows and per
/// (SimulacaoId, IdEmpreendimento, M) over NET 2 rows.
fn finish(mut table: Table) -> Result<Finished> {
    let (sim, emp, net, nome, m, custo) = match (
        table.column("SimulacaoId"),
        table.column("IdEmpreendimento"),
        table.column("NET"),
        table.column("Nome"),
        table.column("M"),
        table.column("Custo"),
    ) {
        (Some(a), Some(b), Some(c), Some(d), Some(e), Some(f)) => (a, b, c, d, e, f),
        _ => return Ok(Finished::main(table)),
    };

    let mut den_work: HashMap<(String, String), f64> = HashMap::new();
    let mut den_module: HashMap<(String, String, String), f64> = HashMap::new();
    for row in &table.rows {
        let cost = match row[custo].as_number() {
            Some(c) => c,
            None => continue,
        };
        match row[net].as_number() {
            Some(n) if n == 1.0 => {
                *den_work
                    .entry((row[sim].display(), row[emp].display()))
                    .or_default() += cost;
            }
            Some(n) if n == 2.0 => {
                *den_module
                    .entry((row[sim].display(), row[emp].display(), row[m].display()))
                    .or_default() += cost;
            }
            _ => {}
        }
    }

    let work_col = table.ensure_column("Peso PP Obra");
    let module_col = table.ensure_column("Peso PP Módulo");
    for row in &mut table.rows {
        let is_target = row[net].as_number() == Some(4.0)
            && folded_name(&row[nome]) == PRE_PROJECT;
        if !is_target {
            continue;
        }
        let cost = match row[custo].as_number() {
            Some(c) => c,
            None => continue,
        };
        let dw = den_work.get(&(row[sim].display(), row[emp].display()));
        let dm = den_module.get(&(row[sim].display(), row[emp].display(), row[m].display()));
        row[work_col] = match dw {
            Some(d) if *d != 0.0 => Cell::Number(cost / d),
            _ => Cell::Blank,
        };
        row[module_col] = match dm {
            Some(d) if *d != 0.0 => Cell::Number(cost / d),
            _ => Cell::Blank,
        };
    }

    Ok(Finished::main(table))
}
