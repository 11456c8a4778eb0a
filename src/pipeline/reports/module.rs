// src/pipeline/reports/module.rs
//! Module-milestone report: schedule rows whose name ends in a module suffix
//! M01–M15, labelled and consolidated per module.

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::duration::derive_work_duration;
use crate::pipeline::registry::{Finished, ReportKind, ReportSpec};
use crate::schema::{ReportSchema, SCHEDULE_CANON};
use crate::table::{Cell, Table};

static MODULE_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"M(0[1-9]|1[0-5])$").unwrap());

pub static OUTPUT: &[&str] = &[
    "NET",
    "Nome",
    "Duração",
    "Início",
    "Término",
    "Custo Obra",
    "Obra",
    "IdEmpreendimento",
    "SimulacaoId",
    "Duração obra (meses)",
    "Módulo",
];

pub static SPEC: ReportSpec = ReportSpec {
    kind: ReportKind::ModuleMilestone,
    max_files: 1000,
    row_cap: Some(100),
    schema: ReportSchema {
        canonical: SCHEDULE_CANON,
        required: &["Nome", "Obra"],
    },
    cache_columns: None,
    prepare,
    finish: |table| Ok(Finished::main(table)),
    output_columns: OUTPUT,
    secondary_tag: None,
    rounding: &[],
    sort_keys: &["IdEmpreendimento", "Obra", "Módulo", "Fonte"],
};

/// `"Estrutura M03"` → `Some("MÓD. 03")`; names without the suffix get none.
fn module_from_name(name: &str) -> Option<String> {
    let upper = name.trim().to_uppercase();
    MODULE_SUFFIX
        .captures(&upper)
        .map(|caps| format!("MÓD. {}", &caps[1]))
}

fn prepare(mut table: Table) -> Result<Table> {
    derive_work_duration(&mut table);

    let nome = table.column("Nome");
    let col = table.ensure_column("Módulo");
    for row in &mut table.rows {
        row[col] = nome
            .and_then(|n| module_from_name(&row[n].display()))
            .map(Cell::Text)
            .unwrap_or(Cell::Blank);
    }

    let mut out = table.select(OUTPUT);
    let col = out.column("Módulo").unwrap_or(0);
    let keep: Vec<bool> = out.rows.iter().map(|r| !r[col].is_blank()).collect();
    out.retain_rows(|i| keep[i]);
    Ok(out)
}
