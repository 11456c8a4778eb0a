// src/pipeline/reports/schedule.rs
//! Schedule-milestone report: the first rows of every sheet of every
//! schedule workbook, with the per-work duration (foundation start → physical
//! completion) derived alongside.

use anyhow::Result;

use crate::duration::derive_work_duration;
use crate::pipeline::registry::{Finished, ReportKind, ReportSpec};
use crate::schema::{ReportSchema, SCHEDULE_CANON};
use crate::table::Table;

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
];

pub static SPEC: ReportSpec = ReportSpec {
    kind: ReportKind::ScheduleMilestone,
    max_files: 1000,
    row_cap: Some(10),
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
    sort_keys: &["IdEmpreendimento", "SimulacaoId", "Obra", "Fonte"],
};

fn prepare(mut table: Table) -> Result<Table> {
    derive_work_duration(&mut table);
    Ok(table.select(OUTPUT))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Cell;

    #[test]
    fn prepare_projects_onto_fixed_columns_with_duration() {
        let mut t = Table::new(
            ["Nome", "Obra", "Início", "Término", "Ignorada"]
                .iter()
                .map(|h| h.to_string())
                .collect(),
        );
        t.push_row(vec![
            Cell::Text("Fundação".into()),
            Cell::Text("Obra A".into()),
            Cell::Text("15/01/2024".into()),
            Cell::Blank,
            Cell::Text("x".into()),
        ]);
        t.push_row(vec![
            Cell::Text("Fim Físico".into()),
            Cell::Text("Obra A".into()),
            Cell::Blank,
            Cell::Text("10/07/2024".into()),
            Cell::Text("x".into()),
        ]);

        let out = prepare(t).unwrap();
        assert_eq!(out.headers, OUTPUT);
        let dur = out.column("Duração obra (meses)").unwrap();
        assert_eq!(out.rows[0][dur], Cell::Number(5.0));
        assert!(out.column("Ignorada").is_none());
    }
}
