// src/schema.rs
//! Column-schema canonicalization. Raw headers arrive in any casing, with or
//! without accents and padding; each report type owns a lookup from the
//! folded header to its canonical name. Unknown headers pass through
//! unchanged so extra columns survive normalization.

use crate::parse::text::fold;
use crate::table::Table;

/// Canonical vocabulary for one report type.
pub struct ReportSchema {
    /// Folded raw header → canonical column name.
    pub canonical: &'static [(&'static str, &'static str)],
    /// Canonical columns that must be present after mapping; a source
    /// missing any of them is rejected for this report.
    pub required: &'static [&'static str],
}

pub enum Normalized {
    Table(Table),
    /// The required canonical columns that were absent after mapping.
    Missing(Vec<String>),
}

/// Header vocabulary shared by the schedule-shaped reports
/// (schedule-milestone, wall-milestone, module-milestone, weighted-plan).
pub static SCHEDULE_CANON: &[(&str, &str)] = &[
    ("NET", "NET"),
    ("NOME", "Nome"),
    ("DURACAO", "Duração"),
    ("DURACAO (DIAS)", "Duração"),
    ("INICIO", "Início"),
    ("TERMINO", "Término"),
    ("CUSTO", "Custo Obra"),
    ("CUSTO OBRA", "Custo Obra"),
    ("OBRA", "Obra"),
    ("NOME OBRA", "Obra"),
    ("IDEMPREENDIMENTO", "IdEmpreendimento"),
    ("SIMULACAOID", "SimulacaoId"),
    ("ID SIMULACAO", "SimulacaoId"),
    ("ID_SIMULACAO", "SimulacaoId"),
    ("M", "M"),
    ("MODULO", "M"),
];

/// Weighted-plan vocabulary: same headers, but bare `CUSTO` is the plan cost
/// column rather than the per-work cost.
pub static PLAN_CANON: &[(&str, &str)] = &[
    ("SIMULACAOID", "SimulacaoId"),
    ("ID SIMULACAO", "SimulacaoId"),
    ("ID_SIMULACAO", "SimulacaoId"),
    ("IDEMPREENDIMENTO", "IdEmpreendimento"),
    ("NET", "NET"),
    ("NOME", "Nome"),
    ("M", "M"),
    ("MODULO", "M"),
    ("CUSTO", "Custo"),
];

pub static CURVE_CANON: &[(&str, &str)] = &[
    ("IDEMPREENDIMENTO", "IdEmpreendimento"),
    ("IDMODULO", "IdModulo"),
    ("DATAREFERENCIA", "DataReferencia"),
    ("VPCURVA", "VPCurva"),
    ("PESOMODULO", "PesoModulo"),
    ("UNIDADES", "Unidades"),
    ("VPMODULO", "VPModulo"),
    ("VPOBRA", "VPObra"),
    ("OBRA", "Obra"),
    ("SIMULACAOID", "SimulacaoId"),
];

pub static CURVE_REQUIRED: &[&str] = &[
    "IdEmpreendimento",
    "IdModulo",
    "DataReferencia",
    "VPCurva",
    "PesoModulo",
    "Unidades",
    "VPModulo",
    "VPObra",
    "Obra",
    "SimulacaoId",
];

pub static PLAN_REQUIRED: &[&str] = &[
    "SimulacaoId",
    "IdEmpreendimento",
    "NET",
    "Nome",
    "M",
    "Custo",
];

/// Map raw headers onto the report's canonical vocabulary. Returns the
/// missing-column list instead of a table when any required column is absent
/// after mapping; the caller rejects the whole source with a warning.
pub fn normalize(table: &Table, schema: &ReportSchema) -> Normalized {
    let mut out = table.clone();
    for header in &mut out.headers {
        let folded = fold(header);
        match schema
            .canonical
            .iter()
            .find(|(raw, _)| *raw == folded)
        {
            Some((_, canon)) => *header = canon.to_string(),
            None => *header = header.trim().to_string(),
        }
    }

    let missing: Vec<String> = schema
        .required
        .iter()
        .filter(|c| out.column(c).is_none())
        .map(|c| c.to_string())
        .collect();
    if missing.is_empty() {
        Normalized::Table(out)
    } else {
        Normalized::Missing(missing)
    }
}
