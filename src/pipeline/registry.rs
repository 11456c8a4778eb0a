// src/pipeline/registry.rs
//! Report registry: one tag per report type, one descriptor per tag. Adding
//! a report type is a new descriptor entry, not a parallel pipeline.

use anyhow::Result;

use crate::schema::ReportSchema;
use crate::table::Table;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportKind {
    ScheduleMilestone,
    WallMilestone,
    ModuleMilestone,
    WeightedPlan,
    ProductionCurve,
}

impl ReportKind {
    pub const ALL: [ReportKind; 5] = [
        ReportKind::ScheduleMilestone,
        ReportKind::WallMilestone,
        ReportKind::ModuleMilestone,
        ReportKind::WeightedPlan,
        ReportKind::ProductionCurve,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            ReportKind::ScheduleMilestone => "cronograma",
            ReportKind::WallMilestone => "parede",
            ReportKind::ModuleMilestone => "modulo",
            ReportKind::WeightedPlan => "pp",
            ReportKind::ProductionCurve => "curvas",
        }
    }

    pub fn from_tag(tag: &str) -> Option<ReportKind> {
        Self::ALL.iter().copied().find(|k| k.tag() == tag)
    }
}

/// The post-concatenation result of a report: the main consolidated table
/// plus, for reports that produce one, a companion table.
pub struct Finished {
    pub table: Table,
    pub secondary: Option<Table>,
}

impl Finished {
    pub fn main(table: Table) -> Self {
        Finished {
            table,
            secondary: None,
        }
    }
}

/// Everything that varies between report pipelines. The orchestrator is one
/// skeleton instantiated with one of these.
pub struct ReportSpec {
    pub kind: ReportKind,
    /// Batches larger than this are rejected outright, not truncated.
    pub max_files: usize,
    /// Rows read per sheet at ingestion time, when capped.
    pub row_cap: Option<usize>,
    pub schema: ReportSchema,
    /// Columns kept in cached artifacts, for reports using the read cache.
    pub cache_columns: Option<&'static [&'static str]>,
    /// Per-source step: filter rows of interest, derive columns, project
    /// onto `output_columns`. Runs after schema normalization.
    pub prepare: fn(Table) -> Result<Table>,
    /// Post-concatenation step over the stacked table: group corrections,
    /// cross-source derivations, companion tables.
    pub finish: fn(Table) -> Result<Finished>,
    /// The fixed column set every prepared source must come out with.
    pub output_columns: &'static [&'static str],
    /// File-name suffix for the companion table, when the report has one.
    pub secondary_tag: Option<&'static str>,
    /// Fixed decimal precision per numeric column when writing output;
    /// closure columns carry 3 decimals, plain numerics 2.
    pub rounding: &'static [(&'static str, u32)],
    /// Composite sort key of the consolidated output.
    pub sort_keys: &'static [&'static str],
}

pub fn spec_for(kind: ReportKind) -> &'static ReportSpec {
    use super::reports;
    match kind {
        ReportKind::ScheduleMilestone => &reports::schedule::SPEC,
        ReportKind::WallMilestone => &reports::wall::SPEC,
        ReportKind::ModuleMilestone => &reports::module::SPEC,
        ReportKind::WeightedPlan => &reports::weighted::SPEC,
        ReportKind::ProductionCurve => &reports::curve::SPEC,
    }
}
