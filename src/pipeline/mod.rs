// src/pipeline/mod.rs
//! Pipeline orchestration: one skeleton, instantiated per report type from
//! the registry. Ingestion fans out over the worker pool; everything after
//! the pool join (normalization bookkeeping aside, concatenation, group
//! correction, sorting) is single-threaded over the fully materialized set
//! so grouping and closure stay deterministic.

pub mod registry;
pub mod reports;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use tracing::{info, instrument, warn};

use crate::config::Config;
use crate::ingest::reader::WorkbookReader;
use crate::ingest::{Ingestor, SourceOutcome};
use crate::schema::{self, Normalized};
use crate::table::{Cell, Table};
use registry::{spec_for, ReportKind};

/// Append-only run log: accepted sources and warnings, exposed alongside the
/// output so partial-failure runs stay auditable.
#[derive(Debug, Default)]
pub struct Diagnostics {
    pub sources_ok: Vec<String>,
    pub warnings: Vec<String>,
}

impl Diagnostics {
    pub fn accept(&mut self, source: &str) {
        self.sources_ok.push(source.to_string());
    }

    pub fn warn(&mut self, message: String) {
        warn!("{}", message);
        self.warnings.push(message);
    }
}

/// A full run's result. `table` can be empty when every source was rejected;
/// that is the "no valid data found" state, not an error.
#[derive(Debug)]
pub struct RunOutput {
    pub table: Table,
    pub secondary: Option<Table>,
    pub diagnostics: Diagnostics,
}

pub struct Orchestrator {
    config: Config,
}

impl Orchestrator {
    pub fn new(config: Config) -> Self {
        Orchestrator { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run one report over `paths`: ingest in parallel, then normalize,
    /// filter, derive, stack, group-correct and sort.
    #[instrument(level = "info", skip(self, reader, paths), fields(report = kind.tag(), files = paths.len()))]
    pub fn run(
        &self,
        kind: ReportKind,
        reader: &dyn WorkbookReader,
        paths: &[PathBuf],
    ) -> Result<RunOutput> {
        let spec = spec_for(kind);
        let max_files = self.config.max_files.unwrap_or(spec.max_files);
        if paths.len() > max_files {
            bail!(
                "batch of {} files exceeds the {} report limit of {}",
                paths.len(),
                kind.tag(),
                max_files
            );
        }

        let ingestor = Ingestor::new(reader, &self.config).cache_scope(kind.tag());
        let outcomes = ingestor.read_many(paths, spec.row_cap, spec.cache_columns)?;

        let mut diagnostics = Diagnostics::default();
        let mut parts: Vec<Table> = Vec::new();
        for outcome in outcomes {
            if let Some(part) = self.prepare_source(outcome, spec, &mut diagnostics) {
                parts.push(part);
            }
        }

        let stacked = if parts.is_empty() {
            let mut headers = vec!["Fonte".to_string()];
            headers.extend(spec.output_columns.iter().map(|c| c.to_string()));
            Table::new(headers)
        } else {
            Table::concat(parts).context("stacking prepared sources")?
        };
        if stacked.is_empty() {
            warn!(report = kind.tag(), "no valid data found");
        }

        let finished = (spec.finish)(stacked)
            .with_context(|| format!("finishing the {} report", kind.tag()))?;
        let mut table = finished.table;
        table.sort_by_columns(spec.sort_keys);

        info!(
            rows = table.rows.len(),
            accepted = diagnostics.sources_ok.len(),
            warnings = diagnostics.warnings.len(),
            "run complete"
        );
        Ok(RunOutput {
            table,
            secondary: finished.secondary,
            diagnostics,
        })
    }

    /// Per-source half of the pipeline. Every failure mode is converted to a
    /// diagnostic entry; `None` means the source contributes no rows.
    fn prepare_source(
        &self,
        outcome: SourceOutcome,
        spec: &registry::ReportSpec,
        diagnostics: &mut Diagnostics,
    ) -> Option<Table> {
        let (source, table) = match outcome {
            SourceOutcome::Loaded { source, table } => (source, table),
            SourceOutcome::Rejected { source, reason }
            | SourceOutcome::Failed { source, reason } => {
                diagnostics.warn(format!("source '{}': {}", source, reason));
                return None;
            }
        };
        if table.is_empty() {
            diagnostics.warn(format!("source '{}' is empty; skipped", source));
            return None;
        }

        let normalized = match schema::normalize(&table, &spec.schema) {
            Normalized::Table(t) => t,
            Normalized::Missing(columns) => {
                diagnostics.warn(format!(
                    "source '{}': missing columns: {}; skipped",
                    source,
                    columns.join(", ")
                ));
                return None;
            }
        };

        let mut prepared = match (spec.prepare)(normalized) {
            Ok(t) => t,
            Err(err) => {
                diagnostics.warn(format!("source '{}': {:#}; skipped", source, err));
                return None;
            }
        };
        if prepared.is_empty() {
            return None;
        }
        prepared.insert_column_front("Fonte", Cell::Text(source.clone()));
        diagnostics.accept(&source);
        Some(prepared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::reader::CsvWorkbookReader;
    use std::fs;
    use std::io::Write;
    use std::path::Path;
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    fn init_test_logging() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("info,forecast_compiler=debug")),
            )
            .with_test_writer()
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }

    const CURVE_HEADER: &str =
        "idempreendimento,IdModulo,DataReferencia,VPCurva,PesoModulo,Unidades,VPModulo,VPObra,Obra,SimulacaoId";

    fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    fn curve_row(vp: &str, sim: &str) -> String {
        format!("E1,M1,2026-1,1.0,1.0,1.0,0.5,{},Obra A,{}", vp, sim)
    }

    fn orchestrator() -> Orchestrator {
        Orchestrator::new(Config {
            workers: 2,
            ..Config::default()
        })
    }

    fn vp_sums_by_sim(table: &Table) -> Vec<(String, f64)> {
        let vp = table.column("VPObra").unwrap();
        let sim = table.column("SimulacaoId").unwrap();
        let mut sums: Vec<(String, f64)> = Vec::new();
        for row in &table.rows {
            let key = row[sim].display();
            let value = row[vp].as_number().unwrap_or(0.0);
            match sums.iter_mut().find(|(k, _)| *k == key) {
                Some((_, s)) => *s += value,
                None => sums.push((key, value)),
            }
        }
        sums
    }

    #[test]
    fn closure_is_applied_per_final_group_after_concatenation() -> Result<()> {
        init_test_logging();
        let dir = tempfile::tempdir()?;
        // same curve split across two files: three thirds in one, 0.5/0.2
        // in the other; the combined group must close to 1.000, not 2.000
        let a = write_file(
            dir.path(),
            "a.csv",
            &format!(
                "{}\n{}\n{}\n{}\n",
                CURVE_HEADER,
                curve_row("0.333", "S1"),
                curve_row("0.333", "S1"),
                curve_row("0.333", "S1"),
            ),
        );
        let b = write_file(
            dir.path(),
            "b.csv",
            &format!(
                "{}\n{}\n{}\n",
                CURVE_HEADER,
                curve_row("0.5", "S1"),
                curve_row("0.2", "S1"),
            ),
        );

        let out = orchestrator().run(ReportKind::ProductionCurve, &CsvWorkbookReader, &[a, b])?;
        assert_eq!(out.diagnostics.sources_ok.len(), 2);
        assert_eq!(out.table.rows.len(), 5);

        let sums = vp_sums_by_sim(&out.table);
        assert_eq!(sums.len(), 1);
        assert!((sums[0].1 - 1.0).abs() <= 0.001, "combined group sums to {}", sums[0].1);
        Ok(())
    }

    #[test]
    fn distinct_group_keys_close_independently() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let a = write_file(
            dir.path(),
            "a.csv",
            &format!(
                "{}\n{}\n{}\n",
                CURVE_HEADER,
                curve_row("0.4", "S1"),
                curve_row("0.4", "S1"),
            ),
        );
        let b = write_file(
            dir.path(),
            "b.csv",
            &format!("{}\n{}\n", CURVE_HEADER, curve_row("0.3", "S2")),
        );

        let out = orchestrator().run(ReportKind::ProductionCurve, &CsvWorkbookReader, &[a, b])?;
        for (sim, sum) in vp_sums_by_sim(&out.table) {
            assert!((sum - 1.0).abs() <= 0.001, "{} sums to {}", sim, sum);
        }
        Ok(())
    }

    #[test]
    fn all_rejected_batch_returns_empty_table_and_warnings() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let a = write_file(dir.path(), "a.csv", "Foo,Bar\n1,2\n");
        let b = write_file(dir.path(), "b.csv", "Baz\nx\n");

        let out = orchestrator().run(ReportKind::ProductionCurve, &CsvWorkbookReader, &[a, b])?;
        assert!(out.table.is_empty());
        assert!(out.diagnostics.sources_ok.is_empty());
        assert_eq!(out.diagnostics.warnings.len(), 2);
        assert!(out.diagnostics.warnings[0].contains("missing columns"));
        Ok(())
    }

    #[test]
    fn oversized_batches_are_rejected_not_truncated() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let paths: Vec<PathBuf> = (0..3)
            .map(|i| write_file(dir.path(), &format!("f{}.csv", i), "A\n1\n"))
            .collect();

        let orchestrator = Orchestrator::new(Config {
            workers: 1,
            max_files: Some(2),
            ..Config::default()
        });
        let err = orchestrator
            .run(ReportKind::ProductionCurve, &CsvWorkbookReader, &paths)
            .unwrap_err();
        assert!(err.to_string().contains("exceeds"));
        Ok(())
    }

    #[test]
    fn read_failures_become_warnings_not_aborts() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let good = write_file(
            dir.path(),
            "good.csv",
            &format!("{}\n{}\n", CURVE_HEADER, curve_row("1.0", "S1")),
        );
        let missing = dir.path().join("gone.csv");

        let out =
            orchestrator().run(ReportKind::ProductionCurve, &CsvWorkbookReader, &[good, missing])?;
        assert_eq!(out.diagnostics.sources_ok.len(), 1);
        assert_eq!(out.diagnostics.warnings.len(), 1);
        assert_eq!(out.table.rows.len(), 1);
        Ok(())
    }

    #[test]
    fn consolidated_rows_carry_their_source_tag() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let a = write_file(
            dir.path(),
            "obra.csv",
            &format!("{}\n{}\n", CURVE_HEADER, curve_row("1.0", "S1")),
        );

        let out = orchestrator().run(ReportKind::ProductionCurve, &CsvWorkbookReader, &[a])?;
        assert_eq!(out.table.headers[0], "Fonte");
        assert_eq!(
            out.table.rows[0][0],
            Cell::Text("obra.csv::Planilha1".into())
        );
        Ok(())
    }
}
