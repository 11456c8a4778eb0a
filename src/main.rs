// src/main.rs
use anyhow::{bail, Context, Result};
use forecast_compiler::{
    pipeline::registry::{spec_for, ReportSpec},
    Config, CsvWorkbookReader, Orchestrator, ReportKind, RunOutput, Table,
};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,forecast_compiler=info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    // ─── 2) parse arguments ──────────────────────────────────────────
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        bail!(
            "usage: {} <report> <input_dir> [out_dir]\n  report: cronograma | parede | modulo | pp | curvas",
            args[0]
        );
    }
    let kind = match ReportKind::from_tag(&args[1]) {
        Some(kind) => kind,
        None => bail!("unknown report {:?}", args[1]),
    };
    let input_dir = PathBuf::from(&args[2]);
    let out_dir = args
        .get(3)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("out"));
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating output dir {}", out_dir.display()))?;

    // ─── 3) discover input files ─────────────────────────────────────
    let pattern = format!("{}/*.csv", input_dir.display());
    let mut paths: Vec<PathBuf> = glob::glob(&pattern)
        .with_context(|| format!("bad glob pattern {}", pattern))?
        .filter_map(|entry| entry.ok())
        .collect();
    paths.sort();
    info!("{} files matched {}", paths.len(), pattern);
    if paths.is_empty() {
        bail!("no CSV files under {}", input_dir.display());
    }

    // ─── 4) run the pipeline ─────────────────────────────────────────
    // The weighted-plan report rereads big workbooks across runs, so it is the
    // one that reads through the on-disk cache.
    let config = Config {
        use_cache: kind == ReportKind::WeightedPlan,
        ..Config::default()
    };
    let orchestrator = Orchestrator::new(config);
    let reader = CsvWorkbookReader;
    let output = orchestrator.run(kind, &reader, &paths)?;

    // ─── 5) write outputs ────────────────────────────────────────────
    let spec = spec_for(kind);
    let main_path = out_dir.join(format!("{}_consolidado.csv", kind.tag()));
    write_table(&output.table, spec, &main_path)?;
    info!(
        "wrote {} rows → {}",
        output.table.rows.len(),
        main_path.display()
    );

    if let Some(secondary) = &output.secondary {
        let suffix = spec.secondary_tag.unwrap_or("anexo");
        let secondary_path = out_dir.join(format!("{}_{}.csv", kind.tag(), suffix));
        write_table(secondary, spec, &secondary_path)?;
        info!(
            "wrote {} rows → {}",
            secondary.rows.len(),
            secondary_path.display()
        );
    }

    // ─── 6) write run logs ───────────────────────────────────────────
    write_log(
        &out_dir.join(format!("{}_logs_ok.csv", kind.tag())),
        "Fontes_processadas",
        &output.diagnostics.sources_ok,
    )?;
    write_log(
        &out_dir.join(format!("{}_logs_warn.csv", kind.tag())),
        "Avisos",
        &output.diagnostics.warnings,
    )?;
    report_summary(&output);

    Ok(())
}

fn report_summary(output: &RunOutput) {
    info!(
        "done: {} sources accepted, {} warnings",
        output.diagnostics.sources_ok.len(),
        output.diagnostics.warnings.len()
    );
    for warning in &output.diagnostics.warnings {
        info!("warning: {}", warning);
    }
}

/// Write a table as CSV, applying the report's fixed per-column decimal
/// precision to numeric cells.
fn write_table(table: &Table, spec: &ReportSpec, path: &Path) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    writer.write_record(&table.headers)?;

    let precisions: Vec<Option<u32>> = table
        .headers
        .iter()
        .map(|header| {
            spec.rounding
                .iter()
                .find(|(name, _)| *name == header.as_str())
                .map(|(_, precision)| *precision)
        })
        .collect();

    let mut record = Vec::with_capacity(table.headers.len());
    for row in &table.rows {
        record.clear();
        for (cell, precision) in row.iter().zip(&precisions) {
            let field = match (cell.as_number(), precision) {
                (Some(n), Some(p)) => format!("{:.*}", *p as usize, n),
                _ => cell.display(),
            };
            record.push(field);
        }
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_log(path: &Path, header: &str, lines: &[String]) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    writer.write_record([header])?;
    for line in lines {
        writer.write_record([line.as_str()])?;
    }
    writer.flush()?;
    Ok(())
}
