// src/ingest/mod.rs
//! Parallel multi-file ingestion with per-source failure isolation. Sources
//! fan out over a bounded worker pool scoped to one call; a read failure on
//! one source becomes a tagged outcome and never aborts its siblings.

pub mod cache;
pub mod reader;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use tracing::{info, instrument, warn};

use crate::config::Config;
use crate::table::Table;
use cache::TableCache;
use reader::WorkbookReader;

/// Explicit per-source result the orchestrator pattern-matches on.
#[derive(Debug)]
pub enum SourceOutcome {
    /// One `(file, sheet)` pair parsed into a raw table.
    Loaded { source: String, table: Table },
    /// The source parsed but lacks required columns for the report.
    Rejected { source: String, reason: String },
    /// The underlying file could not be read at all.
    Failed { source: String, reason: String },
}

pub struct Ingestor<'a> {
    reader: &'a dyn WorkbookReader,
    config: &'a Config,
    cache_scope: Option<&'a str>,
}

impl<'a> Ingestor<'a> {
    pub fn new(reader: &'a dyn WorkbookReader, config: &'a Config) -> Self {
        Ingestor {
            reader,
            config,
            cache_scope: None,
        }
    }

    /// Namespace cache artifacts under a per-report subdirectory. Artifact
    /// content depends on the report's column filter and row cap, so two
    /// reports sharing one cache directory must never share artifacts.
    pub fn cache_scope(mut self, scope: &'a str) -> Self {
        self.cache_scope = Some(scope);
        self
    }

    /// Read every path, in parallel, into per-sheet outcomes. Output order
    /// follows input path order (and sheet order within a file), never
    /// worker completion order.
    #[instrument(level = "info", skip_all, fields(files = paths.len()))]
    pub fn read_many(
        &self,
        paths: &[PathBuf],
        row_cap: Option<usize>,
        keep_columns: Option<&[&str]>,
    ) -> Result<Vec<SourceOutcome>> {
        let cache = if self.config.use_cache {
            let dir = match self.cache_scope {
                Some(scope) => self.config.cache_dir.join(scope),
                None => self.config.cache_dir.clone(),
            };
            Some(TableCache::new(dir)?)
        } else {
            None
        };

        // pool lives for this call only; released on every exit path
        let pool = ThreadPoolBuilder::new()
            .num_threads(self.config.workers.max(1))
            .build()
            .context("building ingestion worker pool")?;

        let nested: Vec<Vec<SourceOutcome>> = pool.install(|| {
            paths
                .par_iter()
                .map(|path| self.read_one(path, row_cap, keep_columns, cache.as_ref()))
                .collect()
        });

        let outcomes: Vec<SourceOutcome> = nested.into_iter().flatten().collect();
        info!(outcomes = outcomes.len(), "ingestion complete");
        Ok(outcomes)
    }

    fn read_one(
        &self,
        path: &Path,
        row_cap: Option<usize>,
        keep_columns: Option<&[&str]>,
        cache: Option<&TableCache>,
    ) -> Vec<SourceOutcome> {
        let file_name = path
            .file_name()
            .map(|f| f.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        if let Some(cache) = cache {
            if let Some(sheets) = cache.load(&file_name) {
                return to_outcomes(&file_name, sheets);
            }
        }

        match self.reader.read(path, row_cap) {
            Ok(mut sheets) => {
                if let Some(keep) = keep_columns {
                    for (_, table) in &mut sheets {
                        *table = filter_columns(table, keep);
                    }
                }
                if let Some(cache) = cache {
                    cache.store(&file_name, &sheets);
                }
                to_outcomes(&file_name, sheets)
            }
            Err(err) => {
                warn!(file = %file_name, "read failed: {:#}", err);
                vec![SourceOutcome::Failed {
                    source: file_name,
                    reason: format!("{:#}", err),
                }]
            }
        }
    }
}

fn to_outcomes(file_name: &str, sheets: Vec<(String, Table)>) -> Vec<SourceOutcome> {
    sheets
        .into_iter()
        .map(|(sheet, table)| SourceOutcome::Loaded {
            source: format!("{}::{}", file_name, sheet),
            table,
        })
        .collect()
}

/// Keep only the columns whose trimmed header appears in `keep`. Used to
/// shrink cached artifacts to the columns a report actually consumes.
fn filter_columns(table: &Table, keep: &[&str]) -> Table {
    let kept: Vec<&str> = table
        .headers
        .iter()
        .filter(|h| keep.contains(&h.trim()))
        .map(|h| h.as_str())
        .collect();
    table.select(&kept)
}
