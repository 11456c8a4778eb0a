// src/ingest/cache.rs
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use glob::glob;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::table::Table;

/// On-disk read-through cache of parsed workbooks, one JSON artifact per
/// distinct source file name. Entries are opportunistic: an unreadable or
/// corrupt artifact falls back to a full re-parse, and a failed store is a
/// debug event, never an error.
pub struct TableCache {
    dir: PathBuf,
}

#[derive(Serialize, Deserialize)]
struct Artifact {
    sheets: Vec<(String, Table)>,
}

impl TableCache {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("creating cache directory {}", dir.display()))?;
        Ok(TableCache { dir })
    }

    fn artifact_path(&self, file_name: &str) -> PathBuf {
        // keyed by file name only; path separators would escape the dir
        let safe: String = file_name
            .chars()
            .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
            .collect();
        self.dir.join(format!("{}.json", safe))
    }

    pub fn load(&self, file_name: &str) -> Option<Vec<(String, Table)>> {
        let path = self.artifact_path(file_name);
        let file = File::open(&path).ok()?;
        match serde_json::from_reader::<_, Artifact>(BufReader::new(file)) {
            Ok(artifact) => {
                debug!(file = %file_name, "cache hit");
                Some(artifact.sheets)
            }
            Err(err) => {
                debug!(file = %file_name, %err, "corrupt cache artifact, re-parsing");
                None
            }
        }
    }

    pub fn store(&self, file_name: &str, sheets: &[(String, Table)]) {
        let path = self.artifact_path(file_name);
        let tmp = path.with_extension("json.tmp");
        let result = (|| -> Result<()> {
            let file = File::create(&tmp)
                .with_context(|| format!("creating {}", tmp.display()))?;
            serde_json::to_writer(
                BufWriter::new(file),
                &Artifact {
                    sheets: sheets.to_vec(),
                },
            )
            .context("serializing cache artifact")?;
            fs::rename(&tmp, &path)
                .with_context(|| format!("renaming {} into place", tmp.display()))?;
            Ok(())
        })();
        if let Err(err) = result {
            debug!(file = %file_name, %err, "cache store failed");
        }
    }

    /// Delete every artifact; returns `(files_removed, bytes_freed)`.
    pub fn clear(&self) -> Result<(usize, u64)> {
        let pattern = format!("{}/*.json", self.dir.display());
        let mut removed = 0;
        let mut bytes = 0u64;
        for entry in glob(&pattern).context("invalid glob pattern for cache clear")? {
            let path: PathBuf = match entry {
                Ok(p) => p,
                Err(_) => continue,
            };
            if let Ok(meta) = path.metadata() {
                bytes += meta.len();
            }
            if fs::remove_file(&path).is_ok() {
                removed += 1;
            }
        }
        Ok((removed, bytes))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
