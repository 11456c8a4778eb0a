// src/config.rs
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Runtime configuration for one orchestrator. Explicit so several report
/// pipelines can run side by side with independent limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Fixed ingestion worker count, independent of input size.
    pub workers: usize,
    /// Directory for the opportunistic parsed-table cache.
    pub cache_dir: PathBuf,
    /// Whether ingestion consults and fills the cache.
    pub use_cache: bool,
    /// Overrides the report's own maximum accepted file count when set.
    pub max_files: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            workers: 8,
            cache_dir: PathBuf::from("table_cache"),
            use_cache: false,
            max_files: None,
        }
    }
}
