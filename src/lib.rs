// src/lib.rs
//! Consolidation engine for construction forecast spreadsheets.
//!
//! Batches of per-project CSV exports are read in parallel, normalised
//! against a per-report schema, stacked into one table and finished with
//! report-specific derivations (calendar durations, cost weights,
//! percentage closure). See [`pipeline::Orchestrator`] for the entry point.

pub mod closure;
pub mod config;
pub mod duration;
pub mod group;
pub mod ingest;
pub mod parse;
pub mod pipeline;
pub mod schema;
pub mod table;

pub use config::Config;
pub use ingest::reader::{CsvWorkbookReader, WorkbookReader};
pub use pipeline::registry::ReportKind;
pub use pipeline::{Orchestrator, RunOutput};
pub use table::{Cell, Table};
