//! Storage layer for report-hub
//!
//! Two independent backends sit behind the HTTP handlers:
//! a pooled PostgreSQL connection serving read-only datasets, and a flat
//! directory of report definition files.
//!
//! # Module Structure
//! - `database`: Pool construction and liveness checks
//! - `datasets`: Fixed dataset queries and response assembly
//! - `reports`: Report definition file store

mod database;
mod datasets;
mod reports;

// Re-export public types
pub use database::Database;
pub use datasets::{COMPLIANCES, Datasets, TABLE_DATASETS};
pub use reports::{REPORT_EXTENSION, ReportStore, normalize_file_name};

#[cfg(test)]
pub(crate) use database::unreachable_database;
