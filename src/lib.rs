//! Vulnscope: a local vulnerability-intelligence store with a text-derived
//! severity classifier.
//!
//! Records are ingested from NVD-style JSON feeds and weakness-taxonomy CSV
//! exports, persisted in an embedded store, and used to train a severity
//! model whose fitted pieces are saved as one atomic artifact bundle.

pub mod config;
pub mod error;
pub mod ingest;
pub mod ml;
pub mod models;
pub mod query;
pub mod state;

pub use config::Config;
pub use error::{AppError, Result};
pub use query::{QueryEngine, ReportEntry, ReportOutcome};
