//! Shared data model, configuration, error taxonomy, metrics and
//! persistence for the EventFlow ingestion and worker binaries.
//!
//! Neither binary depends on the other; both depend only on this crate and
//! on `queue-adapter` / `health` / `platform-http-contracts`.

pub mod config;
pub mod db;
pub mod enrich;
pub mod error;
pub mod metrics;
pub mod models;
pub mod repos;
pub mod validate;

pub use config::SharedConfig;
pub use error::{StoreError, StructuralError, ValidationError};
pub use metrics::Metrics;
pub use models::{EventKind, EventSubmission, FailedRecord, ProcessedRecord, RawRecord};
