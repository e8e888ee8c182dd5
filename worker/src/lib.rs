//! Worker pool: consumes queued events, dedups/validates/enriches/persists
//! them, retries transient store failures, dead-letters permanent ones, and
//! acknowledges. Split into a library target so integration tests under
//! `tests/` can drive `processor::process_entry` and `consumer::run` against
//! a real Postgres pool, mirroring the reference platform's per-module
//! `lib.rs` + thin `main.rs` split.

pub mod config;
pub mod consumer;
pub mod metrics_sampler;
pub mod metrics_server;
pub mod processor;
