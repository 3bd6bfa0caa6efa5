//! Observability for the hotel retrieval engine.
//!
//! Subscriber setup plus logging macros with a consistent field schema
//! (`target`, `operation`, `duration_ms`, ...). The macros expand to
//! `tracing::` calls, so callers depend on `tracing` directly.

pub mod init;
pub mod macros;

pub use init::{init_tracing, LogFormat, TracingConfig};
