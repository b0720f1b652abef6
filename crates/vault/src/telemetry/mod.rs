//! Structured logging and optional OpenTelemetry span export.
//!
//! # Telemetry invariants
//!
//! - **No plaintext or key material** may appear in any span attribute or log
//!   field. Object ids and sizes are fine; original file names are logged at
//!   debug level only.
//! - Log level is configurable via `LOG_LEVEL` (default: `info`), overridden
//!   by `RUST_LOG`.

pub mod init;

pub use init::init_telemetry;
