//! Axum HTTP binding for the vault.
//!
//! # Responsibilities
//! - Define the Axum router with all routes and shared middleware.
//! - Translate multipart uploads into [`crate::Vault::upload`] streams.
//! - Map [`crate::VaultError`] onto status codes and JSON error bodies.
//!
//! TLS is terminated in front of this service.

pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;
