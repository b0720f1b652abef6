//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use crate::lifecycle::Vault;

/// Application state shared across all request handlers.
///
/// Cheaply cloneable so Axum can clone it per request.
#[derive(Clone)]
pub struct AppState {
    /// The storage engine.
    pub vault: Arc<Vault>,
}

impl AppState {
    /// Create a new [`AppState`] around a vault.
    pub fn new(vault: Vault) -> Self {
        Self {
            vault: Arc::new(vault),
        }
    }
}
