//! Encrypted file storage engine.
//!
//! Layers, bottom-up:
//! - [`crypto`]: AES-256-GCM codec producing `nonce ‖ tag ‖ ciphertext` containers.
//! - [`catalog`]: durable `id → descriptor` records, one per object.
//! - [`blob`]: opaque ciphertext blobs, one per object.
//! - [`lifecycle`]: the [`Vault`] that composes the three and owns the
//!   upload / download / delete contract.
//!
//! [`server`] is the HTTP binding used by the `vaultd` binary.

pub mod blob;
pub mod catalog;
pub mod config;
pub mod crypto;
pub mod error;
pub mod lifecycle;
pub mod object;
pub mod server;
pub mod telemetry;

mod fs_util;

pub use error::VaultError;
pub use lifecycle::Vault;
pub use object::{ObjectDescriptor, ObjectId};
