//! Ciphertext blob store: one opaque container per object.
//!
//! The store never sees plaintext. Locators are issued by [`BlobStore::put`]
//! and are the only handle the rest of the engine keeps.

pub mod fs;

pub use fs::FsBlobStore;

use async_trait::async_trait;

use crate::error::VaultError;
use crate::object::ObjectId;

/// Durable storage for encrypted containers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write a new blob for `id` and return its locator.
    ///
    /// Readers never observe a partially written blob.
    ///
    /// # Errors
    ///
    /// [`VaultError::DuplicateId`] if a blob for `id` already exists; it is
    /// never overwritten.
    async fn put(&self, id: &ObjectId, container: &[u8]) -> Result<String, VaultError>;

    /// Read a blob. `Ok(None)` if nothing is stored at `locator`.
    async fn get(&self, locator: &str) -> Result<Option<Vec<u8>>, VaultError>;

    /// Remove a blob. Returns `false` if it was already absent.
    async fn delete(&self, locator: &str) -> Result<bool, VaultError>;
}
