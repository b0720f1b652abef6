//! Metadata catalog: one durable [`ObjectDescriptor`] per stored object.
//!
//! # Module invariants
//!
//! - **No crypto dependencies.** The catalog stores descriptors and nothing else.
//! - `put` never overwrites; an existing id is reported as
//!   [`VaultError::DuplicateId`].
//! - `list` returns a snapshot in [`ObjectDescriptor::newest_first`] order.

pub mod fs;
pub mod memory;

pub use fs::FsCatalog;
pub use memory::MemoryCatalog;

use async_trait::async_trait;

use crate::error::VaultError;
use crate::object::{ObjectDescriptor, ObjectId};

/// Durable, queryable store of object descriptors.
///
/// Each descriptor is an independent record, so `put`/`delete` cost O(1) and
/// `list` O(n). Implementations must allow operations on distinct ids to run
/// in parallel.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Persist a new descriptor.
    ///
    /// # Errors
    ///
    /// [`VaultError::DuplicateId`] if a record for `descriptor.id` exists.
    async fn put(&self, descriptor: &ObjectDescriptor) -> Result<(), VaultError>;

    /// Fetch one descriptor.
    ///
    /// # Errors
    ///
    /// [`VaultError::NotFound`] if no record exists for `id`.
    async fn get(&self, id: &ObjectId) -> Result<ObjectDescriptor, VaultError>;

    /// Snapshot of every descriptor, newest first.
    async fn list(&self) -> Result<Vec<ObjectDescriptor>, VaultError>;

    /// Remove one descriptor.
    ///
    /// # Errors
    ///
    /// [`VaultError::NotFound`] if no record exists for `id`.
    async fn delete(&self, id: &ObjectId) -> Result<(), VaultError>;
}
