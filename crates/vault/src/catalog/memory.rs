//! In-process catalog backed by a sharded concurrent map.
//!
//! Not durable. Used by tests and as the template for embedded key-value
//! backends.

use async_trait::async_trait;
use dashmap::{mapref::entry::Entry, DashMap};

use super::Catalog;
use crate::error::VaultError;
use crate::object::{ObjectDescriptor, ObjectId};

#[derive(Debug, Default)]
pub struct MemoryCatalog {
    records: DashMap<ObjectId, ObjectDescriptor>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn put(&self, descriptor: &ObjectDescriptor) -> Result<(), VaultError> {
        match self.records.entry(descriptor.id.clone()) {
            Entry::Occupied(_) => Err(VaultError::DuplicateId(descriptor.id.clone())),
            Entry::Vacant(slot) => {
                slot.insert(descriptor.clone());
                Ok(())
            }
        }
    }

    async fn get(&self, id: &ObjectId) -> Result<ObjectDescriptor, VaultError> {
        self.records
            .get(id)
            .map(|r| r.value().clone())
            .ok_or_else(|| VaultError::NotFound(id.clone()))
    }

    async fn list(&self) -> Result<Vec<ObjectDescriptor>, VaultError> {
        let mut all: Vec<ObjectDescriptor> =
            self.records.iter().map(|r| r.value().clone()).collect();
        all.sort_by(ObjectDescriptor::newest_first);
        Ok(all)
    }

    async fn delete(&self, id: &ObjectId) -> Result<(), VaultError> {
        self.records
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| VaultError::NotFound(id.clone()))
    }
}
