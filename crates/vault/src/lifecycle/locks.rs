//! Per-object reader/writer locks.
//!
//! Downloads take a shared guard and deletes an exclusive one, so a delete
//! never removes a blob out from under an in-progress read. Entries exist
//! only while some guard (or waiter) holds them; unrelated ids never share a
//! lock.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};

use crate::object::ObjectId;

#[derive(Debug, Default)]
pub struct IdLocks {
    inner: DashMap<ObjectId, Arc<RwLock<()>>>,
}

enum Held {
    // Never read; held for its Drop.
    #[allow(dead_code)]
    Read(OwnedRwLockReadGuard<()>),
    #[allow(dead_code)]
    Write(OwnedRwLockWriteGuard<()>),
}

/// Guard for one id. Releases the lock and prunes the registry on drop.
pub struct IdGuard<'a> {
    locks: &'a IdLocks,
    id: ObjectId,
    held: Option<Held>,
}

impl IdLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared access to `id`.
    pub async fn read(&self, id: &ObjectId) -> IdGuard<'_> {
        let mut guard = self.pending(id);
        let lock = self.entry(id);
        guard.held = Some(Held::Read(lock.read_owned().await));
        guard
    }

    /// Exclusive access to `id`.
    pub async fn write(&self, id: &ObjectId) -> IdGuard<'_> {
        let mut guard = self.pending(id);
        let lock = self.entry(id);
        guard.held = Some(Held::Write(lock.write_owned().await));
        guard
    }

    /// Guard created before waiting, so an abandoned wait still prunes `id`.
    /// Declared ahead of the waiter's `Arc`, it drops after it.
    fn pending(&self, id: &ObjectId) -> IdGuard<'_> {
        IdGuard {
            locks: self,
            id: id.clone(),
            held: None,
        }
    }

    /// Number of ids with a live lock entry.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    fn entry(&self, id: &ObjectId) -> Arc<RwLock<()>> {
        self.inner.entry(id.clone()).or_default().clone()
    }

    fn release(&self, id: &ObjectId) {
        // The map's own reference is the last one: nobody holds or awaits it.
        self.inner.remove_if(id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

impl Drop for IdGuard<'_> {
    fn drop(&mut self) {
        self.held.take();
        self.locks.release(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn id(s: &str) -> ObjectId {
        ObjectId::parse(s).unwrap()
    }

    #[tokio::test]
    async fn entries_are_pruned_after_release() {
        let locks = IdLocks::new();
        {
            let _a = locks.read(&id("a")).await;
            let _b = locks.read(&id("a")).await;
            let _c = locks.write(&id("c")).await;
            assert_eq!(locks.len(), 2);
        }
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn writer_waits_for_readers() {
        let locks = Arc::new(IdLocks::new());
        let reader = locks.read(&id("x")).await;

        let locks2 = locks.clone();
        let writer = tokio::spawn(async move {
            let _w = locks2.write(&id("x")).await;
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!writer.is_finished());
        drop(reader);
        tokio::time::timeout(Duration::from_secs(5), writer)
            .await
            .expect("writer should acquire after reader releases")
            .unwrap();
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn abandoned_waiter_is_pruned() {
        let locks = IdLocks::new();
        let x = id("x");
        let r1 = locks.read(&x).await;
        let r2 = locks.read(&x).await;

        let mut writer = Box::pin(locks.write(&x));
        assert!(futures::poll!(&mut writer).is_pending());

        drop(r1);
        drop(r2);
        assert_eq!(locks.len(), 1);
        drop(writer);
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn distinct_ids_do_not_contend() {
        let locks = IdLocks::new();
        let _w = locks.write(&id("one")).await;
        tokio::time::timeout(Duration::from_millis(100), locks.write(&id("two")))
            .await
            .expect("unrelated id must not block");
    }
}
