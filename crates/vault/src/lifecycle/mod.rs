//! Storage lifecycle: the only component callers talk to.
//!
//! # Contract
//!
//! - **Upload**: plaintext is staged in a private zeroizing buffer, encrypted,
//!   and wiped *before* any durable write. The blob is written first, then the
//!   descriptor; if the descriptor write fails the blob is removed again.
//!   That commit runs on its own task, so a caller that disconnects or times
//!   out mid-upload cannot interrupt it between the two writes. A
//!   descriptor is therefore visible only once its blob is durable, and no
//!   failure path leaves an orphaned blob or a dangling descriptor.
//! - **Download**: descriptor lookup, blob read, then authenticated decrypt.
//!   Unauthenticated bytes are never returned. A descriptor whose blob is
//!   missing yields [`VaultError::BlobMissing`], never a crash.
//! - **Delete**: blob removal (idempotent) then descriptor removal, under the
//!   id's exclusive lock.
//!
//! Per object: `absent → stored → absent`.

pub mod locks;
pub mod staging;

use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use tokio::io::AsyncRead;
use tracing::{debug, error, info, instrument, warn, Instrument};
use zeroize::Zeroizing;

use crate::blob::{BlobStore, FsBlobStore};
use crate::catalog::{Catalog, FsCatalog};
use crate::crypto::{Codec, MasterKey};
use crate::error::VaultError;
use crate::object::{ObjectDescriptor, ObjectId};
use locks::IdLocks;
use staging::StagingBuffer;

/// How many fresh ids an upload tries before giving up on collisions.
const ID_ATTEMPTS: usize = 3;

/// Name recorded when the uploader supplies none.
pub const DEFAULT_NAME: &str = "unnamed";

/// Content type recorded when the uploader supplies none.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Sub-directory of the data root holding ciphertext blobs.
pub const UPLOADS_DIR: &str = "uploads";

/// Sub-directory of the data root holding catalog records.
pub const METADATA_DIR: &str = "metadata";

/// Decrypted object handed to the caller.
///
/// The plaintext buffer is wiped when this value (or the buffer) is dropped.
pub struct Download {
    pub descriptor: ObjectDescriptor,
    pub plaintext: Zeroizing<Vec<u8>>,
}

impl std::fmt::Debug for Download {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Download")
            .field("descriptor", &self.descriptor)
            .field("plaintext_len", &self.plaintext.len())
            .finish()
    }
}

/// Encrypted object store composing codec, catalog, and blob store.
pub struct Vault {
    codec: Codec,
    catalog: Arc<dyn Catalog>,
    blobs: Arc<dyn BlobStore>,
    locks: IdLocks,
    max_object_size: u64,
}

impl Vault {
    /// Assemble a vault from its parts.
    pub fn new(
        key: MasterKey,
        catalog: Arc<dyn Catalog>,
        blobs: Arc<dyn BlobStore>,
        max_object_size: u64,
    ) -> Self {
        Self {
            codec: Codec::new(key),
            catalog,
            blobs,
            locks: IdLocks::new(),
            max_object_size,
        }
    }

    /// Open the filesystem-backed vault under `data_dir`, creating
    /// `uploads/` and `metadata/` if needed.
    pub async fn open(
        data_dir: &Path,
        key: MasterKey,
        max_object_size: u64,
    ) -> Result<Self, VaultError> {
        let catalog = FsCatalog::open(data_dir.join(METADATA_DIR)).await?;
        let blobs = FsBlobStore::open(data_dir.join(UPLOADS_DIR)).await?;
        Ok(Self::new(
            key,
            Arc::new(catalog),
            Arc::new(blobs),
            max_object_size,
        ))
    }

    pub fn max_object_size(&self) -> u64 {
        self.max_object_size
    }

    /// Store `plaintext` as a new encrypted object.
    ///
    /// # Errors
    ///
    /// [`VaultError::TooLarge`] if the stream exceeds the size ceiling,
    /// [`VaultError::UploadStream`] if reading it fails, or any storage error.
    /// On every error path the staged plaintext is wiped and no descriptor or
    /// blob remains.
    #[instrument(skip_all, fields(id))]
    pub async fn upload<R>(
        &self,
        original_name: &str,
        mime_type: &str,
        plaintext: R,
    ) -> Result<ObjectDescriptor, VaultError>
    where
        R: AsyncRead + Unpin + Send,
    {
        let mut staged = StagingBuffer::new(self.max_object_size);
        staged.fill_from(plaintext).await?;
        let size = staged.len() as u64;

        let container = Bytes::from(self.codec.encrypt(staged.as_slice())?);
        drop(staged);

        let commit = Commit {
            catalog: Arc::clone(&self.catalog),
            blobs: Arc::clone(&self.blobs),
            original_name: non_empty_or(original_name, DEFAULT_NAME),
            mime_type: non_empty_or(mime_type, DEFAULT_MIME_TYPE),
            size,
            container,
        };
        // Once the blob is written, the descriptor write (or the rollback)
        // must run even if this future is dropped.
        let task = tokio::spawn(commit.run().instrument(tracing::Span::current()));
        match task.await {
            Ok(result) => result,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => Err(VaultError::Interrupted(e.to_string())),
        }
    }

    /// Look up one descriptor.
    pub async fn get(&self, id: &ObjectId) -> Result<ObjectDescriptor, VaultError> {
        self.catalog.get(id).await
    }

    /// All descriptors, newest first.
    pub async fn list(&self) -> Result<Vec<ObjectDescriptor>, VaultError> {
        self.catalog.list().await
    }

    /// Number of stored objects.
    pub async fn count(&self) -> Result<usize, VaultError> {
        Ok(self.catalog.list().await?.len())
    }

    /// Decrypt one object.
    ///
    /// # Errors
    ///
    /// [`VaultError::NotFound`] for an unknown id, [`VaultError::BlobMissing`]
    /// if the descriptor has no blob (including losing a race with
    /// [`Vault::delete`]), [`VaultError::Integrity`] if authentication fails.
    #[instrument(skip_all, fields(id = %id))]
    pub async fn download(&self, id: &ObjectId) -> Result<Download, VaultError> {
        let descriptor = self.catalog.get(id).await?;

        let container = {
            let _guard = self.locks.read(id).await;
            self.blobs.get(&descriptor.locator).await?
        };
        let container = match container {
            Some(c) => c,
            None => {
                warn!("descriptor present but ciphertext missing");
                return Err(VaultError::BlobMissing(id.clone()));
            }
        };

        let plaintext = match self.codec.decrypt(&container) {
            Ok(p) => p,
            Err(e) => {
                let err = VaultError::from(e);
                error!(error = %err, "stored object failed verification");
                return Err(err);
            }
        };
        debug!(size = plaintext.len(), "object decrypted");
        Ok(Download {
            descriptor,
            plaintext,
        })
    }

    /// Remove an object's blob and descriptor.
    ///
    /// # Errors
    ///
    /// [`VaultError::NotFound`] if no descriptor exists for `id`.
    #[instrument(skip_all, fields(id = %id))]
    pub async fn delete(&self, id: &ObjectId) -> Result<(), VaultError> {
        let _guard = self.locks.write(id).await;
        let descriptor = self.catalog.get(id).await?;

        if !self.blobs.delete(&descriptor.locator).await? {
            warn!("ciphertext already absent; removing descriptor");
        }
        self.catalog.delete(id).await?;
        info!("object deleted");
        Ok(())
    }
}

/// Blob-then-descriptor write for one encrypted upload.
struct Commit {
    catalog: Arc<dyn Catalog>,
    blobs: Arc<dyn BlobStore>,
    original_name: String,
    mime_type: String,
    size: u64,
    container: Bytes,
}

impl Commit {
    async fn run(self) -> Result<ObjectDescriptor, VaultError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let id = ObjectId::generate();
            match self.store(&id).await {
                Ok(descriptor) => {
                    tracing::Span::current().record("id", tracing::field::display(&id));
                    info!(size = self.size, "object stored");
                    return Ok(descriptor);
                }
                Err(VaultError::DuplicateId(_)) if attempt < ID_ATTEMPTS => {
                    warn!(%id, attempt, "object id collision; retrying with a fresh id");
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Write blob then descriptor for `id`, rolling the blob back if the
    /// descriptor cannot be written.
    async fn store(&self, id: &ObjectId) -> Result<ObjectDescriptor, VaultError> {
        let locator = self.blobs.put(id, &self.container).await?;

        let descriptor = ObjectDescriptor {
            id: id.clone(),
            original_name: self.original_name.clone(),
            size: self.size,
            mime_type: self.mime_type.clone(),
            created_at: Utc::now(),
            locator,
        };

        if let Err(e) = self.catalog.put(&descriptor).await {
            match self.blobs.delete(&descriptor.locator).await {
                Ok(_) => debug!(%id, "rolled back blob after catalog write failure"),
                Err(rollback) => error!(
                    %id,
                    error = %rollback,
                    "failed to roll back blob; ciphertext is orphaned"
                ),
            }
            return Err(e);
        }
        Ok(descriptor)
    }
}

fn non_empty_or(value: &str, default: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        default.to_owned()
    } else {
        trimmed.to_owned()
    }
}
