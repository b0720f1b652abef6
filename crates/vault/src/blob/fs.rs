//! [`FsBlobStore`]: ciphertext containers as `<id>.enc` files.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, info, instrument};

use super::BlobStore;
use crate::error::VaultError;
use crate::fs_util;
use crate::object::ObjectId;

const BLOB_EXT: &str = ".enc";

/// Flat directory of encrypted blobs.
///
/// The locator is the blob's file name relative to the store root.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    dir: PathBuf,
}

impl FsBlobStore {
    /// Open (creating if needed) a blob store rooted at `dir`.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, VaultError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .await
            .map_err(VaultError::io("create blob directory"))?;
        info!(path = %dir.display(), "blob store opened");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Locator issued for `id`.
    pub fn locator_for(id: &ObjectId) -> String {
        format!("{id}{BLOB_EXT}")
    }

    /// Resolve a locator to a path inside the store root.
    ///
    /// Locators come back from catalog records, so anything that could
    /// escape the root is refused.
    fn resolve(&self, locator: &str) -> Result<PathBuf, VaultError> {
        let stem = locator
            .strip_suffix(BLOB_EXT)
            .ok_or_else(|| VaultError::InvalidLocator(locator.to_owned()))?;
        ObjectId::parse(stem).map_err(|_| VaultError::InvalidLocator(locator.to_owned()))?;
        Ok(self.dir.join(locator))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    #[instrument(skip_all, fields(id = %id, size = container.len()))]
    async fn put(&self, id: &ObjectId, container: &[u8]) -> Result<String, VaultError> {
        let locator = Self::locator_for(id);
        match fs_util::write_new(&self.dir.join(&locator), container).await {
            Ok(()) => {
                debug!("blob written");
                Ok(locator)
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                Err(VaultError::DuplicateId(id.clone()))
            }
            Err(e) => Err(VaultError::io("write blob")(e)),
        }
    }

    async fn get(&self, locator: &str) -> Result<Option<Vec<u8>>, VaultError> {
        match fs::read(self.resolve(locator)?).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(VaultError::io("read blob")(e)),
        }
    }

    #[instrument(skip(self))]
    async fn delete(&self, locator: &str) -> Result<bool, VaultError> {
        match fs::remove_file(self.resolve(locator)?).await {
            Ok(()) => {
                debug!("blob removed");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(VaultError::io("remove blob")(e)),
        }
    }
}
