//! [`FsCatalog`]: one pretty-printed JSON record per object on disk.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, info, instrument, warn};

use super::Catalog;
use crate::error::VaultError;
use crate::fs_util;
use crate::object::{ObjectDescriptor, ObjectId};

const RECORD_EXT: &str = "json";

/// Filesystem-backed catalog: `<dir>/<id>.json`.
///
/// Records are written once via [`fs_util::write_new`], so a concurrent
/// `list` or `get` never sees a partially written record.
#[derive(Debug, Clone)]
pub struct FsCatalog {
    dir: PathBuf,
}

impl FsCatalog {
    /// Open (creating if needed) a catalog rooted at `dir`.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, VaultError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .await
            .map_err(VaultError::io("create metadata directory"))?;
        info!(path = %dir.display(), "metadata catalog opened");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, id: &ObjectId) -> PathBuf {
        self.dir.join(format!("{id}.{RECORD_EXT}"))
    }

    async fn read_record(path: &Path) -> Result<Option<ObjectDescriptor>, VaultError> {
        let bytes = match fs::read(path).await {
            Ok(b) => b,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(VaultError::io("read catalog record")(e)),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| VaultError::CorruptRecord {
                id: path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl Catalog for FsCatalog {
    #[instrument(skip_all, fields(id = %descriptor.id))]
    async fn put(&self, descriptor: &ObjectDescriptor) -> Result<(), VaultError> {
        let json = serde_json::to_vec_pretty(descriptor).map_err(|e| VaultError::CorruptRecord {
            id: descriptor.id.to_string(),
            reason: e.to_string(),
        })?;
        match fs_util::write_new(&self.record_path(&descriptor.id), &json).await {
            Ok(()) => {
                debug!("catalog record written");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                Err(VaultError::DuplicateId(descriptor.id.clone()))
            }
            Err(e) => Err(VaultError::io("write catalog record")(e)),
        }
    }

    async fn get(&self, id: &ObjectId) -> Result<ObjectDescriptor, VaultError> {
        Self::read_record(&self.record_path(id))
            .await?
            .ok_or_else(|| VaultError::NotFound(id.clone()))
    }

    async fn list(&self) -> Result<Vec<ObjectDescriptor>, VaultError> {
        let mut entries = fs::read_dir(&self.dir)
            .await
            .map_err(VaultError::io("scan metadata directory"))?;

        let mut all = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(VaultError::io("scan metadata directory"))?
        {
            let path = entry.path();
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if fs_util::is_temp_name(&name)
                || path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXT)
            {
                continue;
            }
            // Records deleted mid-scan simply drop out of the snapshot.
            match Self::read_record(&path).await {
                Ok(Some(d)) => all.push(d),
                Ok(None) => {}
                Err(VaultError::CorruptRecord { id, reason }) => {
                    warn!(record = %id, %reason, "skipping unreadable catalog record");
                }
                Err(e) => return Err(e),
            }
        }

        all.sort_by(ObjectDescriptor::newest_first);
        Ok(all)
    }

    #[instrument(skip_all, fields(id = %id))]
    async fn delete(&self, id: &ObjectId) -> Result<(), VaultError> {
        match fs::remove_file(self.record_path(id)).await {
            Ok(()) => {
                debug!("catalog record removed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(VaultError::NotFound(id.clone())),
            Err(e) => Err(VaultError::io("remove catalog record")(e)),
        }
    }
}
