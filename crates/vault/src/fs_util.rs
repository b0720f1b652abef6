//! Write-once file helper shared by the filesystem catalog and blob store.

use std::io;
use std::path::Path;

use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Suffix of in-flight temporary files. Directory scans skip these.
pub(crate) const TEMP_SUFFIX: &str = ".tmp";

/// Durably write `data` to `path`, failing with [`io::ErrorKind::AlreadyExists`]
/// instead of overwriting an existing file.
///
/// The bytes are written and synced to a hidden temporary sibling first,
/// then hard-linked into place, so `path` is either absent or complete. The
/// temporary file is removed on every exit path.
pub(crate) async fn write_new(path: &Path, data: &[u8]) -> io::Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no parent"))?;
    let temp = dir.join(format!(".{}{TEMP_SUFFIX}", Uuid::new_v4().simple()));

    let result = write_and_link(&temp, path, data).await;
    if let Err(e) = fs::remove_file(&temp).await {
        if e.kind() != io::ErrorKind::NotFound {
            tracing::warn!(error = %e, "failed to remove temporary file");
        }
    }
    result
}

async fn write_and_link(temp: &Path, path: &Path, data: &[u8]) -> io::Result<()> {
    let mut file = File::create(temp).await?;
    file.write_all(data).await?;
    file.sync_all().await?;
    drop(file);
    fs::hard_link(temp, path).await
}

/// `true` if the directory entry name belongs to an in-flight write.
pub(crate) fn is_temp_name(name: &str) -> bool {
    name.starts_with('.') && name.ends_with(TEMP_SUFFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_and_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.bin");
        write_new(&path, b"first").await.unwrap();
        let err = write_new(&path, b"second").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(fs::read(&path).await.unwrap(), b"first");
    }

    #[tokio::test]
    async fn leaves_no_temporary_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.bin");
        write_new(&path, b"x").await.unwrap();
        let _ = write_new(&path, b"y").await;
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, ["a.bin"]);
    }

    #[test]
    fn temp_name_detection() {
        assert!(is_temp_name(".abc.tmp"));
        assert!(!is_temp_name("abc.json"));
        assert!(!is_temp_name("abc.tmp"));
    }
}
