//! Private in-memory staging area for upload plaintext.

use tokio::io::{AsyncRead, AsyncReadExt};
use zeroize::Zeroizing;

use crate::error::VaultError;

/// Initial allocation and read chunk size.
const CHUNK: usize = 16 * 1024;

/// Bounded plaintext buffer that never leaves unzeroed copies behind.
///
/// `Vec` growth would copy the contents and free the old allocation without
/// clearing it, so the buffer grows by hand: every retired allocation is a
/// [`Zeroizing`] that wipes itself on drop. Dropping the buffer (success,
/// error, or a cancelled request future) wipes the current allocation.
pub struct StagingBuffer {
    buf: Zeroizing<Vec<u8>>,
    limit: u64,
}

impl StagingBuffer {
    /// Empty buffer accepting at most `limit` bytes.
    pub fn new(limit: u64) -> Self {
        Self {
            buf: Zeroizing::new(Vec::new()),
            limit,
        }
    }

    /// Append `chunk`.
    ///
    /// # Errors
    ///
    /// [`VaultError::TooLarge`] if the buffer would exceed its limit. The
    /// contents are left unchanged.
    pub fn extend(&mut self, chunk: &[u8]) -> Result<(), VaultError> {
        let needed = self.buf.len() + chunk.len();
        if needed as u64 > self.limit {
            return Err(VaultError::TooLarge { limit: self.limit });
        }
        if needed > self.buf.capacity() {
            let ceiling = usize::try_from(self.limit).unwrap_or(usize::MAX);
            let target = needed
                .max(self.buf.capacity().saturating_mul(2))
                .max(CHUNK)
                .min(ceiling)
                .max(needed);
            let mut grown = Zeroizing::new(Vec::with_capacity(target));
            grown.extend_from_slice(&self.buf);
            self.buf = grown;
        }
        self.buf.extend_from_slice(chunk);
        Ok(())
    }

    /// Drain `reader` into the buffer.
    ///
    /// # Errors
    ///
    /// [`VaultError::TooLarge`] as soon as the limit is crossed, or
    /// [`VaultError::UploadStream`] if the reader fails.
    pub async fn fill_from<R>(&mut self, mut reader: R) -> Result<(), VaultError>
    where
        R: AsyncRead + Unpin,
    {
        let mut chunk = Zeroizing::new(vec![0u8; CHUNK]);
        loop {
            let n = reader
                .read(chunk.as_mut_slice())
                .await
                .map_err(VaultError::UploadStream)?;
            if n == 0 {
                return Ok(());
            }
            self.extend(&chunk[..n])?;
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn collects_reader_contents() {
        let data: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();
        let mut staged = StagingBuffer::new(1 << 20);
        staged.fill_from(data.as_slice()).await.unwrap();
        assert_eq!(staged.as_slice(), data.as_slice());
    }

    #[tokio::test]
    async fn enforces_limit() {
        let mut staged = StagingBuffer::new(10);
        let err = staged.fill_from(&b"eleven bytes"[..]).await.unwrap_err();
        assert!(matches!(err, VaultError::TooLarge { limit: 10 }));
    }

    #[tokio::test]
    async fn exact_limit_is_accepted() {
        let mut staged = StagingBuffer::new(5);
        staged.fill_from(&b"12345"[..]).await.unwrap();
        assert_eq!(staged.len(), 5);
    }

    #[test]
    fn growth_preserves_contents() {
        let mut staged = StagingBuffer::new(u64::MAX);
        for i in 0..50u8 {
            staged.extend(&[i; 1000]).unwrap();
        }
        assert_eq!(staged.len(), 50_000);
        assert_eq!(staged.as_slice()[49_999], 49);
        assert_eq!(staged.as_slice()[0], 0);
    }

    #[test]
    fn empty_by_default() {
        assert!(StagingBuffer::new(1).is_empty());
    }
}
