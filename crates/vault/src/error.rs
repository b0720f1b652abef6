//! Engine error taxonomy.
//!
//! Every error is returned to the immediate caller; nothing here is retried
//! internally except id generation in [`crate::Vault::upload`].

use std::io;

use common::ServiceError;
use thiserror::Error;

use crate::crypto::cipher::{CipherError, HEADER_LEN};
use crate::object::ObjectId;

/// Errors produced by the codec, catalog, blob store and lifecycle layers.
#[derive(Debug, Error)]
pub enum VaultError {
    /// No descriptor exists for this id.
    #[error("object {0} not found")]
    NotFound(ObjectId),

    /// A descriptor exists but its ciphertext blob does not.
    ///
    /// Reachable after a crash between blob removal and descriptor removal.
    /// Callers treat it exactly like [`VaultError::NotFound`].
    #[error("ciphertext for object {0} is missing")]
    BlobMissing(ObjectId),

    /// The caller supplied a string that is not a well-formed object id.
    #[error("invalid object id")]
    InvalidId,

    /// Authentication tag verification failed: tampering, corruption, or wrong key.
    #[error("integrity check failed")]
    Integrity,

    /// The container is too short to hold a nonce and tag.
    #[error("malformed container: {0} bytes is shorter than the {HEADER_LEN}-byte header")]
    MalformedContainer(usize),

    /// A catalog record or blob already exists for this id.
    #[error("duplicate object id {0}")]
    DuplicateId(ObjectId),

    /// The master key or another startup setting is missing or invalid.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The upload exceeds the configured plaintext size ceiling.
    #[error("object exceeds the {limit}-byte size limit")]
    TooLarge {
        /// Configured ceiling in bytes.
        limit: u64,
    },

    /// Reading the caller's upload stream failed (usually a disconnect).
    #[error("upload stream failed: {0}")]
    UploadStream(#[source] io::Error),

    /// A catalog record exists but cannot be decoded.
    #[error("catalog record {id} is unreadable: {reason}")]
    CorruptRecord {
        /// Record file or key that failed to decode.
        id: String,
        /// Decoder message.
        reason: String,
    },

    /// A blob locator does not name a blob this store could have written.
    #[error("invalid blob locator {0:?}")]
    InvalidLocator(String),

    /// The underlying durable medium failed.
    #[error("storage I/O error during {op}: {source}")]
    StorageIo {
        /// What the engine was doing.
        op: &'static str,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// The task committing an upload was cancelled before it reported back.
    #[error("upload commit interrupted: {0}")]
    Interrupted(String),

    /// The AEAD primitive itself failed (not an authentication failure).
    #[error("cipher failure: {0}")]
    Cipher(String),
}

impl VaultError {
    /// Returns a closure that wraps an [`io::Error`] as [`VaultError::StorageIo`].
    ///
    /// Intended for `map_err(VaultError::io("write blob"))`.
    pub fn io(op: &'static str) -> impl FnOnce(io::Error) -> Self {
        move |source| VaultError::StorageIo { op, source }
    }

    /// `true` for every variant a client should see as "no such object".
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            VaultError::NotFound(_) | VaultError::BlobMissing(_) | VaultError::InvalidId
        )
    }

    /// Returns the HTTP status code that should be sent for this error.
    pub fn http_status(&self) -> u16 {
        ServiceError::from(self).http_status()
    }
}

impl From<CipherError> for VaultError {
    fn from(err: CipherError) -> Self {
        match err {
            CipherError::Integrity => VaultError::Integrity,
            CipherError::MalformedContainer(len) => VaultError::MalformedContainer(len),
            other => VaultError::Cipher(other.to_string()),
        }
    }
}

impl From<&VaultError> for ServiceError {
    fn from(err: &VaultError) -> Self {
        match err {
            VaultError::NotFound(_) | VaultError::BlobMissing(_) | VaultError::InvalidId => {
                ServiceError::NotFound("file not found".into())
            }
            VaultError::TooLarge { .. } => ServiceError::PayloadTooLarge(err.to_string()),
            VaultError::UploadStream(_) => ServiceError::BadRequest(err.to_string()),
            VaultError::Integrity | VaultError::MalformedContainer(_) => {
                ServiceError::IntegrityFailure("stored file failed verification".into())
            }
            // Internal details (paths, record names) stay in the logs.
            _ => ServiceError::Internal("storage operation failed".into()),
        }
    }
}
