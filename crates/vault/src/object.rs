//! Object identity and the per-object descriptor record.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::VaultError;

/// Unique, immutable identifier of one stored object.
///
/// Generated ids are `<unix-millis>-<32 hex chars>`: a time component plus a
/// random UUIDv4 component. Ids arriving from callers must match
/// `[0-9A-Za-z-]{1,64}`, which keeps them safe to embed in file names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectId(String);

impl ObjectId {
    /// Longest id accepted by [`ObjectId::parse`].
    pub const MAX_LEN: usize = 64;

    /// Generate a fresh id.
    pub fn generate() -> Self {
        Self(format!(
            "{}-{}",
            Utc::now().timestamp_millis(),
            Uuid::new_v4().simple()
        ))
    }

    /// Validate an untrusted id string.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::InvalidId`] if `s` is empty, too long, or contains
    /// anything other than ASCII alphanumerics and `-`.
    pub fn parse(s: &str) -> Result<Self, VaultError> {
        let valid = !s.is_empty()
            && s.len() <= Self::MAX_LEN
            && s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-');
        if valid {
            Ok(Self(s.to_owned()))
        } else {
            Err(VaultError::InvalidId)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ObjectId {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ObjectId {
    type Error = VaultError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<ObjectId> for String {
    fn from(id: ObjectId) -> Self {
        id.0
    }
}

/// Durable metadata record for one stored object.
///
/// Descriptors are written once by a successful upload and never mutated.
/// The serialised field names match the on-disk records of earlier
/// deployments (`uploadDate`, `encryptedPath`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectDescriptor {
    pub id: ObjectId,
    /// Name supplied by the uploader. Untrusted.
    pub original_name: String,
    /// Plaintext length in bytes (not the container length).
    pub size: u64,
    /// Content type supplied by the uploader. Informational only.
    pub mime_type: String,
    #[serde(rename = "uploadDate")]
    pub created_at: DateTime<Utc>,
    /// Opaque reference to the ciphertext blob, issued by the blob store.
    #[serde(rename = "encryptedPath")]
    pub locator: String,
}

impl ObjectDescriptor {
    /// Catalog listing order: newest first, ties broken by ascending id.
    pub fn newest_first(a: &Self, b: &Self) -> Ordering {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.cmp(&b.id))
    }

    /// Client-visible view, without the locator.
    pub fn to_view(&self) -> common::protocol::FileDescriptor {
        common::protocol::FileDescriptor {
            id: self.id.to_string(),
            original_name: self.original_name.clone(),
            size: self.size,
            mime_type: self.mime_type.clone(),
            upload_date: self.created_at,
        }
    }
}
