//! AES-256-GCM encryption and decryption of whole objects.
//!
//! The nonce is 128 bits rather than GCM's customary 96, matching the
//! container layout already present on disk. A fresh nonce is drawn from
//! the OS CSPRNG for every call; nothing else in the process ever chooses a
//! nonce.

use aes_gcm::{
    aead::{
        consts::U16, generic_array::GenericArray, rand_core::RngCore, AeadInPlace, KeyInit,
        OsRng,
    },
    aes::Aes256,
    AesGcm,
};
use thiserror::Error;
use zeroize::Zeroizing;

use super::key::MasterKey;

/// Byte length of an AES-256 key (32 bytes = 256 bits).
pub const KEY_LEN: usize = 32;

/// Byte length of the per-container nonce (16 bytes = 128 bits).
pub const NONCE_LEN: usize = 16;

/// Byte length of the GCM authentication tag.
pub const TAG_LEN: usize = 16;

/// Bytes preceding the ciphertext in every container.
pub const HEADER_LEN: usize = NONCE_LEN + TAG_LEN;

/// AES-256-GCM with a 16-byte nonce and 16-byte tag.
type Aes256Gcm16 = AesGcm<Aes256, U16>;

/// Errors produced by the cipher layer.
#[derive(Debug, Error)]
pub enum CipherError {
    /// The key is the wrong length (must be [`KEY_LEN`] bytes).
    #[error("invalid key length: expected {KEY_LEN} bytes")]
    InvalidKeyLength,

    /// The container is shorter than [`HEADER_LEN`].
    #[error("container of {0} bytes is too short")]
    MalformedContainer(usize),

    /// The authentication tag did not verify.
    #[error("authentication failed")]
    Integrity,

    /// AES-GCM encryption failed (plaintext beyond the GCM length limit).
    #[error("aead operation failed")]
    AeadFailure,
}

/// Encrypt `plaintext` into a `nonce ‖ tag ‖ ciphertext` container.
///
/// # Errors
///
/// Returns [`CipherError::AeadFailure`] on an internal AEAD error (only
/// reachable for inputs beyond GCM's ~64 GiB limit).
pub fn encrypt(plaintext: &[u8], key: &MasterKey) -> Result<Vec<u8>, CipherError> {
    let cipher = build_cipher(key)?;

    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);

    let mut container = Vec::with_capacity(HEADER_LEN + plaintext.len());
    container.extend_from_slice(&nonce);
    container.extend_from_slice(&[0u8; TAG_LEN]);
    container.extend_from_slice(plaintext);

    let tag = cipher
        .encrypt_in_place_detached(
            GenericArray::from_slice(&nonce),
            b"",
            &mut container[HEADER_LEN..],
        )
        .map_err(|_| CipherError::AeadFailure)?;
    container[NONCE_LEN..HEADER_LEN].copy_from_slice(tag.as_slice());

    Ok(container)
}

/// Verify and decrypt a container produced by [`encrypt`].
///
/// The tag is checked before any plaintext is produced; on failure the
/// working buffer is zeroed and dropped.
///
/// # Errors
///
/// Returns [`CipherError::MalformedContainer`] if `container` is shorter than
/// [`HEADER_LEN`], and [`CipherError::Integrity`] if authentication fails
/// (wrong key, tampered or truncated data).
pub fn decrypt(container: &[u8], key: &MasterKey) -> Result<Zeroizing<Vec<u8>>, CipherError> {
    if container.len() < HEADER_LEN {
        return Err(CipherError::MalformedContainer(container.len()));
    }
    let (nonce, rest) = container.split_at(NONCE_LEN);
    let (tag, ciphertext) = rest.split_at(TAG_LEN);

    let cipher = build_cipher(key)?;
    let mut buf = Zeroizing::new(ciphertext.to_vec());
    cipher
        .decrypt_in_place_detached(
            GenericArray::from_slice(nonce),
            b"",
            buf.as_mut_slice(),
            GenericArray::from_slice(tag),
        )
        .map_err(|_| CipherError::Integrity)?;
    Ok(buf)
}

fn build_cipher(key: &MasterKey) -> Result<Aes256Gcm16, CipherError> {
    Aes256Gcm16::new_from_slice(key.as_bytes()).map_err(|_| CipherError::InvalidKeyLength)
}

/// Codec bound to one [`MasterKey`].
///
/// The key is injected at construction; there is no ambient key lookup.
#[derive(Clone, Debug)]
pub struct Codec {
    key: MasterKey,
}

impl Codec {
    pub fn new(key: MasterKey) -> Self {
        Self { key }
    }

    /// See [`encrypt`].
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
        encrypt(plaintext, &self.key)
    }

    /// See [`decrypt`].
    pub fn decrypt(&self, container: &[u8]) -> Result<Zeroizing<Vec<u8>>, CipherError> {
        decrypt(container, &self.key)
    }
}
