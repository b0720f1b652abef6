//! [`MasterKey`]: the process-wide 256-bit secret.

use aes_gcm::aead::{rand_core::RngCore, OsRng};
use zeroize::Zeroizing;

use super::cipher::KEY_LEN;
use crate::error::VaultError;

/// Fixed-size key buffer that holds exactly [`KEY_LEN`] bytes.
///
/// Constructed once at startup from configuration and injected into the
/// [`super::Codec`]. The engine never generates, rotates, or persists it.
/// The bytes are overwritten with zeroes on drop.
#[derive(Clone)]
pub struct MasterKey(Zeroizing<[u8; KEY_LEN]>);

impl MasterKey {
    /// Build a key from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Configuration`] unless `bytes` is exactly [`KEY_LEN`] long.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, VaultError> {
        if bytes.len() != KEY_LEN {
            return Err(VaultError::Configuration(format!(
                "master key must be {KEY_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        let mut buf = Zeroizing::new([0u8; KEY_LEN]);
        buf.copy_from_slice(bytes);
        Ok(Self(buf))
    }

    /// Parse a hex-encoded key (`2 * KEY_LEN` hex characters).
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Configuration`] if `hex_str` is not valid hex or
    /// does not decode to exactly [`KEY_LEN`] bytes.
    pub fn from_hex(hex_str: &str) -> Result<Self, VaultError> {
        let decoded = Zeroizing::new(hex::decode(hex_str.trim()).map_err(|_| {
            VaultError::Configuration(format!(
                "master key must be {} hex characters",
                KEY_LEN * 2
            ))
        })?);
        Self::from_bytes(&decoded)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    /// Hex encoding, for provisioning output only.
    pub fn to_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(self.0.as_slice()))
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material, not even in debug builds.
        f.write_str("MasterKey([REDACTED])")
    }
}

/// Generate a fresh random key from the OS CSPRNG.
///
/// Provisioning utility; the running engine never calls this.
pub fn generate_key() -> MasterKey {
    let mut buf = Zeroizing::new([0u8; KEY_LEN]);
    OsRng.fill_bytes(buf.as_mut_slice());
    MasterKey(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trip() {
        let key = generate_key();
        let parsed = MasterKey::from_hex(&key.to_hex()).unwrap();
        assert_eq!(parsed.as_bytes(), key.as_bytes());
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(MasterKey::from_bytes(&[0u8; 16]).is_err());
        assert!(MasterKey::from_hex(&"ab".repeat(31)).is_err());
        assert!(MasterKey::from_hex(&"ab".repeat(33)).is_err());
    }

    #[test]
    fn rejects_non_hex() {
        let err = MasterKey::from_hex(&"zz".repeat(KEY_LEN)).unwrap_err();
        assert!(matches!(err, VaultError::Configuration(_)));
    }

    #[test]
    fn generated_keys_differ() {
        assert_ne!(generate_key().as_bytes(), generate_key().as_bytes());
    }

    #[test]
    fn redacted_in_debug() {
        let key = MasterKey::from_bytes(&[0xFF; KEY_LEN]).unwrap();
        let dbg = format!("{key:?}");
        assert!(dbg.contains("REDACTED"));
        assert!(!dbg.contains("ff"));
    }
}
