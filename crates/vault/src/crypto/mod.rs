//! AES-256-GCM file encryption primitives.
//!
//! This module is free of storage and HTTP dependencies. It provides the
//! codec the lifecycle layer uses to turn plaintext into containers and back.
//!
//! # Container format
//!
//! ```text
//! [16-byte nonce][16-byte authentication tag][ciphertext]
//! ```
//!
//! The container is exactly 32 bytes longer than the plaintext. No
//! associated data is bound into the tag.

pub mod cipher;
pub mod key;

pub use cipher::{Codec, HEADER_LEN, KEY_LEN, NONCE_LEN, TAG_LEN};
pub use key::{generate_key, MasterKey};
