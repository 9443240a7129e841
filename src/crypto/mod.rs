//! Cryptographic primitives for the save/open path.
//!
//! Provides key derivation and the authenticated token encoding.

pub mod kdf;
pub mod token;

pub use kdf::{KdfParams, derive_key};
pub use token::{AuthFailure, generate_key, open, seal};

/// Length of the encryption key (32 bytes / 256 bits).
pub const KEY_LEN: usize = 32;
/// Length of the nonce (24 bytes for XChaCha20-Poly1305).
pub const NONCE_LEN: usize = 24;
/// Length of the token version field (1 byte).
pub const VER_LEN: usize = 1;
/// Length of the AEAD authentication tag (16 bytes).
pub const TAG_LEN: usize = 16;

/// Application-wide KDF salt, identical for every file this build writes.
///
/// Changing it orphans every file saved by earlier builds: their passwords
/// will no longer derive the same keys. That is a deliberate compatibility
/// boundary, not per-file state.
pub const KDF_SALT: &[u8] = b"notelock.kdf.v01";

/// Application-wide PBKDF2 iteration count.
pub const KDF_ITERATIONS: u32 = 100_000;
