use anyhow::{Context, Result};
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;

use super::{KDF_ITERATIONS, KDF_SALT, KEY_LEN};

/// Key derivation configuration.
///
/// The salt and iteration count are fixed per build (see
/// [`crate::crypto::KDF_SALT`]); a password re-entered later must reproduce
/// the original key, so neither value is stored per file or exposed to the
/// user.
#[derive(Debug, Clone, Copy)]
pub struct KdfParams {
    salt: &'static [u8],
    iterations: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            salt: KDF_SALT,
            iterations: KDF_ITERATIONS,
        }
    }
}

impl KdfParams {
    pub fn new(salt: &'static [u8], iterations: u32) -> anyhow::Result<Self> {
        let params = Self { salt, iterations };
        params.validate()?;
        Ok(params)
    }

    pub fn salt(&self) -> &[u8] {
        self.salt
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.salt.is_empty() {
            anyhow::bail!("KDF salt must not be empty");
        }
        if self.iterations == 0 {
            anyhow::bail!("KDF iterations must be >= 1");
        }
        Ok(())
    }
}

/// Derives a cipher key from a password.
///
/// Deterministic: the same password and parameters always produce the same
/// key. The empty password is a valid input and derives a real key.
pub fn derive_key(password: &str, kdf: &KdfParams) -> Result<[u8; KEY_LEN]> {
    kdf.validate().context("invalid KDF parameters")?;

    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), kdf.salt, kdf.iterations, &mut key);

    Ok(key)
}
