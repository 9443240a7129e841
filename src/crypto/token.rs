use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use chacha20poly1305::{
    Key, XChaCha20Poly1305, XNonce,
    aead::{Aead, KeyInit},
};
use getrandom::fill;
use zeroize::Zeroizing;

use super::{KEY_LEN, NONCE_LEN, TAG_LEN, VER_LEN};
use crate::error::EnvelopeError;

/// Current token version byte.
pub const TOKEN_VERSION: u8 = 1;

/// Authenticated decryption failed.
///
/// A single value for every cause: wrong key, truncated input, bad base64,
/// unknown version, tampered ciphertext. Callers turn it into the next
/// trial decryption or a terminal outcome; it is never shown to the user,
/// and carrying no detail keeps the failure modes indistinguishable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthFailure;

impl std::fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "token verification failed")
    }
}

impl std::error::Error for AuthFailure {}

/// Fill buffer with cryptographically secure random bytes
fn secure_random(buf: &mut [u8]) -> Result<(), EnvelopeError> {
    fill(buf).map_err(|_| EnvelopeError::BackendUnavailable)
}

/// Generate a random cipher key
pub fn generate_key() -> Result<[u8; KEY_LEN], EnvelopeError> {
    let mut key = [0u8; KEY_LEN];
    secure_random(&mut key)?;
    Ok(key)
}

/// Encrypt plaintext into a printable token.
///
/// Layout before encoding: `version (1) || nonce (24) || ciphertext+tag`.
/// The whole thing is padded URL-safe base64, so the token is ASCII, its
/// length is a multiple of 4, and it never contains the envelope
/// separator. A fresh nonce is drawn per call: sealing the same plaintext
/// twice yields different tokens.
pub fn seal(key: &[u8; KEY_LEN], plaintext: &[u8]) -> Result<String, EnvelopeError> {
    let cipher = XChaCha20Poly1305::new(Key::from_slice(key));

    let mut nonce = [0u8; NONCE_LEN];
    secure_random(&mut nonce)?;

    let ciphertext = cipher
        .encrypt(XNonce::from_slice(&nonce), plaintext)
        .map_err(|_| EnvelopeError::BackendUnavailable)?;

    let mut raw = Vec::with_capacity(VER_LEN + NONCE_LEN + ciphertext.len());
    raw.push(TOKEN_VERSION);
    raw.extend_from_slice(&nonce);
    raw.extend_from_slice(&ciphertext);

    Ok(URL_SAFE.encode(raw))
}

/// Decrypt and verify a token.
pub fn open(key: &[u8; KEY_LEN], token: &str) -> Result<Zeroizing<Vec<u8>>, AuthFailure> {
    let raw = URL_SAFE.decode(token).map_err(|_| AuthFailure)?;

    if raw.len() < VER_LEN + NONCE_LEN + TAG_LEN {
        return Err(AuthFailure);
    }
    if raw[0] != TOKEN_VERSION {
        return Err(AuthFailure);
    }

    let (nonce, ciphertext) = raw[VER_LEN..].split_at(NONCE_LEN);

    let cipher = XChaCha20Poly1305::new(Key::from_slice(key));
    let plaintext = cipher
        .decrypt(XNonce::from_slice(nonce), ciphertext)
        .map_err(|_| AuthFailure)?;

    Ok(Zeroizing::new(plaintext))
}
