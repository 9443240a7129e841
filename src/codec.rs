//! Encode/decode protocol for encrypted documents.
//!
//! The envelope carries no hint of which password class it expects. Decode
//! therefore runs a fixed sequence of trial decryptions and lets the
//! authenticated cipher arbitrate: a trial under the wrong key always
//! fails, so whichever trial succeeds names the caller's access level.

use zeroize::Zeroizing;

use crate::crypto::{self, KEY_LEN, KdfParams};
use crate::envelope;
use crate::error::EnvelopeError;
use crate::session::KeyState;

/// A successfully opened document: recovered text plus the session keys.
#[derive(Debug)]
pub struct Unlocked {
    pub text: String,
    pub keys: KeyState,
    /// Set when an encrypted envelope was opened without decryption (the
    /// empty password matched no read-only key). `text` is then the raw
    /// envelope, not the original document, and the caller must say so
    /// visibly.
    pub undecrypted: bool,
}

fn derive(password: &str, kdf: &KdfParams) -> Result<[u8; KEY_LEN], EnvelopeError> {
    crypto::derive_key(password, kdf).map_err(|_| EnvelopeError::BackendUnavailable)
}

/// Treats the empty string like an unset password.
fn provided(password: Option<&str>) -> Option<&str> {
    password.filter(|p| !p.is_empty())
}

fn into_text(bytes: Zeroizing<Vec<u8>>) -> Result<String, EnvelopeError> {
    // Authenticated bytes that fail UTF-8 can only mean the envelope was
    // produced inconsistently; treated like any other failed open.
    String::from_utf8(bytes.to_vec()).map_err(|_| EnvelopeError::DecryptionFailed)
}

/// Encrypts `text` for saving and returns the envelope together with the
/// session key state it implies.
///
/// An absent or empty master password means "do not encrypt": the text
/// comes back verbatim. Otherwise the content key is derived from the
/// read-only password when one is set, or drawn at random so that only the
/// master password can unwrap it.
///
/// Callers must enforce the password policy first (a read-only password
/// requires a master password and must differ from it); the codec assumes
/// it holds.
pub fn encode(
    text: &str,
    master_password: Option<&str>,
    read_only_password: Option<&str>,
) -> Result<(String, KeyState), EnvelopeError> {
    let Some(master_password) = provided(master_password) else {
        return Ok((text.to_owned(), KeyState::Plain));
    };

    let kdf = KdfParams::default();
    let content_key = match provided(read_only_password) {
        Some(read_only_password) => derive(read_only_password, &kdf)?,
        None => crypto::generate_key()?,
    };
    let master_key = derive(master_password, &kdf)?;

    let keys = KeyState::Writable {
        master_key,
        content_key,
    };
    let raw = encode_with_keys(text, &keys)?;

    Ok((raw, keys))
}

/// Re-encrypts `text` with an existing session's keys (the save path).
///
/// Both tokens get fresh nonces, so saving unchanged text still rewrites
/// every byte of the envelope.
pub fn encode_with_keys(text: &str, keys: &KeyState) -> Result<String, EnvelopeError> {
    match keys {
        KeyState::Plain => Ok(text.to_owned()),
        KeyState::ReadOnly { .. } => Err(EnvelopeError::PolicyViolation(
            "this file is opened as read-only and cannot be saved",
        )),
        KeyState::Writable {
            master_key,
            content_key,
        } => {
            let content_token = crypto::seal(content_key, text.as_bytes())?;
            let key_token = crypto::seal(master_key, content_key)?;
            Ok(envelope::format(&content_token, Some(&key_token)))
        }
    }
}

/// Recovers a document from an envelope with the one password the user
/// entered.
///
/// The user is never asked which role the password plays; the trials below
/// decide. Each call is a complete, independent evaluation with no state
/// between attempts:
///
/// 1. no key token → the file is plain, returned verbatim;
/// 2. empty password → try it as the read-only content key, and on failure
///    fall back to showing the envelope undecrypted;
/// 3. otherwise → try it as the master key (unwrap, then decrypt content),
///    then as the read-only content key, then give up.
pub fn decode(raw: &str, password: &str) -> Result<Unlocked, EnvelopeError> {
    let (content_token, key_token) = envelope::split(raw);

    let Some(key_token) = key_token else {
        return Ok(Unlocked {
            text: raw.to_owned(),
            keys: KeyState::Plain,
            undecrypted: false,
        });
    };

    let k = derive(password, &KdfParams::default())?;

    if password.is_empty() {
        if let Ok(bytes) = crypto::open(&k, content_token) {
            return Ok(Unlocked {
                text: into_text(bytes)?,
                keys: KeyState::ReadOnly { content_key: k },
                undecrypted: false,
            });
        }
        // Deliberate fallback: the file opens, but as the undecrypted
        // envelope text.
        return Ok(Unlocked {
            text: raw.to_owned(),
            keys: KeyState::Plain,
            undecrypted: true,
        });
    }

    match crypto::open(&k, key_token) {
        Ok(unwrapped) => {
            let content_key: [u8; KEY_LEN] = unwrapped
                .as_slice()
                .try_into()
                .map_err(|_| EnvelopeError::DecryptionFailed)?;
            // The master key unwrapped, so the content must decrypt too;
            // anything else counts as a failed open.
            let bytes = crypto::open(&content_key, content_token)
                .map_err(|_| EnvelopeError::DecryptionFailed)?;
            Ok(Unlocked {
                text: into_text(bytes)?,
                keys: KeyState::Writable {
                    master_key: k,
                    content_key,
                },
                undecrypted: false,
            })
        }
        Err(crypto::AuthFailure) => {
            let bytes =
                crypto::open(&k, content_token).map_err(|_| EnvelopeError::DecryptionFailed)?;
            Ok(Unlocked {
                text: into_text(bytes)?,
                keys: KeyState::ReadOnly { content_key: k },
                undecrypted: false,
            })
        }
    }
}
