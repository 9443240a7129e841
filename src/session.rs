use std::fmt;

use zeroize::Zeroize;

use crate::crypto::KEY_LEN;

/// Access level and key material of one open document.
///
/// The single source of truth for what the session may do: it governs
/// whether saves re-encrypt and whether editing is allowed, and it is
/// never reconstructed from buffer contents. It is replaced wholesale on
/// open and "new document", read (never mutated) by save, and it never
/// reaches disk itself; only the envelope it produces does.
pub enum KeyState {
    /// No keys; the file is stored unencrypted.
    Plain,
    /// Opened with only the content key; editing is disabled.
    ReadOnly { content_key: [u8; KEY_LEN] },
    /// Full read/write access to an encrypted file.
    Writable {
        master_key: [u8; KEY_LEN],
        content_key: [u8; KEY_LEN],
    },
}

impl KeyState {
    /// True when saves go through the encrypted envelope.
    pub fn is_encrypted(&self) -> bool {
        !matches!(self, KeyState::Plain)
    }

    /// True unless the session was opened with a read-only key.
    pub fn can_write(&self) -> bool {
        !matches!(self, KeyState::ReadOnly { .. })
    }

    /// Short label for status lines.
    pub fn mode(&self) -> &'static str {
        match self {
            KeyState::Plain => "plain",
            KeyState::ReadOnly { .. } => "read-only",
            KeyState::Writable { .. } => "writable",
        }
    }
}

impl Drop for KeyState {
    fn drop(&mut self) {
        match self {
            KeyState::Plain => {}
            KeyState::ReadOnly { content_key } => content_key.zeroize(),
            KeyState::Writable {
                master_key,
                content_key,
            } => {
                master_key.zeroize();
                content_key.zeroize();
            }
        }
    }
}

// Key material stays out of Debug output.
impl fmt::Debug for KeyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyState::Plain => write!(f, "Plain"),
            KeyState::ReadOnly { .. } => write!(f, "ReadOnly"),
            KeyState::Writable { .. } => write!(f, "Writable"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_levels() {
        let plain = KeyState::Plain;
        let read_only = KeyState::ReadOnly {
            content_key: [1; KEY_LEN],
        };
        let writable = KeyState::Writable {
            master_key: [2; KEY_LEN],
            content_key: [3; KEY_LEN],
        };

        assert!(!plain.is_encrypted());
        assert!(plain.can_write());

        assert!(read_only.is_encrypted());
        assert!(!read_only.can_write());

        assert!(writable.is_encrypted());
        assert!(writable.can_write());
    }

    #[test]
    fn debug_output_has_no_key_bytes() {
        let state = KeyState::Writable {
            master_key: [0xAB; KEY_LEN],
            content_key: [0xCD; KEY_LEN],
        };

        assert_eq!(format!("{state:?}"), "Writable");
    }
}
