use std::fmt;

/// Terminal outcomes of the envelope subsystem.
///
/// "Not an envelope" is not represented here: sniffing is a routing
/// decision, not an error.
#[derive(Debug, PartialEq, Eq)]
pub enum EnvelopeError {
    /// No trial decryption succeeded. Deliberately does not say whether the
    /// password was wrong or the file corrupted.
    DecryptionFailed,
    /// An invalid password combination, rejected before any cryptography
    /// runs.
    PolicyViolation(&'static str),
    /// The OS random generator or the cipher backend failed.
    BackendUnavailable,
}

impl fmt::Display for EnvelopeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvelopeError::DecryptionFailed => {
                write!(f, "decryption failed: wrong password or corrupted file")
            }
            EnvelopeError::PolicyViolation(msg) => write!(f, "{msg}"),
            EnvelopeError::BackendUnavailable => write!(f, "encryption backend unavailable"),
        }
    }
}

impl std::error::Error for EnvelopeError {}
