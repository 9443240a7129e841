mod codec;
mod crypto;
mod envelope;
mod error;
mod session;
mod storage;

pub use crate::error::EnvelopeError;
pub use crate::session::KeyState;
pub use crate::storage::Storage;
use anyhow::{Context, Result, bail};
use zeroize::Zeroizing;

/// One open document: its text, its place on disk, and its session keys.
///
/// The key state is replaced wholesale on open and on every "save as";
/// the old keys are zeroed when dropped. Saving re-encrypts with the
/// session keys, so every save rewrites the envelope with fresh tokens.
pub struct Document {
    storage: Storage,
    text: String,
    keys: KeyState,
    undecrypted: bool,
}

impl Document {
    /// A new, empty, unencrypted document bound to `storage`.
    pub fn new(storage: Storage) -> Self {
        Self {
            storage,
            text: String::new(),
            keys: KeyState::Plain,
            undecrypted: false,
        }
    }

    /// Whether the file at `storage` looks like an encrypted envelope.
    ///
    /// Lets the shell decide to prompt for a password before opening.
    /// A missing file is simply not encrypted.
    pub fn probe(storage: &Storage) -> Result<bool> {
        if !storage.exists() {
            return Ok(false);
        }
        Ok(envelope::sniff(&load_text(storage)?))
    }

    /// Opens the file, decrypting it when it looks like an envelope.
    ///
    /// `password` is consulted only for envelopes; for ordinary text files
    /// it is ignored. The empty password is meaningful: it tries the file
    /// as read-only and otherwise opens the raw envelope undecrypted (see
    /// [`Document::undecrypted`]).
    pub fn open_with_storage(storage: Storage, password: Zeroizing<String>) -> Result<Self> {
        let raw = load_text(&storage)?;

        if !envelope::sniff(&raw) {
            return Ok(Self {
                storage,
                text: raw,
                keys: KeyState::Plain,
                undecrypted: false,
            });
        }

        let unlocked = codec::decode(&raw, &password)?;
        drop(password);

        Ok(Self {
            storage,
            text: unlocked.text,
            keys: unlocked.keys,
            undecrypted: unlocked.undecrypted,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replaces the document text. Refused for read-only sessions.
    pub fn set_text(&mut self, text: impl Into<String>) -> Result<()> {
        if !self.keys.can_write() {
            bail!("this file is opened as read-only");
        }
        self.text = text.into();
        Ok(())
    }

    pub fn is_read_only(&self) -> bool {
        !self.keys.can_write()
    }

    pub fn is_encrypted(&self) -> bool {
        self.keys.is_encrypted()
    }

    /// True when an encrypted file was opened without decryption and
    /// [`Document::text`] is the raw envelope, not the original document.
    pub fn undecrypted(&self) -> bool {
        self.undecrypted
    }

    pub fn path(&self) -> &std::path::Path {
        self.storage.path()
    }

    /// Saves with the session keys: plain text verbatim, or a freshly
    /// encrypted envelope. Refused for read-only sessions.
    pub fn save(&self) -> Result<()> {
        if !self.keys.can_write() {
            bail!("this file is opened as read-only");
        }
        let raw = codec::encode_with_keys(&self.text, &self.keys)?;
        self.storage.save(raw.as_bytes())
    }

    /// "Save As" with new passwords: validates the password policy,
    /// encrypts, writes, and replaces the session key state.
    ///
    /// An absent or empty master password saves the file unencrypted.
    pub fn save_with_passwords(
        &mut self,
        master_password: Option<&str>,
        read_only_password: Option<&str>,
    ) -> Result<()> {
        if !self.keys.can_write() {
            bail!("this file is opened as read-only");
        }
        check_password_policy(master_password, read_only_password)?;

        let (raw, keys) = codec::encode(&self.text, master_password, read_only_password)?;
        self.storage.save(raw.as_bytes())?;

        self.keys = keys;
        self.undecrypted = false;
        Ok(())
    }
}

/// The shell-side precondition for saving with passwords: a read-only
/// password needs a master password to wrap the content key, and the two
/// must differ or the trial decryption on open could not tell the roles
/// apart. Checked before any key derivation runs.
pub fn check_password_policy(
    master_password: Option<&str>,
    read_only_password: Option<&str>,
) -> Result<(), EnvelopeError> {
    let master = master_password.unwrap_or("");
    let read_only = read_only_password.unwrap_or("");

    if read_only.is_empty() {
        return Ok(());
    }
    if master.is_empty() {
        return Err(EnvelopeError::PolicyViolation(
            "a read-only password cannot be set without a master password",
        ));
    }
    if master == read_only {
        return Err(EnvelopeError::PolicyViolation(
            "the master password cannot be the same as the read-only password",
        ));
    }
    Ok(())
}

fn load_text(storage: &Storage) -> Result<String> {
    let data = storage.load()?;
    String::from_utf8(data)
        .with_context(|| format!("{} is not a text file", storage.path().display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn pw(s: &str) -> Zeroizing<String> {
        Zeroizing::new(s.to_string())
    }

    #[test]
    fn open_plain_file() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(dir.path().join("note.txt"));
        storage.save(b"plain notes\n").unwrap();

        assert!(!Document::probe(&storage).unwrap());

        let doc = Document::open_with_storage(storage, pw("")).unwrap();
        assert_eq!(doc.text(), "plain notes\n");
        assert!(!doc.is_encrypted());
        assert!(!doc.is_read_only());
        assert!(!doc.undecrypted());
    }

    #[test]
    fn probe_missing_file_is_not_encrypted() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(dir.path().join("nope.txt"));

        assert!(!Document::probe(&storage).unwrap());
    }

    #[test]
    fn save_encrypted_and_reopen_with_both_passwords() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(dir.path().join("note.txt"));

        let mut doc = Document::new(storage.clone());
        doc.set_text("dear diary").unwrap();
        doc.save_with_passwords(Some("m1"), Some("r1")).unwrap();
        assert!(doc.is_encrypted());
        assert!(Document::probe(&storage).unwrap());

        let owner = Document::open_with_storage(storage.clone(), pw("m1")).unwrap();
        assert_eq!(owner.text(), "dear diary");
        assert!(!owner.is_read_only());

        let viewer = Document::open_with_storage(storage, pw("r1")).unwrap();
        assert_eq!(viewer.text(), "dear diary");
        assert!(viewer.is_read_only());
    }

    #[test]
    fn save_reencrypts_with_session_keys() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(dir.path().join("note.txt"));

        let mut doc = Document::new(storage.clone());
        doc.set_text("v1").unwrap();
        doc.save_with_passwords(Some("m1"), Some("r1")).unwrap();
        let first = storage.load().unwrap();

        let mut doc = Document::open_with_storage(storage.clone(), pw("m1")).unwrap();
        doc.set_text("v2").unwrap();
        doc.save().unwrap();
        let second = storage.load().unwrap();

        assert_ne!(first, second);

        // the read-only password survives the re-encryption
        let viewer = Document::open_with_storage(storage, pw("r1")).unwrap();
        assert_eq!(viewer.text(), "v2");
    }

    #[test]
    fn wrong_password_fails() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(dir.path().join("note.txt"));

        let mut doc = Document::new(storage.clone());
        doc.set_text("secret").unwrap();
        doc.save_with_passwords(Some("m1"), None).unwrap();

        assert!(Document::open_with_storage(storage, pw("wrong")).is_err());
    }

    #[test]
    fn read_only_session_refuses_changes() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(dir.path().join("note.txt"));

        let mut doc = Document::new(storage.clone());
        doc.set_text("look, don't touch").unwrap();
        doc.save_with_passwords(Some("m1"), Some("r1")).unwrap();

        let mut viewer = Document::open_with_storage(storage, pw("r1")).unwrap();
        assert!(viewer.set_text("scribble").is_err());
        assert!(viewer.save().is_err());
        assert!(viewer.save_with_passwords(None, None).is_err());
        assert_eq!(viewer.text(), "look, don't touch");
    }

    #[test]
    fn empty_password_opens_raw_envelope() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(dir.path().join("note.txt"));

        let mut doc = Document::new(storage.clone());
        doc.set_text("secret").unwrap();
        doc.save_with_passwords(Some("m1"), None).unwrap();
        let raw = String::from_utf8(storage.load().unwrap()).unwrap();

        let doc = Document::open_with_storage(storage, pw("")).unwrap();
        assert!(doc.undecrypted());
        assert_eq!(doc.text(), raw);
    }

    #[test]
    fn empty_master_password_saves_plain() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(dir.path().join("note.txt"));

        let mut doc = Document::new(storage.clone());
        doc.set_text("nothing to hide").unwrap();
        doc.save_with_passwords(Some(""), None).unwrap();

        assert!(!doc.is_encrypted());
        assert_eq!(storage.load().unwrap(), b"nothing to hide");
    }

    #[test]
    fn saving_plain_over_encrypted_replaces_key_state() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(dir.path().join("note.txt"));

        let mut doc = Document::new(storage.clone());
        doc.set_text("was secret").unwrap();
        doc.save_with_passwords(Some("m1"), None).unwrap();
        assert!(doc.is_encrypted());

        doc.save_with_passwords(None, None).unwrap();
        assert!(!doc.is_encrypted());
        assert_eq!(storage.load().unwrap(), b"was secret");
    }

    #[test]
    fn password_policy() {
        assert!(check_password_policy(Some("m"), Some("r")).is_ok());
        assert!(check_password_policy(Some("m"), None).is_ok());
        assert!(check_password_policy(None, None).is_ok());
        // empty read-only means "no read-only password"
        assert!(check_password_policy(Some("m"), Some("")).is_ok());

        assert!(matches!(
            check_password_policy(None, Some("r")),
            Err(EnvelopeError::PolicyViolation(_))
        ));
        assert!(matches!(
            check_password_policy(Some(""), Some("r")),
            Err(EnvelopeError::PolicyViolation(_))
        ));
        assert!(matches!(
            check_password_policy(Some("same"), Some("same")),
            Err(EnvelopeError::PolicyViolation(_))
        ));
    }

    #[test]
    fn non_utf8_file_fails_to_open() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(dir.path().join("note.txt"));
        storage.save(&[0xFF, 0xFE, 0x00]).unwrap();

        assert!(Document::open_with_storage(storage, pw("")).is_err());
    }
}
