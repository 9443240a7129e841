//! On-disk envelope encoding.
//!
//! An encrypted file is `content-token ==== key-token`: two printable
//! tokens joined by [`SEPARATOR`]. An unencrypted file is the text itself.
//! [`sniff`] decides which of the two a loaded file plausibly is, without
//! attempting decryption.

/// Literal separator between the content token and the key token.
pub const SEPARATOR: &str = "====";

/// Returns true if `s` stays within the token alphabet
/// (URL-safe base64 plus padding).
fn is_token_text(s: &str) -> bool {
    s.bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-' || b == b'=')
}

/// Heuristically decides whether `raw` is an envelope written by this
/// program.
///
/// Three structural checks, no decryption:
/// 1. the byte length is a multiple of 4 (both tokens are padded base64);
/// 2. splitting on [`SEPARATOR`] yields exactly two non-empty parts;
/// 3. the part after the separator stays within the token alphabet.
///
/// This is a heuristic, not a tag. Plain text can pass all three checks
/// and trigger a spurious password prompt; that tolerance is kept rather
/// than tagging the format, so files keep looking like ordinary text.
pub fn sniff(raw: &str) -> bool {
    if raw.is_empty() || raw.len() % 4 != 0 {
        return false;
    }

    // Scan for the separator from the right: base64 padding on the content
    // token may abut the separator, and only the right-to-left reading
    // keeps the key token intact.
    let parts: Vec<&str> = raw.rsplit(SEPARATOR).collect();
    if parts.len() != 2 {
        return false;
    }
    let (key_token, content_token) = (parts[0], parts[1]);

    !content_token.is_empty() && !key_token.is_empty() && is_token_text(key_token)
}

/// Serializes an envelope: the content token, then the separator and key
/// token if one exists.
pub fn format(content_token: &str, key_token: Option<&str>) -> String {
    match key_token {
        Some(key_token) => {
            let mut raw =
                String::with_capacity(content_token.len() + SEPARATOR.len() + key_token.len());
            raw.push_str(content_token);
            raw.push_str(SEPARATOR);
            raw.push_str(key_token);
            raw
        }
        None => content_token.to_owned(),
    }
}

/// Splits an envelope at the rightmost separator; the inverse of
/// [`format`] whenever [`sniff`] holds.
///
/// Input without a separator comes back as `(raw, None)` so callers can
/// treat a bare content token as a key-less envelope.
pub fn split(raw: &str) -> (&str, Option<&str>) {
    match raw.rsplit_once(SEPARATOR) {
        Some((content_token, key_token)) => (content_token, Some(key_token)),
        None => (raw, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniff_accepts_token_pair() {
        assert!(sniff("AAAAAAAA====BBBB"));
    }

    #[test]
    fn sniff_rejects_unaligned_length() {
        // one separator, valid alphabet, but 10 bytes
        assert!(!sniff("AAAA====BB"));
    }

    #[test]
    fn sniff_rejects_missing_separator() {
        assert!(!sniff("AAAABBBB"));
        assert!(!sniff("just some notes\n"));
    }

    #[test]
    fn sniff_rejects_repeated_separator() {
        assert!(!sniff("AAAA====BBBB====CCCC"));
    }

    #[test]
    fn sniff_rejects_empty_parts() {
        assert!(!sniff("====AAAA"));
        assert!(!sniff("AAAA===="));
        assert!(!sniff("===="));
        assert!(!sniff(""));
    }

    #[test]
    fn sniff_rejects_foreign_characters_after_separator() {
        assert!(!sniff("AAAA====B!BB"));
        assert!(!sniff("AAAA====B BB"));
    }

    #[test]
    fn sniff_ignores_alphabet_of_first_part() {
        // only the second part is checked, as in the original format
        assert!(sniff("A?A AAAA====BBBB"));
    }

    #[test]
    fn sniff_handles_padding_next_to_separator() {
        assert!(sniff("AA======BBBB"));
    }

    #[test]
    fn format_split_roundtrip() {
        let raw = format("AAAAAAAA", Some("BBBB"));
        assert_eq!(raw, "AAAAAAAA====BBBB");
        assert_eq!(split(&raw), ("AAAAAAAA", Some("BBBB")));
    }

    #[test]
    fn split_keeps_content_padding_intact() {
        let raw = format("AA==", Some("BBBB"));
        assert_eq!(raw, "AA======BBBB");
        assert_eq!(split(&raw), ("AA==", Some("BBBB")));
    }

    #[test]
    fn split_without_separator_has_no_key_token() {
        assert_eq!(split("AAAAAAAA"), ("AAAAAAAA", None));
    }

    #[test]
    fn format_without_key_token_is_verbatim() {
        assert_eq!(format("plain text, any bytes", None), "plain text, any bytes");
    }
}
