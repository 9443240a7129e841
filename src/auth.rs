use anyhow::{Result, bail};
use std::io::{self, BufRead, IsTerminal};
use zeroize::Zeroizing;

/// Reads the password for opening a file.
///
/// Sources, in order:
/// - NOTELOCK_PASSWORD environment variable
/// - a line piped on stdin
/// - a TTY prompt
///
/// The empty string is a valid answer here: pressing Enter means "try
/// read-only access, otherwise show the file without decryption".
pub fn read_open_password() -> Result<Zeroizing<String>> {
    if let Ok(pw) = std::env::var("NOTELOCK_PASSWORD") {
        return Ok(Zeroizing::new(pw));
    }

    if !io::stdin().is_terminal() {
        let mut pw = Zeroizing::new(String::new());
        io::stdin().lock().read_line(&mut pw)?;
        trim_newline(&mut pw);
        return Ok(pw);
    }

    let pw = rpassword::prompt_password("Password (Enter for read-only or none): ")?;
    Ok(Zeroizing::new(pw))
}

/// Reads the master and read-only passwords for saving a file.
///
/// NOTELOCK_MASTER_PASSWORD / NOTELOCK_READONLY_PASSWORD take precedence;
/// otherwise both are prompted for on the TTY with confirmation. Stdin is
/// never consulted, it carries the document text. Empty strings mean
/// "save unencrypted" and "no read-only password".
pub fn read_save_passwords() -> Result<(Zeroizing<String>, Zeroizing<String>)> {
    let master = std::env::var("NOTELOCK_MASTER_PASSWORD").ok();
    let read_only = std::env::var("NOTELOCK_READONLY_PASSWORD").ok();

    if master.is_some() || read_only.is_some() {
        return Ok((
            Zeroizing::new(master.unwrap_or_default()),
            Zeroizing::new(read_only.unwrap_or_default()),
        ));
    }

    if !io::stdin().is_terminal() {
        // piped invocation without password variables saves unencrypted
        return Ok((Zeroizing::new(String::new()), Zeroizing::new(String::new())));
    }

    let master = prompt_with_confirmation("Master password (Enter to save unencrypted): ")?;
    if master.is_empty() {
        return Ok((master, Zeroizing::new(String::new())));
    }

    let read_only = prompt_with_confirmation("Read-only password (Enter for none): ")?;
    Ok((master, read_only))
}

fn prompt_with_confirmation(prompt: &str) -> Result<Zeroizing<String>> {
    let pw1 = Zeroizing::new(rpassword::prompt_password(prompt)?);
    if pw1.is_empty() {
        return Ok(pw1);
    }

    let pw2 = Zeroizing::new(rpassword::prompt_password("Confirm password: ")?);
    if *pw1 != *pw2 {
        bail!("passwords do not match");
    }

    Ok(pw1)
}

fn trim_newline(s: &mut String) {
    while s.ends_with('\n') || s.ends_with('\r') {
        s.pop();
    }
}
