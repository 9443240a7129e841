use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
mod auth;
use notelock::{Document, Storage};
use std::io::Read;
use std::path::PathBuf;
use zeroize::Zeroizing;

/// Candidate characters of the password generator.
const PASSWORD_CHARS: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789\
      !\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";

#[derive(Debug, Parser)]
#[command(name = "notelock")]
#[command(
    version,
    about = "Notepad file encryption with master and read-only passwords."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Prints a document, decrypting it when it is password-protected
    #[command(arg_required_else_help = true)]
    Show { file: PathBuf },

    /// Writes a document, optionally protecting it with passwords
    #[command(arg_required_else_help = true)]
    Save {
        file: PathBuf,

        /// Document text; read from stdin when omitted
        #[arg(long, value_name = "TEXT")]
        text: Option<String>,
    },

    /// Tells whether a file looks like an encrypted document
    #[command(arg_required_else_help = true)]
    Inspect { file: PathBuf },

    /// Generates a random password string
    Genpass {
        /// Length in characters (default: random between 20 and 30)
        #[arg(long)]
        length: Option<usize>,
    },
}

fn main() -> Result<()> {
    let args = Cli::parse();
    match args.command {
        Commands::Show { file } => {
            let storage = Storage::new(file);

            // ask for a password only when the file looks encrypted
            let password = if Document::probe(&storage)? {
                auth::read_open_password()?
            } else {
                Zeroizing::new(String::new())
            };

            let doc = Document::open_with_storage(storage, password)?;
            if doc.undecrypted() {
                eprintln!(
                    "warning: password did not unlock {}; showing the encrypted file without decryption",
                    doc.path().display()
                );
            } else if doc.is_read_only() {
                eprintln!("note: {} is opened as read-only", doc.path().display());
            }
            print!("{}", doc.text());
        }
        Commands::Save { file, text } => {
            let text = match text {
                Some(text) => text,
                None => {
                    let mut buf = String::new();
                    std::io::stdin()
                        .read_to_string(&mut buf)
                        .context("could not read document text from stdin")?;
                    buf
                }
            };

            let (master, read_only) = auth::read_save_passwords()?;

            let mut doc = Document::new(Storage::new(file));
            doc.set_text(text)?;
            doc.save_with_passwords(Some(master.as_str()), Some(read_only.as_str()))?;

            if doc.is_encrypted() {
                println!("saved {} (encrypted)", doc.path().display());
            } else {
                println!("saved {}", doc.path().display());
            }
        }
        Commands::Inspect { file } => {
            let storage = Storage::new(file);
            if Document::probe(&storage)? {
                println!("{}: encrypted document", storage.path().display());
            } else {
                println!("{}: plain text", storage.path().display());
            }
        }
        Commands::Genpass { length } => {
            println!("{}", genpass(length)?);
        }
    }

    Ok(())
}

fn genpass(length: Option<usize>) -> Result<String> {
    let length = match length {
        Some(0) => anyhow::bail!("length must be at least 1"),
        Some(n) => n,
        None => 20 + random_index(11)?,
    };

    let mut out = String::with_capacity(length);
    for _ in 0..length {
        out.push(PASSWORD_CHARS[random_index(PASSWORD_CHARS.len())?] as char);
    }
    Ok(out)
}

/// Uniform random index below `n`, by rejection sampling.
fn random_index(n: usize) -> Result<usize> {
    let zone = 256 - (256 % n);
    loop {
        let mut b = [0u8; 1];
        getrandom::fill(&mut b).map_err(|_| anyhow::anyhow!("OS random generator unavailable"))?;
        if (b[0] as usize) < zone {
            return Ok(b[0] as usize % n);
        }
    }
}
