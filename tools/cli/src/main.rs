//! Sealwire CLI - seal and open messages from the command line.
//!
//! Secrets come from files or interactive prompts. Sealed messages are
//! written as base64 unless `--raw` is given. Logs go to stderr so that
//! stdout carries only the payload.

use anyhow::{Context, Result};
use base64::Engine;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use zeroize::Zeroizing;

use sealwire_common::Secret;
use sealwire_crypto::digest::to_hex;
use sealwire_crypto::{digest, AeadCodec, HashAlgorithm, WireMessage};

#[derive(Parser)]
#[command(name = "sealwire")]
#[command(about = "Sealwire - two-secret authenticated encryption")]
#[command(version)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Where the two secrets come from.
#[derive(clap::Args)]
struct SecretArgs {
    /// File holding the first secret (prompted if omitted).
    #[arg(long)]
    secret1_file: Option<PathBuf>,

    /// File holding the second secret (prompted if omitted).
    #[arg(long)]
    secret2_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Seal a 7-bit plaintext.
    Encrypt {
        #[command(flatten)]
        secrets: SecretArgs,

        /// Plaintext file, or "-" for stdin.
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        /// Output file, or "-" for stdout.
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Associated data suffix; must match at decrypt time.
        #[arg(short, long, default_value = "")]
        aad: String,

        /// Write raw bytes instead of base64.
        #[arg(long)]
        raw: bool,
    },

    /// Open a sealed message.
    Decrypt {
        #[command(flatten)]
        secrets: SecretArgs,

        /// Sealed message file, or "-" for stdin.
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        /// Output file, or "-" for stdout.
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Associated data suffix used at encrypt time.
        #[arg(short, long, default_value = "")]
        aad: String,

        /// Read raw bytes instead of base64.
        #[arg(long)]
        raw: bool,
    },

    /// Show the framing of a sealed message without opening it.
    Inspect {
        /// Sealed message file, or "-" for stdin.
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        /// Read raw bytes instead of base64.
        #[arg(long)]
        raw: bool,
    },

    /// Hash a file.
    Digest {
        /// Algorithm: SHA-256, SHA-384, SHA-512 or BLAKE2b-512.
        #[arg(short, long, default_value = "SHA-512")]
        algorithm: String,

        /// Input file, or "-" for stdin.
        #[arg(short, long, default_value = "-")]
        input: PathBuf,
    },
}

/// JSON summary printed by `inspect`.
#[derive(Debug, Serialize)]
struct MessageSummary {
    total_len: usize,
    iv: String,
    tag: String,
    ciphertext_len: usize,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Encrypt {
            secrets,
            input,
            output,
            aad,
            raw,
        } => cmd_encrypt(&secrets, &input, &output, &aad, raw),

        Commands::Decrypt {
            secrets,
            input,
            output,
            aad,
            raw,
        } => cmd_decrypt(&secrets, &input, &output, &aad, raw),

        Commands::Inspect { input, raw } => cmd_inspect(&input, raw),

        Commands::Digest { algorithm, input } => cmd_digest(&algorithm, &input),
    }
}

fn is_stdio(path: &Path) -> bool {
    path.as_os_str() == "-"
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    if is_stdio(path) {
        let mut buf = Vec::new();
        std::io::stdin()
            .read_to_end(&mut buf)
            .context("Failed to read stdin")?;
        Ok(buf)
    } else {
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
    }
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    if is_stdio(path) {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(bytes).context("Failed to write stdout")?;
        stdout.flush().context("Failed to flush stdout")?;
        Ok(())
    } else {
        std::fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))
    }
}

/// Read a secret from a file, or prompt for it.
///
/// A single trailing newline is stripped from file contents so that
/// `echo secret > file` behaves the same as typing `secret` at the prompt.
fn load_secret(file: Option<&Path>, prompt: &str) -> Result<Secret> {
    let mut bytes = match file {
        Some(path) => std::fs::read(path)
            .with_context(|| format!("Failed to read secret from {}", path.display()))?,
        None => rpassword::prompt_password(prompt)
            .context("Failed to read secret")?
            .into_bytes(),
    };

    if bytes.last() == Some(&b'\n') {
        bytes.pop();
        if bytes.last() == Some(&b'\r') {
            bytes.pop();
        }
    }

    if bytes.is_empty() {
        anyhow::bail!("Secret cannot be empty");
    }
    Ok(Secret::new(bytes))
}

fn load_secrets(args: &SecretArgs) -> Result<(Secret, Secret)> {
    let first = load_secret(args.secret1_file.as_deref(), "First secret: ")?;
    let second = load_secret(args.secret2_file.as_deref(), "Second secret: ")?;
    Ok((first, second))
}

fn decode_message(bytes: Vec<u8>, raw: bool) -> Result<Vec<u8>> {
    if raw {
        return Ok(bytes);
    }
    let text = std::str::from_utf8(&bytes).context("Sealed message is not base64 text")?;
    base64::engine::general_purpose::STANDARD
        .decode(text.trim())
        .context("Sealed message is not valid base64")
}

fn summarize(message: &[u8]) -> Result<MessageSummary> {
    let wire = WireMessage::parse(message).context("Not a sealwire message")?;
    Ok(MessageSummary {
        total_len: message.len(),
        iv: base64::engine::general_purpose::STANDARD.encode(wire.iv()),
        tag: base64::engine::general_purpose::STANDARD.encode(wire.tag()),
        ciphertext_len: wire.ciphertext().len(),
    })
}

/// Seal a plaintext.
fn cmd_encrypt(
    secrets: &SecretArgs,
    input: &Path,
    output: &Path,
    aad: &str,
    raw: bool,
) -> Result<()> {
    let plaintext = Zeroizing::new(read_input(input)?);
    let (first, second) = load_secrets(secrets)?;

    info!(bytes = plaintext.len(), "Encrypting");
    let sealed = AeadCodec::new()
        .encrypt(first.as_bytes(), second.as_bytes(), &plaintext, aad.as_bytes())
        .context("Encryption failed")?;

    if raw {
        write_output(output, &sealed)?;
    } else {
        let mut encoded = base64::engine::general_purpose::STANDARD.encode(&sealed);
        encoded.push('\n');
        write_output(output, encoded.as_bytes())?;
    }

    info!(bytes = sealed.len(), "Sealed");
    Ok(())
}

/// Open a sealed message.
fn cmd_decrypt(
    secrets: &SecretArgs,
    input: &Path,
    output: &Path,
    aad: &str,
    raw: bool,
) -> Result<()> {
    let message = decode_message(read_input(input)?, raw)?;
    let (first, second) = load_secrets(secrets)?;

    info!(bytes = message.len(), "Decrypting");
    let plaintext = Zeroizing::new(
        AeadCodec::new()
            .decrypt(first.as_bytes(), second.as_bytes(), &message, aad.as_bytes())
            .context("Decryption failed")?,
    );

    write_output(output, &plaintext)?;
    info!(bytes = plaintext.len(), "Opened");
    Ok(())
}

/// Print the framing of a sealed message as JSON.
fn cmd_inspect(input: &Path, raw: bool) -> Result<()> {
    let message = decode_message(read_input(input)?, raw)?;
    let summary = summarize(&message)?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn digest_line(algorithm: &str, data: &[u8]) -> Result<String> {
    let name = algorithm
        .parse::<HashAlgorithm>()
        .context("Unknown digest algorithm")?;
    let hash = digest(data, name);
    Ok(format!("{}  {}", to_hex(&hash), name))
}

/// Hash a file and print the hex digest.
fn cmd_digest(algorithm: &str, input: &Path) -> Result<()> {
    let data = read_input(input)?;
    println!("{}", digest_line(algorithm, &data)?);
    Ok(())
}
