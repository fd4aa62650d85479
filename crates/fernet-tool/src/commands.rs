//! Command dispatch: one command per invocation, stdin in, stdout out.

use std::fmt;
use std::io::{Read, Write};
use std::str::FromStr;

use anyhow::{Context, Result};
use fernet::{Clock, DecodeOutput, Fernet, Key, RandomSource};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::Config;
use crate::report::DecryptReport;

/// Tokens stamped further than this into the future are rejected when an
/// age limit is configured.
pub const MAX_CLOCK_SKEW_SECS: u64 = 60;

const USAGE: &str = "generate-key | encrypt | decrypt | timestamp";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    GenerateKey,
    Encrypt,
    Decrypt,
    Timestamp,
}

impl Command {
    pub fn as_str(self) -> &'static str {
        match self {
            Command::GenerateKey => "generate-key",
            Command::Encrypt => "encrypt",
            Command::Decrypt => "decrypt",
            Command::Timestamp => "timestamp",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Command-line usage errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UsageError {
    #[error("missing command; expected one of: {USAGE}")]
    Missing,

    #[error("unknown command `{0}`; expected one of: {USAGE}")]
    Unknown(String),

    #[error("unexpected argument `{0}`")]
    Unexpected(String),

    #[error("unknown output format `{0}`; expected `raw` or `json`")]
    OutputFormat(String),
}

impl FromStr for Command {
    type Err = UsageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "generate-key" => Ok(Command::GenerateKey),
            "encrypt" => Ok(Command::Encrypt),
            "decrypt" => Ok(Command::Decrypt),
            "timestamp" => Ok(Command::Timestamp),
            other => Err(UsageError::Unknown(other.to_owned())),
        }
    }
}

/// Rendering of `decrypt` output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Plaintext bytes, unmodified.
    Raw,
    /// A [`DecryptReport`] as one line of JSON.
    Json,
}

impl FromStr for OutputFormat {
    type Err = UsageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(OutputFormat::Raw),
            "json" => Ok(OutputFormat::Json),
            _ => Err(UsageError::OutputFormat(s.to_owned())),
        }
    }
}

/// Parse the arguments following the program name.
///
/// # Errors
///
/// Returns a [`UsageError`] if the command is missing, unknown, or followed
/// by extra arguments.
pub fn parse_args<I>(args: I) -> Result<Command, UsageError>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let command = args.next().ok_or(UsageError::Missing)?.parse()?;
    match args.next() {
        Some(extra) => Err(UsageError::Unexpected(extra)),
        None => Ok(command),
    }
}

/// Run `command`, reading from `input` and writing to `output`.
///
/// # Errors
///
/// Returns an error if the key is missing or invalid, the input cannot be
/// read, the token is rejected, or the output cannot be written.
pub fn run<C, R>(
    command: Command,
    cfg: &Config,
    clock: C,
    rng: R,
    input: &mut dyn Read,
    output: &mut dyn Write,
) -> Result<()>
where
    C: Clock,
    R: RandomSource,
{
    match command {
        Command::GenerateKey => {
            let key = Key::generate(&rng).context("failed to generate key")?;
            writeln!(output, "{}", key.to_base64url()).context("failed to write key")?;
            info!("key generated");
        }
        Command::Encrypt => {
            let (now, fernet) = codec(cfg, clock, rng)?;
            let mut plaintext = Vec::new();
            input
                .read_to_end(&mut plaintext)
                .context("failed to read plaintext from stdin")?;
            let token = fernet
                .encrypt_at_time(&plaintext, now)
                .context("failed to encrypt plaintext")?;
            writeln!(output, "{token}").context("failed to write token")?;
            info!(plaintext_len = plaintext.len(), timestamp = now, "token encrypted");
        }
        Command::Decrypt => {
            let (now, fernet) = codec(cfg, clock, rng)?;
            let token = read_token(input)?;
            let decoded = decrypt(&fernet, cfg, &token)?;
            check_age(cfg, now, decoded.timestamp)?;
            match cfg.output_format()? {
                OutputFormat::Raw => output
                    .write_all(&decoded.plaintext)
                    .context("failed to write plaintext")?,
                OutputFormat::Json => {
                    serde_json::to_writer(&mut *output, &DecryptReport::from(&decoded))
                        .context("failed to write decrypt report")?;
                    writeln!(output).context("failed to write decrypt report")?;
                }
            }
        }
        Command::Timestamp => {
            let (_, fernet) = codec(cfg, clock, rng)?;
            let token = read_token(input)?;
            let timestamp = fernet
                .extract_timestamp(&token)
                .context("failed to read token timestamp")?;
            writeln!(output, "{timestamp}").context("failed to write timestamp")?;
        }
    }
    output.flush().context("failed to flush output")?;
    Ok(())
}

/// Build the codec, sampling the clock first since the codec takes ownership.
fn codec<C: Clock, R: RandomSource>(cfg: &Config, clock: C, rng: R) -> Result<(u64, Fernet<C, R>)> {
    let now = clock.now();
    Ok((now, Fernet::with_sources(cfg.key()?, clock, rng)))
}

fn read_token(input: &mut dyn Read) -> Result<String> {
    let mut token = String::new();
    input
        .read_to_string(&mut token)
        .context("failed to read token from stdin")?;
    Ok(token.trim().to_owned())
}

fn decrypt<C: Clock, R: RandomSource>(
    fernet: &Fernet<C, R>,
    cfg: &Config,
    token: &str,
) -> Result<DecodeOutput> {
    let decoded = if cfg.require_authenticated {
        fernet.decrypt_verified(token)
    } else {
        fernet.decrypt(token)
    }
    .context("failed to decrypt token")?;

    if !decoded.hmac_success {
        warn!(
            timestamp = decoded.timestamp,
            "token failed authentication; returning unauthenticated plaintext"
        );
    }
    info!(
        plaintext_len = decoded.plaintext.len(),
        hmac_success = decoded.hmac_success,
        timestamp = decoded.timestamp,
        "token decrypted"
    );
    Ok(decoded)
}

fn check_age(cfg: &Config, now: u64, timestamp: u64) -> Result<()> {
    if cfg.max_token_age_secs == 0 {
        return Ok(());
    }
    if timestamp > now.saturating_add(MAX_CLOCK_SKEW_SECS) {
        anyhow::bail!("token timestamp {timestamp} is in the future (now {now})");
    }
    let age = now.saturating_sub(timestamp);
    if age > cfg.max_token_age_secs {
        anyhow::bail!(
            "token expired: {age}s old, limit {}s",
            cfg.max_token_age_secs
        );
    }
    Ok(())
}
