//! Configuration loading and validation for `fernet-tool`.
//!
//! All values are read from environment variables. The process exits with a
//! clear error message if any variable is invalid.

use std::fmt;

use anyhow::{Context, Result};
use fernet::Key;
use serde::Deserialize;

use crate::commands::OutputFormat;

/// Validated `fernet-tool` configuration.
#[derive(Clone, Deserialize)]
pub struct Config {
    /// Base64url Fernet key. Required by every command except `generate-key`.
    #[serde(default)]
    pub fernet_key: String,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Reject tokens whose HMAC does not match instead of reporting the flag.
    #[serde(default = "default_require_authenticated")]
    pub require_authenticated: bool,

    /// Maximum accepted token age in seconds; `0` disables the check.
    #[serde(default)]
    pub max_token_age_secs: u64,

    /// `raw` or `json`.
    #[serde(default = "default_output_format")]
    pub output_format: String,
}

fn default_log_level() -> String {
    "info".into()
}
fn default_require_authenticated() -> bool {
    true
}
fn default_output_format() -> String {
    "raw".into()
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable cannot be parsed or fails validation.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("failed to build configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// Parse `FERNET_KEY`.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is absent or is not a valid Fernet key.
    pub fn key(&self) -> Result<Key> {
        if self.fernet_key.trim().is_empty() {
            anyhow::bail!("FERNET_KEY is required and must not be empty");
        }
        self.fernet_key
            .parse::<Key>()
            .context("FERNET_KEY is not a valid Fernet key")
    }

    /// Parse `OUTPUT_FORMAT`.
    pub fn output_format(&self) -> Result<OutputFormat> {
        self.output_format
            .parse::<OutputFormat>()
            .context("OUTPUT_FORMAT must be `raw` or `json`")
    }

    fn validate(&self) -> Result<()> {
        self.output_format()?;
        if !self.fernet_key.trim().is_empty() {
            self.key()?;
        }
        Ok(())
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("fernet_key", &"[REDACTED]")
            .field("log_level", &self.log_level)
            .field("require_authenticated", &self.require_authenticated)
            .field("max_token_age_secs", &self.max_token_age_secs)
            .field("output_format", &self.output_format)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "3b-Nqg6ry-jrAuDyVjSwEe8wrdyEPQfPuOQNH1q5olE";

    fn cfg(key: &str, output_format: &str) -> Config {
        Config {
            fernet_key: key.into(),
            log_level: default_log_level(),
            require_authenticated: default_require_authenticated(),
            max_token_age_secs: 0,
            output_format: output_format.into(),
        }
    }

    #[test]
    fn defaults_are_correct() {
        assert_eq!(default_log_level(), "info");
        assert!(default_require_authenticated());
        assert_eq!(default_output_format(), "raw");
    }

    #[test]
    fn validate_accepts_valid_config() {
        assert!(cfg(KEY, "raw").validate().is_ok());
        assert!(cfg(KEY, "json").validate().is_ok());
    }

    #[test]
    fn validate_allows_missing_key() {
        let c = cfg("", "raw");
        assert!(c.validate().is_ok());
        assert!(c.key().is_err());
    }

    #[test]
    fn validate_rejects_short_key() {
        assert!(cfg("AAECAwQFBgcICQoLDA0ODxAREhMUFRYXGBkaGxwdHg", "raw")
            .validate()
            .is_err());
    }

    #[test]
    fn validate_rejects_unknown_output_format() {
        assert!(cfg(KEY, "yaml").validate().is_err());
    }

    #[test]
    fn debug_redacts_key() {
        let shown = format!("{:?}", cfg(KEY, "raw"));
        assert!(shown.contains("REDACTED"));
        assert!(!shown.contains(KEY));
    }
}
