//! [`Fernet`]: encode and decode tokens under one key.

use crate::base64url;
use crate::error::FernetError;
use crate::key::Key;
use crate::source::{Clock, OsRandom, RandomSource, SystemClock};
use crate::token::{self, TokenParts, IV_LEN};

/// Result of [`Fernet::decrypt`].
///
/// `hmac_success` is `false` when the embedded tag did not match. In that case
/// `plaintext` is **unauthenticated** and must not be trusted; use
/// [`DecodeOutput::into_authenticated`] or [`Fernet::decrypt_verified`] to turn
/// a mismatch into an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeOutput {
    /// Decrypted payload, PKCS#7 padding removed.
    pub plaintext: Vec<u8>,
    /// Whether the embedded HMAC matched the recomputed one.
    pub hmac_success: bool,
    /// Unix seconds recorded in the token when it was created.
    pub timestamp: u64,
}

impl DecodeOutput {
    /// Return the plaintext only if the token authenticated.
    ///
    /// # Errors
    ///
    /// Returns [`FernetError::SignatureMismatch`] if `hmac_success` is `false`.
    pub fn into_authenticated(self) -> Result<Vec<u8>, FernetError> {
        if self.hmac_success {
            Ok(self.plaintext)
        } else {
            Err(FernetError::SignatureMismatch)
        }
    }
}

/// Token codec bound to one [`Key`].
///
/// The clock and random source are strategy objects so tests can fix them.
/// The codec holds no mutable state and can be shared across threads.
#[derive(Debug)]
pub struct Fernet<C = SystemClock, R = OsRandom> {
    key: Key,
    clock: C,
    rng: R,
}

impl Fernet {
    /// Codec using the system clock and the OS CSPRNG.
    pub fn new(key: Key) -> Self {
        Self::with_sources(key, SystemClock, OsRandom)
    }
}

impl<C: Clock, R: RandomSource> Fernet<C, R> {
    /// Codec with caller-supplied time and randomness sources.
    pub fn with_sources(key: Key, clock: C, rng: R) -> Self {
        Self { key, clock, rng }
    }

    /// The key this codec encrypts and verifies with.
    pub fn key(&self) -> &Key {
        &self.key
    }

    /// Encrypt `plaintext` stamped with the current time and a fresh IV.
    ///
    /// # Errors
    ///
    /// See [`Fernet::encrypt_with_iv`].
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<String, FernetError> {
        self.encrypt_at_time(plaintext, self.clock.now())
    }

    /// Encrypt `plaintext` stamped with `timestamp` and a fresh IV.
    ///
    /// # Errors
    ///
    /// See [`Fernet::encrypt_with_iv`].
    pub fn encrypt_at_time(&self, plaintext: &[u8], timestamp: u64) -> Result<String, FernetError> {
        let iv = self.rng.random_bytes(IV_LEN);
        self.encrypt_with_iv(plaintext, timestamp, &iv)
    }

    /// Encrypt with an explicit timestamp and IV. Output is a pure function
    /// of the key and the arguments.
    ///
    /// The IV must never be reused under the same key.
    ///
    /// # Errors
    ///
    /// Returns [`FernetError::InvalidIv`] if `iv` is not 16 bytes,
    /// [`FernetError::Cipher`] or [`FernetError::Auth`] if a primitive fails.
    pub fn encrypt_with_iv(
        &self,
        plaintext: &[u8],
        timestamp: u64,
        iv: &[u8],
    ) -> Result<String, FernetError> {
        let raw = token::seal(&self.key, plaintext, timestamp, iv)?;
        Ok(base64url::encode(raw))
    }

    /// Decode `token`, decrypt it, then check its HMAC.
    ///
    /// Decryption runs before the tag is checked and a tag mismatch is reported
    /// through [`DecodeOutput::hmac_success`] rather than as an error. A caller
    /// that ignores the flag accepts unauthenticated plaintext, and padding
    /// failures are observable before authentication. Prefer
    /// [`Fernet::decrypt_verified`] unless the caller needs to inspect
    /// unauthenticated tokens.
    ///
    /// # Errors
    ///
    /// [`FernetError::TokenDecodingFailed`], [`FernetError::InvalidTokenFormat`],
    /// [`FernetError::UnknownVersion`], [`FernetError::Cipher`] or
    /// [`FernetError::Auth`].
    pub fn decrypt(&self, token: &str) -> Result<DecodeOutput, FernetError> {
        let raw = base64url::decode(token).map_err(FernetError::TokenDecodingFailed)?;
        let parts = TokenParts::parse(&raw)?;
        let plaintext = parts.decrypt(&self.key)?;
        let hmac_success = parts.authenticate(&self.key)?;
        Ok(DecodeOutput {
            plaintext,
            hmac_success,
            timestamp: parts.timestamp(),
        })
    }

    /// Decode `token`, verify its HMAC, and only then decrypt it.
    ///
    /// The returned output always has `hmac_success == true`.
    ///
    /// # Errors
    ///
    /// As [`Fernet::decrypt`], plus [`FernetError::SignatureMismatch`] when the
    /// tag does not match. No unpadding is attempted on a mismatched token.
    pub fn decrypt_verified(&self, token: &str) -> Result<DecodeOutput, FernetError> {
        let raw = base64url::decode(token).map_err(FernetError::TokenDecodingFailed)?;
        let parts = TokenParts::parse(&raw)?;
        if !parts.authenticate(&self.key)? {
            return Err(FernetError::SignatureMismatch);
        }
        Ok(DecodeOutput {
            plaintext: parts.decrypt(&self.key)?,
            hmac_success: true,
            timestamp: parts.timestamp(),
        })
    }

    /// Return the creation time of an authentic token without decrypting it.
    ///
    /// # Errors
    ///
    /// As [`Fernet::decrypt_verified`], minus the cipher errors.
    pub fn extract_timestamp(&self, token: &str) -> Result<u64, FernetError> {
        let raw = base64url::decode(token).map_err(FernetError::TokenDecodingFailed)?;
        let parts = TokenParts::parse(&raw)?;
        if !parts.authenticate(&self.key)? {
            return Err(FernetError::SignatureMismatch);
        }
        Ok(parts.timestamp())
    }
}
