//! [`Key`]: the 32-byte Fernet secret, split into signing and encryption halves.

use std::fmt;
use std::str::FromStr;

use crate::base64url;
use crate::error::FernetError;
use crate::source::RandomSource;

/// Byte length of a Fernet key.
pub const KEY_LEN: usize = 32;

/// Byte length of each half of the key.
pub const HALF_KEY_LEN: usize = KEY_LEN / 2;

/// A parsed Fernet key.
///
/// Bytes `0..16` are the HMAC-SHA256 signing key; bytes `16..32` are the
/// AES-128 encryption key. The key is immutable once built and is overwritten
/// with zeroes when dropped.
#[derive(Clone)]
pub struct Key {
    bytes: Box<[u8; KEY_LEN]>,
}

impl Key {
    /// Build a key from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`FernetError::InvalidKeyLength`] unless `raw` is exactly
    /// [`KEY_LEN`] bytes.
    pub fn from_bytes(raw: &[u8]) -> Result<Self, FernetError> {
        if raw.len() != KEY_LEN {
            return Err(FernetError::InvalidKeyLength(raw.len()));
        }
        let mut bytes = Box::new([0u8; KEY_LEN]);
        bytes.copy_from_slice(raw);
        Ok(Self { bytes })
    }

    /// Parse a base64url-encoded key (padding optional).
    ///
    /// # Errors
    ///
    /// Returns [`FernetError::InvalidKeyFormat`] if the text is not base64url
    /// and [`FernetError::InvalidKeyLength`] if it does not decode to
    /// [`KEY_LEN`] bytes.
    pub fn from_base64url(encoded: &str) -> Result<Self, FernetError> {
        let mut raw = base64url::decode(encoded).map_err(FernetError::InvalidKeyFormat)?;
        let key = Self::from_bytes(&raw);
        raw.iter_mut().for_each(|b| *b = 0);
        key
    }

    /// Generate a fresh key from `rng`.
    ///
    /// # Errors
    ///
    /// Returns [`FernetError::InvalidKeyLength`] if the source returns the
    /// wrong number of bytes.
    pub fn generate(rng: &dyn RandomSource) -> Result<Self, FernetError> {
        let mut raw = rng.random_bytes(KEY_LEN);
        let key = Self::from_bytes(&raw);
        raw.iter_mut().for_each(|b| *b = 0);
        key
    }

    /// Render the key as unpadded base64url.
    pub fn to_base64url(&self) -> String {
        base64url::encode(&self.bytes[..])
    }

    /// HMAC-SHA256 key: the first half.
    pub fn signing_key(&self) -> &[u8] {
        &self.bytes[..HALF_KEY_LEN]
    }

    /// AES-128 key: the second half.
    pub fn encryption_key(&self) -> &[u8] {
        &self.bytes[HALF_KEY_LEN..]
    }
}

impl FromStr for Key {
    type Err = FernetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_base64url(s.trim())
    }
}

impl Drop for Key {
    fn drop(&mut self) {
        self.bytes.iter_mut().for_each(|b| *b = 0);
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Key([REDACTED])")
    }
}
