//! Error types for key parsing, token encoding and token decoding.

use cbc::cipher::{block_padding::UnpadError, InvalidLength};
use thiserror::Error;

use crate::key::KEY_LEN;
use crate::token::{IV_LEN, MIN_TOKEN_LEN, VERSION};

/// Failure reported by the AES-128-CBC collaborator.
#[derive(Debug, Error)]
pub enum CipherFailure {
    /// The cipher rejected the key or IV length.
    #[error("cipher initialisation failed")]
    Init(#[source] InvalidLength),

    /// The decrypted payload did not end in valid PKCS#7 padding.
    #[error("invalid PKCS#7 padding")]
    Unpad(#[source] UnpadError),
}

/// Every way a Fernet operation can fail.
///
/// Variants fall into two groups:
/// - malformed input (key, IV or token), see [`FernetError::is_format_error`];
/// - collaborator failures ([`FernetError::Cipher`], [`FernetError::Auth`]).
///
/// An HMAC *mismatch* on [`crate::Fernet::decrypt`] is not an error; it is
/// reported through [`crate::DecodeOutput::hmac_success`].
#[derive(Debug, Error)]
pub enum FernetError {
    /// The key text is not valid base64url.
    #[error("invalid key format")]
    InvalidKeyFormat(#[source] base64::DecodeError),

    /// The key does not decode to exactly [`KEY_LEN`] bytes.
    #[error("invalid key length: expected {KEY_LEN} bytes, got {0}")]
    InvalidKeyLength(usize),

    /// The random source returned an IV of the wrong size.
    #[error("invalid IV length: expected {IV_LEN} bytes, got {0}")]
    InvalidIv(usize),

    /// AES-CBC encryption or decryption failed.
    #[error("cipher error")]
    Cipher(#[from] CipherFailure),

    /// The HMAC could not be computed.
    #[error("authentication error")]
    Auth(#[source] InvalidLength),

    /// The token text is not valid base64url.
    #[error("token decoding failed")]
    TokenDecodingFailed(#[source] base64::DecodeError),

    /// The binary token is shorter than [`MIN_TOKEN_LEN`] bytes or its
    /// ciphertext is not block aligned.
    #[error("invalid token format: {0} bytes (minimum {MIN_TOKEN_LEN}, ciphertext must be block aligned)")]
    InvalidTokenFormat(usize),

    /// The version byte is not [`VERSION`].
    #[error("unknown token version {0:#04x}, expected {VERSION:#04x}")]
    UnknownVersion(u8),

    /// The HMAC did not match. Only returned by the verifying decode paths.
    #[error("token signature mismatch")]
    SignatureMismatch,
}

impl FernetError {
    /// Returns `true` if the error was caused by malformed caller input
    /// rather than by the cipher or MAC collaborator.
    pub fn is_format_error(&self) -> bool {
        match self {
            FernetError::InvalidKeyFormat(_)
            | FernetError::InvalidKeyLength(_)
            | FernetError::InvalidIv(_)
            | FernetError::TokenDecodingFailed(_)
            | FernetError::InvalidTokenFormat(_)
            | FernetError::UnknownVersion(_) => true,
            FernetError::Cipher(_) | FernetError::Auth(_) | FernetError::SignatureMismatch => {
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn format_errors_are_classified() {
        assert!(FernetError::InvalidKeyLength(31).is_format_error());
        assert!(FernetError::InvalidIv(8).is_format_error());
        assert!(FernetError::InvalidTokenFormat(72).is_format_error());
        assert!(FernetError::UnknownVersion(0x81).is_format_error());
        assert!(!FernetError::SignatureMismatch.is_format_error());
        assert!(!FernetError::Auth(InvalidLength).is_format_error());
        assert!(!FernetError::Cipher(CipherFailure::Unpad(UnpadError)).is_format_error());
    }

    #[test]
    fn display_includes_details() {
        let e = FernetError::InvalidKeyLength(31);
        assert!(e.to_string().contains("expected 32 bytes, got 31"));

        let e = FernetError::UnknownVersion(0x81);
        assert!(e.to_string().contains("0x81"));
        assert!(e.to_string().contains("0x80"));
    }

    #[test]
    fn cipher_failure_is_exposed_as_source() {
        let e = FernetError::from(CipherFailure::Unpad(UnpadError));
        let source = e.source().expect("cipher error has a source");
        assert_eq!(source.to_string(), "invalid PKCS#7 padding");
    }

    #[test]
    fn cipher_cause_is_not_repeated_in_display() {
        let e = FernetError::from(CipherFailure::Unpad(UnpadError));
        assert_eq!(e.to_string(), "cipher error");
    }
}
