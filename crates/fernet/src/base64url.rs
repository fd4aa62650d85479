//! URL-safe base64 used for both keys and tokens.
//!
//! Output never carries `=` padding. Input may arrive with or without it and
//! may use either the URL-safe (`-`, `_`) or the standard (`+`, `/`) alphabet.
//!
//! Decoding is strict about the final character: leftover bits that do not
//! belong to a whole byte must be zero, so each byte string has exactly one
//! accepted encoding (`"Zg"` decodes, `"Zh"` does not).

use base64::{
    engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
    DecodeError, Engine as _,
};

/// Encode `bytes` as unpadded base64url.
pub fn encode(bytes: impl AsRef<[u8]>) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode base64url text, re-padding it to a multiple of four first.
///
/// # Errors
///
/// Returns the underlying [`DecodeError`] for characters outside the alphabet
/// or input whose padded length still does not decode.
pub fn decode(text: &str) -> Result<Vec<u8>, DecodeError> {
    let mut normalized: String = text
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();
    while normalized.len() % 4 != 0 {
        normalized.push('=');
    }
    STANDARD.decode(normalized)
}
