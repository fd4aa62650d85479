//! Binary token layout and the AES-128-CBC / HMAC-SHA256 composition.
//!
//! # Layout
//!
//! ```text
//! offset  len  field
//!      0    1  version     (0x80)
//!      1    8  timestamp   (big-endian Unix seconds)
//!      9   16  IV
//!     25    n  ciphertext  (PKCS#7 padded, n = 16k, k >= 1)
//!   25+n   32  HMAC-SHA256 over bytes 0..25+n, keyed by the signing key
//! ```

use aes::Aes128;
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::compare::constant_time_eq;
use crate::error::{CipherFailure, FernetError};
use crate::key::Key;

type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;
type HmacSha256 = Hmac<Sha256>;

/// The only supported format revision.
pub const VERSION: u8 = 0x80;

pub const VERSION_OFFSET: usize = 0;
pub const VERSION_LEN: usize = 1;
pub const TIMESTAMP_OFFSET: usize = VERSION_OFFSET + VERSION_LEN;
pub const TIMESTAMP_LEN: usize = 8;
pub const IV_OFFSET: usize = TIMESTAMP_OFFSET + TIMESTAMP_LEN;
pub const IV_LEN: usize = 16;
pub const CIPHERTEXT_OFFSET: usize = IV_OFFSET + IV_LEN;
pub const HMAC_LEN: usize = 32;

/// AES block size; the ciphertext is always a positive multiple of it.
pub const BLOCK_LEN: usize = 16;

/// Bytes taken by every field except the ciphertext.
pub const OVERHEAD: usize = CIPHERTEXT_OFFSET + HMAC_LEN;

/// Smallest valid token: the fixed fields plus one ciphertext block.
pub const MIN_TOKEN_LEN: usize = OVERHEAD + BLOCK_LEN;

/// Borrowed view of a binary token whose length and version have been checked.
#[derive(Debug, Clone, Copy)]
pub struct TokenParts<'a> {
    raw: &'a [u8],
}

impl<'a> TokenParts<'a> {
    /// Validate length, alignment and version, in that order.
    ///
    /// # Errors
    ///
    /// Returns [`FernetError::InvalidTokenFormat`] if `raw` is shorter than
    /// [`MIN_TOKEN_LEN`] or its ciphertext is not block aligned, and
    /// [`FernetError::UnknownVersion`] if the first byte is not [`VERSION`].
    pub fn parse(raw: &'a [u8]) -> Result<Self, FernetError> {
        if raw.len() < MIN_TOKEN_LEN || (raw.len() - OVERHEAD) % BLOCK_LEN != 0 {
            return Err(FernetError::InvalidTokenFormat(raw.len()));
        }
        let parts = Self { raw };
        if parts.version() != VERSION {
            return Err(FernetError::UnknownVersion(parts.version()));
        }
        Ok(parts)
    }

    pub fn version(&self) -> u8 {
        self.raw[VERSION_OFFSET]
    }

    pub fn timestamp(&self) -> u64 {
        let mut be = [0u8; TIMESTAMP_LEN];
        be.copy_from_slice(&self.raw[TIMESTAMP_OFFSET..IV_OFFSET]);
        u64::from_be_bytes(be)
    }

    pub fn iv(&self) -> &'a [u8] {
        &self.raw[IV_OFFSET..CIPHERTEXT_OFFSET]
    }

    pub fn ciphertext(&self) -> &'a [u8] {
        &self.raw[CIPHERTEXT_OFFSET..self.hmac_offset()]
    }

    pub fn hmac(&self) -> &'a [u8] {
        &self.raw[self.hmac_offset()..]
    }

    /// `version ‖ timestamp ‖ IV ‖ ciphertext`: the bytes covered by the HMAC.
    pub fn signed_region(&self) -> &'a [u8] {
        &self.raw[..self.hmac_offset()]
    }

    /// Recompute the HMAC and compare it with the embedded tag in constant time.
    ///
    /// # Errors
    ///
    /// Returns [`FernetError::Auth`] if the MAC cannot be computed. A mismatch
    /// is `Ok(false)`.
    pub fn authenticate(&self, key: &Key) -> Result<bool, FernetError> {
        let expected = compute_hmac(key, self.signed_region())?;
        Ok(constant_time_eq(&expected, self.hmac()))
    }

    /// CBC-decrypt and unpad the ciphertext.
    ///
    /// # Errors
    ///
    /// Returns [`FernetError::Cipher`] on a cipher or padding failure.
    pub fn decrypt(&self, key: &Key) -> Result<Vec<u8>, FernetError> {
        let plaintext = Aes128CbcDec::new_from_slices(key.encryption_key(), self.iv())
            .map_err(CipherFailure::Init)?
            .decrypt_padded_vec_mut::<Pkcs7>(self.ciphertext())
            .map_err(CipherFailure::Unpad)?;
        Ok(plaintext)
    }

    fn hmac_offset(&self) -> usize {
        self.raw.len() - HMAC_LEN
    }
}

/// Build the binary form of a token.
///
/// # Errors
///
/// Returns [`FernetError::InvalidIv`] if `iv` is not [`IV_LEN`] bytes,
/// [`FernetError::Cipher`] if the cipher cannot be initialised and
/// [`FernetError::Auth`] if the MAC cannot be computed.
pub fn seal(key: &Key, plaintext: &[u8], timestamp: u64, iv: &[u8]) -> Result<Vec<u8>, FernetError> {
    if iv.len() != IV_LEN {
        return Err(FernetError::InvalidIv(iv.len()));
    }
    let ciphertext = Aes128CbcEnc::new_from_slices(key.encryption_key(), iv)
        .map_err(CipherFailure::Init)?
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    let mut token = Vec::with_capacity(OVERHEAD + ciphertext.len());
    token.push(VERSION);
    token.extend_from_slice(&timestamp.to_be_bytes());
    token.extend_from_slice(iv);
    token.extend_from_slice(&ciphertext);

    let tag = compute_hmac(key, &token)?;
    token.extend_from_slice(&tag);
    Ok(token)
}

fn compute_hmac(key: &Key, signed: &[u8]) -> Result<[u8; HMAC_LEN], FernetError> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(key.signing_key()).map_err(FernetError::Auth)?;
    mac.update(signed);
    Ok(mac.finalize().into_bytes().into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> Key {
        Key::from_bytes(&(0u8..32).collect::<Vec<_>>()).unwrap()
    }

    fn iv() -> Vec<u8> {
        (0x10u8..0x20).collect()
    }

    #[test]
    fn offset_table() {
        assert_eq!(VERSION_OFFSET, 0);
        assert_eq!(TIMESTAMP_OFFSET, 1);
        assert_eq!(IV_OFFSET, 9);
        assert_eq!(CIPHERTEXT_OFFSET, 25);
        assert_eq!(OVERHEAD, 57);
        assert_eq!(MIN_TOKEN_LEN, 73);
    }

    #[test]
    fn seal_lays_out_fields() {
        let raw = seal(&key(), b"hello", 499_162_800, &iv()).unwrap();
        assert_eq!(raw.len(), OVERHEAD + BLOCK_LEN);
        assert_eq!(raw[0], VERSION);
        assert_eq!(&raw[1..9], &499_162_800u64.to_be_bytes());
        assert_eq!(&raw[9..25], iv().as_slice());

        let parts = TokenParts::parse(&raw).unwrap();
        assert_eq!(parts.version(), VERSION);
        assert_eq!(parts.timestamp(), 499_162_800);
        assert_eq!(parts.iv(), iv().as_slice());
        assert_eq!(parts.ciphertext().len(), BLOCK_LEN);
        assert_eq!(parts.hmac().len(), HMAC_LEN);
        assert_eq!(parts.signed_region().len(), raw.len() - HMAC_LEN);
    }

    #[test]
    fn aligned_plaintext_gains_a_full_padding_block() {
        let raw = seal(&key(), &[0x61; 16], 0, &iv()).unwrap();
        assert_eq!(TokenParts::parse(&raw).unwrap().ciphertext().len(), 32);
    }

    #[test]
    fn empty_plaintext_still_yields_one_block() {
        let raw = seal(&key(), b"", 0, &iv()).unwrap();
        assert_eq!(raw.len(), MIN_TOKEN_LEN);
    }

    #[test]
    fn seal_rejects_wrong_iv_length() {
        assert!(matches!(
            seal(&key(), b"x", 0, &[0u8; 15]),
            Err(FernetError::InvalidIv(15))
        ));
        assert!(matches!(
            seal(&key(), b"x", 0, &[0u8; 17]),
            Err(FernetError::InvalidIv(17))
        ));
    }

    #[test]
    fn parse_rejects_short_and_misaligned_lengths() {
        for len in [0, 1, 57, 72, 74, 88, 90, 104] {
            let mut raw = vec![0u8; len];
            if let Some(first) = raw.first_mut() {
                *first = VERSION;
            }
            assert!(
                matches!(TokenParts::parse(&raw), Err(FernetError::InvalidTokenFormat(l)) if l == len),
                "length {len}"
            );
        }
        for len in [73, 89, 105] {
            let mut raw = vec![0u8; len];
            raw[0] = VERSION;
            assert!(TokenParts::parse(&raw).is_ok(), "length {len}");
        }
    }

    #[test]
    fn length_is_checked_before_version() {
        let raw = vec![0x00u8; 72];
        assert!(matches!(
            TokenParts::parse(&raw),
            Err(FernetError::InvalidTokenFormat(72))
        ));
    }

    #[test]
    fn parse_rejects_other_versions() {
        let mut raw = seal(&key(), b"hello", 0, &iv()).unwrap();
        for version in [0x00u8, 0x7f, 0x81, 0xff] {
            raw[0] = version;
            assert!(matches!(
                TokenParts::parse(&raw),
                Err(FernetError::UnknownVersion(v)) if v == version
            ));
        }
    }

    #[test]
    fn authenticate_and_decrypt() {
        let raw = seal(&key(), b"hello", 0, &iv()).unwrap();
        let parts = TokenParts::parse(&raw).unwrap();
        assert!(parts.authenticate(&key()).unwrap());
        assert_eq!(parts.decrypt(&key()).unwrap(), b"hello");
    }

    #[test]
    fn authenticate_with_other_key_is_false() {
        let raw = seal(&key(), b"hello", 0, &iv()).unwrap();
        let other = Key::from_bytes(&[7u8; 32]).unwrap();
        assert!(!TokenParts::parse(&raw).unwrap().authenticate(&other).unwrap());
    }
}
