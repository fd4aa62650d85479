//! Fernet: authenticated, timestamped symmetric-encryption tokens.
//!
//! A token is `version ‖ timestamp ‖ IV ‖ ciphertext ‖ HMAC` in base64url,
//! where the ciphertext is AES-128-CBC with PKCS#7 padding and the HMAC is
//! HMAC-SHA256 over everything before it. See [`token`] for the byte layout.
//!
//! The crate performs no I/O and no logging. Time and randomness come from the
//! [`Clock`] and [`RandomSource`] capabilities held by each [`Fernet`].
//!
//! ```
//! use fernet::{Fernet, Key, OsRandom};
//!
//! let fernet = Fernet::new(Key::generate(&OsRandom)?);
//! let token = fernet.encrypt(b"attack at dawn")?;
//! let plaintext = fernet.decrypt_verified(&token)?.plaintext;
//! assert_eq!(plaintext, b"attack at dawn");
//! # Ok::<(), fernet::FernetError>(())
//! ```

pub mod base64url;
pub mod compare;
pub mod error;
pub mod fernet;
pub mod key;
pub mod source;
pub mod token;

pub use error::{CipherFailure, FernetError};
pub use fernet::{DecodeOutput, Fernet};
pub use key::{Key, KEY_LEN};
pub use source::{Clock, FixedClock, OsRandom, RandomSource, SystemClock};
