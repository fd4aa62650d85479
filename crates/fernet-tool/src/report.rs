//! JSON output emitted when `OUTPUT_FORMAT=json`.

use fernet::{base64url, DecodeOutput};
use serde::{Deserialize, Serialize};

/// Output of the `decrypt` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecryptReport {
    /// Plaintext bytes as unpadded base64url, since they need not be UTF-8.
    pub plaintext: String,
    /// Whether the token's HMAC matched.
    pub hmac_success: bool,
    /// Token creation time, Unix seconds.
    pub timestamp: u64,
}

impl From<&DecodeOutput> for DecryptReport {
    fn from(out: &DecodeOutput) -> Self {
        Self {
            plaintext: base64url::encode(&out.plaintext),
            hmac_success: out.hmac_success,
            timestamp: out.timestamp,
        }
    }
}
