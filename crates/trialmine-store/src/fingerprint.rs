//! Source-text fingerprints

use sha2::{Digest, Sha256};

/// Length of the stored fingerprint in hex characters
pub const FINGERPRINT_LEN: usize = 16;

/// Content hash of a document's text, as stored in checkpoints
pub fn compute_fingerprint(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    let mut hex = hex::encode(digest);
    hex.truncate(FINGERPRINT_LEN);
    hex
}
