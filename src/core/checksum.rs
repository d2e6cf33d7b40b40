/*!
 * SHA-256 helpers for archive integrity reporting
 */

use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 of a byte buffer
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}
