//! CRC32 checksums for segment frames
//!
//! Every frame carries a checksum over its length prefix and body; every
//! read verifies it.

use crc32fast::Hasher;

/// Computes a CRC32 (IEEE) checksum over the provided data.
pub fn compute_checksum(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// Verifies that the computed checksum matches the expected checksum.
pub fn verify_checksum(data: &[u8], expected: u32) -> bool {
    compute_checksum(data) == expected
}
