//! Digest to partition id hashing.

use crate::types::{Digest, PartitionId};

/// Map a key digest to its partition id.
///
/// The first two digest bytes are read as a little-endian `u16` and masked
/// with `n_partitions - 1`. `n_partitions` must be a power of two; tables
/// enforce this when they are created, so it is not checked here.
///
/// For any x and power of two n, `x % n == x & (n - 1)`.
#[inline]
pub fn partition_id(digest: &Digest, n_partitions: u32) -> PartitionId {
    let low = u16::from_le_bytes([digest[0], digest[1]]);
    u32::from(low) & n_partitions.wrapping_sub(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DIGEST_SIZE;

    fn digest_with_prefix(b0: u8, b1: u8) -> Digest {
        let mut digest = [0xAB; DIGEST_SIZE];
        digest[0] = b0;
        digest[1] = b1;
        digest
    }

    #[test]
    fn test_low_bytes_little_endian() {
        let digest = digest_with_prefix(0x03, 0x00);
        assert_eq!(partition_id(&digest, 4), 3);

        // 0x0102 little-endian is 0x0201 = 513
        let digest = digest_with_prefix(0x01, 0x02);
        assert_eq!(partition_id(&digest, 4096), 513);
        assert_eq!(partition_id(&digest, 512), 1);
    }

    #[test]
    fn test_zero_digest() {
        let digest = [0u8; DIGEST_SIZE];
        assert_eq!(partition_id(&digest, 4096), 0);
    }

    #[test]
    fn test_always_in_range() {
        for shift in 0..=16 {
            let n = 1u32 << shift;
            for b0 in (0..=255u8).step_by(17) {
                for b1 in (0..=255u8).step_by(13) {
                    let id = partition_id(&digest_with_prefix(b0, b1), n);
                    assert!(id < n, "id {} not below {}", id, n);
                }
            }
        }
    }

    #[test]
    fn test_ignores_trailing_bytes() {
        let mut a = [0u8; DIGEST_SIZE];
        let mut b = [0xFFu8; DIGEST_SIZE];
        a[0] = 0x34;
        a[1] = 0x12;
        b[0] = 0x34;
        b[1] = 0x12;
        assert_eq!(partition_id(&a, 4096), partition_id(&b, 4096));
        assert_eq!(partition_id(&a, 4096), 0x1234 & 0xFFF);
    }
}
