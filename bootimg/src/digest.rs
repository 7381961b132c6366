//! SHA-1 image id as stored in the header's `id` field

use crate::bytes::write_le32;
use sha1::{Digest, Sha1};

/// Size of the SHA-1 output
pub const DIGEST_SIZE: usize = 20;

/// Width of the header `id` field
pub const ID_SIZE: usize = 32;

/// Compute the image id over each region followed by its unpadded length.
pub fn compute_id(kernel: &[u8], ramdisk: &[u8], second: &[u8]) -> [u8; DIGEST_SIZE] {
    let mut hasher = Sha1::new();
    for region in [kernel, ramdisk, second] {
        hasher.update(region);
        hasher.update(write_le32(region.len() as u32));
    }
    hasher.finalize().into()
}

/// Place a digest in a zero-padded `id` field
pub fn id_field(digest: &[u8; DIGEST_SIZE]) -> [u8; ID_SIZE] {
    let mut id = [0u8; ID_SIZE];
    id[..DIGEST_SIZE].copy_from_slice(digest);
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_image_id() {
        // sha1 of three zero length fields
        let id = compute_id(&[], &[], &[]);
        let mut hasher = Sha1::new();
        hasher.update([0u8; 12]);
        let expected: [u8; DIGEST_SIZE] = hasher.finalize().into();
        assert_eq!(id, expected);
    }

    #[test]
    fn test_known_vector() {
        let mut hasher = Sha1::new();
        hasher.update(b"abc");
        let digest: [u8; DIGEST_SIZE] = hasher.finalize().into();
        assert_eq!(hex::encode(digest), "a9993e364706816aba3e25717850c26c9cd0d89d");
    }

    #[test]
    fn test_deterministic_and_sensitive() {
        for len in [0usize, 1, 2047, 2048, 2049] {
            let payload: Vec<u8> = (0..len).map(|i| (i * 7) as u8).collect();
            let a = compute_id(&payload, &[], &[]);
            assert_eq!(a, compute_id(&payload, &[], &[]), "len {len}");

            if len > 0 {
                let mut changed = payload.clone();
                changed[len / 2] ^= 0x01;
                assert_ne!(a, compute_id(&changed, &[], &[]), "len {len}");
            }
        }
    }

    #[test]
    fn test_length_is_part_of_the_id() {
        // same bytes split differently across regions must not collide
        assert_ne!(compute_id(b"ab", b"", b""), compute_id(b"a", b"b", b""));
    }

    #[test]
    fn test_id_field_padding() {
        let digest = compute_id(b"kernel", &[], &[]);
        let id = id_field(&digest);
        assert_eq!(&id[..DIGEST_SIZE], &digest);
        assert!(id[DIGEST_SIZE..].iter().all(|&b| b == 0));
    }
}
