//! Conversion of a raw linked kernel (vmlinux) into a bootable zImage payload
//!
//! The default conversion only replaces the first compressed instruction
//! with a `c.nop`, so the kernel starts 4-byte aligned right after the
//! header page. The anchor scan rebuilds a small jump-stub header in front
//! of the kernel `.text` instead; it is kept as an opt-in alternative for
//! kernels linked with a different entry layout.

use crate::bytes::write_le32;
use crate::error::{BootImgError, Result};
use log::{debug, info};

/// `c.nop`, written over the first instruction of the kernel
pub const NOP_MARKER: [u8; 2] = [0x01, 0x00];

/// Start of `.text`: `csrw sie, zero; csrw sip, zero`
pub const TEXT_ANCHOR: [u8; 8] = [0x73, 0x10, 0x40, 0x10, 0x73, 0x10, 0x40, 0x14];

/// Size of the stub header placed in front of the relocated `.text`
pub const STUB_HEADER_SIZE: usize = 0x40;

/// `c.j 0x40` followed by two zero half-words
const STUB_JUMP: [u8; 6] = [0x81, 0xa0, 0x00, 0x00, 0x00, 0x00];

/// How a raw kernel is turned into a payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZImageMode {
    /// Overwrite the first two bytes with [`NOP_MARKER`]
    #[default]
    Patch,
    /// Locate [`TEXT_ANCHOR`] and rebuild a jump-stub image around it
    AnchorScan,
}

/// Convert a raw kernel into the payload stored in the boot image
pub fn build_zimage(vmlinux: &[u8], mode: ZImageMode) -> Result<Vec<u8>> {
    match mode {
        ZImageMode::Patch => patch_entry(vmlinux),
        ZImageMode::AnchorScan => rebuild_from_anchor(vmlinux),
    }
}

fn patch_entry(vmlinux: &[u8]) -> Result<Vec<u8>> {
    if vmlinux.len() < NOP_MARKER.len() {
        return Err(BootImgError::too_short(NOP_MARKER.len(), vmlinux.len()));
    }

    let mut zimage = Vec::with_capacity(vmlinux.len());
    zimage.extend_from_slice(&NOP_MARKER);
    zimage.extend_from_slice(&vmlinux[NOP_MARKER.len()..]);
    debug!("patched entry {:02x}{:02x} -> c.nop", vmlinux[0], vmlinux[1]);
    Ok(zimage)
}

/// Offset of the first [`TEXT_ANCHOR`] in `data`
pub fn find_anchor(data: &[u8]) -> Option<usize> {
    data.windows(TEXT_ANCHOR.len())
        .position(|window| window == TEXT_ANCHOR)
}

fn rebuild_from_anchor(vmlinux: &[u8]) -> Result<Vec<u8>> {
    if vmlinux.len() < STUB_HEADER_SIZE {
        return Err(BootImgError::too_short(STUB_HEADER_SIZE, vmlinux.len()));
    }

    let offset = find_anchor(vmlinux).ok_or(BootImgError::AnchorNotFound)?;
    info!("found offset 0x{offset:08x}");

    let zimage_size = (vmlinux.len() - offset) + STUB_HEADER_SIZE;
    let zimage_size = u32::try_from(zimage_size).map_err(|_| BootImgError::PayloadTooLarge {
        region: "kernel",
        size: zimage_size,
    })?;

    let mut zimage = Vec::with_capacity(zimage_size as usize);
    zimage.extend_from_slice(&STUB_JUMP);
    zimage.extend_from_slice(&vmlinux[0x06..0x10]);
    zimage.extend_from_slice(&write_le32(zimage_size));
    zimage.extend_from_slice(&vmlinux[0x14..0x3c]);
    zimage.extend_from_slice(&[0u8; 4]);
    debug_assert_eq!(zimage.len(), STUB_HEADER_SIZE);
    zimage.extend_from_slice(&vmlinux[offset..]);

    Ok(zimage)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_kernel(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i as u8).wrapping_mul(31)).collect()
    }

    #[test]
    fn test_patch_replaces_first_instruction() {
        let mut vmlinux = raw_kernel(64);
        vmlinux[0] = 0xab;
        vmlinux[1] = 0xcd;

        let zimage = build_zimage(&vmlinux, ZImageMode::Patch).unwrap();
        assert_eq!(zimage.len(), 64);
        assert_eq!(&zimage[..2], &[0x01, 0x00]);
        assert_eq!(&zimage[2..], &vmlinux[2..]);
    }

    #[test]
    fn test_patch_is_default() {
        assert_eq!(ZImageMode::default(), ZImageMode::Patch);
    }

    #[test]
    fn test_patch_short_input() {
        assert!(matches!(
            build_zimage(&[0x6f], ZImageMode::Patch),
            Err(BootImgError::InputTooShort { needed: 2, actual: 1 })
        ));
    }

    #[test]
    fn test_find_anchor() {
        let mut data = vec![0u8; 0x100];
        assert_eq!(find_anchor(&data), None);

        data[0x80..0x88].copy_from_slice(&TEXT_ANCHOR);
        data[0xc0..0xc8].copy_from_slice(&TEXT_ANCHOR);
        assert_eq!(find_anchor(&data), Some(0x80));
    }

    #[test]
    fn test_anchor_scan_layout() {
        let mut vmlinux = raw_kernel(0x200);
        // keep the pattern from showing up by accident
        for b in vmlinux.iter_mut() {
            if *b == 0x73 {
                *b = 0;
            }
        }
        vmlinux[0x100..0x108].copy_from_slice(&TEXT_ANCHOR);

        let zimage = build_zimage(&vmlinux, ZImageMode::AnchorScan).unwrap();
        let expected_size = (0x200 - 0x100) + STUB_HEADER_SIZE;

        assert_eq!(zimage.len(), expected_size);
        assert_eq!(&zimage[..6], &STUB_JUMP);
        assert_eq!(&zimage[0x06..0x10], &vmlinux[0x06..0x10]);
        assert_eq!(&zimage[0x10..0x14], &(expected_size as u32).to_le_bytes());
        assert_eq!(&zimage[0x14..0x3c], &vmlinux[0x14..0x3c]);
        assert_eq!(&zimage[0x3c..0x40], &[0u8; 4]);
        assert_eq!(&zimage[0x40..], &vmlinux[0x100..]);
    }

    #[test]
    fn test_anchor_scan_missing_anchor() {
        let vmlinux = vec![0u8; 0x100];
        assert!(matches!(
            build_zimage(&vmlinux, ZImageMode::AnchorScan),
            Err(BootImgError::AnchorNotFound)
        ));
    }

    #[test]
    fn test_anchor_scan_short_input() {
        assert!(matches!(
            build_zimage(&TEXT_ANCHOR, ZImageMode::AnchorScan),
            Err(BootImgError::InputTooShort { .. })
        ));
    }
}
