//! Building boot images and taking them apart again

use crate::bytes::{align, align_up};
use crate::digest::{compute_id, id_field};
use crate::error::{BootImgError, Result};
use crate::header::{BootImgHeader, HEADER_FIELDS_SIZE};
use crate::profile::{BoardProfile, validate_page_size};
use log::{debug, warn};
use std::path::Path;

/// Ramdisks are never packed; the region is always empty.
const NO_RAMDISK: &[u8] = &[];

/// Builder for boot images
///
/// ```rust
/// use nezha_bootimg::BootImageBuilder;
///
/// let image = BootImageBuilder::new()
///     .cmdline("console=ttyS0,115200")
///     .kernel(vec![0u8; 4096])
///     .build()?;
/// assert_eq!(image.len(), 0x800 + 0x1000);
/// # Ok::<(), nezha_bootimg::BootImgError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct BootImageBuilder {
    profile: BoardProfile,
    cmdline: String,
    kernel: Vec<u8>,
    second: Vec<u8>,
}

impl BootImageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the addresses, page size and name of `profile`
    pub fn profile(mut self, profile: BoardProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Kernel command line stored in the header
    pub fn cmdline(mut self, cmdline: impl Into<String>) -> Self {
        self.cmdline = cmdline.into();
        self
    }

    /// Kernel payload (zImage)
    pub fn kernel(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.kernel = data.into();
        self
    }

    /// Second stage loader, appended after the kernel when non-empty
    pub fn second(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.second = data.into();
        self
    }

    /// Assemble the header for the current payload.
    ///
    /// Fails before anything is encoded if a text field does not fit or
    /// the profile is invalid.
    pub fn header(&self) -> Result<BootImgHeader> {
        self.profile.validate()?;

        let mut header = BootImgHeader::new(&self.profile)?;
        header.set_cmdline(&self.cmdline)?;
        header.kernel_size = region_size("kernel", &self.kernel)?;
        header.ramdisk_size = 0;
        header.second_size = region_size("second", &self.second)?;
        header.id = id_field(&compute_id(&self.kernel, NO_RAMDISK, &self.second));
        Ok(header)
    }

    /// Serialize header and regions, each padded to the page size
    pub fn build(&self) -> Result<Vec<u8>> {
        let header = self.header()?;
        let page_size = header.page_size as usize;

        let mut image = align(&header.to_bytes()?, page_size);
        image.extend_from_slice(&align(&self.kernel, page_size));
        image.extend_from_slice(&align(NO_RAMDISK, page_size));
        if !self.second.is_empty() {
            image.extend_from_slice(&align(&self.second, page_size));
        }

        debug!(
            "boot image: kernel {} bytes, second {} bytes, total {} bytes",
            self.kernel.len(),
            self.second.len(),
            image.len()
        );
        Ok(image)
    }

    pub fn build_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let image = self.build()?;
        std::fs::write(path, image)?;
        Ok(())
    }
}

fn region_size(region: &'static str, data: &[u8]) -> Result<u32> {
    u32::try_from(data.len()).map_err(|_| BootImgError::PayloadTooLarge {
        region,
        size: data.len(),
    })
}

/// A boot image read back from bytes
#[derive(Debug, Clone)]
pub struct BootImage<'a> {
    header: BootImgHeader,
    data: &'a [u8],
}

impl<'a> BootImage<'a> {
    /// Parse the header of `data`.
    ///
    /// A wrong magic is only warned about, so that damaged images can still
    /// be inspected.
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        let header = BootImgHeader::from_bytes(data)?;
        if !header.has_valid_magic() {
            warn!("unexpected boot image magic {:02x?}", header.magic);
        }
        Ok(Self { header, data })
    }

    pub fn header(&self) -> &BootImgHeader {
        &self.header
    }

    /// Offset of the kernel region: the header occupies exactly one page
    pub fn kernel_offset(&self) -> Result<usize> {
        let page_size = self.header.page_size;
        validate_page_size(page_size).map_err(|_| {
            BootImgError::invalid_header(format!(
                "page size 0x{page_size:x} is not a power of two"
            ))
        })?;
        if (page_size as usize) < HEADER_FIELDS_SIZE {
            return Err(BootImgError::invalid_header(format!(
                "page size 0x{page_size:x} cannot hold the {HEADER_FIELDS_SIZE} byte header"
            )));
        }
        Ok(page_size as usize)
    }

    /// The kernel bytes, without the trailing page padding
    pub fn kernel(&self) -> Result<&'a [u8]> {
        let start = self.kernel_offset()?;
        self.region(start, self.header.kernel_size)
    }

    pub fn ramdisk(&self) -> Result<&'a [u8]> {
        let start = self.kernel_offset()? + self.padded(self.header.kernel_size);
        self.region(start, self.header.ramdisk_size)
    }

    pub fn second(&self) -> Result<&'a [u8]> {
        let start = self.kernel_offset()?
            + self.padded(self.header.kernel_size)
            + self.padded(self.header.ramdisk_size);
        self.region(start, self.header.second_size)
    }

    /// Copy out the kernel exactly as it was handed to the builder
    pub fn extract_kernel(&self) -> Result<Vec<u8>> {
        Ok(self.kernel()?.to_vec())
    }

    /// Recompute the id over all regions and compare it with the header
    pub fn verify(&self) -> Result<()> {
        let digest = compute_id(self.kernel()?, self.ramdisk()?, self.second()?);
        let expected = id_field(&digest);
        if expected != self.header.id {
            return Err(BootImgError::DigestMismatch {
                expected: hex::encode(self.header.id),
                actual: hex::encode(expected),
            });
        }
        Ok(())
    }

    fn padded(&self, size: u32) -> usize {
        align_up(size as usize, self.header.page_size as usize)
    }

    fn region(&self, start: usize, size: u32) -> Result<&'a [u8]> {
        let end = start + size as usize;
        if self.data.len() < end {
            return Err(BootImgError::too_short(end, self.data.len()));
        }
        Ok(&self.data[start..end])
    }
}
