//! Board profile: load addresses, page size and image name
//!
//! Every field defaults to the Allwinner D1 Nezha values. A TOML file can
//! override any subset of them:
//!
//! ```toml
//! kernel_addr = 0x40200000
//! page_size = 0x800
//! name = "d1-nezha"
//! ```

use crate::error::{BootImgError, Result};
use crate::header::{HEADER_FIELDS_SIZE, NAME_SIZE};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const KERNEL_ADDR: u32 = 0x4020_0000;
pub const RAMDISK_ADDR: u32 = 0x4120_0000;
pub const SECOND_ADDR: u32 = 0x4110_0000;
pub const TAGS_ADDR: u32 = 0x4020_0100;
pub const PAGE_SIZE: u32 = 0x800;
pub const IMAGE_NAME: &str = "d1-nezha";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct BoardProfile {
    pub kernel_addr: u32,
    pub ramdisk_addr: u32,
    pub second_addr: u32,
    pub tags_addr: u32,
    pub page_size: u32,
    /// Written to the 16-byte `image_name` field
    pub name: String,
}

impl Default for BoardProfile {
    fn default() -> Self {
        Self::d1_nezha()
    }
}

impl BoardProfile {
    pub fn d1_nezha() -> Self {
        Self {
            kernel_addr: KERNEL_ADDR,
            ramdisk_addr: RAMDISK_ADDR,
            second_addr: SECOND_ADDR,
            tags_addr: TAGS_ADDR,
            page_size: PAGE_SIZE,
            name: IMAGE_NAME.to_string(),
        }
    }

    /// Parse a profile from TOML text and validate it
    pub fn from_toml(text: &str) -> Result<Self> {
        let profile: Self = toml::from_str(text)?;
        profile.validate()?;
        Ok(profile)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            BootImgError::Profile(format!("failed to read '{}': {}", path.display(), e))
        })?;
        Self::from_toml(&text)
    }

    /// Check that the page size can hold the header and the name fits its slot
    pub fn validate(&self) -> Result<()> {
        validate_page_size(self.page_size)?;
        if (self.page_size as usize) < HEADER_FIELDS_SIZE {
            return Err(BootImgError::InvalidPageSize(self.page_size));
        }
        if !self.name.is_ascii() {
            return Err(BootImgError::NonAscii { field: "image_name" });
        }
        if self.name.len() > NAME_SIZE {
            return Err(BootImgError::FieldTooLong {
                field: "image_name",
                len: self.name.len(),
                max: NAME_SIZE,
            });
        }
        Ok(())
    }
}

/// Page sizes must be non-zero powers of two
pub fn validate_page_size(page_size: u32) -> Result<()> {
    if !page_size.is_power_of_two() {
        return Err(BootImgError::InvalidPageSize(page_size));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_nezha() {
        let profile = BoardProfile::default();
        assert_eq!(profile.kernel_addr, 0x40200000);
        assert_eq!(profile.ramdisk_addr, 0x41200000);
        assert_eq!(profile.second_addr, 0x41100000);
        assert_eq!(profile.tags_addr, 0x40200100);
        assert_eq!(profile.page_size, 0x800);
        assert_eq!(profile.name, "d1-nezha");
        assert!(profile.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_override() {
        let profile = BoardProfile::from_toml("kernel_addr = 0x40400000\nname = \"custom\"").unwrap();
        assert_eq!(profile.kernel_addr, 0x40400000);
        assert_eq!(profile.name, "custom");
        assert_eq!(profile.page_size, PAGE_SIZE);
        assert_eq!(profile.tags_addr, TAGS_ADDR);
    }

    #[test]
    fn test_invalid_page_size() {
        assert!(matches!(
            BoardProfile::from_toml("page_size = 0x900"),
            Err(BootImgError::InvalidPageSize(0x900))
        ));
        // power of two but too small for the header
        assert!(matches!(
            BoardProfile::from_toml("page_size = 0x200"),
            Err(BootImgError::InvalidPageSize(0x200))
        ));
        assert!(BoardProfile::from_toml("page_size = 0x1000").is_ok());
    }

    #[test]
    fn test_name_too_long() {
        let err = BoardProfile::from_toml("name = \"a-very-long-board-name\"").unwrap_err();
        assert!(matches!(err, BootImgError::FieldTooLong { max: 16, .. }));
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(matches!(
            BoardProfile::from_toml("kernel_address = 1"),
            Err(BootImgError::Profile(_))
        ));
    }
}
