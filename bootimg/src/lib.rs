//! # nezha-bootimg
//!
//! Builds, dumps and extracts Android legacy boot images for the Allwinner
//! D1 Nezha RISC-V board.
//!
//! A boot image is a page-aligned header followed by the page-aligned
//! kernel. The header carries the load addresses, the kernel command line
//! and a SHA-1 id over the packed regions.
//!
//! ## Example
//!
//! ```rust
//! use nezha_bootimg::{BootImage, BootImageBuilder, ZImageMode, build_zimage};
//!
//! let vmlinux = vec![0x6fu8; 64];
//! let zimage = build_zimage(&vmlinux, ZImageMode::Patch)?;
//!
//! let image = BootImageBuilder::new()
//!     .cmdline("console=ttyS0,115200")
//!     .kernel(zimage.clone())
//!     .build()?;
//!
//! let parsed = BootImage::parse(&image)?;
//! assert_eq!(parsed.extract_kernel()?, zimage);
//! # Ok::<(), nezha_bootimg::BootImgError>(())
//! ```

pub mod builder;
pub mod bytes;
pub mod cli;
pub mod digest;
pub mod error;
pub mod header;
pub mod profile;
pub mod zimage;

pub use builder::{BootImage, BootImageBuilder};
pub use bytes::{align, read_le32, write_le32};
pub use digest::compute_id;
pub use error::{BootImgError, Result};
pub use header::{BOOT_MAGIC, BootImgHeader, HEADER_FIELDS_SIZE, HeaderReport};
pub use profile::BoardProfile;
pub use zimage::{ZImageMode, build_zimage};

/// Current version of the tool
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
