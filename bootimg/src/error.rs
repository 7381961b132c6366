//! Error types for boot image operations

use thiserror::Error;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, BootImgError>;

/// Errors raised while building, parsing or transforming boot images
#[derive(Debug, Error)]
pub enum BootImgError {
    /// The input ends before a field or region that must be read
    #[error("not a valid boot image: need {needed} bytes, got {actual}")]
    InputTooShort { needed: usize, actual: usize },

    /// A fixed-width text field would overflow its slot
    #[error("{field} is {len} bytes long, the field holds at most {max}")]
    FieldTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    /// A text field contains bytes outside of ASCII
    #[error("{field} must be ASCII")]
    NonAscii { field: &'static str },

    /// The `.text` anchor could not be located in a raw kernel
    #[error("cannot find the .text fingerprint in the kernel image")]
    AnchorNotFound,

    /// A region does not fit the 32-bit size fields
    #[error("{region} is {size} bytes, larger than a boot image can describe")]
    PayloadTooLarge { region: &'static str, size: usize },

    #[error("invalid page size 0x{0:x}")]
    InvalidPageSize(u32),

    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// The stored id does not match the image contents
    #[error("id mismatch: header has {expected}, contents hash to {actual}")]
    DigestMismatch { expected: String, actual: String },

    #[error("board profile: {0}")]
    Profile(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BootImgError {
    pub fn too_short(needed: usize, actual: usize) -> Self {
        Self::InputTooShort { needed, actual }
    }

    pub fn invalid_header(msg: impl Into<String>) -> Self {
        Self::InvalidHeader(msg.into())
    }
}

impl From<toml::de::Error> for BootImgError {
    fn from(e: toml::de::Error) -> Self {
        Self::Profile(e.to_string())
    }
}
