//! Android legacy (version 0) boot image header

use crate::digest::ID_SIZE;
use crate::error::{BootImgError, Result};
use crate::profile::BoardProfile;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::Serialize;
use std::fmt;
use std::io::{Cursor, Read, Write};

pub const BOOT_MAGIC: &[u8; MAGIC_SIZE] = b"ANDROID!";
pub const MAGIC_SIZE: usize = 8;
pub const NAME_SIZE: usize = 16;
pub const CMDLINE_SIZE: usize = 512;
const RESERVED_SIZE: usize = 8;

/// Bytes occupied by the header fields, before page padding
pub const HEADER_FIELDS_SIZE: usize =
    MAGIC_SIZE + 8 * 4 + RESERVED_SIZE + NAME_SIZE + CMDLINE_SIZE + ID_SIZE;

/// Boot image header, field for field as laid out on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootImgHeader {
    pub magic: [u8; MAGIC_SIZE],
    pub kernel_size: u32,
    pub kernel_addr: u32,
    pub ramdisk_size: u32,
    pub ramdisk_addr: u32,
    pub second_size: u32,
    pub second_addr: u32,
    pub tags_addr: u32,
    pub page_size: u32,
    pub name: [u8; NAME_SIZE],
    pub cmdline: [u8; CMDLINE_SIZE],
    pub id: [u8; ID_SIZE],
}

impl BootImgHeader {
    /// Empty header carrying the addresses and name of `profile`
    pub fn new(profile: &BoardProfile) -> Result<Self> {
        let mut header = Self {
            magic: *BOOT_MAGIC,
            kernel_size: 0,
            kernel_addr: profile.kernel_addr,
            ramdisk_size: 0,
            ramdisk_addr: profile.ramdisk_addr,
            second_size: 0,
            second_addr: profile.second_addr,
            tags_addr: profile.tags_addr,
            page_size: profile.page_size,
            name: [0; NAME_SIZE],
            cmdline: [0; CMDLINE_SIZE],
            id: [0; ID_SIZE],
        };
        header.set_name(&profile.name)?;
        Ok(header)
    }

    pub fn set_name(&mut self, name: &str) -> Result<()> {
        self.name = text_field("image_name", name)?;
        Ok(())
    }

    /// Set the kernel command line.
    ///
    /// Fails when the line is not ASCII or longer than [`CMDLINE_SIZE`].
    pub fn set_cmdline(&mut self, cmdline: &str) -> Result<()> {
        self.cmdline = text_field("cmdline", cmdline)?;
        Ok(())
    }

    pub fn has_valid_magic(&self) -> bool {
        &self.magic == BOOT_MAGIC
    }

    pub fn name_str(&self) -> String {
        display_text(&self.name)
    }

    pub fn cmdline_str(&self) -> String {
        display_text(&self.cmdline)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::with_capacity(HEADER_FIELDS_SIZE);
        self.write_to(&mut buffer)?;
        Ok(buffer)
    }

    /// Write the header fields, without page padding
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.magic)?;
        writer.write_u32::<LittleEndian>(self.kernel_size)?;
        writer.write_u32::<LittleEndian>(self.kernel_addr)?;
        writer.write_u32::<LittleEndian>(self.ramdisk_size)?;
        writer.write_u32::<LittleEndian>(self.ramdisk_addr)?;
        writer.write_u32::<LittleEndian>(self.second_size)?;
        writer.write_u32::<LittleEndian>(self.second_addr)?;
        writer.write_u32::<LittleEndian>(self.tags_addr)?;
        writer.write_u32::<LittleEndian>(self.page_size)?;
        writer.write_all(&[0u8; RESERVED_SIZE])?;
        writer.write_all(&self.name)?;
        writer.write_all(&self.cmdline)?;
        writer.write_all(&self.id)?;
        Ok(())
    }

    /// Parse the header at the start of `data`.
    ///
    /// Only the length is checked; the magic and field values are reported
    /// as found.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_FIELDS_SIZE {
            return Err(BootImgError::too_short(HEADER_FIELDS_SIZE, data.len()));
        }

        let mut cursor = Cursor::new(data);

        let mut magic = [0u8; MAGIC_SIZE];
        cursor.read_exact(&mut magic)?;
        let kernel_size = cursor.read_u32::<LittleEndian>()?;
        let kernel_addr = cursor.read_u32::<LittleEndian>()?;
        let ramdisk_size = cursor.read_u32::<LittleEndian>()?;
        let ramdisk_addr = cursor.read_u32::<LittleEndian>()?;
        let second_size = cursor.read_u32::<LittleEndian>()?;
        let second_addr = cursor.read_u32::<LittleEndian>()?;
        let tags_addr = cursor.read_u32::<LittleEndian>()?;
        let page_size = cursor.read_u32::<LittleEndian>()?;

        let mut reserved = [0u8; RESERVED_SIZE];
        cursor.read_exact(&mut reserved)?;

        let mut name = [0u8; NAME_SIZE];
        cursor.read_exact(&mut name)?;
        let mut cmdline = [0u8; CMDLINE_SIZE];
        cursor.read_exact(&mut cmdline)?;
        let mut id = [0u8; ID_SIZE];
        cursor.read_exact(&mut id)?;

        Ok(Self {
            magic,
            kernel_size,
            kernel_addr,
            ramdisk_size,
            ramdisk_addr,
            second_size,
            second_addr,
            tags_addr,
            page_size,
            name,
            cmdline,
            id,
        })
    }

    pub fn report(&self) -> HeaderReport {
        HeaderReport {
            magic: display_text(&self.magic),
            kernel_size: self.kernel_size,
            kernel_addr: self.kernel_addr,
            ramdisk_size: self.ramdisk_size,
            ramdisk_addr: self.ramdisk_addr,
            second_size: self.second_size,
            second_addr: self.second_addr,
            tags_addr: self.tags_addr,
            page_size: self.page_size,
            image_name: self.name_str(),
            cmdline: self.cmdline_str(),
            id: hex::encode(self.id),
        }
    }
}

/// Printable view of a header, as shown by `dump`
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct HeaderReport {
    pub magic: String,
    pub kernel_size: u32,
    pub kernel_addr: u32,
    pub ramdisk_size: u32,
    pub ramdisk_addr: u32,
    pub second_size: u32,
    pub second_addr: u32,
    pub tags_addr: u32,
    pub page_size: u32,
    pub image_name: String,
    pub cmdline: String,
    pub id: String,
}

impl fmt::Display for HeaderReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  magic:        '{}'", self.magic)?;
        writeln!(f, "  kernel_size:  0x{:08x}", self.kernel_size)?;
        writeln!(f, "  kernel_addr:  0x{:08x}", self.kernel_addr)?;
        writeln!(f, "  ramdisk_size: 0x{:08x}", self.ramdisk_size)?;
        writeln!(f, "  ramdisk_addr: 0x{:08x}", self.ramdisk_addr)?;
        writeln!(f, "  second_size:  0x{:08x}", self.second_size)?;
        writeln!(f, "  second_addr:  0x{:08x}", self.second_addr)?;
        writeln!(f, "  tags_addr:    0x{:08x}", self.tags_addr)?;
        writeln!(f, "  page_size:    0x{:08x}", self.page_size)?;
        writeln!(f, "  image_name:   '{}'", self.image_name)?;
        writeln!(f, "  cmdline:      '{}'", self.cmdline)?;
        write!(f, "  id:           {}", self.id)
    }
}

/// Copy `value` into a NUL padded fixed-width field
fn text_field<const N: usize>(field: &'static str, value: &str) -> Result<[u8; N]> {
    if !value.is_ascii() {
        return Err(BootImgError::NonAscii { field });
    }
    if value.len() > N {
        return Err(BootImgError::FieldTooLong {
            field,
            len: value.len(),
            max: N,
        });
    }
    let mut out = [0u8; N];
    out[..value.len()].copy_from_slice(value.as_bytes());
    Ok(out)
}

/// ASCII text up to the first NUL; other bytes are dropped
fn display_text(bytes: &[u8]) -> String {
    bytes
        .iter()
        .take_while(|&&b| b != 0)
        .filter(|b| b.is_ascii())
        .map(|&b| b as char)
        .collect()
}
