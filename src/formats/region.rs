//! Anvil region file access.
//!
//! A region file covers a 32x32 chunk area: an 8 KiB header (4 KiB location
//! table, 4 KiB timestamp table) followed by 4 KiB-aligned chunk sectors.
//! Chunks are read lazily per slot so a scan touching few chunks never
//! decompresses the rest.

use crate::{Error, Result};
use flate2::read::{GzDecoder, ZlibDecoder};
use quartz_nbt::io::Flavor;
use quartz_nbt::NbtCompound;
use smol_str::SmolStr;
use std::io::{Cursor, Read};
use std::path::Path;

const SECTOR_SIZE: usize = 4096;
const HEADER_SIZE: usize = SECTOR_SIZE * 2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CompressionType {
    Gzip = 1,
    Zlib = 2,
    Uncompressed = 3,
}

impl CompressionType {
    pub fn from_byte(b: u8) -> Result<Self> {
        match b {
            1 => Ok(CompressionType::Gzip),
            2 => Ok(CompressionType::Zlib),
            3 => Ok(CompressionType::Uncompressed),
            4 => Err(Error::Format(
                "LZ4 compression (type 4) is not supported".to_string(),
            )),
            _ => Err(Error::Format(format!("unknown compression type: {}", b))),
        }
    }
}

/// One open region file, addressed by local chunk coordinates.
pub struct RegionFile {
    data: Vec<u8>,
    pub region_x: i32,
    pub region_z: i32,
    /// File name the records sourced from this region carry as metadata.
    pub source: SmolStr,
}

impl RegionFile {
    pub fn open(path: &Path) -> Result<Self> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::Format(format!("not a region file path: {}", path.display())))?;
        let (region_x, region_z) = parse_region_filename(file_name).ok_or_else(|| {
            Error::Format(format!("region file name not r.<x>.<z>.mca: {}", file_name))
        })?;

        let data = std::fs::read(path)?;
        Self::from_bytes(data, region_x, region_z, file_name.into())
    }

    pub fn from_bytes(data: Vec<u8>, region_x: i32, region_z: i32, source: SmolStr) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(Error::Format(format!(
                "region file too small ({} bytes, header needs {})",
                data.len(),
                HEADER_SIZE
            )));
        }
        Ok(RegionFile {
            data,
            region_x,
            region_z,
            source,
        })
    }

    /// Parse the chunk at local `(cx, cz)`. An absent slot yields
    /// `Ok(None)`; a present but unreadable slot is an error for that
    /// chunk only.
    pub fn chunk(&self, cx: u32, cz: u32) -> Result<Option<NbtCompound>> {
        debug_assert!(cx < 32 && cz < 32);
        let slot = (cx + cz * 32) as usize;
        let entry = slot * 4;

        let offset = ((self.data[entry] as usize) << 16)
            | ((self.data[entry + 1] as usize) << 8)
            | (self.data[entry + 2] as usize);
        let sector_count = self.data[entry + 3] as usize;

        if offset < 2 || sector_count == 0 {
            return Ok(None);
        }

        let byte_offset = offset * SECTOR_SIZE;
        if byte_offset + 5 > self.data.len() {
            return Err(Error::Format(format!(
                "chunk ({}, {}) offset {} beyond end of file",
                cx, cz, byte_offset
            )));
        }

        let length = u32::from_be_bytes([
            self.data[byte_offset],
            self.data[byte_offset + 1],
            self.data[byte_offset + 2],
            self.data[byte_offset + 3],
        ]) as usize;
        if length <= 1 {
            return Ok(None);
        }

        let compression = CompressionType::from_byte(self.data[byte_offset + 4])?;

        let payload_start = byte_offset + 5;
        let payload_len = length - 1;
        if payload_start + payload_len > self.data.len() {
            return Err(Error::Format(format!(
                "chunk ({}, {}) payload truncated ({} bytes past end)",
                cx,
                cz,
                payload_start + payload_len - self.data.len()
            )));
        }

        let payload = &self.data[payload_start..payload_start + payload_len];
        let decompressed = decompress_chunk(payload, compression)?;

        let (nbt, _) = quartz_nbt::io::read_nbt(&mut Cursor::new(&decompressed), Flavor::Uncompressed)?;
        Ok(Some(nbt))
    }

    /// World-space coordinates of the chunk column at local `(cx, cz)`.
    pub fn chunk_origin(&self, cx: u32, cz: u32) -> (i32, i32) {
        (
            self.region_x * 512 + cx as i32 * 16,
            self.region_z * 512 + cz as i32 * 16,
        )
    }
}

fn decompress_chunk(data: &[u8], compression: CompressionType) -> Result<Vec<u8>> {
    let mut decompressed = Vec::new();
    match compression {
        CompressionType::Zlib => {
            let mut decoder = ZlibDecoder::new(data);
            decoder.read_to_end(&mut decompressed)?;
        }
        CompressionType::Gzip => {
            let mut decoder = GzDecoder::new(data);
            decoder.read_to_end(&mut decompressed)?;
        }
        CompressionType::Uncompressed => {
            decompressed = data.to_vec();
        }
    }
    Ok(decompressed)
}

/// Parse `r.<x>.<z>.mca` into signed region coordinates.
pub fn parse_region_filename(name: &str) -> Option<(i32, i32)> {
    let basename = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let parts: Vec<&str> = basename.split('.').collect();
    if parts.len() == 4 && parts[0] == "r" && parts[3] == "mca" {
        let x = parts[1].parse::<i32>().ok()?;
        let z = parts[2].parse::<i32>().ok()?;
        Some((x, z))
    } else {
        None
    }
}
