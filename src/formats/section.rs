//! Chunk NBT to section normalization.
//!
//! Two chunk layouts exist in the wild: the pre-1.18 shape wraps all chunk
//! fields in a `Level` compound with a `Sections` list of
//! `Palette`/`BlockStates` pairs, the flat shape keys `sections` at the root
//! with a nested `block_states` compound. All of that branching lives here;
//! downstream code only ever sees [`SectionData`].

use crate::block_state::BlockState;
use crate::{packed_array, Error, Result};
use quartz_nbt::{NbtCompound, NbtList, NbtTag};

/// Voxels per section edge.
pub const SECTION_EDGE: usize = 16;
/// Voxels per section (16^3).
pub const SECTION_VOLUME: usize = 4096;

/// One 16x16x16 section: signed altitude index, palette, and the raw
/// packed word array. `packed` is `None` when the format omitted it,
/// which is legal only for single-entry palettes (every voxel is entry 0).
#[derive(Debug, Clone)]
pub struct SectionData {
    pub y: i8,
    pub palette: Vec<BlockState>,
    pub packed: Option<Vec<i64>>,
}

impl SectionData {
    pub fn bits_per_entry(&self) -> usize {
        packed_array::section_bits_per_entry(self.palette.len())
    }

    /// Unpack the full 4096-entry index array. Callers on the search path
    /// must palette-filter first; this touches every packed word.
    pub fn unpack_indices(&self) -> Result<Vec<u16>> {
        match &self.packed {
            Some(words) => packed_array::unpack(words, self.bits_per_entry(), SECTION_VOLUME),
            None if self.palette.len() == 1 => Ok(vec![0; SECTION_VOLUME]),
            None => Err(Error::Decode(format!(
                "section y={} has {} palette entries but no packed data",
                self.y,
                self.palette.len()
            ))),
        }
    }

    /// Voxel iteration order is a format invariant: Y-major, then Z, then X.
    pub fn local_coords(index: usize) -> (usize, usize, usize) {
        let ly = index / 256;
        let lz = (index / SECTION_EDGE) % SECTION_EDGE;
        let lx = index % SECTION_EDGE;
        (lx, ly, lz)
    }
}

/// Decode every section of one chunk, normalizing both chunk layouts.
/// Sections without a palette carry no blocks and are not emitted.
pub fn decode_sections(chunk: &NbtCompound) -> Vec<SectionData> {
    let root = normalize_chunk_root(chunk);

    let section_list = match root
        .get::<_, &NbtList>("sections")
        .or_else(|_| root.get::<_, &NbtList>("Sections"))
    {
        Ok(list) => list,
        Err(_) => return Vec::new(),
    };

    let mut sections = Vec::new();
    for tag in section_list.iter() {
        let section_nbt = match tag {
            NbtTag::Compound(c) => c,
            _ => continue,
        };
        match decode_section(section_nbt) {
            Ok(Some(section)) => sections.push(section),
            Ok(None) => {}
            Err(e) => log::debug!("skipping malformed section: {}", e),
        }
    }
    sections
}

/// The legacy envelope is tried first; a chunk without one is its own root.
fn normalize_chunk_root(chunk: &NbtCompound) -> &NbtCompound {
    chunk.get::<_, &NbtCompound>("Level").unwrap_or(chunk)
}

fn decode_section(section_nbt: &NbtCompound) -> Result<Option<SectionData>> {
    let y = section_nbt
        .get::<_, i8>("Y")
        .map_err(|e| Error::Decode(format!("section without Y index: {}", e)))?;

    // Flat layout nests palette and data under block_states; the legacy
    // layout keys them directly on the section.
    let (palette_list, packed) = match section_nbt.get::<_, &NbtCompound>("block_states") {
        Ok(block_states) => (
            block_states.get::<_, &NbtList>("palette").ok(),
            block_states.get::<_, &[i64]>("data").ok(),
        ),
        Err(_) => (
            section_nbt.get::<_, &NbtList>("Palette").ok(),
            section_nbt.get::<_, &[i64]>("BlockStates").ok(),
        ),
    };

    let palette_list = match palette_list {
        Some(list) => list,
        // No palette, no blocks.
        None => return Ok(None),
    };

    let mut palette = Vec::with_capacity(palette_list.len());
    for tag in palette_list.iter() {
        if let NbtTag::Compound(compound) = tag {
            palette.push(BlockState::from_nbt(compound)?);
        }
    }
    if palette.is_empty() {
        return Ok(None);
    }

    Ok(Some(SectionData {
        y,
        palette,
        packed: packed.map(|words| words.to_vec()),
    }))
}
