//! In-memory Anvil region file builder for integration tests.

use flate2::write::ZlibEncoder;
use flate2::Compression;
use lodestone::packed_array;
use lodestone::BlockState;
use quartz_nbt::io::Flavor;
use quartz_nbt::{NbtCompound, NbtList, NbtTag};
use std::io::Write;

const SECTOR_SIZE: usize = 4096;

/// Serialize chunks into a complete region file image. Each entry pairs
/// local chunk coordinates with the chunk's root compound.
pub fn build_region(chunks: &[((u32, u32), NbtCompound)]) -> Vec<u8> {
    let mut data = vec![0u8; SECTOR_SIZE * 2];
    let mut next_sector = 2usize;

    for ((cx, cz), chunk) in chunks {
        let mut raw = Vec::new();
        quartz_nbt::io::write_nbt(&mut raw, None, chunk, Flavor::Uncompressed).unwrap();
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&raw).unwrap();
        let compressed = encoder.finish().unwrap();

        let mut payload = Vec::with_capacity(5 + compressed.len());
        payload.extend_from_slice(&((compressed.len() as u32 + 1).to_be_bytes()));
        payload.push(2); // zlib
        payload.extend_from_slice(&compressed);
        let sectors = (payload.len() + SECTOR_SIZE - 1) / SECTOR_SIZE;
        payload.resize(sectors * SECTOR_SIZE, 0);

        let slot = (cx + cz * 32) as usize * 4;
        data[slot] = ((next_sector >> 16) & 0xff) as u8;
        data[slot + 1] = ((next_sector >> 8) & 0xff) as u8;
        data[slot + 2] = (next_sector & 0xff) as u8;
        data[slot + 3] = sectors as u8;

        data.extend_from_slice(&payload);
        next_sector += sectors;
    }
    data
}

/// A flat-layout (1.18+) section compound.
pub fn make_section(y: i8, palette: &[BlockState], indices: Option<&[u16]>) -> NbtCompound {
    let mut block_states = NbtCompound::new();
    block_states.insert(
        "palette",
        NbtTag::List(NbtList::from(
            palette.iter().map(|b| b.to_nbt()).collect::<Vec<NbtTag>>(),
        )),
    );
    if let Some(indices) = indices {
        let bits = packed_array::section_bits_per_entry(palette.len());
        block_states.insert(
            "data",
            NbtTag::LongArray(packed_array::pack(indices, bits)),
        );
    }

    let mut section = NbtCompound::new();
    section.insert("Y", NbtTag::Byte(y));
    section.insert("block_states", NbtTag::Compound(block_states));
    section
}

/// A flat-layout chunk root holding the given sections.
pub fn make_chunk(sections: Vec<NbtCompound>) -> NbtCompound {
    let mut chunk = NbtCompound::new();
    chunk.insert(
        "sections",
        NbtTag::List(NbtList::from(
            sections.into_iter().map(NbtTag::Compound).collect::<Vec<NbtTag>>(),
        )),
    );
    chunk.insert("DataVersion", NbtTag::Int(3700));
    chunk
}

/// Section voxel index for local coordinates (Y-major, then Z, then X).
pub fn voxel_index(lx: usize, ly: usize, lz: usize) -> usize {
    ly * 256 + lz * 16 + lx
}
