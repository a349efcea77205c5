//! Palette-first block search.
//!
//! The performance property of the whole scanner lives here: a section whose
//! palette contains no target name is dismissed before any packed word is
//! unpacked, which for a typical ore search skips well over 99% of sections.

use crate::block_location::{BlockLocation, Dimension};
use crate::block_state::BlockState;
use crate::formats::section::{SectionData, SECTION_VOLUME};
use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;

/// Normalized set of target block ids.
#[derive(Debug, Clone)]
pub struct TargetSet {
    names: FxHashSet<SmolStr>,
}

impl TargetSet {
    /// Build a target set, coercing bare ids into the `minecraft:`
    /// namespace so `diamond_ore` and `minecraft:diamond_ore` match the
    /// same palette entries.
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names = ids
            .into_iter()
            .map(|id| normalize_block_id(id.as_ref()))
            .collect();
        TargetSet { names }
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }
}

pub fn normalize_block_id(id: &str) -> SmolStr {
    if id.contains(':') {
        id.into()
    } else {
        SmolStr::from(format!("minecraft:{}", id))
    }
}

/// Consumer of matched records. The search core stays agnostic to what
/// happens to a record once accepted (buffered, persisted, streamed).
pub trait RecordSink {
    fn accept(&mut self, record: BlockLocation);
}

/// Sink buffering everything in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub records: Vec<BlockLocation>,
}

impl RecordSink for MemorySink {
    fn accept(&mut self, record: BlockLocation) {
        self.records.push(record);
    }
}

/// Per-search dedup state, passed through the pipeline by the caller.
/// First occurrence of an identity wins; later duplicates are dropped
/// silently.
#[derive(Debug, Default)]
pub struct SearchAccumulator {
    seen: FxHashSet<BlockLocation>,
    pub duplicates_dropped: usize,
}

impl SearchAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forward `record` to the sink unless its identity was already seen.
    pub fn emit(&mut self, record: BlockLocation, sink: &mut dyn RecordSink) {
        if self.seen.insert(record.clone()) {
            sink.accept(record);
        } else {
            self.duplicates_dropped += 1;
        }
    }

    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }
}

/// Where a section sits in the world, for resolving absolute coordinates.
#[derive(Debug, Clone)]
pub struct SectionOrigin {
    pub dimension: Dimension,
    /// World-space X/Z of the owning chunk column's minimum corner.
    pub base_x: i32,
    pub base_z: i32,
    pub source: SmolStr,
}

/// What became of one section during search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionOutcome {
    /// Palette contained no target name; packed data untouched.
    SkippedByPalette,
    /// Section decoded, `n` matches emitted (post-dedup count not included).
    Matched(usize),
    /// Packed data missing or truncated; section contributed nothing.
    DecodeFailed,
}

/// Search one decoded section for target blocks.
pub fn search_section(
    targets: &TargetSet,
    section: &SectionData,
    origin: &SectionOrigin,
    accumulator: &mut SearchAccumulator,
    sink: &mut dyn RecordSink,
) -> SectionOutcome {
    // Palette-first: bail before any bit arithmetic when nothing can match.
    let mut matching: FxHashMap<u16, &BlockState> = FxHashMap::default();
    for (index, entry) in section.palette.iter().enumerate() {
        if targets.contains(&entry.name) {
            matching.insert(index as u16, entry);
        }
    }
    if matching.is_empty() {
        return SectionOutcome::SkippedByPalette;
    }

    let base_y = section.y as i32 * 16;

    // Uniform section of a single matching entry: all 4096 voxels match,
    // no packed array involved.
    if section.palette.len() == 1 {
        let entry = &section.palette[0];
        for index in 0..SECTION_VOLUME {
            let (lx, ly, lz) = SectionData::local_coords(index);
            emit_match(entry, origin, base_y, lx, ly, lz, accumulator, sink);
        }
        return SectionOutcome::Matched(SECTION_VOLUME);
    }

    let indices = match section.unpack_indices() {
        Ok(indices) => indices,
        Err(e) => {
            log::warn!(
                "section y={} in {}: {}",
                section.y,
                origin.source,
                e
            );
            return SectionOutcome::DecodeFailed;
        }
    };

    let mut matched = 0;
    for (index, palette_index) in indices.iter().enumerate() {
        if let Some(entry) = matching.get(palette_index) {
            let (lx, ly, lz) = SectionData::local_coords(index);
            emit_match(entry, origin, base_y, lx, ly, lz, accumulator, sink);
            matched += 1;
        }
    }
    SectionOutcome::Matched(matched)
}

#[allow(clippy::too_many_arguments)]
fn emit_match(
    entry: &BlockState,
    origin: &SectionOrigin,
    base_y: i32,
    lx: usize,
    ly: usize,
    lz: usize,
    accumulator: &mut SearchAccumulator,
    sink: &mut dyn RecordSink,
) {
    let record = BlockLocation {
        block: entry.name.clone(),
        dimension: origin.dimension,
        x: origin.base_x + lx as i32,
        y: base_y + ly as i32,
        z: origin.base_z + lz as i32,
        properties: entry.properties.clone(),
        source_file: origin.source.clone(),
    };
    accumulator.emit(record, sink);
}
