use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt;
use std::hash::{Hash, Hasher};

/// One of the three vanilla dimensions, with its fixed region subpath
/// under the world root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dimension {
    Overworld,
    Nether,
    End,
}

impl Dimension {
    /// Logical name as it appears in configuration and output records.
    pub fn name(&self) -> &'static str {
        match self {
            Dimension::Overworld => "overworld",
            Dimension::Nether => "nether",
            Dimension::End => "end",
        }
    }

    /// Region directory relative to the world root.
    pub fn region_subpath(&self) -> &'static str {
        match self {
            Dimension::Overworld => "region",
            Dimension::Nether => "DIM-1/region",
            Dimension::End => "DIM1/region",
        }
    }

    /// Parse a configured dimension name. Unknown names yield `None`;
    /// the caller warns and skips rather than failing the run.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "overworld" | "minecraft:overworld" => Some(Dimension::Overworld),
            "nether" | "the_nether" | "minecraft:the_nether" => Some(Dimension::Nether),
            "end" | "the_end" | "minecraft:the_end" => Some(Dimension::End),
            _ => None,
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single matched voxel: the record shape the search core emits and
/// downstream sinks (persistence, export) accept.
///
/// Identity is `(block, dimension, x, y, z)` only; `properties` and
/// `source_file` are metadata and take no part in `Eq`/`Hash`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockLocation {
    pub block: SmolStr,
    pub dimension: Dimension,
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub properties: Vec<(SmolStr, SmolStr)>,
    pub source_file: SmolStr,
}

impl BlockLocation {
    pub fn get_property(&self, key: &str) -> Option<&SmolStr> {
        for (k, v) in &self.properties {
            if k == key {
                return Some(v);
            }
        }
        None
    }
}

impl PartialEq for BlockLocation {
    fn eq(&self, other: &Self) -> bool {
        self.block == other.block
            && self.dimension == other.dimension
            && self.x == other.x
            && self.y == other.y
            && self.z == other.z
    }
}

impl Eq for BlockLocation {}

impl Hash for BlockLocation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.block.hash(state);
        self.dimension.hash(state);
        self.x.hash(state);
        self.y.hash(state);
        self.z.hash(state);
    }
}

impl fmt::Display for BlockLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} @ {} ({}, {}, {})",
            self.block, self.dimension, self.x, self.y, self.z
        )
    }
}
