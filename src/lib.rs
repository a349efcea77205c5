//! Lodestone scans Minecraft Java Edition save directories for configured
//! block types and turns the matches into structured records, clustered
//! portal summaries, and Litematica schematic exports.
//!
//! The pipeline: [`formats::region`] reads Anvil region files lazily,
//! [`formats::section`] normalizes both historical chunk layouts into
//! [`formats::section::SectionData`], [`search`] runs the palette-first
//! match over each section, [`cluster`] groups portal voxels into discrete
//! portals, and [`formats::litematic`] packs placements back into a
//! `.litematic` container. [`world::scan_world`] drives the whole thing
//! over a world directory.

pub mod block_location;
pub mod block_state;
pub mod cluster;
pub mod error;
pub mod formats;
pub mod packed_array;
pub mod search;
pub mod world;

pub use block_location::{BlockLocation, Dimension};
pub use block_state::BlockState;
pub use cluster::{cluster_portals, Portal, PortalAxis};
pub use error::{Error, Result};
pub use formats::litematic::{Schematic, SchematicRegion, TileEntity};
pub use formats::region::RegionFile;
pub use search::{MemorySink, RecordSink, SearchAccumulator, TargetSet};
pub use world::{scan_world, ScanOptions, ScanReport};
