//! On-disk format codecs: Anvil region files in, Litematica containers out.

pub mod litematic;
pub mod region;
pub mod section;
