//! Portal clustering.
//!
//! Portal blocks are planar: a portal with `axis=x` extends along X and Y
//! with Z held constant, one with `axis=z` along Z and Y with X held
//! constant. Connected components are therefore found over face adjacency
//! in that 2D plane, never full 3D adjacency.

use crate::block_location::{BlockLocation, Dimension};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

/// Which horizontal axis a portal plane extends along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortalAxis {
    X,
    Z,
}

impl PortalAxis {
    fn from_property(value: Option<&str>) -> Self {
        // Absent orientation defaults to X, matching the block's default state.
        match value {
            Some("z") => PortalAxis::Z,
            _ => PortalAxis::X,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PortalAxis::X => "x",
            PortalAxis::Z => "z",
        }
    }
}

/// One clustered portal structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portal {
    pub dimension: Dimension,
    pub axis: PortalAxis,
    /// Minimum-coordinate corner of the bounding box.
    pub anchor: (i32, i32, i32),
    /// Extent along the varying horizontal axis.
    pub width: u32,
    /// Extent along Y.
    pub height: u32,
    pub block_count: usize,
    /// True geometric center; fractional for even extents.
    pub centroid: (f64, f64, f64),
}

/// Cluster portal voxels (a homogeneous, already-filtered set) into
/// discrete portals. Empty input yields an empty list.
pub fn cluster_portals(locations: &[BlockLocation]) -> Vec<Portal> {
    let mut groups: FxHashMap<(Dimension, PortalAxis), Vec<&BlockLocation>> = FxHashMap::default();
    for location in locations {
        let axis = PortalAxis::from_property(
            location.get_property("axis").map(|s| s.as_str()),
        );
        groups
            .entry((location.dimension, axis))
            .or_default()
            .push(location);
    }

    let mut portals = Vec::new();
    for ((dimension, axis), voxels) in groups {
        cluster_group(dimension, axis, &voxels, &mut portals);
    }
    // Deterministic output order regardless of hash iteration.
    portals.sort_by_key(|p| (p.dimension as u8, p.anchor));
    portals
}

fn cluster_group(
    dimension: Dimension,
    axis: PortalAxis,
    voxels: &[&BlockLocation],
    portals: &mut Vec<Portal>,
) {
    let occupied: FxHashSet<(i32, i32, i32)> =
        voxels.iter().map(|v| (v.x, v.y, v.z)).collect();
    let mut visited: FxHashSet<(i32, i32, i32)> = FxHashSet::default();

    for voxel in voxels {
        let start = (voxel.x, voxel.y, voxel.z);
        if visited.contains(&start) {
            continue;
        }

        // Flood fill one connected component.
        let mut component = Vec::new();
        let mut stack = vec![start];
        visited.insert(start);
        while let Some(pos) = stack.pop() {
            component.push(pos);
            for neighbor in neighbors(pos, axis) {
                if occupied.contains(&neighbor) && visited.insert(neighbor) {
                    stack.push(neighbor);
                }
            }
        }

        portals.push(build_portal(dimension, axis, &component));
    }
}

/// Face neighbors within the portal plane: the axis held constant by the
/// orientation is never stepped along.
fn neighbors(pos: (i32, i32, i32), axis: PortalAxis) -> [(i32, i32, i32); 4] {
    let (x, y, z) = pos;
    match axis {
        PortalAxis::X => [(x - 1, y, z), (x + 1, y, z), (x, y - 1, z), (x, y + 1, z)],
        PortalAxis::Z => [(x, y, z - 1), (x, y, z + 1), (x, y - 1, z), (x, y + 1, z)],
    }
}

fn build_portal(dimension: Dimension, axis: PortalAxis, component: &[(i32, i32, i32)]) -> Portal {
    let mut min = component[0];
    let mut max = component[0];
    for &(x, y, z) in component {
        min = (min.0.min(x), min.1.min(y), min.2.min(z));
        max = (max.0.max(x), max.1.max(y), max.2.max(z));
    }

    let width = match axis {
        PortalAxis::X => (max.0 - min.0 + 1) as u32,
        PortalAxis::Z => (max.2 - min.2 + 1) as u32,
    };
    let height = (max.1 - min.1 + 1) as u32;

    let half = |extent: u32| (extent as f64 - 1.0) / 2.0;
    let centroid = match axis {
        PortalAxis::X => (
            min.0 as f64 + half(width),
            min.1 as f64 + half(height),
            min.2 as f64,
        ),
        PortalAxis::Z => (
            min.0 as f64,
            min.1 as f64 + half(height),
            min.2 as f64 + half(width),
        ),
    };

    Portal {
        dimension,
        axis,
        anchor: min,
        width,
        height,
        block_count: component.len(),
        centroid,
    }
}
