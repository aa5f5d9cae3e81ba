//! Beacon geometry.
//!
//! A beacon is a hollow cube drawn around the war flag: the cells sitting on
//! exactly one outer face form the solid body (repainted with each phase
//! material), the edges and corners form the wireframe shell, and the
//! interior is left untouched. Classification is purely combinatorial —
//! given the same origin and radius, the same sets come back every time.

use crate::region::{BlockPos, RegionId};

/// Side length of the beacon cube for a radius: `2r - 1`, always odd.
#[must_use]
pub fn side_length(radius: u32) -> i32 {
    #[allow(clippy::cast_possible_wrap)]
    let r = radius.max(1) as i32;
    2 * r - 1
}

/// Where a local coordinate triple falls within the beacon cube.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeaconPart {
    /// Exactly one coordinate on an outer face: the solid body.
    Body,
    /// Two or three coordinates on outer faces: an edge or corner.
    Wireframe,
    /// No coordinate on an outer face: interior, never drawn.
    Interior,
}

/// Classifies the local cell `(x, y, z)` of a cube with the given side
/// length by counting how many coordinates lie on an outer face.
#[must_use]
pub fn classify(side: i32, x: i32, y: i32, z: i32) -> BeaconPart {
    let edge = side - 1;
    let on_face = |v: i32| i32::from(v == 0 || v == edge);
    match on_face(x) + on_face(y) + on_face(z) {
        0 => BeaconPart::Interior,
        1 => BeaconPart::Body,
        _ => BeaconPart::Wireframe,
    }
}

/// The materialized beacon: disjoint body and wireframe position sets.
#[derive(Debug, Clone, Default)]
pub struct BeaconVolume {
    /// Solid-body cells, repainted with each phase material.
    pub body: Vec<BlockPos>,
    /// Wireframe edge and corner cells.
    pub wireframe: Vec<BlockPos>,
}

impl BeaconVolume {
    /// Returns `true` if `pos` belongs to either set.
    #[must_use]
    pub fn contains(&self, pos: &BlockPos) -> bool {
        self.body.contains(pos) || self.wireframe.contains(pos)
    }
}

/// Enumerates the cube of the given radius anchored at `origin`, skipping
/// cells the world already occupies so existing structures are never
/// overwritten.
pub fn build_volume(
    origin: &BlockPos,
    radius: u32,
    is_empty: impl Fn(&BlockPos) -> bool,
) -> BeaconVolume {
    let side = side_length(radius);
    let mut volume = BeaconVolume::default();
    for y in 0..side {
        for z in 0..side {
            for x in 0..side {
                let part = classify(side, x, y, z);
                if part == BeaconPart::Interior {
                    continue;
                }
                let pos = BlockPos::new(
                    origin.world.clone(),
                    origin.x + x,
                    origin.y + y,
                    origin.z + z,
                );
                if !is_empty(&pos) {
                    continue;
                }
                match part {
                    BeaconPart::Body => volume.body.push(pos),
                    BeaconPart::Wireframe => volume.wireframe.push(pos),
                    BeaconPart::Interior => unreachable!(),
                }
            }
        }
    }
    volume
}

/// Computes the minimum-corner origin of the beacon cube for a region.
///
/// The cube is centered on the region horizontally and floats
/// `max_height_above` blocks over the flag light, clamped so it still fits
/// under the world build height.
#[must_use]
pub fn origin_for(
    region: &RegionId,
    cell_size: u32,
    radius: u32,
    light_y: i32,
    max_height_above: i32,
    world_max_height: i32,
) -> BlockPos {
    #[allow(clippy::cast_possible_wrap)]
    let size = cell_size.max(1) as i32;
    #[allow(clippy::cast_possible_wrap)]
    let from_corner = size / 2 - (radius.max(1) as i32 - 1);
    let x = region.x * size + from_corner;
    let z = region.z * size + from_corner;
    let mut y = light_y + max_height_above;
    if y > world_max_height {
        y = world_max_height - side_length(radius);
    }
    BlockPos::new(region.world.clone(), x, y, z)
}
