//! Region and block position value types.
//!
//! A [`RegionId`] names one fixed-size cell of a world grid. Raw block
//! coordinates are mapped onto the grid by floor division, so negative
//! coordinates round toward negative infinity rather than toward zero.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of one grid cell: world name plus two cell coordinates.
///
/// Immutable after construction and used as the primary registry key.
/// Two regions are equal iff world, x, and z all match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegionId {
    /// Name of the world the cell belongs to.
    pub world: String,
    /// Cell x coordinate (already divided by the cell size).
    pub x: i32,
    /// Cell z coordinate (already divided by the cell size).
    pub z: i32,
}

impl RegionId {
    /// Creates a region from already-divided cell coordinates.
    #[must_use]
    pub fn new(world: impl Into<String>, x: i32, z: i32) -> Self {
        Self {
            world: world.into(),
            x,
            z,
        }
    }

    /// Parses raw block coordinates into a region.
    ///
    /// Uses floor division: raw `-1` with cell size `16` lands in cell `-1`,
    /// raw `15` in cell `0`, raw `16` in cell `1`.
    #[must_use]
    pub fn parse(world: impl Into<String>, raw_x: i32, raw_z: i32, cell_size: u32) -> Self {
        #[allow(clippy::cast_possible_wrap)]
        let size = cell_size.max(1) as i32;
        Self {
            world: world.into(),
            x: raw_x.div_euclid(size),
            z: raw_z.div_euclid(size),
        }
    }

    /// Parses the region containing a block position.
    #[must_use]
    pub fn containing(pos: &BlockPos, cell_size: u32) -> Self {
        Self::parse(pos.world.clone(), pos.x, pos.z, cell_size)
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {})", self.world, self.x, self.z)
    }
}

/// An absolute block position in a named world.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockPos {
    /// Name of the world the block belongs to.
    pub world: String,
    /// Block x coordinate.
    pub x: i32,
    /// Block y coordinate (vertical).
    pub y: i32,
    /// Block z coordinate.
    pub z: i32,
}

impl BlockPos {
    /// Creates a block position.
    #[must_use]
    pub fn new(world: impl Into<String>, x: i32, y: i32, z: i32) -> Self {
        Self {
            world: world.into(),
            x,
            y,
            z,
        }
    }

    /// Returns the position `dy` blocks directly above this one.
    #[must_use]
    pub fn above(&self, dy: i32) -> Self {
        Self {
            world: self.world.clone(),
            x: self.x,
            y: self.y + dy,
            z: self.z,
        }
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}, {}, {}]", self.world, self.x, self.y, self.z)
    }
}
