//! Map-layer interface: coordinates, the integer distance metric, and world
//! bounds. The tile/map data structure itself lives outside this crate; the
//! routing engine only needs to measure distances and reject coordinates
//! that fall off the map.

use bevy::prelude::*;
use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// A map cell coordinate. Ordered (by `x`, then `y`) so it can key the
/// deterministic `BTreeMap`s used for waiting-cargo storage and coverage.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Encode, Decode,
)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance, the walking metric used throughout the engine.
    pub fn distance(self, other: Coord) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

/// World bounds, set once by the map layer when a world is created or
/// loaded. Destinations outside these bounds are unroutable by definition.
#[derive(Resource, Debug, Clone, Copy)]
pub struct MapBounds {
    pub width: i32,
    pub height: i32,
}

impl Default for MapBounds {
    fn default() -> Self {
        Self {
            width: 256,
            height: 256,
        }
    }
}

impl MapBounds {
    pub fn contains(&self, coord: Coord) -> bool {
        coord.x >= 0 && coord.y >= 0 && coord.x < self.width && coord.y < self.height
    }
}
