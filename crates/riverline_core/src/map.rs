//! Battlefield map: tile grid, river, bridges, and deployment zones.
//!
//! The battlefield is a portrait-oriented tile grid split horizontally by
//! an impassable river band. Two fixed bridge corridors cross the band.
//! The opponent holds the low rows (north), the player the high rows
//! (south). World positions are continuous; tiles are discrete.

use serde::{Deserialize, Serialize};

use crate::entities::Side;
use crate::math::Vec2;

/// Axis-aligned tile rectangle, bounds inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneRect {
    /// Leftmost tile column.
    pub min_x: u32,
    /// Topmost tile row.
    pub min_y: u32,
    /// Rightmost tile column.
    pub max_x: u32,
    /// Bottommost tile row.
    pub max_y: u32,
}

impl ZoneRect {
    /// Create a new zone rectangle.
    #[must_use]
    pub const fn new(min_x: u32, min_y: u32, max_x: u32, max_y: u32) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Check whether a tile lies inside the zone.
    #[must_use]
    pub const fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }
}

/// Inclusive column span of a bridge corridor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeSpan {
    /// Leftmost walkable column.
    pub min_x: u32,
    /// Rightmost walkable column.
    pub max_x: u32,
}

impl BridgeSpan {
    /// Check whether a column falls inside the corridor.
    #[must_use]
    pub const fn contains(&self, x: u32) -> bool {
        x >= self.min_x && x <= self.max_x
    }
}

/// Which bank of the river a tile sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiverBank {
    /// Rows above the river band (opponent territory).
    North,
    /// Rows below the river band (player territory).
    South,
}

/// The battlefield map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BattleMap {
    /// Grid width in tiles.
    width: u32,
    /// Grid height in tiles.
    height: u32,
    /// Size of each tile in world units.
    tile_size: f32,
    /// First row of the river band (inclusive).
    river_top: u32,
    /// Last row of the river band (inclusive).
    river_bottom: u32,
    /// The two bridge corridors crossing the river.
    bridges: [BridgeSpan; 2],
    /// Player deployment zone.
    player_zone: ZoneRect,
    /// Player deployment zone with the expanded toggle on.
    player_zone_expanded: ZoneRect,
    /// Opponent deployment zone.
    opponent_zone: ZoneRect,
    /// Opponent deployment zone with the expanded toggle on.
    opponent_zone_expanded: ZoneRect,
}

impl Default for BattleMap {
    /// Standard 18x30 battlefield with a two-row river and two bridges.
    fn default() -> Self {
        Self {
            width: 18,
            height: 30,
            tile_size: 40.0,
            river_top: 14,
            river_bottom: 15,
            bridges: [BridgeSpan { min_x: 3, max_x: 4 }, BridgeSpan { min_x: 13, max_x: 14 }],
            player_zone: ZoneRect::new(0, 16, 17, 29),
            player_zone_expanded: ZoneRect::new(0, 10, 17, 29),
            opponent_zone: ZoneRect::new(0, 0, 17, 13),
            opponent_zone_expanded: ZoneRect::new(0, 0, 17, 19),
        }
    }
}

impl BattleMap {
    /// Replace the bridge corridors.
    ///
    /// Scenario and test setup hook; spans outside the grid leave the
    /// river uncrossable.
    #[must_use]
    pub fn with_bridges(mut self, bridges: [BridgeSpan; 2]) -> Self {
        self.bridges = bridges;
        self
    }

    /// Grid width in tiles.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Grid height in tiles.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Tile size in world units.
    #[must_use]
    pub const fn tile_size(&self) -> f32 {
        self.tile_size
    }

    /// Check if tile coordinates are within grid bounds.
    #[must_use]
    pub const fn in_bounds(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height
    }

    /// Convert a world position to tile coordinates.
    ///
    /// Returns `None` for positions outside the grid.
    #[must_use]
    pub fn world_to_tile(&self, pos: Vec2) -> Option<(u32, u32)> {
        if pos.x < 0.0 || pos.y < 0.0 {
            return None;
        }
        let x = (pos.x / self.tile_size) as u32;
        let y = (pos.y / self.tile_size) as u32;
        if self.in_bounds(x, y) {
            Some((x, y))
        } else {
            None
        }
    }

    /// Convert tile coordinates to a world position (tile center).
    #[must_use]
    pub fn tile_to_world(&self, x: u32, y: u32) -> Vec2 {
        Vec2::new(
            (x as f32 + 0.5) * self.tile_size,
            (y as f32 + 0.5) * self.tile_size,
        )
    }

    /// Walkability predicate: river-band tiles are impassable unless the
    /// column falls inside a bridge corridor.
    #[must_use]
    pub fn is_walkable(&self, x: u32, y: u32) -> bool {
        if !self.in_bounds(x, y) {
            return false;
        }
        if y >= self.river_top && y <= self.river_bottom {
            return self.bridges.iter().any(|b| b.contains(x));
        }
        true
    }

    /// Which bank a tile row sits on. `None` inside the river band.
    #[must_use]
    pub const fn bank_of(&self, y: u32) -> Option<RiverBank> {
        if y < self.river_top {
            Some(RiverBank::North)
        } else if y > self.river_bottom {
            Some(RiverBank::South)
        } else {
            None
        }
    }

    /// True when both positions lie on the same bank of the river.
    ///
    /// Positions inside the river band (on a bridge) never count as
    /// same-side, so movement through the band always goes to the
    /// pathfinder.
    #[must_use]
    pub fn same_side_of_river(&self, a: Vec2, b: Vec2) -> bool {
        let (Some((_, ay)), Some((_, by))) = (self.world_to_tile(a), self.world_to_tile(b)) else {
            return false;
        };
        match (self.bank_of(ay), self.bank_of(by)) {
            (Some(bank_a), Some(bank_b)) => bank_a == bank_b,
            _ => false,
        }
    }

    /// Deployment zone for a side, honoring the externally toggled
    /// expanded flag.
    #[must_use]
    pub const fn deploy_zone(&self, side: Side, expanded: bool) -> &ZoneRect {
        match (side, expanded) {
            (Side::Player, false) => &self.player_zone,
            (Side::Player, true) => &self.player_zone_expanded,
            (Side::Opponent, false) => &self.opponent_zone,
            (Side::Opponent, true) => &self.opponent_zone_expanded,
        }
    }

    /// Check whether a world position is a valid deployment spot for a side.
    #[must_use]
    pub fn is_valid_deployment(&self, side: Side, expanded: bool, pos: Vec2) -> bool {
        let Some((x, y)) = self.world_to_tile(pos) else {
            return false;
        };
        self.deploy_zone(side, expanded).contains(x, y) && self.is_walkable(x, y)
    }

    /// World position of a side's main tower in the standard layout.
    #[must_use]
    pub fn main_tower_position(&self, side: Side) -> Vec2 {
        let x = self.width / 2;
        match side {
            Side::Opponent => self.tile_to_world(x, 2),
            Side::Player => self.tile_to_world(x, self.height - 3),
        }
    }

    /// World positions of a side's two guard towers in the standard layout.
    #[must_use]
    pub fn guard_tower_positions(&self, side: Side) -> [Vec2; 2] {
        let (left, right) = (self.bridges[0].min_x, self.bridges[1].max_x);
        match side {
            Side::Opponent => [
                self.tile_to_world(left, 6),
                self.tile_to_world(right, 6),
            ],
            Side::Player => [
                self.tile_to_world(left, self.height - 7),
                self.tile_to_world(right, self.height - 7),
            ],
        }
    }
}
