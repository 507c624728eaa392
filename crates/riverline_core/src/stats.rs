//! Per-side battle statistics.
//!
//! Accumulated by the combat resolver, read by external UI and result
//! screens. The core only ever increments; nothing in the simulation
//! consumes these numbers.

use serde::{Deserialize, Serialize};

use crate::entities::Side;

/// Cumulative counters for one side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideStats {
    /// Projectiles fired.
    pub shots_fired: u32,
    /// Projectiles that arrived on a live target.
    pub shots_hit: u32,
    /// Total damage dealt to enemy entities.
    pub damage_dealt: u64,
    /// Total damage received.
    pub damage_taken: u64,
    /// Hits with a penetration ratio of at least 0.8.
    pub critical_hits: u32,
    /// Damage dealt to enemy buildings.
    pub building_damage: u64,
    /// Enemy units destroyed.
    pub units_destroyed: u32,
    /// Own units lost.
    pub units_lost: u32,
}

/// Statistics for both sides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleStats {
    /// Player-side counters.
    pub player: SideStats,
    /// Opponent-side counters.
    pub opponent: SideStats,
}

impl BattleStats {
    /// Counters for a side.
    #[must_use]
    pub const fn side(&self, side: Side) -> &SideStats {
        match side {
            Side::Player => &self.player,
            Side::Opponent => &self.opponent,
        }
    }

    /// Mutable counters for a side.
    pub fn side_mut(&mut self, side: Side) -> &mut SideStats {
        match side {
            Side::Player => &mut self.player,
            Side::Opponent => &mut self.opponent,
        }
    }
}
