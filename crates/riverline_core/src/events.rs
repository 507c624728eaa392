//! Outbound events generated during a simulation tick.
//!
//! These are the core's boundary toward the excluded collaborators:
//! visual effects, audio cues, UI, and scene transitions all key off
//! this stream. Every event is fire-and-forget; the core consumes no
//! return values.

use serde::{Deserialize, Serialize};

use crate::catalog::UnitKind;
use crate::entities::{BuildingId, Side, TargetRef, UnitId};
use crate::math::Vec2;

/// How a match ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchOutcome {
    /// One side destroyed the other's main tower, or led on tower health
    /// at the timeout.
    Victory(Side),
    /// Equal main-tower health at the timeout.
    Draw,
}

/// A single event emitted by [`crate::session::BattleSession::tick`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BattleEvent {
    /// A projectile left the barrel. Drives muzzle flash and fire audio.
    ProjectileSpawned {
        /// Firing side.
        side: Side,
        /// Barrel position.
        origin: Vec2,
        /// Intended victim.
        target: TargetRef,
        /// Flight duration in milliseconds.
        travel_time_ms: u64,
    },
    /// A projectile arrived on a live target. Drives explosion effects
    /// and damage numbers.
    ProjectileHit {
        /// Victim.
        target: TargetRef,
        /// Impact position.
        position: Vec2,
        /// Damage applied after the armor formula.
        damage: u32,
        /// Penetration ratio reached the critical threshold.
        critical: bool,
    },
    /// The target vanished mid-flight; the projectile fizzled.
    ShotMissed {
        /// The stale reference.
        target: TargetRef,
    },
    /// A unit was destroyed.
    UnitDestroyed {
        /// The unit that died.
        unit: UnitId,
        /// Its owning side.
        side: Side,
    },
    /// A building was destroyed. `tower` distinguishes the win/loss path
    /// from cosmetic removal of a support structure.
    BuildingDestroyed {
        /// The building that fell.
        building: BuildingId,
        /// Its owning side.
        side: Side,
        /// Whether it was a capturable objective.
        tower: bool,
    },
    /// A dormant main tower took its first damage. Fired exactly once
    /// per tower.
    MainTowerActivated {
        /// The tower.
        building: BuildingId,
        /// Its owning side.
        side: Side,
    },
    /// The opponent decision engine wants a unit on the field.
    DeploymentRequested {
        /// Requesting side.
        side: Side,
        /// Chosen unit kind.
        kind: UnitKind,
        /// Chosen world position.
        position: Vec2,
    },
    /// A deployment was carried out and the unit exists.
    UnitDeployed {
        /// The new unit.
        unit: UnitId,
        /// Its owning side.
        side: Side,
        /// Its kind.
        kind: UnitKind,
    },
    /// The match is over; no further ticks mutate the world.
    MatchEnded {
        /// Final outcome.
        outcome: MatchOutcome,
    },
}

/// Events produced by one tick, in emission order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickEvents {
    /// The event stream for this tick.
    pub events: Vec<BattleEvent>,
}

impl TickEvents {
    /// Append an event.
    pub fn push(&mut self, event: BattleEvent) {
        self.events.push(event);
    }

    /// Whether this tick ended the match.
    #[must_use]
    pub fn match_ended(&self) -> bool {
        self.events
            .iter()
            .any(|e| matches!(e, BattleEvent::MatchEnded { .. }))
    }

    /// Iterate the events.
    pub fn iter(&self) -> impl Iterator<Item = &BattleEvent> {
        self.events.iter()
    }
}
