//! # Riverline Core
//!
//! Real-time battle simulation engine for Riverline.
//!
//! This crate contains **only** simulation logic:
//! - No rendering
//! - No IO beyond optional RON catalog loading
//! - No wall-clock reads (the frame clock is injected)
//! - No global randomness (a seeded RNG lives in the session)
//!
//! The excluded collaborators - scene lifecycle, sprite drawing, UI,
//! sound playback, persistence - talk to the core through the
//! [`session::BattleSession`] boundary: they inject the clock and
//! deployments, and consume the per-tick [`events::BattleEvent`] stream
//! and [`stats::BattleStats`] counters.
//!
//! ## Crate Structure
//!
//! - [`map`] - battlefield grid, river, bridges, deployment zones
//! - [`pathfinding`] - bounded A* over 4-connected tiles
//! - [`targeting`] - per-unit acquisition/retention state machine
//! - [`combat`] - fire gating, projectiles, armor-penetration damage
//! - [`ai`] - opponent strategy, unit choice, placement scoring
//! - [`session`] - tick orchestration and entity ownership

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod ai;
pub mod catalog;
pub mod combat;
pub mod entities;
pub mod error;
pub mod events;
pub mod map;
pub mod math;
pub mod pathfinding;
pub mod session;
pub mod stats;
pub mod targeting;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::ai::{DeploymentRequest, OpponentCommander, StrategyMode, StrategyState};
    pub use crate::catalog::{Armor, TowerTuning, UnitCatalog, UnitKind, UnitSpec};
    pub use crate::combat::{penetration_ratio, resolve_damage, CombatResolver, Projectile};
    pub use crate::entities::{Building, BuildingRole, Side, TargetRef, Unit, World};
    pub use crate::error::{BattleError, Result};
    pub use crate::events::{BattleEvent, MatchOutcome, TickEvents};
    pub use crate::map::BattleMap;
    pub use crate::math::Vec2;
    pub use crate::pathfinding::{find_path, plan_route, PathfinderConfig};
    pub use crate::session::{BattleSession, SessionConfig};
    pub use crate::stats::{BattleStats, SideStats};
}
