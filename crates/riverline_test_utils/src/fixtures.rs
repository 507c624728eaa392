//! Test fixtures and helpers.
//!
//! Pre-built sessions, worlds, and entity spawners for consistent
//! testing across crates.

use riverline_core::prelude::*;

/// A default-map session with a fixed seed.
///
/// # Panics
///
/// Panics when the default configuration is invalid, which would be a
/// bug in the defaults themselves.
#[must_use]
pub fn seeded_session(seed: u64) -> BattleSession {
    let config = SessionConfig {
        seed,
        ..SessionConfig::default()
    };
    BattleSession::with_defaults(config).expect("default session config must be valid")
}

/// A session with a short match clock for timeout tests.
///
/// # Panics
///
/// Panics when the configuration is invalid.
#[must_use]
pub fn short_session(seed: u64, match_duration_ms: u64) -> BattleSession {
    let config = SessionConfig {
        seed,
        match_duration_ms,
        ..SessionConfig::default()
    };
    BattleSession::with_defaults(config).expect("short session config must be valid")
}

/// Spawn a catalog-stated unit directly into a world.
///
/// # Panics
///
/// Panics when the default catalog has no entry for the kind.
pub fn spawn_unit_at(world: &mut World, side: Side, kind: UnitKind, position: Vec2) -> u64 {
    let spec = *UnitCatalog::default()
        .get(kind)
        .expect("default catalog is complete");
    world.spawn_unit(side, kind, spec, position)
}

/// A bare world holding only the two main towers of the default map.
#[must_use]
pub fn towers_only_world() -> World {
    let map = BattleMap::default();
    let mut world = World::new();
    for side in [Side::Player, Side::Opponent] {
        world.spawn_building(
            side,
            BuildingRole::MainTower,
            map.main_tower_position(side),
            2600,
            240.0,
        );
    }
    world
}
