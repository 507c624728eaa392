//! Per-unit target acquisition and retention.
//!
//! Evaluated once per unit per tick, before any combat resolution. The
//! engine only mutates targeting state and flags path needs; it never
//! calls the pathfinder and never adds or removes entities.
//!
//! Retention rule: an acquired target is kept exactly as long as it is
//! alive and within attack range. Any other condition forces
//! reacquisition the same tick.

use crate::entities::{Side, TargetRef, Unit, World};

/// Radius inside which opponent-side units prefer buildings.
pub const BUILDING_PRIORITY_RADIUS: f32 = 150.0;

/// Effective-distance reduction for near buildings on the opponent side.
///
/// Deliberately asymmetric: player-side selection is pure
/// nearest-candidate. A far enemy tank can still out-rank a near building
/// when the true-distance gap exceeds the bonus.
pub const BUILDING_PRIORITY_BONUS: f32 = 50.0;

/// Outcome of one targeting evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Decision {
    /// Current target is alive and in range; keep shooting it.
    Retain,
    /// Switch to this target and attack in place.
    AttackNew(TargetRef),
    /// Move toward this fallback target; a fresh path is needed.
    MoveToward(TargetRef),
    /// No candidates exist; idle.
    Idle,
}

/// Run the targeting state machine for every live unit.
///
/// Stunned units are skipped entirely; their state thaws unchanged when
/// the stun expires.
pub fn update_unit_targets(world: &mut World, now: u64) {
    for id in world.sorted_unit_ids() {
        let decision = {
            let Some(unit) = world.unit(id) else { continue };
            if !unit.is_alive() || unit.is_stunned(now) {
                continue;
            }
            decide(world, unit)
        };

        let Some(unit) = world.unit_mut(id) else { continue };
        match decision {
            Decision::Retain => unit.begin_attacking(),
            Decision::AttackNew(target) => {
                unit.target = Some(target);
                unit.begin_attacking();
            }
            Decision::MoveToward(target) => {
                unit.target = Some(target);
                unit.begin_moving();
                unit.needs_path = true;
                tracing::debug!(unit = id, ?target, "moving toward fallback target");
            }
            Decision::Idle => {
                unit.target = None;
                unit.stand_down();
            }
        }
    }
}

fn decide(world: &World, unit: &Unit) -> Decision {
    // Retention check on the current target.
    if let Some(target) = unit.target {
        if let Some(pos) = world.target_position(target) {
            if unit.position.distance(pos) <= unit.spec.range {
                return Decision::Retain;
            }
        }
        // Dead, removed, or out of range: fall through to reacquisition.
    }
    acquire(world, unit)
}

/// Candidate scan. Units are considered before buildings, each in sorted
/// id order, so distance ties resolve to the first-encountered candidate.
fn acquire(world: &World, unit: &Unit) -> Decision {
    let enemy = unit.side.opposite();
    let mut best: Option<(TargetRef, f32)> = None;
    let mut best_in_range: Option<(TargetRef, f32)> = None;

    let mut consider = |target: TargetRef, true_dist: f32, eff_dist: f32| {
        if best.map_or(true, |(_, d)| eff_dist < d) {
            best = Some((target, eff_dist));
        }
        if true_dist <= unit.spec.range && best_in_range.map_or(true, |(_, d)| eff_dist < d) {
            best_in_range = Some((target, eff_dist));
        }
    };

    if !unit.spec.targets_buildings_only {
        for id in world.sorted_unit_ids() {
            let Some(candidate) = world.unit(id) else { continue };
            if candidate.side != enemy || !candidate.is_alive() {
                continue;
            }
            let dist = unit.position.distance(candidate.position);
            consider(TargetRef::Unit(id), dist, dist);
        }
    }

    for id in world.sorted_building_ids() {
        let Some(candidate) = world.building(id) else { continue };
        if candidate.side != enemy || !candidate.is_alive() {
            continue;
        }
        let dist = unit.position.distance(candidate.position);
        // Opponent-side bias: near buildings out-rank units of equal
        // true distance.
        let eff = if unit.side == Side::Opponent && dist <= BUILDING_PRIORITY_RADIUS {
            dist - BUILDING_PRIORITY_BONUS
        } else {
            dist
        };
        consider(TargetRef::Building(id), dist, eff);
    }

    if let Some((target, _)) = best_in_range {
        Decision::AttackNew(target)
    } else if let Some((target, _)) = best {
        Decision::MoveToward(target)
    } else {
        Decision::Idle
    }
}
