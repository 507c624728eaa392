//! Combat resolution: fire gating, projectiles, and the armor formula.
//!
//! Damage uses armor penetration against frontal armor: a shot that
//! penetrates deals full damage, anything else deals a fraction of it
//! with a hard floor. Projectiles are transient values owned by the
//! resolver's in-flight collection; a target dying mid-flight turns the
//! shot into a miss, never an error.

use serde::{Deserialize, Serialize};

use crate::catalog::TowerTuning;
use crate::entities::{Building, Side, TargetRef, World};
use crate::events::{BattleEvent, TickEvents};
use crate::math::Vec2;
use crate::stats::BattleStats;

/// Minimum milliseconds between shots for mobile units.
pub const UNIT_RATE_OF_FIRE_MS: u64 = 2000;

/// Penetration-ratio floor: some damage always gets through.
pub const MIN_PENETRATION_RATIO: f32 = 0.1;

/// Hits at or above this penetration ratio count as critical.
pub const CRITICAL_RATIO: f32 = 0.8;

/// Fraction of a hit's damage that bypasses armor, in `[0.1, 1.0]`.
#[must_use]
pub fn penetration_ratio(penetration: u32, armor: u32) -> f32 {
    if armor == 0 || penetration >= armor {
        1.0
    } else {
        (penetration as f32 / armor as f32).max(MIN_PENETRATION_RATIO)
    }
}

/// Apply the armor formula. Returns `(final_damage, ratio)`.
///
/// `final_damage = floor(base_damage * ratio)`, full damage on a clean
/// penetration.
#[must_use]
pub fn resolve_damage(base_damage: u32, penetration: u32, armor: u32) -> (u32, f32) {
    let ratio = penetration_ratio(penetration, armor);
    let final_damage = (base_damage as f32 * ratio).floor() as u32;
    (final_damage, ratio)
}

/// A shell in flight.
///
/// Exists only for the duration of its flight; the target reference is
/// weak and is resolved again on arrival.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    /// Side that fired.
    pub shooter_side: Side,
    /// Barrel position at spawn.
    pub origin: Vec2,
    /// Intended victim.
    pub target: TargetRef,
    /// Damage carried.
    pub damage: u32,
    /// Penetration carried.
    pub penetration: u32,
    /// Travel speed in world units per second.
    pub speed: f32,
    /// Spawn timestamp.
    pub spawned_at: u64,
    /// Flight duration, `distance / speed` at spawn time.
    pub travel_time_ms: u64,
}

impl Projectile {
    /// Whether the shell has reached its target at the given time.
    #[must_use]
    pub const fn arrived(&self, now: u64) -> bool {
        now >= self.spawned_at + self.travel_time_ms
    }
}

fn travel_time_ms(origin: Vec2, destination: Vec2, speed: f32) -> u64 {
    if speed <= 0.0 {
        return 0;
    }
    let seconds = origin.distance(destination) / speed;
    (seconds * 1000.0) as u64
}

/// Fire-rate gating, projectile flight, and damage resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatResolver {
    tuning: TowerTuning,
    in_flight: Vec<Projectile>,
}

impl CombatResolver {
    /// Create a resolver with the given tower tuning.
    #[must_use]
    pub fn new(tuning: TowerTuning) -> Self {
        Self {
            tuning,
            in_flight: Vec::new(),
        }
    }

    /// Shells currently in flight.
    #[must_use]
    pub fn in_flight(&self) -> &[Projectile] {
        &self.in_flight
    }

    /// Fire every unit whose gate is open.
    ///
    /// A unit fires only when attacking (which certifies range as of this
    /// tick's targeting pass), not moving, not stunned, its target is
    /// still live, and its rate-of-fire interval has elapsed.
    pub fn fire_units(
        &mut self,
        world: &mut World,
        now: u64,
        stats: &mut BattleStats,
        events: &mut TickEvents,
    ) {
        for id in world.sorted_unit_ids() {
            let shot = {
                let Some(unit) = world.unit(id) else { continue };
                if !unit.is_alive()
                    || !unit.attacking
                    || unit.moving
                    || unit.is_stunned(now)
                {
                    continue;
                }
                let Some(target) = unit.target else { continue };
                let Some(target_pos) = world.target_position(target) else {
                    continue;
                };
                let ready = unit
                    .last_shot_at
                    .map_or(true, |t| now.saturating_sub(t) >= UNIT_RATE_OF_FIRE_MS);
                if !ready {
                    continue;
                }
                Projectile {
                    shooter_side: unit.side,
                    origin: unit.position,
                    target,
                    damage: unit.spec.damage,
                    penetration: unit.spec.penetration,
                    speed: unit.spec.projectile_speed,
                    spawned_at: now,
                    travel_time_ms: travel_time_ms(
                        unit.position,
                        target_pos,
                        unit.spec.projectile_speed,
                    ),
                }
            };

            if let Some(unit) = world.unit_mut(id) {
                unit.last_shot_at = Some(now);
            }
            stats.side_mut(shot.shooter_side).shots_fired += 1;
            events.push(BattleEvent::ProjectileSpawned {
                side: shot.shooter_side,
                origin: shot.origin,
                target: shot.target,
                travel_time_ms: shot.travel_time_ms,
            });
            self.in_flight.push(shot);
        }
    }

    /// Fire every tower whose gate is open.
    ///
    /// Towers acquire their own targets: the held target is retained
    /// while alive and in range, otherwise the nearest live enemy unit in
    /// range is picked. A dormant main tower cannot act until activated.
    pub fn fire_towers(
        &mut self,
        world: &mut World,
        now: u64,
        stats: &mut BattleStats,
        events: &mut TickEvents,
    ) {
        for id in world.sorted_building_ids() {
            let decision = {
                let Some(tower) = world.building(id) else { continue };
                if !tower.is_alive()
                    || !tower.role.is_tower()
                    || !tower.can_shoot
                    || !tower.activated
                {
                    continue;
                }
                Self::tower_target(world, tower)
            };

            let Some(target) = decision else {
                if let Some(tower) = world.building_mut(id) {
                    tower.target = None;
                }
                continue;
            };

            let shot = {
                let Some(tower) = world.building(id) else { continue };
                let ready = tower
                    .last_shot_at
                    .map_or(true, |t| now.saturating_sub(t) >= self.tuning.rate_of_fire_ms);
                if !ready {
                    // Keep the target while waiting out the cooldown.
                    None
                } else {
                    let target_pos = world.target_position(target);
                    target_pos.map(|pos| Projectile {
                        shooter_side: tower.side,
                        origin: tower.position,
                        target,
                        damage: self.tuning.damage,
                        penetration: self.tuning.penetration,
                        speed: self.tuning.projectile_speed,
                        spawned_at: now,
                        travel_time_ms: travel_time_ms(
                            tower.position,
                            pos,
                            self.tuning.projectile_speed,
                        ),
                    })
                }
            };

            if let Some(tower) = world.building_mut(id) {
                tower.target = Some(target);
                if shot.is_some() {
                    tower.last_shot_at = Some(now);
                }
            }
            if let Some(shot) = shot {
                stats.side_mut(shot.shooter_side).shots_fired += 1;
                events.push(BattleEvent::ProjectileSpawned {
                    side: shot.shooter_side,
                    origin: shot.origin,
                    target: shot.target,
                    travel_time_ms: shot.travel_time_ms,
                });
                self.in_flight.push(shot);
            }
        }
    }

    /// Retain-or-reacquire for a tower. Enemy units only.
    fn tower_target(world: &World, tower: &Building) -> Option<TargetRef> {
        if let Some(held) = tower.target {
            if let Some(pos) = world.target_position(held) {
                if tower.position.distance(pos) <= tower.range {
                    return Some(held);
                }
            }
        }

        let enemy = tower.side.opposite();
        let mut best: Option<(TargetRef, f32)> = None;
        for id in world.sorted_unit_ids() {
            let Some(unit) = world.unit(id) else { continue };
            if unit.side != enemy || !unit.is_alive() {
                continue;
            }
            let dist = tower.position.distance(unit.position);
            if dist <= tower.range && best.map_or(true, |(_, d)| dist < d) {
                best = Some((TargetRef::Unit(id), dist));
            }
        }
        best.map(|(target, _)| target)
    }

    /// Resolve every shell that has arrived.
    ///
    /// A live target takes the armor formula against its frontal armor
    /// (zero for buildings); a dead or removed target turns the shell
    /// into a miss.
    pub fn resolve_arrivals(
        &mut self,
        world: &mut World,
        now: u64,
        stats: &mut BattleStats,
        events: &mut TickEvents,
    ) {
        let mut arrived = Vec::new();
        self.in_flight.retain(|p| {
            if p.arrived(now) {
                arrived.push(*p);
                false
            } else {
                true
            }
        });

        for shot in arrived {
            if !world.target_alive(shot.target) {
                events.push(BattleEvent::ShotMissed { target: shot.target });
                continue;
            }
            self.apply_hit(world, &shot, stats, events);
        }
    }

    fn apply_hit(
        &self,
        world: &mut World,
        shot: &Projectile,
        stats: &mut BattleStats,
        events: &mut TickEvents,
    ) {
        let victim_side = shot.shooter_side.opposite();
        match shot.target {
            TargetRef::Unit(id) => {
                let Some(unit) = world.unit_mut(id) else { return };
                let (damage, ratio) =
                    resolve_damage(shot.damage, shot.penetration, unit.spec.armor.front);
                unit.apply_damage(damage);
                let position = unit.position;
                let died = !unit.is_alive();

                let shooter = stats.side_mut(shot.shooter_side);
                shooter.shots_hit += 1;
                shooter.damage_dealt += u64::from(damage);
                if ratio >= CRITICAL_RATIO {
                    shooter.critical_hits += 1;
                }
                stats.side_mut(victim_side).damage_taken += u64::from(damage);

                events.push(BattleEvent::ProjectileHit {
                    target: shot.target,
                    position,
                    damage,
                    critical: ratio >= CRITICAL_RATIO,
                });
                if died {
                    stats.side_mut(shot.shooter_side).units_destroyed += 1;
                    stats.side_mut(victim_side).units_lost += 1;
                    events.push(BattleEvent::UnitDestroyed {
                        unit: id,
                        side: victim_side,
                    });
                    tracing::debug!(unit = id, side = ?victim_side, "unit destroyed");
                }
            }
            TargetRef::Building(id) => {
                let Some(building) = world.building_mut(id) else { return };
                // Buildings are unarmored targets.
                let (damage, ratio) = resolve_damage(shot.damage, shot.penetration, 0);
                let was_dormant = !building.activated;
                building.apply_damage(damage);
                building.activated = true;
                let position = building.position;
                let role = building.role;
                let died = !building.is_alive();

                let shooter = stats.side_mut(shot.shooter_side);
                shooter.shots_hit += 1;
                shooter.damage_dealt += u64::from(damage);
                shooter.building_damage += u64::from(damage);
                if ratio >= CRITICAL_RATIO {
                    shooter.critical_hits += 1;
                }
                stats.side_mut(victim_side).damage_taken += u64::from(damage);

                events.push(BattleEvent::ProjectileHit {
                    target: shot.target,
                    position,
                    damage,
                    critical: ratio >= CRITICAL_RATIO,
                });
                if was_dormant {
                    // One-way latch, notified exactly once.
                    events.push(BattleEvent::MainTowerActivated {
                        building: id,
                        side: victim_side,
                    });
                    tracing::info!(building = id, side = ?victim_side, "main tower activated");
                }
                if died {
                    events.push(BattleEvent::BuildingDestroyed {
                        building: id,
                        side: victim_side,
                        tower: role.is_tower(),
                    });
                    tracing::info!(building = id, side = ?victim_side, tower = role.is_tower(), "building destroyed");
                }
            }
        }
    }
}
