//! The battle session: frame clock, entity ownership, and tick ordering.
//!
//! The session owns the entity collections, energy pools, timers, and
//! RNG, and is the only component that structurally adds or removes
//! entities. Each tick runs a fixed order: timers and energy, then all
//! unit targeting, then pathing and movement, then combat resolution,
//! then the opponent decision engine at its own cadence, then deferred
//! removals and the win/loss check.
//!
//! Temporal effects are timestamp comparisons against the injected
//! monotonic clock; nothing here blocks or awaits.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::ai::OpponentCommander;
use crate::catalog::{TowerTuning, UnitCatalog, UnitKind};
use crate::combat::CombatResolver;
use crate::entities::{BuildingRole, Side, UnitId, World};
use crate::error::{BattleError, Result};
use crate::events::{BattleEvent, MatchOutcome, TickEvents};
use crate::map::BattleMap;
use crate::math::{clamp, Vec2};
use crate::pathfinding::{plan_route, PathfinderConfig};
use crate::stats::BattleStats;
use crate::targeting::update_unit_targets;

/// Tunable session parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Match length in milliseconds.
    pub match_duration_ms: u64,
    /// Energy each side starts with.
    pub starting_energy: f32,
    /// Energy cap per side.
    pub max_energy: f32,
    /// Passive energy regeneration per second.
    pub energy_regen_per_sec: f32,
    /// RNG seed; identical seeds and clocks replay identically.
    pub seed: u64,
    /// Pathfinder iteration caps.
    pub pathfinder: PathfinderConfig,
    /// Tower combat constants.
    pub tower_tuning: TowerTuning,
    /// Main tower hit points.
    pub main_tower_health: u32,
    /// Guard tower hit points.
    pub guard_tower_health: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            match_duration_ms: 180_000,
            starting_energy: 5.0,
            max_energy: 10.0,
            energy_regen_per_sec: 0.5,
            seed: 0,
            pathfinder: PathfinderConfig::default(),
            tower_tuning: TowerTuning::default(),
            main_tower_health: 2600,
            guard_tower_health: 1400,
        }
    }
}

impl SessionConfig {
    fn validate(&self) -> Result<()> {
        if self.match_duration_ms == 0 {
            return Err(BattleError::InvalidConfig {
                message: "match duration must be positive".into(),
            });
        }
        if self.max_energy < self.starting_energy {
            return Err(BattleError::InvalidConfig {
                message: "energy cap below starting energy".into(),
            });
        }
        Ok(())
    }
}

/// Per-side energy pools.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
struct EnergyBank {
    player: f32,
    opponent: f32,
}

impl EnergyBank {
    const fn get(&self, side: Side) -> f32 {
        match side {
            Side::Player => self.player,
            Side::Opponent => self.opponent,
        }
    }

    fn get_mut(&mut self, side: Side) -> &mut f32 {
        match side {
            Side::Player => &mut self.player,
            Side::Opponent => &mut self.opponent,
        }
    }
}

/// A running battle.
#[derive(Debug, Clone)]
pub struct BattleSession {
    config: SessionConfig,
    map: BattleMap,
    catalog: UnitCatalog,
    world: World,
    resolver: CombatResolver,
    commander: OpponentCommander,
    stats: BattleStats,
    energy: EnergyBank,
    expanded_player_zone: bool,
    expanded_opponent_zone: bool,
    started_at: Option<u64>,
    last_tick_at: Option<u64>,
    outcome: Option<MatchOutcome>,
    rng: ChaCha8Rng,
}

impl BattleSession {
    /// Create a session with the standard tower layout.
    ///
    /// # Errors
    ///
    /// Returns [`BattleError::UnknownDeckUnit`] when the opponent deck
    /// references a kind the catalog does not define, and
    /// [`BattleError::InvalidConfig`] for malformed configuration.
    pub fn new(
        config: SessionConfig,
        map: BattleMap,
        catalog: UnitCatalog,
        opponent_deck: Vec<UnitKind>,
    ) -> Result<Self> {
        config.validate()?;
        for kind in &opponent_deck {
            if catalog.get(*kind).is_none() {
                return Err(BattleError::UnknownDeckUnit(*kind));
            }
        }

        let mut world = World::new();
        for side in [Side::Player, Side::Opponent] {
            world.spawn_building(
                side,
                BuildingRole::MainTower,
                map.main_tower_position(side),
                config.main_tower_health,
                config.tower_tuning.range,
            );
            for position in map.guard_tower_positions(side) {
                world.spawn_building(
                    side,
                    BuildingRole::GuardTower,
                    position,
                    config.guard_tower_health,
                    config.tower_tuning.range,
                );
            }
        }

        Ok(Self {
            map,
            catalog,
            world,
            resolver: CombatResolver::new(config.tower_tuning),
            commander: OpponentCommander::new(opponent_deck),
            stats: BattleStats::default(),
            energy: EnergyBank {
                player: config.starting_energy,
                opponent: config.starting_energy,
            },
            expanded_player_zone: false,
            expanded_opponent_zone: false,
            started_at: None,
            last_tick_at: None,
            outcome: None,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
        })
    }

    /// A session over the default map, catalog, and full deck.
    pub fn with_defaults(config: SessionConfig) -> Result<Self> {
        Self::new(
            config,
            BattleMap::default(),
            UnitCatalog::default(),
            UnitKind::ALL.to_vec(),
        )
    }

    /// The live world. External collaborators query positions and
    /// existence through this.
    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// Mutable world access for the owning orchestrator - scripted
    /// scenario setup and external effects (abilities, level hazards).
    /// Structural insert/remove stays with the session.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// The battlefield map.
    #[must_use]
    pub const fn map(&self) -> &BattleMap {
        &self.map
    }

    /// Cumulative statistics for both sides.
    #[must_use]
    pub const fn stats(&self) -> &BattleStats {
        &self.stats
    }

    /// A side's current energy.
    #[must_use]
    pub const fn energy(&self, side: Side) -> f32 {
        self.energy.get(side)
    }

    /// Final outcome, once the match has ended.
    #[must_use]
    pub const fn outcome(&self) -> Option<MatchOutcome> {
        self.outcome
    }

    /// Remaining match time at the given clock reading.
    #[must_use]
    pub fn remaining_ms(&self, now: u64) -> u64 {
        match self.started_at {
            Some(started) => self
                .config
                .match_duration_ms
                .saturating_sub(now.saturating_sub(started)),
            None => self.config.match_duration_ms,
        }
    }

    /// Toggle a side's expanded deployment zone. Externally decided;
    /// the core only consumes the flag.
    pub fn set_expanded_zone(&mut self, side: Side, expanded: bool) {
        match side {
            Side::Player => self.expanded_player_zone = expanded,
            Side::Opponent => self.expanded_opponent_zone = expanded,
        }
    }

    fn expanded_zone(&self, side: Side) -> bool {
        match side {
            Side::Player => self.expanded_player_zone,
            Side::Opponent => self.expanded_opponent_zone,
        }
    }

    /// Stun a unit until the given timestamp. External ability hook.
    pub fn stun_unit(&mut self, id: UnitId, until: u64) {
        if let Some(unit) = self.world.unit_mut(id) {
            unit.stunned_until = Some(until);
        }
    }

    /// Deploy a unit for a side.
    ///
    /// Validates the deployment zone and energy cost; a failed check
    /// means the action is silently not taken (`None`), never an error.
    pub fn deploy(&mut self, side: Side, kind: UnitKind, position: Vec2) -> Option<UnitId> {
        if self.outcome.is_some() {
            return None;
        }
        let Some(spec) = self.catalog.get(kind).copied() else {
            tracing::warn!(?kind, "deployment of unknown unit kind skipped");
            return None;
        };
        if !self
            .map
            .is_valid_deployment(side, self.expanded_zone(side), position)
        {
            tracing::debug!(?side, ?kind, ?position, "deployment outside zone rejected");
            return None;
        }
        let energy = self.energy.get_mut(side);
        let cost = spec.cost as f32;
        if *energy < cost {
            tracing::debug!(?side, ?kind, energy = *energy, cost, "not enough energy");
            return None;
        }
        *energy -= cost;

        let id = self.world.spawn_unit(side, kind, spec, position);
        tracing::debug!(?side, ?kind, unit = id, "unit deployed");
        Some(id)
    }

    /// Advance the simulation to the given clock reading.
    ///
    /// Returns the events produced this tick. Once the match has ended
    /// further calls are no-ops returning an empty stream.
    pub fn tick(&mut self, now: u64) -> TickEvents {
        let mut events = TickEvents::default();
        if self.outcome.is_some() {
            return events;
        }

        self.started_at.get_or_insert(now);
        let dt_ms = self
            .last_tick_at
            .map_or(0, |last| now.saturating_sub(last));
        self.last_tick_at = Some(now);

        // 1. Timers and energy.
        let regen = self.config.energy_regen_per_sec * dt_ms as f32 / 1000.0;
        for side in [Side::Player, Side::Opponent] {
            let pool = self.energy.get_mut(side);
            *pool = clamp(*pool + regen, 0.0, self.config.max_energy);
        }

        // 2. All targeting updates happen before any combat resolution.
        update_unit_targets(&mut self.world, now);

        // 3. Pathing for flagged units, then waypoint movement.
        self.route_flagged_units();
        self.advance_movement(dt_ms, now);

        // 4. Combat.
        self.resolver
            .fire_units(&mut self.world, now, &mut self.stats, &mut events);
        self.resolver
            .fire_towers(&mut self.world, now, &mut self.stats, &mut events);
        self.resolver
            .resolve_arrivals(&mut self.world, now, &mut self.stats, &mut events);

        // 5. Opponent decisions, on their own cadence.
        let remaining = self.remaining_ms(now);
        let request = self.commander.update(
            &self.world,
            &self.map,
            &self.catalog,
            self.energy.get(Side::Opponent),
            remaining,
            self.expanded_opponent_zone,
            now,
            &mut self.rng,
        );
        if let Some(request) = request {
            events.push(BattleEvent::DeploymentRequested {
                side: Side::Opponent,
                kind: request.kind,
                position: request.position,
            });
            if let Some(unit) = self.deploy(Side::Opponent, request.kind, request.position) {
                events.push(BattleEvent::UnitDeployed {
                    unit,
                    side: Side::Opponent,
                    kind: request.kind,
                });
            }
        }

        // 6. Win/loss, then deferred removal.
        if let Some(outcome) = self.judge(remaining) {
            self.outcome = Some(outcome);
            events.push(BattleEvent::MatchEnded { outcome });
            tracing::info!(?outcome, "match ended");
        }
        self.world.sweep_dead();

        events
    }

    /// Decide the match outcome, if any.
    ///
    /// A dead main tower loses immediately; at the timeout the higher
    /// remaining main-tower health fraction wins, equality is a draw.
    fn judge(&self, remaining_ms: u64) -> Option<MatchOutcome> {
        let player = self
            .world
            .main_tower(Side::Player)
            .map_or(0.0, |b| b.health_fraction());
        let opponent = self
            .world
            .main_tower(Side::Opponent)
            .map_or(0.0, |b| b.health_fraction());

        if player <= 0.0 && opponent <= 0.0 {
            return Some(MatchOutcome::Draw);
        }
        if player <= 0.0 {
            return Some(MatchOutcome::Victory(Side::Opponent));
        }
        if opponent <= 0.0 {
            return Some(MatchOutcome::Victory(Side::Player));
        }
        if remaining_ms == 0 {
            return Some(if player > opponent {
                MatchOutcome::Victory(Side::Player)
            } else if opponent > player {
                MatchOutcome::Victory(Side::Opponent)
            } else {
                MatchOutcome::Draw
            });
        }
        None
    }

    /// Run the pathfinder for every unit flagged by the targeting engine.
    fn route_flagged_units(&mut self) {
        for id in self.world.sorted_unit_ids() {
            let route = {
                let Some(unit) = self.world.unit(id) else { continue };
                if !unit.needs_path || !unit.is_alive() {
                    continue;
                }
                let Some(target) = unit.target else {
                    continue;
                };
                let Some(goal) = self.world.target_position(target) else {
                    continue;
                };
                plan_route(&self.map, &self.config.pathfinder, unit.position, goal)
            };

            let Some(unit) = self.world.unit_mut(id) else { continue };
            unit.needs_path = false;
            match route {
                Some(waypoints) => {
                    unit.waypoints = waypoints.into_iter().collect();
                }
                None => {
                    // No route this tick; the unit idles and targeting
                    // will re-evaluate next tick.
                    unit.waypoints.clear();
                    tracing::debug!(unit = id, "no path to target, idling");
                }
            }
        }
    }

    /// Advance moving units along their waypoint queues.
    fn advance_movement(&mut self, dt_ms: u64, now: u64) {
        if dt_ms == 0 {
            return;
        }
        for id in self.world.sorted_unit_ids() {
            let Some(unit) = self.world.unit_mut(id) else { continue };
            if !unit.is_alive() || !unit.moving || unit.is_stunned(now) {
                continue;
            }
            let mut budget = unit.spec.speed * dt_ms as f32 / 1000.0;
            while budget > 0.0 {
                let Some(&next) = unit.waypoints.front() else { break };
                let dist = unit.position.distance(next);
                if dist <= budget {
                    unit.position = next;
                    unit.waypoints.pop_front();
                    budget -= dist;
                } else {
                    let dir = (next - unit.position).normalized();
                    unit.position = unit.position + dir * budget;
                    budget = 0.0;
                }
            }
        }
    }
}
