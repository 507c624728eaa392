//! Opponent decision engine: strategy selection, unit choice, placement.
//!
//! Strategy is a value object recomputed wholesale on a fixed cadence,
//! never partially mutated between evaluations. All randomness flows
//! through a caller-supplied RNG so decisions are reproducible under a
//! fixed seed.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::catalog::{UnitCatalog, UnitKind};
use crate::entities::{Side, World};
use crate::map::BattleMap;
use crate::math::{chance, jitter_ms, Vec2};

/// Milliseconds between strategy re-evaluations.
pub const STRATEGY_EVAL_INTERVAL_MS: u64 = 3000;

/// Energy level that forces an immediate deployment regardless of mode.
pub const FORCE_DEPLOY_ENERGY: f32 = 8.0;

/// Remaining match time below which the opponent pushes for the finish.
pub const FINAL_PUSH_THRESHOLD_MS: u64 = 60_000;

/// Own-base health fraction that triggers the defensive rule.
pub const OWN_BASE_DANGER_FRACTION: f32 = 0.3;

/// Enemy-base health fraction that triggers the rush rule.
pub const ENEMY_BASE_RUSH_FRACTION: f32 = 0.4;

/// Radius for the per-friendly placement support bonus.
pub const SUPPORT_RADIUS: f32 = 100.0;

/// Radius for the per-unit placement crowding penalty.
pub const CROWDING_RADIUS: f32 = 50.0;

/// Number of candidate tiles sampled per placement decision.
pub const PLACEMENT_SAMPLES: usize = 20;

/// Jitter applied to the per-mode deployment cooldown.
pub const DEPLOY_COOLDOWN_JITTER_MS: u64 = 1000;

/// The opponent's posture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrategyMode {
    /// Press the attack.
    Aggressive,
    /// Protect the base.
    Defensive,
    /// Default posture.
    Balanced,
}

impl StrategyMode {
    /// Minimum energy before a deployment attempt is considered.
    #[must_use]
    pub const fn min_deploy_energy(self) -> f32 {
        match self {
            Self::Aggressive => 2.0,
            Self::Balanced => 3.0,
            Self::Defensive => 4.0,
        }
    }

    /// Base cooldown between deployments, jittered per decision.
    #[must_use]
    pub const fn deploy_cooldown_ms(self) -> u64 {
        match self {
            Self::Aggressive => 2500,
            Self::Balanced => 4000,
            Self::Defensive => 5500,
        }
    }
}

/// The opponent's current strategy.
///
/// Recomputed as a whole by [`evaluate_strategy`]; the deployment timer
/// is the only field carried across evaluations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrategyState {
    /// Current posture.
    pub mode: StrategyMode,
    /// All-in push toward the enemy base.
    pub rush: bool,
    /// Holding back to protect the own base.
    pub defensive: bool,
    /// Unit kinds this posture prefers, in order.
    pub preferred: [UnitKind; 2],
    /// When the next wholesale re-evaluation is due.
    pub next_evaluation_at: u64,
    /// When the next deployment attempt may happen.
    pub next_deployment_at: u64,
}

impl StrategyState {
    /// Opening posture before the first evaluation.
    #[must_use]
    pub const fn initial() -> Self {
        Self {
            mode: StrategyMode::Balanced,
            rush: false,
            defensive: false,
            preferred: [UnitKind::Medium, UnitKind::Light],
            next_evaluation_at: 0,
            next_deployment_at: 0,
        }
    }
}

/// Battlefield snapshot feeding the strategy rule table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrategyInputs {
    /// Own main-tower health fraction.
    pub own_base_fraction: f32,
    /// Enemy main-tower health fraction.
    pub enemy_base_fraction: f32,
    /// Remaining match time in milliseconds.
    pub remaining_ms: u64,
    /// Own live unit count.
    pub own_unit_count: usize,
    /// Enemy live unit count.
    pub enemy_unit_count: usize,
}

/// Recompute the strategy from the rule table.
///
/// Rules are priority-ordered; the first match wins.
#[must_use]
pub fn evaluate_strategy(
    inputs: &StrategyInputs,
    now: u64,
    next_deployment_at: u64,
) -> StrategyState {
    let (mode, rush, defensive, preferred) =
        if inputs.own_base_fraction < OWN_BASE_DANGER_FRACTION {
            (
                StrategyMode::Defensive,
                false,
                true,
                [UnitKind::Heavy, UnitKind::Medium],
            )
        } else if inputs.enemy_base_fraction < ENEMY_BASE_RUSH_FRACTION {
            (
                StrategyMode::Aggressive,
                true,
                false,
                [UnitKind::Light, UnitKind::Medium],
            )
        } else if inputs.remaining_ms < FINAL_PUSH_THRESHOLD_MS {
            (
                StrategyMode::Aggressive,
                false,
                false,
                [UnitKind::Medium, UnitKind::Heavy],
            )
        } else if inputs.own_unit_count + 1 < inputs.enemy_unit_count {
            (
                StrategyMode::Defensive,
                false,
                true,
                [UnitKind::Heavy, UnitKind::Medium],
            )
        } else {
            (
                StrategyMode::Balanced,
                false,
                false,
                [UnitKind::Medium, UnitKind::Light],
            )
        };

    StrategyState {
        mode,
        rush,
        defensive,
        preferred,
        next_evaluation_at: now + STRATEGY_EVAL_INTERVAL_MS,
        next_deployment_at,
    }
}

/// Per-mode deployment gate.
///
/// Energy at [`FORCE_DEPLOY_ENERGY`] or above always passes, beating
/// mode gating and the cooldown.
pub fn should_deploy<R: Rng + ?Sized>(
    state: &StrategyState,
    energy: f32,
    own_units: usize,
    enemy_units: usize,
    now: u64,
    rng: &mut R,
) -> bool {
    if energy >= FORCE_DEPLOY_ENERGY {
        return true;
    }
    if now < state.next_deployment_at {
        return false;
    }
    if energy < state.mode.min_deploy_energy() {
        return false;
    }
    let outnumbered = own_units < enemy_units;
    match state.mode {
        StrategyMode::Aggressive => true,
        StrategyMode::Defensive => outnumbered,
        StrategyMode::Balanced => !outnumbered || chance(rng, 0.3),
    }
}

/// Pick a unit kind from the deck.
///
/// Affordable units on the preferred list win with 70% probability,
/// otherwise the pick is uniform among all affordable units. Reactive
/// counters run afterwards as substitutions: the heavy counter first,
/// then the light counter.
pub fn choose_unit<R: Rng + ?Sized>(
    deck: &[UnitKind],
    catalog: &UnitCatalog,
    state: &StrategyState,
    energy: f32,
    enemy_heavies: usize,
    enemy_lights: usize,
    rng: &mut R,
) -> Option<UnitKind> {
    let affordable: Vec<UnitKind> = deck
        .iter()
        .copied()
        .filter(|kind| match catalog.get(*kind) {
            Some(spec) => spec.cost as f32 <= energy,
            None => {
                tracing::warn!(?kind, "deck unit missing from catalog, skipping");
                false
            }
        })
        .collect();
    if affordable.is_empty() {
        return None;
    }

    let preferred: Vec<UnitKind> = affordable
        .iter()
        .copied()
        .filter(|kind| state.preferred.contains(kind))
        .collect();

    let mut pick = if !preferred.is_empty() && chance(rng, 0.7) {
        preferred[rng.gen_range(0..preferred.len())]
    } else {
        affordable[rng.gen_range(0..affordable.len())]
    };

    if enemy_heavies >= 2 && affordable.contains(&UnitKind::TankDestroyer) && chance(rng, 0.4) {
        pick = UnitKind::TankDestroyer;
    }
    if enemy_lights >= 3 && affordable.contains(&UnitKind::Artillery) && chance(rng, 0.3) {
        pick = UnitKind::Artillery;
    }

    Some(pick)
}

/// Score and pick a deployment position inside the opponent's zone.
///
/// Samples up to [`PLACEMENT_SAMPLES`] random zone tiles and keeps the
/// best-scoring one; returns `None` when no sample lands on a valid
/// zone tile.
pub fn choose_position<R: Rng + ?Sized>(
    world: &World,
    map: &BattleMap,
    kind: UnitKind,
    state: &StrategyState,
    expanded_zone: bool,
    rng: &mut R,
) -> Option<Vec2> {
    let zone = *map.deploy_zone(Side::Opponent, expanded_zone);
    let enemy_base = world
        .main_tower(Side::Player)
        .map_or_else(|| map.main_tower_position(Side::Player), |b| b.position);
    let own_base = world
        .main_tower(Side::Opponent)
        .map_or_else(|| map.main_tower_position(Side::Opponent), |b| b.position);

    let max_dist = Vec2::ZERO.distance(Vec2::new(
        map.width() as f32 * map.tile_size(),
        map.height() as f32 * map.tile_size(),
    ));

    let mut best: Option<(Vec2, f32)> = None;
    for _ in 0..PLACEMENT_SAMPLES {
        let x = rng.gen_range(zone.min_x..=zone.max_x);
        let y = rng.gen_range(zone.min_y..=zone.max_y);
        let pos = map.tile_to_world(x, y);
        if !map.is_valid_deployment(Side::Opponent, expanded_zone, pos) {
            continue;
        }

        let mut score = 100.0 * (1.0 - pos.distance(enemy_base) / max_dist);
        if state.defensive {
            score += 60.0 * (1.0 - pos.distance(own_base) / max_dist);
        }

        // Sorted iteration keeps the float sums reproducible under a
        // fixed seed.
        for id in world.sorted_unit_ids() {
            let Some(unit) = world.unit(id) else { continue };
            if !unit.is_alive() {
                continue;
            }
            let dist = pos.distance(unit.position);
            if unit.side == Side::Opponent && dist <= SUPPORT_RADIUS {
                score += 15.0;
            }
            if dist <= CROWDING_RADIUS {
                score -= 20.0;
            }
        }

        score += positional_bonus(map, kind, x, y);
        score += rng.gen_range(-5.0..=5.0);

        if best.map_or(true, |(_, s)| score > s) {
            best = Some((pos, score));
        }
    }

    if best.is_none() {
        tracing::debug!("no valid deployment sample in zone, aborting");
    }
    best.map(|(pos, _)| pos)
}

/// Kind-specific positional preference.
///
/// The opponent holds the low rows, so "forward" means larger row
/// indices (toward the river). Heavies anchor the front, artillery sits
/// in the rear, the fast movers hug the flanks.
fn positional_bonus(map: &BattleMap, kind: UnitKind, x: u32, y: u32) -> f32 {
    let rows = map.height() as f32;
    let cols = map.width() as f32;
    let forward = y as f32 / rows;
    let flank = ((x as f32 - cols / 2.0).abs() / (cols / 2.0)).min(1.0);
    match kind {
        UnitKind::Heavy => 25.0 * forward,
        UnitKind::Artillery => 25.0 * (1.0 - forward),
        UnitKind::Light | UnitKind::FastAttack => 20.0 * flank,
        UnitKind::Medium | UnitKind::TankDestroyer => 0.0,
    }
}

/// A deployment the decision engine wants the orchestrator to perform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeploymentRequest {
    /// Chosen unit kind.
    pub kind: UnitKind,
    /// Chosen world position.
    pub position: Vec2,
}

/// The opponent's standing decision state: deck plus current strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpponentCommander {
    deck: Vec<UnitKind>,
    strategy: StrategyState,
}

impl OpponentCommander {
    /// Create a commander with the given deck.
    #[must_use]
    pub fn new(deck: Vec<UnitKind>) -> Self {
        Self {
            deck,
            strategy: StrategyState::initial(),
        }
    }

    /// Current strategy.
    #[must_use]
    pub const fn strategy(&self) -> &StrategyState {
        &self.strategy
    }

    /// Run one decision step.
    ///
    /// Re-evaluates strategy at its own cadence, then considers a
    /// deployment. Returns the request for the orchestrator to carry
    /// out; the engine never spawns units itself.
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        world: &World,
        map: &BattleMap,
        catalog: &UnitCatalog,
        energy: f32,
        remaining_ms: u64,
        expanded_zone: bool,
        now: u64,
        rng: &mut R,
    ) -> Option<DeploymentRequest> {
        if now >= self.strategy.next_evaluation_at {
            let inputs = StrategyInputs {
                own_base_fraction: world
                    .main_tower(Side::Opponent)
                    .map_or(0.0, |b| b.health_fraction()),
                enemy_base_fraction: world
                    .main_tower(Side::Player)
                    .map_or(0.0, |b| b.health_fraction()),
                remaining_ms,
                own_unit_count: world.live_unit_count(Side::Opponent),
                enemy_unit_count: world.live_unit_count(Side::Player),
            };
            self.strategy = evaluate_strategy(&inputs, now, self.strategy.next_deployment_at);
            tracing::debug!(mode = ?self.strategy.mode, rush = self.strategy.rush, "strategy re-evaluated");
        }

        let own_units = world.live_unit_count(Side::Opponent);
        let enemy_units = world.live_unit_count(Side::Player);
        if !should_deploy(&self.strategy, energy, own_units, enemy_units, now, rng) {
            return None;
        }

        let enemy_heavies = world.live_unit_count_of(Side::Player, UnitKind::Heavy);
        let enemy_lights = world.live_unit_count_of(Side::Player, UnitKind::Light);
        let kind = choose_unit(
            &self.deck,
            catalog,
            &self.strategy,
            energy,
            enemy_heavies,
            enemy_lights,
            rng,
        )?;
        let position = choose_position(world, map, kind, &self.strategy, expanded_zone, rng)?;

        self.strategy.next_deployment_at = now + jitter_ms(
            rng,
            self.strategy.mode.deploy_cooldown_ms(),
            DEPLOY_COOLDOWN_JITTER_MS,
        );
        tracing::debug!(?kind, ?position, "opponent deployment requested");
        Some(DeploymentRequest { kind, position })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::BuildingRole;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn inputs() -> StrategyInputs {
        StrategyInputs {
            own_base_fraction: 1.0,
            enemy_base_fraction: 1.0,
            remaining_ms: 180_000,
            own_unit_count: 2,
            enemy_unit_count: 2,
        }
    }

    #[test]
    fn test_own_base_danger_wins_over_all_rules() {
        let snapshot = StrategyInputs {
            own_base_fraction: 0.2,
            enemy_base_fraction: 0.9,
            ..inputs()
        };
        let state = evaluate_strategy(&snapshot, 0, 0);
        assert_eq!(state.mode, StrategyMode::Defensive);
        assert!(state.defensive && !state.rush);
        assert_eq!(state.preferred, [UnitKind::Heavy, UnitKind::Medium]);
    }

    #[test]
    fn test_low_enemy_base_triggers_rush() {
        let snapshot = StrategyInputs {
            enemy_base_fraction: 0.35,
            ..inputs()
        };
        let state = evaluate_strategy(&snapshot, 0, 0);
        assert_eq!(state.mode, StrategyMode::Aggressive);
        assert!(state.rush);
        assert_eq!(state.preferred, [UnitKind::Light, UnitKind::Medium]);
    }

    #[test]
    fn test_final_push_when_clock_runs_out() {
        let snapshot = StrategyInputs {
            remaining_ms: 45_000,
            ..inputs()
        };
        let state = evaluate_strategy(&snapshot, 0, 0);
        assert_eq!(state.mode, StrategyMode::Aggressive);
        assert!(!state.rush);
        assert_eq!(state.preferred, [UnitKind::Medium, UnitKind::Heavy]);
    }

    #[test]
    fn test_outnumbered_goes_defensive() {
        let snapshot = StrategyInputs {
            own_unit_count: 1,
            enemy_unit_count: 3,
            ..inputs()
        };
        let state = evaluate_strategy(&snapshot, 0, 0);
        assert_eq!(state.mode, StrategyMode::Defensive);

        // Down by exactly one is still balanced.
        let close = StrategyInputs {
            own_unit_count: 2,
            enemy_unit_count: 3,
            ..inputs()
        };
        assert_eq!(evaluate_strategy(&close, 0, 0).mode, StrategyMode::Balanced);
    }

    #[test]
    fn test_evaluation_sets_next_cadence() {
        let state = evaluate_strategy(&inputs(), 9000, 1234);
        assert_eq!(state.next_evaluation_at, 9000 + STRATEGY_EVAL_INTERVAL_MS);
        assert_eq!(state.next_deployment_at, 1234);
    }

    #[test]
    fn test_energy_override_beats_defensive_gating() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut state = StrategyState::initial();
        state.mode = StrategyMode::Defensive;
        state.next_deployment_at = u64::MAX; // cooldown never elapses

        // Not outnumbered, defensive: normally never deploys.
        assert!(!should_deploy(&state, 7.9, 3, 2, 0, &mut rng));
        // The energy>=8 override still forces it.
        assert!(should_deploy(&state, 8.0, 3, 2, 0, &mut rng));
    }

    #[test]
    fn test_aggressive_deploys_on_low_energy() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut state = StrategyState::initial();
        state.mode = StrategyMode::Aggressive;

        assert!(should_deploy(&state, 2.0, 0, 0, 0, &mut rng));
        assert!(!should_deploy(&state, 1.9, 0, 0, 0, &mut rng));
    }

    #[test]
    fn test_cooldown_blocks_below_override() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut state = StrategyState::initial();
        state.mode = StrategyMode::Aggressive;
        state.next_deployment_at = 5000;

        assert!(!should_deploy(&state, 5.0, 0, 0, 4999, &mut rng));
        assert!(should_deploy(&state, 5.0, 0, 0, 5000, &mut rng));
    }

    #[test]
    fn test_choose_unit_respects_affordability() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let catalog = UnitCatalog::default();
        let state = StrategyState::initial();
        let deck: Vec<UnitKind> = UnitKind::ALL.to_vec();

        for _ in 0..50 {
            let kind = choose_unit(&deck, &catalog, &state, 2.0, 0, 0, &mut rng).unwrap();
            assert!(catalog.get(kind).unwrap().cost <= 2);
        }
        assert_eq!(choose_unit(&deck, &catalog, &state, 1.0, 0, 0, &mut rng), None);
    }

    #[test]
    fn test_heavy_counter_substitutes_tank_destroyer() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let catalog = UnitCatalog::default();
        let state = StrategyState::initial();
        let deck: Vec<UnitKind> = UnitKind::ALL.to_vec();

        let mut destroyers = 0;
        for _ in 0..200 {
            let kind = choose_unit(&deck, &catalog, &state, 10.0, 2, 0, &mut rng).unwrap();
            if kind == UnitKind::TankDestroyer {
                destroyers += 1;
            }
        }
        // 40% substitution (plus base picks) should land well above 50/200.
        assert!(destroyers > 50, "only {destroyers} tank destroyers in 200 picks");
    }

    #[test]
    fn test_placement_lands_in_valid_zone() {
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let map = BattleMap::default();
        let mut world = World::new();
        world.spawn_building(
            Side::Opponent,
            BuildingRole::MainTower,
            map.main_tower_position(Side::Opponent),
            2600,
            240.0,
        );
        world.spawn_building(
            Side::Player,
            BuildingRole::MainTower,
            map.main_tower_position(Side::Player),
            2600,
            240.0,
        );
        let state = StrategyState::initial();

        for kind in UnitKind::ALL {
            let pos = choose_position(&world, &map, kind, &state, false, &mut rng).unwrap();
            assert!(map.is_valid_deployment(Side::Opponent, false, pos));
        }
    }

    #[test]
    fn test_commander_full_energy_produces_request() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let map = BattleMap::default();
        let catalog = UnitCatalog::default();
        let mut world = World::new();
        world.spawn_building(
            Side::Opponent,
            BuildingRole::MainTower,
            map.main_tower_position(Side::Opponent),
            2600,
            240.0,
        );
        world.spawn_building(
            Side::Player,
            BuildingRole::MainTower,
            map.main_tower_position(Side::Player),
            2600,
            240.0,
        );

        let mut commander = OpponentCommander::new(UnitKind::ALL.to_vec());
        let request = commander
            .update(&world, &map, &catalog, 10.0, 180_000, false, 0, &mut rng)
            .expect("full energy must force a deployment");
        assert!(map.is_valid_deployment(Side::Opponent, false, request.position));
        assert!(commander.strategy().next_deployment_at > 0);
    }
}
