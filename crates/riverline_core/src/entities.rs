//! Battle entities: units, buildings, and the world container.
//!
//! Target references are weak by construction - an id plus a liveness
//! lookup into the authoritative collections, revalidated before every
//! use. Entities with zero health stay in the collections until the
//! session's end-of-tick removal pass, so nothing is structurally removed
//! mid-iteration.

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::catalog::{UnitKind, UnitSpec};
use crate::math::Vec2;

/// Unique identifier for units.
pub type UnitId = u64;

/// Unique identifier for buildings.
pub type BuildingId = u64;

/// The two combatant sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// The human player.
    Player,
    /// The autonomous opponent.
    Opponent,
}

impl Side {
    /// The other side.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Player => Self::Opponent,
            Self::Opponent => Self::Player,
        }
    }
}

/// Weak reference to a targetable entity.
///
/// Never an owning pointer: holders must resolve it through the world's
/// liveness lookups each time before acting on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetRef {
    /// A unit, by id.
    Unit(UnitId),
    /// A building, by id.
    Building(BuildingId),
}

/// A deployed unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    /// Unique id.
    pub id: UnitId,
    /// Owning side.
    pub side: Side,
    /// Unit category.
    pub kind: UnitKind,
    /// Stat snapshot taken at deployment.
    pub spec: UnitSpec,
    /// Current world position.
    pub position: Vec2,
    /// Current hit points, clamped to `[0, spec.max_health]`.
    pub health: u32,
    /// Current target, if any. Weak reference.
    pub target: Option<TargetRef>,
    /// Unit is traveling toward its objective.
    pub moving: bool,
    /// Unit is holding position and firing. Never set together with `moving`.
    pub attacking: bool,
    /// The session must run the pathfinder before the next movement step.
    pub needs_path: bool,
    /// Timestamp of the last shot; `None` until the first shot.
    pub last_shot_at: Option<u64>,
    /// Stun expiry; targeting and firing are suppressed until then.
    pub stunned_until: Option<u64>,
    /// Remaining waypoints toward the objective.
    pub waypoints: VecDeque<Vec2>,
}

impl Unit {
    /// Create a freshly deployed unit at full health.
    #[must_use]
    pub fn new(id: UnitId, side: Side, kind: UnitKind, spec: UnitSpec, position: Vec2) -> Self {
        Self {
            id,
            side,
            kind,
            spec,
            position,
            health: spec.max_health,
            target: None,
            moving: false,
            attacking: false,
            needs_path: false,
            last_shot_at: None,
            stunned_until: None,
            waypoints: VecDeque::new(),
        }
    }

    /// Liveness check.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Whether a stun suppresses this unit at the given time.
    #[must_use]
    pub fn is_stunned(&self, now: u64) -> bool {
        self.stunned_until.is_some_and(|until| now < until)
    }

    /// Apply damage, clamping health at zero.
    pub fn apply_damage(&mut self, amount: u32) {
        self.health = self.health.saturating_sub(amount);
    }

    /// Enter the moving state. Clears `attacking`.
    pub fn begin_moving(&mut self) {
        self.moving = true;
        self.attacking = false;
    }

    /// Enter the attacking state. Clears `moving` and drops waypoints.
    pub fn begin_attacking(&mut self) {
        self.attacking = true;
        self.moving = false;
        self.waypoints.clear();
    }

    /// Leave both movement and attack states.
    pub fn stand_down(&mut self) {
        self.moving = false;
        self.attacking = false;
        self.waypoints.clear();
    }
}

/// What a building is for. Only towers participate in the win/lose
/// condition; support buildings are cosmetic objectives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildingRole {
    /// Primary objective. Dormant until first damaged; its destruction
    /// ends the match.
    MainTower,
    /// Forward defensive tower, active from the start.
    GuardTower,
    /// Non-combat structure.
    Support,
}

impl BuildingRole {
    /// Capturable-objective predicate: does destroying this building feed
    /// the win/loss path?
    #[must_use]
    pub const fn is_tower(self) -> bool {
        matches!(self, Self::MainTower | Self::GuardTower)
    }
}

/// A static structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Building {
    /// Unique id.
    pub id: BuildingId,
    /// Owning side.
    pub side: Side,
    /// Role in the match.
    pub role: BuildingRole,
    /// World position.
    pub position: Vec2,
    /// Current hit points.
    pub health: u32,
    /// Maximum hit points.
    pub max_health: u32,
    /// Attack range in world units. Zero for non-combat structures.
    pub range: f32,
    /// Whether this building can fire at all.
    pub can_shoot: bool,
    /// Main-tower activation latch; flips on first damage, one way.
    pub activated: bool,
    /// Current target, if any. Weak reference.
    pub target: Option<TargetRef>,
    /// Timestamp of the last shot; `None` until the first shot.
    pub last_shot_at: Option<u64>,
}

impl Building {
    /// Create a building. Towers can shoot; the main tower starts dormant.
    #[must_use]
    pub fn new(
        id: BuildingId,
        side: Side,
        role: BuildingRole,
        position: Vec2,
        max_health: u32,
        range: f32,
    ) -> Self {
        Self {
            id,
            side,
            role,
            position,
            health: max_health,
            max_health,
            range,
            can_shoot: role.is_tower(),
            activated: role != BuildingRole::MainTower,
            target: None,
            last_shot_at: None,
        }
    }

    /// Liveness check.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Apply damage, clamping health at zero.
    pub fn apply_damage(&mut self, amount: u32) {
        self.health = self.health.saturating_sub(amount);
    }

    /// Remaining health as a fraction of maximum.
    #[must_use]
    pub fn health_fraction(&self) -> f32 {
        if self.max_health == 0 {
            0.0
        } else {
            self.health as f32 / self.max_health as f32
        }
    }
}

/// Authoritative container for live units and buildings.
///
/// Only the battle session inserts and removes entities; the targeting
/// engine and combat resolver read and flag state through it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct World {
    units: HashMap<UnitId, Unit>,
    buildings: HashMap<BuildingId, Building>,
    next_unit_id: UnitId,
    next_building_id: BuildingId,
}

impl World {
    /// Create an empty world.
    #[must_use]
    pub fn new() -> Self {
        Self {
            units: HashMap::new(),
            buildings: HashMap::new(),
            next_unit_id: 1,
            next_building_id: 1,
        }
    }

    /// Spawn a unit at full health and return its id.
    pub fn spawn_unit(
        &mut self,
        side: Side,
        kind: UnitKind,
        spec: UnitSpec,
        position: Vec2,
    ) -> UnitId {
        let id = self.next_unit_id;
        self.next_unit_id += 1;
        self.units.insert(id, Unit::new(id, side, kind, spec, position));
        id
    }

    /// Place a building and return its id.
    pub fn spawn_building(
        &mut self,
        side: Side,
        role: BuildingRole,
        position: Vec2,
        max_health: u32,
        range: f32,
    ) -> BuildingId {
        let id = self.next_building_id;
        self.next_building_id += 1;
        self.buildings
            .insert(id, Building::new(id, side, role, position, max_health, range));
        id
    }

    /// Get a unit by id.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    /// Get a mutable unit by id.
    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.get_mut(&id)
    }

    /// Get a building by id.
    #[must_use]
    pub fn building(&self, id: BuildingId) -> Option<&Building> {
        self.buildings.get(&id)
    }

    /// Get a mutable building by id.
    pub fn building_mut(&mut self, id: BuildingId) -> Option<&mut Building> {
        self.buildings.get_mut(&id)
    }

    /// Sorted unit ids for deterministic iteration.
    #[must_use]
    pub fn sorted_unit_ids(&self) -> Vec<UnitId> {
        let mut ids: Vec<_> = self.units.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Sorted building ids for deterministic iteration.
    #[must_use]
    pub fn sorted_building_ids(&self) -> Vec<BuildingId> {
        let mut ids: Vec<_> = self.buildings.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Iterate all units (not in deterministic order).
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    /// Iterate all buildings (not in deterministic order).
    pub fn buildings(&self) -> impl Iterator<Item = &Building> {
        self.buildings.values()
    }

    /// Count live units on a side.
    #[must_use]
    pub fn live_unit_count(&self, side: Side) -> usize {
        self.units
            .values()
            .filter(|u| u.side == side && u.is_alive())
            .count()
    }

    /// Count live units on a side of a given kind.
    #[must_use]
    pub fn live_unit_count_of(&self, side: Side, kind: UnitKind) -> usize {
        self.units
            .values()
            .filter(|u| u.side == side && u.kind == kind && u.is_alive())
            .count()
    }

    /// A side's main tower, dead or alive.
    #[must_use]
    pub fn main_tower(&self, side: Side) -> Option<&Building> {
        self.buildings
            .values()
            .find(|b| b.side == side && b.role == BuildingRole::MainTower)
    }

    /// Resolve a weak target reference to liveness.
    #[must_use]
    pub fn target_alive(&self, target: TargetRef) -> bool {
        match target {
            TargetRef::Unit(id) => self.units.get(&id).is_some_and(Unit::is_alive),
            TargetRef::Building(id) => self.buildings.get(&id).is_some_and(Building::is_alive),
        }
    }

    /// Resolve a weak target reference to a position, if it is still live.
    #[must_use]
    pub fn target_position(&self, target: TargetRef) -> Option<Vec2> {
        match target {
            TargetRef::Unit(id) => self.units.get(&id).filter(|u| u.is_alive()).map(|u| u.position),
            TargetRef::Building(id) => self
                .buildings
                .get(&id)
                .filter(|b| b.is_alive())
                .map(|b| b.position),
        }
    }

    /// Remove every dead entity and invalidate references to them.
    ///
    /// Called by the session at end of tick, never mid-iteration. Returns
    /// the removed ids.
    pub fn sweep_dead(&mut self) -> (Vec<UnitId>, Vec<BuildingId>) {
        let dead_units: Vec<UnitId> = self
            .units
            .iter()
            .filter(|(_, u)| !u.is_alive())
            .map(|(id, _)| *id)
            .collect();
        let dead_buildings: Vec<BuildingId> = self
            .buildings
            .iter()
            .filter(|(_, b)| !b.is_alive())
            .map(|(id, _)| *id)
            .collect();

        for id in &dead_units {
            self.units.remove(id);
        }
        for id in &dead_buildings {
            self.buildings.remove(id);
        }

        // Dangling target fields are cleared eagerly; holders also
        // re-validate through the liveness lookups every use.
        let gone = |t: TargetRef| match t {
            TargetRef::Unit(id) => dead_units.contains(&id),
            TargetRef::Building(id) => dead_buildings.contains(&id),
        };
        for unit in self.units.values_mut() {
            if unit.target.is_some_and(&gone) {
                unit.target = None;
            }
        }
        for building in self.buildings.values_mut() {
            if building.target.is_some_and(&gone) {
                building.target = None;
            }
        }

        (dead_units, dead_buildings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::UnitCatalog;

    fn spawn(world: &mut World, side: Side, kind: UnitKind) -> UnitId {
        let spec = *UnitCatalog::default().get(kind).unwrap();
        world.spawn_unit(side, kind, spec, Vec2::new(100.0, 100.0))
    }

    #[test]
    fn test_health_clamps_at_zero() {
        let mut world = World::new();
        let id = spawn(&mut world, Side::Player, UnitKind::Light);
        let unit = world.unit_mut(id).unwrap();
        unit.apply_damage(u32::MAX);
        assert_eq!(unit.health, 0);
        assert!(!unit.is_alive());
    }

    #[test]
    fn test_moving_and_attacking_are_exclusive() {
        let mut world = World::new();
        let id = spawn(&mut world, Side::Player, UnitKind::Medium);
        let unit = world.unit_mut(id).unwrap();

        unit.begin_moving();
        assert!(unit.moving && !unit.attacking);
        unit.begin_attacking();
        assert!(!unit.moving && unit.attacking);
        unit.stand_down();
        assert!(!unit.moving && !unit.attacking);
    }

    #[test]
    fn test_main_tower_starts_dormant() {
        let mut world = World::new();
        let main = world.spawn_building(
            Side::Player,
            BuildingRole::MainTower,
            Vec2::ZERO,
            2000,
            240.0,
        );
        let guard =
            world.spawn_building(Side::Player, BuildingRole::GuardTower, Vec2::ZERO, 1000, 240.0);

        assert!(!world.building(main).unwrap().activated);
        assert!(world.building(guard).unwrap().activated);
        assert!(world.building(main).unwrap().can_shoot);
    }

    #[test]
    fn test_sweep_clears_dangling_targets() {
        let mut world = World::new();
        let victim = spawn(&mut world, Side::Opponent, UnitKind::Light);
        let hunter = spawn(&mut world, Side::Player, UnitKind::Medium);
        world.unit_mut(hunter).unwrap().target = Some(TargetRef::Unit(victim));

        world.unit_mut(victim).unwrap().apply_damage(u32::MAX);
        assert!(!world.target_alive(TargetRef::Unit(victim)));

        let (dead_units, dead_buildings) = world.sweep_dead();
        assert_eq!(dead_units, vec![victim]);
        assert!(dead_buildings.is_empty());
        assert_eq!(world.unit(hunter).unwrap().target, None);
        assert!(world.unit(victim).is_none());
    }

    #[test]
    fn test_stun_expiry() {
        let mut world = World::new();
        let id = spawn(&mut world, Side::Player, UnitKind::FastAttack);
        let unit = world.unit_mut(id).unwrap();
        unit.stunned_until = Some(5000);

        assert!(unit.is_stunned(4999));
        assert!(!unit.is_stunned(5000));
    }
}
