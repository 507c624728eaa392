//! Data-driven unit stat catalog and tower tuning.
//!
//! Unit identity is a closed enum over the six combat categories, with an
//! explicit kind -> stats lookup table loadable from RON. A compiled-in
//! default table means the engine works with zero data files. Tower combat
//! constants live in [`TowerTuning`] rather than a data table.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{BattleError, Result};

/// Closed set of unit categories.
///
/// Exhaustiveness-checkable by the compiler; all per-kind tables
/// (base stats, AI positional bonuses) key off this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitKind {
    /// Light tank - cheap, quick, thin armor.
    Light,
    /// Medium tank - the all-rounder.
    Medium,
    /// Heavy tank - slow, expensive, thick frontal armor.
    Heavy,
    /// Tank destroyer - high penetration, long gun, fragile.
    TankDestroyer,
    /// Artillery - longest range, siege role, targets buildings only.
    Artillery,
    /// Fast attack vehicle - fastest mover, flanker.
    FastAttack,
}

impl UnitKind {
    /// All unit kinds, in deck order.
    pub const ALL: [Self; 6] = [
        Self::Light,
        Self::Medium,
        Self::Heavy,
        Self::TankDestroyer,
        Self::Artillery,
        Self::FastAttack,
    ];
}

/// Directional armor values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Armor {
    /// Frontal armor - the value used by the damage formula.
    pub front: u32,
    /// Side armor.
    pub side: u32,
    /// Rear armor.
    pub rear: u32,
}

impl Armor {
    /// Create a new armor block.
    #[must_use]
    pub const fn new(front: u32, side: u32, rear: u32) -> Self {
        Self { front, side, rear }
    }
}

/// Base stats for a unit kind.
///
/// # Example RON
///
/// ```ron
/// UnitSpec(
///     max_health: 700,
///     damage: 90,
///     speed: 70.0,
///     range: 180.0,
///     armor: Armor(front: 90, side: 60, rear: 40),
///     penetration: 110,
///     projectile_speed: 520.0,
///     cost: 3,
///     targets_buildings_only: false,
/// )
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitSpec {
    /// Maximum hit points.
    pub max_health: u32,
    /// Base damage per shot.
    pub damage: u32,
    /// Movement speed in world units per second.
    pub speed: f32,
    /// Attack range in world units.
    pub range: f32,
    /// Directional armor.
    pub armor: Armor,
    /// Armor penetration value.
    pub penetration: u32,
    /// Projectile travel speed in world units per second.
    pub projectile_speed: f32,
    /// Energy cost to deploy.
    pub cost: u32,
    /// Siege restriction: only opposing buildings are valid targets.
    #[serde(default)]
    pub targets_buildings_only: bool,
}

/// Kind -> stats lookup table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitCatalog {
    specs: HashMap<UnitKind, UnitSpec>,
}

impl UnitCatalog {
    /// Look up the stats for a unit kind.
    #[must_use]
    pub fn get(&self, kind: UnitKind) -> Option<&UnitSpec> {
        self.specs.get(&kind)
    }

    /// Load a catalog from a RON document.
    ///
    /// # Errors
    ///
    /// Returns [`BattleError::CatalogParseError`] on malformed RON and
    /// [`BattleError::MissingCatalogEntry`] when a kind has no entry.
    pub fn from_ron_str(contents: &str) -> Result<Self> {
        let specs: HashMap<UnitKind, UnitSpec> =
            ron::from_str(contents).map_err(|e| BattleError::CatalogParseError(e.to_string()))?;
        let catalog = Self { specs };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Ensure every unit kind has a stat entry.
    fn validate(&self) -> Result<()> {
        for kind in UnitKind::ALL {
            if !self.specs.contains_key(&kind) {
                return Err(BattleError::MissingCatalogEntry(kind));
            }
        }
        Ok(())
    }
}

impl Default for UnitCatalog {
    /// Compiled-in stat table covering all six kinds.
    fn default() -> Self {
        let mut specs = HashMap::new();
        specs.insert(
            UnitKind::Light,
            UnitSpec {
                max_health: 420,
                damage: 60,
                speed: 90.0,
                range: 160.0,
                armor: Armor::new(40, 30, 20),
                penetration: 70,
                projectile_speed: 500.0,
                cost: 2,
                targets_buildings_only: false,
            },
        );
        specs.insert(
            UnitKind::Medium,
            UnitSpec {
                max_health: 700,
                damage: 90,
                speed: 70.0,
                range: 180.0,
                armor: Armor::new(90, 60, 40),
                penetration: 110,
                projectile_speed: 520.0,
                cost: 3,
                targets_buildings_only: false,
            },
        );
        specs.insert(
            UnitKind::Heavy,
            UnitSpec {
                max_health: 1200,
                damage: 160,
                speed: 50.0,
                range: 170.0,
                armor: Armor::new(160, 110, 70),
                penetration: 140,
                projectile_speed: 480.0,
                cost: 5,
                targets_buildings_only: false,
            },
        );
        specs.insert(
            UnitKind::TankDestroyer,
            UnitSpec {
                max_health: 560,
                damage: 130,
                speed: 65.0,
                range: 210.0,
                armor: Armor::new(70, 50, 35),
                penetration: 190,
                projectile_speed: 640.0,
                cost: 4,
                targets_buildings_only: false,
            },
        );
        specs.insert(
            UnitKind::Artillery,
            UnitSpec {
                max_health: 380,
                damage: 140,
                speed: 45.0,
                range: 260.0,
                armor: Armor::new(30, 25, 20),
                penetration: 90,
                projectile_speed: 380.0,
                cost: 4,
                targets_buildings_only: true,
            },
        );
        specs.insert(
            UnitKind::FastAttack,
            UnitSpec {
                max_health: 340,
                damage: 55,
                speed: 110.0,
                range: 150.0,
                armor: Armor::new(35, 25, 15),
                penetration: 65,
                projectile_speed: 540.0,
                cost: 2,
                targets_buildings_only: false,
            },
        );
        Self { specs }
    }
}

/// Tower combat constants.
///
/// Towers are not data-driven the way units are; their numbers live here
/// as configurable fields with defaults so they can be retuned without
/// inventing a data schema.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TowerTuning {
    /// Damage per tower shot, independent of any unit stat.
    pub damage: u32,
    /// Tower shell penetration.
    pub penetration: u32,
    /// Tower attack range in world units.
    pub range: f32,
    /// Minimum milliseconds between tower shots.
    pub rate_of_fire_ms: u64,
    /// Tower projectile speed in world units per second.
    pub projectile_speed: f32,
}

impl Default for TowerTuning {
    fn default() -> Self {
        Self {
            damage: 110,
            penetration: 220,
            range: 240.0,
            rate_of_fire_ms: 1500,
            projectile_speed: 620.0,
        }
    }
}
