//! Property-based tests for the combat formula, health clamp, and
//! pathfinder output.

use riverline_core::prelude::*;
use riverline_test_utils::fixtures::spawn_unit_at;
use riverline_test_utils::proptest::prelude::*;

proptest! {
    /// A penetrating shot always deals full base damage.
    #[test]
    fn prop_clean_penetration_deals_full_damage(
        base in 0u32..5000,
        armor in 0u32..1000,
        extra in 0u32..1000,
    ) {
        let penetration = armor + extra;
        let (damage, ratio) = resolve_damage(base, penetration, armor);
        prop_assert_eq!(damage, base);
        prop_assert!((ratio - 1.0).abs() < f32::EPSILON);
    }

    /// A non-penetrating shot deals the floored fraction, bounded by the
    /// ratio floor, and never exceeds base damage.
    #[test]
    fn prop_partial_penetration_is_floored_fraction(
        base in 0u32..5000,
        armor in 1u32..1000,
        penetration in 0u32..1000,
    ) {
        prop_assume!(penetration < armor);
        let (damage, ratio) = resolve_damage(base, penetration, armor);

        let expected_ratio = (penetration as f32 / armor as f32).max(0.1);
        prop_assert!((ratio - expected_ratio).abs() < 1e-6);
        prop_assert!((0.1..=1.0).contains(&ratio));
        prop_assert_eq!(damage, (base as f32 * expected_ratio).floor() as u32);
        prop_assert!(damage <= base);
        prop_assert!(damage >= (base as f32 * 0.1).floor() as u32);
    }

    /// No sequence of damage applications drives health out of
    /// `[0, max_health]`.
    #[test]
    fn prop_health_stays_clamped(hits in prop::collection::vec(0u32..2000, 0..64)) {
        let mut world = World::new();
        let id = spawn_unit_at(&mut world, Side::Player, UnitKind::Medium, Vec2::ZERO);
        let max = world.unit(id).unwrap().spec.max_health;

        for hit in hits {
            let unit = world.unit_mut(id).unwrap();
            unit.apply_damage(hit);
            let health = world.unit(id).unwrap().health;
            prop_assert!(health <= max);
        }
    }

    /// Every returned path is 4-connected and stays out of the river
    /// except on bridges.
    #[test]
    fn prop_paths_are_adjacent_and_walkable(
        sx in 0u32..18, sy in 0u32..30,
        gx in 0u32..18, gy in 0u32..30,
    ) {
        let map = BattleMap::default();
        prop_assume!(map.is_walkable(sx, sy) && map.is_walkable(gx, gy));

        let cfg = PathfinderConfig::default();
        let start = map.tile_to_world(sx, sy);
        let goal = map.tile_to_world(gx, gy);

        if let Some(path) = find_path(&map, &cfg, start, goal) {
            prop_assert!(!path.is_empty());
            prop_assert_eq!(map.world_to_tile(path[0]), Some((sx, sy)));
            prop_assert_eq!(map.world_to_tile(*path.last().unwrap()), Some((gx, gy)));

            for pair in path.windows(2) {
                let (ax, ay) = map.world_to_tile(pair[0]).unwrap();
                let (bx, by) = map.world_to_tile(pair[1]).unwrap();
                prop_assert_eq!(ax.abs_diff(bx) + ay.abs_diff(by), 1);
                prop_assert!(map.is_walkable(bx, by));
            }
        }
    }

    /// Degenerate searches return a single-waypoint path.
    #[test]
    fn prop_identical_endpoints_degenerate(x in 0u32..18, y in 0u32..30) {
        let map = BattleMap::default();
        prop_assume!(map.is_walkable(x, y));

        let cfg = PathfinderConfig::default();
        let p = map.tile_to_world(x, y);
        let path = find_path(&map, &cfg, p, p).unwrap();
        prop_assert_eq!(path.len(), 1);
    }
}
