//! Tile-grid pathfinding using A* with explicit iteration caps.
//!
//! The search runs over 4-connected tile neighbors with uniform edge cost
//! and a Manhattan heuristic (admissible for 4-connected grids). Both the
//! search and the path reconstruction are bounded by hard iteration caps,
//! so a single call can never stall a frame; exhaustion degrades to
//! "no path" rather than an error.
//!
//! Tie-break: the open list is a binary heap ordered by f-score, then by
//! a monotonically increasing push sequence number. Among equal-f nodes
//! the first-pushed wins, so symmetric maps resolve to the
//! earliest-discovered path.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::map::BattleMap;
use crate::math::Vec2;

/// Iteration limits for the pathfinder.
///
/// Exposed as configuration so tests can force exhaustion deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathfinderConfig {
    /// Maximum open-set pops before the search aborts with no path.
    pub max_search_steps: u32,
    /// Maximum predecessor hops before reconstruction returns a partial path.
    pub max_reconstruct_steps: u32,
}

impl Default for PathfinderConfig {
    fn default() -> Self {
        Self {
            max_search_steps: 1000,
            max_reconstruct_steps: 1000,
        }
    }
}

/// A node in the A* open set.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
struct OpenNode {
    x: u32,
    y: u32,
    /// f = g + Manhattan heuristic.
    f_score: u32,
    /// Push order; lower pops first among equal f-scores.
    seq: u64,
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse for min-heap behavior.
        match other.f_score.cmp(&self.f_score) {
            Ordering::Equal => other.seq.cmp(&self.seq),
            ord => ord,
        }
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// 4-connected neighbor offsets.
const DIRECTIONS: [(i32, i32); 4] = [(1, 0), (0, 1), (-1, 0), (0, -1)];

#[inline]
fn manhattan(x1: u32, y1: u32, x2: u32, y2: u32) -> u32 {
    x1.abs_diff(x2) + y1.abs_diff(y2)
}

/// Plan a route between two world positions.
///
/// Pre-check: when start and goal lie on the same bank of the river the
/// full search is skipped and a straight segment is returned. Everything
/// else goes through [`find_path`].
#[must_use]
pub fn plan_route(
    map: &BattleMap,
    cfg: &PathfinderConfig,
    start: Vec2,
    goal: Vec2,
) -> Option<Vec<Vec2>> {
    if map.same_side_of_river(start, goal) {
        return Some(vec![start, goal]);
    }
    find_path(map, cfg, start, goal)
}

/// Find a path from start to goal using A* over 4-connected tiles.
///
/// Returns an ordered sequence of world waypoints (tile centers), or
/// `None` when no path exists, an endpoint is off-grid or unwalkable, or
/// the search exceeds its iteration cap. Never panics, never blocks.
#[must_use]
pub fn find_path(
    map: &BattleMap,
    cfg: &PathfinderConfig,
    start: Vec2,
    goal: Vec2,
) -> Option<Vec<Vec2>> {
    let Some((start_x, start_y)) = map.world_to_tile(start) else {
        tracing::warn!(?start, "pathfinding start outside grid");
        return None;
    };
    let Some((goal_x, goal_y)) = map.world_to_tile(goal) else {
        tracing::warn!(?goal, "pathfinding goal outside grid");
        return None;
    };

    if start_x == goal_x && start_y == goal_y {
        return Some(vec![map.tile_to_world(start_x, start_y)]);
    }

    if !map.is_walkable(start_x, start_y) || !map.is_walkable(goal_x, goal_y) {
        tracing::warn!(
            start = ?(start_x, start_y),
            goal = ?(goal_x, goal_y),
            "pathfinding endpoint unwalkable"
        );
        return None;
    }

    let mut open_set: BinaryHeap<OpenNode> = BinaryHeap::new();
    let mut came_from: HashMap<(u32, u32), (u32, u32)> = HashMap::new();
    let mut g_score: HashMap<(u32, u32), u32> = HashMap::new();
    let mut seq: u64 = 0;

    g_score.insert((start_x, start_y), 0);
    open_set.push(OpenNode {
        x: start_x,
        y: start_y,
        f_score: manhattan(start_x, start_y, goal_x, goal_y),
        seq,
    });

    let mut steps: u32 = 0;
    while let Some(current) = open_set.pop() {
        steps += 1;
        if steps > cfg.max_search_steps {
            tracing::warn!(
                cap = cfg.max_search_steps,
                goal = ?(goal_x, goal_y),
                "pathfinding search cap exceeded, giving up"
            );
            return None;
        }

        if current.x == goal_x && current.y == goal_y {
            return Some(reconstruct_path(map, cfg, &came_from, goal_x, goal_y));
        }

        let current_g = g_score
            .get(&(current.x, current.y))
            .copied()
            .unwrap_or(u32::MAX);

        for &(dx, dy) in &DIRECTIONS {
            let nx = current.x as i32 + dx;
            let ny = current.y as i32 + dy;
            if nx < 0 || ny < 0 {
                continue;
            }
            let (nx, ny) = (nx as u32, ny as u32);
            if !map.is_walkable(nx, ny) {
                continue;
            }

            // Uniform edge cost of 1 per tile step.
            let tentative_g = current_g.saturating_add(1);
            let neighbor_g = g_score.get(&(nx, ny)).copied().unwrap_or(u32::MAX);

            if tentative_g < neighbor_g {
                came_from.insert((nx, ny), (current.x, current.y));
                g_score.insert((nx, ny), tentative_g);
                seq += 1;
                open_set.push(OpenNode {
                    x: nx,
                    y: ny,
                    f_score: tentative_g + manhattan(nx, ny, goal_x, goal_y),
                    seq,
                });
            }
        }
    }

    None
}

/// Walk the predecessor map from the goal back to the start.
///
/// Bounded by the reconstruction cap; a predecessor cycle (a node pointing
/// back into its own ancestry) terminates the walk early. Both anomalies
/// return the partial path built so far rather than failing.
fn reconstruct_path(
    map: &BattleMap,
    cfg: &PathfinderConfig,
    came_from: &HashMap<(u32, u32), (u32, u32)>,
    goal_x: u32,
    goal_y: u32,
) -> Vec<Vec2> {
    let mut path = Vec::new();
    let mut visited: HashSet<(u32, u32)> = HashSet::new();
    let mut current = (goal_x, goal_y);

    path.push(map.tile_to_world(current.0, current.1));
    visited.insert(current);

    let mut hops: u32 = 0;
    while let Some(&prev) = came_from.get(&current) {
        hops += 1;
        if hops > cfg.max_reconstruct_steps {
            tracing::warn!(
                cap = cfg.max_reconstruct_steps,
                "path reconstruction cap exceeded, returning partial path"
            );
            break;
        }
        if !visited.insert(prev) {
            tracing::warn!(node = ?prev, "cycle in path reconstruction, returning partial path");
            break;
        }
        path.push(map.tile_to_world(prev.0, prev.1));
        current = prev;
    }

    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::BridgeSpan;

    fn assert_tile_adjacent(map: &BattleMap, path: &[Vec2]) {
        for pair in path.windows(2) {
            let (ax, ay) = map.world_to_tile(pair[0]).unwrap();
            let (bx, by) = map.world_to_tile(pair[1]).unwrap();
            assert_eq!(
                ax.abs_diff(bx) + ay.abs_diff(by),
                1,
                "waypoints {:?} -> {:?} are not 4-adjacent",
                (ax, ay),
                (bx, by)
            );
        }
    }

    #[test]
    fn test_same_tile_returns_single_point() {
        let map = BattleMap::default();
        let cfg = PathfinderConfig::default();
        let p = map.tile_to_world(5, 20);
        let path = find_path(&map, &cfg, p, p).unwrap();
        assert_eq!(path.len(), 1);
        assert_eq!(map.world_to_tile(path[0]), Some((5, 20)));
    }

    #[test]
    fn test_cross_river_path_uses_bridge() {
        let map = BattleMap::default();
        let cfg = PathfinderConfig::default();
        let start = map.tile_to_world(4, 20);
        let goal = map.tile_to_world(4, 8);

        let path = find_path(&map, &cfg, start, goal).unwrap();
        assert!(path.len() >= 13);
        assert_tile_adjacent(&map, &path);

        // Every waypoint is walkable: river tiles only via a bridge corridor
        for p in &path {
            let (x, y) = map.world_to_tile(*p).unwrap();
            assert!(map.is_walkable(x, y), "waypoint in river at {:?}", (x, y));
        }
    }

    #[test]
    fn test_no_path_when_bridges_unreachable() {
        // Bridge spans pushed off-grid leave the river uncrossable
        let map = BattleMap::default().with_bridges([
            BridgeSpan {
                min_x: 100,
                max_x: 100,
            },
            BridgeSpan {
                min_x: 200,
                max_x: 200,
            },
        ]);
        let cfg = PathfinderConfig::default();
        let start = map.tile_to_world(4, 20);
        let goal = map.tile_to_world(4, 8);

        assert_eq!(find_path(&map, &cfg, start, goal), None);
    }

    #[test]
    fn test_search_cap_forces_no_path() {
        let map = BattleMap::default();
        let cfg = PathfinderConfig {
            max_search_steps: 3,
            max_reconstruct_steps: 1000,
        };
        let start = map.tile_to_world(0, 29);
        let goal = map.tile_to_world(17, 0);

        assert_eq!(find_path(&map, &cfg, start, goal), None);
    }

    #[test]
    fn test_plan_route_same_side_is_straight() {
        let map = BattleMap::default();
        let cfg = PathfinderConfig::default();
        let start = map.tile_to_world(2, 20);
        let goal = map.tile_to_world(15, 28);

        let route = plan_route(&map, &cfg, start, goal).unwrap();
        assert_eq!(route, vec![start, goal]);
    }

    #[test]
    fn test_plan_route_cross_river_paths() {
        let map = BattleMap::default();
        let cfg = PathfinderConfig::default();
        let start = map.tile_to_world(2, 20);
        let goal = map.tile_to_world(2, 5);

        let route = plan_route(&map, &cfg, start, goal).unwrap();
        assert!(route.len() > 2);
        assert_tile_adjacent(&map, &route);
    }

    #[test]
    fn test_determinism_of_tie_break() {
        let map = BattleMap::default();
        let cfg = PathfinderConfig::default();
        let start = map.tile_to_world(8, 20);
        let goal = map.tile_to_world(8, 8);

        let a = find_path(&map, &cfg, start, goal).unwrap();
        let b = find_path(&map, &cfg, start, goal).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_endpoint_in_river_has_no_path() {
        let map = BattleMap::default();
        let cfg = PathfinderConfig::default();
        let start = map.tile_to_world(4, 20);
        let goal = map.tile_to_world(8, 14); // off-bridge river tile

        assert_eq!(find_path(&map, &cfg, start, goal), None);
    }
}
