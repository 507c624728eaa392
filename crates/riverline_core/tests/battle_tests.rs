//! Full-session integration tests.
//!
//! These drive the whole tick pipeline - targeting, pathing, combat,
//! opponent decisions - through the public session API.

use riverline_core::prelude::*;
use riverline_test_utils::fixtures::{seeded_session, short_session};

/// Step a session with a fixed tick length, collecting every event.
fn run_for(session: &mut BattleSession, from_ms: u64, to_ms: u64, step_ms: u64) -> Vec<BattleEvent> {
    let mut all = Vec::new();
    let mut now = from_ms;
    while now <= to_ms {
        let events = session.tick(now);
        all.extend(events.events);
        now += step_ms;
    }
    all
}

#[test]
fn test_opponent_deploys_without_player_input() {
    let mut session = seeded_session(5);
    let events = run_for(&mut session, 0, 30_000, 100);

    let deployments = events
        .iter()
        .filter(|e| matches!(e, BattleEvent::UnitDeployed { side: Side::Opponent, .. }))
        .count();
    assert!(deployments > 0, "opponent never deployed in 30s");

    // Every deployment request targets the opponent's own zone.
    for event in &events {
        if let BattleEvent::DeploymentRequested { side, position, .. } = event {
            assert_eq!(*side, Side::Opponent);
            assert!(session.map().is_valid_deployment(Side::Opponent, false, *position));
        }
    }
}

#[test]
fn test_stats_stay_consistent_through_a_fight() {
    let mut session = seeded_session(13);
    session.set_expanded_zone(Side::Player, true);

    // A heavy dropped near the opponent's left guard tower starts a fight.
    let spot = session.map().tile_to_world(3, 10);
    session
        .deploy(Side::Player, UnitKind::Heavy, spot)
        .expect("expanded-zone deploy must succeed");

    run_for(&mut session, 0, 25_000, 100);

    let stats = session.stats();
    for side in [Side::Player, Side::Opponent] {
        let s = stats.side(side);
        assert!(s.shots_hit <= s.shots_fired, "{side:?} hit more than it fired");
    }
    // The heavy is in tower range from the start: building damage lands.
    assert!(stats.side(Side::Player).building_damage > 0);
    // The guard tower shoots back.
    assert!(stats.side(Side::Opponent).shots_fired > 0);
    assert!(stats.side(Side::Player).damage_taken > 0);
}

#[test]
fn test_energy_never_leaves_bounds() {
    let mut session = seeded_session(21);
    let mut now = 0;
    while now <= 60_000 {
        session.tick(now);
        for side in [Side::Player, Side::Opponent] {
            let e = session.energy(side);
            assert!((0.0..=10.0).contains(&e), "{side:?} energy {e} out of bounds");
        }
        now += 250;
    }
}

#[test]
fn test_identical_seeds_replay_identically() {
    let mut a = seeded_session(99);
    let mut b = seeded_session(99);

    let spot = a.map().tile_to_world(5, 22);
    a.deploy(Side::Player, UnitKind::Medium, spot);
    b.deploy(Side::Player, UnitKind::Medium, spot);

    let events_a = run_for(&mut a, 0, 45_000, 100);
    let events_b = run_for(&mut b, 0, 45_000, 100);

    assert_eq!(events_a, events_b);
    assert_eq!(a.stats(), b.stats());
}

#[test]
fn test_timeout_judges_by_tower_health() {
    let mut session = short_session(3, 2000);
    session.tick(0);

    // Scratch the player's main tower so the opponent leads on fractions.
    let tower = session.world().main_tower(Side::Player).unwrap().id;
    session
        .world_mut()
        .building_mut(tower)
        .unwrap()
        .apply_damage(500);

    session.tick(1000);
    let events = session.tick(2000);
    assert!(events.match_ended());
    assert_eq!(session.outcome(), Some(MatchOutcome::Victory(Side::Opponent)));
}

#[test]
fn test_match_end_freezes_the_world() {
    let mut session = short_session(4, 1000);
    session.tick(0);
    session.tick(1000);
    assert!(session.outcome().is_some());

    let spot = session.map().tile_to_world(5, 22);
    assert_eq!(session.deploy(Side::Player, UnitKind::Light, spot), None);
    assert!(session.tick(2000).events.is_empty());
}
