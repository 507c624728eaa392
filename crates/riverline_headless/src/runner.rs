//! Drives scripted battles to completion.
//!
//! The opponent side plays itself through the decision engine; the
//! player side follows a simple scripted policy so matches resolve
//! without human input. Used for balance smoke tests and CI.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use riverline_core::prelude::*;

/// Result of one headless battle.
#[derive(Debug, Clone, Serialize)]
pub struct BattleSummary {
    /// Seed the battle ran under.
    pub seed: u64,
    /// Final outcome.
    pub outcome: MatchOutcome,
    /// Ticks simulated.
    pub ticks: u64,
    /// Simulated match time in milliseconds.
    pub sim_time_ms: u64,
    /// Units the scripted player deployed.
    pub player_deployments: u32,
    /// Units the opponent deployed.
    pub opponent_deployments: u32,
    /// Final per-side statistics.
    pub stats: BattleStats,
}

/// Scripted stand-in for the human player.
///
/// Cycles through the deck, deploying whenever energy allows at a
/// random tile of the player zone.
struct ScriptedPlayer {
    deck: Vec<UnitKind>,
    next_index: usize,
    next_attempt_at: u64,
    rng: ChaCha8Rng,
}

impl ScriptedPlayer {
    fn new(seed: u64) -> Self {
        Self {
            deck: UnitKind::ALL.to_vec(),
            next_index: 0,
            next_attempt_at: 0,
            rng: ChaCha8Rng::seed_from_u64(seed ^ 0x5eed_1e55),
        }
    }

    fn act(&mut self, session: &mut BattleSession, now: u64) -> bool {
        if now < self.next_attempt_at {
            return false;
        }
        let kind = self.deck[self.next_index % self.deck.len()];
        let zone = *session.map().deploy_zone(Side::Player, false);
        let x = self.rng.gen_range(zone.min_x..=zone.max_x);
        let y = self.rng.gen_range(zone.min_y..=zone.max_y);
        let position = session.map().tile_to_world(x, y);

        match session.deploy(Side::Player, kind, position) {
            Some(_) => {
                self.next_index += 1;
                self.next_attempt_at = now + self.rng.gen_range(2000..=5000);
                true
            }
            None => {
                // Not enough energy or a bad tile; retry shortly.
                self.next_attempt_at = now + 500;
                false
            }
        }
    }
}

/// Run one battle to completion.
///
/// # Errors
///
/// Returns configuration errors from session construction.
pub fn run_battle(seed: u64, match_duration_ms: u64, tick_ms: u64) -> Result<BattleSummary> {
    let config = SessionConfig {
        seed,
        match_duration_ms,
        ..SessionConfig::default()
    };
    let mut session = BattleSession::with_defaults(config)?;
    let mut player = ScriptedPlayer::new(seed);

    let mut now: u64 = 0;
    let mut ticks: u64 = 0;
    let mut player_deployments: u32 = 0;
    let mut opponent_deployments: u32 = 0;

    loop {
        if player.act(&mut session, now) {
            player_deployments += 1;
        }
        let events = session.tick(now);
        ticks += 1;
        for event in events.iter() {
            if let BattleEvent::UnitDeployed {
                side: Side::Opponent,
                ..
            } = event
            {
                opponent_deployments += 1;
            }
        }
        if events.match_ended() {
            break;
        }
        now += tick_ms;
    }

    let outcome = session
        .outcome()
        .expect("loop exits only after the match ends");
    tracing::info!(seed, ?outcome, ticks, "battle finished");

    Ok(BattleSummary {
        seed,
        outcome,
        ticks,
        sim_time_ms: now,
        player_deployments,
        opponent_deployments,
        stats: *session.stats(),
    })
}
