//! Fixtures shared by engine and service tests.

use gauntlet_types::Session;
use rand::{rngs::StdRng, SeedableRng};

use crate::{lifecycle, DayScheduler};

/// Deterministic RNG for reproducible games.
pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Creates a session in signup with the given players registered (names are upper-cased ids).
pub fn signup_session(id: &str, players: &[&str], rng: &mut StdRng) -> Session {
    let mut session = Session::new(id);
    lifecycle::open_signup(&mut session).expect("fresh session opens signup");
    for player in players {
        lifecycle::register_player(&mut session, player, &player.to_uppercase(), rng)
            .expect("fixture player registers");
    }
    session
}

/// Creates a running session at day 0 with `players` plus `npcs` synthetic tributes, started
/// at t=0 with the default day schedule.
pub fn running_session(id: &str, players: &[&str], npcs: usize, rng: &mut StdRng) -> Session {
    let mut session = signup_session(id, players, rng);
    lifecycle::start(&mut session, npcs, 0, &DayScheduler::default(), rng)
        .expect("fixture game starts");
    session
}
