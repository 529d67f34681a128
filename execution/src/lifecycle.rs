//! Session lifecycle transitions: signup, start, actions, stop and game end.
//!
//! Every transition validates first and mutates only once all checks pass.

use gauntlet_types::{
    Action, ArenaError, Payout, Session, SessionPhase, DEFAULT_ZONE_POOL_SIZE, MAX_TRIBUTES,
    MIN_TRIBUTES, NPC_NAMES,
};
use rand::Rng;
use tracing::{debug, info};

use crate::day_scheduler::DayScheduler;
use crate::{ledger, registry, zones};

/// Result of a game that reached its conclusion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameOutcome {
    pub winner_id: Option<String>,
    pub winner_name: Option<String>,
    pub payouts: Vec<Payout>,
    pub day: u32,
    pub game_number: u64,
}

/// Open a fresh signup, discarding whatever the previous game left behind.
pub fn open_signup(session: &mut Session) -> Result<(), ArenaError> {
    if matches!(session.phase, SessionPhase::Signup | SessionPhase::Running) {
        return Err(ArenaError::GameAlreadyActive);
    }
    session.clear_game();
    session.phase = SessionPhase::Signup;
    Ok(())
}

pub fn register_player(
    session: &mut Session,
    id: &str,
    name: &str,
    rng: &mut impl Rng,
) -> Result<(), ArenaError> {
    match session.phase {
        SessionPhase::Running => return Err(ArenaError::GameAlreadyActive),
        SessionPhase::Ended => return Err(ArenaError::SignupNotOpen),
        SessionPhase::Signup => {}
    }
    registry::register(session, id, name, false, rng)?;
    Ok(())
}

/// Name for the `index`-th synthetic tribute (0-based).
pub fn npc_name(index: usize) -> String {
    NPC_NAMES
        .get(index)
        .map(|name| name.to_string())
        .unwrap_or_else(|| format!("Tribute {}", index + 1))
}

/// Fill the arena with up to `npc_count` synthetic tributes and start the first day at `now_ms`.
pub fn start(
    session: &mut Session,
    npc_count: usize,
    now_ms: u64,
    scheduler: &DayScheduler,
    rng: &mut impl Rng,
) -> Result<(), ArenaError> {
    match session.phase {
        SessionPhase::Running => return Err(ArenaError::GameAlreadyActive),
        SessionPhase::Ended => return Err(ArenaError::SignupNotOpen),
        SessionPhase::Signup => {}
    }
    let npc_count = npc_count.min(MAX_TRIBUTES.saturating_sub(session.tributes.len()));
    let have = session.tributes.len() + npc_count;
    if have < MIN_TRIBUTES {
        return Err(ArenaError::NotEnoughTributes {
            have,
            required: MIN_TRIBUTES,
        });
    }

    let mut added = 0;
    let mut index = 0;
    while added < npc_count {
        let id = format!("npc-{}", index + 1);
        if !session.tributes.contains_key(&id) {
            registry::register(session, &id, &npc_name(added), true, rng)?;
            added += 1;
        }
        index += 1;
    }

    zones::pick_zones_for_new_session(session, DEFAULT_ZONE_POOL_SIZE, rng);
    zones::sanitize_all(session, rng)?;

    session.game_active = true;
    session.phase = SessionPhase::Running;
    session.day_counter = 0;
    session.game_number = session.game_number.saturating_add(1);
    scheduler.begin_next_day(session, now_ms);

    info!(
        session = %session.id,
        game = session.game_number,
        tributes = session.tributes.len(),
        synthetic = npc_count,
        "arena game started"
    );
    Ok(())
}

/// Record a living tribute's action for the current day.
pub fn submit_action(
    session: &mut Session,
    id: &str,
    action: Action,
    zone: Option<&str>,
) -> Result<(), ArenaError> {
    if !session.is_running() {
        return Err(ArenaError::NotRunning);
    }
    registry::set_action(session, id, action, zone)?;
    debug!(
        session = %session.id,
        tribute = %id,
        action = action.as_str(),
        ?zone,
        "action submitted"
    );
    Ok(())
}

/// Conclude a game: record the win, settle the ledger and clear game state.
pub fn end(session: &mut Session, winner: Option<&str>) -> GameOutcome {
    let winner_name = winner
        .and_then(|id| session.tributes.get(id))
        .map(|tribute| tribute.name.clone());
    if let Some(name) = &winner_name {
        *session.wins.entry(name.clone()).or_insert(0) += 1;
    }
    let payouts = ledger::settle_on_game_end(session, winner);
    let outcome = GameOutcome {
        winner_id: winner.map(str::to_string),
        winner_name,
        payouts,
        day: session.day_counter,
        game_number: session.game_number,
    };

    session.clear_game();
    session.phase = SessionPhase::Ended;
    info!(
        session = %session.id,
        game = outcome.game_number,
        day = outcome.day,
        winner = ?outcome.winner_name,
        payouts = outcome.payouts.len(),
        "arena game ended"
    );
    outcome
}

/// Abort a game in signup or in progress, refunding the pot to live backers.
pub fn stop(session: &mut Session) -> Result<Vec<Payout>, ArenaError> {
    if session.phase == SessionPhase::Ended {
        return Err(ArenaError::NotRunning);
    }
    let payouts = ledger::settle_on_stop(session);
    session.clear_game();
    session.phase = SessionPhase::Ended;
    info!(session = %session.id, payouts = payouts.len(), "arena game stopped");
    Ok(payouts)
}
