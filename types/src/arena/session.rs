use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Ledger, Tribute, Zone};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Signup,
    Running,
    #[default]
    Ended,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::Signup => "signup",
            SessionPhase::Running => "running",
            SessionPhase::Ended => "ended",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Elimination {
    pub name: String,
    pub day: u32,
}

/// All state for one arena (for example one chat channel).
///
/// Game state is rebuilt for every game; only `wins` and `game_number` survive
/// [`Session::clear_game`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub phase: SessionPhase,
    pub day_counter: u32,
    pub day_start_ms: u64,
    pub day_duration_ms: u64,
    pub game_active: bool,
    pub feast_active: bool,
    pub tributes: BTreeMap<String, Tribute>,
    pub active_zones: Vec<Zone>,
    pub zone_pool: Vec<Zone>,
    pub eliminations: Vec<Elimination>,
    pub wins: BTreeMap<String, u32>,
    pub ledger: Ledger,
    pub game_number: u64,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            zone_pool: Zone::catalog(),
            ..Self::default()
        }
    }

    pub fn is_running(&self) -> bool {
        self.phase == SessionPhase::Running
    }

    pub fn alive(&self) -> impl Iterator<Item = &Tribute> {
        self.tributes.values().filter(|tribute| tribute.alive)
    }

    pub fn alive_count(&self) -> usize {
        self.alive().count()
    }

    pub fn alive_ids(&self) -> Vec<String> {
        self.alive().map(|tribute| tribute.id.clone()).collect()
    }

    pub fn is_active_zone(&self, name: &str) -> bool {
        self.active_zones.iter().any(|zone| zone.name == name)
    }

    /// Drop everything belonging to the current game, keeping the cross-game win leaderboard.
    pub fn clear_game(&mut self) {
        self.day_counter = 0;
        self.day_start_ms = 0;
        self.day_duration_ms = 0;
        self.game_active = false;
        self.feast_active = false;
        self.tributes.clear();
        self.active_zones.clear();
        self.zone_pool = Zone::catalog();
        self.eliminations.clear();
        self.ledger.clear();
    }

    /// Milliseconds left in the current day window.
    pub fn time_remaining_ms(&self, now_ms: u64) -> u64 {
        self.day_start_ms
            .saturating_add(self.day_duration_ms)
            .saturating_sub(now_ms)
    }
}
