use serde::{Deserialize, Serialize};

use super::Stat;

/// Out-of-band game master interventions, applied immediately.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AdminEvent {
    /// Every living tribute loses `amount` of `stat` (floor 1).
    Debuff { stat: Stat, amount: u32 },
    /// Every living tribute is made to hunt today.
    ForceHunt,
    /// One random living tribute takes `min..=max` damage.
    Trap { min: u32, max: u32 },
    /// One random living tribute gains `min..=max` in `stat` (random stat when absent).
    Blessing {
        #[serde(default)]
        stat: Option<Stat>,
        min: u32,
        max: u32,
    },
    /// Every living tribute is raised to the highest stat total in the arena.
    Equalizer,
}

impl AdminEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdminEvent::Debuff { .. } => "debuff",
            AdminEvent::ForceHunt => "force_hunt",
            AdminEvent::Trap { .. } => "trap",
            AdminEvent::Blessing { .. } => "blessing",
            AdminEvent::Equalizer => "equalizer",
        }
    }
}
