use serde::{Deserialize, Serialize};

use super::{
    BASE_CONSTITUTION, BASE_DEFENSE, BASE_HIT_POINTS, BASE_STRENGTH, BASE_WISDOM, CORNUCOPIA,
    FACTION_COUNT, FACTION_TABLE,
};

/// One of the five tracked stats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stat {
    Defense,
    Strength,
    Constitution,
    Wisdom,
    HitPoints,
}

impl Stat {
    /// Enumeration order; ties in "highest stat" resolve to the earliest entry.
    pub const ALL: [Stat; 5] = [
        Stat::Defense,
        Stat::Strength,
        Stat::Constitution,
        Stat::Wisdom,
        Stat::HitPoints,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stat::Defense => "defense",
            Stat::Strength => "strength",
            Stat::Constitution => "constitution",
            Stat::Wisdom => "wisdom",
            Stat::HitPoints => "hit points",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatBlock {
    pub defense: u32,
    pub strength: u32,
    pub constitution: u32,
    pub wisdom: u32,
    pub hit_points: u32,
}

impl StatBlock {
    pub fn base() -> Self {
        Self {
            defense: BASE_DEFENSE,
            strength: BASE_STRENGTH,
            constitution: BASE_CONSTITUTION,
            wisdom: BASE_WISDOM,
            hit_points: BASE_HIT_POINTS,
        }
    }

    /// Starting stats for a tribute drawn from `faction` (1-based).
    ///
    /// Low-numbered districts start with more hit points; every district also carries a fixed
    /// +2 spread over the other four stats.
    pub fn for_faction(faction: u8) -> Self {
        let faction = faction.clamp(1, FACTION_COUNT);
        let [defense, strength, constitution, wisdom] = FACTION_TABLE[(faction - 1) as usize];
        let mut stats = Self::base();
        stats.defense += defense;
        stats.strength += strength;
        stats.constitution += constitution;
        stats.wisdom += wisdom;
        stats.hit_points += u32::from(FACTION_COUNT - faction);
        stats
    }

    pub fn get(&self, stat: Stat) -> u32 {
        match stat {
            Stat::Defense => self.defense,
            Stat::Strength => self.strength,
            Stat::Constitution => self.constitution,
            Stat::Wisdom => self.wisdom,
            Stat::HitPoints => self.hit_points,
        }
    }

    pub fn get_mut(&mut self, stat: Stat) -> &mut u32 {
        match stat {
            Stat::Defense => &mut self.defense,
            Stat::Strength => &mut self.strength,
            Stat::Constitution => &mut self.constitution,
            Stat::Wisdom => &mut self.wisdom,
            Stat::HitPoints => &mut self.hit_points,
        }
    }

    pub fn total(&self) -> u32 {
        Stat::ALL
            .iter()
            .fold(0u32, |acc, stat| acc.saturating_add(self.get(*stat)))
    }

    /// Highest stat; ties go to the earliest stat in [`Stat::ALL`].
    pub fn highest(&self) -> Stat {
        let mut best = Stat::Defense;
        for stat in Stat::ALL {
            if self.get(stat) > self.get(best) {
                best = stat;
            }
        }
        best
    }
}

/// Daily action. `None` means no action has been submitted yet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    #[default]
    None,
    Hunt,
    Rest,
    Loot,
    Feast,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::None => "none",
            Action::Hunt => "hunt",
            Action::Rest => "rest",
            Action::Loot => "loot",
            Action::Feast => "feast",
        }
    }
}

/// Where a tribute currently stands.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    Zone(String),
    Cornucopia,
}

impl Location {
    pub fn name(&self) -> &str {
        match self {
            Location::Zone(name) => name,
            Location::Cornucopia => CORNUCOPIA,
        }
    }

    pub fn zone(&self) -> Option<&str> {
        match self {
            Location::Zone(name) => Some(name),
            Location::Cornucopia => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub stat: Stat,
    pub bonus: u32,
}

/// A combatant in one game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tribute {
    pub id: String,
    pub name: String,
    pub faction: u8,
    pub stats: StatBlock,
    pub alive: bool,
    pub action: Action,
    pub location: Option<Location>,
    pub items: Vec<Item>,
    pub kills: Vec<String>,
    pub eliminated_on_day: Option<u32>,
    /// Filler tributes added at start; they never receive winner payouts.
    pub synthetic: bool,
}

impl Tribute {
    pub fn new(id: String, name: String, faction: u8, synthetic: bool) -> Self {
        Self {
            id,
            name,
            faction,
            stats: StatBlock::for_faction(faction),
            alive: true,
            action: Action::None,
            location: None,
            items: Vec::new(),
            kills: Vec::new(),
            eliminated_on_day: None,
            synthetic,
        }
    }

    /// Name of the zone the tribute occupies, if it is in an ordinary zone.
    pub fn zone(&self) -> Option<&str> {
        self.location.as_ref().and_then(Location::zone)
    }

    pub fn is_in_zone(&self, zone: &str) -> bool {
        self.zone() == Some(zone)
    }
}
