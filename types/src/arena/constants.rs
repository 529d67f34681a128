/// Maximum display name length for tribute registration
pub const MAX_NAME_LENGTH: usize = 32;

/// Maximum tributes in a single game (players plus synthetic fillers)
pub const MAX_TRIBUTES: usize = 24;

/// Minimum tributes required to start a game
pub const MIN_TRIBUTES: usize = 2;

/// Number of districts a tribute can be drawn from
pub const FACTION_COUNT: u8 = 12;

/// Starting stat line before the district bonus is applied.
pub const BASE_DEFENSE: u32 = 3;
pub const BASE_STRENGTH: u32 = 5;
pub const BASE_CONSTITUTION: u32 = 4;
pub const BASE_WISDOM: u32 = 4;
pub const BASE_HIT_POINTS: u32 = 20;

/// Per-district bonus spread over (defense, strength, constitution, wisdom).
/// Hit point bonus is derived separately: district `d` gets `12 - d`.
pub const FACTION_TABLE: [[u32; 4]; FACTION_COUNT as usize] = [
    [2, 0, 0, 0],
    [0, 2, 0, 0],
    [0, 0, 0, 2],
    [0, 0, 2, 0],
    [0, 1, 0, 1],
    [1, 0, 1, 0],
    [0, 2, 0, 0],
    [0, 0, 2, 0],
    [2, 0, 0, 0],
    [0, 1, 1, 0],
    [1, 0, 0, 1],
    [0, 0, 0, 2],
];

/// Active zones sampled from the catalog when a game starts
pub const DEFAULT_ZONE_POOL_SIZE: usize = 6;

/// Reserved zone for eliminated tributes and feast participants
pub const CORNUCOPIA: &str = "Cornucopia";

/// Heading used for arena-wide narrative lines
pub const ARENA_HEADING: &str = "Arena";

/// Static zone catalog: (name, description).
pub const ZONE_CATALOG: [(&str, &str); 10] = [
    ("Pine Forest", "Dense evergreens and a carpet of needles that muffles every step."),
    ("Rocky Ridge", "Loose scree and wind-cut ledges above the tree line."),
    ("Marshlands", "Knee-deep water, biting insects and sucking mud."),
    ("Abandoned Quarry", "Sheer stone walls around a flooded pit."),
    ("River Delta", "Braided channels and sandbars that shift overnight."),
    ("Burnt Meadow", "Blackened grass still warm from last week's fire."),
    ("Bamboo Thicket", "Stalks so tight the light comes through green."),
    ("Frozen Lake", "Ice that groans under any real weight."),
    ("Collapsed Mine", "Timbered tunnels and the smell of old lamp oil."),
    ("Orchard Ruins", "Overgrown fruit trees around a roofless farmhouse."),
];

/// Names handed to synthetic tributes before falling back to "Tribute N".
pub const NPC_NAMES: [&str; 16] = [
    "Ash", "Briar", "Cinder", "Dusk", "Ember", "Flint", "Gale", "Hollis", "Ivy", "Jett", "Kestrel",
    "Lark", "Moss", "Nettle", "Onyx", "Pike",
];

/// Zones are shrunk every Nth resolved day (day 3, 6, 9...).
pub const SHRINK_CADENCE_DAYS: u32 = 3;

/// Feasts occur in the window after every Nth resolved day.
pub const FEAST_CADENCE_DAYS: u32 = 10;

/// Stat decay starts after this many days.
pub const DECAY_GRACE_DAYS: u32 = 20;
/// Decay grows by this many percent per day past the grace period.
pub const DECAY_STEP_PERCENT: u32 = 5;
/// Decay never removes more than this share of a stat in one day.
pub const DECAY_CAP_PERCENT: u32 = 50;

/// Default-action weights while a feast is active: (feast, hunt, rest, loot).
pub const FEAST_DAY_WEIGHTS: [u32; 4] = [60, 20, 10, 10];
/// Each held item adds this much to the weight of resting.
pub const REST_WEIGHT_PER_ITEM: u32 = 3;

/// Chance (percent) that looting turns up an item.
pub const LOOT_ITEM_CHANCE_PERCENT: u32 = 75;
/// Looted item bonus range.
pub const LOOT_BONUS_MIN: u32 = 1;
pub const LOOT_BONUS_MAX: u32 = 10;
/// Injury chance on a failed loot is `min(1, LOOT_INJURY_NUMERATOR / wisdom)`.
pub const LOOT_INJURY_NUMERATOR: f64 = 2.0;
pub const LOOT_INJURY_MIN: u32 = 1;
pub const LOOT_INJURY_MAX: u32 = 3;

/// Rest only heals while hit points sit below this multiple of constitution.
pub const REST_HEAL_THRESHOLD_MULTIPLIER: u32 = 2;

/// Combat dice are d10.
pub const COMBAT_DIE_SIDES: u32 = 10;

/// Feast tuning.
pub const FEAST_ROUNDS: u32 = 3;
pub const FEAST_TRAP_CHANCE_PERCENT: u32 = 25;
pub const FEAST_TRAP_MIN: u32 = 5;
pub const FEAST_TRAP_MAX: u32 = 10;
pub const FEAST_BOOSTS: u32 = 3;
pub const FEAST_SOLO_BOOST_MIN: u32 = 10;
pub const FEAST_SOLO_BOOST_MAX: u32 = 15;
pub const FEAST_SURVIVOR_BOOST_MIN: u32 = 6;
pub const FEAST_SURVIVOR_BOOST_MAX: u32 = 12;

/// Day window sizing in seconds: `clamp(alive * PER_TRIBUTE + BASE, MIN, MAX)`.
pub const DAY_SECS_PER_TRIBUTE: u64 = 20;
pub const DAY_SECS_BASE: u64 = 20;
pub const DAY_SECS_MIN: u64 = 60;
pub const DAY_SECS_MAX: u64 = 300;
/// Feast windows are stretched by NUM/DEN.
pub const FEAST_DURATION_NUM: u64 = 3;
pub const FEAST_DURATION_DEN: u64 = 2;

/// Stakes are accepted up to and including this day.
pub const BETTING_LAST_DAY: u32 = 1;
/// Daily yield is `amount * day / YIELD_DIVISOR`, i.e. 1% of the stake per four days.
pub const YIELD_DIVISOR: u64 = 400;
/// Daily yield never exceeds this share of the stake.
pub const YIELD_CAP_PERCENT: u64 = 20;
/// Winning bettors receive their stake times this multiplier.
pub const WINNING_STAKE_MULTIPLIER: u64 = 2;
/// The winning tribute receives this share of the total pot.
pub const WINNER_POT_SHARE_PERCENT: u64 = 50;

/// Admin event bounds.
pub const TRAP_DAMAGE_CAP: u32 = 25;
pub const BLESSING_CAP: u32 = 20;
