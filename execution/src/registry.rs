//! Player registry: tribute creation, lookup and the stat/HP mutations every other phase uses.

use gauntlet_types::{
    Action, ArenaError, Item, Location, Session, Stat, Tribute, FACTION_COUNT, MAX_NAME_LENGTH,
    MAX_TRIBUTES,
};
use rand::Rng;

/// Add a tribute to the session with a random district.
pub fn register<'a>(
    session: &'a mut Session,
    id: &str,
    name: &str,
    synthetic: bool,
    rng: &mut impl Rng,
) -> Result<&'a Tribute, ArenaError> {
    if session.is_running() {
        return Err(ArenaError::GameAlreadyActive);
    }
    let name = name.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_LENGTH {
        return Err(ArenaError::InvalidName {
            max: MAX_NAME_LENGTH,
        });
    }
    if session.tributes.contains_key(id) {
        return Err(ArenaError::AlreadyRegistered(id.to_string()));
    }
    if session.tributes.len() >= MAX_TRIBUTES {
        return Err(ArenaError::ArenaFull { max: MAX_TRIBUTES });
    }

    let faction = rng.gen_range(1..=FACTION_COUNT);
    let tribute = Tribute::new(id.to_string(), name.to_string(), faction, synthetic);
    Ok(session.tributes.entry(id.to_string()).or_insert(tribute))
}

pub fn get<'a>(session: &'a Session, id: &str) -> Result<&'a Tribute, ArenaError> {
    session
        .tributes
        .get(id)
        .ok_or_else(|| ArenaError::UnknownTribute(id.to_string()))
}

/// Look up a tribute that must still be alive.
pub fn get_alive_mut<'a>(session: &'a mut Session, id: &str) -> Result<&'a mut Tribute, ArenaError> {
    let tribute = session
        .tributes
        .get_mut(id)
        .ok_or_else(|| ArenaError::UnknownTribute(id.to_string()))?;
    if !tribute.alive {
        return Err(ArenaError::TributeEliminated(id.to_string()));
    }
    Ok(tribute)
}

/// Record today's action. Hunt/Rest/Loot may move the tribute to another active zone;
/// Feast sends it to the Cornucopia.
pub fn set_action(
    session: &mut Session,
    id: &str,
    action: Action,
    zone: Option<&str>,
) -> Result<(), ArenaError> {
    let destination = match (action, zone) {
        (Action::Feast, _) => Some(Location::Cornucopia),
        (_, Some(zone)) => {
            if !session.is_active_zone(zone) {
                return Err(ArenaError::InvalidZone(zone.to_string()));
            }
            Some(Location::Zone(zone.to_string()))
        }
        (_, None) => None,
    };

    let tribute = get_alive_mut(session, id)?;
    tribute.action = action;
    if let Some(destination) = destination {
        tribute.location = Some(destination);
    }
    Ok(())
}

/// Subtract `amount` hit points. Returns true if this call eliminated the tribute.
///
/// Surviving tributes never drop below 1 HP; an eliminated tribute is left at 0 HP in the
/// Cornucopia with its elimination day stamped. Damage to the dead is ignored.
pub fn damage(tribute: &mut Tribute, amount: u32, day: u32) -> bool {
    if !tribute.alive || amount == 0 {
        return false;
    }
    if amount >= tribute.stats.hit_points {
        tribute.stats.hit_points = 0;
        tribute.alive = false;
        tribute.eliminated_on_day = Some(day);
        tribute.action = Action::None;
        tribute.location = Some(Location::Cornucopia);
        return true;
    }
    tribute.stats.hit_points -= amount;
    false
}

/// Session-level wrapper around [`damage`]; unknown ids are ignored.
pub fn apply_damage(session: &mut Session, id: &str, amount: u32, day: u32) -> bool {
    session
        .tributes
        .get_mut(id)
        .map(|tribute| damage(tribute, amount, day))
        .unwrap_or(false)
}

pub fn boost(tribute: &mut Tribute, stat: Stat, amount: u32) {
    let value = tribute.stats.get_mut(stat);
    *value = value.saturating_add(amount);
}

/// Lower a stat, never below 1.
pub fn weaken(tribute: &mut Tribute, stat: Stat, amount: u32) {
    let value = tribute.stats.get_mut(stat);
    *value = value.saturating_sub(amount).max(1);
}

pub fn grant_item(session: &mut Session, id: &str, stat: Stat, bonus: u32) -> Result<(), ArenaError> {
    let tribute = get_alive_mut(session, id)?;
    tribute.items.push(Item { stat, bonus });
    Ok(())
}

/// Use the oldest held item, applying its bonus.
pub fn consume_first_item(session: &mut Session, id: &str) -> Option<Item> {
    let tribute = session.tributes.get_mut(id)?;
    if !tribute.alive || tribute.items.is_empty() {
        return None;
    }
    let item = tribute.items.remove(0);
    boost(tribute, item.stat, item.bonus);
    Some(item)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gauntlet_types::{SessionPhase, Zone};
    use rand::{rngs::StdRng, SeedableRng};

    fn signup_session() -> Session {
        let mut session = Session::new("test");
        session.phase = SessionPhase::Signup;
        session
    }

    #[test]
    fn test_register_assigns_faction_stats() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut session = signup_session();
        let tribute = register(&mut session, "u1", "  Rue ", false, &mut rng).expect("register");
        assert_eq!(tribute.name, "Rue");
        assert!((1..=FACTION_COUNT).contains(&tribute.faction));
        assert_eq!(
            tribute.stats,
            gauntlet_types::StatBlock::for_faction(tribute.faction)
        );
        assert!(tribute.alive);
        assert_eq!(tribute.action, Action::None);
    }

    #[test]
    fn test_register_rejects_duplicates_and_running_games() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut session = signup_session();
        register(&mut session, "u1", "Rue", false, &mut rng).expect("first");
        assert_eq!(
            register(&mut session, "u1", "Rue again", false, &mut rng).unwrap_err(),
            ArenaError::AlreadyRegistered("u1".into())
        );

        session.phase = SessionPhase::Running;
        assert_eq!(
            register(&mut session, "u2", "Thresh", false, &mut rng).unwrap_err(),
            ArenaError::GameAlreadyActive
        );
        assert_eq!(session.tributes.len(), 1);
    }

    #[test]
    fn test_register_rejects_bad_names_and_full_arena() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut session = signup_session();
        assert!(matches!(
            register(&mut session, "u1", "   ", false, &mut rng),
            Err(ArenaError::InvalidName { .. })
        ));
        for idx in 0..MAX_TRIBUTES {
            register(&mut session, &format!("u{idx}"), "Filler", false, &mut rng)
                .expect("room left");
        }
        assert_eq!(
            register(&mut session, "late", "Late", false, &mut rng).unwrap_err(),
            ArenaError::ArenaFull { max: MAX_TRIBUTES }
        );
    }

    #[test]
    fn test_damage_floors_then_eliminates_once() {
        let mut tribute = Tribute::new("a".into(), "Alpha".into(), 12, false);
        tribute.stats.hit_points = 10;

        assert!(!damage(&mut tribute, 9, 3));
        assert_eq!(tribute.stats.hit_points, 1);
        assert!(tribute.alive);

        assert!(damage(&mut tribute, 5, 4));
        assert!(!tribute.alive);
        assert_eq!(tribute.stats.hit_points, 0);
        assert_eq!(tribute.eliminated_on_day, Some(4));
        assert_eq!(tribute.location, Some(Location::Cornucopia));

        // Already eliminated: no second elimination, no revival.
        assert!(!damage(&mut tribute, 5, 5));
        assert!(!tribute.alive);
        assert_eq!(tribute.eliminated_on_day, Some(4));
    }

    #[test]
    fn test_set_action_validates_zone_before_mutating() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut session = signup_session();
        register(&mut session, "u1", "Rue", false, &mut rng).expect("register");
        session.active_zones = vec![Zone::new("Marshlands", "wet")];

        let err = set_action(&mut session, "u1", Action::Hunt, Some("Nowhere")).unwrap_err();
        assert_eq!(err, ArenaError::InvalidZone("Nowhere".into()));
        assert_eq!(session.tributes["u1"].action, Action::None);

        set_action(&mut session, "u1", Action::Hunt, Some("Marshlands")).expect("valid");
        assert_eq!(session.tributes["u1"].action, Action::Hunt);
        assert!(session.tributes["u1"].is_in_zone("Marshlands"));

        set_action(&mut session, "u1", Action::Feast, Some("ignored")).expect("feast");
        assert_eq!(session.tributes["u1"].location, Some(Location::Cornucopia));

        assert_eq!(
            set_action(&mut session, "ghost", Action::Rest, None).unwrap_err(),
            ArenaError::UnknownTribute("ghost".into())
        );
    }

    #[test]
    fn test_items_are_consumed_oldest_first() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut session = signup_session();
        register(&mut session, "u1", "Rue", false, &mut rng).expect("register");
        let wisdom = session.tributes["u1"].stats.wisdom;

        grant_item(&mut session, "u1", Stat::Wisdom, 4).expect("grant");
        grant_item(&mut session, "u1", Stat::Strength, 9).expect("grant");

        let item = consume_first_item(&mut session, "u1").expect("item");
        assert_eq!(item, Item { stat: Stat::Wisdom, bonus: 4 });
        assert_eq!(session.tributes["u1"].stats.wisdom, wisdom + 4);
        assert_eq!(session.tributes["u1"].items.len(), 1);
    }

    proptest::proptest! {
        /// A living tribute keeps at least 1 HP; an eliminated one sits at exactly 0 and stays down.
        #[test]
        fn prop_damage_keeps_hit_point_floor(
            hp in 1u32..200,
            hits in proptest::collection::vec(0u32..60, 1..20),
        ) {
            let mut tribute = Tribute::new("a".into(), "Alpha".into(), 1, false);
            tribute.stats.hit_points = hp;
            let mut eliminations = 0;
            for (day, amount) in hits.into_iter().enumerate() {
                if damage(&mut tribute, amount, day as u32) {
                    eliminations += 1;
                }
                if tribute.alive {
                    proptest::prop_assert!(tribute.stats.hit_points >= 1);
                } else {
                    proptest::prop_assert_eq!(tribute.stats.hit_points, 0);
                }
            }
            proptest::prop_assert!(eliminations <= 1);
        }
    }

    #[test]
    fn test_weaken_never_drops_below_one() {
        let mut tribute = Tribute::new("a".into(), "Alpha".into(), 5, false);
        weaken(&mut tribute, Stat::Defense, 100);
        assert_eq!(tribute.stats.defense, 1);
        boost(&mut tribute, Stat::Defense, u32::MAX);
        assert_eq!(tribute.stats.defense, u32::MAX);
    }
}
