//! Clash resolution shared by zone hunting and the feast.

use std::collections::BTreeSet;

use gauntlet_types::{
    Action, DayReport, Session, Stat, Tribute, COMBAT_DIE_SIDES, CORNUCOPIA, FEAST_BOOSTS,
    FEAST_ROUNDS, FEAST_SOLO_BOOST_MAX, FEAST_SOLO_BOOST_MIN, FEAST_SURVIVOR_BOOST_MAX,
    FEAST_SURVIVOR_BOOST_MIN, FEAST_TRAP_CHANCE_PERCENT, FEAST_TRAP_MAX, FEAST_TRAP_MIN,
};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::registry;

fn roll(rng: &mut impl Rng) -> u32 {
    rng.gen_range(1..=COMBAT_DIE_SIDES)
}

/// `Str + Wis + max(d10, d10)`
pub fn attack_score(tribute: &Tribute, rng: &mut impl Rng) -> u32 {
    let die = roll(rng).max(roll(rng));
    tribute
        .stats
        .strength
        .saturating_add(tribute.stats.wisdom)
        .saturating_add(die)
}

/// `Def + Con + d10`
pub fn defense_score(tribute: &Tribute, rng: &mut impl Rng) -> u32 {
    tribute
        .stats
        .defense
        .saturating_add(tribute.stats.constitution)
        .saturating_add(roll(rng))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClashOutcome {
    /// The defender took `damage`.
    Hit { damage: u32, eliminated: bool },
    /// The attack failed and the attacker took `damage`.
    Backlash { damage: u32, eliminated: bool },
    Stalemate,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Clash {
    pub attacker: String,
    pub attacker_name: String,
    pub defender: String,
    pub defender_name: String,
    pub attack: u32,
    pub defense: u32,
    pub outcome: ClashOutcome,
}

impl Clash {
    /// Id of the tribute eliminated by this clash, if any.
    pub fn eliminated(&self) -> Option<&str> {
        match self.outcome {
            ClashOutcome::Hit {
                eliminated: true, ..
            } => Some(&self.defender),
            ClashOutcome::Backlash {
                eliminated: true, ..
            } => Some(&self.attacker),
            _ => None,
        }
    }

    pub fn narrate(&self) -> String {
        let (a, d) = (&self.attacker_name, &self.defender_name);
        match self.outcome {
            ClashOutcome::Hit {
                eliminated: true, ..
            } => format!("{a} hunted down and eliminated {d}."),
            ClashOutcome::Hit { damage, .. } => {
                format!("{a} ambushed {d} for {damage} damage.")
            }
            ClashOutcome::Backlash {
                eliminated: true, ..
            } => format!("{a} attacked {d} and was eliminated in the counterattack."),
            ClashOutcome::Backlash { damage, .. } => {
                format!("{a} attacked {d} but was driven off, taking {damage} damage.")
            }
            ClashOutcome::Stalemate => format!("{a} and {d} fought to a standstill."),
        }
    }
}

/// Resolve one attack. Returns `None` if either side is missing or already eliminated.
///
/// Eliminations are credited to the surviving side's kill list.
pub fn clash(
    session: &mut Session,
    attacker: &str,
    defender: &str,
    day: u32,
    rng: &mut impl Rng,
) -> Option<Clash> {
    if attacker == defender {
        return None;
    }
    let a = session.tributes.get(attacker).filter(|t| t.alive)?;
    let d = session.tributes.get(defender).filter(|t| t.alive)?;
    let attacker_name = a.name.clone();
    let defender_name = d.name.clone();
    let attack = attack_score(a, rng);
    let defense = defense_score(d, rng);

    let outcome = if attack > defense {
        let damage = attack - defense;
        let eliminated = registry::apply_damage(session, defender, damage, day);
        if eliminated {
            credit_kill(session, attacker, &defender_name);
        }
        ClashOutcome::Hit { damage, eliminated }
    } else if defense > attack {
        let damage = defense - attack;
        let eliminated = registry::apply_damage(session, attacker, damage, day);
        if eliminated {
            credit_kill(session, defender, &attacker_name);
        }
        ClashOutcome::Backlash { damage, eliminated }
    } else {
        ClashOutcome::Stalemate
    };

    Some(Clash {
        attacker: attacker.to_string(),
        attacker_name,
        defender: defender.to_string(),
        defender_name,
        attack,
        defense,
        outcome,
    })
}

fn credit_kill(session: &mut Session, killer: &str, victim_name: &str) {
    if let Some(tribute) = session.tributes.get_mut(killer) {
        tribute.kills.push(victim_name.to_string());
    }
}

/// Boost `count` uniformly chosen stats by `min..=max` each.
fn random_boosts(
    tribute: &mut Tribute,
    count: u32,
    min: u32,
    max: u32,
    rng: &mut impl Rng,
) -> Vec<(Stat, u32)> {
    let mut applied = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let stat = *Stat::ALL.choose(rng).unwrap_or(&Stat::HitPoints);
        let amount = rng.gen_range(min..=max);
        registry::boost(tribute, stat, amount);
        applied.push((stat, amount));
    }
    applied
}

fn describe_boosts(name: &str, boosts: &[(Stat, u32)]) -> String {
    let parts: Vec<String> = boosts
        .iter()
        .map(|(stat, amount)| format!("+{amount} {}", stat.as_str()))
        .collect();
    format!("{name} left the Cornucopia with supplies ({}).", parts.join(", "))
}

/// Run the Cornucopia feast for every living tribute whose action is Feast.
///
/// Returns false if nobody attended. Lines go under the Cornucopia heading; eliminations are
/// appended to `report.eliminated`.
pub fn run_feast(
    session: &mut Session,
    day: u32,
    report: &mut DayReport,
    rng: &mut impl Rng,
) -> bool {
    let participants: Vec<String> = session
        .alive()
        .filter(|tribute| tribute.action == Action::Feast)
        .map(|tribute| tribute.id.clone())
        .collect();
    if participants.is_empty() {
        return false;
    }

    if let [solo] = participants.as_slice() {
        if let Some(tribute) = session.tributes.get_mut(solo) {
            let boosts = random_boosts(
                tribute,
                FEAST_BOOSTS,
                FEAST_SOLO_BOOST_MIN,
                FEAST_SOLO_BOOST_MAX,
                rng,
            );
            report.push(
                CORNUCOPIA,
                format!("{} had the feast to themselves.", tribute.name),
            );
            report.push(CORNUCOPIA, describe_boosts(&tribute.name, &boosts));
        }
        return true;
    }

    report.push(
        CORNUCOPIA,
        format!("{} tributes converged on the Cornucopia.", participants.len()),
    );
    for round in 1..=FEAST_ROUNDS {
        let mut order = living(session, &participants);
        order.shuffle(rng);
        let mut involved = BTreeSet::new();
        for attacker in &order {
            if involved.contains(attacker) || !is_alive(session, attacker) {
                continue;
            }
            let targets: Vec<&String> = order
                .iter()
                .filter(|id| *id != attacker && is_alive(session, id))
                .collect();
            let Some(defender) = targets.choose(rng).map(|id| (*id).clone()) else {
                continue;
            };
            involved.insert(attacker.clone());
            involved.insert(defender.clone());
            if let Some(result) = clash(session, attacker, &defender, day, rng) {
                report.push(CORNUCOPIA, format!("Round {round}: {}", result.narrate()));
                if let Some(id) = result.eliminated() {
                    report.eliminated.push(id.to_string());
                }
            }
        }

        for id in living(session, &participants) {
            if rng.gen_range(0..100) >= FEAST_TRAP_CHANCE_PERCENT {
                continue;
            }
            let damage = rng.gen_range(FEAST_TRAP_MIN..=FEAST_TRAP_MAX);
            let name = session.tributes.get(&id).map(|t| t.name.clone()).unwrap_or_default();
            if registry::apply_damage(session, &id, damage, day) {
                report.push(
                    CORNUCOPIA,
                    format!("{name} triggered a trap among the crates and was eliminated."),
                );
                report.eliminated.push(id);
            } else {
                report.push(
                    CORNUCOPIA,
                    format!("{name} triggered a trap among the crates for {damage} damage."),
                );
            }
        }
    }

    for id in living(session, &participants) {
        if let Some(tribute) = session.tributes.get_mut(&id) {
            let boosts = random_boosts(
                tribute,
                FEAST_BOOSTS,
                FEAST_SURVIVOR_BOOST_MIN,
                FEAST_SURVIVOR_BOOST_MAX,
                rng,
            );
            report.push(CORNUCOPIA, describe_boosts(&tribute.name, &boosts));
        }
    }
    true
}

fn is_alive(session: &Session, id: &str) -> bool {
    session.tributes.get(id).map(|t| t.alive).unwrap_or(false)
}

fn living(session: &Session, ids: &[String]) -> Vec<String> {
    ids.iter()
        .filter(|id| is_alive(session, id))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use gauntlet_types::{Location, StatBlock};
    use rand::{rngs::StdRng, SeedableRng};

    fn tribute(id: &str, stats: StatBlock) -> Tribute {
        let mut tribute = Tribute::new(id.into(), id.to_uppercase(), 6, false);
        tribute.stats = stats;
        tribute.location = Some(Location::Zone("Marshlands".into()));
        tribute
    }

    fn session_of(tributes: Vec<Tribute>) -> Session {
        let mut session = Session::new("combat");
        for tribute in tributes {
            session.tributes.insert(tribute.id.clone(), tribute);
        }
        session
    }

    #[test]
    fn test_score_ranges() {
        let mut rng = StdRng::seed_from_u64(20);
        let hunter = tribute(
            "h",
            StatBlock {
                defense: 1,
                strength: 20,
                constitution: 1,
                wisdom: 10,
                hit_points: 10,
            },
        );
        let prey = tribute(
            "p",
            StatBlock {
                defense: 2,
                strength: 1,
                constitution: 2,
                wisdom: 1,
                hit_points: 10,
            },
        );
        for _ in 0..500 {
            let attack = attack_score(&hunter, &mut rng);
            assert!((31..=40).contains(&attack), "attack {attack}");
            let defense = defense_score(&prey, &mut rng);
            assert!((5..=14).contains(&defense), "defense {defense}");
        }
    }

    #[test]
    fn test_strong_hunter_always_hits_weak_prey() {
        let mut rng = StdRng::seed_from_u64(21);
        let hunter = tribute(
            "h",
            StatBlock {
                defense: 3,
                strength: 20,
                constitution: 4,
                wisdom: 10,
                hit_points: 30,
            },
        );
        let prey = tribute(
            "p",
            StatBlock {
                defense: 2,
                strength: 5,
                constitution: 2,
                wisdom: 4,
                hit_points: 100,
            },
        );
        let mut session = session_of(vec![hunter, prey]);

        let result = clash(&mut session, "h", "p", 1, &mut rng).expect("both alive");
        match result.outcome {
            ClashOutcome::Hit { damage, eliminated } => {
                assert!(damage >= 17);
                assert!(!eliminated);
                assert_eq!(session.tributes["p"].stats.hit_points, 100 - damage);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(session.tributes["h"].stats.hit_points, 30);
    }

    #[test]
    fn test_backlash_credits_the_defender() {
        let mut rng = StdRng::seed_from_u64(22);
        let hunter = tribute(
            "h",
            StatBlock {
                defense: 1,
                strength: 1,
                constitution: 1,
                wisdom: 1,
                hit_points: 2,
            },
        );
        let wall = tribute(
            "w",
            StatBlock {
                defense: 40,
                strength: 1,
                constitution: 40,
                wisdom: 1,
                hit_points: 50,
            },
        );
        let mut session = session_of(vec![hunter, wall]);

        let result = clash(&mut session, "h", "w", 4, &mut rng).expect("both alive");
        assert!(matches!(
            result.outcome,
            ClashOutcome::Backlash {
                eliminated: true,
                ..
            }
        ));
        assert_eq!(result.eliminated(), Some("h"));
        assert_eq!(session.tributes["w"].kills, vec!["H".to_string()]);
        assert!(!session.tributes["h"].alive);
        assert_eq!(session.tributes["h"].eliminated_on_day, Some(4));

        // The eliminated side cannot clash again.
        assert!(clash(&mut session, "w", "h", 4, &mut rng).is_none());
    }

    #[test]
    fn test_solo_feast_grants_large_boosts() {
        let mut rng = StdRng::seed_from_u64(23);
        let mut solo = tribute("s", StatBlock::base());
        solo.action = Action::Feast;
        let before = solo.stats.total();
        let mut session = session_of(vec![solo, tribute("x", StatBlock::base())]);
        let mut report = DayReport::new(10);

        assert!(run_feast(&mut session, 10, &mut report, &mut rng));
        let gained = session.tributes["s"].stats.total() - before;
        assert!((30..=45).contains(&gained), "gained {gained}");
        assert_eq!(session.tributes["x"].stats, StatBlock::base());
        assert!(report.group(CORNUCOPIA).is_some());
    }

    #[test]
    fn test_feast_without_attendees_is_skipped() {
        let mut rng = StdRng::seed_from_u64(24);
        let mut session = session_of(vec![tribute("a", StatBlock::base())]);
        let mut report = DayReport::new(10);
        assert!(!run_feast(&mut session, 10, &mut report, &mut rng));
        assert_eq!(report.line_count(), 0);
    }

    #[test]
    fn test_multi_feast_keeps_elimination_invariants() {
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut attendees = Vec::new();
            for id in ["a", "b", "c", "d", "e"] {
                let mut t = tribute(id, StatBlock::base());
                t.action = Action::Feast;
                t.location = Some(Location::Cornucopia);
                attendees.push(t);
            }
            let mut session = session_of(attendees);
            let mut report = DayReport::new(20);

            assert!(run_feast(&mut session, 20, &mut report, &mut rng));
            let unique: BTreeSet<_> = report.eliminated.iter().collect();
            assert_eq!(unique.len(), report.eliminated.len(), "seed {seed}");
            for tribute in session.tributes.values() {
                if tribute.alive {
                    assert!(tribute.stats.hit_points >= 1);
                } else {
                    assert_eq!(tribute.stats.hit_points, 0);
                    assert!(report.eliminated.contains(&tribute.id));
                }
            }
        }
    }
}
