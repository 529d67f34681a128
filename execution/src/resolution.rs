//! Per-day resolution pipeline.
//!
//! [`process_day`] is the only entry point the scheduler uses. It clones the snapshot, runs
//! every phase on the clone and hands back the result; a failure at any step leaves the
//! caller's snapshot as it was.

use std::collections::BTreeSet;

use gauntlet_types::{
    Action, ArenaError, DayReport, Elimination, Session, Stat, ARENA_HEADING, DECAY_CAP_PERCENT,
    DECAY_GRACE_DAYS, DECAY_STEP_PERCENT, FEAST_DAY_WEIGHTS, LOOT_BONUS_MAX, LOOT_BONUS_MIN,
    LOOT_INJURY_MAX, LOOT_INJURY_MIN, LOOT_INJURY_NUMERATOR, LOOT_ITEM_CHANCE_PERCENT,
    REST_HEAL_THRESHOLD_MULTIPLIER, REST_WEIGHT_PER_ITEM,
};
use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::combat::{self, Clash};
use crate::{ledger, registry, zones};

/// Resolve one day.
///
/// `expected_day` is the day counter the caller observed before scheduling the resolution; a
/// mismatch means another resolution already committed and the call is rejected.
pub fn process_day(
    snapshot: &Session,
    expected_day: u32,
    rng: &mut impl Rng,
) -> Result<(Session, DayReport), ArenaError> {
    if !snapshot.is_running() {
        return Err(ArenaError::NotRunning);
    }
    if snapshot.day_counter != expected_day {
        return Err(ArenaError::DuplicateResolution {
            expected: expected_day,
            actual: snapshot.day_counter,
        });
    }

    let mut session = snapshot.clone();
    zones::sanitize_all(&mut session, rng)?;

    session.day_counter = session.day_counter.saturating_add(1);
    let day = session.day_counter;
    let mut report = DayReport::new(day);

    apply_decay(&mut session, day, &mut report);

    if zones::is_shrink_day(day) {
        if let Some(shrink) = zones::shrink(&mut session, rng) {
            report.push(
                ARENA_HEADING,
                format!("The arena closes in: {} has been sealed off.", shrink.removed.name),
            );
            for (id, destination) in &shrink.relocated {
                if let Some(tribute) = session.tributes.get(id) {
                    report.push(
                        ARENA_HEADING,
                        format!("{} was driven out to {destination}.", tribute.name),
                    );
                }
            }
            report.shrunk_zone = Some(shrink.removed.name);
        }
    }

    assign_default_actions(&mut session, rng);
    resolve_camp_actions(&mut session, day, &mut report, rng);
    report.feast_held = combat::run_feast(&mut session, day, &mut report, rng);
    let clashes = resolve_hunting(&mut session, day, &mut report, rng);

    for id in &report.eliminated {
        if let Some(tribute) = session.tributes.get(id) {
            session.eliminations.push(Elimination {
                name: tribute.name.clone(),
                day,
            });
        }
    }
    report.payouts = ledger::accrue_daily_yield(&mut session);
    for tribute in session.tributes.values_mut().filter(|t| t.alive) {
        tribute.action = Action::None;
    }

    debug!(
        session = %session.id,
        day,
        alive = session.alive_count(),
        eliminated = report.eliminated.len(),
        clashes = clashes.len(),
        feast = report.feast_held,
        payouts = report.payouts.len(),
        "day resolved"
    );
    Ok((session, report))
}

/// Share of the highest stat removed on `day`, in percent.
pub fn decay_percent(day: u32) -> u32 {
    if day <= DECAY_GRACE_DAYS {
        return 0;
    }
    DECAY_STEP_PERCENT
        .saturating_mul(day - DECAY_GRACE_DAYS)
        .min(DECAY_CAP_PERCENT)
}

fn apply_decay(session: &mut Session, day: u32, report: &mut DayReport) {
    let percent = decay_percent(day);
    if percent == 0 {
        return;
    }
    for tribute in session.tributes.values_mut().filter(|t| t.alive) {
        let stat = tribute.stats.highest();
        let value = tribute.stats.get_mut(stat);
        let loss = u64::from(*value) * u64::from(percent) / 100;
        *value = value.saturating_sub(loss as u32).max(1);
    }
    report.push(
        ARENA_HEADING,
        format!("Exhaustion sets in: every tribute loses {percent}% of their strongest stat."),
    );
}

fn default_action(session: &Session, id: &str, rng: &mut impl Rng) -> Action {
    let Some(tribute) = session.tributes.get(id) else {
        return Action::Rest;
    };
    if session.feast_active {
        const FEAST_DAY_ACTIONS: [Action; 4] =
            [Action::Feast, Action::Hunt, Action::Rest, Action::Loot];
        return match WeightedIndex::new(FEAST_DAY_WEIGHTS) {
            Ok(dist) => FEAST_DAY_ACTIONS[dist.sample(rng)],
            Err(_) => Action::Rest,
        };
    }

    let items = u32::try_from(tribute.items.len()).unwrap_or(u32::MAX);
    let weights = [
        tribute.stats.strength,
        tribute
            .stats
            .constitution
            .saturating_add(REST_WEIGHT_PER_ITEM.saturating_mul(items)),
        tribute.stats.wisdom,
    ];
    const ACTIONS: [Action; 3] = [Action::Hunt, Action::Rest, Action::Loot];
    match WeightedIndex::new(weights) {
        Ok(dist) => ACTIONS[dist.sample(rng)],
        Err(_) => Action::Rest,
    }
}

fn assign_default_actions(session: &mut Session, rng: &mut impl Rng) {
    let idle: Vec<String> = session
        .alive()
        .filter(|tribute| tribute.action == Action::None)
        .map(|tribute| tribute.id.clone())
        .collect();
    for id in idle {
        let action = default_action(session, &id, rng);
        let _ = registry::set_action(session, &id, action, None);
    }
}

fn resolve_camp_actions(
    session: &mut Session,
    day: u32,
    report: &mut DayReport,
    rng: &mut impl Rng,
) {
    let ids = session.alive_ids();
    for id in ids {
        let Some(tribute) = session.tributes.get(&id) else {
            continue;
        };
        let heading = tribute
            .location
            .as_ref()
            .map(|location| location.name().to_string())
            .unwrap_or_else(|| ARENA_HEADING.to_string());
        let name = tribute.name.clone();
        let wisdom = tribute.stats.wisdom;
        match tribute.action {
            Action::Rest => {
                if let Some(item) = registry::consume_first_item(session, &id) {
                    report.push(
                        &heading,
                        format!(
                            "{name} rested and used a supply (+{} {}).",
                            item.bonus,
                            item.stat.as_str()
                        ),
                    );
                    continue;
                }
                let Some(tribute) = session.tributes.get_mut(&id) else {
                    continue;
                };
                let constitution = tribute.stats.constitution.max(1);
                let threshold = constitution.saturating_mul(REST_HEAL_THRESHOLD_MULTIPLIER);
                if tribute.stats.hit_points < threshold {
                    let heal = rng.gen_range(1..=constitution);
                    registry::boost(tribute, Stat::HitPoints, heal);
                    report.push(&heading, format!("{name} rested and recovered {heal} hit points."));
                } else {
                    report.push(&heading, format!("{name} rested quietly."));
                }
            }
            Action::Loot => {
                if rng.gen_range(0..100) < LOOT_ITEM_CHANCE_PERCENT {
                    let stat = *Stat::ALL.choose(rng).unwrap_or(&Stat::HitPoints);
                    let bonus = rng.gen_range(LOOT_BONUS_MIN..=LOOT_BONUS_MAX);
                    if registry::grant_item(session, &id, stat, bonus).is_ok() {
                        report.push(
                            &heading,
                            format!("{name} found a supply (+{bonus} {}).", stat.as_str()),
                        );
                    }
                    continue;
                }
                let chance = (LOOT_INJURY_NUMERATOR / f64::from(wisdom.max(1))).min(1.0);
                if !rng.gen_bool(chance) {
                    report.push(&heading, format!("{name} searched but came up empty."));
                    continue;
                }
                let damage = rng.gen_range(LOOT_INJURY_MIN..=LOOT_INJURY_MAX);
                if registry::apply_damage(session, &id, damage, day) {
                    report.push(&heading, format!("{name} took a fatal fall while scavenging."));
                    report.eliminated.push(id);
                } else {
                    report.push(
                        &heading,
                        format!("{name} was hurt while scavenging ({damage} damage)."),
                    );
                }
            }
            Action::Hunt | Action::Feast | Action::None => {}
        }
    }
}

/// Hunting phase: each active zone in order, hunters shuffled once per zone.
///
/// A tribute is involved in at most one clash per call, as hunter or as target.
pub fn resolve_hunting(
    session: &mut Session,
    day: u32,
    report: &mut DayReport,
    rng: &mut impl Rng,
) -> Vec<Clash> {
    let zone_names: Vec<String> = session
        .active_zones
        .iter()
        .map(|zone| zone.name.clone())
        .collect();
    let mut involved: BTreeSet<String> = BTreeSet::new();
    let mut clashes = Vec::new();

    for zone in zone_names {
        let mut hunters: Vec<String> = session
            .alive()
            .filter(|tribute| tribute.action == Action::Hunt && tribute.is_in_zone(&zone))
            .map(|tribute| tribute.id.clone())
            .collect();
        hunters.shuffle(rng);

        for hunter in hunters {
            if involved.contains(&hunter) {
                continue;
            }
            let Some(name) = session
                .tributes
                .get(&hunter)
                .filter(|tribute| tribute.alive)
                .map(|tribute| tribute.name.clone())
            else {
                continue;
            };
            let targets: Vec<String> = session
                .alive()
                .filter(|tribute| {
                    tribute.id != hunter
                        && tribute.action != Action::Feast
                        && tribute.is_in_zone(&zone)
                        && !involved.contains(&tribute.id)
                })
                .map(|tribute| tribute.id.clone())
                .collect();
            let Some(target) = targets.choose(rng).cloned() else {
                report.push(&zone, format!("{name} hunted through {zone} but found no one."));
                continue;
            };

            involved.insert(hunter.clone());
            involved.insert(target.clone());
            if let Some(result) = combat::clash(session, &hunter, &target, day, rng) {
                report.push(&zone, result.narrate());
                if let Some(id) = result.eliminated() {
                    report.eliminated.push(id.to_string());
                }
                clashes.push(result);
            }
        }
    }
    clashes
}
