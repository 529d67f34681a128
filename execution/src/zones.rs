//! Zone manager: active-set sampling, zone assignment and the shrinking arena.

use gauntlet_types::{Action, ArenaError, Location, Session, Zone, SHRINK_CADENCE_DAYS};
use rand::seq::SliceRandom;
use rand::Rng;

/// A zone removed from the active set and the tributes pushed out of it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Shrink {
    pub removed: Zone,
    /// (tribute id, destination zone name)
    pub relocated: Vec<(String, String)>,
}

/// Seed the active set with a uniform sample (without replacement) from the zone pool.
pub fn pick_zones_for_new_session<'a>(
    session: &'a mut Session,
    pool_size: usize,
    rng: &mut impl Rng,
) -> &'a [Zone] {
    let count = pool_size.min(session.zone_pool.len());
    session.active_zones = session
        .zone_pool
        .choose_multiple(rng, count)
        .cloned()
        .collect();
    &session.active_zones
}

/// Place a living tribute in a random active zone if it has no zone or stands outside the
/// active set. Returns the zone it was moved to.
///
/// A tribute that chose the feast stays at the Cornucopia.
pub fn assign_if_missing(session: &mut Session, id: &str, rng: &mut impl Rng) -> Option<String> {
    let needs_zone = match session.tributes.get(id) {
        Some(tribute) if tribute.alive => match &tribute.location {
            Some(Location::Zone(zone)) => !session.is_active_zone(zone),
            Some(Location::Cornucopia) => tribute.action != Action::Feast,
            None => true,
        },
        _ => false,
    };
    if !needs_zone {
        return None;
    }
    let zone = session.active_zones.choose(rng)?.name.clone();
    if let Some(tribute) = session.tributes.get_mut(id) {
        tribute.location = Some(Location::Zone(zone.clone()));
    }
    Some(zone)
}

/// Run [`assign_if_missing`] over every tribute.
pub fn sanitize_all(session: &mut Session, rng: &mut impl Rng) -> Result<(), ArenaError> {
    if session.active_zones.is_empty() && session.alive_count() > 0 {
        return Err(ArenaError::NoActiveZones);
    }
    let ids: Vec<String> = session.tributes.keys().cloned().collect();
    for id in ids {
        assign_if_missing(session, &id, rng);
    }
    Ok(())
}

pub fn is_shrink_day(day: u32) -> bool {
    day > 0 && day % SHRINK_CADENCE_DAYS == 0
}

/// Remove one random zone from the active set. A set of one zone never shrinks.
pub fn shrink(session: &mut Session, rng: &mut impl Rng) -> Option<Shrink> {
    if session.active_zones.len() <= 1 {
        return None;
    }
    let index = rng.gen_range(0..session.active_zones.len());
    let removed = session.active_zones.remove(index);

    let displaced: Vec<String> = session
        .alive()
        .filter(|tribute| tribute.is_in_zone(&removed.name))
        .map(|tribute| tribute.id.clone())
        .collect();

    let mut relocated = Vec::with_capacity(displaced.len());
    for id in displaced {
        let Some(destination) = session.active_zones.choose(rng).map(|zone| zone.name.clone())
        else {
            continue;
        };
        if let Some(tribute) = session.tributes.get_mut(&id) {
            tribute.location = Some(Location::Zone(destination.clone()));
        }
        relocated.push((id, destination));
    }

    Some(Shrink { removed, relocated })
}
