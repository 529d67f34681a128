//! Game master interventions.

use gauntlet_types::{
    Action, AdminEvent, ArenaError, Elimination, Session, Stat, BLESSING_CAP, TRAP_DAMAGE_CAP,
};
use rand::seq::{IteratorRandom, SliceRandom};
use rand::Rng;
use tracing::info;

use crate::registry;

/// Clamp `min..=max` into `1..=cap`, swapping reversed bounds.
fn clamp_range(min: u32, max: u32, cap: u32) -> (u32, u32) {
    let (low, high) = if min <= max { (min, max) } else { (max, min) };
    (low.clamp(1, cap), high.clamp(1, cap))
}

fn random_living(session: &Session, rng: &mut impl Rng) -> Option<String> {
    session.alive().map(|tribute| tribute.id.clone()).choose(rng)
}

fn random_stat(rng: &mut impl Rng) -> Stat {
    *Stat::ALL.choose(rng).unwrap_or(&Stat::HitPoints)
}

/// Apply an admin event to a running game and return the lines to announce.
pub fn apply_admin_event(
    session: &mut Session,
    event: &AdminEvent,
    rng: &mut impl Rng,
) -> Result<Vec<String>, ArenaError> {
    if !session.is_running() {
        return Err(ArenaError::NotRunning);
    }
    let day = session.day_counter;
    let mut lines = Vec::new();

    match event {
        AdminEvent::Debuff { stat, amount } => {
            for tribute in session.tributes.values_mut().filter(|t| t.alive) {
                registry::weaken(tribute, *stat, *amount);
            }
            lines.push(format!(
                "A sickness sweeps the arena: every tribute loses {amount} {}.",
                stat.as_str()
            ));
        }
        AdminEvent::ForceHunt => {
            for tribute in session.tributes.values_mut().filter(|t| t.alive) {
                tribute.action = Action::Hunt;
            }
            lines.push("The gamemakers demand blood: every tribute must hunt today.".to_string());
        }
        AdminEvent::Trap { min, max } => {
            let (min, max) = clamp_range(*min, *max, TRAP_DAMAGE_CAP);
            if let Some(id) = random_living(session, rng) {
                let damage = rng.gen_range(min..=max);
                let name = session.tributes.get(&id).map(|t| t.name.clone()).unwrap_or_default();
                if registry::apply_damage(session, &id, damage, day) {
                    session.eliminations.push(Elimination {
                        name: name.clone(),
                        day,
                    });
                    lines.push(format!("{name} stumbled into a gamemaker trap and was eliminated."));
                } else {
                    lines.push(format!("{name} stumbled into a gamemaker trap for {damage} damage."));
                }
            }
        }
        AdminEvent::Blessing { stat, min, max } => {
            let (min, max) = clamp_range(*min, *max, BLESSING_CAP);
            if let Some(id) = random_living(session, rng) {
                let stat = stat.unwrap_or_else(|| random_stat(rng));
                let amount = rng.gen_range(min..=max);
                if let Some(tribute) = session.tributes.get_mut(&id) {
                    registry::boost(tribute, stat, amount);
                    lines.push(format!(
                        "A sponsor gift drifts down to {}: +{amount} {}.",
                        tribute.name,
                        stat.as_str()
                    ));
                }
            }
        }
        AdminEvent::Equalizer => {
            let target = session
                .alive()
                .map(|tribute| tribute.stats.total())
                .max()
                .unwrap_or(0);
            for tribute in session.tributes.values_mut().filter(|t| t.alive) {
                let mut gap = target.saturating_sub(tribute.stats.total());
                while gap > 0 {
                    registry::boost(tribute, random_stat(rng), 1);
                    gap -= 1;
                }
            }
            lines.push("The gamemakers level the field: every tribute now stands equal.".to_string());
        }
    }

    info!(session = %session.id, day, event = event.as_str(), "admin event applied");
    Ok(lines)
}
