//! Wagering ledger: stakes, daily yield and settlement.
//!
//! The ledger never talks to the balance service itself. Debits are performed by the caller
//! between [`check_stake`] and [`record_stake`]; credits are returned as [`Payout`] values for
//! the caller to push out. Daily yield is minted on top of the pot and never drawn from it.
//! The winner bonus is a share of the whole pot, stakes on losing tributes included.

use std::collections::BTreeSet;

use gauntlet_types::{
    ArenaError, Payout, PayoutReason, Session, SessionPhase, BETTING_LAST_DAY, WINNER_POT_SHARE_PERCENT,
    WINNING_STAKE_MULTIPLIER, YIELD_CAP_PERCENT, YIELD_DIVISOR,
};

/// Stakes are taken during signup and the first two day windows.
pub fn betting_open(session: &Session) -> bool {
    matches!(session.phase, SessionPhase::Signup | SessionPhase::Running)
        && session.day_counter <= BETTING_LAST_DAY
}

/// Validate a stake without touching any state.
pub fn check_stake(
    session: &Session,
    _bettor: &str,
    tribute: &str,
    amount: u64,
) -> Result<(), ArenaError> {
    if session.phase == SessionPhase::Ended {
        return Err(ArenaError::NotRunning);
    }
    if !betting_open(session) {
        return Err(ArenaError::BettingWindowClosed {
            day: session.day_counter,
            last_day: BETTING_LAST_DAY,
        });
    }
    if amount == 0 {
        return Err(ArenaError::InvalidAmount);
    }
    let target = session
        .tributes
        .get(tribute)
        .ok_or_else(|| ArenaError::UnknownTribute(tribute.to_string()))?;
    if !target.alive {
        return Err(ArenaError::TributeEliminated(tribute.to_string()));
    }
    Ok(())
}

/// Credit a stake whose funds have already been debited.
pub fn record_stake(session: &mut Session, bettor: &str, tribute: &str, amount: u64) -> u64 {
    let stake = session
        .ledger
        .stakes
        .entry(bettor.to_string())
        .or_default()
        .entry(tribute.to_string())
        .or_default();
    stake.amount = stake.amount.saturating_add(amount);
    session.ledger.total_pot = session.ledger.total_pot.saturating_add(amount);
    stake.amount
}

/// `max(1, floor(amount * min(0.01 * day / 4, 0.20)))`, in integer arithmetic.
pub fn daily_yield(amount: u64, day: u32) -> u64 {
    let scaled = u128::from(amount) * u128::from(day) / u128::from(YIELD_DIVISOR);
    let cap = u128::from(amount) * u128::from(YIELD_CAP_PERCENT) / 100;
    let paid = scaled.min(cap).max(1);
    u64::try_from(paid).unwrap_or(u64::MAX)
}

/// Pay one day of yield on every stake backing a living tribute.
pub fn accrue_daily_yield(session: &mut Session) -> Vec<Payout> {
    let day = session.day_counter;
    let alive: BTreeSet<String> = session.alive().map(|tribute| tribute.id.clone()).collect();
    let mut payouts = Vec::new();
    for (bettor, by_tribute) in session.ledger.stakes.iter_mut() {
        for (tribute, stake) in by_tribute.iter_mut() {
            if !alive.contains(tribute) || stake.amount == 0 {
                continue;
            }
            let amount = daily_yield(stake.amount, day);
            stake.yield_paid = stake.yield_paid.saturating_add(amount);
            payouts.push(Payout {
                recipient: bettor.clone(),
                amount,
                reason: PayoutReason::DailyYield {
                    tribute: tribute.clone(),
                },
            });
        }
    }
    payouts
}

/// Settle a finished game and clear the ledger.
///
/// Winning bettors get their stake back doubled. A non-synthetic winner also receives half of
/// the total pot. With no winner nothing is paid out.
pub fn settle_on_game_end(session: &mut Session, winner: Option<&str>) -> Vec<Payout> {
    let mut payouts = Vec::new();
    if let Some(winner) = winner {
        for (bettor, by_tribute) in &session.ledger.stakes {
            let Some(stake) = by_tribute.get(winner) else {
                continue;
            };
            if stake.amount == 0 {
                continue;
            }
            payouts.push(Payout {
                recipient: bettor.clone(),
                amount: stake.amount.saturating_mul(WINNING_STAKE_MULTIPLIER),
                reason: PayoutReason::WinningStake {
                    tribute: winner.to_string(),
                },
            });
        }

        let bonus = winner_bonus(session.ledger.total_pot);
        let eligible = session
            .tributes
            .get(winner)
            .map(|tribute| !tribute.synthetic)
            .unwrap_or(false);
        if eligible && bonus > 0 {
            payouts.push(Payout {
                recipient: winner.to_string(),
                amount: bonus,
                reason: PayoutReason::WinnerBonus,
            });
        }
    }
    session.ledger.clear();
    payouts
}

pub fn winner_bonus(total_pot: u64) -> u64 {
    let bonus = u128::from(total_pot) * u128::from(WINNER_POT_SHARE_PERCENT) / 100;
    u64::try_from(bonus).unwrap_or(u64::MAX)
}

/// Split the pot evenly among the distinct bettors still backing a living tribute, then clear
/// the ledger. Used when a game is stopped early.
pub fn settle_on_stop(session: &mut Session) -> Vec<Payout> {
    let alive: BTreeSet<&str> = session.alive().map(|tribute| tribute.id.as_str()).collect();
    let bettors: Vec<String> = session
        .ledger
        .stakes
        .iter()
        .filter(|(_, by_tribute)| {
            by_tribute
                .iter()
                .any(|(tribute, stake)| stake.amount > 0 && alive.contains(tribute.as_str()))
        })
        .map(|(bettor, _)| bettor.clone())
        .collect();

    let mut payouts = Vec::new();
    if !bettors.is_empty() {
        let share = session.ledger.total_pot / bettors.len() as u64;
        if share > 0 {
            payouts = bettors
                .into_iter()
                .map(|recipient| Payout {
                    recipient,
                    amount: share,
                    reason: PayoutReason::StopRefund,
                })
                .collect();
        }
    }
    session.ledger.clear();
    payouts
}

#[cfg(test)]
mod tests {
    use super::*;
    use gauntlet_types::{Stake, Tribute};

    fn session_with(ids: &[(&str, bool)]) -> Session {
        let mut session = Session::new("ledger");
        session.phase = SessionPhase::Running;
        for (id, synthetic) in ids {
            session.tributes.insert(
                id.to_string(),
                Tribute::new(id.to_string(), id.to_uppercase(), 6, *synthetic),
            );
        }
        session
    }

    #[test]
    fn test_betting_window() {
        let mut session = session_with(&[("t1", false)]);
        session.phase = SessionPhase::Signup;
        assert!(check_stake(&session, "b", "t1", 10).is_ok());
        session.phase = SessionPhase::Running;
        session.day_counter = 1;
        assert!(check_stake(&session, "b", "t1", 10).is_ok());
        session.day_counter = 2;
        assert_eq!(
            check_stake(&session, "b", "t1", 10),
            Err(ArenaError::BettingWindowClosed { day: 2, last_day: 1 })
        );
        session.phase = SessionPhase::Ended;
        assert_eq!(check_stake(&session, "b", "t1", 10), Err(ArenaError::NotRunning));
    }

    #[test]
    fn test_check_stake_rejections() {
        let mut session = session_with(&[("t1", false), ("t2", false)]);
        session.tributes.get_mut("t2").unwrap().alive = false;
        assert_eq!(check_stake(&session, "b", "t1", 0), Err(ArenaError::InvalidAmount));
        assert_eq!(
            check_stake(&session, "b", "nobody", 5),
            Err(ArenaError::UnknownTribute("nobody".into()))
        );
        assert_eq!(
            check_stake(&session, "b", "t2", 5),
            Err(ArenaError::TributeEliminated("t2".into()))
        );
    }

    #[test]
    fn test_record_stake_accumulates_and_grows_pot() {
        let mut session = session_with(&[("t1", false), ("t2", false)]);
        assert_eq!(record_stake(&mut session, "b1", "t1", 100), 100);
        assert_eq!(record_stake(&mut session, "b1", "t1", 50), 150);
        record_stake(&mut session, "b1", "t2", 20);
        assert_eq!(session.ledger.total_pot, 170);
        assert_eq!(session.ledger.stake("b1", "t2"), Some(&Stake { amount: 20, yield_paid: 0 }));
    }

    #[test]
    fn test_daily_yield_formula() {
        // 0.01 * 5 / 4 = 0.0125 -> floor(1.25) = 1
        assert_eq!(daily_yield(100, 5), 1);
        // Small stakes and early days still pay the minimum of 1.
        assert_eq!(daily_yield(10, 1), 1);
        assert_eq!(daily_yield(1_000, 8), 20);
        // Capped at 20% from day 80 onward.
        assert_eq!(daily_yield(1_000, 80), 200);
        assert_eq!(daily_yield(1_000, 500), 200);
    }

    #[test]
    fn test_accrue_daily_yield_scenario() {
        let mut session = session_with(&[("t1", false), ("t2", false)]);
        record_stake(&mut session, "b1", "t1", 100);
        record_stake(&mut session, "b2", "t2", 100);
        session.tributes.get_mut("t2").unwrap().alive = false;
        session.day_counter = 5;

        let payouts = accrue_daily_yield(&mut session);
        assert_eq!(
            payouts,
            vec![Payout {
                recipient: "b1".into(),
                amount: 1,
                reason: PayoutReason::DailyYield {
                    tribute: "t1".into()
                },
            }]
        );
        let stake = session.ledger.stake("b1", "t1").copied().unwrap();
        assert_eq!(stake, Stake { amount: 100, yield_paid: 1 });
        // Yield is minted, the pot is unchanged.
        assert_eq!(session.ledger.total_pot, 200);
    }

    #[test]
    fn test_settlement_pays_double_and_half_pot() {
        let mut session = session_with(&[("t1", false), ("t2", false)]);
        record_stake(&mut session, "b1", "t1", 100);
        record_stake(&mut session, "b2", "t1", 30);
        record_stake(&mut session, "b2", "t2", 70);
        record_stake(&mut session, "b3", "t2", 201);

        let payouts = settle_on_game_end(&mut session, Some("t1"));
        let total_for = |who: &str| -> u64 {
            payouts
                .iter()
                .filter(|p| p.recipient == who)
                .map(|p| p.amount)
                .sum()
        };
        assert_eq!(total_for("b1"), 200);
        assert_eq!(total_for("b2"), 60);
        assert_eq!(total_for("b3"), 0);
        // Pot = 401, winner gets floor(401 / 2).
        assert_eq!(total_for("t1"), 200);
        assert!(session.ledger.is_empty());
        assert_eq!(session.ledger.total_pot, 0);
    }

    #[test]
    fn test_synthetic_winner_gets_no_bonus() {
        let mut session = session_with(&[("npc", true)]);
        record_stake(&mut session, "b1", "npc", 40);
        let payouts = settle_on_game_end(&mut session, Some("npc"));
        assert_eq!(payouts.len(), 1);
        assert_eq!(payouts[0].recipient, "b1");
        assert_eq!(payouts[0].amount, 80);
    }

    #[test]
    fn test_no_winner_pays_nothing() {
        let mut session = session_with(&[("t1", false)]);
        record_stake(&mut session, "b1", "t1", 40);
        assert!(settle_on_game_end(&mut session, None).is_empty());
        assert!(session.ledger.is_empty());
    }

    proptest::proptest! {
        /// Yield is at least 1 and never more than the 20% cap (except for the minimum).
        #[test]
        fn prop_daily_yield_bounds(amount in 1u64..10_000_000, day in 1u32..1_000) {
            let paid = daily_yield(amount, day);
            proptest::prop_assert!(paid >= 1);
            proptest::prop_assert!(paid <= (amount / 5).max(1));
            proptest::prop_assert!(daily_yield(amount, day + 1) >= paid);
        }
    }

    #[test]
    fn test_stop_splits_pot_among_live_backers() {
        let mut session = session_with(&[("t1", false), ("t2", false), ("t3", false)]);
        record_stake(&mut session, "b1", "t1", 100);
        record_stake(&mut session, "b1", "t2", 100);
        record_stake(&mut session, "b2", "t2", 50);
        record_stake(&mut session, "b3", "t3", 51);
        session.tributes.get_mut("t3").unwrap().alive = false;

        let payouts = settle_on_stop(&mut session);
        // Pot 301 split between b1 and b2.
        assert_eq!(payouts.len(), 2);
        assert!(payouts.iter().all(|p| p.amount == 150 && p.reason == PayoutReason::StopRefund));
        assert!(payouts.iter().all(|p| p.recipient != "b3"));
        assert!(session.ledger.is_empty());
    }
}
