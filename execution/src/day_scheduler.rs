//! Day-cycle state machine.
//!
//! This module decides *when* a session should resolve its current day or conclude the game.
//! It never performs the resolution itself and never reads a clock: the background task passes
//! `now_ms` and acts on the returned [`TickDecision`].
//!
//! ## Timing
//!
//! A day window lasts `clamp(alive * 20s + 20s, 60s, 300s)`. The window that follows every
//! tenth resolved day is a feast window and is stretched by half.
//!
//! ```rust,ignore
//! use gauntlet_execution::day_scheduler::{DayScheduler, TickDecision};
//!
//! let scheduler = DayScheduler::default();
//! scheduler.begin_next_day(&mut session, now_ms);
//! match scheduler.check(&session, now_ms + session.day_duration_ms) {
//!     TickDecision::Resolve => { /* run process_day */ }
//!     TickDecision::Conclude { winner } => { /* end the game */ }
//!     TickDecision::Idle => {}
//! }
//! ```

use gauntlet_types::{
    Session, DAY_SECS_BASE, DAY_SECS_MAX, DAY_SECS_MIN, DAY_SECS_PER_TRIBUTE, FEAST_CADENCE_DAYS,
    FEAST_DURATION_DEN, FEAST_DURATION_NUM,
};

/// Day window sizing, in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DayConfig {
    /// Added per living tribute.
    pub per_tribute_ms: u64,
    /// Added once per window.
    pub base_ms: u64,
    pub min_ms: u64,
    pub max_ms: u64,
    /// Feast windows follow every Nth resolved day.
    pub feast_cadence_days: u32,
}

impl Default for DayConfig {
    fn default() -> Self {
        Self {
            per_tribute_ms: DAY_SECS_PER_TRIBUTE * 1_000,
            base_ms: DAY_SECS_BASE * 1_000,
            min_ms: DAY_SECS_MIN * 1_000,
            max_ms: DAY_SECS_MAX * 1_000,
            feast_cadence_days: FEAST_CADENCE_DAYS,
        }
    }
}

impl DayConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.min_ms == 0 {
            return Err("min_ms must be greater than zero");
        }
        if self.min_ms > self.max_ms {
            return Err("min_ms must not exceed max_ms");
        }
        if self.feast_cadence_days == 0 {
            return Err("feast_cadence_days must be greater than zero");
        }
        Ok(())
    }
}

/// What the background task should do on this tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TickDecision {
    /// Nothing to do yet.
    Idle,
    /// The day window has elapsed; resolve the current day.
    Resolve,
    /// One tribute or fewer is alive; end the game. `winner` is `None` if nobody survived.
    Conclude { winner: Option<String> },
}

/// Pure deadline state machine for the day loop.
#[derive(Clone, Debug, Default)]
pub struct DayScheduler {
    config: DayConfig,
}

impl DayScheduler {
    /// Build a scheduler, rejecting windows that could never open or never close.
    pub fn new(config: DayConfig) -> Result<Self, &'static str> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The window after `day` is a feast window when `day` is a positive multiple of the cadence.
    pub fn is_feast_day(&self, day: u32) -> bool {
        day > 0 && day % self.config.feast_cadence_days == 0
    }

    /// Length of the day window that follows `day` with `alive` tributes left.
    pub fn day_duration_ms(&self, alive: usize, day: u32) -> u64 {
        let alive = u64::try_from(alive).unwrap_or(u64::MAX);
        let duration = alive
            .saturating_mul(self.config.per_tribute_ms)
            .saturating_add(self.config.base_ms)
            .clamp(self.config.min_ms, self.config.max_ms);
        if self.is_feast_day(day) {
            duration.saturating_mul(FEAST_DURATION_NUM) / FEAST_DURATION_DEN
        } else {
            duration
        }
    }

    /// True once the current window has elapsed.
    pub fn is_due(&self, session: &Session, now_ms: u64) -> bool {
        now_ms.saturating_sub(session.day_start_ms) >= session.day_duration_ms
    }

    /// Decide what to do for `session` at `now_ms`.
    ///
    /// Termination is checked before the deadline.
    pub fn check(&self, session: &Session, now_ms: u64) -> TickDecision {
        if !session.is_running() {
            return TickDecision::Idle;
        }
        let mut alive = session.alive();
        let first = alive.next();
        if alive.next().is_none() {
            return TickDecision::Conclude {
                winner: first.map(|tribute| tribute.id.clone()),
            };
        }
        if self.is_due(session, now_ms) {
            TickDecision::Resolve
        } else {
            TickDecision::Idle
        }
    }

    /// Open the next day window at `now_ms`.
    pub fn begin_next_day(&self, session: &mut Session, now_ms: u64) {
        session.feast_active = self.is_feast_day(session.day_counter);
        session.day_duration_ms = self.day_duration_ms(session.alive_count(), session.day_counter);
        session.day_start_ms = now_ms;
    }

    /// Collapse the current window so the next poll resolves the day.
    pub fn force_next_day(&self, session: &mut Session) {
        session.day_duration_ms = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gauntlet_types::{SessionPhase, Tribute};

    fn running(alive: usize, dead: usize) -> Session {
        let mut session = Session::new("sched");
        session.phase = SessionPhase::Running;
        for idx in 0..alive + dead {
            let mut tribute = Tribute::new(format!("t{idx}"), format!("T{idx}"), 4, false);
            tribute.alive = idx < alive;
            session.tributes.insert(tribute.id.clone(), tribute);
        }
        session
    }

    #[test]
    fn test_day_config_validation() {
        let valid = DayConfig::default();
        assert!(valid.validate().is_ok());
        assert!(DayConfig { min_ms: 0, ..valid }.validate().is_err());
        assert!(DayConfig { min_ms: 10, max_ms: 5, ..valid }.validate().is_err());
        assert!(DayConfig { feast_cadence_days: 0, ..valid }.validate().is_err());
    }

    #[test]
    fn test_new_rejects_bad_windows() {
        let short = DayConfig {
            min_ms: 1_000,
            max_ms: 2_000,
            ..DayConfig::default()
        };
        let scheduler = DayScheduler::new(short).expect("valid window");
        assert_eq!(scheduler.day_duration_ms(24, 1), 2_000);

        let inverted = DayConfig {
            min_ms: 10,
            max_ms: 5,
            ..DayConfig::default()
        };
        assert!(DayScheduler::new(inverted).is_err());
    }

    #[test]
    fn test_day_duration_clamps() {
        let scheduler = DayScheduler::default();
        // 1 * 20 + 20 = 40s, raised to the 60s floor
        assert_eq!(scheduler.day_duration_ms(1, 1), 60_000);
        // 5 * 20 + 20 = 120s
        assert_eq!(scheduler.day_duration_ms(5, 1), 120_000);
        // 24 * 20 + 20 = 500s, capped at 300s
        assert_eq!(scheduler.day_duration_ms(24, 1), 300_000);
    }

    #[test]
    fn test_feast_windows_are_stretched() {
        let scheduler = DayScheduler::default();
        assert!(!scheduler.is_feast_day(0));
        assert!(scheduler.is_feast_day(10));
        assert!(scheduler.is_feast_day(20));
        assert!(!scheduler.is_feast_day(15));
        assert_eq!(scheduler.day_duration_ms(5, 10), 180_000);
        assert_eq!(scheduler.day_duration_ms(24, 20), 450_000);
    }

    #[test]
    fn test_check_resolves_after_window() {
        let scheduler = DayScheduler::default();
        let mut session = running(3, 0);
        scheduler.begin_next_day(&mut session, 1_000);
        assert_eq!(session.day_duration_ms, 80_000);
        assert_eq!(scheduler.check(&session, 1_000), TickDecision::Idle);
        assert_eq!(scheduler.check(&session, 80_999), TickDecision::Idle);
        assert_eq!(scheduler.check(&session, 81_000), TickDecision::Resolve);
    }

    #[test]
    fn test_check_concludes_with_one_survivor() {
        let scheduler = DayScheduler::default();
        let mut session = running(1, 3);
        scheduler.begin_next_day(&mut session, 0);
        // Not due yet, but the game is already decided.
        assert_eq!(
            scheduler.check(&session, 1),
            TickDecision::Conclude {
                winner: Some("t0".into())
            }
        );

        let wiped = running(0, 2);
        assert_eq!(
            scheduler.check(&wiped, 0),
            TickDecision::Conclude { winner: None }
        );
    }

    #[test]
    fn test_check_is_idle_unless_running() {
        let scheduler = DayScheduler::default();
        let mut session = running(1, 0);
        session.phase = SessionPhase::Ended;
        assert_eq!(scheduler.check(&session, u64::MAX), TickDecision::Idle);
        session.phase = SessionPhase::Signup;
        assert_eq!(scheduler.check(&session, u64::MAX), TickDecision::Idle);
    }

    #[test]
    fn test_begin_next_day_sets_feast_flag() {
        let scheduler = DayScheduler::default();
        let mut session = running(4, 0);
        session.day_counter = 10;
        scheduler.begin_next_day(&mut session, 5);
        assert!(session.feast_active);
        assert_eq!(session.day_start_ms, 5);
        assert_eq!(session.day_duration_ms, 150_000);

        session.day_counter = 11;
        scheduler.begin_next_day(&mut session, 6);
        assert!(!session.feast_active);
    }

    #[test]
    fn test_force_next_day() {
        let scheduler = DayScheduler::default();
        let mut session = running(5, 0);
        scheduler.begin_next_day(&mut session, 10_000);
        assert_eq!(scheduler.check(&session, 10_001), TickDecision::Idle);
        scheduler.force_next_day(&mut session);
        assert_eq!(scheduler.check(&session, 10_001), TickDecision::Resolve);
        assert_eq!(session.time_remaining_ms(10_001), 0);
    }
}
