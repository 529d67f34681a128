//! Gauntlet execution layer.
//!
//! This crate contains the arena engine: the player registry, the zone manager, the wagering
//! ledger, the per-day resolution pipeline, the day scheduler state machine and the session
//! lifecycle transitions. The service crate drives it from a background task.
//!
//! ## Purity requirements
//! - Do not read wall-clock time here; callers pass `now_ms`.
//! - Do not create randomness here; every random choice is drawn from the `Rng` the caller
//!   passes in, so seeded runs are reproducible.
//! - Keep iteration over tributes and stakes on ordered maps so outputs do not depend on hash
//!   order.
//!
//! ## Day resolution
//! [`process_day`] takes an immutable snapshot and returns the next snapshot plus a
//! [`DayReport`](gauntlet_types::DayReport). Nothing is committed unless the whole day
//! succeeds.
//!
//! ```rust,ignore
//! use gauntlet_execution::{lifecycle, process_day, DayScheduler};
//! use gauntlet_types::Session;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut rng = StdRng::seed_from_u64(7);
//! let scheduler = DayScheduler::default();
//! let mut session = Session::new("channel-1");
//! lifecycle::open_signup(&mut session)?;
//! lifecycle::register_player(&mut session, "u1", "Rue", &mut rng)?;
//! lifecycle::start(&mut session, 3, 0, &scheduler, &mut rng)?;
//! let (next, report) = process_day(&session, session.day_counter, &mut rng)?;
//! assert_eq!(next.day_counter, 1);
//! # Ok::<(), gauntlet_types::ArenaError>(())
//! ```

pub mod admin;
pub mod combat;
pub mod day_scheduler;
pub mod ledger;
pub mod lifecycle;
pub mod registry;
pub mod resolution;
pub mod zones;

#[cfg(any(test, feature = "mocks"))]
pub mod mocks;

pub use admin::apply_admin_event;
pub use day_scheduler::{DayConfig, DayScheduler, TickDecision};
pub use lifecycle::GameOutcome;
pub use resolution::process_day;
