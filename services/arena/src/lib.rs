//! Gauntlet arena service.
//!
//! Hosts one background task per session, persists snapshots after every committed change and
//! exposes the lifecycle, wagering and admin operations over HTTP with a websocket feed of
//! announcements.

pub mod announce;
pub mod api;
pub mod balance;
pub mod clock;
pub mod config;
pub mod host;
pub mod persistence;
pub mod session_task;

pub use announce::{Announcement, AnnouncementSink, BroadcastSink};
pub use balance::{BalanceError, BalanceService, InMemoryBank};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::ArenaConfig;
pub use host::{ArenaHost, HostError};
pub use persistence::{MemoryStore, SessionStore, SqliteStore};
pub use session_task::{SessionDeps, SessionHandle, SessionTask, TaskConfig};
