//! Shared data model for the gauntlet arena.
//!
//! Everything the engine and the service exchange lives here: tributes, zones, the wagering
//! ledger, sessions, day reports and the error taxonomy. The types are plain data with `serde`
//! derives so a whole [`arena::Session`] can be snapshotted and restored as JSON.

pub mod arena;

pub use arena::*;
