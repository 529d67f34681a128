//! Arena domain types.
//!
//! Defines tribute/zone/session/ledger state and the constants used by the execution layer
//! and the arena service.

mod admin;
mod constants;
mod error;
mod report;
mod session;
mod tribute;
mod wager;
mod zone;

pub use admin::*;
pub use constants::*;
pub use error::*;
pub use report::*;
pub use session::*;
pub use tribute::*;
pub use wager::*;
pub use zone::*;
