//! Worker tasks that back the runtime orchestration.
//!
//! The session worker owns every active battle; handles talk to it over a
//! command channel.

mod sessions;

pub use sessions::{Advanced, SessionCommand, SessionWorker};
