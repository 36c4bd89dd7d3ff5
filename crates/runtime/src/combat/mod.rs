//! Battle sessions: the registry handle and the service that drives it.

mod registry;
mod service;

pub use registry::{CombatSession, RegistryConfig, SessionKey, SessionRegistry};
pub use service::{CombatService, PayoutStatus, TurnOutcome};
