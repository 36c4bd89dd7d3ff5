//! Topic-based event bus for runtime telemetry.
//!
//! Events are published to specific topics, and consumers subscribe only to
//! the topics they need. Publishing never blocks and never fails: an event
//! without subscribers is dropped.

mod bus;
mod types;

pub use bus::{Event, EventBus, Topic};
pub use types::{CombatEvent, CombatOutcome, DrawEvent};
