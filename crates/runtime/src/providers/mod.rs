//! Collaborators injected into the runtime.
//!
//! - [`EconomyGateway`]: the external currency and ticket system
//! - [`EntropySource`]: OS-seeded randomness for draws and boss behaviour

mod economy;
mod entropy;

pub use economy::{EconomyGateway, GatewayError, LedgerEconomy, NoopEconomy, TicketKind};
pub use entropy::EntropySource;
