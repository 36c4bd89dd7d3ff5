//! Runtime orchestration for the gacha bot.
//!
//! This crate wires the pure rules of `gacha-core` to guild records, the
//! external economy and an in-memory battle registry. Consumers embed
//! [`Runtime`] and talk to it through [`RuntimeHandle`].
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator and builder
//! - [`api`] exposes the types downstream clients interact with
//! - [`services`] implements draws, the economy and administration
//! - [`combat`] drives battles through the session registry
//! - [`events`] provides the topic-based telemetry bus
//! - [`providers`] and [`repository`] adapt external systems and storage
pub mod api;
pub mod combat;
pub mod events;
pub mod providers;
pub mod repository;
pub mod runtime;
pub mod services;

mod workers;

pub use api::{Result, RuntimeError, RuntimeHandle};
pub use combat::{
    CombatService, CombatSession, PayoutStatus, RegistryConfig, SessionKey, SessionRegistry,
    TurnOutcome,
};
pub use events::{CombatEvent, CombatOutcome, DrawEvent, Event, EventBus, Topic};
pub use providers::{
    EconomyGateway, EntropySource, GatewayError, LedgerEconomy, NoopEconomy, TicketKind,
};
pub use repository::{
    ConfigKey, Documents, FileGuildStore, GuildRecords, GuildStore, InMemoryGuildStore, RecordKind,
    RepositoryError,
};
pub use runtime::{Runtime, RuntimeBuilder, RuntimeConfig};
pub use services::{
    AdminService, BossField, ConfirmedOperation, DrawResult, DrawService, EconomyService,
    InventoryEntry, ItemField, PendingOperation, PityView, RedeemReceipt, SaleReceipt,
    TenDrawResult, UserLocks,
};
pub use workers::Advanced;
