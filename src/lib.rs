//! Slot allocation, booking lifecycle and settlement engine for the
//! JuristHUB consultation marketplace. Route handlers, templates and
//! session handling live elsewhere and call in through the engine
//! types re-exported here.

pub mod config;
pub mod database;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod models;
pub mod notify;
pub mod views;

pub use config::EngineConfig;
pub use database::Database;
pub use engine::{
    CancellationEngine, CancellationOutcome, ReservationEngine, Reviews, SettlementEngine,
    SlotGenerator,
};
pub use error::{EngineError, EngineResult};
