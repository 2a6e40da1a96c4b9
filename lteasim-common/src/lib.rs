//! Common types and utilities for lteasim
//!
//! This crate provides shared types, configuration structures, and utilities
//! used across the lteasim crates: user and resource identifiers, power and
//! ratio units, the simulation tick, configuration loading and logging setup.

pub mod config;
pub mod error;
pub mod logging;
pub mod sim_tick;
pub mod types;

pub use config::{
    HarqConfig, LinkAdaptationConfig, MacConfig, PlacementKind, PlacementPolicy,
    SimulationConfig, StrategyKind,
};
pub use error::Error;
pub use logging::{init_logging, init_logging_with_filter, LogLevel};
pub use sim_tick::{SimulationClock, SimulationTick, SimulationTimeConfig};
pub use types::{Bits, Power, Prb, Ratio, UserId};
