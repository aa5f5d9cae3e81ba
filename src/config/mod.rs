//! Configuration.
//!
//! Declarative siege settings: flag materials and timings, beacon shape,
//! countdown display, per-actor limits, and economy values. Loaded from
//! YAML with defaults for every field, then structurally validated.

pub mod schema;
pub mod validation;

pub use schema::{
    BeaconConfig, CountdownConfig, EconomyConfig, FlagConfig, RulesConfig, SiegeConfig,
};
pub use validation::validate;
