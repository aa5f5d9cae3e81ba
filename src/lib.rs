//! Timed adversarial territory capture.
//!
//! An attacker plants a war flag in a region of a grid-partitioned world,
//! opening a bounded real-time attack window. The flag steps through a
//! sequence of colored phases while defenders race to break it; if the
//! window runs out, the attacker captures the region. Exactly one of three
//! outcomes resolves every attack: won, defended, or canceled.
//!
//! The engine is headless. Rendering, territory ownership, and currency
//! live behind the [`render::Renderer`], [`territory::TerritoryProvider`],
//! and [`ledger::Ledger`] traits; outcomes are published on a JSONL event
//! stream ([`observability::EventLog`]) for the host to act on.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use flagsiege::attack::CellAttack;
//! use flagsiege::config::SiegeConfig;
//! use flagsiege::coordinator::AttackCoordinator;
//! use flagsiege::ledger::NullLedger;
//! use flagsiege::observability::EventLog;
//! use flagsiege::region::BlockPos;
//! use flagsiege::render::NullRenderer;
//! use flagsiege::scheduler::TokioScheduler;
//! use flagsiege::territory::UnclaimedTerritory;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let coordinator = AttackCoordinator::new(
//!     SiegeConfig::default(),
//!     Arc::new(NullRenderer),
//!     Arc::new(TokioScheduler),
//!     Arc::new(UnclaimedTerritory),
//!     Arc::new(NullLedger),
//!     Arc::new(EventLog::stderr()),
//! );
//!
//! let flag = CellAttack::new(
//!     "attacker_one",
//!     BlockPos::new("overworld", 37, 64, 53),
//!     coordinator.config(),
//!     Arc::clone(coordinator.events()),
//! );
//! coordinator.register_attack(flag)?;
//! # Ok(())
//! # }
//! ```

pub mod attack;
pub mod beacon;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod fees;
pub mod ledger;
pub mod observability;
pub mod region;
pub mod render;
pub mod scheduler;
pub mod territory;

pub use attack::{AttackState, CellAttack};
pub use config::SiegeConfig;
pub use coordinator::{AttackCoordinator, BreakCheck};
pub use error::{ConfigError, LedgerError, RegisterError, RenderError};
pub use region::{BlockPos, RegionId};
