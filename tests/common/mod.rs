#![allow(dead_code)]

//! Shared harness for the integration suites: recording fakes for the
//! renderer and ledger, a fixed-ownership territory provider, and a
//! manually ticked siege engine wired from them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use flagsiege::attack::CellAttack;
use flagsiege::config::SiegeConfig;
use flagsiege::coordinator::AttackCoordinator;
use flagsiege::error::{LedgerError, TerritoryError};
use flagsiege::ledger::Ledger;
use flagsiege::observability::EventLog;
use flagsiege::region::{BlockPos, RegionId};
use flagsiege::render::{Material, Renderer};
use flagsiege::scheduler::{ManualScheduler, Scheduler};
use flagsiege::territory::TerritoryProvider;

/// Renderer that keeps the painted world in a map so tests can assert on
/// exactly which blocks exist after any step.
#[derive(Default)]
pub struct RecordingRenderer {
    world: Mutex<HashMap<BlockPos, Material>>,
    countdowns: Mutex<HashMap<BlockPos, String>>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn material_at(&self, pos: &BlockPos) -> Option<String> {
        self.world
            .lock()
            .unwrap()
            .get(pos)
            .map(|m| m.name().to_owned())
    }

    pub fn painted_blocks(&self) -> usize {
        self.world.lock().unwrap().len()
    }

    pub fn countdown_text(&self, pos: &BlockPos) -> Option<String> {
        self.countdowns.lock().unwrap().get(pos).cloned()
    }

    pub fn countdown_count(&self) -> usize {
        self.countdowns.lock().unwrap().len()
    }
}

impl Renderer for RecordingRenderer {
    fn paint(&self, pos: &BlockPos, material: &Material) -> flagsiege::render::Result<()> {
        self.world
            .lock()
            .unwrap()
            .insert(pos.clone(), material.clone());
        Ok(())
    }

    fn clear(&self, pos: &BlockPos) -> flagsiege::render::Result<()> {
        self.world.lock().unwrap().remove(pos);
        Ok(())
    }

    fn is_empty(&self, pos: &BlockPos) -> bool {
        !self.world.lock().unwrap().contains_key(pos)
    }

    fn max_build_height(&self, _world: &str) -> i32 {
        320
    }

    fn show_countdown(&self, pos: &BlockPos, text: &str) -> flagsiege::render::Result<()> {
        self.countdowns
            .lock()
            .unwrap()
            .insert(pos.clone(), text.to_owned());
        Ok(())
    }

    fn update_countdown(&self, pos: &BlockPos, text: &str) -> flagsiege::render::Result<()> {
        self.countdowns
            .lock()
            .unwrap()
            .insert(pos.clone(), text.to_owned());
        Ok(())
    }

    fn delete_countdown(&self, pos: &BlockPos) -> flagsiege::render::Result<()> {
        self.countdowns.lock().unwrap().remove(pos);
        Ok(())
    }
}

/// One recorded money movement.
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerOp {
    Withdraw {
        account: String,
        amount: f64,
        reason: String,
    },
    Pay {
        payer: String,
        amount: f64,
        payee: String,
        reason: String,
    },
    Deposit {
        account: String,
        amount: f64,
        reason: String,
    },
}

/// Ledger that records every operation; optionally fails everything so
/// tests can prove resolution survives a broken economy.
#[derive(Default)]
pub struct RecordingLedger {
    ops: Mutex<Vec<LedgerOp>>,
    failing: bool,
}

impl RecordingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            ops: Mutex::new(Vec::new()),
            failing: true,
        }
    }

    pub fn ops(&self) -> Vec<LedgerOp> {
        self.ops.lock().unwrap().clone()
    }

    fn outcome(&self) -> flagsiege::ledger::Result<()> {
        if self.failing {
            Err(LedgerError::Backend("economy offline".to_owned()))
        } else {
            Ok(())
        }
    }
}

impl Ledger for RecordingLedger {
    fn withdraw(&self, account: &str, amount: f64, reason: &str) -> flagsiege::ledger::Result<()> {
        self.ops.lock().unwrap().push(LedgerOp::Withdraw {
            account: account.to_owned(),
            amount,
            reason: reason.to_owned(),
        });
        self.outcome()
    }

    fn pay(
        &self,
        payer: &str,
        amount: f64,
        payee: &str,
        reason: &str,
    ) -> flagsiege::ledger::Result<()> {
        self.ops.lock().unwrap().push(LedgerOp::Pay {
            payer: payer.to_owned(),
            amount,
            payee: payee.to_owned(),
            reason: reason.to_owned(),
        });
        self.outcome()
    }

    fn deposit(&self, account: &str, amount: f64, reason: &str) -> flagsiege::ledger::Result<()> {
        self.ops.lock().unwrap().push(LedgerOp::Deposit {
            account: account.to_owned(),
            amount,
            reason: reason.to_owned(),
        });
        self.outcome()
    }
}

/// Territory provider backed by a claim map; captures move ownership in
/// place so tests can observe the handover.
#[derive(Default)]
pub struct StaticTerritory {
    claims: Mutex<HashMap<RegionId, String>>,
    sealed: bool,
}

impl StaticTerritory {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that rejects every handover, for proving resolution
    /// survives a broken territory backend.
    pub fn sealed() -> Self {
        Self {
            claims: Mutex::new(HashMap::new()),
            sealed: true,
        }
    }

    #[must_use]
    pub fn claim(self, region: RegionId, group: &str) -> Self {
        self.claims.lock().unwrap().insert(region, group.to_owned());
        self
    }

    pub fn owner_of(&self, region: &RegionId) -> Option<String> {
        self.claims.lock().unwrap().get(region).cloned()
    }
}

impl TerritoryProvider for StaticTerritory {
    fn owner_of(&self, region: &RegionId) -> Option<String> {
        StaticTerritory::owner_of(self, region)
    }

    fn transfer(&self, region: &RegionId, new_owner: &str) -> Result<(), TerritoryError> {
        if self.sealed {
            return Err(TerritoryError::new(region.clone(), "store is read-only"));
        }
        self.claims
            .lock()
            .unwrap()
            .insert(region.clone(), new_owner.to_owned());
        Ok(())
    }
}

/// A fully wired engine with recording collaborators and a manual clock.
pub struct SiegeHarness {
    pub coordinator: Arc<AttackCoordinator>,
    pub scheduler: Arc<ManualScheduler>,
    pub renderer: Arc<RecordingRenderer>,
    pub ledger: Arc<RecordingLedger>,
    pub territory: Arc<StaticTerritory>,
}

impl SiegeHarness {
    pub fn new(config: SiegeConfig, territory: StaticTerritory) -> Self {
        Self::build(config, territory, RecordingLedger::new(), EventLog::noop())
    }

    pub fn with_events(config: SiegeConfig, territory: StaticTerritory, events: EventLog) -> Self {
        Self::build(config, territory, RecordingLedger::new(), events)
    }

    pub fn with_ledger(
        config: SiegeConfig,
        territory: StaticTerritory,
        ledger: RecordingLedger,
    ) -> Self {
        Self::build(config, territory, ledger, EventLog::noop())
    }

    fn build(
        config: SiegeConfig,
        territory: StaticTerritory,
        ledger: RecordingLedger,
        events: EventLog,
    ) -> Self {
        let scheduler = Arc::new(ManualScheduler::new());
        let renderer = Arc::new(RecordingRenderer::new());
        let ledger = Arc::new(ledger);
        let territory = Arc::new(territory);
        let coordinator = AttackCoordinator::new(
            config,
            Arc::clone(&renderer) as Arc<dyn Renderer>,
            Arc::clone(&scheduler) as Arc<dyn Scheduler>,
            Arc::clone(&territory) as Arc<dyn TerritoryProvider>,
            Arc::clone(&ledger) as Arc<dyn Ledger>,
            Arc::new(events),
        );
        Self {
            coordinator,
            scheduler,
            renderer,
            ledger,
            territory,
        }
    }

    /// Registers a flag for `attacker` at block `(x, 64, z)` and returns
    /// the live attack record.
    pub fn plant(&self, attacker: &str, x: i32, z: i32) -> Arc<CellAttack> {
        let cell = CellAttack::new(
            attacker,
            BlockPos::new("overworld", x, 64, z),
            self.coordinator.config(),
            Arc::clone(self.coordinator.events()),
        );
        let region = cell.region().clone();
        self.coordinator
            .register_attack(cell)
            .expect("registration should succeed");
        self.coordinator
            .attack_data(&region)
            .expect("attack should be registered")
    }
}
