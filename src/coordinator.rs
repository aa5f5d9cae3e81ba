//! Attack registry and resolution paths.
//!
//! The [`AttackCoordinator`] owns the live attack registries and the three
//! terminal paths (won, defended, canceled). Registration serializes its
//! checks behind a mutex; resolution linearizes on removal from the primary
//! registry with pointer identity, so each record resolves exactly once no
//! matter how many paths race.

use std::sync::{Arc, Mutex, Weak};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::{info, warn};

use crate::attack::CellAttack;
use crate::config::SiegeConfig;
use crate::error::RegisterError;
use crate::ledger::Ledger;
use crate::observability::{Event, EventLog};
use crate::region::{BlockPos, RegionId};
use crate::render::Renderer;
use crate::scheduler::Scheduler;
use crate::territory::TerritoryProvider;

/// Defender name recorded when the flag fell to the environment rather
/// than a named actor.
pub const GREATER_FORCES: &str = "Greater Forces";

/// Outcome of routing a broken block through the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakCheck {
    /// The phase indicator was broken; the attack resolved as defended.
    Defended,
    /// The block belongs to an active attack's protected structure
    /// (beacon, base, or light) and must not be modified.
    Protected,
    /// The block is not part of any active attack.
    Unrelated,
}

/// Coordinates every active attack.
pub struct AttackCoordinator {
    config: SiegeConfig,
    renderer: Arc<dyn Renderer>,
    scheduler: Arc<dyn Scheduler>,
    territory: Arc<dyn TerritoryProvider>,
    ledger: Arc<dyn Ledger>,
    events: Arc<EventLog>,

    attacks: DashMap<RegionId, Arc<CellAttack>>,
    by_attacker: DashMap<String, Vec<Arc<CellAttack>>>,
    last_resolved: DashMap<String, DateTime<Utc>>,
    // Serializes the quota/duplicate checks with the dual-map insert.
    registration: Mutex<()>,
    // Handed to expiry callbacks so natural expiry can route back in
    // without keeping the coordinator alive from its own timers.
    me: Weak<Self>,
}

impl std::fmt::Debug for AttackCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttackCoordinator")
            .field("active", &self.attacks.len())
            .finish_non_exhaustive()
    }
}

impl AttackCoordinator {
    /// Builds a coordinator over the given collaborators.
    #[must_use]
    pub fn new(
        config: SiegeConfig,
        renderer: Arc<dyn Renderer>,
        scheduler: Arc<dyn Scheduler>,
        territory: Arc<dyn TerritoryProvider>,
        ledger: Arc<dyn Ledger>,
        events: Arc<EventLog>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            config,
            renderer,
            scheduler,
            territory,
            ledger,
            events,
            attacks: DashMap::new(),
            by_attacker: DashMap::new(),
            last_resolved: DashMap::new(),
            registration: Mutex::new(()),
            me: Weak::clone(me),
        })
    }

    /// The configuration this coordinator runs under.
    #[must_use]
    pub fn config(&self) -> &SiegeConfig {
        &self.config
    }

    /// Handle to the outcome event log. New [`CellAttack`] records must be
    /// built against this log so phase events land in the same stream.
    #[must_use]
    pub fn events(&self) -> &Arc<EventLog> {
        &self.events
    }

    // -----------------------------------------------------------------------
    // Registration
    // -----------------------------------------------------------------------

    /// Registers `cell` and starts its state machine.
    ///
    /// The eligibility checks and the insert into both registries happen
    /// under one lock, so two racing registrations can never both pass the
    /// quota or claim the same region. The state machine starts outside the
    /// lock; its natural-expiry callback routes back into
    /// [`resolve_won`](Self::resolve_won) through a weak reference.
    ///
    /// # Errors
    ///
    /// [`RegisterError::AttacksDisabled`] when attacks are switched off,
    /// [`RegisterError::AlreadyInProgress`] when the region already has a
    /// flag, [`RegisterError::QuotaExceeded`] when the attacker is at their
    /// active-flag limit.
    pub fn register_attack(&self, cell: CellAttack) -> Result<(), RegisterError> {
        let cell = Arc::new(cell);
        let region = cell.region().clone();
        let attacker = cell.attacker().to_owned();

        {
            let _guard = match self.registration.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            if !self.config.rules.allow_attacks {
                return Err(RegisterError::AttacksDisabled);
            }
            if let Some(existing) = self.attacks.get(&region) {
                return Err(RegisterError::AlreadyInProgress {
                    region,
                    holder: existing.attacker().to_owned(),
                });
            }
            let quota = self.config.rules.max_active_flags_per_actor;
            let active = self.by_attacker.get(&attacker).map_or(0, |v| v.len());
            if active >= quota {
                return Err(RegisterError::QuotaExceeded { quota });
            }
            self.attacks.insert(region.clone(), Arc::clone(&cell));
            self.by_attacker
                .entry(attacker.clone())
                .or_default()
                .push(Arc::clone(&cell));
        }

        // The opening event goes out before any timer exists, so no phase
        // event can precede it in the stream.
        let owner = self.territory.owner_of(&region);
        info!(region = %region, attacker, "attack registered");
        self.events.record(Event::AttackStarted {
            timestamp: Utc::now(),
            region,
            attacker,
            owner,
            phases: cell.phase_count(),
            phase_interval_ms: u64::try_from(cell.phase_interval().as_millis()).unwrap_or(u64::MAX),
        });

        let coordinator = Weak::clone(&self.me);
        let expired = Arc::clone(&cell);
        Arc::clone(&cell).start(self.scheduler.as_ref(), &self.renderer, move || {
            if let Some(coordinator) = coordinator.upgrade() {
                coordinator.resolve_won(&expired);
            }
        });
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Read accessors
    // -----------------------------------------------------------------------

    /// `true` while `region` has an active attack.
    #[must_use]
    pub fn is_under_attack(&self, region: &RegionId) -> bool {
        self.attacks.contains_key(region)
    }

    /// `true` if any active attack targets land owned by `group`.
    #[must_use]
    pub fn is_group_under_attack(&self, group: &str) -> bool {
        self.attacks
            .iter()
            .any(|entry| self.territory.owner_of(entry.key()).as_deref() == Some(group))
    }

    /// The active attack on `region`, if any.
    #[must_use]
    pub fn attack_data(&self, region: &RegionId) -> Option<Arc<CellAttack>> {
        self.attacks.get(region).map(|e| Arc::clone(e.value()))
    }

    /// All active attacks registered by `attacker`.
    #[must_use]
    pub fn attacks_for(&self, attacker: &str) -> Vec<Arc<CellAttack>> {
        self.by_attacker
            .get(attacker)
            .map(|e| e.value().clone())
            .unwrap_or_default()
    }

    /// All active attacks on land owned by `group`.
    #[must_use]
    pub fn attacks_for_group(&self, group: &str) -> Vec<Arc<CellAttack>> {
        self.attacks
            .iter()
            .filter(|entry| self.territory.owner_of(entry.key()).as_deref() == Some(group))
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    /// Number of active attacks registered by `attacker`.
    #[must_use]
    pub fn count_active(&self, attacker: &str) -> usize {
        self.by_attacker.get(attacker).map_or(0, |e| e.len())
    }

    /// Snapshot of every active attack.
    #[must_use]
    pub fn active_attacks(&self) -> Vec<Arc<CellAttack>> {
        self.attacks
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    /// When an attack on `group`'s land last resolved, if ever.
    #[must_use]
    pub fn last_resolved_at(&self, group: &str) -> Option<DateTime<Utc>> {
        self.last_resolved.get(group).map(|e| *e.value())
    }

    /// `true` while `group` is still inside its post-resolution cooldown
    /// at time `now`. Exposed for eligibility checks by the host; nothing
    /// internal consumes it.
    #[must_use]
    pub fn is_on_cooldown(&self, group: &str, now: DateTime<Utc>) -> bool {
        let Some(resolved) = self.last_resolved_at(group) else {
            return false;
        };
        let elapsed = now.signed_duration_since(resolved);
        match chrono::Duration::from_std(self.config.rules.cooldown_after_resolution) {
            Ok(cooldown) => elapsed < cooldown,
            Err(_) => true,
        }
    }

    // -----------------------------------------------------------------------
    // Resolution
    // -----------------------------------------------------------------------

    /// Resolves `cell` as won by the attacker.
    ///
    /// A no-op when the record has already been resolved through any path.
    /// Registry detach, timer cancel, and visual clear happen before the
    /// cooldown stamp, ownership handover, ledger movement, and event;
    /// territory and ledger failures are logged and swallowed.
    pub fn resolve_won(&self, cell: &Arc<CellAttack>) {
        if !self.detach(cell) {
            return;
        }
        cell.mark_resolving();
        cell.teardown(self.renderer.as_ref());

        let region = cell.region().clone();
        let attacker = cell.attacker().to_owned();
        let owner = self.territory.owner_of(&region);
        if let Some(group) = &owner {
            self.last_resolved.insert(group.clone(), Utc::now());
        }

        if let Err(err) = self.territory.transfer(&region, &attacker) {
            warn!(region = %region, %err, "ownership handover failed");
        }

        let reward = self.config.economy.captured_region_reward;
        if let Some(group) = &owner {
            let outcome = if reward > 0.0 {
                self.ledger
                    .pay(group, reward, &attacker, "captured region spoils")
            } else if reward < 0.0 {
                self.ledger
                    .pay(&attacker, -reward, group, "captured region rebuild cost")
            } else {
                Ok(())
            };
            if let Err(err) = outcome {
                warn!(region = %region, %err, "capture payment failed");
            }
        }

        info!(region = %region, attacker, "attack won");
        self.events.record(Event::AttackWon {
            timestamp: Utc::now(),
            region,
            attacker,
            owner,
        });
    }

    /// Resolves `cell` as defended.
    ///
    /// `defender` is `None` when the flag fell to the environment; the
    /// defended-attack reward is then returned to the attacker instead of
    /// changing hands. A no-op when the record has already been resolved.
    pub fn resolve_defended(&self, defender: Option<&str>, cell: &Arc<CellAttack>) {
        if !self.detach(cell) {
            return;
        }
        cell.mark_resolving();
        cell.teardown(self.renderer.as_ref());

        let region = cell.region().clone();
        let attacker = cell.attacker().to_owned();
        if let Some(group) = self.territory.owner_of(&region) {
            self.last_resolved.insert(group, Utc::now());
        }

        let reward = self.config.economy.defended_reward;
        if reward > 0.0 {
            let outcome = match defender {
                Some(defender) => self
                    .ledger
                    .pay(&attacker, reward, defender, "attack defended"),
                None => self
                    .ledger
                    .deposit(&attacker, reward, "attack defended by greater forces"),
            };
            if let Err(err) = outcome {
                warn!(region = %region, %err, "defense payment failed");
            }
        }

        let defender = defender.unwrap_or(GREATER_FORCES).to_owned();
        info!(region = %region, attacker, defender, "attack defended");
        self.events.record(Event::AttackDefended {
            timestamp: Utc::now(),
            region,
            attacker,
            defender,
        });
    }

    /// Resolves `cell` as canceled: no winner, no cooldown stamp, no money.
    pub fn resolve_canceled(&self, cell: &Arc<CellAttack>) {
        if !self.detach(cell) {
            return;
        }
        cell.mark_resolving();
        cell.teardown(self.renderer.as_ref());

        let region = cell.region().clone();
        let attacker = cell.attacker().to_owned();
        info!(region = %region, attacker, "attack canceled");
        self.events.record(Event::AttackCanceled {
            timestamp: Utc::now(),
            region,
            attacker,
        });
    }

    /// Routes a broken block.
    ///
    /// Breaking the phase indicator resolves the attack as defended by
    /// `defender`; any other protected part reports [`BreakCheck::Protected`]
    /// so the host can refuse the modification.
    pub fn on_block_broken(&self, defender: &str, pos: &BlockPos) -> BreakCheck {
        let region = RegionId::containing(pos, self.config.rules.cell_size);
        let Some(cell) = self.attack_data(&region) else {
            return BreakCheck::Unrelated;
        };
        if cell.is_flag_indicator(pos) {
            self.resolve_defended(Some(defender), &cell);
            BreakCheck::Defended
        } else if cell.is_immutable(pos) {
            BreakCheck::Protected
        } else {
            BreakCheck::Unrelated
        }
    }

    /// Cancels every active attack registered by `attacker`.
    pub fn cancel_all_for(&self, attacker: &str) {
        for cell in self.attacks_for(attacker) {
            self.resolve_canceled(&cell);
        }
    }

    /// Cancels every active attack and flushes the event log. Registries
    /// hold no state worth persisting; an in-flight attack at shutdown is
    /// simply withdrawn.
    pub fn shutdown(&self) {
        for cell in self.active_attacks() {
            self.resolve_canceled(&cell);
        }
        self.events.flush();
    }

    /// Removes `cell` from both registries.
    ///
    /// Removal from the primary registry is the linearization point for
    /// resolution: it only succeeds for the exact record (`Arc` identity),
    /// so a stale handle can never evict a successor attack on the same
    /// region, and only one caller ever proceeds past this for a record.
    fn detach(&self, cell: &Arc<CellAttack>) -> bool {
        if self
            .attacks
            .remove_if(cell.region(), |_, current| Arc::ptr_eq(current, cell))
            .is_none()
        {
            return false;
        }
        if let Some(mut entry) = self.by_attacker.get_mut(cell.attacker()) {
            entry.retain(|c| !Arc::ptr_eq(c, cell));
            let empty = entry.is_empty();
            drop(entry);
            if empty {
                self.by_attacker.remove_if(cell.attacker(), |_, v| v.is_empty());
            }
        }
        true
    }
}
