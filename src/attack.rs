//! Per-region attack state machine.
//!
//! A [`CellAttack`] owns everything visible about one contested region: the
//! flag (base, indicator, light), the optional beacon volume, the repeating
//! phase timer, and the optional one-second countdown timer. States move one
//! way only — Idle → Active → Resolving → Terminated — and teardown is
//! single-shot no matter how many of the three terminal paths race into it.

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::beacon::{self, BeaconVolume};
use crate::config::{BeaconConfig, SiegeConfig};
use crate::observability::{Event, EventLog};
use crate::region::{BlockPos, RegionId};
use crate::render::{Material, Renderer};
use crate::scheduler::{Scheduler, TimerHandle};

/// Lifecycle states; transitions are one-directional.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackState {
    /// Constructed, not started.
    Idle,
    /// Timers running, phase index advancing.
    Active,
    /// One of the three terminal paths has begun.
    Resolving,
    /// Timers canceled, visuals cleared.
    Terminated,
}

impl AttackState {
    const fn as_u8(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Active => 1,
            Self::Resolving => 2,
            Self::Terminated => 3,
        }
    }

    const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Idle,
            1 => Self::Active,
            2 => Self::Resolving,
            _ => Self::Terminated,
        }
    }
}

/// What a phase tick observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseTick {
    /// Still within the phase range; the indicator was repainted.
    Advanced,
    /// The phase index reached the phase count; the attack has naturally
    /// expired and the caller must route into the won-resolution path.
    Expired,
}

#[derive(Default)]
struct Timers {
    phase: Option<TimerHandle>,
    countdown: Option<TimerHandle>,
}

/// One region under attack.
pub struct CellAttack {
    region: RegionId,
    attacker: String,
    base: BlockPos,
    indicator: BlockPos,
    light: BlockPos,

    base_material: Material,
    light_material: Material,
    wireframe_material: Material,
    phase_materials: Vec<Material>,
    phase_interval: Duration,
    beacon_config: BeaconConfig,
    cell_size: u32,
    countdown_template: Option<String>,
    events: Arc<EventLog>,

    phase: AtomicUsize,
    remaining_secs: AtomicI64,
    state: AtomicU8,
    beacon: OnceLock<BeaconVolume>,
    timers: Mutex<Timers>,
    countdown_shown: AtomicBool,
}

impl CellAttack {
    /// Builds a not-yet-started attack record for the flag planted at
    /// `base`. The indicator and light positions are derived once, directly
    /// above the base, and stay fixed for the record's lifetime.
    #[must_use]
    pub fn new(
        attacker: impl Into<String>,
        base: BlockPos,
        config: &SiegeConfig,
        events: Arc<EventLog>,
    ) -> Self {
        let region = RegionId::containing(&base, config.rules.cell_size);
        let indicator = base.above(1);
        let light = base.above(2);
        let countdown_template = if config.countdown.enabled {
            config.countdown.timer_template.clone()
        } else {
            None
        };
        #[allow(clippy::cast_possible_wrap)]
        let remaining = config.flag.waiting_time.as_secs() as i64;
        Self {
            region,
            attacker: attacker.into(),
            base,
            indicator,
            light,
            base_material: config.flag.base_material.clone(),
            light_material: config.flag.light_material.clone(),
            wireframe_material: config.beacon.wireframe_material.clone(),
            phase_materials: config.flag.phase_materials.clone(),
            phase_interval: config.phase_interval(),
            beacon_config: config.beacon.clone(),
            cell_size: config.rules.cell_size,
            countdown_template,
            events,
            phase: AtomicUsize::new(0),
            remaining_secs: AtomicI64::new(remaining),
            state: AtomicU8::new(AttackState::Idle.as_u8()),
            beacon: OnceLock::new(),
            timers: Mutex::new(Timers::default()),
            countdown_shown: AtomicBool::new(false),
        }
    }

    /// The contested region.
    #[must_use]
    pub fn region(&self) -> &RegionId {
        &self.region
    }

    /// Name of the attacking actor.
    #[must_use]
    pub fn attacker(&self) -> &str {
        &self.attacker
    }

    /// Position of the flag base block.
    #[must_use]
    pub fn base(&self) -> &BlockPos {
        &self.base
    }

    /// Current phase index.
    #[must_use]
    pub fn phase(&self) -> usize {
        self.phase.load(Ordering::SeqCst)
    }

    /// Total number of phases.
    #[must_use]
    pub fn phase_count(&self) -> usize {
        self.phase_materials.len()
    }

    /// Interval between phase ticks.
    #[must_use]
    pub fn phase_interval(&self) -> Duration {
        self.phase_interval
    }

    /// Seconds left on the visual countdown.
    #[must_use]
    pub fn remaining_secs(&self) -> i64 {
        self.remaining_secs.load(Ordering::SeqCst)
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> AttackState {
        AttackState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// `true` once the phase index has reached the phase count.
    #[must_use]
    pub fn has_expired(&self) -> bool {
        self.phase() >= self.phase_count()
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Starts the attack: draws the flag and beacon, schedules the phase
    /// timer, and (when configured) the one-second countdown timer.
    ///
    /// `on_expired` is invoked from the phase timer when the window runs
    /// out; the caller wires it into the won-resolution path so this type
    /// stays free of territory knowledge. Starting twice is a logged no-op.
    pub fn start(
        self: Arc<Self>,
        scheduler: &dyn Scheduler,
        renderer: &Arc<dyn Renderer>,
        on_expired: impl Fn() + Send + Sync + 'static,
    ) {
        if self
            .state
            .compare_exchange(
                AttackState::Idle.as_u8(),
                AttackState::Active.as_u8(),
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_err()
        {
            warn!(region = %self.region, "attack already started; ignoring start()");
            return;
        }

        self.load_beacon(renderer.as_ref());
        self.draw(renderer.as_ref());

        let mut timers = self.timers.lock().expect("timer slots poisoned");

        let cell = Arc::clone(&self);
        let paint = Arc::clone(renderer);
        timers.phase = Some(scheduler.schedule_repeating(
            self.phase_interval,
            Box::new(move || match cell.on_phase_tick(paint.as_ref()) {
                PhaseTick::Advanced => {}
                PhaseTick::Expired => on_expired(),
            }),
        ));

        if let Some(template) = &self.countdown_template {
            let text = format_timer(self.remaining_secs(), template);
            match renderer.show_countdown(&self.light, &text) {
                Ok(()) => {
                    self.countdown_shown.store(true, Ordering::SeqCst);
                    let cell = Arc::clone(&self);
                    let paint = Arc::clone(renderer);
                    timers.countdown = Some(scheduler.schedule_repeating(
                        Duration::from_secs(1),
                        Box::new(move || cell.on_life_tick(paint.as_ref())),
                    ));
                }
                Err(err) => warn!(region = %self.region, %err, "countdown display failed"),
            }
        }
    }

    /// Advances one phase.
    ///
    /// Within range: repaints the indicator and the beacon body with the
    /// new phase material. At the boundary: reports [`PhaseTick::Expired`]
    /// and paints nothing — resolving ownership is the coordinator's job.
    pub fn on_phase_tick(&self, renderer: &dyn Renderer) -> PhaseTick {
        let phase = self.phase.fetch_add(1, Ordering::SeqCst) + 1;
        if phase >= self.phase_count() {
            return PhaseTick::Expired;
        }
        let material = self.phase_materials[phase].clone();
        self.paint_phase(renderer, &material);
        info!(region = %self.region, phase, %material, "war flag advanced");
        self.events.record(Event::PhaseAdvanced {
            timestamp: Utc::now(),
            region: self.region.clone(),
            phase,
            material: material.name().to_owned(),
        });
        PhaseTick::Advanced
    }

    /// Counts one second off the visual countdown and updates the display.
    /// A no-op when no countdown is configured or shown.
    pub fn on_life_tick(&self, renderer: &dyn Renderer) {
        if !self.countdown_shown.load(Ordering::SeqCst) {
            return;
        }
        let Some(template) = &self.countdown_template else {
            return;
        };
        let left = self.remaining_secs.fetch_sub(1, Ordering::SeqCst) - 1;
        let text = format_timer(left.max(0), template);
        if let Err(err) = renderer.update_countdown(&self.light, &text) {
            warn!(region = %self.region, %err, "countdown update failed");
        }
    }

    /// Cancels both timers and clears every owned position: flag parts,
    /// beacon body, wireframe, and the countdown display.
    ///
    /// Idempotent: only the first call acts, later calls return
    /// immediately. Render failures are logged and the sweep continues so
    /// one bad block can never leave timers running.
    pub fn teardown(&self, renderer: &dyn Renderer) {
        let prev = self.state.swap(AttackState::Terminated.as_u8(), Ordering::SeqCst);
        if prev == AttackState::Terminated.as_u8() {
            return;
        }

        // Timers first: nothing may fire once teardown has begun.
        {
            let mut timers = self.timers.lock().expect("timer slots poisoned");
            if let Some(handle) = timers.phase.take() {
                handle.cancel();
            }
            if let Some(handle) = timers.countdown.take() {
                handle.cancel();
            }
        }

        for pos in [&self.light, &self.indicator, &self.base] {
            if let Err(err) = renderer.clear(pos) {
                warn!(%pos, %err, "failed to clear flag block");
            }
        }
        if let Some(volume) = self.beacon.get() {
            for pos in volume.body.iter().chain(volume.wireframe.iter()) {
                if let Err(err) = renderer.clear(pos) {
                    warn!(%pos, %err, "failed to clear beacon block");
                }
            }
        }
        if self.countdown_shown.swap(false, Ordering::SeqCst) {
            if let Err(err) = renderer.delete_countdown(&self.light) {
                warn!(region = %self.region, %err, "failed to delete countdown");
            }
        }
    }

    /// Marks the record as resolving. Returns `false` when a terminal path
    /// already claimed it.
    pub(crate) fn mark_resolving(&self) -> bool {
        self.state
            .compare_exchange(
                AttackState::Active.as_u8(),
                AttackState::Resolving.as_u8(),
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok()
            || self
                .state
                .compare_exchange(
                    AttackState::Idle.as_u8(),
                    AttackState::Resolving.as_u8(),
                    Ordering::SeqCst,
                    Ordering::SeqCst,
                )
                .is_ok()
    }

    // -----------------------------------------------------------------------
    // Drawing
    // -----------------------------------------------------------------------

    /// Computes the beacon volume, once, if drawing is enabled and the
    /// geometry fits: the cube must sit within the cell footprint and the
    /// configured clearance above the flag must be positive.
    fn load_beacon(&self, renderer: &dyn Renderer) {
        if !self.beacon_config.draw {
            debug!(region = %self.region, "beacon drawing disabled");
            return;
        }
        let side = beacon::side_length(self.beacon_config.radius);
        #[allow(clippy::cast_possible_wrap)]
        if (self.cell_size as i32) < side {
            debug!(region = %self.region, side, "beacon side exceeds cell size; skipping");
            return;
        }
        if self.beacon_config.min_height_above_flag <= 0 {
            debug!(region = %self.region, "no vertical clearance above flag; skipping beacon");
            return;
        }
        let origin = beacon::origin_for(
            &self.region,
            self.cell_size,
            self.beacon_config.radius,
            self.light.y,
            self.beacon_config.max_height_above_flag,
            renderer.max_build_height(&self.region.world),
        );
        let volume =
            beacon::build_volume(&origin, self.beacon_config.radius, |pos| renderer.is_empty(pos));
        let _ = self.beacon.set(volume);
    }

    /// Paints the full flag: base, current-phase indicator and beacon body,
    /// light, and the beacon wireframe.
    fn draw(&self, renderer: &dyn Renderer) {
        if let Err(err) = renderer.paint(&self.base, &self.base_material) {
            warn!(pos = %self.base, %err, "failed to paint flag base");
        }
        let phase = self.phase().min(self.phase_count().saturating_sub(1));
        if let Some(material) = self.phase_materials.get(phase) {
            let material = material.clone();
            self.paint_phase(renderer, &material);
        }
        if let Err(err) = renderer.paint(&self.light, &self.light_material) {
            warn!(pos = %self.light, %err, "failed to paint flag light");
        }
        if let Some(volume) = self.beacon.get() {
            for pos in &volume.wireframe {
                if let Err(err) = renderer.paint(pos, &self.wireframe_material) {
                    warn!(%pos, %err, "failed to paint beacon wireframe");
                }
            }
        }
    }

    /// Repaints the indicator block and every beacon body cell.
    fn paint_phase(&self, renderer: &dyn Renderer, material: &Material) {
        if let Err(err) = renderer.paint(&self.indicator, material) {
            warn!(pos = %self.indicator, %err, "failed to paint indicator");
        }
        if let Some(volume) = self.beacon.get() {
            for pos in &volume.body {
                if let Err(err) = renderer.paint(pos, material) {
                    warn!(%pos, %err, "failed to paint beacon body");
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Membership predicates
    // -----------------------------------------------------------------------

    /// `true` if `pos` is the flag base block.
    #[must_use]
    pub fn is_flag_base(&self, pos: &BlockPos) -> bool {
        *pos == self.base
    }

    /// `true` if `pos` is the phase indicator block — the defender's target.
    #[must_use]
    pub fn is_flag_indicator(&self, pos: &BlockPos) -> bool {
        *pos == self.indicator
    }

    /// `true` if `pos` is the light block on top of the flag.
    #[must_use]
    pub fn is_flag_light(&self, pos: &BlockPos) -> bool {
        *pos == self.light
    }

    /// `true` if `pos` is any part of the flag itself.
    #[must_use]
    pub fn is_flag_part(&self, pos: &BlockPos) -> bool {
        self.is_flag_base(pos) || self.is_flag_indicator(pos) || self.is_flag_light(pos)
    }

    /// `true` if `pos` belongs to the beacon body or wireframe.
    #[must_use]
    pub fn is_part_of_beacon(&self, pos: &BlockPos) -> bool {
        self.beacon.get().is_some_and(|v| v.contains(pos))
    }

    /// `true` if `pos` is protected from modification while the attack is
    /// active: the beacon, the base, and the light. The indicator is
    /// deliberately mutable — breaking it is how the attack is defended.
    #[must_use]
    pub fn is_immutable(&self, pos: &BlockPos) -> bool {
        self.is_part_of_beacon(pos) || self.is_flag_base(pos) || self.is_flag_light(pos)
    }
}

impl std::fmt::Debug for CellAttack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CellAttack")
            .field("region", &self.region)
            .field("attacker", &self.attacker)
            .field("phase", &self.phase())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

/// Renders remaining time through a template with `{h}`, `{m}`, `{s}`
/// placeholders.
#[must_use]
pub fn format_timer(secs: i64, template: &str) -> String {
    let secs = secs.max(0);
    template
        .replace("{h}", &(secs / 3600).to_string())
        .replace("{m}", &((secs % 3600) / 60).to_string())
        .replace("{s}", &(secs % 60).to_string())
}
