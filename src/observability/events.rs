//! Typed outcome event stream.
//!
//! Every actor-visible outcome — an attack opening, each phase transition,
//! and the three terminal resolutions — is emitted as a discrete event,
//! serialized as newline-delimited JSON with a monotonically increasing
//! sequence number. Collaborators (broadcasts, UI, analytics) consume this
//! stream instead of being called directly.

use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::region::RegionId;

/// A discrete siege event.
///
/// Tagged with `"type"` when serialized so consumers can dispatch on kind.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum Event {
    /// An attack window opened on a region.
    AttackStarted {
        /// When the attack started.
        timestamp: DateTime<Utc>,
        /// The contested region.
        region: RegionId,
        /// Actor who planted the flag.
        attacker: String,
        /// Group owning the region at attack time, if any.
        #[serde(skip_serializing_if = "Option::is_none")]
        owner: Option<String>,
        /// Total number of phases.
        phases: usize,
        /// Interval between phases, in milliseconds.
        phase_interval_ms: u64,
    },

    /// The flag advanced one phase.
    PhaseAdvanced {
        /// When the phase changed.
        timestamp: DateTime<Utc>,
        /// The contested region.
        region: RegionId,
        /// New phase index (1-based after the first advance).
        phase: usize,
        /// Material painted for this phase.
        material: String,
    },

    /// The attack window expired; the attacker captured the region.
    AttackWon {
        /// When the attack resolved.
        timestamp: DateTime<Utc>,
        /// The captured region.
        region: RegionId,
        /// The winning attacker.
        attacker: String,
        /// Group that owned the region, if any.
        #[serde(skip_serializing_if = "Option::is_none")]
        owner: Option<String>,
    },

    /// A defender broke the flag before expiry.
    AttackDefended {
        /// When the attack resolved.
        timestamp: DateTime<Utc>,
        /// The defended region.
        region: RegionId,
        /// The repelled attacker.
        attacker: String,
        /// Who broke the flag; "Greater Forces" stands in when the flag
        /// fell to the environment rather than a named defender.
        defender: String,
    },

    /// The attack was canceled (revoked eligibility, admin action, or
    /// shutdown) with no winner.
    AttackCanceled {
        /// When the attack resolved.
        timestamp: DateTime<Utc>,
        /// The region the attack was on.
        region: RegionId,
        /// The attacker whose flag was withdrawn.
        attacker: String,
    },
}

/// Wraps an [`Event`] with a monotonically increasing sequence number.
#[derive(Debug, Serialize)]
struct EventEnvelope {
    sequence: u64,
    #[serde(flatten)]
    event: Event,
}

/// Thread-safe, buffered JSONL event log.
///
/// Each [`record`](Self::record) call atomically takes a sequence number,
/// serializes the event as one JSON line, and flushes. Serialization and
/// I/O failures are dropped silently — observability must never take the
/// engine down with it.
pub struct EventLog {
    writer: Mutex<BufWriter<Box<dyn Write + Send>>>,
    sequence: AtomicU64,
}

impl std::fmt::Debug for EventLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLog")
            .field("sequence", &self.sequence.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl EventLog {
    /// Creates a log writing to the given writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(BufWriter::new(writer)),
            sequence: AtomicU64::new(0),
        }
    }

    /// Creates a log writing to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    /// Creates a log that silently discards all events.
    #[must_use]
    pub fn noop() -> Self {
        Self::new(Box::new(std::io::sink()))
    }

    /// Creates a log appending to the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created or opened.
    pub fn to_file(path: &Path) -> std::io::Result<Self> {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        Ok(Self::new(Box::new(file)))
    }

    /// Records one event as a single JSONL line.
    pub fn record(&self, event: Event) {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst);
        let envelope = EventEnvelope { sequence, event };
        if let Ok(mut writer) = self.writer.lock() {
            if let Ok(line) = serde_json::to_string(&envelope) {
                let _ = writeln!(writer, "{line}");
                let _ = writer.flush();
            }
        }
    }

    /// Number of events recorded so far.
    #[must_use]
    pub fn recorded(&self) -> u64 {
        self.sequence.load(Ordering::Relaxed)
    }

    /// Flushes the underlying writer; call before process teardown.
    pub fn flush(&self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}
