//! Central error taxonomy.
//!
//! Expected contention (duplicate registration, quota, insufficient funds)
//! is surfaced as typed `Err` values for the caller to translate into
//! user-facing messages. Collaborator failures during resolution are logged
//! and swallowed so registry cleanup always completes; they never escape the
//! scheduler lane.

use thiserror::Error;

use crate::region::RegionId;

/// Why an attack registration was rejected.
///
/// These are recoverable outcomes, not defects: the caller cancels the
/// originating action and messages the actor.
#[derive(Debug, Error)]
pub enum RegisterError {
    /// Attacks are disabled by configuration.
    #[error("attacks are currently disabled")]
    AttacksDisabled,

    /// The region already has an active attack.
    #[error("region {region} is already under attack by {holder}")]
    AlreadyInProgress {
        /// The contested region.
        region: RegionId,
        /// Name of the actor holding the existing attack.
        holder: String,
    },

    /// The attacker reached the simultaneous-attack quota.
    #[error("active attack quota of {quota} reached")]
    QuotaExceeded {
        /// The configured per-actor quota.
        quota: usize,
    },
}

/// A configuration file failed to load or validate.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document could not be parsed as YAML.
    #[error("config parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// The document parsed but violates a structural rule.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// The external renderer rejected a paint, clear, or countdown operation.
///
/// Render failures during teardown are logged and skipped so the cleanup
/// sweep still visits every owned position.
#[derive(Debug, Error)]
#[error("render failure at {context}: {message}")]
pub struct RenderError {
    /// Short description of the operation that failed.
    pub context: String,
    /// Backend-provided detail.
    pub message: String,
}

impl RenderError {
    /// Creates a render error for the given operation.
    #[must_use]
    pub fn new(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            message: message.into(),
        }
    }
}

/// The external territory store rejected an ownership transfer.
///
/// Transfer failures on the won path are logged and swallowed like ledger
/// failures; the capture still resolves and the host reconciles the store.
#[derive(Debug, Error)]
#[error("ownership transfer failed for {region}: {message}")]
pub struct TerritoryError {
    /// The region whose handover failed.
    pub region: RegionId,
    /// Backend-provided detail.
    pub message: String,
}

impl TerritoryError {
    /// Creates a transfer error for the given region.
    #[must_use]
    pub fn new(region: RegionId, message: impl Into<String>) -> Self {
        Self {
            region,
            message: message.into(),
        }
    }
}

/// The external ledger rejected a monetary operation.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The paying account cannot cover the amount.
    #[error("insufficient funds: {account} cannot pay {amount}")]
    Insufficient {
        /// Account that failed to pay.
        account: String,
        /// Amount requested.
        amount: f64,
    },

    /// The economy backend failed for an unrelated reason.
    #[error("ledger backend failure: {0}")]
    Backend(String),
}
