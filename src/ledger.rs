//! Economy ledger contract.
//!
//! The engine computes amounts and reasons (see [`crate::fees`]) but never
//! stores currency. All balance mutation goes through this trait; failures
//! during resolution are logged and swallowed so cleanup still completes.

use crate::error::LedgerError;

/// Result type alias for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Narrow interface onto the host's economy.
pub trait Ledger: Send + Sync {
    /// Withdraws `amount` from `account`, recording `reason`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Insufficient`] when the account cannot cover
    /// the amount, or [`LedgerError::Backend`] on backend failure.
    fn withdraw(&self, account: &str, amount: f64, reason: &str) -> Result<()>;

    /// Transfers `amount` from `payer` to `payee`, recording `reason`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Insufficient`] when the payer cannot cover
    /// the amount, or [`LedgerError::Backend`] on backend failure.
    fn pay(&self, payer: &str, amount: f64, payee: &str, reason: &str) -> Result<()>;

    /// Deposits `amount` into `account`, recording `reason`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Backend`] on backend failure.
    fn deposit(&self, account: &str, amount: f64, reason: &str) -> Result<()>;
}

/// Ledger for hosts running without an economy: every operation succeeds
/// and moves nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLedger;

impl Ledger for NullLedger {
    fn withdraw(&self, _account: &str, _amount: f64, _reason: &str) -> Result<()> {
        Ok(())
    }

    fn pay(&self, _payer: &str, _amount: f64, _payee: &str, _reason: &str) -> Result<()> {
        Ok(())
    }

    fn deposit(&self, _account: &str, _amount: f64, _reason: &str) -> Result<()> {
        Ok(())
    }
}
