//! Territory service contract.
//!
//! Ownership of regions lives in an external service; the engine asks who
//! owns a region so it can index attacks by owning group and stamp
//! post-resolution cooldowns, and hands captured regions over through
//! [`TerritoryProvider::transfer`]. Eligibility rules (border-only, minimum
//! online counts, neutrality) remain the host's concern.

use crate::error::TerritoryError;
use crate::region::RegionId;

/// Ownership lookup and capture handover over the external territory store.
pub trait TerritoryProvider: Send + Sync {
    /// Returns the name of the group currently owning `region`, or `None`
    /// for unclaimed land.
    fn owner_of(&self, region: &RegionId) -> Option<String>;

    /// Hands ownership of `region` to `new_owner` after a capture.
    ///
    /// Called from the coordinator's won path only; failures there are
    /// logged and swallowed so cleanup still completes. The default
    /// implementation does nothing, for stores where captured land changes
    /// hands out of band.
    ///
    /// # Errors
    ///
    /// Returns [`TerritoryError`] when the store rejects the handover.
    fn transfer(&self, region: &RegionId, new_owner: &str) -> Result<(), TerritoryError> {
        let _ = (region, new_owner);
        Ok(())
    }
}

/// Territory provider for worlds with no claims at all.
///
/// Every region reads as unclaimed; group-indexed accessors come back empty.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnclaimedTerritory;

impl TerritoryProvider for UnclaimedTerritory {
    fn owner_of(&self, _region: &RegionId) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unclaimed_has_no_owner() {
        let t = UnclaimedTerritory;
        assert_eq!(t.owner_of(&RegionId::new("w", 0, 0)), None);
    }

    #[test]
    fn test_default_transfer_is_a_successful_noop() {
        let t = UnclaimedTerritory;
        assert!(t.transfer(&RegionId::new("w", 0, 0), "alice").is_ok());
        assert_eq!(t.owner_of(&RegionId::new("w", 0, 0)), None);
    }
}
