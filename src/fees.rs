//! Fee and fine assessment.
//!
//! Decides, before an attack is allowed to start, whether the attacker can
//! afford the flat flag cost plus the worst additional liability their
//! currently active attacks could produce: either every attack is defended
//! against them, or every attack succeeds but capture fines (negative
//! rewards) come due. Amounts are computed here and nowhere else; the
//! ledger is never touched.
//!
//! The worst case is evaluated against the *current* active-attack count at
//! decision time, not a simulation of interleaved future resolutions. That
//! approximation is inherited behavior and is kept as-is.

use std::fmt;

use serde::Serialize;

use crate::config::EconomyConfig;

/// Which exposure branch dominates the worst case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskCategory {
    /// Every active attack is defended and the defended reward comes due.
    DefendedAttacks,
    /// Every active attack wins but rebuilding fines come due.
    Rebuilding,
}

impl RiskCategory {
    /// Human-readable label used in insufficient-funds messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::DefendedAttacks => "defended attack(s)",
            Self::Rebuilding => "rebuilding",
        }
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of a fee assessment.
#[derive(Debug, Clone, Serialize)]
pub struct FeeAssessment {
    /// Whether the balance covers the flat flag cost alone.
    pub can_afford_flag: bool,
    /// Worst additional liability across all attacks if they all resolve
    /// unfavorably, including the one being assessed.
    pub worst_case: f64,
    /// Which branch produced `worst_case`.
    pub dominant_risk: RiskCategory,
    /// Flag cost plus worst case.
    pub required: f64,
    /// Whether the balance covers `required`.
    pub can_afford_worst_case: bool,
}

impl FeeAssessment {
    /// `true` when the attack may proceed.
    #[must_use]
    pub fn approved(&self) -> bool {
        self.can_afford_flag && self.can_afford_worst_case
    }
}

/// Converts a configured reward into a fine: negative rewards are costs.
fn fine_of(reward: f64) -> f64 {
    if reward < 0.0 { -reward } else { 0.0 }
}

/// Assesses affordability for one more attack.
///
/// `active_count` is the attacker's number of already-active attacks;
/// `is_home_region` selects the home-block fine schedule for the new attack.
#[must_use]
pub fn assess(
    balance: f64,
    active_count: usize,
    is_home_region: bool,
    economy: &EconomyConfig,
) -> FeeAssessment {
    #[allow(clippy::cast_precision_loss)]
    let active = active_count as f64;

    let defended_exposure = economy.defended_reward.max(0.0) * (active + 1.0);

    let home_fine = fine_of(economy.captured_home_region_reward);
    let region_fine = fine_of(economy.captured_region_reward);
    let rebuild_exposure = if is_home_region {
        home_fine + active * region_fine
    } else {
        (active + 1.0) * region_fine
    };

    let (worst_case, dominant_risk) = if defended_exposure >= rebuild_exposure {
        (defended_exposure, RiskCategory::DefendedAttacks)
    } else {
        (rebuild_exposure, RiskCategory::Rebuilding)
    };

    let required = economy.flag_cost + worst_case;
    FeeAssessment {
        can_afford_flag: balance >= economy.flag_cost,
        worst_case,
        dominant_risk,
        required,
        can_afford_worst_case: balance >= required,
    }
}
