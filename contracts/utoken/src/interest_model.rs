//! Interest Rate Models
//!
//! Borrow rates are quoted per time unit (block or second, following the
//! protocol's `TimeBasis`) and WAD scaled. The default is a fixed rate; a
//! kinked utilization curve is available for deployments that want rates to
//! respond to demand.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use union_common::{
    constants::{interest::BORROW_RATE_MAX_PER_UNIT, precision::WAD},
    math::{mul_div, wad_mul},
    UnionError, UnionResult,
};

/// Borrow rate as a function of pool utilization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum InterestRateModel {
    /// Constant rate per unit
    Fixed { rate_per_unit: u128 },
    /// Linear up to `kink` utilization, steeper above it
    Jump {
        base_rate_per_unit: u128,
        multiplier_per_unit: u128,
        jump_multiplier_per_unit: u128,
        /// Utilization where the jump starts, WAD scaled
        kink: u128,
    },
}

impl InterestRateModel {
    /// Fixed-rate model
    pub fn fixed(rate_per_unit: u128) -> Self {
        Self::Fixed { rate_per_unit }
    }

    /// Reject models that can exceed the rate cap
    pub fn validate(&self) -> UnionResult<()> {
        if let Self::Jump { kink, .. } = self {
            if *kink > WAD {
                return Err(UnionError::InvalidParameter {
                    param: "kink",
                    reason: "must not exceed 100% utilization",
                });
            }
        }
        // Rates are non-decreasing in utilization, so full utilization is the worst case
        let peak = self.rate_at_utilization(WAD)?;
        if peak > BORROW_RATE_MAX_PER_UNIT {
            return Err(UnionError::InvalidParameter {
                param: "interest_rate",
                reason: "borrow rate above the protocol maximum",
            });
        }
        Ok(())
    }

    /// Rate at zero utilization, reported in parameter events
    pub fn base_rate(&self) -> u128 {
        match self {
            Self::Fixed { rate_per_unit } => *rate_per_unit,
            Self::Jump { base_rate_per_unit, .. } => *base_rate_per_unit,
        }
    }

    /// `borrows / (cash + borrows - reserves)`, WAD scaled
    pub fn utilization(cash: u128, borrows: u128, reserves: u128) -> UnionResult<u128> {
        if borrows == 0 {
            return Ok(0);
        }
        let denominator = cash.saturating_add(borrows).saturating_sub(reserves);
        if denominator == 0 {
            return Ok(0);
        }
        Ok(mul_div(borrows, WAD, denominator)?.min(WAD))
    }

    /// Borrow rate per unit for the given pool state
    pub fn borrow_rate(&self, cash: u128, borrows: u128, reserves: u128) -> UnionResult<u128> {
        match self {
            Self::Fixed { rate_per_unit } => Ok(*rate_per_unit),
            Self::Jump { .. } => self.rate_at_utilization(Self::utilization(cash, borrows, reserves)?),
        }
    }

    /// Rate earned by lenders per unit, after the reserve cut
    pub fn supply_rate(
        &self,
        cash: u128,
        borrows: u128,
        reserves: u128,
        reserve_factor: u128,
    ) -> UnionResult<u128> {
        let borrow_rate = self.borrow_rate(cash, borrows, reserves)?;
        let rate_to_pool = wad_mul(borrow_rate, WAD.saturating_sub(reserve_factor))?;
        wad_mul(Self::utilization(cash, borrows, reserves)?, rate_to_pool)
    }

    fn rate_at_utilization(&self, util: u128) -> UnionResult<u128> {
        match *self {
            Self::Fixed { rate_per_unit } => Ok(rate_per_unit),
            Self::Jump {
                base_rate_per_unit,
                multiplier_per_unit,
                jump_multiplier_per_unit,
                kink,
            } => {
                if util <= kink {
                    Ok(base_rate_per_unit.saturating_add(wad_mul(util, multiplier_per_unit)?))
                } else {
                    let normal = base_rate_per_unit.saturating_add(wad_mul(kink, multiplier_per_unit)?);
                    Ok(normal.saturating_add(wad_mul(util - kink, jump_multiplier_per_unit)?))
                }
            }
        }
    }
}
