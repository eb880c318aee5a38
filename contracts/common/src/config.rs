//! Protocol Configuration
//!
//! Environment-specific parameters are loaded, never computed. A
//! `ProtocolConfig` must pass `validate()` before a protocol instance
//! accepts it, whether it came from `Default`, from code, or from CBOR.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::clock::TimeBasis;
use crate::constants::{borrowing, interest, membership, overdue, precision::WAD, rewards};
use crate::errors::{UnionError, UnionResult};

/// Shape of the reward decay curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum DecayModel {
    /// `max * h / (h + total)`: exactly half the max rate at the decay point
    #[default]
    HalfLife,
    /// Stepwise lookup by `total / h`
    StepTable,
}

/// Validated configuration of one protocol instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct ProtocolConfig {
    // ===== Membership =====
    /// Distinct backers required for registration
    pub effective_count: u32,
    /// Maximum incoming vouches per borrower
    pub max_vouchers: u32,
    /// Maximum outgoing vouches per staker
    pub max_vouchees: u32,
    /// Maximum stake per staker
    pub max_stake_amount: u128,
    /// UNION burned by `register_member`
    pub new_member_fee: u128,
    /// Enforce `effective_count` when registering
    pub enforce_effective_count_on_register: bool,
    /// Enforce `effective_count` when borrowing
    pub enforce_effective_count_on_borrow: bool,

    // ===== Debt =====
    /// Origination fee, WAD scaled
    pub origination_fee: u128,
    /// Upper bound for `origination_fee`, WAD scaled
    pub origination_fee_max: u128,
    /// Global cap on total borrows
    pub debt_ceiling: u128,
    /// Per-borrower cap
    pub max_borrow: u128,
    /// Per-draw minimum
    pub min_borrow: u128,
    /// Interest per time unit, WAD scaled
    pub interest_rate_per_unit: u128,
    /// Share of realized interest kept as reserves, WAD scaled
    pub reserve_factor: u128,
    /// uToken exchange rate while supply is zero, WAD scaled
    pub initial_exchange_rate: u128,

    // ===== Overdue =====
    /// Units since last repayment before debt is overdue
    pub overdue_blocks: u64,
    /// Extra units before third parties may write off
    pub max_overdue_blocks: u64,
    /// Whether the windows count blocks or seconds
    pub time_basis: TimeBasis,

    // ===== Rewards =====
    /// Effective total stake at which rewards decay to half
    pub half_decay_point: u128,
    /// Reward rate with no stake
    pub max_inflation_per_block: u128,
    /// Curve used between zero and infinity
    pub decay_model: DecayModel,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            effective_count: membership::EFFECTIVE_COUNT,
            max_vouchers: membership::MAX_VOUCHERS,
            max_vouchees: membership::MAX_VOUCHEES,
            max_stake_amount: membership::MAX_STAKE_AMOUNT,
            new_member_fee: membership::NEW_MEMBER_FEE,
            enforce_effective_count_on_register: true,
            enforce_effective_count_on_borrow: false,
            origination_fee: borrowing::ORIGINATION_FEE,
            origination_fee_max: borrowing::ORIGINATION_FEE_MAX,
            debt_ceiling: borrowing::DEBT_CEILING,
            max_borrow: borrowing::MAX_BORROW,
            min_borrow: borrowing::MIN_BORROW,
            interest_rate_per_unit: interest::INTEREST_RATE_PER_UNIT,
            reserve_factor: interest::RESERVE_FACTOR,
            initial_exchange_rate: interest::INITIAL_EXCHANGE_RATE,
            overdue_blocks: overdue::OVERDUE_BLOCKS,
            max_overdue_blocks: overdue::MAX_OVERDUE_BLOCKS,
            time_basis: TimeBasis::Blocks,
            half_decay_point: rewards::HALF_DECAY_POINT,
            max_inflation_per_block: rewards::MAX_INFLATION_PER_BLOCK,
            decay_model: DecayModel::HalfLife,
        }
    }
}

impl ProtocolConfig {
    /// Check internal consistency
    pub fn validate(&self) -> UnionResult<()> {
        if self.min_borrow > self.max_borrow {
            return Err(UnionError::InvalidParameter {
                param: "min_borrow",
                reason: "must not exceed max_borrow",
            });
        }
        if self.origination_fee_max > WAD {
            return Err(UnionError::InvalidParameter {
                param: "origination_fee_max",
                reason: "must not exceed 100%",
            });
        }
        if self.origination_fee > self.origination_fee_max {
            return Err(UnionError::InvalidParameter {
                param: "origination_fee",
                reason: "must not exceed origination_fee_max",
            });
        }
        if self.reserve_factor > WAD {
            return Err(UnionError::InvalidParameter {
                param: "reserve_factor",
                reason: "must not exceed 100%",
            });
        }
        if self.initial_exchange_rate == 0 {
            return Err(UnionError::InvalidParameter {
                param: "initial_exchange_rate",
                reason: "must be positive",
            });
        }
        if self.half_decay_point == 0 {
            return Err(UnionError::InvalidParameter {
                param: "half_decay_point",
                reason: "must be positive",
            });
        }
        if self.max_vouchers == 0 || self.max_vouchees == 0 {
            return Err(UnionError::InvalidParameter {
                param: "max_vouchers",
                reason: "trust graph limits must be positive",
            });
        }
        Ok(())
    }

    /// Decode a CBOR document and validate it
    #[cfg(feature = "std")]
    pub fn from_cbor(bytes: &[u8]) -> UnionResult<Self> {
        let config: Self = ciborium::from_reader(bytes).map_err(|_| UnionError::InvalidParameter {
            param: "config",
            reason: "malformed CBOR document",
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Encode as CBOR
    #[cfg(feature = "std")]
    pub fn to_cbor(&self) -> UnionResult<crate::Vec<u8>> {
        let mut out = crate::Vec::new();
        ciborium::into_writer(self, &mut out).map_err(|_| UnionError::InvalidParameter {
            param: "config",
            reason: "failed to encode CBOR document",
        })?;
        Ok(out)
    }
}
