//! Comptroller - Reward Distribution for the Union credit ledger
//!
//! Stakers earn UNION in proportion to their effective stake (stake not
//! frozen behind overdue borrowers), boosted by how much of it is lent out
//! through vouches.
//!
//! ## Key Features
//!
//! - **Lazy accrual**: a global index grows by `rate * elapsed / total_effective`;
//!   each user keeps the index they were last settled at
//! - **Decay**: the rate falls as total effective stake grows (`decay`)
//! - **Multiplier**: `1x` plus the share of non-frozen stake that is locked
//! - **Shortfall-safe withdrawal**: pays what the comptroller holds and
//!   keeps the rest accrued
//!
//! Callers settle a user with `update_user` before changing anything that
//! feeds the user's effective stake or multiplier.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

pub mod decay;

use union_common::{
    constants::{precision::WAD, rewards::MEMBER_RATIO},
    math::{mul_div, safe_add, wad_mul},
    types::Address,
    BTreeMap, ProtocolConfig, UnionError, UnionResult,
};

// ============ Types ============

/// Stake figures of one account at the moment of settlement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StakeSnapshot {
    pub stake: u128,
    pub locked: u128,
    pub frozen: u128,
}

impl StakeSnapshot {
    /// Stake that earns rewards
    pub fn effective(&self) -> u128 {
        self.stake.saturating_sub(self.frozen)
    }

    /// `1x` plus `(locked - frozen) / (stake - frozen)`, WAD scaled
    pub fn multiplier(&self) -> UnionResult<u128> {
        if self.stake <= self.frozen || self.locked <= self.frozen {
            return Ok(MEMBER_RATIO);
        }
        let bonus = mul_div(self.locked - self.frozen, WAD, self.stake - self.frozen)?;
        safe_add(MEMBER_RATIO, bonus)
    }
}

/// Reward bookkeeping of one account
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct UserRewards {
    /// Settled, unwithdrawn rewards
    pub accrued: u128,
    /// Global index at the last settlement
    pub index_snapshot: u128,
}

/// Outcome of a reward withdrawal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewardPayout {
    pub paid: u128,
    pub retained: u128,
}

// ============ Comptroller State ============

/// Global reward state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct ComptrollerState {
    /// Cumulative rewards per unit of effective stake, WAD scaled
    pub inflation_index: u128,
    /// Unit of the last index update
    pub last_updated: u64,
    /// Per-account bookkeeping
    pub users: BTreeMap<Address, UserRewards>,
}

impl ComptrollerState {
    /// Start distributing at `now`
    pub fn new(now: u64) -> Self {
        Self {
            inflation_index: WAD,
            last_updated: now,
            users: BTreeMap::new(),
        }
    }

    /// Current reward rate per unit
    pub fn inflation_per_unit(config: &ProtocolConfig, total_effective: u128) -> UnionResult<u128> {
        decay::inflation_per_unit(
            config.decay_model,
            config.max_inflation_per_block,
            config.half_decay_point,
            total_effective,
        )
    }

    fn index_at(&self, config: &ProtocolConfig, now: u64, total_effective: u128) -> UnionResult<u128> {
        if now <= self.last_updated || total_effective == 0 {
            return Ok(self.inflation_index);
        }
        let elapsed = (now - self.last_updated) as u128;
        let emitted = Self::inflation_per_unit(config, total_effective)?
            .checked_mul(elapsed)
            .ok_or(UnionError::Overflow)?;
        safe_add(self.inflation_index, mul_div(emitted, WAD, total_effective)?)
    }

    /// Advance the global index to `now` using the total before any change
    pub fn update_global(&mut self, config: &ProtocolConfig, now: u64, total_effective: u128) -> UnionResult<()> {
        if now <= self.last_updated {
            return Ok(());
        }
        self.inflation_index = self.index_at(config, now, total_effective)?;
        self.last_updated = now;
        Ok(())
    }

    fn pending(user: &UserRewards, index: u128, snapshot: &StakeSnapshot) -> UnionResult<u128> {
        // Accounts never settled start at the current index
        if user.index_snapshot == 0 {
            return Ok(0);
        }
        let delta = index.saturating_sub(user.index_snapshot);
        let base = mul_div(snapshot.effective(), delta, WAD)?;
        wad_mul(base, snapshot.multiplier()?)
    }

    /// Settle `account`'s pending rewards into `accrued`
    pub fn update_user(
        &mut self,
        config: &ProtocolConfig,
        account: &Address,
        snapshot: &StakeSnapshot,
        now: u64,
        total_effective: u128,
    ) -> UnionResult<u128> {
        self.update_global(config, now, total_effective)?;
        let index = self.inflation_index;

        let user = self.users.entry(*account).or_default();
        let pending = Self::pending(user, index, snapshot)?;
        user.accrued = safe_add(user.accrued, pending)?;
        user.index_snapshot = index;
        Ok(user.accrued)
    }

    /// Accrued plus pending rewards, without mutating
    pub fn calculate_rewards(
        &self,
        config: &ProtocolConfig,
        account: &Address,
        snapshot: &StakeSnapshot,
        now: u64,
        total_effective: u128,
    ) -> UnionResult<u128> {
        let index = self.index_at(config, now, total_effective)?;
        match self.users.get(account) {
            Some(user) => safe_add(user.accrued, Self::pending(user, index, snapshot)?),
            None => Ok(0),
        }
    }

    /// Pay out up to `available` of the settled rewards
    ///
    /// Call `update_user` first; the unpaid remainder stays accrued.
    pub fn withdraw_rewards(&mut self, account: &Address, available: u128) -> RewardPayout {
        let user = self.users.entry(*account).or_default();
        let paid = user.accrued.min(available);
        user.accrued -= paid;
        RewardPayout {
            paid,
            retained: user.accrued,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use union_common::{constants::token::ONE, DecayModel};

    fn alice() -> [u8; 32] {
        [1u8; 32]
    }

    fn bob() -> [u8; 32] {
        [2u8; 32]
    }

    /// Flat 1 UNION per unit at any stake level
    fn config() -> ProtocolConfig {
        ProtocolConfig {
            max_inflation_per_block: ONE,
            half_decay_point: u128::MAX / 2,
            decay_model: DecayModel::HalfLife,
            ..ProtocolConfig::default()
        }
    }

    fn staked(amount: u128) -> StakeSnapshot {
        StakeSnapshot {
            stake: amount,
            locked: 0,
            frozen: 0,
        }
    }

    #[test]
    fn test_multiplier() {
        assert_eq!(staked(100).multiplier().unwrap(), WAD);

        let half_locked = StakeSnapshot { stake: 100, locked: 50, frozen: 0 };
        assert_eq!(half_locked.multiplier().unwrap(), WAD + WAD / 2);

        let fully_locked = StakeSnapshot { stake: 100, locked: 100, frozen: 0 };
        assert_eq!(fully_locked.multiplier().unwrap(), 2 * WAD);

        // Frozen stake counts neither as stake nor as lent out
        let frozen = StakeSnapshot { stake: 100, locked: 60, frozen: 20 };
        assert_eq!(frozen.multiplier().unwrap(), WAD + WAD / 2);
        assert_eq!(frozen.effective(), 80);

        let all_frozen = StakeSnapshot { stake: 100, locked: 100, frozen: 100 };
        assert_eq!(all_frozen.multiplier().unwrap(), WAD);
    }

    #[test]
    fn test_single_staker_earns_full_emission() {
        let config = config();
        let mut comptroller = ComptrollerState::new(1);
        let snapshot = staked(100 * ONE);

        comptroller.update_user(&config, &alice(), &staked(0), 1, 0).unwrap();
        let viewed = comptroller
            .calculate_rewards(&config, &alice(), &snapshot, 11, 100 * ONE)
            .unwrap();
        let settled = comptroller
            .update_user(&config, &alice(), &snapshot, 11, 100 * ONE)
            .unwrap();

        assert_eq!(viewed, settled);
        // ~10 units at ~1 UNION each
        assert!(settled > 9 * ONE && settled <= 10 * ONE);
    }

    #[test]
    fn test_rewards_split_by_effective_stake() {
        let config = config();
        let mut comptroller = ComptrollerState::new(1);
        comptroller.update_user(&config, &alice(), &staked(0), 1, 0).unwrap();
        comptroller.update_user(&config, &bob(), &staked(0), 1, 0).unwrap();

        let total = 400 * ONE;
        let a = comptroller
            .update_user(&config, &alice(), &staked(300 * ONE), 101, total)
            .unwrap();
        let b = comptroller
            .update_user(&config, &bob(), &staked(100 * ONE), 101, total)
            .unwrap();

        assert_eq!(a, 3 * b);
    }

    #[test]
    fn test_no_stake_no_rewards() {
        let config = config();
        let mut comptroller = ComptrollerState::new(1);
        comptroller.update_user(&config, &alice(), &staked(0), 1, 0).unwrap();

        let accrued = comptroller
            .update_user(&config, &alice(), &staked(0), 500, 0)
            .unwrap();
        assert_eq!(accrued, 0);
        assert_eq!(comptroller.inflation_index, WAD);
    }

    #[test]
    fn test_withdraw_retains_shortfall() {
        let config = config();
        let mut comptroller = ComptrollerState::new(1);
        comptroller.update_user(&config, &alice(), &staked(0), 1, 0).unwrap();
        let accrued = comptroller
            .update_user(&config, &alice(), &staked(10 * ONE), 11, 10 * ONE)
            .unwrap();

        let payout = comptroller.withdraw_rewards(&alice(), ONE);
        assert_eq!(payout.paid, ONE);
        assert_eq!(payout.retained, accrued - ONE);

        let payout = comptroller.withdraw_rewards(&alice(), u128::MAX);
        assert_eq!(payout.paid, accrued - ONE);
        assert_eq!(payout.retained, 0);
    }

    #[test]
    fn test_multiplier_boosts_rewards() {
        let config = config();
        let mut comptroller = ComptrollerState::new(1);
        comptroller.update_user(&config, &alice(), &staked(0), 1, 0).unwrap();
        comptroller.update_user(&config, &bob(), &staked(0), 1, 0).unwrap();

        let total = 200 * ONE;
        let lent = StakeSnapshot { stake: 100 * ONE, locked: 100 * ONE, frozen: 0 };
        let a = comptroller.update_user(&config, &alice(), &lent, 51, total).unwrap();
        let b = comptroller
            .update_user(&config, &bob(), &staked(100 * ONE), 51, total)
            .unwrap();

        assert_eq!(a, 2 * b);
    }
}
