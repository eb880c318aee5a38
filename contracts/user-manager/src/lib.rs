//! User Manager - Membership, Stake and Trust for the Union credit ledger
//!
//! Members stake underlying and vouch for borrowers. A borrower's credit
//! limit is the sum of what each backer can still lock for them, and every
//! unit of debt is backed by exactly one unit of locked stake.
//!
//! ## Core Operations
//!
//! - **stake / unstake**: move unlocked stake in and out
//! - **update_trust / cancel_vouch**: maintain the trust graph
//! - **add_member / register_member**: admit new members
//! - **update_locked**: lock or unlock stake against a borrower's principal
//! - **debt_write_off**: convert locked stake into a realized loss
//!
//! Token movements, events and authorization of administrative calls are
//! handled by the composing protocol; this crate owns the bookkeeping.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

pub mod trust_graph;

use union_common::{
    constants::membership::MAX_TRUST_AMOUNT,
    math::{min3, safe_add, safe_sub},
    types::{require_address, Address},
    BTreeMap, ProtocolConfig, UnionError, UnionResult,
};

pub use trust_graph::{TrustGraph, Vouch, Vouchee};

// ============ User Manager State ============

/// Per-account stake ledger entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct Staker {
    /// Admitted as a member
    pub is_member: bool,
    /// Total stake
    pub stake: u128,
    /// Stake locked against borrowers
    pub locked: u128,
}

impl Staker {
    /// Stake not locked against anyone
    pub fn unlocked(&self) -> u128 {
        self.stake.saturating_sub(self.locked)
    }
}

/// Outcome of a staker-side write-off
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOffOutcome {
    /// Amount removed from stake and principal
    pub amount: u128,
    /// The vouch's lock reached zero and the edge was removed
    pub vouch_cancelled: bool,
}

/// Global state of the user manager
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct UserManagerState {
    /// Stake ledger keyed by account
    pub stakers: BTreeMap<Address, Staker>,
    /// Vouch edges
    pub graph: TrustGraph,
    /// Sum of every staker's stake
    pub total_staked: u128,
}

impl UserManagerState {
    /// Create an empty user manager
    pub fn new() -> Self {
        Self::default()
    }

    // ============ Views ============

    /// Ledger entry of an account (default when unknown)
    pub fn staker(&self, account: &Address) -> Staker {
        self.stakers.get(account).cloned().unwrap_or_default()
    }

    /// Whether the account is a member
    pub fn is_member(&self, account: &Address) -> bool {
        self.stakers.get(account).map(|s| s.is_member).unwrap_or(false)
    }

    /// Total stake of an account
    pub fn staker_balance(&self, account: &Address) -> u128 {
        self.stakers.get(account).map(|s| s.stake).unwrap_or(0)
    }

    /// Stake of `staker` locked for `borrower`
    pub fn locked_stake(&self, staker: &Address, borrower: &Address) -> u128 {
        self.graph.get(staker, borrower).map(|v| v.locked).unwrap_or(0)
    }

    /// Stake of `staker` locked across every borrower
    pub fn total_locked_stake(&self, staker: &Address) -> u128 {
        self.stakers.get(staker).map(|s| s.locked).unwrap_or(0)
    }

    /// Stake locked for `borrower` across every backer
    pub fn borrower_locked(&self, borrower: &Address) -> u128 {
        self.graph
            .vouchers_of(borrower)
            .iter()
            .fold(0u128, |acc, v| acc.saturating_add(v.locked))
    }

    /// Vouch edge lookup
    pub fn get_vouch(&self, staker: &Address, borrower: &Address) -> Option<&Vouch> {
        self.graph.get(staker, borrower)
    }

    /// Incoming vouches of a borrower, in lock order
    pub fn vouchers_of(&self, borrower: &Address) -> &[Vouch] {
        self.graph.vouchers_of(borrower)
    }

    /// Outgoing vouches of a staker
    pub fn vouchees_of(&self, staker: &Address) -> &[Vouchee] {
        self.graph.vouchees_of(staker)
    }

    /// Amount each backer can still lock for `borrower`, summed
    ///
    /// Per edge: `min(trust - locked, staker.stake - staker.locked)`.
    pub fn credit_limit(&self, borrower: &Address) -> u128 {
        self.graph
            .vouchers_of(borrower)
            .iter()
            .map(|vouch| {
                let available_trust = vouch.trust.saturating_sub(vouch.locked);
                available_trust.min(self.staker(&vouch.staker).unlocked())
            })
            .fold(0u128, |acc, x| acc.saturating_add(x))
    }

    /// Distinct backers whose `min(trust, stake still usable by this edge)` is positive
    pub fn effective_backers(&self, borrower: &Address) -> u32 {
        let count = self
            .graph
            .vouchers_of(borrower)
            .iter()
            .filter(|vouch| {
                let usable = self.staker(&vouch.staker).unlocked().saturating_add(vouch.locked);
                vouch.trust.min(usable) > 0
            })
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    /// Locked stake of `staker` backing borrowers for which `is_overdue` holds
    pub fn total_frozen<F>(&self, staker: &Address, is_overdue: F) -> u128
    where
        F: Fn(&Address) -> bool,
    {
        self.graph
            .vouchees_of(staker)
            .iter()
            .filter(|v| is_overdue(&v.borrower))
            .map(|v| self.locked_stake(staker, &v.borrower))
            .fold(0u128, |acc, x| acc.saturating_add(x))
    }

    /// Locked stake backing overdue borrowers, across all stakers
    pub fn global_frozen<F>(&self, is_overdue: F) -> u128
    where
        F: Fn(&Address) -> bool,
    {
        self.graph
            .edges()
            .filter(|(_, borrower, _)| is_overdue(borrower))
            .fold(0u128, |acc, (_, _, vouch)| acc.saturating_add(vouch.locked))
    }

    // ============ Membership ============

    /// Admit a member directly (authorization checked by the caller)
    pub fn add_member(&mut self, member: Address) -> UnionResult<()> {
        require_address(&member)?;
        if self.is_member(&member) {
            return Err(UnionError::NoExistingMember { member });
        }
        self.stakers.entry(member).or_default().is_member = true;
        Ok(())
    }

    /// Admit a member backed by enough effective stakers
    ///
    /// The registration fee is charged by the caller once this succeeds.
    pub fn register_member(&mut self, config: &ProtocolConfig, new_member: Address) -> UnionResult<()> {
        require_address(&new_member)?;
        if self.is_member(&new_member) {
            return Err(UnionError::NoExistingMember { member: new_member });
        }

        if config.enforce_effective_count_on_register {
            let found = self.effective_backers(&new_member);
            if found < config.effective_count {
                return Err(UnionError::NotEnoughStakers {
                    found,
                    required: config.effective_count,
                });
            }
        }

        self.stakers.entry(new_member).or_default().is_member = true;
        Ok(())
    }

    // ============ Stake Ledger ============

    /// Add to a member's stake
    pub fn stake(&mut self, config: &ProtocolConfig, staker: Address, amount: u128) -> UnionResult<()> {
        if amount == 0 {
            return Err(UnionError::AmountZero);
        }
        if !self.is_member(&staker) {
            return Err(UnionError::CallerNotMember { caller: staker });
        }

        let entry = self.stakers.entry(staker).or_default();
        let new_stake = safe_add(entry.stake, amount)?;
        if new_stake > config.max_stake_amount {
            return Err(UnionError::StakeLimitReached {
                requested: new_stake,
                maximum: config.max_stake_amount,
            });
        }
        let new_total = safe_add(self.total_staked, amount)?;

        entry.stake = new_stake;
        self.total_staked = new_total;
        Ok(())
    }

    /// Withdraw unlocked stake
    pub fn unstake(&mut self, staker: Address, amount: u128) -> UnionResult<()> {
        if amount == 0 {
            return Err(UnionError::AmountZero);
        }

        let available = self.staker(&staker).unlocked();
        if amount > available {
            return Err(UnionError::InsufficientBalance {
                available,
                requested: amount,
            });
        }

        let new_total = safe_sub(self.total_staked, amount)?;
        let entry = self.stakers.entry(staker).or_default();
        entry.stake -= amount;
        self.total_staked = new_total;
        Ok(())
    }

    // ============ Trust Graph ============

    /// Create a vouch or change its trust
    ///
    /// Returns `true` when a new edge was created.
    pub fn update_trust(
        &mut self,
        config: &ProtocolConfig,
        staker: Address,
        borrower: Address,
        trust: u128,
        block: u64,
    ) -> UnionResult<bool> {
        // 1. Only members vouch
        if !self.is_member(&staker) {
            return Err(UnionError::AuthFailed { caller: staker });
        }
        require_address(&borrower)?;

        // 2. Shape of the edge
        if borrower == staker {
            return Err(UnionError::ErrorSelfVouching);
        }
        if trust > MAX_TRUST_AMOUNT {
            return Err(UnionError::TrustAmountTooLarge {
                trust,
                maximum: MAX_TRUST_AMOUNT,
            });
        }

        // 3. Existing edge: trust may not drop below what is locked
        if let Some(vouch) = self.graph.get_mut(&staker, &borrower) {
            if trust < vouch.locked {
                return Err(UnionError::TrustAmountLtLocked {
                    trust,
                    locked: vouch.locked,
                });
            }
            vouch.trust = trust;
            vouch.last_updated = block;
            return Ok(false);
        }

        // 4. New edge: both ends must have room
        if self.graph.voucher_count(&borrower) >= config.max_vouchers as usize {
            return Err(UnionError::MaxTrustLimitReached {
                limit: config.max_vouchers,
            });
        }
        if self.graph.vouchee_count(&staker) >= config.max_vouchees as usize {
            return Err(UnionError::MaxTrustLimitReached {
                limit: config.max_vouchees,
            });
        }

        self.graph.insert(staker, borrower, trust, block)?;
        Ok(true)
    }

    /// Remove a vouch with nothing locked; either end may cancel
    pub fn cancel_vouch(&mut self, caller: Address, staker: Address, borrower: Address) -> UnionResult<()> {
        if caller != staker && caller != borrower {
            return Err(UnionError::AuthFailed { caller });
        }

        let vouch = self
            .graph
            .get(&staker, &borrower)
            .ok_or(UnionError::VouchNotFound { staker, borrower })?;
        if vouch.locked != 0 {
            return Err(UnionError::LockedStakeNonZero { locked: vouch.locked });
        }

        self.graph.remove(&staker, &borrower)?;
        Ok(())
    }

    // ============ Lock / Unlock ============

    /// Lock (`lock = true`) or unlock stake for `borrower`, first voucher first
    ///
    /// Fails with `LockedRemaining` before touching anything when the
    /// backers cannot cover `amount`.
    pub fn update_locked(&mut self, borrower: &Address, amount: u128, lock: bool, block: u64) -> UnionResult<()> {
        if amount == 0 {
            return Ok(());
        }

        let capacity = if lock {
            self.credit_limit(borrower)
        } else {
            self.borrower_locked(borrower)
        };
        if amount > capacity {
            return Err(UnionError::LockedRemaining {
                remaining: amount - capacity,
            });
        }

        let stakers = &mut self.stakers;
        let vouches = self
            .graph
            .vouchers_mut(borrower)
            .ok_or(UnionError::LockedRemaining { remaining: amount })?;

        let mut remaining = amount;
        for vouch in vouches.iter_mut() {
            if remaining == 0 {
                break;
            }
            let staker = stakers.entry(vouch.staker).or_default();

            let delta = if lock {
                min3(
                    remaining,
                    vouch.trust.saturating_sub(vouch.locked),
                    staker.unlocked(),
                )
            } else {
                remaining.min(vouch.locked)
            };
            if delta == 0 {
                continue;
            }

            if lock {
                vouch.locked = safe_add(vouch.locked, delta)?;
                staker.locked = safe_add(staker.locked, delta)?;
            } else {
                vouch.locked = safe_sub(vouch.locked, delta)?;
                staker.locked = safe_sub(staker.locked, delta)?;
            }
            vouch.last_updated = block;
            remaining -= delta;
        }

        if remaining > 0 {
            return Err(UnionError::LockedRemaining { remaining });
        }
        Ok(())
    }

    // ============ Write-off ============

    /// Burn `amount` of `staker`'s stake locked for `borrower`
    ///
    /// `third_party_allowed` tells whether a caller other than the staker
    /// may act (the borrower is past the write-off window). Reducing the
    /// borrower's principal is left to the debt ledger.
    pub fn debt_write_off(
        &mut self,
        caller: Address,
        staker: Address,
        borrower: Address,
        amount: u128,
        third_party_allowed: bool,
    ) -> UnionResult<WriteOffOutcome> {
        // 1. Validate amount against the edge
        if amount == 0 {
            return Err(UnionError::AmountZero);
        }
        let locked = self
            .graph
            .get(&staker, &borrower)
            .map(|v| v.locked)
            .ok_or(UnionError::VouchNotFound { staker, borrower })?;
        if amount > locked {
            return Err(UnionError::ExceedsLocked {
                requested: amount,
                locked,
            });
        }

        // 2. Authorization
        if caller != staker && !third_party_allowed {
            return Err(UnionError::AuthFailed { caller });
        }

        // 3. Compute new totals
        if amount > self.total_staked {
            return Err(UnionError::ExceedsTotalStaked {
                requested: amount,
                total: self.total_staked,
            });
        }
        let entry = self.staker(&staker);
        let new_stake = safe_sub(entry.stake, amount)?;
        let new_staker_locked = safe_sub(entry.locked, amount)?;

        // 4. Apply
        self.total_staked -= amount;
        if let Some(s) = self.stakers.get_mut(&staker) {
            s.stake = new_stake;
            s.locked = new_staker_locked;
        }
        let mut vouch_cancelled = false;
        if let Some(vouch) = self.graph.get_mut(&staker, &borrower) {
            vouch.locked -= amount;
            if vouch.locked == 0 {
                vouch_cancelled = true;
            }
        }
        if vouch_cancelled {
            self.graph.remove(&staker, &borrower)?;
        }

        Ok(WriteOffOutcome {
            amount,
            vouch_cancelled,
        })
    }

    // ============ Integrity ============

    /// Verify the bookkeeping invariants of the stake ledger and trust graph
    pub fn check_invariants(&self) -> UnionResult<()> {
        self.graph.check_consistency()?;

        let mut total = 0u128;
        for (address, staker) in &self.stakers {
            total = safe_add(total, staker.stake)?;

            let locked_out = self
                .graph
                .vouchees_of(address)
                .iter()
                .map(|v| self.locked_stake(address, &v.borrower))
                .fold(0u128, |acc, x| acc.saturating_add(x));
            if locked_out != staker.locked || staker.locked > staker.stake {
                return Err(UnionError::InvalidParameter {
                    param: "locked",
                    reason: "staker lock does not match its vouches",
                });
            }
        }

        if total != self.total_staked {
            return Err(UnionError::InvalidParameter {
                param: "total_staked",
                reason: "does not match the sum of stakes",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use union_common::constants::token::ONE;

    fn staker_a() -> [u8; 32] {
        [1u8; 32]
    }

    fn staker_b() -> [u8; 32] {
        [2u8; 32]
    }

    fn staker_c() -> [u8; 32] {
        [3u8; 32]
    }

    fn borrower() -> [u8; 32] {
        [9u8; 32]
    }

    fn config() -> ProtocolConfig {
        ProtocolConfig {
            effective_count: 3,
            ..ProtocolConfig::default()
        }
    }

    /// Three members with 100 staked each, all trusting `borrower()` for 100
    fn backed_state() -> UserManagerState {
        let config = config();
        let mut state = UserManagerState::new();
        for s in [staker_a(), staker_b(), staker_c()] {
            state.add_member(s).unwrap();
            state.stake(&config, s, 100 * ONE).unwrap();
            state.update_trust(&config, s, borrower(), 100 * ONE, 1).unwrap();
        }
        state
    }

    #[test]
    fn test_stake_requires_membership() {
        let mut state = UserManagerState::new();
        assert_eq!(
            state.stake(&config(), staker_a(), ONE),
            Err(UnionError::CallerNotMember { caller: staker_a() })
        );
    }

    #[test]
    fn test_stake_limit() {
        let config = ProtocolConfig {
            max_stake_amount: 10 * ONE,
            ..config()
        };
        let mut state = UserManagerState::new();
        state.add_member(staker_a()).unwrap();
        state.stake(&config, staker_a(), 10 * ONE).unwrap();

        assert!(matches!(
            state.stake(&config, staker_a(), 1),
            Err(UnionError::StakeLimitReached { .. })
        ));
        assert_eq!(state.stake(&config, staker_a(), 0), Err(UnionError::AmountZero));
    }

    #[test]
    fn test_stake_unstake_round_trip() {
        let config = config();
        let mut state = UserManagerState::new();
        state.add_member(staker_a()).unwrap();

        state.stake(&config, staker_a(), 50 * ONE).unwrap();
        state.unstake(staker_a(), 50 * ONE).unwrap();

        assert_eq!(state.total_staked, 0);
        assert_eq!(state.staker_balance(&staker_a()), 0);
    }

    #[test]
    fn test_unstake_cannot_touch_locked() {
        let mut state = backed_state();
        state.update_locked(&borrower(), 150 * ONE, true, 2).unwrap();

        // staker_a is fully locked, staker_b half
        assert_eq!(state.total_locked_stake(&staker_a()), 100 * ONE);
        assert_eq!(
            state.unstake(staker_b(), 60 * ONE),
            Err(UnionError::InsufficientBalance {
                available: 50 * ONE,
                requested: 60 * ONE
            })
        );
    }

    #[test]
    fn test_add_member_twice() {
        let mut state = UserManagerState::new();
        state.add_member(staker_a()).unwrap();
        assert_eq!(
            state.add_member(staker_a()),
            Err(UnionError::NoExistingMember { member: staker_a() })
        );
        assert_eq!(state.add_member([0u8; 32]), Err(UnionError::AddressZero));
    }

    #[test]
    fn test_register_member_needs_backers() {
        let config = config();
        let mut state = backed_state();
        let newcomer = [7u8; 32];

        assert_eq!(
            state.register_member(&config, newcomer),
            Err(UnionError::NotEnoughStakers { found: 0, required: 3 })
        );

        state.register_member(&config, borrower()).unwrap();
        assert!(state.is_member(&borrower()));
        assert!(state.register_member(&config, borrower()).is_err());
    }

    #[test]
    fn test_register_without_enforcement() {
        let config = ProtocolConfig {
            enforce_effective_count_on_register: false,
            ..config()
        };
        let mut state = UserManagerState::new();
        state.register_member(&config, borrower()).unwrap();
        assert!(state.is_member(&borrower()));
    }

    #[test]
    fn test_zero_trust_is_not_effective() {
        let config = config();
        let mut state = backed_state();
        state.update_trust(&config, staker_c(), borrower(), 0, 2).unwrap();
        assert_eq!(state.effective_backers(&borrower()), 2);
    }

    #[test]
    fn test_update_trust_validation() {
        let config = config();
        let mut state = backed_state();

        assert_eq!(
            state.update_trust(&config, borrower(), staker_a(), ONE, 1),
            Err(UnionError::AuthFailed { caller: borrower() })
        );
        assert_eq!(
            state.update_trust(&config, staker_a(), staker_a(), ONE, 1),
            Err(UnionError::ErrorSelfVouching)
        );
        assert!(matches!(
            state.update_trust(&config, staker_a(), [8u8; 32], MAX_TRUST_AMOUNT + 1, 1),
            Err(UnionError::TrustAmountTooLarge { .. })
        ));

        state.update_locked(&borrower(), 100 * ONE, true, 2).unwrap();
        assert_eq!(
            state.update_trust(&config, staker_a(), borrower(), 10 * ONE, 3),
            Err(UnionError::TrustAmountLtLocked {
                trust: 10 * ONE,
                locked: 100 * ONE
            })
        );
    }

    #[test]
    fn test_update_trust_limits() {
        let config = ProtocolConfig {
            max_vouchers: 1,
            max_vouchees: 2,
            ..config()
        };
        let mut state = UserManagerState::new();
        state.add_member(staker_a()).unwrap();
        state.add_member(staker_b()).unwrap();

        assert!(state.update_trust(&config, staker_a(), borrower(), ONE, 1).unwrap());
        assert_eq!(
            state.update_trust(&config, staker_b(), borrower(), ONE, 1),
            Err(UnionError::MaxTrustLimitReached { limit: 1 })
        );

        // Updating an existing edge is not limited
        assert!(!state.update_trust(&config, staker_a(), borrower(), 2 * ONE, 2).unwrap());

        assert!(state.update_trust(&config, staker_a(), [7u8; 32], ONE, 1).unwrap());
        assert_eq!(
            state.update_trust(&config, staker_a(), [8u8; 32], ONE, 1),
            Err(UnionError::MaxTrustLimitReached { limit: 2 })
        );
    }

    #[test]
    fn test_credit_limit() {
        let config = config();
        let mut state = backed_state();
        assert_eq!(state.credit_limit(&borrower()), 300 * ONE);

        // Trust caps the contribution of staker_c
        state.update_trust(&config, staker_c(), borrower(), 40 * ONE, 2).unwrap();
        assert_eq!(state.credit_limit(&borrower()), 240 * ONE);

        // Lock reduces it one for one
        state.update_locked(&borrower(), 90 * ONE, true, 3).unwrap();
        assert_eq!(state.credit_limit(&borrower()), 150 * ONE);
    }

    #[test]
    fn test_credit_limit_shared_stake() {
        // One staker trusting two borrowers: locking for one shrinks the other
        let config = config();
        let mut state = UserManagerState::new();
        state.add_member(staker_a()).unwrap();
        state.stake(&config, staker_a(), 100 * ONE).unwrap();
        state.update_trust(&config, staker_a(), borrower(), 100 * ONE, 1).unwrap();
        state.update_trust(&config, staker_a(), [8u8; 32], 100 * ONE, 1).unwrap();

        state.update_locked(&borrower(), 70 * ONE, true, 2).unwrap();
        assert_eq!(state.credit_limit(&[8u8; 32]), 30 * ONE);
    }

    #[test]
    fn test_lock_order_first_in_first_locked() {
        let mut state = backed_state();
        state.update_locked(&borrower(), 150 * ONE, true, 2).unwrap();

        assert_eq!(state.locked_stake(&staker_a(), &borrower()), 100 * ONE);
        assert_eq!(state.locked_stake(&staker_b(), &borrower()), 50 * ONE);
        assert_eq!(state.locked_stake(&staker_c(), &borrower()), 0);

        state.update_locked(&borrower(), 120 * ONE, false, 3).unwrap();
        assert_eq!(state.locked_stake(&staker_a(), &borrower()), 0);
        assert_eq!(state.locked_stake(&staker_b(), &borrower()), 30 * ONE);
        assert_eq!(state.borrower_locked(&borrower()), 30 * ONE);
        state.check_invariants().unwrap();
    }

    #[test]
    fn test_lock_beyond_capacity_is_rejected_whole() {
        let mut state = backed_state();
        let before = state.clone();

        assert_eq!(
            state.update_locked(&borrower(), 301 * ONE, true, 2),
            Err(UnionError::LockedRemaining { remaining: ONE })
        );
        assert_eq!(state, before);

        assert_eq!(
            state.update_locked(&borrower(), 1, false, 2),
            Err(UnionError::LockedRemaining { remaining: 1 })
        );
    }

    #[test]
    fn test_cancel_vouch() {
        let mut state = backed_state();

        assert_eq!(
            state.cancel_vouch([8u8; 32], staker_a(), borrower()),
            Err(UnionError::AuthFailed { caller: [8u8; 32] })
        );

        state.update_locked(&borrower(), ONE, true, 2).unwrap();
        assert_eq!(
            state.cancel_vouch(staker_a(), staker_a(), borrower()),
            Err(UnionError::LockedStakeNonZero { locked: ONE })
        );

        // The borrower may cancel an unlocked edge
        state.cancel_vouch(borrower(), staker_b(), borrower()).unwrap();
        assert!(state.get_vouch(&staker_b(), &borrower()).is_none());
        state.check_invariants().unwrap();

        assert_eq!(
            state.cancel_vouch(staker_b(), staker_b(), borrower()),
            Err(UnionError::VouchNotFound { staker: staker_b(), borrower: borrower() })
        );
    }

    #[test]
    fn test_frozen() {
        let mut state = backed_state();
        state.update_locked(&borrower(), 150 * ONE, true, 2).unwrap();

        assert_eq!(state.total_frozen(&staker_a(), |_| false), 0);
        assert_eq!(state.total_frozen(&staker_a(), |b| *b == borrower()), 100 * ONE);
        assert_eq!(state.global_frozen(|b| *b == borrower()), 150 * ONE);
    }

    #[test]
    fn test_write_off_partial_and_full() {
        let mut state = backed_state();
        state.update_locked(&borrower(), 150 * ONE, true, 2).unwrap();

        let outcome = state
            .debt_write_off(staker_b(), staker_b(), borrower(), 20 * ONE, false)
            .unwrap();
        assert!(!outcome.vouch_cancelled);
        assert_eq!(state.staker_balance(&staker_b()), 80 * ONE);
        assert_eq!(state.locked_stake(&staker_b(), &borrower()), 30 * ONE);
        assert_eq!(state.total_staked, 280 * ONE);

        let outcome = state
            .debt_write_off(staker_b(), staker_b(), borrower(), 30 * ONE, false)
            .unwrap();
        assert!(outcome.vouch_cancelled);
        assert!(state.get_vouch(&staker_b(), &borrower()).is_none());
        state.check_invariants().unwrap();
    }

    #[test]
    fn test_write_off_authorization() {
        let mut state = backed_state();
        state.update_locked(&borrower(), 50 * ONE, true, 2).unwrap();
        let outsider = [8u8; 32];

        assert_eq!(
            state.debt_write_off(outsider, staker_a(), borrower(), ONE, false),
            Err(UnionError::AuthFailed { caller: outsider })
        );
        assert_eq!(
            state.debt_write_off(staker_a(), staker_a(), borrower(), 51 * ONE, false),
            Err(UnionError::ExceedsLocked {
                requested: 51 * ONE,
                locked: 50 * ONE
            })
        );
        assert_eq!(
            state.debt_write_off(staker_a(), staker_a(), borrower(), 0, false),
            Err(UnionError::AmountZero)
        );

        state
            .debt_write_off(outsider, staker_a(), borrower(), 10 * ONE, true)
            .unwrap();
        assert_eq!(state.locked_stake(&staker_a(), &borrower()), 40 * ONE);
    }
}
