//! Asset Manager - Fund Routing for the Union credit ledger
//!
//! Every unit of underlying the protocol holds (stake, lender supply,
//! repayments) sits either in the asset manager's own custody account or in
//! a registered money-market adapter.
//!
//! ## Routing
//!
//! - **Deposit**: top up adapters below their floor in registry order, then
//!   fill the highest-rate adapters up to their ceiling, then hold the rest
//! - **Withdraw**: pay from held funds first, then from adapters in
//!   `withdraw_seq` order; a shortfall fails the whole withdrawal
//! - **Rebalance**: pull everything back and redistribute by weight
//!
//! The withdraw sequence stores adapter ids, never positions, so adding or
//! removing an adapter cannot make it point at the wrong market.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

pub mod adapters;

use union_common::{
    constants::precision::BPS_DENOMINATOR,
    math::{mul_div, safe_add},
    types::{require_address, Address},
    BTreeSet, TokenLedger, UnionError, UnionResult, Vec,
};

pub use adapters::{AaveAdapter, Adapter, MoneyMarketAdapter, PureTokenAdapter};

// ============ Asset Manager State ============

/// Adapter registry and custody account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct AssetManagerState {
    /// Account holding funds not placed in any adapter
    pub custody: Address,
    /// Registered adapters, in registration order
    pub money_markets: Vec<Adapter>,
    /// Adapter ids in withdrawal priority order
    pub withdraw_seq: Vec<Address>,
}

impl AssetManagerState {
    /// Create an asset manager holding funds at `custody`
    pub fn new(custody: Address) -> UnionResult<Self> {
        require_address(&custody)?;
        Ok(Self {
            custody,
            money_markets: Vec::new(),
            withdraw_seq: Vec::new(),
        })
    }

    // ============ Views ============

    /// Registered adapter ids, in registration order
    pub fn adapter_ids(&self) -> Vec<Address> {
        self.money_markets.iter().map(|a| a.id()).collect()
    }

    /// Withdrawal priority
    pub fn withdraw_sequence(&self) -> &[Address] {
        &self.withdraw_seq
    }

    /// Adapter by id
    pub fn adapter(&self, id: &Address) -> Option<&Adapter> {
        self.money_markets.iter().find(|a| a.id() == *id)
    }

    fn position(&self, id: &Address) -> UnionResult<usize> {
        self.money_markets
            .iter()
            .position(|a| a.id() == *id)
            .ok_or(UnionError::AdapterNotFound { adapter: *id })
    }

    /// Held funds plus every adapter's supply
    pub fn pool_balance(&self, ledger: &TokenLedger, now: u64) -> UnionResult<u128> {
        let mut total = ledger.balance_of(&self.custody);
        for adapter in &self.money_markets {
            total = safe_add(total, adapter.supply(ledger, now)?)?;
        }
        Ok(total)
    }

    /// Funds available to borrowers and redeeming lenders
    ///
    /// `staked_principal` belongs to stakers and is never lent out.
    pub fn loanable_amount(&self, ledger: &TokenLedger, now: u64, staked_principal: u128) -> UnionResult<u128> {
        Ok(self.pool_balance(ledger, now)?.saturating_sub(staked_principal))
    }

    // ============ Registry ============

    /// Register an adapter at the end of both lists
    pub fn add_adapter(&mut self, adapter: Adapter) -> UnionResult<()> {
        let id = adapter.id();
        require_address(&id)?;
        if id == self.custody || self.adapter(&id).is_some() {
            return Err(UnionError::AdapterExists { adapter: id });
        }
        self.money_markets.push(adapter);
        self.withdraw_seq.push(id);
        Ok(())
    }

    /// Unregister an empty adapter, keeping the order of the rest
    pub fn remove_adapter(&mut self, ledger: &TokenLedger, id: &Address, now: u64) -> UnionResult<()> {
        let index = self.position(id)?;
        let supply = self.money_markets[index].supply(ledger, now)?;
        if supply > 0 {
            return Err(UnionError::RemainingFunds {
                adapter: *id,
                supply,
            });
        }
        self.money_markets.remove(index);
        self.withdraw_seq.retain(|a| a != id);
        Ok(())
    }

    /// Replace the withdrawal priority with a permutation of the registered ids
    pub fn set_withdraw_sequence(&mut self, sequence: Vec<Address>) -> UnionResult<()> {
        if sequence.len() != self.money_markets.len() {
            return Err(UnionError::LengthNotMatch {
                expected: self.money_markets.len(),
                actual: sequence.len(),
            });
        }
        let mut seen = BTreeSet::new();
        for id in &sequence {
            self.position(id)?;
            if !seen.insert(*id) {
                return Err(UnionError::InvalidParameter {
                    param: "withdraw_sequence",
                    reason: "duplicate adapter",
                });
            }
        }
        self.withdraw_seq = sequence;
        Ok(())
    }

    /// Change an adapter's target band; returns the old (floor, ceiling)
    pub fn set_floor_ceiling(&mut self, id: &Address, floor: u128, ceiling: u128) -> UnionResult<(u128, u128)> {
        let index = self.position(id)?;
        let adapter = &mut self.money_markets[index];
        let old = (adapter.floor(), adapter.ceiling());
        adapter.set_floor_ceiling(floor, ceiling)?;
        Ok(old)
    }

    // ============ Fund Movements ============

    /// Take `amount` from `from` and place it
    pub fn deposit(&mut self, ledger: &mut TokenLedger, from: &Address, amount: u128, now: u64) -> UnionResult<()> {
        if amount == 0 {
            return Err(UnionError::AmountZero);
        }
        ledger.transfer(from, &self.custody, amount)?;
        self.place(ledger, amount, now)
    }

    /// Move up to `amount` of held funds into adapters
    fn place(&mut self, ledger: &mut TokenLedger, amount: u128, now: u64) -> UnionResult<()> {
        let custody = self.custody;
        let mut remaining = amount;

        // 1. Floors, registry order
        for adapter in self.money_markets.iter_mut() {
            if remaining == 0 {
                break;
            }
            let supply = adapter.supply(ledger, now)?;
            let gap = adapter.floor().saturating_sub(supply).min(remaining);
            if gap > 0 {
                adapter.deposit(ledger, &custody, gap, now)?;
                remaining -= gap;
            }
        }

        // 2. Ceilings, highest rate first (stable for equal rates)
        let mut by_rate: Vec<usize> = (0..self.money_markets.len()).collect();
        by_rate.sort_by(|a, b| self.money_markets[*b].rate().cmp(&self.money_markets[*a].rate()));
        for index in by_rate {
            if remaining == 0 {
                break;
            }
            let adapter = &mut self.money_markets[index];
            let supply = adapter.supply(ledger, now)?;
            let room = adapter.ceiling().saturating_sub(supply).min(remaining);
            if room > 0 {
                adapter.deposit(ledger, &custody, room, now)?;
                remaining -= room;
            }
        }

        // 3. Whatever is left stays in custody
        Ok(())
    }

    /// Pay `amount` to `to`, held funds first, then by withdraw sequence
    pub fn withdraw(&mut self, ledger: &mut TokenLedger, to: &Address, amount: u128, now: u64) -> UnionResult<()> {
        if amount == 0 {
            return Err(UnionError::AmountZero);
        }
        let available = self.pool_balance(ledger, now)?;
        if amount > available {
            return Err(UnionError::InsufficientFundsLeft {
                available,
                requested: amount,
            });
        }

        let held = ledger.balance_of(&self.custody).min(amount);
        if held > 0 {
            ledger.transfer(&self.custody, to, held)?;
        }
        let mut remaining = amount - held;

        for id in self.withdraw_seq.clone() {
            if remaining == 0 {
                break;
            }
            let index = self.position(&id)?;
            let adapter = &mut self.money_markets[index];
            adapter.accrue(ledger, now)?;
            let take = ledger.balance_of(&id).min(remaining);
            if take > 0 {
                adapter.withdraw(ledger, to, take, now)?;
                remaining -= take;
            }
        }

        if remaining > 0 {
            return Err(UnionError::InsufficientFundsLeft {
                available: amount - remaining,
                requested: amount,
            });
        }
        Ok(())
    }

    /// Pull every adapter's funds into custody and redistribute by weight
    ///
    /// `weights_bps[i]` is the share for the i-th registered adapter; the
    /// part not covered by the weights stays held.
    pub fn rebalance(&mut self, ledger: &mut TokenLedger, weights_bps: &[u32], now: u64) -> UnionResult<()> {
        if weights_bps.len() != self.money_markets.len() {
            return Err(UnionError::LengthNotMatch {
                expected: self.money_markets.len(),
                actual: weights_bps.len(),
            });
        }
        let weight_sum: u128 = weights_bps.iter().map(|w| *w as u128).sum();
        if weight_sum > BPS_DENOMINATOR {
            return Err(UnionError::InvalidParameter {
                param: "weights_bps",
                reason: "weights exceed 100%",
            });
        }

        let custody = self.custody;
        for adapter in self.money_markets.iter_mut() {
            adapter.accrue(ledger, now)?;
            let held = ledger.balance_of(&adapter.id());
            if held > 0 {
                adapter.withdraw(ledger, &custody, held, now)?;
            }
        }

        let total = ledger.balance_of(&custody);
        for (adapter, weight) in self.money_markets.iter_mut().zip(weights_bps) {
            let share = mul_div(total, *weight as u128, BPS_DENOMINATOR)?;
            if share > 0 {
                adapter.deposit(ledger, &custody, share, now)?;
            }
        }
        Ok(())
    }
}
