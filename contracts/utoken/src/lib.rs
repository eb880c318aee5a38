//! UToken - Debt Ledger for the Union credit ledger
//!
//! Tracks what each borrower owes and what lenders can redeem. Interest
//! accrues lazily through a global borrow index; each borrower's snapshot
//! remembers the index it was last settled at.
//!
//! ## Core Operations
//!
//! - **accrue_interest**: advance the borrow index to the current unit
//! - **borrow / repay**: draw and pay back debt (interest first)
//! - **debt_write_off**: reduce principal after a staker absorbed the loss
//! - **mint / redeem / redeem_underlying**: lender side, priced by the
//!   exchange rate `total_redeemable / supply`
//! - **add_reserves / remove_reserves**: protocol reserves
//!
//! Membership, credit limits and cash movements are checked by the
//! composing protocol. Every state-changing call here expects the index to
//! be fresh for the current unit (`AccrueBlockParity` otherwise).

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

pub mod interest_model;

use union_common::{
    constants::{precision::WAD, token::UTOKEN_NAME},
    math::{mul_div, mul_div_up, safe_add, safe_sub, wad_mul},
    types::{require_address, Address},
    BTreeMap, ProtocolConfig, TokenLedger, UnionError, UnionResult,
};

pub use interest_model::InterestRateModel;

// ============ Types ============

/// Debt position of one borrower
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct BorrowSnapshot {
    /// Drawn amount plus origination fees, net of repayments and write-offs
    pub principal: u128,
    /// Interest settled up to `interest_index`
    pub interest: u128,
    /// Borrow index at the last settlement
    pub interest_index: u128,
    /// Unit of the last repayment that covered outstanding interest; 0 when clear
    pub last_repay: u64,
}

impl BorrowSnapshot {
    /// Principal plus settled interest
    pub fn balance(&self) -> u128 {
        self.principal.saturating_add(self.interest)
    }
}

/// Result of an index update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accrual {
    pub interest: u128,
    pub borrow_index: u128,
    pub total_borrows: u128,
}

/// Result of a borrow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BorrowReceipt {
    /// Amount paid out to the borrower
    pub amount: u128,
    /// Origination fee added to principal
    pub fee: u128,
}

impl BorrowReceipt {
    /// Principal increase, which must be covered by locked stake
    pub fn principal_added(&self) -> u128 {
        self.amount.saturating_add(self.fee)
    }
}

/// Result of a repayment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepayReceipt {
    pub interest_paid: u128,
    pub principal_paid: u128,
    /// Interest share routed to reserves
    pub to_reserves: u128,
}

impl RepayReceipt {
    /// Underlying collected from the payer
    pub fn total(&self) -> u128 {
        self.interest_paid.saturating_add(self.principal_paid)
    }
}

// ============ UToken State ============

/// Global debt and lender state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct UTokenState {
    /// Debt positions
    pub accounts: BTreeMap<Address, BorrowSnapshot>,
    /// Active rate model
    pub rate_model: InterestRateModel,
    /// Cumulative interest factor, WAD scaled, starts at 1.0
    pub borrow_index: u128,
    /// Unit of the last accrual
    pub accrual_unit: u64,
    /// Outstanding debt including accrued interest
    pub total_borrows: u128,
    /// Protocol reserves
    pub total_reserves: u128,
    /// Underlying owed to uToken holders
    pub total_redeemable: u128,
    /// uToken balances
    pub receipts: TokenLedger,
}

impl UTokenState {
    /// Create a debt ledger accruing from `now`
    pub fn new(config: &ProtocolConfig, now: u64) -> UnionResult<Self> {
        let rate_model = InterestRateModel::fixed(config.interest_rate_per_unit);
        rate_model.validate()?;
        Ok(Self {
            accounts: BTreeMap::new(),
            rate_model,
            borrow_index: WAD,
            accrual_unit: now,
            total_borrows: 0,
            total_reserves: 0,
            total_redeemable: 0,
            receipts: TokenLedger::new(UTOKEN_NAME),
        })
    }

    // ============ Interest ============

    /// Borrow rate per unit given the pool's idle cash
    pub fn borrow_rate_per_unit(&self, cash: u128) -> UnionResult<u128> {
        self.rate_model
            .borrow_rate(cash, self.total_borrows, self.total_reserves)
    }

    /// Lender rate per unit given the pool's idle cash
    pub fn supply_rate_per_unit(&self, config: &ProtocolConfig, cash: u128) -> UnionResult<u128> {
        self.rate_model
            .supply_rate(cash, self.total_borrows, self.total_reserves, config.reserve_factor)
    }

    fn index_at(&self, now: u64, cash: u128) -> UnionResult<(u128, u128)> {
        if now <= self.accrual_unit {
            return Ok((self.borrow_index, 0));
        }
        let elapsed = (now - self.accrual_unit) as u128;
        let factor = self
            .borrow_rate_per_unit(cash)?
            .checked_mul(elapsed)
            .ok_or(UnionError::Overflow)?;
        let interest = wad_mul(self.total_borrows, factor)?;
        let index = safe_add(self.borrow_index, wad_mul(self.borrow_index, factor)?)?;
        Ok((index, interest))
    }

    /// Bring the index up to `now`; a second call in the same unit is a no-op
    pub fn accrue_interest(&mut self, now: u64, cash: u128) -> UnionResult<Option<Accrual>> {
        if now <= self.accrual_unit {
            return Ok(None);
        }
        let (index, interest) = self.index_at(now, cash)?;
        self.total_borrows = safe_add(self.total_borrows, interest)?;
        self.borrow_index = index;
        self.accrual_unit = now;
        Ok(Some(Accrual {
            interest,
            borrow_index: index,
            total_borrows: self.total_borrows,
        }))
    }

    /// Fail unless the index was accrued in this unit
    pub fn ensure_fresh(&self, now: u64) -> UnionResult<()> {
        if self.accrual_unit != now {
            return Err(UnionError::AccrueBlockParity {
                accrued_at: self.accrual_unit,
                now,
            });
        }
        Ok(())
    }

    fn owed_at(snapshot: &BorrowSnapshot, index: u128) -> UnionResult<u128> {
        if snapshot.interest_index == 0 || snapshot.balance() == 0 {
            return Ok(snapshot.balance());
        }
        mul_div(snapshot.balance(), index, snapshot.interest_index)
    }

    /// Balance at the stored index
    pub fn borrow_balance_stored(&self, borrower: &Address) -> UnionResult<u128> {
        match self.accounts.get(borrower) {
            Some(snapshot) => Self::owed_at(snapshot, self.borrow_index),
            None => Ok(0),
        }
    }

    /// Balance as if interest were accrued up to `now`, without mutating
    pub fn borrow_balance_view(&self, borrower: &Address, now: u64, cash: u128) -> UnionResult<u128> {
        let (index, _) = self.index_at(now, cash)?;
        match self.accounts.get(borrower) {
            Some(snapshot) => Self::owed_at(snapshot, index),
            None => Ok(0),
        }
    }

    /// Interest owed at the stored index
    pub fn interest_owed(&self, borrower: &Address) -> UnionResult<u128> {
        let principal = self.get_borrowed(borrower);
        Ok(self.borrow_balance_stored(borrower)?.saturating_sub(principal))
    }

    fn settle(&mut self, borrower: &Address) -> UnionResult<&mut BorrowSnapshot> {
        let index = self.borrow_index;
        let snapshot = self.accounts.entry(*borrower).or_default();
        let owed = Self::owed_at(snapshot, index)?;
        snapshot.interest = owed.saturating_sub(snapshot.principal);
        snapshot.interest_index = index;
        Ok(snapshot)
    }

    // ============ Overdue ============

    /// Outstanding debt not serviced within `overdue_blocks`
    pub fn check_is_overdue(&self, config: &ProtocolConfig, borrower: &Address, now: u64) -> bool {
        match self.accounts.get(borrower) {
            Some(s) if s.balance() > 0 => now.saturating_sub(s.last_repay) > config.overdue_blocks,
            _ => false,
        }
    }

    /// Overdue and past the grace window, so anyone may write off
    pub fn write_off_window_open(&self, config: &ProtocolConfig, borrower: &Address, now: u64) -> bool {
        if !self.check_is_overdue(config, borrower, now) {
            return false;
        }
        let last_repay = self.get_last_repay(borrower);
        let opens_after = last_repay
            .saturating_add(config.overdue_blocks)
            .saturating_add(config.max_overdue_blocks);
        now > opens_after
    }

    // ============ Borrowing ============

    /// Origination fee for a draw of `amount`
    pub fn calculating_fee(config: &ProtocolConfig, amount: u128) -> UnionResult<u128> {
        wad_mul(amount, config.origination_fee)
    }

    /// Room left under the global debt ceiling
    pub fn remaining_debt_ceiling(&self, config: &ProtocolConfig) -> u128 {
        config.debt_ceiling.saturating_sub(self.total_borrows)
    }

    /// Record a draw of `amount` plus origination fee
    ///
    /// The caller still has to lock `principal_added()` of stake and pay
    /// `amount` out of the pool.
    pub fn borrow(
        &mut self,
        config: &ProtocolConfig,
        borrower: &Address,
        amount: u128,
        now: u64,
    ) -> UnionResult<BorrowReceipt> {
        self.ensure_fresh(now)?;

        // 1. Amount bounds
        if amount == 0 {
            return Err(UnionError::AmountZero);
        }
        if amount < config.min_borrow {
            return Err(UnionError::AmountLessMinBorrow {
                requested: amount,
                minimum: config.min_borrow,
            });
        }

        // 2. Overdue borrowers cannot draw more
        if self.check_is_overdue(config, borrower, now) {
            return Err(UnionError::MemberIsOverdue { borrower: *borrower });
        }

        // 3. Per-borrower and global caps
        let fee = Self::calculating_fee(config, amount)?;
        let added = safe_add(amount, fee)?;
        let balance = self.borrow_balance_stored(borrower)?;
        let new_balance = safe_add(balance, added)?;
        if new_balance > config.max_borrow {
            return Err(UnionError::AmountExceedMaxBorrow {
                requested: new_balance,
                maximum: config.max_borrow,
            });
        }
        let new_total = safe_add(self.total_borrows, added)?;
        if new_total > config.debt_ceiling {
            return Err(UnionError::AmountExceedGlobalMax {
                requested: added,
                remaining: self.remaining_debt_ceiling(config),
            });
        }
        let new_reserves = safe_add(self.total_reserves, fee)?;

        // 4. Apply
        let snapshot = self.settle(borrower)?;
        if balance == 0 {
            snapshot.last_repay = now;
        }
        snapshot.principal = safe_add(snapshot.principal, added)?;
        self.total_borrows = new_total;
        self.total_reserves = new_reserves;

        Ok(BorrowReceipt { amount, fee })
    }

    /// Apply up to `amount` to `borrower`'s debt, interest first
    pub fn repay(
        &mut self,
        config: &ProtocolConfig,
        borrower: &Address,
        amount: u128,
        now: u64,
    ) -> UnionResult<RepayReceipt> {
        self.ensure_fresh(now)?;

        let snapshot = self.settle(borrower)?;
        let pay = amount.min(snapshot.balance());
        if pay == 0 {
            return Err(UnionError::AmountZero);
        }

        let interest_paid = pay.min(snapshot.interest);
        let principal_paid = pay - interest_paid;

        // Partial interest payments do not reset the overdue clock
        if pay >= snapshot.interest {
            snapshot.last_repay = now;
        }
        snapshot.interest -= interest_paid;
        snapshot.principal = safe_sub(snapshot.principal, principal_paid)?;
        if snapshot.balance() == 0 {
            snapshot.last_repay = 0;
        }

        let to_reserves = wad_mul(interest_paid, config.reserve_factor)?;
        self.total_borrows = self.total_borrows.saturating_sub(pay);
        self.total_reserves = safe_add(self.total_reserves, to_reserves)?;
        self.total_redeemable = safe_add(self.total_redeemable, interest_paid - to_reserves)?;

        Ok(RepayReceipt {
            interest_paid,
            principal_paid,
            to_reserves,
        })
    }

    /// Reduce principal by `amount` after the backing stake was burned
    ///
    /// Clearing the principal forgives residual interest and resets the
    /// overdue clock.
    pub fn debt_write_off(&mut self, borrower: &Address, amount: u128, now: u64) -> UnionResult<()> {
        self.ensure_fresh(now)?;

        let snapshot = self.settle(borrower)?;
        snapshot.principal = safe_sub(snapshot.principal, amount)?;
        let mut cleared = amount;
        if snapshot.principal == 0 {
            cleared = cleared.saturating_add(snapshot.interest);
            snapshot.interest = 0;
            snapshot.last_repay = 0;
        }
        self.total_borrows = self.total_borrows.saturating_sub(cleared);
        Ok(())
    }

    /// Principal of a borrower
    pub fn get_borrowed(&self, borrower: &Address) -> u128 {
        self.accounts.get(borrower).map(|s| s.principal).unwrap_or(0)
    }

    /// Last qualifying repayment unit of a borrower
    pub fn get_last_repay(&self, borrower: &Address) -> u64 {
        self.accounts.get(borrower).map(|s| s.last_repay).unwrap_or(0)
    }

    /// Replace the rate model; the caller accrues under the old model first
    pub fn set_rate_model(&mut self, model: InterestRateModel) -> UnionResult<InterestRateModel> {
        model.validate()?;
        Ok(core::mem::replace(&mut self.rate_model, model))
    }

    // ============ Lenders ============

    /// Underlying per uToken, WAD scaled
    pub fn exchange_rate_stored(&self, config: &ProtocolConfig) -> UnionResult<u128> {
        let supply = self.receipts.total_supply();
        if supply == 0 {
            return Ok(config.initial_exchange_rate);
        }
        mul_div(self.total_redeemable, WAD, supply)
    }

    /// Issue uTokens for `amount` of supplied underlying
    pub fn mint(&mut self, config: &ProtocolConfig, lender: &Address, amount: u128, now: u64) -> UnionResult<u128> {
        self.ensure_fresh(now)?;
        require_address(lender)?;
        if amount == 0 {
            return Err(UnionError::AmountZero);
        }

        let rate = self.exchange_rate_stored(config)?;
        let utokens = mul_div(amount, WAD, rate)?;
        if utokens == 0 {
            return Err(UnionError::AmountZero);
        }

        self.total_redeemable = safe_add(self.total_redeemable, amount)?;
        self.receipts.mint(lender, utokens)?;
        Ok(utokens)
    }

    /// Burn `utokens` and return the underlying they are worth
    pub fn redeem(&mut self, config: &ProtocolConfig, lender: &Address, utokens: u128, now: u64) -> UnionResult<u128> {
        self.ensure_fresh(now)?;
        if utokens == 0 {
            return Err(UnionError::AmountZero);
        }

        let rate = self.exchange_rate_stored(config)?;
        let underlying = mul_div(utokens, rate, WAD)?;
        self.burn_receipts(lender, utokens, underlying)?;
        Ok(underlying)
    }

    /// Burn enough uTokens to release exactly `amount` of underlying
    ///
    /// Rounds the burn up so the lender never receives more than they own.
    pub fn redeem_underlying(
        &mut self,
        config: &ProtocolConfig,
        lender: &Address,
        amount: u128,
        now: u64,
    ) -> UnionResult<u128> {
        self.ensure_fresh(now)?;
        if amount == 0 {
            return Err(UnionError::AmountZero);
        }

        let rate = self.exchange_rate_stored(config)?;
        let utokens = mul_div_up(amount, WAD, rate)?;
        self.burn_receipts(lender, utokens, amount)?;
        Ok(utokens)
    }

    fn burn_receipts(&mut self, lender: &Address, utokens: u128, underlying: u128) -> UnionResult<()> {
        if underlying > self.total_redeemable {
            return Err(UnionError::InsufficientFundsLeft {
                available: self.total_redeemable,
                requested: underlying,
            });
        }
        self.receipts.burn(lender, utokens)?;
        self.total_redeemable -= underlying;
        Ok(())
    }

    // ============ Reserves ============

    /// Credit `amount` to reserves, returning the new total
    pub fn add_reserves(&mut self, amount: u128) -> UnionResult<u128> {
        if amount == 0 {
            return Err(UnionError::AmountZero);
        }
        self.total_reserves = safe_add(self.total_reserves, amount)?;
        Ok(self.total_reserves)
    }

    /// Debit `amount` from reserves, returning the new total
    pub fn remove_reserves(&mut self, amount: u128) -> UnionResult<u128> {
        if amount == 0 {
            return Err(UnionError::AmountZero);
        }
        if amount > self.total_reserves {
            return Err(UnionError::InsufficientBalance {
                available: self.total_reserves,
                requested: amount,
            });
        }
        self.total_reserves -= amount;
        Ok(self.total_reserves)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use union_common::constants::token::ONE;

    fn borrower() -> [u8; 32] {
        [9u8; 32]
    }

    fn lender() -> [u8; 32] {
        [5u8; 32]
    }

    /// 0.001% per unit, so 100 units accrue exactly 0.1%
    fn config() -> ProtocolConfig {
        ProtocolConfig {
            interest_rate_per_unit: 10_000_000_000_000,
            origination_fee: 5_000_000_000_000_000,
            min_borrow: ONE,
            max_borrow: 1_000 * ONE,
            debt_ceiling: 2_000 * ONE,
            overdue_blocks: 100,
            max_overdue_blocks: 50,
            ..ProtocolConfig::default()
        }
    }

    fn ledger() -> UTokenState {
        UTokenState::new(&config(), 1).unwrap()
    }

    #[test]
    fn test_borrow_adds_fee_to_principal_and_reserves() {
        let config = config();
        let mut utoken = ledger();

        let receipt = utoken.borrow(&config, &borrower(), 100 * ONE, 1).unwrap();
        assert_eq!(receipt.fee, ONE / 2);
        assert_eq!(utoken.get_borrowed(&borrower()), 100 * ONE + ONE / 2);
        assert_eq!(utoken.total_reserves, ONE / 2);
        assert_eq!(utoken.total_borrows, 100 * ONE + ONE / 2);
        assert_eq!(utoken.get_last_repay(&borrower()), 1);
    }

    #[test]
    fn test_borrow_bounds() {
        let config = config();
        let mut utoken = ledger();

        assert_eq!(utoken.borrow(&config, &borrower(), 0, 1), Err(UnionError::AmountZero));
        assert!(matches!(
            utoken.borrow(&config, &borrower(), ONE / 2, 1),
            Err(UnionError::AmountLessMinBorrow { .. })
        ));
        assert!(matches!(
            utoken.borrow(&config, &borrower(), 1_000 * ONE, 1),
            Err(UnionError::AmountExceedMaxBorrow { .. })
        ));
    }

    #[test]
    fn test_debt_ceiling() {
        let config = ProtocolConfig {
            debt_ceiling: 150 * ONE,
            ..config()
        };
        let mut utoken = ledger();
        utoken.borrow(&config, &borrower(), 100 * ONE, 1).unwrap();

        let result = utoken.borrow(&config, &[8u8; 32], 60 * ONE, 1);
        assert!(matches!(result, Err(UnionError::AmountExceedGlobalMax { .. })));
        assert_eq!(utoken.remaining_debt_ceiling(&config), 150 * ONE - 100 * ONE - ONE / 2);
    }

    #[test]
    fn test_accrual_is_idempotent_per_unit() {
        let config = ProtocolConfig {
            origination_fee: 0,
            ..config()
        };
        let mut utoken = ledger();
        utoken.borrow(&config, &borrower(), 100 * ONE, 1).unwrap();

        let accrual = utoken.accrue_interest(101, 0).unwrap().unwrap();
        assert_eq!(accrual.interest, ONE / 10);
        assert_eq!(utoken.accrue_interest(101, 0).unwrap(), None);

        assert_eq!(utoken.borrow_balance_stored(&borrower()).unwrap(), 100 * ONE + ONE / 10);
        assert_eq!(utoken.interest_owed(&borrower()).unwrap(), ONE / 10);
    }

    #[test]
    fn test_view_matches_accrual() {
        let config = ProtocolConfig {
            origination_fee: 0,
            ..config()
        };
        let mut utoken = ledger();
        utoken.borrow(&config, &borrower(), 100 * ONE, 1).unwrap();

        let viewed = utoken.borrow_balance_view(&borrower(), 201, 0).unwrap();
        utoken.accrue_interest(201, 0).unwrap();
        assert_eq!(viewed, utoken.borrow_balance_stored(&borrower()).unwrap());
    }

    #[test]
    fn test_stale_index_rejected() {
        let config = config();
        let mut utoken = ledger();
        assert_eq!(
            utoken.borrow(&config, &borrower(), ONE, 5),
            Err(UnionError::AccrueBlockParity { accrued_at: 1, now: 5 })
        );
    }

    #[test]
    fn test_repay_interest_first() {
        let config = ProtocolConfig {
            origination_fee: 0,
            ..config()
        };
        let mut utoken = ledger();
        utoken.borrow(&config, &borrower(), 100 * ONE, 1).unwrap();
        utoken.accrue_interest(101, 0).unwrap();

        let receipt = utoken.repay(&config, &borrower(), ONE, 101).unwrap();
        assert_eq!(receipt.interest_paid, ONE / 10);
        assert_eq!(receipt.principal_paid, ONE - ONE / 10);
        assert_eq!(receipt.to_reserves, ONE / 20);
        assert_eq!(utoken.total_redeemable, ONE / 20);
        assert_eq!(utoken.get_last_repay(&borrower()), 101);
    }

    #[test]
    fn test_partial_interest_keeps_overdue_clock() {
        let config = ProtocolConfig {
            origination_fee: 0,
            ..config()
        };
        let mut utoken = ledger();
        utoken.borrow(&config, &borrower(), 100 * ONE, 1).unwrap();
        utoken.accrue_interest(101, 0).unwrap();

        utoken.repay(&config, &borrower(), ONE / 20, 101).unwrap();
        assert_eq!(utoken.get_last_repay(&borrower()), 1);
    }

    #[test]
    fn test_full_repay_clears_position() {
        let config = config();
        let mut utoken = ledger();
        utoken.borrow(&config, &borrower(), 100 * ONE, 1).unwrap();
        utoken.accrue_interest(50, 0).unwrap();

        let owed = utoken.borrow_balance_stored(&borrower()).unwrap();
        let receipt = utoken.repay(&config, &borrower(), owed + ONE, 50).unwrap();
        assert_eq!(receipt.total(), owed);
        assert_eq!(utoken.get_last_repay(&borrower()), 0);
        assert_eq!(utoken.borrow_balance_stored(&borrower()).unwrap(), 0);
        assert_eq!(utoken.repay(&config, &borrower(), ONE, 50), Err(UnionError::AmountZero));
    }

    #[test]
    fn test_overdue_and_write_off_window() {
        let config = config();
        let mut utoken = ledger();
        utoken.borrow(&config, &borrower(), 10 * ONE, 1).unwrap();

        assert!(!utoken.check_is_overdue(&config, &borrower(), 101));
        assert!(utoken.check_is_overdue(&config, &borrower(), 102));
        assert!(!utoken.write_off_window_open(&config, &borrower(), 151));
        assert!(utoken.write_off_window_open(&config, &borrower(), 152));

        utoken.accrue_interest(102, 0).unwrap();
        assert_eq!(
            utoken.borrow(&config, &borrower(), ONE, 102),
            Err(UnionError::MemberIsOverdue { borrower: borrower() })
        );
    }

    #[test]
    fn test_write_off_forgives_interest_when_clear() {
        let config = ProtocolConfig {
            origination_fee: 0,
            ..config()
        };
        let mut utoken = ledger();
        utoken.borrow(&config, &borrower(), 100 * ONE, 1).unwrap();
        utoken.accrue_interest(101, 0).unwrap();

        utoken.debt_write_off(&borrower(), 40 * ONE, 101).unwrap();
        assert_eq!(utoken.get_borrowed(&borrower()), 60 * ONE);
        assert_eq!(utoken.interest_owed(&borrower()).unwrap(), ONE / 10);

        utoken.debt_write_off(&borrower(), 60 * ONE, 101).unwrap();
        assert_eq!(utoken.borrow_balance_stored(&borrower()).unwrap(), 0);
        assert_eq!(utoken.get_last_repay(&borrower()), 0);
        assert_eq!(utoken.total_borrows, 0);
        assert!(utoken.debt_write_off(&borrower(), 1, 101).is_err());
    }

    #[test]
    fn test_mint_redeem_at_initial_rate() {
        let config = config();
        let mut utoken = ledger();

        let minted = utoken.mint(&config, &lender(), 100 * ONE, 1).unwrap();
        assert_eq!(minted, 100 * ONE);
        assert_eq!(utoken.exchange_rate_stored(&config).unwrap(), WAD);

        let underlying = utoken.redeem(&config, &lender(), 40 * ONE, 1).unwrap();
        assert_eq!(underlying, 40 * ONE);
        assert_eq!(utoken.total_redeemable, 60 * ONE);
    }

    #[test]
    fn test_redeem_underlying_rounds_burn_up() {
        let config = config();
        let mut utoken = ledger();
        utoken.mint(&config, &lender(), 3, 1).unwrap();
        // Interest credited to lenders: rate becomes 4/3
        utoken.total_redeemable = 4;

        let burned = utoken.redeem_underlying(&config, &lender(), 1, 1).unwrap();
        // 1 / (4/3) = 0.75, rounded up
        assert_eq!(burned, 1);
        assert_eq!(utoken.receipts.balance_of(&lender()), 2);
        assert_eq!(utoken.total_redeemable, 3);
    }

    #[test]
    fn test_reserves() {
        let mut utoken = ledger();
        assert_eq!(utoken.add_reserves(10).unwrap(), 10);
        assert_eq!(
            utoken.remove_reserves(11),
            Err(UnionError::InsufficientBalance { available: 10, requested: 11 })
        );
        assert_eq!(utoken.remove_reserves(4).unwrap(), 6);
    }

    #[test]
    fn test_rate_model_swap_validates() {
        let mut utoken = ledger();
        assert!(utoken.set_rate_model(InterestRateModel::fixed(u128::MAX)).is_err());
        let old = utoken.set_rate_model(InterestRateModel::fixed(1)).unwrap();
        assert_eq!(old, InterestRateModel::fixed(10_000_000_000_000));
    }
}
