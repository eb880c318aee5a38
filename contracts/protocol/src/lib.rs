//! Union Protocol - Composition of the Union credit ledger
//!
//! One `Protocol` value owns every component of a deployment: the stake
//! ledger and trust graph, the debt ledger, the reward engine, the asset
//! manager, both token ledgers, the clock and the event log.
//!
//! ## Execution Model
//!
//! Every mutating call runs against a draft copy of the state and replaces
//! the live state only when it returns `Ok`. A failed call therefore leaves
//! balances, positions and the event log exactly as they were.
//!
//! Time only moves through `advance_blocks` / `advance_time`. Interest and
//! rewards are computed from elapsed units when an operation touches them.
//!
//! ## Fund Flows
//!
//! Underlying always passes through the account of the component that owns
//! the flow (user manager for stake, uToken for debt, lender supply and
//! reserves) on its way into or out of the asset manager.
//!
//! For concurrent use wrap the protocol in a [`SharedProtocol`].

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub mod admin;
pub mod shared;


pub use shared::SharedProtocol;

use union_asset_manager::AssetManagerState;
use union_common::{
    types::{derive_address, Address},
    AccessControl, Clock, EventLog, ProtocolConfig, Role, TokenLedger, UnionError, UnionEvent,
    UnionResult, Vec,
};
use union_comptroller::{ComptrollerState, StakeSnapshot};
use union_user_manager::{UserManagerState, Vouch, Vouchee};
use union_utoken::UTokenState;

// ============ System Accounts ============

/// Token-ledger accounts of the protocol's own components
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct SystemAccounts {
    /// Receives stake and spends registration fees
    pub user_manager: Address,
    /// Fronts debt, lender and reserve flows
    pub utoken: Address,
    /// Holds UNION for reward payouts
    pub comptroller: Address,
    /// Custody of funds not placed in adapters
    pub asset_manager: Address,
}

impl SystemAccounts {
    /// Accounts derived from fixed labels
    pub fn derive() -> Self {
        Self {
            user_manager: derive_address(b"user-manager"),
            utoken: derive_address(b"utoken"),
            comptroller: derive_address(b"comptroller"),
            asset_manager: derive_address(b"asset-manager"),
        }
    }
}

// ============ Protocol State ============

/// Complete state of one deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct ProtocolState {
    pub config: ProtocolConfig,
    pub clock: Clock,
    pub access: AccessControl,
    pub accounts: SystemAccounts,
    /// Underlying (DAI)
    pub dai: TokenLedger,
    /// Reward token
    pub union_token: TokenLedger,
    pub user_manager: UserManagerState,
    pub utoken: UTokenState,
    pub comptroller: ComptrollerState,
    pub asset_manager: AssetManagerState,
    pub events: EventLog,
    pub is_paused: bool,
}

impl ProtocolState {
    /// Current accrual unit
    pub fn now(&self) -> u64 {
        self.clock.now(self.config.time_basis)
    }

    fn block(&self) -> u64 {
        self.clock.block_number
    }

    fn emit(&mut self, event: UnionEvent) {
        self.events.emit(event);
    }

    fn require_not_paused(&self) -> UnionResult<()> {
        if self.is_paused {
            return Err(UnionError::ProtocolPaused);
        }
        Ok(())
    }

    /// Pool funds that do not belong to stakers
    fn loanable(&self) -> UnionResult<u128> {
        self.asset_manager
            .loanable_amount(&self.dai, self.now(), self.user_manager.total_staked)
    }

    fn require_loanable(&self, amount: u128) -> UnionResult<()> {
        let available = self.loanable()?;
        if amount > available {
            return Err(UnionError::InsufficientFundsLeft {
                available,
                requested: amount,
            });
        }
        Ok(())
    }

    fn accrue_interest(&mut self) -> UnionResult<()> {
        let now = self.now();
        let cash = self.loanable()?;
        if let Some(accrual) = self.utoken.accrue_interest(now, cash)? {
            if accrual.interest > 0 {
                let block_height = self.block();
                self.emit(UnionEvent::LogAccrueInterest {
                    interest: accrual.interest,
                    borrow_index: accrual.borrow_index,
                    total_borrows: accrual.total_borrows,
                    block_height,
                });
            }
        }
        Ok(())
    }

    fn is_overdue(&self, borrower: &Address) -> bool {
        self.utoken.check_is_overdue(&self.config, borrower, self.now())
    }

    fn stake_snapshot(&self, account: &Address) -> StakeSnapshot {
        let staker = self.user_manager.staker(account);
        StakeSnapshot {
            stake: staker.stake,
            locked: staker.locked,
            frozen: self.user_manager.total_frozen(account, |b| self.is_overdue(b)),
        }
    }

    fn total_effective(&self) -> UnionResult<u128> {
        let staked = self.user_manager.total_staked;
        let frozen = self.user_manager.global_frozen(|b| self.is_overdue(b));
        if frozen > staked {
            return Err(UnionError::ExceedsTotalFrozen { frozen, staked });
        }
        Ok(staked - frozen)
    }

    /// Advance the global reward index under the current totals
    fn checkpoint_rewards(&mut self) -> UnionResult<()> {
        let total = self.total_effective()?;
        let now = self.now();
        self.comptroller.update_global(&self.config, now, total)
    }

    /// Settle `account`'s rewards before its stake figures change
    fn settle_rewards(&mut self, account: &Address) -> UnionResult<()> {
        let snapshot = self.stake_snapshot(account);
        let total = self.total_effective()?;
        let now = self.now();
        self.comptroller
            .update_user(&self.config, account, &snapshot, now, total)?;
        Ok(())
    }

    /// Settle every staker backing `borrower`
    fn settle_backers(&mut self, borrower: &Address) -> UnionResult<()> {
        let backers: Vec<Address> = self
            .user_manager
            .vouchers_of(borrower)
            .iter()
            .map(|v| v.staker)
            .collect();
        for staker in backers {
            self.settle_rewards(&staker)?;
        }
        Ok(())
    }

    /// `from` -> component account -> asset manager
    fn pull(&mut self, from: &Address, via: &Address, amount: u128) -> UnionResult<()> {
        let now = self.now();
        self.dai.transfer(from, via, amount)?;
        self.asset_manager.deposit(&mut self.dai, via, amount, now)
    }

    /// asset manager -> component account -> `to`
    fn push(&mut self, via: &Address, to: &Address, amount: u128) -> UnionResult<()> {
        let now = self.now();
        self.asset_manager.withdraw(&mut self.dai, via, amount, now)?;
        self.dai.transfer(via, to, amount)
    }

    /// Bookkeeping invariants across components
    pub fn check_invariants(&self) -> UnionResult<()> {
        self.user_manager.check_invariants()?;
        for (borrower, snapshot) in &self.utoken.accounts {
            if self.user_manager.borrower_locked(borrower) != snapshot.principal {
                return Err(UnionError::InvalidParameter {
                    param: "locked",
                    reason: "borrower lock does not match principal",
                });
            }
        }
        Ok(())
    }
}

// ============ Protocol ============

/// A running deployment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Protocol {
    state: ProtocolState,
}

impl Protocol {
    /// Deploy with `admin` holding every role and the default clock
    pub fn new(admin: Address, config: ProtocolConfig) -> UnionResult<Self> {
        Self::with_clock(admin, config, Clock::default())
    }

    /// Deploy starting from a given clock
    pub fn with_clock(admin: Address, config: ProtocolConfig, clock: Clock) -> UnionResult<Self> {
        config.validate()?;
        let mut access = AccessControl::new(admin)?;
        access.grant_role(&admin, admin, Role::MemberManager)?;
        access.grant_role(&admin, admin, Role::Guardian)?;

        let accounts = SystemAccounts::derive();
        let now = clock.now(config.time_basis);
        let utoken = UTokenState::new(&config, now)?;
        let asset_manager = AssetManagerState::new(accounts.asset_manager)?;

        Ok(Self {
            state: ProtocolState {
                clock,
                access,
                dai: TokenLedger::new("DAI"),
                union_token: TokenLedger::new("UNION"),
                user_manager: UserManagerState::new(),
                utoken,
                comptroller: ComptrollerState::new(now),
                asset_manager,
                events: EventLog::new(),
                is_paused: false,
                accounts,
                config,
            },
        })
    }

    /// Run `op` on a draft and commit only on success
    fn execute<T, F>(&mut self, op: F) -> UnionResult<T>
    where
        F: FnOnce(&mut ProtocolState) -> UnionResult<T>,
    {
        let mut draft = self.state.clone();
        let output = op(&mut draft)?;
        self.state = draft;
        Ok(output)
    }

    // ============ Stake ============

    /// Stake `amount` of underlying
    pub fn stake(&mut self, staker: Address, amount: u128) -> UnionResult<()> {
        self.execute(|s| {
            s.require_not_paused()?;
            s.settle_rewards(&staker)?;
            s.user_manager.stake(&s.config, staker, amount)?;

            let via = s.accounts.user_manager;
            s.pull(&staker, &via, amount)?;

            let block_height = s.block();
            s.emit(UnionEvent::LogStake {
                staker,
                amount,
                block_height,
            });
            Ok(())
        })
    }

    /// Withdraw `amount` of unlocked stake
    pub fn unstake(&mut self, staker: Address, amount: u128) -> UnionResult<()> {
        self.execute(|s| {
            s.settle_rewards(&staker)?;
            s.user_manager.unstake(staker, amount)?;

            let via = s.accounts.user_manager;
            s.push(&via, &staker, amount)?;

            let block_height = s.block();
            s.emit(UnionEvent::LogUnstake {
                staker,
                amount,
                block_height,
            });
            Ok(())
        })
    }

    // ============ Trust ============

    /// Create or change `staker`'s vouch for `borrower`
    pub fn update_trust(&mut self, staker: Address, borrower: Address, trust: u128) -> UnionResult<()> {
        self.execute(|s| {
            let block_height = s.block();
            s.user_manager
                .update_trust(&s.config, staker, borrower, trust, block_height)?;
            s.emit(UnionEvent::LogUpdateTrust {
                staker,
                borrower,
                trust,
                block_height,
            });
            Ok(())
        })
    }

    /// Remove an unlocked vouch; `caller` must be one of its ends
    pub fn cancel_vouch(&mut self, caller: Address, staker: Address, borrower: Address) -> UnionResult<()> {
        self.execute(|s| {
            s.user_manager.cancel_vouch(caller, staker, borrower)?;
            let block_height = s.block();
            s.emit(UnionEvent::LogCancelVouch {
                staker,
                borrower,
                block_height,
            });
            Ok(())
        })
    }

    // ============ Membership ============

    /// Admit `new_member`, burning the member fee from `payer`'s UNION
    ///
    /// `payer` must have approved the user manager account for the fee.
    pub fn register_member(&mut self, payer: Address, new_member: Address) -> UnionResult<()> {
        self.execute(|s| {
            s.user_manager.register_member(&s.config, new_member)?;

            let fee = s.config.new_member_fee;
            if fee > 0 {
                let spender = s.accounts.user_manager;
                s.union_token.burn_from(&spender, &payer, fee)?;
            }

            let block_height = s.block();
            s.emit(UnionEvent::LogRegisterMember {
                payer,
                member: new_member,
                fee,
                block_height,
            });
            Ok(())
        })
    }

    // ============ Debt ============

    /// Bring the borrow index up to the current unit
    pub fn accrue_interest(&mut self) -> UnionResult<()> {
        self.execute(|s| s.accrue_interest())
    }

    /// Draw `amount`, locking `amount + fee` of the backers' stake
    pub fn borrow(&mut self, borrower: Address, amount: u128) -> UnionResult<()> {
        self.execute(|s| {
            // 1. Caller checks
            s.require_not_paused()?;
            if !s.user_manager.is_member(&borrower) {
                return Err(UnionError::CallerNotMember { caller: borrower });
            }

            // 2. Fresh index and settled backers
            s.accrue_interest()?;
            s.settle_backers(&borrower)?;

            // 3. Debt ledger bounds (amount, overdue, caps)
            let now = s.now();
            let receipt = s.utoken.borrow(&s.config, &borrower, amount, now)?;

            // 4. Backing and liquidity
            if s.config.enforce_effective_count_on_borrow {
                let found = s.user_manager.effective_backers(&borrower);
                if found < s.config.effective_count {
                    return Err(UnionError::NotEnoughStakers {
                        found,
                        required: s.config.effective_count,
                    });
                }
            }
            let to_lock = receipt.principal_added();
            let limit = s.user_manager.credit_limit(&borrower);
            if to_lock > limit {
                return Err(UnionError::InsufficientCreditLimit {
                    available: limit,
                    requested: to_lock,
                });
            }
            s.require_loanable(amount)?;

            // 5. Lock and pay out
            let block_height = s.block();
            s.user_manager
                .update_locked(&borrower, to_lock, true, block_height)?;
            let via = s.accounts.utoken;
            s.push(&via, &borrower, amount)?;

            s.emit(UnionEvent::LogBorrow {
                borrower,
                amount,
                fee: receipt.fee,
                block_height,
            });
            Ok(())
        })
    }

    /// Repay up to `amount` of the caller's own debt
    pub fn repay_borrow(&mut self, borrower: Address, amount: u128) -> UnionResult<()> {
        self.repay_borrow_behalf(borrower, borrower, amount)
    }

    /// `payer` repays up to `amount` of `borrower`'s debt, interest first
    pub fn repay_borrow_behalf(&mut self, payer: Address, borrower: Address, amount: u128) -> UnionResult<()> {
        self.execute(|s| {
            s.accrue_interest()?;
            s.repay(payer, borrower, amount)
        })
    }

    /// Pay exactly the interest `borrower` owes now
    pub fn repay_interest(&mut self, borrower: Address) -> UnionResult<()> {
        self.execute(|s| {
            s.accrue_interest()?;
            let interest = s.utoken.interest_owed(&borrower)?;
            s.repay(borrower, borrower, interest)
        })
    }

    /// Burn `amount` of `staker`'s stake locked for `borrower` and cancel
    /// that much of the borrower's principal
    ///
    /// The staker may do this at any time. Anyone else must wait until the
    /// borrower is overdue and the grace window has also passed.
    pub fn debt_write_off(
        &mut self,
        caller: Address,
        staker: Address,
        borrower: Address,
        amount: u128,
    ) -> UnionResult<()> {
        self.execute(|s| {
            s.accrue_interest()?;
            let now = s.now();
            let third_party_allowed = s.utoken.write_off_window_open(&s.config, &borrower, now);

            s.settle_backers(&borrower)?;
            let outcome = s.user_manager.debt_write_off(
                caller,
                staker,
                borrower,
                amount,
                third_party_allowed,
            )?;
            s.utoken.debt_write_off(&borrower, amount, now)?;

            let block_height = s.block();
            s.emit(UnionEvent::LogDebtWriteOff {
                caller,
                staker,
                borrower,
                amount,
                block_height,
            });
            if outcome.vouch_cancelled {
                s.emit(UnionEvent::LogCancelVouch {
                    staker,
                    borrower,
                    block_height,
                });
            }
            Ok(())
        })
    }

    // ============ Lenders ============

    /// Supply `amount` of underlying for uTokens; returns uTokens minted
    pub fn mint(&mut self, lender: Address, amount: u128) -> UnionResult<u128> {
        self.execute(|s| {
            s.require_not_paused()?;
            s.accrue_interest()?;

            let now = s.now();
            let utokens = s.utoken.mint(&s.config, &lender, amount, now)?;
            let via = s.accounts.utoken;
            s.pull(&lender, &via, amount)?;

            let block_height = s.block();
            s.emit(UnionEvent::LogMint {
                lender,
                underlying: amount,
                utokens,
                block_height,
            });
            Ok(utokens)
        })
    }

    /// Burn `utokens`; returns underlying paid out
    pub fn redeem(&mut self, lender: Address, utokens: u128) -> UnionResult<u128> {
        self.execute(|s| {
            s.require_not_paused()?;
            s.accrue_interest()?;

            let now = s.now();
            let underlying = s.utoken.redeem(&s.config, &lender, utokens, now)?;
            s.finish_redeem(lender, underlying, utokens)?;
            Ok(underlying)
        })
    }

    /// Withdraw exactly `amount` of underlying; returns uTokens burned
    pub fn redeem_underlying(&mut self, lender: Address, amount: u128) -> UnionResult<u128> {
        self.execute(|s| {
            s.require_not_paused()?;
            s.accrue_interest()?;

            let now = s.now();
            let utokens = s.utoken.redeem_underlying(&s.config, &lender, amount, now)?;
            s.finish_redeem(lender, amount, utokens)?;
            Ok(utokens)
        })
    }

    /// Top up reserves from `from`'s underlying
    pub fn add_reserves(&mut self, from: Address, amount: u128) -> UnionResult<()> {
        self.execute(|s| {
            s.accrue_interest()?;
            let new_total = s.utoken.add_reserves(amount)?;
            let via = s.accounts.utoken;
            s.pull(&from, &via, amount)?;

            let block_height = s.block();
            s.emit(UnionEvent::LogReservesAdded {
                from,
                amount,
                new_total,
                block_height,
            });
            Ok(())
        })
    }

    // ============ Rewards ============

    /// Pay out settled rewards; what the comptroller cannot cover stays accrued
    pub fn withdraw_rewards(&mut self, account: Address) -> UnionResult<u128> {
        self.execute(|s| {
            s.settle_rewards(&account)?;

            let comptroller = s.accounts.comptroller;
            let available = s.union_token.balance_of(&comptroller);
            let payout = s.comptroller.withdraw_rewards(&account, available);
            if payout.paid > 0 {
                s.union_token.transfer(&comptroller, &account, payout.paid)?;
            }

            let block_height = s.block();
            s.emit(UnionEvent::LogWithdrawRewards {
                account,
                paid: payout.paid,
                retained: payout.retained,
                block_height,
            });
            Ok(payout.paid)
        })
    }

    // ============ Tokens ============

    /// Credit underlying to `to`, standing in for the external token's issuance
    pub fn fund_underlying(&mut self, to: Address, amount: u128) -> UnionResult<()> {
        self.execute(|s| s.dai.mint(&to, amount))
    }

    /// Credit UNION to `to`, standing in for the external token's issuance
    pub fn fund_union(&mut self, to: Address, amount: u128) -> UnionResult<()> {
        self.execute(|s| s.union_token.mint(&to, amount))
    }

    /// Approve `spender` over `owner`'s UNION
    pub fn approve_union(&mut self, owner: Address, spender: Address, amount: u128) -> UnionResult<()> {
        self.execute(|s| s.union_token.approve(&owner, &spender, amount))
    }

    /// Signed approval over `owner`'s UNION; signature checks happen upstream
    pub fn permit_union(
        &mut self,
        owner: Address,
        spender: Address,
        value: u128,
        deadline: u64,
        nonce: u64,
    ) -> UnionResult<()> {
        self.execute(|s| {
            let now = s.clock.timestamp;
            s.union_token.permit(&owner, &spender, value, deadline, nonce, now)
        })
    }

    // ============ Time ============

    /// Mine `n` blocks
    pub fn advance_blocks(&mut self, n: u64) {
        self.state.clock.advance_blocks(n);
    }

    /// Let `seconds` pass without mining
    pub fn advance_time(&mut self, seconds: u64) {
        self.state.clock.advance_time(seconds);
    }

    // ============ Views ============

    /// Full state, read-only
    pub fn state(&self) -> &ProtocolState {
        &self.state
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.state.config
    }

    pub fn clock(&self) -> &Clock {
        &self.state.clock
    }

    pub fn accounts(&self) -> &SystemAccounts {
        &self.state.accounts
    }

    /// Current accrual unit
    pub fn now(&self) -> u64 {
        self.state.now()
    }

    pub fn is_paused(&self) -> bool {
        self.state.is_paused
    }

    pub fn has_role(&self, account: &Address, role: Role) -> bool {
        self.state.access.has_role(account, role)
    }

    pub fn events(&self) -> &EventLog {
        &self.state.events
    }

    /// Hand the collected events to an indexer and clear the log
    pub fn drain_events(&mut self) -> Vec<UnionEvent> {
        core::mem::take(&mut self.state.events).into_events()
    }

    pub fn is_member(&self, account: &Address) -> bool {
        self.state.user_manager.is_member(account)
    }

    pub fn get_credit_limit(&self, borrower: &Address) -> u128 {
        self.state.user_manager.credit_limit(borrower)
    }

    pub fn get_locked_stake(&self, staker: &Address, borrower: &Address) -> u128 {
        self.state.user_manager.locked_stake(staker, borrower)
    }

    pub fn get_total_locked_stake(&self, staker: &Address) -> u128 {
        self.state.user_manager.total_locked_stake(staker)
    }

    pub fn get_staker_balance(&self, staker: &Address) -> u128 {
        self.state.user_manager.staker_balance(staker)
    }

    pub fn total_staked(&self) -> u128 {
        self.state.user_manager.total_staked
    }

    /// Stake of `staker` backing overdue borrowers
    pub fn get_total_frozen(&self, staker: &Address) -> u128 {
        self.state.stake_snapshot(staker).frozen
    }

    pub fn get_vouch(&self, staker: &Address, borrower: &Address) -> Option<&Vouch> {
        self.state.user_manager.get_vouch(staker, borrower)
    }

    pub fn vouchers_of(&self, borrower: &Address) -> &[Vouch] {
        self.state.user_manager.vouchers_of(borrower)
    }

    pub fn vouchees_of(&self, staker: &Address) -> &[Vouchee] {
        self.state.user_manager.vouchees_of(staker)
    }

    pub fn check_is_overdue(&self, borrower: &Address) -> bool {
        self.state.is_overdue(borrower)
    }

    /// Debt including interest up to now, without accruing
    pub fn borrow_balance_view(&self, borrower: &Address) -> UnionResult<u128> {
        let cash = self.state.loanable()?;
        self.state
            .utoken
            .borrow_balance_view(borrower, self.now(), cash)
    }

    pub fn get_borrowed(&self, borrower: &Address) -> u128 {
        self.state.utoken.get_borrowed(borrower)
    }

    pub fn get_last_repay(&self, borrower: &Address) -> u64 {
        self.state.utoken.get_last_repay(borrower)
    }

    pub fn get_remaining_debt_ceiling(&self) -> u128 {
        self.state.utoken.remaining_debt_ceiling(&self.state.config)
    }

    pub fn calculating_fee(&self, amount: u128) -> UnionResult<u128> {
        UTokenState::calculating_fee(&self.state.config, amount)
    }

    pub fn exchange_rate_stored(&self) -> UnionResult<u128> {
        self.state.utoken.exchange_rate_stored(&self.state.config)
    }

    /// Current borrow rate per unit
    pub fn borrow_rate_per_unit(&self) -> UnionResult<u128> {
        let cash = self.state.loanable()?;
        self.state.utoken.borrow_rate_per_unit(cash)
    }

    /// Current lender rate per unit
    pub fn supply_rate_per_unit(&self) -> UnionResult<u128> {
        let cash = self.state.loanable()?;
        self.state
            .utoken
            .supply_rate_per_unit(&self.state.config, cash)
    }

    pub fn total_reserves(&self) -> u128 {
        self.state.utoken.total_reserves
    }

    pub fn total_borrows(&self) -> u128 {
        self.state.utoken.total_borrows
    }

    /// Accrued plus pending rewards of `account`
    pub fn calculate_rewards(&self, account: &Address) -> UnionResult<u128> {
        let snapshot = self.state.stake_snapshot(account);
        let total = self.state.total_effective()?;
        self.state
            .comptroller
            .calculate_rewards(&self.state.config, account, &snapshot, self.now(), total)
    }

    pub fn get_rewards_multiplier(&self, account: &Address) -> UnionResult<u128> {
        self.state.stake_snapshot(account).multiplier()
    }

    pub fn pool_balance(&self) -> UnionResult<u128> {
        self.state
            .asset_manager
            .pool_balance(&self.state.dai, self.now())
    }

    pub fn loanable_amount(&self) -> UnionResult<u128> {
        self.state.loanable()
    }

    pub fn adapter_ids(&self) -> Vec<Address> {
        self.state.asset_manager.adapter_ids()
    }

    pub fn withdraw_sequence(&self) -> &[Address] {
        self.state.asset_manager.withdraw_sequence()
    }

    pub fn underlying_balance(&self, account: &Address) -> u128 {
        self.state.dai.balance_of(account)
    }

    pub fn union_balance(&self, account: &Address) -> u128 {
        self.state.union_token.balance_of(account)
    }

    pub fn utoken_balance(&self, account: &Address) -> u128 {
        self.state.utoken.receipts.balance_of(account)
    }

    pub fn check_invariants(&self) -> UnionResult<()> {
        self.state.check_invariants()
    }

    // ============ Snapshots ============

    /// Borsh encoding of the whole state
    pub fn snapshot(&self) -> UnionResult<Vec<u8>> {
        borsh::to_vec(&self.state).map_err(|_| UnionError::InvalidParameter {
            param: "snapshot",
            reason: "failed to encode state",
        })
    }

    /// Rebuild a protocol from `snapshot` output
    pub fn restore(bytes: &[u8]) -> UnionResult<Self> {
        let state: ProtocolState = borsh::from_slice(bytes).map_err(|_| UnionError::InvalidParameter {
            param: "snapshot",
            reason: "malformed snapshot",
        })?;
        state.config.validate()?;
        Ok(Self { state })
    }

    /// SHA-256 commitment to the encoded state
    pub fn state_digest(&self) -> UnionResult<[u8; 32]> {
        let bytes = self.snapshot()?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let result = hasher.finalize();
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&result);
        Ok(digest)
    }
}

impl ProtocolState {
    fn repay(&mut self, payer: Address, borrower: Address, amount: u128) -> UnionResult<()> {
        self.settle_backers(&borrower)?;

        let now = self.now();
        let receipt = self.utoken.repay(&self.config, &borrower, amount, now)?;

        let block_height = self.block();
        self.user_manager
            .update_locked(&borrower, receipt.principal_paid, false, block_height)?;
        let via = self.accounts.utoken;
        self.pull(&payer, &via, receipt.total())?;

        self.emit(UnionEvent::LogRepay {
            payer,
            borrower,
            interest_paid: receipt.interest_paid,
            principal_paid: receipt.principal_paid,
            block_height,
        });
        Ok(())
    }

    fn finish_redeem(&mut self, lender: Address, underlying: u128, utokens: u128) -> UnionResult<()> {
        self.require_loanable(underlying)?;
        let via = self.accounts.utoken;
        self.push(&via, &lender, underlying)?;

        let block_height = self.block();
        self.emit(UnionEvent::LogRedeem {
            lender,
            underlying,
            utokens,
            block_height,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use union_common::constants::token::ONE;

    fn admin() -> [u8; 32] {
        [1u8; 32]
    }

    fn staker() -> [u8; 32] {
        [2u8; 32]
    }

    fn borrower() -> [u8; 32] {
        [3u8; 32]
    }

    fn protocol() -> Protocol {
        Protocol::new(admin(), ProtocolConfig::default()).unwrap()
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = ProtocolConfig {
            half_decay_point: 0,
            ..ProtocolConfig::default()
        };
        assert!(Protocol::new(admin(), config).is_err());
        assert_eq!(
            Protocol::new([0u8; 32], ProtocolConfig::default()),
            Err(UnionError::AddressZero)
        );
    }

    #[test]
    fn test_admin_holds_every_role() {
        let protocol = protocol();
        assert!(protocol.has_role(&admin(), Role::Admin));
        assert!(protocol.has_role(&admin(), Role::MemberManager));
        assert!(protocol.has_role(&admin(), Role::Guardian));
    }

    #[test]
    fn test_failed_operation_leaves_no_trace() {
        let mut protocol = protocol();
        protocol.add_member(admin(), staker()).unwrap();
        protocol.fund_underlying(staker(), 10 * ONE).unwrap();
        let digest = protocol.state_digest().unwrap();
        let events = protocol.events().len();

        // Within the stake cap, beyond the wallet
        assert!(matches!(
            protocol.stake(staker(), 20 * ONE),
            Err(UnionError::InsufficientBalance { .. })
        ));
        assert_eq!(protocol.state_digest().unwrap(), digest);
        assert_eq!(protocol.events().len(), events);
    }

    #[test]
    fn test_stake_routes_through_asset_manager() {
        let mut protocol = protocol();
        protocol.add_member(admin(), staker()).unwrap();
        protocol.fund_underlying(staker(), 100 * ONE).unwrap();

        protocol.stake(staker(), 60 * ONE).unwrap();
        assert_eq!(protocol.total_staked(), 60 * ONE);
        assert_eq!(protocol.pool_balance().unwrap(), 60 * ONE);
        assert_eq!(protocol.loanable_amount().unwrap(), 0);
        assert_eq!(protocol.underlying_balance(&staker()), 40 * ONE);
        assert_eq!(protocol.underlying_balance(&protocol.accounts().user_manager), 0);
    }

    #[test]
    fn test_borrow_requires_membership() {
        let mut protocol = protocol();
        assert_eq!(
            protocol.borrow(borrower(), ONE),
            Err(UnionError::CallerNotMember { caller: borrower() })
        );
    }

    #[test]
    fn test_snapshot_restore() {
        let mut protocol = protocol();
        protocol.add_member(admin(), staker()).unwrap();
        protocol.fund_underlying(staker(), 100 * ONE).unwrap();
        protocol.stake(staker(), 60 * ONE).unwrap();
        protocol.advance_blocks(10);

        let bytes = protocol.snapshot().unwrap();
        let restored = Protocol::restore(&bytes).unwrap();
        assert_eq!(restored, protocol);
        assert_eq!(restored.state_digest().unwrap(), protocol.state_digest().unwrap());

        assert!(Protocol::restore(&bytes[..bytes.len() / 2]).is_err());
    }

    #[test]
    fn test_drain_events() {
        let mut protocol = protocol();
        protocol.add_member(admin(), staker()).unwrap();
        let drained = protocol.drain_events();
        assert_eq!(drained.len(), 1);
        assert!(protocol.events().is_empty());
    }
}
