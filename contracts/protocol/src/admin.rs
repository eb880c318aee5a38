//! Administrative Surface
//!
//! Role-gated operations: parameter setters, membership grants, pausing,
//! adapter management and reserve withdrawal. Each one runs atomically like
//! the user operations and leaves an event behind.
//!
//! Parameter changes first bring interest and the reward index up to date
//! so the old value governs everything that happened before the change.

use union_asset_manager::{adapters::MoneyMarketAdapter, Adapter};
use union_common::{
    types::{require_address, Address},
    ParamKind, Permission, ProtocolConfig, Role, UnionEvent, UnionResult, Vec,
};
use union_utoken::InterestRateModel;

use crate::{Protocol, ProtocolState};

impl ProtocolState {
    /// Accrue, checkpoint rewards, apply `change`, validate and log it
    fn update_param<F>(&mut self, caller: &Address, param: ParamKind, change: F) -> UnionResult<()>
    where
        F: FnOnce(&mut ProtocolConfig) -> (u128, u128),
    {
        self.access.require(caller, Permission::UpdateParams)?;
        self.accrue_interest()?;
        self.checkpoint_rewards()?;

        let (old_value, new_value) = change(&mut self.config);
        self.config.validate()?;

        let block_height = self.block();
        self.emit(UnionEvent::LogParameterUpdated {
            param,
            old_value,
            new_value,
            block_height,
        });
        Ok(())
    }
}

macro_rules! param_setter {
    ($(#[$doc:meta])* $name:ident, $field:ident, $kind:expr, $ty:ty) => {
        $(#[$doc])*
        pub fn $name(&mut self, caller: Address, value: $ty) -> UnionResult<()> {
            self.execute(|s| {
                s.update_param(&caller, $kind, |config| {
                    let old = core::mem::replace(&mut config.$field, value);
                    (old as u128, value as u128)
                })
            })
        }
    };
}

impl Protocol {
    // ============ Pause ============

    /// Halt stake, borrow, mint and redeem
    pub fn pause(&mut self, caller: Address) -> UnionResult<()> {
        self.execute(|s| {
            s.access.require(&caller, Permission::Pause)?;
            s.is_paused = true;
            let block_height = s.block();
            s.emit(UnionEvent::LogPaused {
                by: caller,
                block_height,
            });
            Ok(())
        })
    }

    pub fn unpause(&mut self, caller: Address) -> UnionResult<()> {
        self.execute(|s| {
            s.access.require(&caller, Permission::Unpause)?;
            s.is_paused = false;
            let block_height = s.block();
            s.emit(UnionEvent::LogUnpaused {
                by: caller,
                block_height,
            });
            Ok(())
        })
    }

    // ============ Membership ============

    /// Admit `member` without backers or fee
    pub fn add_member(&mut self, caller: Address, member: Address) -> UnionResult<()> {
        self.execute(|s| {
            s.access.require(&caller, Permission::AddMember)?;
            s.user_manager.add_member(member)?;
            let block_height = s.block();
            s.emit(UnionEvent::LogAddMember {
                member,
                block_height,
            });
            Ok(())
        })
    }

    // ============ Parameters ============

    param_setter!(
        /// Per-staker stake cap
        set_max_stake_amount, max_stake_amount, ParamKind::MaxStakeAmount, u128
    );
    param_setter!(
        /// UNION burned by `register_member`
        set_new_member_fee, new_member_fee, ParamKind::NewMemberFee, u128
    );
    param_setter!(
        /// Units without repayment before a borrower is overdue
        set_overdue_blocks, overdue_blocks, ParamKind::OverdueBlocks, u64
    );
    param_setter!(
        /// Grace after overdue before anyone may write off
        set_max_overdue_blocks, max_overdue_blocks, ParamKind::MaxOverdueBlocks, u64
    );
    param_setter!(
        /// Backers required to register (and to borrow when enforced)
        set_effective_count, effective_count, ParamKind::EffectiveCount, u32
    );
    param_setter!(set_max_vouchers, max_vouchers, ParamKind::MaxVouchers, u32);
    param_setter!(set_max_vouchees, max_vouchees, ParamKind::MaxVouchees, u32);
    param_setter!(
        /// Fee added to each draw, WAD scaled
        set_origination_fee, origination_fee, ParamKind::OriginationFee, u128
    );
    param_setter!(set_debt_ceiling, debt_ceiling, ParamKind::DebtCeiling, u128);
    param_setter!(set_min_borrow, min_borrow, ParamKind::MinBorrow, u128);
    param_setter!(set_max_borrow, max_borrow, ParamKind::MaxBorrow, u128);
    param_setter!(
        /// Share of repaid interest kept as reserves, WAD scaled
        set_reserve_factor, reserve_factor, ParamKind::ReserveFactor, u128
    );
    param_setter!(
        /// Effective stake at which the reward rate halves
        set_half_decay_point, half_decay_point, ParamKind::HalfDecayPoint, u128
    );

    /// Replace the interest rate model; debt accrues under the old one first
    pub fn set_interest_rate_model(&mut self, caller: Address, model: InterestRateModel) -> UnionResult<()> {
        self.execute(|s| {
            let base = model.base_rate();
            s.update_param(&caller, ParamKind::InterestRate, |config| {
                let old = core::mem::replace(&mut config.interest_rate_per_unit, base);
                (old, base)
            })?;
            s.utoken.set_rate_model(model)?;
            Ok(())
        })
    }

    /// Rebind the account that fronts debt and lender flows
    ///
    /// Underlying parked on the old account moves with it.
    pub fn set_utoken(&mut self, caller: Address, utoken: Address) -> UnionResult<()> {
        self.execute(|s| {
            s.access.require(&caller, Permission::UpdateParams)?;
            require_address(&utoken)?;

            let old = s.accounts.utoken;
            let parked = s.dai.balance_of(&old);
            if parked > 0 {
                s.dai.transfer(&old, &utoken, parked)?;
            }
            s.accounts.utoken = utoken;

            let block_height = s.block();
            s.emit(UnionEvent::LogSetUToken {
                old,
                new: utoken,
                block_height,
            });
            Ok(())
        })
    }

    // ============ Asset Manager ============

    pub fn add_adapter(&mut self, caller: Address, adapter: Adapter) -> UnionResult<()> {
        self.execute(|s| {
            s.access.require(&caller, Permission::ManageAdapters)?;
            let id = adapter.id();
            s.asset_manager.add_adapter(adapter)?;
            let block_height = s.block();
            s.emit(UnionEvent::LogAddAdapter {
                adapter: id,
                block_height,
            });
            Ok(())
        })
    }

    /// Unregister an empty adapter
    pub fn remove_adapter(&mut self, caller: Address, adapter: Address) -> UnionResult<()> {
        self.execute(|s| {
            s.access.require(&caller, Permission::ManageAdapters)?;
            let now = s.now();
            s.asset_manager.remove_adapter(&s.dai, &adapter, now)?;
            let block_height = s.block();
            s.emit(UnionEvent::LogRemoveAdapter {
                adapter,
                block_height,
            });
            Ok(())
        })
    }

    /// Order in which adapters are drained on withdrawal
    pub fn set_withdraw_sequence(&mut self, caller: Address, sequence: Vec<Address>) -> UnionResult<()> {
        self.execute(|s| {
            s.access.require(&caller, Permission::ManageAdapters)?;
            s.asset_manager.set_withdraw_sequence(sequence.clone())?;
            let block_height = s.block();
            s.emit(UnionEvent::LogWithdrawSequence {
                sequence,
                block_height,
            });
            Ok(())
        })
    }

    pub fn set_floor_ceiling(
        &mut self,
        caller: Address,
        adapter: Address,
        floor: u128,
        ceiling: u128,
    ) -> UnionResult<()> {
        self.execute(|s| {
            s.access.require(&caller, Permission::ManageAdapters)?;
            let (old_floor, old_ceiling) = s.asset_manager.set_floor_ceiling(&adapter, floor, ceiling)?;

            let block_height = s.block();
            s.emit(UnionEvent::LogParameterUpdated {
                param: ParamKind::AdapterFloor,
                old_value: old_floor,
                new_value: floor,
                block_height,
            });
            s.emit(UnionEvent::LogParameterUpdated {
                param: ParamKind::AdapterCeiling,
                old_value: old_ceiling,
                new_value: ceiling,
                block_height,
            });
            Ok(())
        })
    }

    /// Redistribute pool funds across adapters by basis-point weights
    pub fn rebalance(&mut self, caller: Address, weights_bps: Vec<u32>) -> UnionResult<()> {
        self.execute(|s| {
            s.access.require(&caller, Permission::ManageAdapters)?;
            let now = s.now();
            s.asset_manager.rebalance(&mut s.dai, &weights_bps, now)?;
            let block_height = s.block();
            s.emit(UnionEvent::LogRebalance {
                weights_bps,
                block_height,
            });
            Ok(())
        })
    }

    // ============ Reserves ============

    /// Send `amount` of reserves to `to`
    pub fn remove_reserves(&mut self, caller: Address, to: Address, amount: u128) -> UnionResult<()> {
        self.execute(|s| {
            s.access.require(&caller, Permission::ManageReserves)?;
            require_address(&to)?;
            s.accrue_interest()?;

            let new_total = s.utoken.remove_reserves(amount)?;
            s.require_loanable(amount)?;
            let via = s.accounts.utoken;
            s.push(&via, &to, amount)?;

            let block_height = s.block();
            s.emit(UnionEvent::LogReservesRemoved {
                to,
                amount,
                new_total,
                block_height,
            });
            Ok(())
        })
    }

    // ============ Roles ============

    pub fn grant_role(&mut self, caller: Address, account: Address, role: Role) -> UnionResult<()> {
        self.execute(|s| {
            if s.access.grant_role(&caller, account, role)? {
                let block_height = s.block();
                s.emit(UnionEvent::LogRoleGranted {
                    account,
                    role: role.id(),
                    block_height,
                });
            }
            Ok(())
        })
    }

    pub fn revoke_role(&mut self, caller: Address, account: Address, role: Role) -> UnionResult<()> {
        self.execute(|s| {
            if s.access.revoke_role(&caller, account, role)? {
                let block_height = s.block();
                s.emit(UnionEvent::LogRoleRevoked {
                    account,
                    role: role.id(),
                    block_height,
                });
            }
            Ok(())
        })
    }
}
