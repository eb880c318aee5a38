//! Money Market Adapters
//!
//! Each adapter holds its funds on the underlying token ledger under its own
//! address (its id). `PureTokenAdapter` just holds; `AaveAdapter` simulates
//! an interest-bearing deposit whose yield is minted to the adapter when it
//! is next touched.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use union_common::{
    constants::adapters::{DEFAULT_CEILING, DEFAULT_FLOOR},
    math::{safe_add, wad_mul},
    types::{require_address, Address},
    TokenLedger, UnionError, UnionResult,
};

/// Operations the asset manager needs from a money market
pub trait MoneyMarketAdapter {
    /// Stable identifier, also the custody address
    fn id(&self) -> Address;

    /// Balance the adapter tries to keep at minimum
    fn floor(&self) -> u128;

    /// Balance above which the adapter takes no deposits
    fn ceiling(&self) -> u128;

    /// Yield per unit, WAD scaled
    fn rate(&self) -> u128;

    /// Balance including yield not yet realized
    fn supply(&self, ledger: &TokenLedger, now: u64) -> UnionResult<u128>;

    /// Realize pending yield; returns the amount minted
    fn accrue(&mut self, ledger: &mut TokenLedger, now: u64) -> UnionResult<u128>;

    /// Move `amount` from `from` into the adapter
    fn deposit(&mut self, ledger: &mut TokenLedger, from: &Address, amount: u128, now: u64) -> UnionResult<()> {
        self.accrue(ledger, now)?;
        ledger.transfer(from, &self.id(), amount)
    }

    /// Move `amount` out of the adapter to `to`
    fn withdraw(&mut self, ledger: &mut TokenLedger, to: &Address, amount: u128, now: u64) -> UnionResult<()> {
        self.accrue(ledger, now)?;
        let held = ledger.balance_of(&self.id());
        if amount > held {
            return Err(UnionError::InsufficientFundsLeft {
                available: held,
                requested: amount,
            });
        }
        ledger.transfer(&self.id(), to, amount)
    }

    /// Change the target band
    fn set_floor_ceiling(&mut self, floor: u128, ceiling: u128) -> UnionResult<()>;
}

// ============ Pure Token ============

/// Holds funds without yield
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct PureTokenAdapter {
    pub id: Address,
    pub floor: u128,
    pub ceiling: u128,
}

impl PureTokenAdapter {
    pub fn new(id: Address) -> UnionResult<Self> {
        require_address(&id)?;
        Ok(Self {
            id,
            floor: DEFAULT_FLOOR,
            ceiling: DEFAULT_CEILING,
        })
    }
}

impl MoneyMarketAdapter for PureTokenAdapter {
    fn id(&self) -> Address {
        self.id
    }

    fn floor(&self) -> u128 {
        self.floor
    }

    fn ceiling(&self) -> u128 {
        self.ceiling
    }

    fn rate(&self) -> u128 {
        0
    }

    fn supply(&self, ledger: &TokenLedger, _now: u64) -> UnionResult<u128> {
        Ok(ledger.balance_of(&self.id))
    }

    fn accrue(&mut self, _ledger: &mut TokenLedger, _now: u64) -> UnionResult<u128> {
        Ok(0)
    }

    fn set_floor_ceiling(&mut self, floor: u128, ceiling: u128) -> UnionResult<()> {
        validate_band(floor, ceiling)?;
        self.floor = floor;
        self.ceiling = ceiling;
        Ok(())
    }
}

// ============ Aave ============

/// Simulated lending-pool deposit earning a fixed liquidity rate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct AaveAdapter {
    pub id: Address,
    pub floor: u128,
    pub ceiling: u128,
    /// Yield per unit, WAD scaled
    pub liquidity_rate_per_unit: u128,
    /// Unit yield was last realized at
    pub last_accrued: u64,
}

impl AaveAdapter {
    pub fn new(id: Address, liquidity_rate_per_unit: u128, now: u64) -> UnionResult<Self> {
        require_address(&id)?;
        Ok(Self {
            id,
            floor: DEFAULT_FLOOR,
            ceiling: DEFAULT_CEILING,
            liquidity_rate_per_unit,
            last_accrued: now,
        })
    }

    fn pending_yield(&self, held: u128, now: u64) -> UnionResult<u128> {
        if now <= self.last_accrued || held == 0 {
            return Ok(0);
        }
        let elapsed = (now - self.last_accrued) as u128;
        let factor = self
            .liquidity_rate_per_unit
            .checked_mul(elapsed)
            .ok_or(UnionError::Overflow)?;
        wad_mul(held, factor)
    }
}

impl MoneyMarketAdapter for AaveAdapter {
    fn id(&self) -> Address {
        self.id
    }

    fn floor(&self) -> u128 {
        self.floor
    }

    fn ceiling(&self) -> u128 {
        self.ceiling
    }

    fn rate(&self) -> u128 {
        self.liquidity_rate_per_unit
    }

    fn supply(&self, ledger: &TokenLedger, now: u64) -> UnionResult<u128> {
        let held = ledger.balance_of(&self.id);
        safe_add(held, self.pending_yield(held, now)?)
    }

    fn accrue(&mut self, ledger: &mut TokenLedger, now: u64) -> UnionResult<u128> {
        let interest = self.pending_yield(ledger.balance_of(&self.id), now)?;
        if interest > 0 {
            ledger.mint(&self.id, interest)?;
        }
        if now > self.last_accrued {
            self.last_accrued = now;
        }
        Ok(interest)
    }

    fn set_floor_ceiling(&mut self, floor: u128, ceiling: u128) -> UnionResult<()> {
        validate_band(floor, ceiling)?;
        self.floor = floor;
        self.ceiling = ceiling;
        Ok(())
    }
}

fn validate_band(floor: u128, ceiling: u128) -> UnionResult<()> {
    if floor > ceiling {
        return Err(UnionError::InvalidParameter {
            param: "floor",
            reason: "must not exceed ceiling",
        });
    }
    Ok(())
}

// ============ Dispatch ============

/// Registered adapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum Adapter {
    Pure(PureTokenAdapter),
    Aave(AaveAdapter),
}

impl Adapter {
    fn inner(&self) -> &dyn MoneyMarketAdapter {
        match self {
            Adapter::Pure(a) => a,
            Adapter::Aave(a) => a,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn MoneyMarketAdapter {
        match self {
            Adapter::Pure(a) => a,
            Adapter::Aave(a) => a,
        }
    }
}

impl MoneyMarketAdapter for Adapter {
    fn id(&self) -> Address {
        self.inner().id()
    }

    fn floor(&self) -> u128 {
        self.inner().floor()
    }

    fn ceiling(&self) -> u128 {
        self.inner().ceiling()
    }

    fn rate(&self) -> u128 {
        self.inner().rate()
    }

    fn supply(&self, ledger: &TokenLedger, now: u64) -> UnionResult<u128> {
        self.inner().supply(ledger, now)
    }

    fn accrue(&mut self, ledger: &mut TokenLedger, now: u64) -> UnionResult<u128> {
        self.inner_mut().accrue(ledger, now)
    }

    fn set_floor_ceiling(&mut self, floor: u128, ceiling: u128) -> UnionResult<()> {
        self.inner_mut().set_floor_ceiling(floor, ceiling)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use union_common::constants::token::ONE;

    fn vault() -> [u8; 32] {
        [7u8; 32]
    }

    fn adapter_id() -> [u8; 32] {
        [0xAA; 32]
    }

    fn funded_ledger() -> TokenLedger {
        let mut ledger = TokenLedger::new("DAI");
        ledger.mint(&vault(), 1_000 * ONE).unwrap();
        ledger
    }

    #[test]
    fn test_pure_adapter_holds() {
        let mut ledger = funded_ledger();
        let mut adapter = Adapter::Pure(PureTokenAdapter::new(adapter_id()).unwrap());

        adapter.deposit(&mut ledger, &vault(), 100 * ONE, 1).unwrap();
        assert_eq!(adapter.supply(&ledger, 1_000).unwrap(), 100 * ONE);

        adapter.withdraw(&mut ledger, &vault(), 40 * ONE, 1_000).unwrap();
        assert_eq!(ledger.balance_of(&adapter_id()), 60 * ONE);
        assert!(matches!(
            adapter.withdraw(&mut ledger, &vault(), 61 * ONE, 1_000),
            Err(UnionError::InsufficientFundsLeft { .. })
        ));
    }

    #[test]
    fn test_aave_adapter_yield() {
        let mut ledger = funded_ledger();
        // 0.1% per unit
        let mut adapter = Adapter::Aave(AaveAdapter::new(adapter_id(), ONE / 1_000, 1).unwrap());

        adapter.deposit(&mut ledger, &vault(), 100 * ONE, 1).unwrap();
        assert_eq!(adapter.supply(&ledger, 11).unwrap(), 101 * ONE);

        // Realized on touch
        assert_eq!(ledger.balance_of(&adapter_id()), 100 * ONE);
        assert_eq!(adapter.accrue(&mut ledger, 11).unwrap(), ONE);
        assert_eq!(ledger.balance_of(&adapter_id()), 101 * ONE);
        assert_eq!(adapter.accrue(&mut ledger, 11).unwrap(), 0);
    }

    #[test]
    fn test_band_validation() {
        let mut adapter = Adapter::Pure(PureTokenAdapter::new(adapter_id()).unwrap());
        assert!(adapter.set_floor_ceiling(10, 5).is_err());
        adapter.set_floor_ceiling(5, 10).unwrap();
        assert_eq!((adapter.floor(), adapter.ceiling()), (5, 10));
        assert_eq!(PureTokenAdapter::new([0u8; 32]), Err(UnionError::AddressZero));
    }
}
