//! Token Operations Module
//!
//! ERC20-style ledger used for the underlying (DAI), the UNION reward token
//! and the uToken receipt token.
//!
//! ## Key Features
//!
//! - **Transfers**: `transfer` and allowance-based `transfer_from`
//! - **Approvals**: `approve` and deadline/nonce-checked `permit`
//! - **Supply Tracking**: `mint`/`burn` keep total supply consistent
//!
//! Signature checking for `permit` belongs to the wallet layer; the ledger
//! only enforces deadline and nonce ordering.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::types::{require_address, Address};
use crate::{BTreeMap, UnionError, UnionResult};

/// In-memory ERC20 ledger
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct TokenLedger {
    /// Token symbol
    pub symbol: crate::String,
    /// Balances by owner
    balances: BTreeMap<Address, u128>,
    /// Allowances by (owner, spender)
    allowances: BTreeMap<(Address, Address), u128>,
    /// Permit nonces by owner
    nonces: BTreeMap<Address, u64>,
    /// Total supply
    total_supply: u128,
}

impl TokenLedger {
    /// Create an empty ledger
    pub fn new(symbol: &str) -> Self {
        Self {
            symbol: symbol.into(),
            ..Self::default()
        }
    }

    /// Balance of an owner
    pub fn balance_of(&self, owner: &Address) -> u128 {
        self.balances.get(owner).copied().unwrap_or(0)
    }

    /// Remaining allowance of `spender` over `owner`'s balance
    pub fn allowance(&self, owner: &Address, spender: &Address) -> u128 {
        self.allowances.get(&(*owner, *spender)).copied().unwrap_or(0)
    }

    /// Current permit nonce of an owner
    pub fn nonce_of(&self, owner: &Address) -> u64 {
        self.nonces.get(owner).copied().unwrap_or(0)
    }

    /// Total supply
    pub fn total_supply(&self) -> u128 {
        self.total_supply
    }

    /// Move `amount` from `from` to `to`
    pub fn transfer(&mut self, from: &Address, to: &Address, amount: u128) -> UnionResult<()> {
        require_address(from)?;
        require_address(to)?;

        let from_balance = self.balance_of(from);
        if from_balance < amount {
            return Err(UnionError::InsufficientBalance {
                available: from_balance,
                requested: amount,
            });
        }
        if from == to || amount == 0 {
            return Ok(());
        }

        let to_balance = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(UnionError::Overflow)?;
        self.balances.insert(*from, from_balance - amount);
        self.balances.insert(*to, to_balance);
        Ok(())
    }

    /// Move `amount` from `from` to `to` on behalf of `spender`
    pub fn transfer_from(
        &mut self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> UnionResult<()> {
        if spender != from {
            let allowed = self.allowance(from, spender);
            if allowed < amount {
                return Err(UnionError::InsufficientAllowance {
                    available: allowed,
                    requested: amount,
                });
            }
            // Unlimited approvals are never decremented
            if allowed != u128::MAX {
                self.allowances.insert((*from, *spender), allowed - amount);
            }
        }
        self.transfer(from, to, amount)
    }

    /// Set `spender`'s allowance over `owner`'s balance
    pub fn approve(&mut self, owner: &Address, spender: &Address, amount: u128) -> UnionResult<()> {
        require_address(owner)?;
        require_address(spender)?;
        self.allowances.insert((*owner, *spender), amount);
        Ok(())
    }

    /// Gasless approval: the caller has already verified the owner's signature
    pub fn permit(
        &mut self,
        owner: &Address,
        spender: &Address,
        value: u128,
        deadline: u64,
        nonce: u64,
        now: u64,
    ) -> UnionResult<()> {
        if now > deadline {
            return Err(UnionError::PermitExpired { deadline, now });
        }
        let expected = self.nonce_of(owner);
        if nonce != expected {
            return Err(UnionError::InvalidNonce { expected, actual: nonce });
        }
        self.approve(owner, spender, value)?;
        self.nonces.insert(*owner, expected + 1);
        Ok(())
    }

    /// Create `amount` new tokens for `to`
    pub fn mint(&mut self, to: &Address, amount: u128) -> UnionResult<()> {
        require_address(to)?;
        let supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(UnionError::Overflow)?;
        let balance = self.balance_of(to).checked_add(amount).ok_or(UnionError::Overflow)?;
        self.total_supply = supply;
        self.balances.insert(*to, balance);
        Ok(())
    }

    /// Destroy `amount` tokens held by `from`
    pub fn burn(&mut self, from: &Address, amount: u128) -> UnionResult<()> {
        let balance = self.balance_of(from);
        if balance < amount {
            return Err(UnionError::InsufficientBalance {
                available: balance,
                requested: amount,
            });
        }
        self.balances.insert(*from, balance - amount);
        self.total_supply -= amount;
        Ok(())
    }

    /// Destroy `amount` of `from`'s tokens using `spender`'s allowance
    pub fn burn_from(&mut self, spender: &Address, from: &Address, amount: u128) -> UnionResult<()> {
        if spender != from {
            let allowed = self.allowance(from, spender);
            if allowed < amount {
                return Err(UnionError::InsufficientAllowance {
                    available: allowed,
                    requested: amount,
                });
            }
            if allowed != u128::MAX {
                self.allowances.insert((*from, *spender), allowed - amount);
            }
        }
        self.burn(from, amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_owner() -> [u8; 32] {
        [1u8; 32]
    }

    fn test_recipient() -> [u8; 32] {
        [2u8; 32]
    }

    fn test_spender() -> [u8; 32] {
        [3u8; 32]
    }

    fn funded_ledger() -> TokenLedger {
        let mut ledger = TokenLedger::new("DAI");
        ledger.mint(&test_owner(), 1_000).unwrap();
        ledger
    }

    #[test]
    fn test_transfer() {
        let mut ledger = funded_ledger();
        ledger.transfer(&test_owner(), &test_recipient(), 400).unwrap();

        assert_eq!(ledger.balance_of(&test_owner()), 600);
        assert_eq!(ledger.balance_of(&test_recipient()), 400);
        assert_eq!(ledger.total_supply(), 1_000);
    }

    #[test]
    fn test_transfer_insufficient_balance() {
        let mut ledger = funded_ledger();
        let result = ledger.transfer(&test_owner(), &test_recipient(), 1_001);

        assert_eq!(
            result,
            Err(UnionError::InsufficientBalance { available: 1_000, requested: 1_001 })
        );
    }

    #[test]
    fn test_transfer_to_zero_address() {
        let mut ledger = funded_ledger();
        assert_eq!(
            ledger.transfer(&test_owner(), &[0u8; 32], 1),
            Err(UnionError::AddressZero)
        );
    }

    #[test]
    fn test_transfer_from_uses_allowance() {
        let mut ledger = funded_ledger();
        ledger.approve(&test_owner(), &test_spender(), 300).unwrap();

        ledger
            .transfer_from(&test_spender(), &test_owner(), &test_recipient(), 200)
            .unwrap();
        assert_eq!(ledger.allowance(&test_owner(), &test_spender()), 100);

        let result = ledger.transfer_from(&test_spender(), &test_owner(), &test_recipient(), 200);
        assert_eq!(
            result,
            Err(UnionError::InsufficientAllowance { available: 100, requested: 200 })
        );
    }

    #[test]
    fn test_unlimited_allowance_not_decremented() {
        let mut ledger = funded_ledger();
        ledger.approve(&test_owner(), &test_spender(), u128::MAX).unwrap();
        ledger
            .transfer_from(&test_spender(), &test_owner(), &test_recipient(), 500)
            .unwrap();

        assert_eq!(ledger.allowance(&test_owner(), &test_spender()), u128::MAX);
    }

    #[test]
    fn test_permit() {
        let mut ledger = funded_ledger();
        ledger
            .permit(&test_owner(), &test_spender(), 50, 100, 0, 90)
            .unwrap();
        assert_eq!(ledger.allowance(&test_owner(), &test_spender()), 50);
        assert_eq!(ledger.nonce_of(&test_owner()), 1);

        // Replaying the same nonce fails
        assert_eq!(
            ledger.permit(&test_owner(), &test_spender(), 50, 100, 0, 90),
            Err(UnionError::InvalidNonce { expected: 1, actual: 0 })
        );
        // Expired deadline fails
        assert_eq!(
            ledger.permit(&test_owner(), &test_spender(), 50, 100, 1, 101),
            Err(UnionError::PermitExpired { deadline: 100, now: 101 })
        );
    }

    #[test]
    fn test_burn() {
        let mut ledger = funded_ledger();
        ledger.burn(&test_owner(), 250).unwrap();

        assert_eq!(ledger.balance_of(&test_owner()), 750);
        assert_eq!(ledger.total_supply(), 750);
        assert!(ledger.burn(&test_owner(), 751).is_err());
    }

    #[test]
    fn test_burn_from() {
        let mut ledger = funded_ledger();
        ledger.approve(&test_owner(), &test_spender(), 10).unwrap();

        assert!(ledger.burn_from(&test_spender(), &test_owner(), 11).is_err());
        ledger.burn_from(&test_spender(), &test_owner(), 10).unwrap();
        assert_eq!(ledger.total_supply(), 990);
    }
}
