//! Core Types for the Union Credit Ledger
//!
//! Fundamental aliases and helpers shared by every component crate.

use sha2::{Digest, Sha256};

/// Type alias for addresses (32-byte identifiers)
pub type Address = [u8; 32];

/// Token amount in 18-decimal fixed point
pub type Amount = u128;

/// Block height
pub type BlockNumber = u64;

/// The zero address, never a valid participant
pub const ZERO_ADDRESS: Address = [0u8; 32];

/// Returns true for the zero address
pub fn is_zero_address(address: &Address) -> bool {
    *address == ZERO_ADDRESS
}

/// Fails with `AddressZero` for the zero address
pub fn require_address(address: &Address) -> crate::UnionResult<()> {
    if is_zero_address(address) {
        return Err(crate::UnionError::AddressZero);
    }
    Ok(())
}

/// Derive a deterministic account address from a label
///
/// Used for the protocol's own custody accounts (user manager, uToken,
/// asset manager, comptroller) so that every instance built from the same
/// labels agrees on them.
pub fn derive_address(label: &[u8]) -> Address {
    let mut hasher = Sha256::new();
    hasher.update(b"union-ledger/account/");
    hasher.update(label);
    let result = hasher.finalize();
    let mut address = [0u8; 32];
    address.copy_from_slice(&result);
    address
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_address_deterministic() {
        let a = derive_address(b"user-manager");
        let b = derive_address(b"user-manager");
        let c = derive_address(b"utoken");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(!is_zero_address(&a));
    }

    #[test]
    fn test_require_address() {
        assert_eq!(require_address(&ZERO_ADDRESS), Err(crate::UnionError::AddressZero));
        assert!(require_address(&[7u8; 32]).is_ok());
    }
}
