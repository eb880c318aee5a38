//! Protocol Constants
//!
//! Default parameter values for the Union credit ledger. Deployments load a
//! `ProtocolConfig` (see `config`) whose `Default` is built from these.
//!
//! # Network Configuration
//!
//! Use feature flags to compile for different networks:
//! - `mainnet` - Production values (three backers, month-long overdue window)
//! - Default (no feature) - Test values (one backer, short windows)
//!
//! ```toml
//! # For mainnet deployment:
//! union-common = { path = "...", features = ["mainnet"] }
//! ```

/// Token Metadata
pub mod token {
    /// Decimal places of the underlying (DAI) and UNION tokens
    pub const DECIMALS: u8 = 18;
    /// One unit with decimals (1 DAI = 1e18 base units)
    pub const ONE: u128 = 1_000_000_000_000_000_000;
    /// uToken name
    pub const UTOKEN_NAME: &str = "uDAI";
}

/// Precision constants
pub mod precision {
    /// Fixed-point scale (1e18)
    pub const WAD: u128 = 1_000_000_000_000_000_000;

    /// Basis points denominator
    pub const BPS_DENOMINATOR: u128 = 10_000;
}

/// Membership and trust graph limits
pub mod membership {
    use super::token::ONE;

    /// Number of distinct backers required to register
    #[cfg(feature = "mainnet")]
    pub const EFFECTIVE_COUNT: u32 = 3;
    #[cfg(not(feature = "mainnet"))]
    pub const EFFECTIVE_COUNT: u32 = 1;

    /// Maximum incoming vouches per borrower
    pub const MAX_VOUCHERS: u32 = 400;

    /// Maximum outgoing vouches per staker
    pub const MAX_VOUCHEES: u32 = 400;

    /// Maximum stake per staker (10,000 DAI)
    pub const MAX_STAKE_AMOUNT: u128 = 10_000 * ONE;

    /// UNION burned to self-register (1 UNION)
    pub const NEW_MEMBER_FEE: u128 = ONE;

    /// Largest trust a single vouch can carry (96-bit)
    pub const MAX_TRUST_AMOUNT: u128 = (1u128 << 96) - 1;
}

/// Borrowing limits and fees
pub mod borrowing {
    use super::token::ONE;

    /// Origination fee (0.5%)
    pub const ORIGINATION_FEE: u128 = 5_000_000_000_000_000;

    /// Upper bound on the origination fee (5%)
    pub const ORIGINATION_FEE_MAX: u128 = 50_000_000_000_000_000;

    /// Global debt ceiling (250,000 DAI)
    pub const DEBT_CEILING: u128 = 250_000 * ONE;

    /// Maximum per-borrower debt (25,000 DAI)
    pub const MAX_BORROW: u128 = 25_000 * ONE;

    /// Minimum borrow (1 DAI)
    pub const MIN_BORROW: u128 = ONE;
}

/// Interest configuration
pub mod interest {
    /// Interest per time unit, WAD scaled (~10% APR at 12s blocks)
    pub const INTEREST_RATE_PER_UNIT: u128 = 38_051_750_380;

    /// Share of realized interest routed to reserves (50%)
    pub const RESERVE_FACTOR: u128 = 500_000_000_000_000_000;

    /// uToken exchange rate while supply is zero (1:1)
    pub const INITIAL_EXCHANGE_RATE: u128 = super::precision::WAD;

    /// Hard cap on any borrow rate per time unit (0.005%)
    pub const BORROW_RATE_MAX_PER_UNIT: u128 = 50_000_000_000_000;
}

/// Overdue windows
pub mod overdue {
    /// Units after the last repayment before debt is overdue
    #[cfg(feature = "mainnet")]
    pub const OVERDUE_BLOCKS: u64 = 216_000; // ~30 days at 12s blocks
    #[cfg(not(feature = "mainnet"))]
    pub const OVERDUE_BLOCKS: u64 = 100;

    /// Extra grace after overdue before third parties can write off
    #[cfg(feature = "mainnet")]
    pub const MAX_OVERDUE_BLOCKS: u64 = 216_000;
    #[cfg(not(feature = "mainnet"))]
    pub const MAX_OVERDUE_BLOCKS: u64 = 100;

    /// Seconds per block used by the clock when advancing blocks
    pub const SECONDS_PER_BLOCK: u64 = 12;
}

/// Reward distribution
pub mod rewards {
    use super::token::ONE;

    /// Effective total stake at which the reward rate halves (1,000,000 DAI)
    pub const HALF_DECAY_POINT: u128 = 1_000_000 * ONE;

    /// Rewards per block when nothing is staked (1 UNION)
    pub const MAX_INFLATION_PER_BLOCK: u128 = ONE;

    /// Multiplier for a member with nothing locked (1.0)
    pub const MEMBER_RATIO: u128 = super::precision::WAD;
}

/// Money-market adapters
pub mod adapters {
    /// Default floor for a new adapter
    pub const DEFAULT_FLOOR: u128 = 0;

    /// Default ceiling for a new adapter (unbounded)
    pub const DEFAULT_CEILING: u128 = u128::MAX;
}
