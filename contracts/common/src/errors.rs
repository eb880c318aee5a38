//! Error Types for the Union Credit Ledger
//!
//! Every failure is a distinct, matchable variant. Operations abort on the
//! first error and the composition layer discards the draft state, so an
//! error always means "nothing happened".

use crate::types::Address;

/// Result type alias for Union operations
pub type UnionResult<T> = Result<T, UnionError>;

/// Main error enum for all protocol errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnionError {
    // ============ Authorization Errors ============
    /// Caller is not allowed to perform this action on the target
    AuthFailed { caller: Address },

    /// Administrative action attempted without the required role
    SenderNotAdmin { caller: Address },

    /// Caller must be a member
    CallerNotMember { caller: Address },

    // ============ Validation Errors ============
    /// Zero amount not allowed
    AmountZero,

    /// Zero address supplied
    AddressZero,

    /// Two inputs that must have the same length do not
    LengthNotMatch { expected: usize, actual: usize },

    /// A staker tried to vouch for themselves
    ErrorSelfVouching,

    /// New trust is below the amount already locked on the edge
    TrustAmountLtLocked { trust: u128, locked: u128 },

    /// Trust amount above the representable maximum
    TrustAmountTooLarge { trust: u128, maximum: u128 },

    /// Configuration or parameter value rejected
    InvalidParameter { param: &'static str, reason: &'static str },

    // ============ Capacity Errors ============
    /// Stake would exceed the per-staker maximum
    StakeLimitReached { requested: u128, maximum: u128 },

    /// Too many vouchers (incoming) or vouchees (outgoing)
    MaxTrustLimitReached { limit: u32 },

    /// Borrow would push the borrower above max borrow
    AmountExceedMaxBorrow { requested: u128, maximum: u128 },

    /// Borrow would push total borrows above the debt ceiling
    AmountExceedGlobalMax { requested: u128, remaining: u128 },

    /// Borrow below the minimum
    AmountLessMinBorrow { requested: u128, minimum: u128 },

    /// Amount larger than the stake locked on the edge
    ExceedsLocked { requested: u128, locked: u128 },

    /// Frozen amount larger than the stake it is frozen from
    ExceedsTotalFrozen { frozen: u128, staked: u128 },

    /// Reduction larger than the total staked
    ExceedsTotalStaked { requested: u128, total: u128 },

    /// Balance too small for the operation
    InsufficientBalance { available: u128, requested: u128 },

    /// Allowance too small for a delegated transfer
    InsufficientAllowance { available: u128, requested: u128 },

    /// Not enough liquidity across the money markets
    InsufficientFundsLeft { available: u128, requested: u128 },

    /// Borrow above the borrower's available credit
    InsufficientCreditLimit { available: u128, requested: u128 },

    /// Lock/unlock could not place the whole amount on the vouches
    LockedRemaining { remaining: u128 },

    // ============ State / Timing Errors ============
    /// Borrower has overdue debt
    MemberIsOverdue { borrower: Address },

    /// Borrower is not overdue
    NotOverdue { borrower: Address },

    /// Interest was not accrued in the current time unit
    AccrueBlockParity { accrued_at: u64, now: u64 },

    /// Vouch still has stake locked against it
    LockedStakeNonZero { locked: u128 },

    /// Protocol is paused
    ProtocolPaused,

    /// No vouch between staker and borrower
    VouchNotFound { staker: Address, borrower: Address },

    /// Adapter already registered
    AdapterExists { adapter: Address },

    /// Adapter not registered
    AdapterNotFound { adapter: Address },

    /// Adapter still holds funds
    RemainingFunds { adapter: Address, supply: u128 },

    /// Permit deadline has passed
    PermitExpired { deadline: u64, now: u64 },

    /// Permit nonce does not match the owner's current nonce
    InvalidNonce { expected: u64, actual: u64 },

    // ============ Registration Errors ============
    /// Not enough distinct backers to register
    NotEnoughStakers { found: u32, required: u32 },

    /// Registration target is already a member, no new member would be created
    NoExistingMember { member: Address },

    // ============ Math Errors ============
    /// Arithmetic overflow occurred
    Overflow,

    /// Arithmetic underflow occurred
    Underflow,

    /// Division by zero
    DivisionByZero,
}

impl UnionError {
    /// Returns a stable error code for logging/debugging
    pub fn code(&self) -> &'static str {
        match self {
            Self::AuthFailed { .. } => "E001_AUTH_FAILED",
            Self::SenderNotAdmin { .. } => "E002_SENDER_NOT_ADMIN",
            Self::CallerNotMember { .. } => "E003_CALLER_NOT_MEMBER",
            Self::AmountZero => "E010_AMOUNT_ZERO",
            Self::AddressZero => "E011_ADDRESS_ZERO",
            Self::LengthNotMatch { .. } => "E012_LENGTH_NOT_MATCH",
            Self::ErrorSelfVouching => "E013_SELF_VOUCHING",
            Self::TrustAmountLtLocked { .. } => "E014_TRUST_LT_LOCKED",
            Self::TrustAmountTooLarge { .. } => "E015_TRUST_TOO_LARGE",
            Self::InvalidParameter { .. } => "E016_INVALID_PARAM",
            Self::StakeLimitReached { .. } => "E020_STAKE_LIMIT",
            Self::MaxTrustLimitReached { .. } => "E021_MAX_TRUST_LIMIT",
            Self::AmountExceedMaxBorrow { .. } => "E022_EXCEED_MAX_BORROW",
            Self::AmountExceedGlobalMax { .. } => "E023_EXCEED_GLOBAL_MAX",
            Self::AmountLessMinBorrow { .. } => "E024_LESS_MIN_BORROW",
            Self::ExceedsLocked { .. } => "E025_EXCEEDS_LOCKED",
            Self::ExceedsTotalFrozen { .. } => "E026_EXCEEDS_TOTAL_FROZEN",
            Self::ExceedsTotalStaked { .. } => "E027_EXCEEDS_TOTAL_STAKED",
            Self::InsufficientBalance { .. } => "E028_INSUFFICIENT_BALANCE",
            Self::InsufficientAllowance { .. } => "E029_INSUFFICIENT_ALLOWANCE",
            Self::InsufficientFundsLeft { .. } => "E030_INSUFFICIENT_FUNDS_LEFT",
            Self::InsufficientCreditLimit { .. } => "E031_INSUFFICIENT_CREDIT",
            Self::LockedRemaining { .. } => "E032_LOCKED_REMAINING",
            Self::MemberIsOverdue { .. } => "E040_MEMBER_OVERDUE",
            Self::NotOverdue { .. } => "E041_NOT_OVERDUE",
            Self::AccrueBlockParity { .. } => "E042_ACCRUE_PARITY",
            Self::LockedStakeNonZero { .. } => "E043_LOCKED_NON_ZERO",
            Self::ProtocolPaused => "E044_PAUSED",
            Self::VouchNotFound { .. } => "E045_VOUCH_NOT_FOUND",
            Self::AdapterExists { .. } => "E046_ADAPTER_EXISTS",
            Self::AdapterNotFound { .. } => "E047_ADAPTER_NOT_FOUND",
            Self::RemainingFunds { .. } => "E048_REMAINING_FUNDS",
            Self::PermitExpired { .. } => "E049_PERMIT_EXPIRED",
            Self::InvalidNonce { .. } => "E050_INVALID_NONCE",
            Self::NotEnoughStakers { .. } => "E060_NOT_ENOUGH_STAKERS",
            Self::NoExistingMember { .. } => "E061_NO_EXISTING_MEMBER",
            Self::Overflow => "E080_OVERFLOW",
            Self::Underflow => "E081_UNDERFLOW",
            Self::DivisionByZero => "E082_DIV_ZERO",
        }
    }

    /// Returns true if this error is recoverable (user can fix it)
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::InsufficientBalance { .. } => true,   // Get more funds
            Self::InsufficientAllowance { .. } => true, // Approve more
            Self::InsufficientCreditLimit { .. } => true, // Find more vouches
            Self::MemberIsOverdue { .. } => true,       // Repay
            Self::NotEnoughStakers { .. } => true,      // Find more backers
            Self::AccrueBlockParity { .. } => true,     // Accrue first
            _ => false,
        }
    }
}

impl core::fmt::Display for UnionError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}: {:?}", self.code(), self)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for UnionError {}
