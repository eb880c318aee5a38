//! Protocol Events
//!
//! Typed record of every state change. Events live inside protocol state,
//! so an operation that fails leaves no events behind. Off-chain indexers
//! consume them through `to_bytes`/`from_bytes`.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::types::Address;
use crate::Vec;

/// Event types for indexing and filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[borsh(use_discriminant = true)]
#[repr(u8)]
pub enum EventType {
    // User Manager Events (0x01 - 0x1F)
    Stake = 0x01,
    Unstake = 0x02,
    UpdateTrust = 0x03,
    CancelVouch = 0x04,
    AddMember = 0x05,
    RegisterMember = 0x06,
    DebtWriteOff = 0x07,

    // UToken Events (0x20 - 0x3F)
    Borrow = 0x20,
    Repay = 0x21,
    Mint = 0x22,
    Redeem = 0x23,
    AccrueInterest = 0x24,
    ReservesAdded = 0x25,
    ReservesRemoved = 0x26,

    // Comptroller Events (0x40 - 0x5F)
    WithdrawRewards = 0x40,

    // Asset Manager Events (0x60 - 0x7F)
    AddAdapter = 0x60,
    RemoveAdapter = 0x61,
    WithdrawSequence = 0x62,
    Rebalance = 0x63,

    // Protocol Events (0x80 - 0x9F)
    ParameterUpdated = 0x80,
    Paused = 0x81,
    Unpaused = 0x82,
    RoleGranted = 0x83,
    RoleRevoked = 0x84,
    SetUToken = 0x85,
}

/// Main event enum containing all possible protocol events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum UnionEvent {
    // ============ User Manager Events ============

    /// Stake deposited
    LogStake {
        staker: Address,
        amount: u128,
        block_height: u64,
    },

    /// Stake withdrawn
    LogUnstake {
        staker: Address,
        amount: u128,
        block_height: u64,
    },

    /// Vouch created or its trust changed
    LogUpdateTrust {
        staker: Address,
        borrower: Address,
        trust: u128,
        block_height: u64,
    },

    /// Vouch removed
    LogCancelVouch {
        staker: Address,
        borrower: Address,
        block_height: u64,
    },

    /// Member added by an administrator
    LogAddMember {
        member: Address,
        block_height: u64,
    },

    /// Member registered through backers
    LogRegisterMember {
        payer: Address,
        member: Address,
        fee: u128,
        block_height: u64,
    },

    /// Locked stake converted into a loss
    LogDebtWriteOff {
        caller: Address,
        staker: Address,
        borrower: Address,
        amount: u128,
        block_height: u64,
    },

    // ============ UToken Events ============

    /// Debt drawn
    LogBorrow {
        borrower: Address,
        amount: u128,
        fee: u128,
        block_height: u64,
    },

    /// Debt repaid
    LogRepay {
        payer: Address,
        borrower: Address,
        interest_paid: u128,
        principal_paid: u128,
        block_height: u64,
    },

    /// Lender supplied underlying
    LogMint {
        lender: Address,
        underlying: u128,
        utokens: u128,
        block_height: u64,
    },

    /// Lender withdrew underlying
    LogRedeem {
        lender: Address,
        underlying: u128,
        utokens: u128,
        block_height: u64,
    },

    /// Interest accrued
    LogAccrueInterest {
        interest: u128,
        borrow_index: u128,
        total_borrows: u128,
        block_height: u64,
    },

    /// Reserves topped up
    LogReservesAdded {
        from: Address,
        amount: u128,
        new_total: u128,
        block_height: u64,
    },

    /// Reserves withdrawn
    LogReservesRemoved {
        to: Address,
        amount: u128,
        new_total: u128,
        block_height: u64,
    },

    // ============ Comptroller Events ============

    /// Rewards paid out (`retained` stays accrued)
    LogWithdrawRewards {
        account: Address,
        paid: u128,
        retained: u128,
        block_height: u64,
    },

    // ============ Asset Manager Events ============

    /// Adapter registered
    LogAddAdapter {
        adapter: Address,
        block_height: u64,
    },

    /// Adapter removed
    LogRemoveAdapter {
        adapter: Address,
        block_height: u64,
    },

    /// Withdraw priority changed
    LogWithdrawSequence {
        sequence: Vec<Address>,
        block_height: u64,
    },

    /// Funds redistributed across adapters
    LogRebalance {
        weights_bps: Vec<u32>,
        block_height: u64,
    },

    // ============ Protocol Events ============

    /// Administrative parameter change
    LogParameterUpdated {
        param: ParamKind,
        old_value: u128,
        new_value: u128,
        block_height: u64,
    },

    /// Protocol paused
    LogPaused {
        by: Address,
        block_height: u64,
    },

    /// Protocol unpaused
    LogUnpaused {
        by: Address,
        block_height: u64,
    },

    /// Role granted
    LogRoleGranted {
        account: Address,
        role: u8,
        block_height: u64,
    },

    /// Role revoked
    LogRoleRevoked {
        account: Address,
        role: u8,
        block_height: u64,
    },

    /// uToken account rebound
    LogSetUToken {
        old: Address,
        new: Address,
        block_height: u64,
    },
}

/// Which parameter a `LogParameterUpdated` refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum ParamKind {
    MaxStakeAmount,
    NewMemberFee,
    OverdueBlocks,
    MaxOverdueBlocks,
    EffectiveCount,
    MaxVouchers,
    MaxVouchees,
    InterestRate,
    OriginationFee,
    DebtCeiling,
    MinBorrow,
    MaxBorrow,
    ReserveFactor,
    HalfDecayPoint,
    AdapterFloor,
    AdapterCeiling,
}

impl UnionEvent {
    /// Get the event type for filtering
    pub fn event_type(&self) -> EventType {
        match self {
            Self::LogStake { .. } => EventType::Stake,
            Self::LogUnstake { .. } => EventType::Unstake,
            Self::LogUpdateTrust { .. } => EventType::UpdateTrust,
            Self::LogCancelVouch { .. } => EventType::CancelVouch,
            Self::LogAddMember { .. } => EventType::AddMember,
            Self::LogRegisterMember { .. } => EventType::RegisterMember,
            Self::LogDebtWriteOff { .. } => EventType::DebtWriteOff,
            Self::LogBorrow { .. } => EventType::Borrow,
            Self::LogRepay { .. } => EventType::Repay,
            Self::LogMint { .. } => EventType::Mint,
            Self::LogRedeem { .. } => EventType::Redeem,
            Self::LogAccrueInterest { .. } => EventType::AccrueInterest,
            Self::LogReservesAdded { .. } => EventType::ReservesAdded,
            Self::LogReservesRemoved { .. } => EventType::ReservesRemoved,
            Self::LogWithdrawRewards { .. } => EventType::WithdrawRewards,
            Self::LogAddAdapter { .. } => EventType::AddAdapter,
            Self::LogRemoveAdapter { .. } => EventType::RemoveAdapter,
            Self::LogWithdrawSequence { .. } => EventType::WithdrawSequence,
            Self::LogRebalance { .. } => EventType::Rebalance,
            Self::LogParameterUpdated { .. } => EventType::ParameterUpdated,
            Self::LogPaused { .. } => EventType::Paused,
            Self::LogUnpaused { .. } => EventType::Unpaused,
            Self::LogRoleGranted { .. } => EventType::RoleGranted,
            Self::LogRoleRevoked { .. } => EventType::RoleRevoked,
            Self::LogSetUToken { .. } => EventType::SetUToken,
        }
    }

    /// Get the block height when event occurred
    pub fn block_height(&self) -> u64 {
        match self {
            Self::LogStake { block_height, .. }
            | Self::LogUnstake { block_height, .. }
            | Self::LogUpdateTrust { block_height, .. }
            | Self::LogCancelVouch { block_height, .. }
            | Self::LogAddMember { block_height, .. }
            | Self::LogRegisterMember { block_height, .. }
            | Self::LogDebtWriteOff { block_height, .. }
            | Self::LogBorrow { block_height, .. }
            | Self::LogRepay { block_height, .. }
            | Self::LogMint { block_height, .. }
            | Self::LogRedeem { block_height, .. }
            | Self::LogAccrueInterest { block_height, .. }
            | Self::LogReservesAdded { block_height, .. }
            | Self::LogReservesRemoved { block_height, .. }
            | Self::LogWithdrawRewards { block_height, .. }
            | Self::LogAddAdapter { block_height, .. }
            | Self::LogRemoveAdapter { block_height, .. }
            | Self::LogWithdrawSequence { block_height, .. }
            | Self::LogRebalance { block_height, .. }
            | Self::LogParameterUpdated { block_height, .. }
            | Self::LogPaused { block_height, .. }
            | Self::LogUnpaused { block_height, .. }
            | Self::LogRoleGranted { block_height, .. }
            | Self::LogRoleRevoked { block_height, .. }
            | Self::LogSetUToken { block_height, .. } => *block_height,
        }
    }

    /// Serialize event to bytes for storage/transmission
    pub fn to_bytes(&self) -> Vec<u8> {
        borsh::to_vec(self).unwrap_or_default()
    }

    /// Deserialize event from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        borsh::from_slice(bytes).ok()
    }
}

/// Event log for collecting events during execution
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct EventLog {
    events: Vec<UnionEvent>,
}

impl EventLog {
    /// Create a new empty event log
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Emit an event (add to log)
    pub fn emit(&mut self, event: UnionEvent) {
        self.events.push(event);
    }

    /// Get all events
    pub fn events(&self) -> &[UnionEvent] {
        &self.events
    }

    /// Take ownership of all events
    pub fn into_events(self) -> Vec<UnionEvent> {
        self.events
    }

    /// Filter events by type
    pub fn filter_by_type(&self, event_type: EventType) -> Vec<&UnionEvent> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// Most recent event, if any
    pub fn last(&self) -> Option<&UnionEvent> {
        self.events.last()
    }

    /// Check if any events were emitted
    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }

    /// Get number of events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns true if no events were emitted
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Clear all events
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type() {
        let event = UnionEvent::LogBorrow {
            borrower: [1u8; 32],
            amount: 5_000,
            fee: 25,
            block_height: 100,
        };

        assert_eq!(event.event_type(), EventType::Borrow);
        assert_eq!(event.block_height(), 100);
    }

    #[test]
    fn test_event_serialization() {
        let event = UnionEvent::LogWithdrawSequence {
            sequence: vec![[1u8; 32], [3u8; 32]],
            block_height: 200,
        };

        let bytes = event.to_bytes();
        let restored = UnionEvent::from_bytes(&bytes).unwrap();

        assert_eq!(event, restored);
    }

    #[test]
    fn test_event_log() {
        let mut log = EventLog::new();

        log.emit(UnionEvent::LogStake {
            staker: [2u8; 32],
            amount: 10,
            block_height: 1,
        });
        log.emit(UnionEvent::LogUpdateTrust {
            staker: [2u8; 32],
            borrower: [3u8; 32],
            trust: 10,
            block_height: 1,
        });

        assert_eq!(log.len(), 2);
        assert!(log.has_events());
        assert_eq!(log.filter_by_type(EventType::Stake).len(), 1);
        assert_eq!(log.last().map(|e| e.event_type()), Some(EventType::UpdateTrust));
    }
}
