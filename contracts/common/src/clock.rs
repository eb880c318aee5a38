//! Time Driver
//!
//! Block height and wall-clock time only move when the driver says so
//! (`advance_blocks` / `advance_time`), the off-chain equivalent of
//! `evm_mine` and `evm_increaseTime`. Nothing accrues in the background:
//! interest, rewards and overdue status are computed from elapsed units
//! at point of use.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::constants::overdue::SECONDS_PER_BLOCK;

/// Unit in which accrual and overdue windows are measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum TimeBasis {
    /// Count blocks (`overdueBlocks` deployments)
    #[default]
    Blocks,
    /// Count seconds (`overdueTime` deployments)
    Seconds,
}

/// Block and time state of one protocol instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct Clock {
    /// Current block height
    pub block_number: u64,
    /// Current timestamp in seconds
    pub timestamp: u64,
    /// Seconds added per mined block
    pub seconds_per_block: u64,
}

impl Default for Clock {
    fn default() -> Self {
        Self::new(1, 0)
    }
}

impl Clock {
    /// Create a clock at the given block and timestamp
    pub fn new(block_number: u64, timestamp: u64) -> Self {
        Self {
            block_number,
            timestamp,
            seconds_per_block: SECONDS_PER_BLOCK,
        }
    }

    /// Mine `n` blocks; time moves by `n * seconds_per_block`
    pub fn advance_blocks(&mut self, n: u64) {
        self.block_number = self.block_number.saturating_add(n);
        self.timestamp = self
            .timestamp
            .saturating_add(n.saturating_mul(self.seconds_per_block));
    }

    /// Move time forward without mining
    pub fn advance_time(&mut self, seconds: u64) {
        self.timestamp = self.timestamp.saturating_add(seconds);
    }

    /// Current position in the given basis
    pub fn now(&self, basis: TimeBasis) -> u64 {
        match basis {
            TimeBasis::Blocks => self.block_number,
            TimeBasis::Seconds => self.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_blocks_moves_time() {
        let mut clock = Clock::new(10, 1_000);
        clock.advance_blocks(5);

        assert_eq!(clock.now(TimeBasis::Blocks), 15);
        assert_eq!(clock.now(TimeBasis::Seconds), 1_000 + 5 * SECONDS_PER_BLOCK);
    }

    #[test]
    fn test_advance_time_keeps_block() {
        let mut clock = Clock::new(10, 1_000);
        clock.advance_time(3_600);

        assert_eq!(clock.block_number, 10);
        assert_eq!(clock.timestamp, 4_600);
    }
}
