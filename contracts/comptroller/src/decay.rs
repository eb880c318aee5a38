//! Reward Decay Curves
//!
//! Inflation per unit falls as total effective stake grows. Both curves are
//! monotone non-increasing and pay half the maximum rate at the half decay
//! point.

use union_common::{
    constants::precision::WAD,
    math::{mul_div, wad_div, wad_mul},
    DecayModel, UnionResult,
};

/// Step table as (ratio of total to half decay point, share of max rate), WAD scaled
const STEPS: [(u128, u128); 12] = [
    (10_000_000_000_000, WAD),                                    // <= 0.00001
    (100_000_000_000_000, 900_000_000_000_000_000),               // <= 0.0001
    (1_000_000_000_000_000, 800_000_000_000_000_000),             // <= 0.001
    (10_000_000_000_000_000, 700_000_000_000_000_000),            // <= 0.01
    (100_000_000_000_000_000, 600_000_000_000_000_000),           // <= 0.1
    (WAD, 500_000_000_000_000_000),                               // <= 1
    (5 * WAD, 250_000_000_000_000_000),                           // <= 5
    (10 * WAD, 100_000_000_000_000_000),                          // <= 10
    (100 * WAD, 10_000_000_000_000_000),                          // <= 100
    (1_000 * WAD, 1_000_000_000_000_000),                         // <= 1 000
    (10_000 * WAD, 100_000_000_000_000),                          // <= 10 000
    (100_000 * WAD, 10_000_000_000_000),                          // <= 100 000
];

/// Share of the max rate beyond the last step
const TAIL: u128 = 1_000_000_000_000;

/// Inflation per unit for `total_effective` stake
pub fn inflation_per_unit(
    model: DecayModel,
    max_inflation: u128,
    half_decay_point: u128,
    total_effective: u128,
) -> UnionResult<u128> {
    match model {
        DecayModel::HalfLife => {
            let denominator = half_decay_point.saturating_add(total_effective);
            mul_div(max_inflation, half_decay_point, denominator)
        }
        DecayModel::StepTable => {
            let ratio = wad_div(total_effective, half_decay_point)?;
            let share = STEPS
                .iter()
                .find(|(bound, _)| ratio <= *bound)
                .map(|(_, share)| *share)
                .unwrap_or(TAIL);
            wad_mul(max_inflation, share)
        }
    }
}
