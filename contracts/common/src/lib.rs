//! Union Common Library
//!
//! Shared types, constants, and utilities for every Union ledger component.
//!
//! ## Execution Model
//!
//! The ledger reproduces smart-contract semantics off-chain:
//! - **Serialized writes**: one operation runs to completion before the next
//! - **All-or-nothing**: a failed operation leaves no state and no events
//! - **Explicit time**: blocks and seconds only move when the driver advances them
//! - **Pull-based accrual**: interest and rewards are computed from elapsed
//!   units at point of use, never by background jobs
//!
//! ## Contents
//!
//! - **Constants / Config**: default parameters and the validated `ProtocolConfig`
//! - **Errors**: the `UnionError` taxonomy with stable codes
//! - **Math**: WAD fixed point with 256-bit intermediates
//! - **Events**: typed event log for indexers
//! - **Access Control**: role-gated administrative surface
//! - **Token Operations**: ERC20-style ledger for DAI, UNION and uTokens
//! - **Clock**: block/time driver
//!
//! This crate is `no_std` compatible when built without the `std` feature.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

// Re-export collections for submodules based on feature
#[cfg(not(feature = "std"))]
pub use alloc::{
    collections::{BTreeMap, BTreeSet},
    string::String,
    vec::Vec,
};
#[cfg(feature = "std")]
pub use std::{
    collections::{BTreeMap, BTreeSet},
    string::String,
    vec::Vec,
};

pub mod constants;
pub mod errors;
pub mod types;
pub mod math;
pub mod events;
pub mod config;
pub mod clock;
pub mod token_ops;
pub mod access_control;

// Re-exports for convenience
pub use errors::*;
pub use types::*;
pub use math::*;
pub use events::*;
pub use config::*;
pub use clock::*;
pub use token_ops::*;
pub use access_control::*;
