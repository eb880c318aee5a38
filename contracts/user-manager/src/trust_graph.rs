//! Trust Graph
//!
//! Directed vouch edges stored twice: `vouchers[borrower]` lists incoming
//! vouches in creation order (the lock order), `vouchees[staker]` lists
//! outgoing ones with a back-reference into the borrower's list. Two
//! reverse maps keyed by `(borrower, staker)` give O(1) positions; presence
//! in the map is the "is set" flag.
//!
//! Every removal goes through `swap_remove_tracked`, and every element it
//! moves has all three of its cross-references rewritten.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use union_common::{Address, BTreeMap, UnionError, UnionResult, Vec};

/// Incoming vouch on a borrower
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct Vouch {
    /// Staker backing the borrower
    pub staker: Address,
    /// Ceiling on the stake this vouch can lock
    pub trust: u128,
    /// Stake currently locked against the borrower's debt
    pub locked: u128,
    /// Block of the last trust or lock change
    pub last_updated: u64,
}

/// Outgoing vouch of a staker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct Vouchee {
    /// Borrower being backed
    pub borrower: Address,
    /// Position of the matching `Vouch` in `vouchers[borrower]`
    pub voucher_index: u32,
}

/// Remove `items[index]` by moving the last element into its slot
///
/// Returns the removed element and whether another element now occupies
/// `index` (and so needs its references rewritten).
pub fn swap_remove_tracked<T>(items: &mut Vec<T>, index: usize) -> (T, bool) {
    let last = items.len() - 1;
    let removed = items.swap_remove(index);
    (removed, index != last)
}

/// Bidirectional vouch storage
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct TrustGraph {
    vouchers: BTreeMap<Address, Vec<Vouch>>,
    vouchees: BTreeMap<Address, Vec<Vouchee>>,
    voucher_indexes: BTreeMap<(Address, Address), u32>,
    vouchee_indexes: BTreeMap<(Address, Address), u32>,
}

impl TrustGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Incoming vouches of a borrower, in lock order
    pub fn vouchers_of(&self, borrower: &Address) -> &[Vouch] {
        self.vouchers.get(borrower).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Outgoing vouches of a staker
    pub fn vouchees_of(&self, staker: &Address) -> &[Vouchee] {
        self.vouchees.get(staker).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of incoming vouches
    pub fn voucher_count(&self, borrower: &Address) -> usize {
        self.vouchers_of(borrower).len()
    }

    /// Number of outgoing vouches
    pub fn vouchee_count(&self, staker: &Address) -> usize {
        self.vouchees_of(staker).len()
    }

    /// Position of the edge in `vouchers[borrower]`
    pub fn voucher_index(&self, staker: &Address, borrower: &Address) -> Option<u32> {
        self.voucher_indexes.get(&(*borrower, *staker)).copied()
    }

    /// Position of the edge in `vouchees[staker]`
    pub fn vouchee_index(&self, staker: &Address, borrower: &Address) -> Option<u32> {
        self.vouchee_indexes.get(&(*borrower, *staker)).copied()
    }

    /// Edge lookup
    pub fn get(&self, staker: &Address, borrower: &Address) -> Option<&Vouch> {
        let idx = self.voucher_index(staker, borrower)?;
        self.vouchers.get(borrower)?.get(idx as usize)
    }

    /// Mutable edge lookup
    pub fn get_mut(&mut self, staker: &Address, borrower: &Address) -> Option<&mut Vouch> {
        let idx = self.voucher_index(staker, borrower)?;
        self.vouchers.get_mut(borrower)?.get_mut(idx as usize)
    }

    /// Mutable access to a borrower's vouches, in lock order
    pub fn vouchers_mut(&mut self, borrower: &Address) -> Option<&mut Vec<Vouch>> {
        self.vouchers.get_mut(borrower)
    }

    /// Append a new edge to both lists
    pub fn insert(&mut self, staker: Address, borrower: Address, trust: u128, block: u64) -> UnionResult<()> {
        if self.voucher_indexes.contains_key(&(borrower, staker)) {
            return Err(UnionError::InvalidParameter {
                param: "vouch",
                reason: "edge already exists",
            });
        }

        let incoming = self.vouchers.entry(borrower).or_default();
        let voucher_index = u32::try_from(incoming.len()).map_err(|_| UnionError::Overflow)?;
        incoming.push(Vouch {
            staker,
            trust,
            locked: 0,
            last_updated: block,
        });

        let outgoing = self.vouchees.entry(staker).or_default();
        let vouchee_index = u32::try_from(outgoing.len()).map_err(|_| UnionError::Overflow)?;
        outgoing.push(Vouchee {
            borrower,
            voucher_index,
        });

        self.voucher_indexes.insert((borrower, staker), voucher_index);
        self.vouchee_indexes.insert((borrower, staker), vouchee_index);
        Ok(())
    }

    /// Remove an edge, keeping every surviving cross-reference exact
    pub fn remove(&mut self, staker: &Address, borrower: &Address) -> UnionResult<Vouch> {
        let key = (*borrower, *staker);
        let not_found = || UnionError::VouchNotFound {
            staker: *staker,
            borrower: *borrower,
        };
        let voucher_index = self.voucher_indexes.remove(&key).ok_or_else(not_found)? as usize;
        let vouchee_index = self.vouchee_indexes.remove(&key).ok_or_else(not_found)? as usize;

        // Borrower side
        let incoming = self.vouchers.get_mut(borrower).ok_or_else(not_found)?;
        let (removed, moved) = swap_remove_tracked(incoming, voucher_index);
        if moved {
            let moved_staker = incoming[voucher_index].staker;
            let new_index = voucher_index as u32;
            self.voucher_indexes.insert((*borrower, moved_staker), new_index);

            let moved_vouchee = self
                .vouchee_indexes
                .get(&(*borrower, moved_staker))
                .copied()
                .ok_or(UnionError::VouchNotFound {
                    staker: moved_staker,
                    borrower: *borrower,
                })?;
            if let Some(entry) = self
                .vouchees
                .get_mut(&moved_staker)
                .and_then(|v| v.get_mut(moved_vouchee as usize))
            {
                entry.voucher_index = new_index;
            }
        }
        if incoming.is_empty() {
            self.vouchers.remove(borrower);
        }

        // Staker side
        let outgoing = self.vouchees.get_mut(staker).ok_or_else(not_found)?;
        let (_, moved) = swap_remove_tracked(outgoing, vouchee_index);
        if moved {
            let moved_borrower = outgoing[vouchee_index].borrower;
            self.vouchee_indexes
                .insert((moved_borrower, *staker), vouchee_index as u32);
        }
        if outgoing.is_empty() {
            self.vouchees.remove(staker);
        }

        Ok(removed)
    }

    /// Every edge as (staker, borrower, vouch)
    pub fn edges(&self) -> impl Iterator<Item = (&Address, &Address, &Vouch)> {
        self.vouchers
            .iter()
            .flat_map(|(borrower, list)| list.iter().map(move |v| (&v.staker, borrower, v)))
    }

    /// Verify that both lists and both reverse maps agree
    pub fn check_consistency(&self) -> UnionResult<()> {
        let broken = |reason: &'static str| UnionError::InvalidParameter {
            param: "trust_graph",
            reason,
        };

        let mut edge_count = 0usize;
        for (borrower, list) in &self.vouchers {
            for (i, vouch) in list.iter().enumerate() {
                edge_count += 1;
                if self.voucher_index(&vouch.staker, borrower) != Some(i as u32) {
                    return Err(broken("voucher index out of date"));
                }
            }
        }

        let mut back_refs = 0usize;
        for (staker, list) in &self.vouchees {
            for (i, vouchee) in list.iter().enumerate() {
                back_refs += 1;
                if self.vouchee_index(staker, &vouchee.borrower) != Some(i as u32) {
                    return Err(broken("vouchee index out of date"));
                }
                let target = self
                    .vouchers
                    .get(&vouchee.borrower)
                    .and_then(|v| v.get(vouchee.voucher_index as usize));
                match target {
                    Some(vouch) if vouch.staker == *staker => {}
                    _ => return Err(broken("vouchee points at the wrong voucher")),
                }
            }
        }

        if edge_count != back_refs
            || edge_count != self.voucher_indexes.len()
            || edge_count != self.vouchee_indexes.len()
        {
            return Err(broken("edge counts disagree"));
        }
        Ok(())
    }
}
