//! Thread-safe handle
//!
//! `Protocol` itself is single-threaded. `SharedProtocol` serializes writers
//! behind a `RwLock` so operations from several threads apply one at a time
//! in lock order, while views run concurrently.

use std::sync::{Arc, RwLock};

use crate::Protocol;

/// Cloneable handle to one protocol instance
#[derive(Debug, Clone)]
pub struct SharedProtocol {
    inner: Arc<RwLock<Protocol>>,
}

impl SharedProtocol {
    pub fn new(protocol: Protocol) -> Self {
        Self {
            inner: Arc::new(RwLock::new(protocol)),
        }
    }

    /// Run a view under the read lock
    pub fn read<T>(&self, f: impl FnOnce(&Protocol) -> T) -> T {
        // Operations commit atomically, so a poisoned lock still guards consistent state
        let guard = self.inner.read().unwrap_or_else(|e| e.into_inner());
        f(&guard)
    }

    /// Run an operation under the write lock
    pub fn write<T>(&self, f: impl FnOnce(&mut Protocol) -> T) -> T {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }
}

impl From<Protocol> for SharedProtocol {
    fn from(protocol: Protocol) -> Self {
        Self::new(protocol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use union_common::{constants::token::ONE, ProtocolConfig};

    fn admin() -> [u8; 32] {
        [1u8; 32]
    }

    #[test]
    fn test_concurrent_stakers() {
        let mut protocol = Protocol::new(admin(), ProtocolConfig::default()).unwrap();
        for i in 10u8..18 {
            protocol.add_member(admin(), [i; 32]).unwrap();
            protocol.fund_underlying([i; 32], 100 * ONE).unwrap();
        }
        let shared = SharedProtocol::new(protocol);

        let handles: Vec<_> = (10u8..18)
            .map(|i| {
                let shared = shared.clone();
                thread::spawn(move || {
                    for _ in 0..10 {
                        shared.write(|p| p.stake([i; 32], ONE)).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        shared.read(|p| {
            assert_eq!(p.total_staked(), 80 * ONE);
            assert_eq!(p.pool_balance().unwrap(), 80 * ONE);
            assert_eq!(p.events().len(), 8 + 80);
            p.check_invariants().unwrap();
        });
    }
}
