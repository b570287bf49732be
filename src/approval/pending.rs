use crate::core::word::Address;
use crate::remote::TxHandle;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// An allowance change that has been submitted but not yet confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingApproval {
    pub token: Address,
    pub spender: Address,
    /// `true` for an approval, `false` for a disapproval.
    pub granting: bool,
    pub tx: TxHandle,
}

/// In-flight allowance changes, keyed by `(token, spender)`.
///
/// Entries live from submission until the transaction-status watcher
/// calls [`PendingApprovals::resolve`]. The most recent registration for a
/// pair is authoritative. One instance is shared per client session; tests
/// construct their own.
///
/// # Examples
///
/// ```
/// use loan_query_engine::approval::pending::PendingApprovals;
/// use loan_query_engine::core::word::Address;
/// use loan_query_engine::remote::TxHandle;
///
/// let token: Address = "0x1000000000000000000000000000000000000001".parse().unwrap();
/// let engine: Address = "0x1000000000000000000000000000000000000002".parse().unwrap();
///
/// let pending = PendingApprovals::new();
/// pending.register_approval(token, engine, true, TxHandle::new("0x01"));
/// assert_eq!(pending.last_pending_approval(token, engine), Some(true));
/// ```
#[derive(Debug, Default)]
pub struct PendingApprovals {
    entries: Mutex<HashMap<(Address, Address), PendingApproval>>,
}

impl PendingApprovals {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<(Address, Address), PendingApproval>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a submitted approval, replacing any pending one for the pair.
    pub fn register_approval(&self, token: Address, spender: Address, granting: bool, tx: TxHandle) {
        debug!(
            "Registering pending {} of {} for {} ({})",
            if granting { "approval" } else { "disapproval" },
            token,
            spender,
            tx
        );
        self.entries().insert(
            (token, spender),
            PendingApproval {
                token,
                spender,
                granting,
                tx,
            },
        );
    }

    /// `granting` flag of the pending entry for the pair, if any.
    pub fn last_pending_approval(&self, token: Address, spender: Address) -> Option<bool> {
        self.entries().get(&(token, spender)).map(|p| p.granting)
    }

    pub fn get(&self, token: Address, spender: Address) -> Option<PendingApproval> {
        self.entries().get(&(token, spender)).cloned()
    }

    /// Clear the entry for the pair if it still belongs to `tx`.
    ///
    /// Returns whether an entry was removed. A confirmation for a
    /// superseded transaction leaves the newer entry in place.
    pub fn resolve(&self, token: Address, spender: Address, tx: &TxHandle) -> bool {
        let mut entries = self.entries();
        let owned = entries
            .get(&(token, spender))
            .is_some_and(|pending| &pending.tx == tx);
        if owned {
            entries.remove(&(token, spender));
            debug!("Resolved pending approval {} of {} for {}", tx, token, spender);
        }
        owned
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn addr(last: u8) -> Address {
        let mut bytes = [0u8; 20];
        bytes[19] = last;
        Address::from_bytes(bytes)
    }

    #[test]
    fn test_nothing_pending() {
        let pending = PendingApprovals::new();
        assert_eq!(pending.last_pending_approval(addr(1), addr(2)), None);
        assert!(pending.is_empty());
    }

    #[test]
    fn test_last_write_wins() {
        let pending = PendingApprovals::new();
        pending.register_approval(addr(1), addr(2), true, TxHandle::new("h1"));
        assert_eq!(pending.last_pending_approval(addr(1), addr(2)), Some(true));

        pending.register_approval(addr(1), addr(2), false, TxHandle::new("h2"));
        assert_eq!(pending.last_pending_approval(addr(1), addr(2)), Some(false));
        assert_eq!(pending.len(), 1);
    }

    #[test]
    fn test_pairs_are_independent() {
        let pending = PendingApprovals::new();
        pending.register_approval(addr(1), addr(2), true, TxHandle::new("h1"));
        pending.register_approval(addr(1), addr(3), false, TxHandle::new("h2"));
        assert_eq!(pending.last_pending_approval(addr(1), addr(2)), Some(true));
        assert_eq!(pending.last_pending_approval(addr(1), addr(3)), Some(false));
        assert_eq!(pending.last_pending_approval(addr(4), addr(2)), None);
    }

    #[test]
    fn test_stale_resolution_keeps_newer_entry() {
        let pending = PendingApprovals::new();
        pending.register_approval(addr(1), addr(2), true, TxHandle::new("h1"));
        pending.register_approval(addr(1), addr(2), false, TxHandle::new("h2"));

        assert!(!pending.resolve(addr(1), addr(2), &TxHandle::new("h1")));
        assert_eq!(pending.last_pending_approval(addr(1), addr(2)), Some(false));

        assert!(pending.resolve(addr(1), addr(2), &TxHandle::new("h2")));
        assert_eq!(pending.last_pending_approval(addr(1), addr(2)), None);
    }

    #[test]
    fn test_shared_across_threads() {
        let pending = Arc::new(PendingApprovals::new());
        let handles: Vec<_> = (0..8u8)
            .map(|i| {
                let pending = Arc::clone(&pending);
                std::thread::spawn(move || {
                    pending.register_approval(addr(1), addr(i), i % 2 == 0, TxHandle::new(format!("h{}", i)));
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(pending.len(), 8);
        assert_eq!(pending.last_pending_approval(addr(1), addr(4)), Some(true));
    }
}
