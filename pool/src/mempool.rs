//! The pending-transaction pool: an ordered sequence of transactions drained
//! FIFO by the miner. Ordering is not part of consensus — a future revision
//! may prioritize by fee.

use std::collections::VecDeque;

use log::debug;
use parking_lot::Mutex;

use ember_core::Transaction;

#[derive(Default)]
pub struct Mempool {
    pending: Mutex<VecDeque<Transaction>>,
}

impl Mempool {
    pub fn new() -> Self {
        Mempool::default()
    }

    /// Appends `txn` if an equal transaction isn't already pending (value
    /// equality, not reference). Returns `false` if it was already present.
    pub fn add_txn(&self, txn: Transaction) -> bool {
        let mut pending = self.pending.lock();
        if pending.contains(&txn) {
            debug!("mempool: duplicate transaction ignored");
            return false;
        }
        pending.push_back(txn);
        true
    }

    /// Removes and returns up to `max` transactions from the head of the
    /// queue, in arrival order.
    pub fn drain(&self, max: usize) -> Vec<Transaction> {
        let mut pending = self.pending.lock();
        let n = max.min(pending.len());
        pending.drain(..n).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_core::Address;

    fn txn(sender: &str) -> Transaction {
        Transaction {
            version: Transaction::VERSION.to_string(),
            sender: Address::from(sender),
            receivers: Vec::new(),
            outputs: Vec::new(),
            proof: ember_core::transaction::Proof { public_key: String::new(), signature: String::new() },
        }
    }

    #[test]
    fn duplicate_by_value_is_rejected() {
        let pool = Mempool::new();
        assert!(pool.add_txn(txn("alice")));
        assert!(!pool.add_txn(txn("alice")));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn drain_returns_fifo_order_and_removes_entries() {
        let pool = Mempool::new();
        pool.add_txn(txn("a"));
        pool.add_txn(txn("b"));
        pool.add_txn(txn("c"));

        let drained = pool.drain(2);
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].sender, Address::from("a"));
        assert_eq!(drained[1].sender, Address::from("b"));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn drain_more_than_available_takes_everything() {
        let pool = Mempool::new();
        pool.add_txn(txn("a"));
        assert_eq!(pool.drain(100).len(), 1);
        assert!(pool.is_empty());
    }
}
