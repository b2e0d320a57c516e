//! The miner: drains the mempool, assembles a candidate block on top of the
//! current mining parent, and hands proof-of-work search off to
//! [`crate::search::search`].

use std::sync::Arc;

use log::info;

use ember_chain::Chain;
use ember_core::consensus::{BLOCK_REWARD, DIFFICULTY, MAX_TXNS_PER_BLOCK};
use ember_core::{Address, Block, Transaction};
use ember_pool::Mempool;
use ember_util::{RwLock, StopHandle};

use crate::search;

/// Tunables for a [`Miner`].
#[derive(Debug, Clone)]
pub struct MinerConfig {
    /// Address credited in every coinbase transaction this miner produces.
    pub miner_address: Address,
    /// Maximum number of mempool transactions drained into a single block.
    pub max_txns: usize,
    /// Minimum number of leading hex zero characters a found block's hash
    /// must carry.
    pub difficulty: usize,
}

impl Default for MinerConfig {
    fn default() -> Self {
        MinerConfig {
            miner_address: Address::from("miner"),
            max_txns: MAX_TXNS_PER_BLOCK,
            difficulty: DIFFICULTY,
        }
    }
}

/// Reads the mempool and the chain tip, never writes either. The caller's
/// `handler` is responsible for inserting a found block and re-broadcasting
/// it.
pub struct Miner {
    config: MinerConfig,
    mempool: Arc<Mempool>,
    stop: StopHandle,
}

impl Miner {
    pub fn new(config: MinerConfig, mempool: Arc<Mempool>, stop: StopHandle) -> Miner {
        Miner { config, mempool, stop }
    }

    /// Appends `txn` to the mempool if an equal transaction isn't already
    /// pending.
    pub fn add_txn(&self, txn: Transaction) -> bool {
        self.mempool.add_txn(txn)
    }

    /// The long-running mine loop. Each round: drain the mempool, append a
    /// coinbase, pick a parent, search for a valid proof of work, and call
    /// `handler` with the result before starting the next round. Exits at
    /// the next round boundary once `self.stop` is signaled.
    pub fn mine(&self, chain: &RwLock<Chain>, mut handler: impl FnMut(Block)) {
        let workers = num_cpus::get().max(1);
        info!("miner: starting mine loop with {} worker threads", workers);

        while !self.stop.is_stopped() {
            let (timestamp, last_hash) = {
                let chain = chain.read();
                let parent = chain.mining_parent();
                (parent.timestamp + 1, parent.hash.to_hex())
            };

            let mut transactions = self.mempool.drain(self.config.max_txns);
            // Fee accounting is out of scope: the core never validates
            // balances, so every coinbase pays a flat reward with no fees.
            transactions.push(Transaction::coinbase(self.config.miner_address.clone(), BLOCK_REWARD, 0));

            let stop = &self.stop;
            let solution = search::search(
                timestamp,
                &last_hash,
                &transactions,
                self.config.difficulty,
                workers,
                || stop.is_stopped(),
            );

            match solution {
                Some(block) => {
                    info!("miner: found block {} extending {}", block.hash, last_hash);
                    handler(block);
                }
                None => {
                    info!("miner: round aborted before a solution was found");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_chain::ChainConfig;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast_miner(stop: StopHandle) -> Miner {
        let config = MinerConfig { difficulty: 0, ..MinerConfig::default() };
        Miner::new(config, Arc::new(Mempool::new()), stop)
    }

    #[test]
    fn stop_signaled_before_start_skips_every_round() {
        let stop = StopHandle::new();
        stop.stop();
        let miner = fast_miner(stop);
        let chain = RwLock::new(Chain::new(ChainConfig::default()));
        let calls = AtomicUsize::new(0);
        miner.mine(&chain, |_| {
            calls.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn mine_calls_handler_once_per_round_until_stopped() {
        let stop = StopHandle::new();
        let miner = fast_miner(stop.clone());
        let chain = RwLock::new(Chain::new(ChainConfig::default()));
        let calls = AtomicUsize::new(0);
        miner.mine(&chain, |_block| {
            let seen = calls.fetch_add(1, Ordering::SeqCst) + 1;
            if seen >= 2 {
                stop.stop();
            }
        });
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn add_txn_rejects_duplicates_by_value() {
        let miner = fast_miner(StopHandle::new());
        let txn = Transaction::coinbase(Address::from("alice"), 1, 0);
        assert!(miner.add_txn(txn.clone()));
        assert!(!miner.add_txn(txn));
    }
}
