//! The parallel nonce-striding proof-of-work search: `W` worker threads
//! race to find a nonce whose digest meets the configured difficulty.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use log::warn;

use ember_core::{Block, Hash, Transaction};

/// How many candidate nonces a worker tries between checks of
/// `should_abort`, so the check doesn't dominate the hash loop.
const ABORT_CHECK_STRIDE: u64 = 2048;

/// Searches for a nonce producing a block hash meeting `difficulty` over
/// `timestamp ‖ last_hash ‖ transactions`, fanning the search out across
/// `worker_count` OS threads. Worker `i` tries nonces `{i, i+W, i+2W, ...}`.
/// Returns `None` if `should_abort` trips before any worker finds a
/// solution. A worker that panics is logged and treated as having found
/// nothing; the round continues as long as one worker remains.
pub fn search(
    timestamp: u64,
    last_hash: &str,
    transactions: &[Transaction],
    difficulty: usize,
    worker_count: usize,
    should_abort: impl Fn() -> bool + Sync,
) -> Option<Block> {
    let found = AtomicBool::new(false);
    let winner: Mutex<Option<Block>> = Mutex::new(None);

    std::thread::scope(|scope| {
        for worker in 0..worker_count {
            let found = &found;
            let winner = &winner;
            let should_abort = &should_abort;
            scope.spawn(move || {
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                    let mut nonce = worker as u64;
                    while !found.load(Ordering::Relaxed) {
                        if nonce % ABORT_CHECK_STRIDE == worker as u64 % ABORT_CHECK_STRIDE
                            && should_abort()
                        {
                            return;
                        }
                        let proof = nonce.to_string();
                        let preimage = Block::preimage_bytes(timestamp, last_hash, transactions, &proof);
                        let hash = Hash::digest(&preimage);
                        if hash.meets_difficulty(difficulty) {
                            if !found.swap(true, Ordering::SeqCst) {
                                let block = Block {
                                    timestamp,
                                    last_hash: last_hash.to_string(),
                                    transactions: transactions.to_vec(),
                                    proof,
                                    hash,
                                };
                                *winner.lock().unwrap() = Some(block);
                            }
                            return;
                        }
                        nonce += worker_count as u64;
                    }
                }));
                if outcome.is_err() {
                    warn!("miner worker {} panicked; treating as no solution found this round", worker);
                }
            });
        }
    });

    winner.into_inner().unwrap()
}
