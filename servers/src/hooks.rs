//! Event hooks for network and chain activity, logged at the points the
//! orchestration loop already touches.

use log::{debug, info};

use ember_chain::InsertOutcome;
use ember_core::{Block, Hash, Transaction};
use ember_p2p::PeerAddr;

/// Overlay-level events: gossip arriving from a peer.
#[allow(unused_variables)]
pub trait NetEvents {
    fn on_transaction_received(&self, txn: &Transaction, from: PeerAddr) {}
    fn on_block_received(&self, hash: Hash, from: PeerAddr) {}
}

/// Chain-level events: the outcome of handing a block to the chain engine.
#[allow(unused_variables)]
pub trait ChainEvents {
    fn on_block_accepted(&self, block: &Block, outcome: &InsertOutcome) {}
}

/// The default hook set: logs everything at `debug`/`info`, same as the
/// teacher's `EventLogger`.
pub struct EventLogger;

impl NetEvents for EventLogger {
    fn on_transaction_received(&self, txn: &Transaction, from: PeerAddr) {
        debug!("hooks: received txn from {} (sender {})", from, txn.sender);
    }

    fn on_block_received(&self, hash: Hash, from: PeerAddr) {
        debug!("hooks: received block {} from {}", hash, from);
    }
}

impl ChainEvents for EventLogger {
    fn on_block_accepted(&self, block: &Block, outcome: &InsertOutcome) {
        match outcome {
            InsertOutcome::Confirmed | InsertOutcome::Attached => {
                info!("hooks: block {} accepted ({:?})", block.hash, outcome);
            }
            InsertOutcome::Orphaned => {
                debug!("hooks: block {} orphaned, awaiting its parent", block.hash);
            }
            InsertOutcome::Duplicate | InsertOutcome::Rejected => {
                debug!("hooks: block {} ignored ({:?})", block.hash, outcome);
            }
        }
    }
}
