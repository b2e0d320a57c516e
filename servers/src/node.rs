//! Node orchestration: wires the chain engine, mempool, miner and overlay
//! together behind a single handle, one struct owning every subsystem,
//! started once and driven until a shared stop flag fires.

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::{Arc, Weak};

use log::{info, warn};
use serde_json::{json, Value};
use tokio::sync::mpsc;

use ember_chain::{Chain, ChainConfig};
use ember_config::ConfigMembers;
use ember_core::{Block, Hash, Hashed, Transaction};
use ember_miner::{Miner, MinerConfig};
use ember_p2p::{CommandTable, Envelope, Peer, Peers, RequestMode};
use ember_pool::Mempool;
use ember_util::{DedupSet, RwLock, StopHandle};

use crate::error::Error;
use crate::hooks::{ChainEvents, EventLogger, NetEvents};

fn build_chain_config(server: &ember_config::ServerConfig) -> ChainConfig {
    let mut data_dir = std::path::PathBuf::from(&server.db_root);
    data_dir.push("chain");
    ChainConfig { data_dir, ..ChainConfig::default() }
}

fn build_miner_config(mining: &Option<ember_config::MiningConfig>) -> Option<MinerConfig> {
    let mining = mining.as_ref()?;
    if !mining.enable_mining {
        return None;
    }
    let default = MinerConfig::default();
    let miner_address = mining.miner_address.clone().map(ember_core::Address::from).unwrap_or(default.miner_address);
    Some(MinerConfig { miner_address, ..MinerConfig::default() })
}

fn parse_seeds(seeds: &[String]) -> Vec<SocketAddr> {
    seeds
        .iter()
        .filter_map(|s| match s.parse() {
            Ok(addr) => Some(addr),
            Err(e) => {
                warn!("node: ignoring unparsable seed address {}: {}", s, e);
                None
            }
        })
        .collect()
}

/// The running node: chain, mempool, overlay and (optionally) the miner,
/// plus the two bounded dedup sets gossip correctness depends on.
pub struct Node {
    chain: Arc<RwLock<Chain>>,
    chain_config: ChainConfig,
    mempool: Arc<Mempool>,
    peers: Arc<Peers>,
    miner: Option<Arc<Miner>>,
    seen_blocks: DedupSet<Hash>,
    seen_txns: DedupSet<Hash>,
    stop: StopHandle,
    p2p_port: u16,
    seeds: Vec<String>,
    chain_hooks: Box<dyn ChainEvents + Send + Sync>,
    net_hooks: Box<dyn NetEvents + Send + Sync>,
}

impl Node {
    /// Builds a node from a loaded configuration. Loads any persisted
    /// chain state from `config.server.db_root` before returning.
    pub fn new(config: &ConfigMembers, stop: StopHandle) -> Result<Arc<Node>, Error> {
        let chain_config = build_chain_config(&config.server);
        let chain = Chain::load(chain_config.clone())?;
        let mempool = Arc::new(Mempool::new());
        let miner_config = build_miner_config(&config.mining);
        let miner = miner_config.map(|mc| Arc::new(Miner::new(mc, mempool.clone(), stop.clone())));

        let node = Arc::new_cyclic(move |weak: &Weak<Node>| {
            let commands = Node::command_table(weak.clone());
            let peers = Peers::new(commands, stop.clone());
            Node {
                chain: Arc::new(RwLock::new(chain)),
                chain_config,
                mempool,
                peers,
                miner,
                seen_blocks: DedupSet::default(),
                seen_txns: DedupSet::default(),
                stop,
                p2p_port: config.server.p2p_config.port,
                seeds: config.server.p2p_config.seeds.clone(),
                chain_hooks: Box::new(EventLogger),
                net_hooks: Box::new(EventLogger),
            }
        });
        Ok(node)
    }

    /// Connects to configured seeds, runs the startup sync described in
    /// the node orchestration design, then starts the overlay listener and
    /// (if configured) the miner. Runs until [`StopHandle::stop`] is
    /// called.
    pub async fn run(self: &Arc<Self>) -> Result<(), Error> {
        for addr in parse_seeds(&self.seeds) {
            if let Err(e) = self.peers.connect(addr).await {
                warn!("node: failed to connect to seed {}: {}", addr, e);
            }
        }

        self.sync_if_needed().await?;

        let peers = self.peers.clone();
        let port = self.p2p_port;
        tokio::spawn(async move {
            if let Err(e) = peers.start(port, &[]).await {
                log::error!("node: overlay listener failed: {}", e);
            }
        });

        if let Some(miner) = self.miner.clone() {
            self.start_mining(miner);
        }

        self.stop.wait().await;
        info!("node: shutting down");
        Ok(())
    }

    /// If the local chain holds nothing but genesis, asks every connected
    /// peer its height, fetches the tallest peer's blocks, and trust-
    /// inserts them before persisting the result.
    async fn sync_if_needed(self: &Arc<Self>) -> Result<(), Error> {
        if self.chain.read().height(false) > 1 {
            return Ok(());
        }

        let replies = self
            .peers
            .request(Envelope::get("get_height", json!({})), RequestMode::All, None)
            .await;
        let best = replies
            .iter()
            .filter_map(|(addr, env)| env.data.get("height").and_then(Value::as_u64).map(|h| (*addr, h)))
            .max_by_key(|(_, height)| *height);

        let Some((addr, best_height)) = best else {
            info!("node: no peers responded during startup sync, starting from genesis alone");
            return Ok(());
        };
        if best_height <= 1 {
            return Ok(());
        }
        let Some(peer) = self.peers.outbound_peer(&addr) else {
            return Ok(());
        };

        info!("node: syncing {} blocks from {}", best_height - 1, addr);
        let reply = peer
            .request(Envelope::get("get_blocks", json!({ "start_height": 1, "end_height": best_height - 1 })))
            .await?;
        let blocks_value = reply.data.get("blocks").cloned().unwrap_or(Value::Null);
        let blocks: Vec<Block> = serde_json::from_value(blocks_value).map_err(|_| Error::NoSyncPeer)?;

        let mut synced = Chain::new(self.chain_config.clone());
        for block in blocks {
            synced.add_block(block, true);
        }
        synced.save()?;
        *self.chain.write() = synced;
        Ok(())
    }

    fn start_mining(self: &Arc<Self>, miner: Arc<Miner>) {
        let chain = self.chain.clone();
        let (tx, mut rx) = mpsc::unbounded_channel::<Block>();
        std::thread::spawn(move || {
            miner.mine(&chain, |block| {
                let _ = tx.send(block);
            });
        });

        let node = self.clone();
        tokio::spawn(async move {
            while let Some(block) = rx.recv().await {
                node.accept_block(block);
            }
        });
    }

    /// Inserts `block` (mined locally or fetched from a peer), persisting
    /// and gossiping `post_block` if it produced a new confirmed tip.
    fn accept_block(&self, block: Block) {
        self.seen_blocks.insert_seen(block.hash);
        let before = self.chain.read().confirmed_tip().hash;
        let outcome = self.chain.write().add_block(block.clone(), false);
        self.chain_hooks.on_block_accepted(&block, &outcome);
        let after = self.chain.read().confirmed_tip().hash;
        if after != before {
            if let Err(e) = self.chain.read().save() {
                warn!("node: failed to persist chain after new tip {}: {}", after, e);
            }
            self.peers.broadcast(Envelope::post("post_block", json!({ "hash": after.to_hex() })));
        }
    }

    fn command_table(weak: Weak<Node>) -> CommandTable {
        let mut table = CommandTable::new();

        let w = weak.clone();
        table.on_get("get_block", move |params: Value| get_block(&w, params));

        let w = weak.clone();
        table.on_get("get_blocks", move |params: Value| get_blocks(&w, params));

        let w = weak.clone();
        table.on_get("get_nodes", move |_params: Value| get_nodes(&w));

        let w = weak.clone();
        table.on_get("get_height", move |params: Value| get_height(&w, params));

        let w = weak.clone();
        table.on_get("get_hash", move |params: Value| get_hash(&w, params));

        let w = weak.clone();
        table.on_post("post_block", move |peer: Arc<Peer>, params: Value| post_block(&w, peer, params));

        let w = weak.clone();
        table.on_post("post_txn", move |peer: Arc<Peer>, params: Value| post_txn(&w, peer, params));

        table
    }
}

fn get_block(weak: &Weak<Node>, params: Value) -> Envelope {
    let Some(node) = weak.upgrade() else { return Envelope::error("node shutting down") };
    let chain = node.chain.read();
    let block = if let Some(hash) = params.get("hash").and_then(Value::as_str).and_then(|s| Hash::from_str(s).ok()) {
        chain.get_block(&hash).cloned()
    } else if let Some(height) = params.get("height").and_then(Value::as_u64) {
        chain.confirmed_blocks().get(height as usize).cloned()
    } else {
        None
    };
    match block {
        Some(block) => Envelope::okay("get_block", json!({ "block": block })),
        None => Envelope::error("block not found"),
    }
}

fn get_blocks(weak: &Weak<Node>, params: Value) -> Envelope {
    let Some(node) = weak.upgrade() else { return Envelope::error("node shutting down") };
    let chain = node.chain.read();
    let blocks: Vec<Block> = if let Some(hashes) = params.get("hashes").and_then(Value::as_array) {
        hashes
            .iter()
            .filter_map(Value::as_str)
            .filter_map(|s| Hash::from_str(s).ok())
            .filter_map(|h| chain.get_block(&h).cloned())
            .collect()
    } else if let (Some(start), Some(end)) =
        (params.get("start_height").and_then(Value::as_u64), params.get("end_height").and_then(Value::as_u64))
    {
        let count = end.saturating_sub(start) + 1;
        chain.confirmed_blocks().iter().skip(start as usize).take(count as usize).cloned().collect()
    } else {
        Vec::new()
    };
    Envelope::okay("get_blocks", json!({ "blocks": blocks }))
}

fn get_nodes(weak: &Weak<Node>) -> Envelope {
    let Some(node) = weak.upgrade() else { return Envelope::error("node shutting down") };
    let outbound: Vec<String> = node.peers.outbound_peers().iter().map(|p| p.addr.to_string()).collect();
    Envelope::okay("get_nodes", json!({ "outbound": outbound }))
}

fn get_height(weak: &Weak<Node>, params: Value) -> Envelope {
    let Some(node) = weak.upgrade() else { return Envelope::error("node shutting down") };
    let unconfirmed = params.get("unconfirmed").and_then(Value::as_bool).unwrap_or(false);
    let height = node.chain.read().height(unconfirmed);
    Envelope::okay("get_height", json!({ "height": height }))
}

fn get_hash(weak: &Weak<Node>, params: Value) -> Envelope {
    let Some(node) = weak.upgrade() else { return Envelope::error("node shutting down") };
    let chain = node.chain.read();
    let hash = if let Some(height) = params.get("height").and_then(Value::as_u64) {
        chain.confirmed_blocks().get(height as usize).map(|b| b.hash)
    } else {
        Some(chain.confirmed_tip().hash)
    };
    match hash {
        Some(hash) => Envelope::okay("get_hash", json!({ "hash": hash.to_hex() })),
        None => Envelope::error("height out of range"),
    }
}

/// De-duplicates by hash, then fetches the block from its announcing peer
/// and inserts it, re-broadcasting if it produced a new confirmed tip.
fn post_block(weak: &Weak<Node>, peer: Arc<Peer>, params: Value) -> Option<Envelope> {
    let node = weak.upgrade()?;
    let hash_str = params.get("hash").and_then(Value::as_str)?;
    let hash = Hash::from_str(hash_str).ok()?;
    if node.seen_blocks.insert_seen(hash) {
        return None;
    }
    node.net_hooks.on_block_received(hash, peer.addr);

    tokio::spawn(async move {
        let reply = match peer.request(Envelope::get("get_block", json!({ "hash": hash.to_hex() }))).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("node: fetching block {} from {} failed: {}", hash, peer.addr, e);
                return;
            }
        };
        let Some(block_value) = reply.data.get("block").cloned() else { return };
        let Ok(block) = serde_json::from_value::<Block>(block_value) else { return };
        node.accept_block(block);
    });
    None
}

/// De-duplicates by transaction identity, feeds the miner's mempool if one
/// is configured, and re-broadcasts unseen transactions.
fn post_txn(weak: &Weak<Node>, peer: Arc<Peer>, params: Value) -> Option<Envelope> {
    let node = weak.upgrade()?;
    let txn_value = params.get("txn").cloned()?;
    let txn: Transaction = serde_json::from_value(txn_value).ok()?;
    let hash = txn.hash();
    if node.seen_txns.insert_seen(hash) {
        return None;
    }
    node.net_hooks.on_transaction_received(&txn, peer.addr);

    if let Some(miner) = &node.miner {
        miner.add_txn(txn.clone());
    }
    node.peers.broadcast(Envelope::post("post_txn", json!({ "txn": txn })));
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_config::{P2pConfig, ServerConfig};
    use ember_core::Address;
    use ember_p2p::EnvelopeType;

    fn test_config(dir: &std::path::Path, port: u16) -> ConfigMembers {
        ConfigMembers {
            server: ServerConfig {
                db_root: dir.to_string_lossy().into_owned(),
                p2p_config: P2pConfig { host: "127.0.0.1".to_string(), port, seeds: Vec::new() },
            },
            mining: None,
            logging: None,
        }
    }

    fn test_node(dir: &std::path::Path, port: u16) -> Arc<Node> {
        Node::new(&test_config(dir, port), StopHandle::new()).unwrap()
    }

    fn mined_block(parent: &Block, nonce: &str) -> Block {
        let coinbase = Transaction::coinbase(Address::from("miner"), 10, 0);
        Block::new(parent.timestamp + 1, parent.hash.to_hex(), vec![coinbase], nonce.to_string())
    }

    #[test]
    fn get_height_reports_genesis_only_chain() {
        let dir = tempfile::tempdir().unwrap();
        let node = test_node(dir.path(), 31001);
        let weak = Arc::downgrade(&node);
        assert_eq!(get_height(&weak, json!({})).data["height"], 1);
    }

    #[test]
    fn get_height_counts_unconfirmed_blocks_when_asked() {
        let dir = tempfile::tempdir().unwrap();
        let node = test_node(dir.path(), 31002);
        let genesis = node.chain.read().confirmed_tip().clone();
        node.accept_block(mined_block(&genesis, "a"));

        let weak = Arc::downgrade(&node);
        assert_eq!(get_height(&weak, json!({})).data["height"], 1);
        assert_eq!(get_height(&weak, json!({ "unconfirmed": true })).data["height"], 2);
    }

    #[test]
    fn get_block_finds_by_hash_and_by_height_and_errors_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let node = test_node(dir.path(), 31003);
        let weak = Arc::downgrade(&node);

        assert!(get_block(&weak, json!({ "height": 0 })).data["block"].is_object());

        let genesis_hash = node.chain.read().confirmed_tip().hash.to_hex();
        assert!(get_block(&weak, json!({ "hash": genesis_hash })).data["block"].is_object());

        assert_eq!(get_block(&weak, json!({ "height": 99 })).kind, EnvelopeType::Error);
    }

    #[test]
    fn get_blocks_honors_both_selection_modes() {
        let dir = tempfile::tempdir().unwrap();
        let node = test_node(dir.path(), 31004);
        let mut tip = node.chain.read().confirmed_tip().clone();
        for i in 0..4 {
            let next = mined_block(&tip, &i.to_string());
            node.accept_block(next.clone());
            tip = next;
        }
        // four unconfirmed blocks in a single chain promote the first past confirmation depth.
        assert_eq!(node.chain.read().height(false), 2);

        let weak = Arc::downgrade(&node);
        let by_range = get_blocks(&weak, json!({ "start_height": 0, "end_height": 1 }));
        assert_eq!(by_range.data["blocks"].as_array().unwrap().len(), 2);

        let genesis_hash = node.chain.read().confirmed_blocks()[0].hash.to_hex();
        let by_hash = get_blocks(&weak, json!({ "hashes": [genesis_hash] }));
        assert_eq!(by_hash.data["blocks"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn get_hash_resolves_tip_and_specific_height_and_errors_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        let node = test_node(dir.path(), 31005);
        let weak = Arc::downgrade(&node);

        let tip = get_hash(&weak, json!({}));
        let by_height = get_hash(&weak, json!({ "height": 0 }));
        assert_eq!(tip.data["hash"], by_height.data["hash"]);

        assert_eq!(get_hash(&weak, json!({ "height": 50 })).kind, EnvelopeType::Error);
    }

    #[test]
    fn get_nodes_reports_no_outbound_peers_for_an_isolated_node() {
        let dir = tempfile::tempdir().unwrap();
        let node = test_node(dir.path(), 31006);
        let weak = Arc::downgrade(&node);
        assert_eq!(get_nodes(&weak).data["outbound"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn accept_block_deduplicates_and_only_broadcasts_on_a_new_tip() {
        let dir = tempfile::tempdir().unwrap();
        let node = test_node(dir.path(), 31007);
        let genesis = node.chain.read().confirmed_tip().clone();
        let block = mined_block(&genesis, "a");

        node.seen_blocks.insert_seen(block.hash);
        assert!(node.seen_blocks.insert_seen(block.hash), "second insert of the same hash should report a duplicate");

        node.accept_block(block.clone());
        assert_eq!(node.chain.read().height(true), 2);
    }

    #[test]
    fn get_handlers_report_node_shutting_down_once_the_node_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let weak = {
            let node = test_node(dir.path(), 31008);
            Arc::downgrade(&node)
        };
        assert!(weak.upgrade().is_none());
        assert_eq!(get_height(&weak, json!({})).kind, EnvelopeType::Error);
        assert_eq!(get_nodes(&weak).kind, EnvelopeType::Error);
    }
}
