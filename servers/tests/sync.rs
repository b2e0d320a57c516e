//! Two-node integration test: one node mines and confirms a short chain,
//! a second node joins with the first as its only seed and is expected to
//! pick up that chain through the startup sync handshake described for
//! the overlay's `get_height`/`get_blocks` verbs.

use std::net::SocketAddr;
use std::time::Duration;

use ember_config::{ConfigMembers, MiningConfig, P2pConfig, ServerConfig};
use ember_p2p::{CommandTable, Envelope, Peers, RequestMode};
use ember_servers::Node;
use ember_util::StopHandle;
use serde_json::json;

fn config(db_root: &std::path::Path, port: u16, seeds: Vec<String>, mine: bool) -> ConfigMembers {
    ConfigMembers {
        server: ServerConfig {
            db_root: db_root.to_string_lossy().into_owned(),
            p2p_config: P2pConfig { host: "127.0.0.1".to_string(), port, seeds },
        },
        mining: Some(MiningConfig { enable_mining: mine, miner_address: Some("tester".to_string()) }),
        logging: None,
    }
}

async fn query_height(port: u16) -> Option<u64> {
    let client = Peers::new(CommandTable::new(), StopHandle::new());
    let addr: SocketAddr = format!("127.0.0.1:{}", port).parse().unwrap();
    client.connect(addr).await.ok()?;
    let replies = client.request(Envelope::get("get_height", json!({})), RequestMode::Single, Some(addr.into())).await;
    replies.into_iter().next().and_then(|(_, env)| env.data.get("height").and_then(|h| h.as_u64()))
}

#[tokio::test]
async fn a_freshly_mined_chain_syncs_to_a_new_peer() {
    let dir_a = tempfile::tempdir().unwrap();
    let dir_b = tempfile::tempdir().unwrap();
    let port_a = 21471;
    let port_b = 21472;

    let node_a = Node::new(&config(dir_a.path(), port_a, Vec::new(), true), StopHandle::new()).unwrap();
    {
        let node_a = node_a.clone();
        tokio::spawn(async move {
            let _ = node_a.run().await;
        });
    }

    // Give node A's miner time to confirm a handful of blocks.
    let mut confirmed = None;
    for _ in 0..75 {
        tokio::time::sleep(Duration::from_millis(200)).await;
        if let Some(h) = query_height(port_a).await {
            if h > 1 {
                confirmed = Some(h);
                break;
            }
        }
    }
    let confirmed = confirmed.expect("node A never confirmed a block in time");

    let node_b = Node::new(
        &config(dir_b.path(), port_b, vec![format!("127.0.0.1:{}", port_a)], false),
        StopHandle::new(),
    )
    .unwrap();
    {
        let node_b = node_b.clone();
        tokio::spawn(async move {
            let _ = node_b.run().await;
        });
    }

    let mut synced = None;
    for _ in 0..75 {
        tokio::time::sleep(Duration::from_millis(200)).await;
        if let Some(h) = query_height(port_b).await {
            if h >= confirmed {
                synced = Some(h);
                break;
            }
        }
    }

    assert_eq!(synced, Some(confirmed), "node B did not sync node A's confirmed chain");
}
