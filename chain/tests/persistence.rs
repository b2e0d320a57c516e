use ember_chain::{Chain, ChainConfig, InsertOutcome};
use ember_core::{Address, Block, Hashed, Transaction};

fn mined_block(parent: &Block, nonce: &str) -> Block {
    let coinbase = Transaction::coinbase(Address::from("miner"), 10, 0);
    Block::new(parent.timestamp + 1, parent.hash.to_hex(), vec![coinbase], nonce.to_string())
}

fn config_in(dir: &std::path::Path) -> ChainConfig {
    ChainConfig { data_dir: dir.to_path_buf(), confirmation_depth: 3, prune_slack: 2, ..ChainConfig::default() }
}

#[test]
fn mining_ten_blocks_then_save_and_reload_reproduces_the_confirmed_chain() {
    let dir = tempfile::tempdir().unwrap();
    let mut chain = Chain::new(config_in(dir.path()));

    let mut tip = chain.confirmed_tip().clone();
    for i in 0..10 {
        let next = mined_block(&tip, &i.to_string());
        assert_eq!(chain.add_block(next.clone(), false), InsertOutcome::Attached);
        tip = next;
    }
    chain.save().unwrap();

    let reloaded = Chain::load(config_in(dir.path())).unwrap();
    assert_eq!(chain.height(false), reloaded.height(false));
    assert_eq!(chain.confirmed_blocks(), reloaded.confirmed_blocks());

    let eleventh = mined_block(reloaded.confirmed_tip(), "eleventh");
    assert_eq!(eleventh.last_hash, reloaded.confirmed_tip().hash.to_hex());
}

#[test]
fn fresh_data_dir_loads_as_genesis_only() {
    let dir = tempfile::tempdir().unwrap();
    let chain = Chain::load(config_in(dir.path())).unwrap();
    assert_eq!(chain.height(false), 1);
}
