use ember_config::GlobalConfig;
use std::io::Write;

#[test]
fn file_config_round_trips_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let mut path = dir.path().to_path_buf();
    path.push("ember.toml");

    let default_config = GlobalConfig::default();
    default_config.write_to_file(path.to_str().unwrap()).unwrap();

    let loaded = GlobalConfig::new(Some(path.to_str().unwrap())).unwrap_or_else(|e| {
        panic!("error parsing config file: {}", e);
    });

    assert_eq!(default_config.members, loaded.members);
}

#[test]
fn missing_section_defaults_are_preserved() {
    let dir = tempfile::tempdir().unwrap();
    let mut path = dir.path().to_path_buf();
    path.push("ember.toml");

    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "[server]\ndb_root = \"./mychain\"\n").unwrap();

    let loaded = GlobalConfig::new(Some(path.to_str().unwrap())).unwrap();
    let members = loaded.members.unwrap();
    assert_eq!(members.server.db_root, "./mychain");
    assert_eq!(members.server.p2p_config.port, ember_core::consensus::DEFAULT_P2P_PORT);
}
