//! The node's top-level error type, wrapping each underlying module's own
//! error.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("chain error: {0}")]
    Chain(#[from] ember_chain::Error),

    #[error("overlay error: {0}")]
    P2p(#[from] ember_p2p::Error),

    #[error("configuration error: {0}")]
    Config(#[from] ember_config::ConfigError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no peers reported a usable height during startup sync")]
    NoSyncPeer,
}
