//! Errors surfaced by peer connection management and the overlay protocol.

use thiserror::Error;

use crate::types::PeerAddr;

#[derive(Debug, Error)]
pub enum Error {
    #[error("i/o error on peer connection: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed envelope: {0}")]
    Json(#[from] serde_json::Error),
    #[error("already connected to {0}")]
    Duplicate(PeerAddr),
    #[error("invalid peer address: {0}")]
    InvalidAddress(String),
    #[error("peer {0} closed the connection")]
    Closed(PeerAddr),
    #[error("no reply received before the timeout")]
    Timeout,
    #[error("unknown peer {0}")]
    UnknownPeer(PeerAddr),
}
