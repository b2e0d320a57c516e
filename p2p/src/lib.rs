//! Peer connection management and the JSON-framed overlay protocol:
//! envelope schema, command dispatch table, and broadcast/request
//! primitives.

#![deny(non_upper_case_globals)]
#![deny(non_camel_case_types)]
#![deny(non_snake_case)]
#![deny(unused_mut)]

pub mod commands;
pub mod error;
pub mod peer;
pub mod peers;
pub mod types;

pub use commands::{CommandEntry, CommandTable};
pub use error::Error;
pub use peer::Peer;
pub use peers::{DisconnectTarget, Peers};
pub use types::{ConnectionRole, Envelope, EnvelopeType, PeerAddr, RequestMode, ReturnWhen};
