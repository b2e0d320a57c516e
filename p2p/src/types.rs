//! Wire-level types for the overlay protocol: the envelope schema, peer
//! address/role vocabulary, and request fan-out modes. Messages are
//! newline-delimited JSON rather than a binary, length-prefixed framing.

use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A peer's network address: a thin, `Display`/`FromStr`-able wrapper
/// around [`SocketAddr`] so it doubles as a registry key and a wire value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerAddr(pub SocketAddr);

impl fmt::Display for PeerAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PeerAddr {
    type Err = std::net::AddrParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(PeerAddr(s.parse()?))
    }
}

impl From<SocketAddr> for PeerAddr {
    fn from(addr: SocketAddr) -> Self {
        PeerAddr(addr)
    }
}

/// Which side opened a connection. Only the side that dialed out may issue
/// requests; the side that was dialed only answers them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionRole {
    Outbound,
    Inbound,
}

/// The four envelope kinds of the overlay protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeType {
    Get,
    Post,
    Okay,
    Error,
}

/// A single overlay protocol message. One JSON object is sent per line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: EnvelopeType,
    pub data: Value,
}

impl Envelope {
    pub fn get(command: &str, params: Value) -> Envelope {
        Envelope { kind: EnvelopeType::Get, data: with_command(command, params) }
    }

    pub fn post(command: &str, params: Value) -> Envelope {
        Envelope { kind: EnvelopeType::Post, data: with_command(command, params) }
    }

    pub fn okay(command: &str, params: Value) -> Envelope {
        Envelope { kind: EnvelopeType::Okay, data: with_command(command, params) }
    }

    pub fn error(message: impl Into<String>) -> Envelope {
        Envelope { kind: EnvelopeType::Error, data: serde_json::json!({ "message": message.into() }) }
    }

    /// The envelope's `data.command` field, if present.
    pub fn command(&self) -> Option<&str> {
        self.data.get("command").and_then(Value::as_str)
    }
}

fn with_command(command: &str, mut params: Value) -> Value {
    if !params.is_object() {
        params = serde_json::json!({});
    }
    params["command"] = Value::String(command.to_string());
    params
}

/// Fan-out mode for [`crate::peers::Peers::request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    /// Broadcast to every outbound peer and collect replies.
    All,
    /// Send to exactly one named peer and await its reply.
    Single,
}

/// When [`crate::peers::Peers::recv_all`] should stop waiting on replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnWhen {
    FirstCompleted,
    AllCompleted,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_envelope_carries_the_command_name() {
        let env = Envelope::get("get_height", serde_json::json!({ "unconfirmed": true }));
        assert_eq!(env.command(), Some("get_height"));
        assert_eq!(env.data["unconfirmed"], true);
    }

    #[test]
    fn peer_addr_round_trips_through_display_and_from_str() {
        let addr: PeerAddr = "127.0.0.1:11111".parse().unwrap();
        assert_eq!(addr.to_string(), "127.0.0.1:11111");
    }
}
