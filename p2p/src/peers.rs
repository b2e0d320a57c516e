//! Peer registry and connection management: accept/connect, broadcast, and
//! the request/response fan-out primitives, over `tokio` and a
//! newline-delimited JSON transport.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use log::{info, warn};
use tokio::net::{TcpListener, TcpStream};

use ember_util::{RwLock, StopHandle};

use crate::commands::CommandTable;
use crate::error::Error;
use crate::peer::{self, Peer};
use crate::types::{ConnectionRole, Envelope, PeerAddr, RequestMode, ReturnWhen};

/// Default per-reply timeout for [`Peers::request`] and [`Peers::recv_all`].
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Default)]
struct Registry {
    outbound: HashMap<PeerAddr, Arc<Peer>>,
    inbound: HashMap<PeerAddr, Arc<Peer>>,
}

/// Which connections [`Peers::disconnect`] should close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectTarget {
    Peer(PeerAddr),
    AllOutbound,
    AllInbound,
    All,
}

pub struct Peers {
    registry: RwLock<Registry>,
    commands: Arc<CommandTable>,
    stop: StopHandle,
}

impl Peers {
    pub fn new(commands: CommandTable, stop: StopHandle) -> Arc<Peers> {
        Arc::new(Peers { registry: RwLock::new(Registry::default()), commands: Arc::new(commands), stop })
    }

    /// Binds `port`, connects to each of `initial_peers`, then accepts
    /// inbound connections until the shared stop signal fires.
    pub async fn start(self: &Arc<Self>, port: u16, initial_peers: &[SocketAddr]) -> Result<(), Error> {
        for addr in initial_peers {
            if let Err(e) = self.connect(*addr).await {
                warn!("p2p: failed to connect to bootstrap peer {}: {}", addr, e);
            }
        }

        let listener = TcpListener::bind(("0.0.0.0", port)).await?;
        info!("p2p: listening on port {}", port);

        loop {
            tokio::select! {
                _ = self.stop.wait() => {
                    info!("p2p: listener stopping");
                    return Ok(());
                }
                accepted = listener.accept() => {
                    let (stream, remote) = accepted?;
                    self.accept(stream, PeerAddr(remote));
                }
            }
        }
    }

    fn accept(self: &Arc<Self>, stream: TcpStream, addr: PeerAddr) {
        let this = self.clone();
        let p = peer::spawn(stream, addr, ConnectionRole::Inbound, self.commands.clone(), move |addr| {
            this.registry.write().inbound.remove(&addr);
        });
        self.registry.write().inbound.insert(addr, p);
        info!("p2p: accepted inbound connection from {}", addr);
    }

    /// Opens an outbound connection to `addr`. Refuses a second connection
    /// to the same remote endpoint.
    pub async fn connect(self: &Arc<Self>, addr: SocketAddr) -> Result<Arc<Peer>, Error> {
        let addr = PeerAddr(addr);
        if self.registry.read().outbound.contains_key(&addr) {
            return Err(Error::Duplicate(addr));
        }
        let stream = TcpStream::connect(addr.0).await?;
        let this = self.clone();
        let p = peer::spawn(stream, addr, ConnectionRole::Outbound, self.commands.clone(), move |addr| {
            this.registry.write().outbound.remove(&addr);
        });
        self.registry.write().outbound.insert(addr, p.clone());
        info!("p2p: connected outbound to {}", addr);
        Ok(p)
    }

    pub fn outbound_peer(&self, addr: &PeerAddr) -> Option<Arc<Peer>> {
        self.registry.read().outbound.get(addr).cloned()
    }

    pub fn outbound_peers(&self) -> Vec<Arc<Peer>> {
        self.registry.read().outbound.values().cloned().collect()
    }

    pub fn inbound_peers(&self) -> Vec<Arc<Peer>> {
        self.registry.read().inbound.values().cloned().collect()
    }

    /// Closes one peer, every outbound peer, every inbound peer, or all
    /// connections, depending on `target`.
    pub fn disconnect(&self, target: DisconnectTarget) {
        let mut registry = self.registry.write();
        match target {
            DisconnectTarget::Peer(addr) => {
                registry.outbound.remove(&addr);
                registry.inbound.remove(&addr);
            }
            DisconnectTarget::AllOutbound => registry.outbound.clear(),
            DisconnectTarget::AllInbound => registry.inbound.clear(),
            DisconnectTarget::All => {
                registry.outbound.clear();
                registry.inbound.clear();
            }
        }
    }

    /// Sends `message` to every outbound peer. Best-effort: a send failure
    /// for one peer doesn't affect the others.
    pub fn broadcast(&self, message: Envelope) {
        for peer in self.outbound_peers() {
            if let Err(e) = peer.send(message.clone()) {
                warn!("p2p: broadcast to {} failed: {}", peer.addr, e);
            }
        }
    }

    /// Issues a `get` request. In [`RequestMode::Single`], `peer` names the
    /// target and its reply (if any arrives before the timeout) is
    /// returned. In [`RequestMode::All`], every outbound peer is asked and
    /// replies are collected until all reply or the timeout elapses; slow
    /// peers are omitted from the result.
    pub async fn request(&self, message: Envelope, mode: RequestMode, peer: Option<PeerAddr>) -> Vec<(PeerAddr, Envelope)> {
        match mode {
            RequestMode::Single => {
                let Some(addr) = peer else { return Vec::new() };
                let Some(target) = self.outbound_peer(&addr) else { return Vec::new() };
                match tokio::time::timeout(DEFAULT_REQUEST_TIMEOUT, target.request(message)).await {
                    Ok(Ok(reply)) => vec![(addr, reply)],
                    _ => Vec::new(),
                }
            }
            RequestMode::All => self.recv_all(message, ReturnWhen::AllCompleted, DEFAULT_REQUEST_TIMEOUT).await,
        }
    }

    /// The primitive behind request-ALL: one receive task per outbound
    /// peer, waiting until `return_when` or `timeout` elapses, then
    /// cancelling the rest.
    pub async fn recv_all(&self, message: Envelope, return_when: ReturnWhen, timeout: Duration) -> Vec<(PeerAddr, Envelope)> {
        let peers = self.outbound_peers();
        let mut tasks: FuturesUnordered<_> = peers
            .into_iter()
            .map(|peer| {
                let message = message.clone();
                async move {
                    let addr = peer.addr;
                    peer.request(message).await.ok().map(|reply| (addr, reply))
                }
            })
            .collect();

        let mut results = Vec::new();
        let deadline = tokio::time::sleep(timeout);
        tokio::pin!(deadline);
        loop {
            tokio::select! {
                _ = &mut deadline => break,
                next = tasks.next() => {
                    match next {
                        Some(Some(pair)) => {
                            results.push(pair);
                            if return_when == ReturnWhen::FirstCompleted {
                                break;
                            }
                        }
                        Some(None) => continue,
                        None => break,
                    }
                }
            }
        }
        results
    }
}
