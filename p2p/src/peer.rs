//! A single connected peer: its outbound send queue, pending-request slot,
//! and the read loop that dispatches arriving envelopes into the command
//! table.

use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use log::{debug, warn};
use parking_lot::Mutex;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_util::codec::{Framed, LinesCodec};

use crate::commands::CommandTable;
use crate::error::Error;
use crate::types::{ConnectionRole, Envelope, EnvelopeType, PeerAddr};

/// A connected peer and the means to talk to it.
#[derive(Debug)]
pub struct Peer {
    pub addr: PeerAddr,
    pub role: ConnectionRole,
    outbox: mpsc::UnboundedSender<Envelope>,
    pending_reply: Mutex<Option<oneshot::Sender<Envelope>>>,
}

impl Peer {
    /// Queues `envelope` for delivery. Fails only once this peer's write
    /// half has shut down.
    pub fn send(&self, envelope: Envelope) -> Result<(), Error> {
        self.outbox.send(envelope).map_err(|_| Error::Closed(self.addr))
    }

    /// Sends `envelope` and waits for the next `okay`/`error` envelope the
    /// read loop routes back to this peer's pending-reply slot. Only one
    /// request may be outstanding per peer at a time.
    pub async fn request(&self, envelope: Envelope) -> Result<Envelope, Error> {
        let (tx, rx) = oneshot::channel();
        *self.pending_reply.lock() = Some(tx);
        self.send(envelope)?;
        rx.await.map_err(|_| Error::Closed(self.addr))
    }

    fn resolve_reply(&self, envelope: Envelope) {
        if let Some(tx) = self.pending_reply.lock().take() {
            let _ = tx.send(envelope);
        }
    }
}

/// Splits `stream` into newline-delimited JSON read/write halves, spawns
/// the write-drain and read-dispatch tasks, and returns the new [`Peer`].
/// `on_close` runs once the connection ends, however it ends.
pub fn spawn(
    stream: TcpStream,
    addr: PeerAddr,
    role: ConnectionRole,
    commands: Arc<CommandTable>,
    on_close: impl FnOnce(PeerAddr) + Send + 'static,
) -> Arc<Peer> {
    let framed = Framed::new(stream, LinesCodec::new());
    let (mut sink, mut reader) = framed.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Envelope>();

    let peer = Arc::new(Peer { addr, role, outbox: tx, pending_reply: Mutex::new(None) });

    tokio::spawn(async move {
        while let Some(envelope) = rx.recv().await {
            let line = match serde_json::to_string(&envelope) {
                Ok(line) => line,
                Err(e) => {
                    warn!("p2p: failed to encode outgoing envelope to {}: {}", addr, e);
                    continue;
                }
            };
            if sink.send(line).await.is_err() {
                break;
            }
        }
    });

    let read_peer = peer.clone();
    tokio::spawn(async move {
        loop {
            let line = match reader.next().await {
                Some(Ok(line)) => line,
                Some(Err(e)) => {
                    debug!("p2p: read error from {}: {}", addr, e);
                    break;
                }
                None => break,
            };
            let envelope: Envelope = match serde_json::from_str(&line) {
                Ok(envelope) => envelope,
                Err(e) => {
                    debug!("p2p: malformed envelope from {}: {}", addr, e);
                    let _ = read_peer.send(Envelope::error(format!("malformed envelope: {}", e)));
                    continue;
                }
            };
            dispatch(&read_peer, envelope, &commands);
        }
        on_close(addr);
    });

    peer
}

fn dispatch(peer: &Arc<Peer>, envelope: Envelope, commands: &CommandTable) {
    match envelope.kind {
        EnvelopeType::Error => {
            warn!("p2p: peer {} reported an error: {:?}", peer.addr, envelope.data);
            peer.resolve_reply(envelope);
        }
        EnvelopeType::Okay => {
            peer.resolve_reply(envelope);
        }
        EnvelopeType::Get => match command_of(peer, &envelope) {
            Some(command) => match commands.entry(&command).and_then(|e| e.get.clone()) {
                Some(handler) => {
                    let reply = handler(envelope.data);
                    let _ = peer.send(reply);
                }
                None => {
                    let _ = peer.send(Envelope::error(format!("unknown command: {}", command)));
                }
            },
            None => {}
        },
        EnvelopeType::Post => match command_of(peer, &envelope) {
            Some(command) => match commands.entry(&command).and_then(|e| e.post.clone()) {
                Some(handler) => {
                    if let Some(reply) = handler(peer.clone(), envelope.data) {
                        let _ = peer.send(reply);
                    }
                }
                None => {
                    let _ = peer.send(Envelope::error(format!("unknown command: {}", command)));
                }
            },
            None => {}
        },
    }
}

fn command_of(peer: &Arc<Peer>, envelope: &Envelope) -> Option<String> {
    match envelope.command() {
        Some(command) => Some(command.to_string()),
        None => {
            let _ = peer.send(Envelope::error("missing command"));
            None
        }
    }
}
