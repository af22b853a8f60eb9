//! Broadcast relay
//!
//! A WebSocket hub that does not interpret traffic: every well-formed JSON
//! text frame from any peer is re-serialized and sent to every connected peer,
//! the sender included. Anything else is dropped.

use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::{SinkExt, StreamExt};
use tokio::sync::{RwLock, mpsc};
use warp::Filter;
use warp::ws::{Message, WebSocket};

use crate::error::{GameError, Result};

pub type PeerId = u64;

/// Frames buffered per peer before further broadcasts to it are dropped
pub const PEER_QUEUE: usize = 256;

/// Shared set of connected peers
#[derive(Clone, Default)]
pub struct Relay {
    peers: Arc<RwLock<HashMap<PeerId, mpsc::Sender<Message>>>>,
    next_id: Arc<AtomicU64>,
}

impl Relay {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_peer(&self, tx: mpsc::Sender<Message>) -> PeerId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.peers.write().await.insert(id, tx);
        id
    }

    pub async fn remove_peer(&self, id: PeerId) {
        self.peers.write().await.remove(&id);
    }

    pub async fn peer_count(&self) -> usize {
        self.peers.read().await.len()
    }

    /// Fan a text frame out to every peer
    ///
    /// Returns how many peers it was queued for; zero if the text is not JSON.
    /// A peer whose queue is full misses this frame.
    pub async fn broadcast(&self, text: &str) -> usize {
        let value: serde_json::Value = match serde_json::from_str(text) {
            Ok(value) => value,
            Err(e) => {
                log::debug!("discarding non-JSON frame: {e}");
                return 0;
            }
        };
        let text = value.to_string();

        let peers = self.peers.read().await;
        let mut queued = 0;
        for (id, tx) in peers.iter() {
            match tx.try_send(Message::text(text.clone())) {
                Ok(()) => queued += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    log::debug!("peer {id} is not keeping up, frame dropped");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {}
            }
        }
        queued
    }

    /// Serve one peer until its socket closes
    pub async fn handle_connection(self, ws: WebSocket) {
        let (mut ws_tx, mut ws_rx) = ws.split();
        let (tx, mut rx) = mpsc::channel::<Message>(PEER_QUEUE);
        let id = self.add_peer(tx).await;
        log::info!("peer {id} connected");

        // Forward queued frames to the socket
        tokio::task::spawn(async move {
            while let Some(message) = rx.recv().await {
                if let Err(e) = ws_tx.send(message).await {
                    log::debug!("peer {id} send failed: {e}");
                    break;
                }
            }
        });

        while let Some(result) = ws_rx.next().await {
            match result {
                Ok(msg) => {
                    if let Ok(text) = msg.to_str() {
                        self.broadcast(text).await;
                    } else if msg.is_close() {
                        break;
                    }
                }
                Err(e) => {
                    log::error!("peer {id} websocket error: {e}");
                    break;
                }
            }
        }

        self.remove_peer(id).await;
        log::info!("peer {id} disconnected");
    }

    /// WebSocket upgrade on `/`
    pub fn routes(relay: Relay) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
        warp::path::end()
            .and(warp::ws())
            .map(move |ws: warp::ws::Ws| {
                let relay = relay.clone();
                ws.on_upgrade(move |socket| relay.handle_connection(socket))
            })
    }

    /// Bind the relay without running it
    pub fn bind(self, addr: SocketAddr) -> Result<(SocketAddr, impl Future<Output = ()>)> {
        warp::serve(Self::routes(self))
            .try_bind_ephemeral(addr)
            .map_err(|e| GameError::Transport(e.to_string()))
    }

    /// Serve on all interfaces at `port` until the process exits
    pub async fn serve(self, port: u16) -> Result<()> {
        let (addr, server) = self.bind(SocketAddr::from(([0, 0, 0, 0], port)))?;
        log::info!("relay listening on ws://{addr}");
        server.await;
        Ok(())
    }
}
