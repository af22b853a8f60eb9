//! Orchestrator side of the relay connection
//!
//! The socket lives on a dedicated thread with its own single-threaded tokio
//! runtime, so the simulation loop never blocks on the network. Outgoing
//! events are fire-and-forget: anything sent while the socket is not open is
//! dropped. Inbound commands are queued for the game to pick up at the start
//! of its next tick; inbound events and malformed frames are ignored.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_channel::{Receiver, Sender, unbounded};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use super::protocol::{CommandMessage, SyncMessage, decode, encode};
use crate::error::{GameError, Result};
use crate::sim::state::GameEvent;

/// Events buffered for the socket before further sends are dropped
pub const OUTGOING_QUEUE: usize = 256;

/// Persistent, best-effort connection to a relay
pub struct RelayLink {
    url: String,
    open: Arc<AtomicBool>,
    outgoing: Option<mpsc::Sender<String>>,
    commands: Receiver<CommandMessage>,
}

impl RelayLink {
    /// Start connecting to `url` in the background
    ///
    /// Returns immediately; connection failures are logged and leave the link
    /// permanently closed (no reconnect).
    pub fn connect(url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        let open = Arc::new(AtomicBool::new(false));
        let (out_tx, out_rx) = mpsc::channel(OUTGOING_QUEUE);
        let (cmd_tx, cmd_rx) = unbounded();

        let worker_url = url.clone();
        let worker_open = Arc::clone(&open);
        std::thread::Builder::new()
            .name("relay-link".into())
            .spawn(move || {
                let runtime = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(rt) => rt,
                    Err(e) => {
                        log::error!("relay link runtime failed to start: {e}");
                        return;
                    }
                };
                runtime.block_on(run(worker_url, worker_open, out_rx, cmd_tx));
            })
            .map_err(|e| GameError::Transport(e.to_string()))?;

        Ok(Self {
            url,
            open,
            outgoing: Some(out_tx),
            commands: cmd_rx,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Publish an event; silently skipped unless the socket is open, and
    /// dropped if the socket has fallen behind
    pub fn send(&self, event: &GameEvent) {
        if !self.is_open() {
            return;
        }
        let Some(outgoing) = &self.outgoing else {
            return;
        };
        match encode(event) {
            Ok(text) => {
                if let Err(mpsc::error::TrySendError::Full(_)) = outgoing.try_send(text) {
                    log::debug!("relay link backed up, event dropped");
                }
            }
            Err(e) => log::debug!("dropping unencodable event: {e}"),
        }
    }

    /// Commands received since the last call, in arrival order
    pub fn drain_commands(&self) -> Vec<CommandMessage> {
        self.commands.try_iter().collect()
    }

    /// Close the socket; the background thread exits on its own
    pub fn close(&mut self) {
        if self.outgoing.take().is_some() {
            log::debug!("closing relay link to {}", self.url);
        }
    }
}

impl Drop for RelayLink {
    fn drop(&mut self) {
        self.close();
    }
}

async fn run(
    url: String,
    open: Arc<AtomicBool>,
    mut outgoing: mpsc::Receiver<String>,
    commands: Sender<CommandMessage>,
) {
    let socket = match connect_async(url.as_str()).await {
        Ok((socket, _)) => socket,
        Err(e) => {
            log::error!("relay connection to {url} failed: {e}");
            return;
        }
    };
    log::info!("connected to relay at {url}");
    open.store(true, Ordering::Release);

    let (mut write, mut read) = socket.split();
    loop {
        tokio::select! {
            out = outgoing.recv() => match out {
                Some(text) => {
                    if let Err(e) = write.send(Message::Text(text)).await {
                        log::error!("relay send failed: {e}");
                        break;
                    }
                }
                None => {
                    let _ = write.close().await;
                    break;
                }
            },
            incoming = read.next() => match incoming {
                Some(Ok(Message::Text(text))) => match decode(&text) {
                    Ok(SyncMessage::Command(command)) => {
                        if commands.send(command).is_err() {
                            break;
                        }
                    }
                    Ok(SyncMessage::Event(_)) => {}
                    Err(e) => log::debug!("discarding relay message: {e}"),
                },
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    log::error!("relay receive failed: {e}");
                    break;
                }
            },
        }
    }

    open.store(false, Ordering::Release);
    log::info!("relay link to {url} closed");
}
