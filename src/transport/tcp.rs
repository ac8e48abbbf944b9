//! # Summary
//!
//! TCP hub transport. Every connection gets a reader task, which forwards
//! raw frames into the shared inbound stream, and a writer task, which
//! copies every broadcast onto the socket. Clients that stop reading fall
//! behind the broadcast buffer and skip what they missed; they never hold
//! up the publisher or other clients.
//!
//! Closing the hub stops the accept loop and drops the broadcast sender.
//! Writer tasks then flush what is still queued and exit, each dropping its
//! clone of a guard channel; `close` returns once every guard is gone.

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

use crate::error::Error;
use crate::internal;
use crate::socket;
use crate::transport::Transport;

/// Broadcasts buffered per connection before a slow reader starts skipping.
const BROADCAST_CAPACITY: usize = 4096;

/// Back-off after a failed `accept`, e.g. when out of file descriptors.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Held by every writer task; the receiving end sees `None` once all are gone.
type Guard = mpsc::Sender<()>;

pub struct Tcp {
    /// Address the listener is bound to
    local_addr: SocketAddr,

    /// Inbound stream, taken on subscription
    inbound: Option<internal::Rx<Vec<u8>>>,

    /// Fan-out to every connection's writer task, dropped on close
    broadcast: Option<broadcast::Sender<Bytes>>,

    /// Stops the accept loop
    closing: CancellationToken,

    /// Own copy of the writer guard, dropped on close
    guard: Option<Guard>,

    /// Resolves to `None` once every writer task has exited
    writers: mpsc::Receiver<()>,
}

impl Tcp {
    /// Binds to `addr` and starts accepting clients in the background.
    pub async fn bind(addr: SocketAddr) -> Result<Self, Error> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| Error::Bind { addr, source })?;
        let local_addr = listener.local_addr()?;
        let (inbound_rx, inbound_tx) = internal::new();
        let (broadcast, _) = broadcast::channel(BROADCAST_CAPACITY);
        let (guard, writers) = mpsc::channel(1);
        let closing = CancellationToken::new();
        tokio::spawn(Self::accept(
            listener,
            inbound_tx,
            broadcast.clone(),
            guard.clone(),
            closing.clone(),
        ));
        info!("listening on {}", local_addr);
        Ok(Tcp {
            local_addr,
            inbound: Some(inbound_rx),
            broadcast: Some(broadcast),
            closing,
            guard: Some(guard),
            writers,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Number of connections currently receiving broadcasts.
    pub fn subscribers(&self) -> usize {
        self.broadcast
            .as_ref()
            .map(broadcast::Sender::receiver_count)
            .unwrap_or(0)
    }

    async fn accept(
        listener: TcpListener,
        inbound: internal::Tx<Vec<u8>>,
        broadcast: broadcast::Sender<Bytes>,
        guard: Guard,
        closing: CancellationToken,
    ) {
        loop {
            let accepted = tokio::select! {
                accepted = listener.accept() => accepted,
                _ = closing.cancelled() => break,
            };
            let (stream, addr) = match accepted {
            | Ok(accepted) => accepted,
            | Err(error) => {
                warn!("failed to accept connection: {}", error);
                tokio::time::sleep(ACCEPT_BACKOFF).await;
                continue
            }
            };
            debug!("connected to {}", addr);
            let (rx, tx) = socket::split_raw(stream);
            // Subscribe before reading so a client sees replies to its first vote
            tokio::spawn(Self::write(addr, tx, broadcast.subscribe(), guard.clone()));
            tokio::spawn(Self::read(addr, rx, inbound.clone(), closing.clone()));
        }
        debug!("no longer accepting connections");
    }

    async fn read(
        addr: SocketAddr,
        mut rx: socket::RawRx,
        inbound: internal::Tx<Vec<u8>>,
        closing: CancellationToken,
    ) {
        loop {
            let frame = tokio::select! {
                frame = rx.next() => frame,
                _ = closing.cancelled() => break,
            };
            match frame {
            | Some(Ok(frame)) => {
                trace!("received {} bytes from {}", frame.len(), addr);
                if !inbound.send(frame.to_vec()) { break }
            }
            | Some(Err(error)) => {
                warn!("dropping connection to {}: {}", addr, error);
                break
            }
            | None => break,
            }
        }
        debug!("stopped reading from {}", addr);
    }

    async fn write(
        addr: SocketAddr,
        mut tx: socket::RawTx,
        mut broadcast: broadcast::Receiver<Bytes>,
        _guard: Guard,
    ) {
        loop {
            match broadcast.recv().await {
            | Ok(payload) => {
                if let Err(error) = tx.send(payload).await {
                    debug!("stopped writing to {}: {}", addr, error);
                    return
                }
            }
            | Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!("{} fell behind, skipped {} broadcasts", addr, skipped);
            }
            | Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        if let Err(error) = SinkExt::<Bytes>::close(&mut tx).await {
            debug!("failed to shut down {}: {}", addr, error);
        }
    }
}

#[async_trait]
impl Transport for Tcp {
    fn subscribe(&mut self) -> Result<internal::Rx<Vec<u8>>, Error> {
        self.inbound.take().ok_or(Error::Subscribed)
    }

    async fn publish(&mut self, payload: Vec<u8>) -> Result<(), Error> {
        let broadcast = self.broadcast.as_ref().ok_or(Error::Closed)?;
        // Sending with no receivers only means nobody is connected yet
        match broadcast.send(Bytes::from(payload)) {
        | Ok(count) => trace!("broadcast to {} connections", count),
        | Err(_) => trace!("broadcast with no connections"),
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<(), Error> {
        self.closing.cancel();
        self.broadcast.take();
        self.guard.take();
        while self.writers.recv().await.is_some() {}
        debug!("all connections flushed");
        Ok(())
    }
}
