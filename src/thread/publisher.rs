//! # Summary
//!
//! This module defines the `Publisher`, the only path from the poll back to
//! the transport. The transport is not safe for concurrent writes, so every
//! publish goes through one async mutex. Each attempt, including the wait
//! for that mutex, is abandoned after a fixed timeout. Failures are logged
//! and otherwise ignored: a registered vote stays registered even if its
//! confirmation never leaves the server.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::error::Error;
use crate::message::Notification;
use crate::transport::Transport;

/// How long a single publish may take unless configured otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Serializing, fire-and-forget handle to the transport. All clones share it.
#[derive(Derivative)]
#[derivative(Clone(bound = ""))]
pub struct Publisher<T: Transport> {
    /// Underlying transport, one writer at a time
    transport: Arc<Mutex<T>>,

    /// Upper bound on a single publish attempt
    timeout: Duration,
}

impl<T: Transport> Publisher<T> {
    pub fn new(transport: T, timeout: Duration) -> Self {
        Publisher {
            transport: Arc::new(Mutex::new(transport)),
            timeout,
        }
    }

    /// Encodes and publishes `notification`, logging any failure.
    pub async fn publish(&self, notification: Notification) {
        match self.try_publish(&notification).await {
        | Ok(()) => debug!("published {:?}", notification),
        | Err(error) => warn!("failed to publish {:?}: {}", notification, error),
        }
    }

    /// Encodes and publishes `notification`, reporting failure to the caller.
    pub async fn try_publish(&self, notification: &Notification) -> Result<(), Error> {
        let payload = notification.encode()?;
        let attempt = async {
            let mut transport = self.transport.lock().await;
            transport.publish(payload).await
        };
        tokio::time::timeout(self.timeout, attempt)
            .await
            .map_err(|_| Error::Timeout(self.timeout))?
    }

    /// Closes the transport, giving it at most one publish timeout to flush.
    pub async fn close(&self) {
        let attempt = async {
            let mut transport = self.transport.lock().await;
            transport.close().await
        };
        match tokio::time::timeout(self.timeout, attempt).await {
        | Ok(Ok(())) => debug!("transport closed"),
        | Ok(Err(error)) => warn!("failed to close transport: {}", error),
        | Err(_) => warn!("transport not flushed after {:?}", self.timeout),
        }
    }
}
