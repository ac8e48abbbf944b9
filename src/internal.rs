//! # Summary
//!
//! This module abstracts over internal connections between tasks.
//!
//! Currently backed by `tokio::sync::mpsc` unbounded channels. The receiving
//! end is shared: every clone of `Rx` pulls from the same queue, and each
//! message is handed to exactly one of them. This is what lets a pool of
//! workers drain a single inbound stream.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};

/// Intra-server receiving channel. All clones receive from the same queue.
#[derive(Derivative)]
#[derivative(Clone(bound = ""))]
#[derive(Debug)]
pub struct Rx<T>(Arc<Mutex<mpsc::UnboundedReceiver<T>>>);

/// Intra-server transmission channel. All clones send to the same receiving end.
#[derive(Derivative)]
#[derivative(Clone(bound = ""))]
#[derive(Debug)]
pub struct Tx<T>(mpsc::UnboundedSender<T>);

/// Create a new pair of linked receiving and transmitting channels.
pub fn new<T>() -> (Rx<T>, Tx<T>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Rx(Arc::new(Mutex::new(rx))), Tx(tx))
}

impl<T> Rx<T> {
    /// Waits for the next message. Returns `None` once every `Tx` is gone
    /// and the queue is empty.
    pub async fn recv(&self) -> Option<T> {
        self.0.lock().await.recv().await
    }
}

impl<T> Tx<T> {
    /// Attempt to send a message through the channel.
    /// Returns `false` if the receiving end has been dropped.
    pub fn send(&self, message: T) -> bool {
        self.0.send(message).is_ok()
    }

    /// Whether every receiver has been dropped.
    pub fn is_closed(&self) -> bool {
        self.0.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[tokio::test]
    async fn clones_share_one_queue() {
        let (rx, tx) = new::<usize>();
        let other = rx.clone();
        for i in 0..4 {
            assert!(tx.send(i));
        }
        drop(tx);

        let mut seen = HashSet::new();
        while let Some(i) = rx.recv().await {
            seen.insert(i);
            if let Some(j) = other.recv().await {
                seen.insert(j);
            }
        }
        assert_eq!(seen, (0..4).collect::<HashSet<_>>());
        assert_eq!(other.recv().await, None);
    }

    #[tokio::test]
    async fn send_fails_after_receiver_dropped() {
        let (rx, tx) = new::<()>();
        drop(rx);
        assert!(tx.is_closed());
        assert!(!tx.send(()));
    }
}
