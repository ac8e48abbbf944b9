use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::Error;
use crate::internal;
use crate::transport::Transport;

/// Transport whose both ends live in the current process.
#[derive(Debug)]
pub struct Memory {
    /// Inbound stream, taken on subscription
    inbound: Option<internal::Rx<Vec<u8>>>,

    /// Published payloads, observed through `Handle`
    outbound: mpsc::UnboundedSender<Vec<u8>>,
}

/// Far end of a `Memory` transport: injects votes and observes broadcasts.
#[derive(Debug)]
pub struct Handle {
    inbound: internal::Tx<Vec<u8>>,
    outbound: mpsc::UnboundedReceiver<Vec<u8>>,
}

impl Memory {
    pub fn new() -> (Memory, Handle) {
        let (inbound_rx, inbound_tx) = internal::new();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let memory = Memory {
            inbound: Some(inbound_rx),
            outbound: outbound_tx,
        };
        let handle = Handle {
            inbound: inbound_tx,
            outbound: outbound_rx,
        };
        (memory, handle)
    }
}

#[async_trait]
impl Transport for Memory {
    fn subscribe(&mut self) -> Result<internal::Rx<Vec<u8>>, Error> {
        self.inbound.take().ok_or(Error::Subscribed)
    }

    async fn publish(&mut self, payload: Vec<u8>) -> Result<(), Error> {
        self.outbound.send(payload).map_err(|_| Error::Closed)
    }
}

impl Handle {
    /// Queues a raw payload on the inbound stream.
    pub fn send<P: Into<Vec<u8>>>(&self, payload: P) -> bool {
        self.inbound.send(payload.into())
    }

    /// Waits for the next published payload.
    pub async fn recv(&mut self) -> Option<Vec<u8>> {
        self.outbound.recv().await
    }

    /// Returns an already published payload without waiting.
    pub fn try_recv(&mut self) -> Option<Vec<u8>> {
        self.outbound.try_recv().ok()
    }
}
