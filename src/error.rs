use std::io;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("transport I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("malformed payload: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("failed to encode payload: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("publish abandoned after {0:?}")]
    Timeout(Duration),

    #[error("transport closed")]
    Closed,

    #[error("inbound stream already subscribed")]
    Subscribed,
}
