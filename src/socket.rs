//! # Summary
//!
//! This module abstracts over external connections between clients and the server.
//!
//! Currently uses `tokio-util`'s length-delimited codec over `tokio`'s TCP
//! stream, with each frame carrying one JSON document. The server side reads
//! raw frames and leaves decoding to the workers; clients use the typed `Rx`
//! and `Tx` wrappers so they can send and receive Rust structs with minimal
//! boilerplate.

use std::marker::PhantomData;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio_util::codec::{FramedRead, FramedWrite, LengthDelimitedCodec};

use crate::error::Error;

pub type RawRx = FramedRead<OwnedReadHalf, LengthDelimitedCodec>;
pub type RawTx = FramedWrite<OwnedWriteHalf, LengthDelimitedCodec>;

/// External receiving channel. Expects length-delimited, JSON-encoded
/// Rust data of type `T` sent via TCP.
pub struct Rx<T> {
    inner: RawRx,
    _marker: PhantomData<fn() -> T>,
}

/// External transmission channel. Sends length-delimited, JSON-encoded
/// Rust data of type `T` over TCP.
pub struct Tx<T> {
    inner: RawTx,
    _marker: PhantomData<fn(T)>,
}

/// Split a `TcpStream` into untyped frame reader and writer halves.
pub fn split_raw(stream: TcpStream) -> (RawRx, RawTx) {
    let (rx, tx) = stream.into_split();
    let rx = FramedRead::new(rx, LengthDelimitedCodec::new());
    let tx = FramedWrite::new(tx, LengthDelimitedCodec::new());
    (rx, tx)
}

/// Split a `TcpStream` into a pair of receiving and transmitting
/// channels capable of reading and writing JSON-encoded data.
pub fn split<R, T>(stream: TcpStream) -> (Rx<R>, Tx<T>)
where R: serde::de::DeserializeOwned,
      T: serde::Serialize,
{
    let (rx, tx) = split_raw(stream);
    let rx = Rx { inner: rx, _marker: PhantomData };
    let tx = Tx { inner: tx, _marker: PhantomData };
    (rx, tx)
}

impl<R: serde::de::DeserializeOwned> Rx<R> {
    /// Reads the next frame. Returns `None` once the peer hangs up.
    pub async fn next(&mut self) -> Option<Result<R, Error>> {
        let frame = match self.inner.next().await? {
        | Ok(frame) => frame,
        | Err(error) => return Some(Err(Error::Io(error))),
        };
        Some(serde_json::from_slice(&frame).map_err(Error::Decode))
    }
}

impl<T: serde::Serialize> Tx<T> {
    /// Encodes and writes a single frame, flushing it to the socket.
    pub async fn send(&mut self, message: &T) -> Result<(), Error> {
        let body = serde_json::to_vec(message).map_err(Error::Encode)?;
        self.inner.send(Bytes::from(body)).await?;
        Ok(())
    }

    /// Flushes and shuts down the write half.
    pub async fn close(&mut self) -> Result<(), Error> {
        SinkExt::<Bytes>::close(&mut self.inner).await?;
        Ok(())
    }
}
