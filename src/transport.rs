//! # Summary
//!
//! This module defines the duplex conduit the poll runs on: one inbound
//! stream of raw vote payloads and one outbound fan-out for broadcasts.
//!
//! Delivery is at-least-once on the way in with no ordering across
//! senders, and best-effort on the way out. The core never relies on more.

use async_trait::async_trait;

use crate::error::Error;
use crate::internal;

/// In-process transport for tests and embedding.
pub mod memory;

/// TCP hub speaking length-delimited JSON frames.
pub mod tcp;

pub use self::memory::Memory;
pub use self::tcp::Tcp;

#[async_trait]
pub trait Transport: Send + 'static {
    /// Hands out the inbound vote stream. May only be called once.
    fn subscribe(&mut self) -> Result<internal::Rx<Vec<u8>>, Error>;

    /// Fans a broadcast payload out to every current subscriber.
    /// Not safe to call concurrently, hence `&mut self`.
    async fn publish(&mut self, payload: Vec<u8>) -> Result<(), Error>;

    /// Stops accepting traffic and waits until everything already published
    /// has been handed to subscribers.
    async fn close(&mut self) -> Result<(), Error> {
        Ok(())
    }
}
