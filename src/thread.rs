//! # Summary
//!
//! This module contains the sub-threads that make up a running poll.
//!
//! Workers and the timer run as independent tasks on the `tokio` runtime.
//! They share the tally through `shared::Shared` and the transport through
//! `publisher::Publisher`; those are two separate locks and neither is ever
//! held while waiting on the other.

/// Outbound notifications.
pub mod publisher;

/// Poll deadline.
pub mod timer;

/// Vote processing.
pub mod worker;
