//! # Summary
//!
//! This module defines the `Worker`, which turns raw inbound payloads into
//! registrations and notifications. Any number of workers may drain the same
//! inbound stream; the tally store serializes their registrations, and each
//! one publishes from the value snapshot it got back, after the store's lock
//! has been released.

use crate::internal;
use crate::message::{self, Notification, Vote};
use crate::shared::Shared;
use crate::state::Outcome;
use crate::thread::publisher::Publisher;
use crate::transport::Transport;

pub struct Worker<T: Transport> {
    /// Worker index, for logging
    id: usize,

    /// Shared inbound stream of raw vote payloads
    rx: internal::Rx<Vec<u8>>,

    /// Poll tally
    shared: Shared,

    /// Outbound notifications
    publisher: Publisher<T>,
}

impl<T: Transport> Worker<T> {
    pub fn new(
        id: usize,
        rx: internal::Rx<Vec<u8>>,
        shared: Shared,
        publisher: Publisher<T>,
    ) -> Self {
        Worker {
            id,
            rx,
            shared,
            publisher,
        }
    }

    /// Processes payloads until the inbound stream closes.
    pub async fn run(self) {
        while let Some(payload) = self.rx.recv().await {
            self.process(&payload).await;
        }
        debug!("[worker {}] inbound stream closed", self.id);
    }

    /// Registers a single payload and publishes the resulting notifications.
    /// Returns `None` if the payload could not be decoded.
    pub async fn process(&self, payload: &[u8]) -> Option<Outcome> {
        let vote = match Vote::decode(payload) {
        | Ok(vote) => vote,
        | Err(error) => {
            warn!("[worker {}] dropping payload: {}", self.id, error);
            return None
        }
        };

        let outcome = self.shared.try_register(&vote.user_id, &vote.option);
        match &outcome {
        | Outcome::Accepted(tally) => {
            info!("[worker {}] vote received: {} -> {}", self.id, vote.user_id, vote.option);
            self.publisher.publish(Notification::confirmation(vote.user_id)).await;
            self.publisher.publish(Notification::Partial { result: tally.clone() }).await;
        }
        | Outcome::AlreadyVoted => {
            debug!("[worker {}] repeat vote from {}", self.id, vote.user_id);
            self.publisher.publish(Notification::error(vote.user_id, message::ALREADY_VOTED)).await;
        }
        | Outcome::InvalidOption => {
            debug!("[worker {}] invalid option {:?} from {}", self.id, vote.option, vote.user_id);
            self.publisher.publish(Notification::error(vote.user_id, message::INVALID_OPTION)).await;
        }
        }
        Some(outcome)
    }
}
