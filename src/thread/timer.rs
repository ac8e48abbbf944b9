//! # Summary
//!
//! This module defines the `Timer`, which closes the poll. Once the deadline
//! passes it takes a single snapshot of the tally and broadcasts it as the
//! final result, then closes the transport so the broadcast is flushed.
//! Workers are not drained first: a vote registered after the snapshot is
//! simply not part of the final result.

use std::time::Duration;

use crate::message::Notification;
use crate::shared::Shared;
use crate::state::Tally;
use crate::thread::publisher::Publisher;
use crate::transport::Transport;

/// Lifecycle of a poll. Each transition happens exactly once, in order.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    Running,
    Closing,
    Terminated,
}

pub struct Timer<T: Transport> {
    /// Time from start until the poll closes
    duration: Duration,

    /// Poll tally
    shared: Shared,

    /// Outbound notifications
    publisher: Publisher<T>,

    /// Current lifecycle phase
    phase: Phase,
}

impl<T: Transport> Timer<T> {
    pub fn new(duration: Duration, shared: Shared, publisher: Publisher<T>) -> Self {
        Timer {
            duration,
            shared,
            publisher,
            phase: Phase::Running,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Waits out the poll, then publishes and returns the final tally.
    /// Returns immediately with the same tally if already terminated.
    pub async fn run(&mut self) -> Tally {
        if self.phase != Phase::Running {
            return self.shared.snapshot()
        }
        tokio::time::sleep(self.duration).await;
        self.close().await
    }

    async fn close(&mut self) -> Tally {
        self.advance(Phase::Closing);
        info!("closing poll after {:?}", self.duration);
        let result = self.shared.snapshot();
        self.publisher.publish(Notification::Final { result: result.clone() }).await;
        self.publisher.close().await;
        info!("final result sent: {:?}", result);
        self.advance(Phase::Terminated);
        result
    }

    fn advance(&mut self, next: Phase) {
        debug!("poll {:?} -> {:?}", self.phase, next);
        self.phase = next;
    }
}
