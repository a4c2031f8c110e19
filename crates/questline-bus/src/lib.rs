// SPDX-FileCopyrightText: 2026 Questline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed event bus for the Questline engine.
//!
//! A thin wrapper over `tokio::sync::broadcast`: publishing never blocks and
//! never fails when nobody listens, slow subscribers observe `Lagged`.

pub mod events;

pub use events::{BusEvent, EngineEvent, NoticeLevel, StatusNotice};

use tokio::sync::broadcast;

/// Default number of buffered events per subscriber.
pub const DEFAULT_CAPACITY: usize = 256;

/// Cloneable handle to the engine's broadcast channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<BusEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publishes `event`; returns the number of subscribers that received it.
    pub fn publish(&self, event: EngineEvent) -> usize {
        let kind = event.kind();
        match self.tx.send(BusEvent::new(event)) {
            Ok(receivers) => {
                tracing::trace!(event = kind, receivers, "event published");
                receivers
            }
            Err(_) => {
                tracing::trace!(event = kind, "event dropped, no subscribers");
                0
            }
        }
    }

    /// Publishes a status notice.
    pub fn notify(&self, notice: StatusNotice) -> usize {
        self.publish(EngineEvent::Notice(notice))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BusEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
