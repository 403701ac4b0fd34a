//! Event publisher that keeps what it was given

use async_trait::async_trait;
use parking_lot::RwLock;
use shop_common::RepositoryError;

use crate::domain::CommerceEvent;
use crate::ports::EventPublisher;

/// Records published events in memory
#[derive(Default)]
pub struct RecordingEventPublisher {
    events: RwLock<Vec<CommerceEvent>>,
}

impl RecordingEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything published so far
    pub fn events(&self) -> Vec<CommerceEvent> {
        self.events.read().clone()
    }

    /// Drain
    pub fn take(&self) -> Vec<CommerceEvent> {
        std::mem::take(&mut *self.events.write())
    }
}

#[async_trait]
impl EventPublisher for RecordingEventPublisher {
    async fn publish(&self, events: Vec<CommerceEvent>) -> Result<(), RepositoryError> {
        for event in &events {
            tracing::debug!(event = event.name(), order_id = %event.order_id(), "event recorded");
        }
        self.events.write().extend(events);
        Ok(())
    }
}
