//! In-process event bus

use agora_consensus_core::effects::{Event, Publish};
use agora_util_error::BoxedErrorResult;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::LOG_TARGET;

/// Events kept for subscribers lagging behind
const EVENT_BUS_CAPACITY: usize = 1024;

/// [`Publish`] fanning events out to every subscriber
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<Event>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_BUS_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

impl Publish for EventBus {
    fn publish(&self, event: &Event) -> BoxedErrorResult<()> {
        match event {
            Event::LeaderUpdated { leader } => {
                info!(target: LOG_TARGET, topic = event.topic(), %leader, "Event");
            }
            Event::BlockConfirmed { state_id, block } => {
                info!(
                    target: LOG_TARGET,
                    topic = event.topic(),
                    %state_id,
                    block = %block.seal_short(),
                    "Event"
                );
            }
            Event::NodeDeleted { id } => {
                info!(target: LOG_TARGET, topic = event.topic(), %id, "Event");
            }
        }

        // Nobody listening is fine
        if self.tx.send(event.clone()).is_err() {
            debug!(target: LOG_TARGET, topic = event.topic(), "No subscribers");
        }
        Ok(())
    }
}
