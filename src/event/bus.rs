use tokio::sync::broadcast;
use tracing::debug;

use super::events::RaidEvent;

/// Broadcast channel distributing raid events to every subscriber.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<RaidEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn with_default_capacity() -> Self {
        Self::new(256)
    }

    /// Emits an event to all current subscribers. An event with no
    /// subscribers is dropped, which is fine: nobody asked for it.
    pub fn emit(&self, event: RaidEvent) {
        let event_type = event.event_type();
        match self.sender.send(event) {
            Ok(receivers) => {
                debug!(event_type, receivers, "raid event emitted");
            }
            Err(_) => {
                debug!(event_type, "raid event emitted with no receivers");
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RaidEvent> {
        self.sender.subscribe()
    }
}
