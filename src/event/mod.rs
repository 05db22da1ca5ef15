// Message-passing pipeline for raid signals.
//
// External combat/placement/lifecycle callbacks are translated at the host
// boundary into RaidEvent values on the bus; the dispatcher fans them out to
// handlers on spawned tasks so nothing runs on the host's tick loop.

pub use bus::EventBus;
pub use dispatcher::EventDispatcher;
pub use events::RaidEvent;
pub use handler::{EventError, EventHandler};

mod bus;
mod dispatcher;
mod events;
mod handler;
