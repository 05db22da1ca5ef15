// Raid lifecycle: records, the concurrent registry, the grace state machine
// and the service object hosts wire up at startup.

pub use grace::GraceScheduler;
pub use models::{RaidRecord, RaidSnapshot};
pub use registry::RaidRegistry;
pub use resync_task::{start_resync_task, ResyncConfig};
pub use service::{LifecycleSubscriber, TrackerService, TrackerServiceBuilder};

mod grace;
mod models;
mod registry;
mod resync_task;
mod service;
