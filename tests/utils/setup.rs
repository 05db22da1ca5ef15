use std::sync::Arc;
use std::time::Duration;

use raidstats::{EventBus, EventHandler, InMemoryStore, RaidEvent, TrackerConfig, TrackerService};

use super::mocks::MockRaidDetector;

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct TestSetup {
    pub service: Arc<TrackerService>,
    pub detector: Arc<MockRaidDetector>,
    pub event_bus: EventBus,
}

impl TestSetup {
    /// Emits an event and lets the dispatcher's spawned handlers run.
    pub async fn emit(&self, event: RaidEvent) {
        self.event_bus.emit(event);
        settle().await;
    }
}

/// Gives spawned handler tasks a moment to process. Instant under a paused
/// test clock, 50ms of wall time otherwise.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

pub struct TestSetupBuilder {
    config: TrackerConfig,
    handlers: Vec<Arc<dyn EventHandler>>,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            // Long resync interval by default so timing tests that advance
            // the clock by minutes are not disturbed by resync passes.
            config: TrackerConfig {
                resync_interval: Duration::from_secs(3600),
                ..TrackerConfig::default()
            },
            handlers: Vec::new(),
        }
    }

    pub fn with_resync_interval(mut self, interval: Duration) -> Self {
        self.config.resync_interval = interval;
        self
    }

    pub fn with_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    pub async fn build(self) -> TestSetup {
        init_tracing();

        let detector = Arc::new(MockRaidDetector::new());
        let store = Arc::new(InMemoryStore::new());

        let mut builder =
            TrackerService::builder(detector.clone(), store).with_config(self.config);
        for handler in self.handlers {
            builder = builder.with_handler(handler);
        }
        let service = Arc::new(builder.build());

        service.start().await;
        settle().await;

        let event_bus = service.event_bus().clone();
        TestSetup {
            service,
            detector,
            event_bus,
        }
    }
}

impl Default for TestSetupBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
