use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use super::bus::EventBus;
use super::events::RaidEvent;
use super::handler::{EventError, EventHandler};

/// Routes events from the bus to the registered handlers.
///
/// Every handler invocation runs on its own spawned task with a timeout and
/// bounded retries, so a slow or failing handler never blocks the bus or its
/// peers. This is the worker pool that keeps stat processing off the host's
/// tick loop.
pub struct EventDispatcher {
    handlers: Vec<Arc<dyn EventHandler>>,
    event_bus: EventBus,
    handler_timeout: Duration,
    max_retries: u32,
}

impl EventDispatcher {
    pub fn new(event_bus: EventBus) -> Self {
        Self {
            handlers: Vec::new(),
            event_bus,
            handler_timeout: Duration::from_secs(5),
            max_retries: 3,
        }
    }

    pub fn add_handler(&mut self, handler: Arc<dyn EventHandler>) {
        info!(handler = handler.name(), "registering event handler");
        self.handlers.push(handler);
    }

    pub fn with_handler_timeout(mut self, timeout: Duration) -> Self {
        self.handler_timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Starts the dispatch loop on a background task. Runs until the bus
    /// sender side is dropped.
    pub async fn start_listening(self) {
        let handlers = self.handlers;
        let mut receiver = self.event_bus.subscribe();
        let handler_timeout = self.handler_timeout;
        let max_retries = self.max_retries;

        info!(
            handler_count = handlers.len(),
            timeout_secs = handler_timeout.as_secs(),
            max_retries,
            "starting event dispatcher"
        );

        tokio::spawn(async move {
            while let Ok(event) = receiver.recv().await {
                debug!(
                    event_type = event.event_type(),
                    handler_count = handlers.len(),
                    "dispatching raid event"
                );

                for handler in &handlers {
                    let event = event.clone();
                    let handler = handler.clone();

                    tokio::spawn(async move {
                        if let Err(e) =
                            Self::handle_with_retry(handler, event, handler_timeout, max_retries)
                                .await
                        {
                            error!(error = ?e, "handler failed permanently");
                        }
                    });
                }
            }

            info!("event dispatcher stopped listening");
        });
    }

    async fn handle_with_retry(
        handler: Arc<dyn EventHandler>,
        event: RaidEvent,
        handler_timeout: Duration,
        max_retries: u32,
    ) -> Result<(), EventError> {
        let handler_name = handler.name();
        let event_type = event.event_type();

        for attempt in 0..=max_retries {
            match timeout(handler_timeout, handler.handle(&event)).await {
                Ok(Ok(())) => {
                    if attempt > 0 {
                        info!(
                            handler = handler_name,
                            event_type,
                            attempt = attempt + 1,
                            "handler succeeded after retry"
                        );
                    }
                    return Ok(());
                }
                Ok(Err(e)) if e.is_retryable() && attempt < max_retries => {
                    warn!(
                        handler = handler_name,
                        event_type,
                        attempt = attempt + 1,
                        error = ?e,
                        "handler failed, will retry"
                    );
                    // Exponential backoff between attempts.
                    let delay = Duration::from_millis(100 * 2_u64.pow(attempt));
                    tokio::time::sleep(delay).await;
                }
                Ok(Err(e)) => {
                    error!(
                        handler = handler_name,
                        event_type,
                        attempt = attempt + 1,
                        error = ?e,
                        "handler failed permanently"
                    );
                    return Err(e);
                }
                Err(_elapsed) => {
                    if attempt < max_retries {
                        warn!(
                            handler = handler_name,
                            event_type,
                            attempt = attempt + 1,
                            "handler timed out, will retry"
                        );
                    } else {
                        error!(handler = handler_name, event_type, "handler timed out permanently");
                        return Err(EventError::Timeout);
                    }
                }
            }
        }

        unreachable!("loop should have returned by now");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use tokio::time::sleep;
    use uuid::Uuid;

    use super::*;

    struct CountingHandler {
        name: &'static str,
        call_count: AtomicU32,
    }

    impl CountingHandler {
        fn new(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                call_count: AtomicU32::new(0),
            })
        }

        fn call_count(&self) -> u32 {
            self.call_count.load(Ordering::Relaxed)
        }
    }

    #[async_trait]
    impl EventHandler for CountingHandler {
        async fn handle(&self, _event: &RaidEvent) -> Result<(), EventError> {
            self.call_count.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }

        fn name(&self) -> &'static str {
            self.name
        }
    }

    fn sample_event() -> RaidEvent {
        RaidEvent::PlayerKilled {
            killer: Uuid::new_v4(),
            victim: Uuid::new_v4(),
            killer_group: "alpha".to_string(),
            victim_group: "beta".to_string(),
        }
    }

    #[tokio::test]
    async fn every_registered_handler_sees_the_event() {
        let event_bus = EventBus::with_default_capacity();
        let mut dispatcher = EventDispatcher::new(event_bus.clone());

        let first = CountingHandler::new("first");
        let second = CountingHandler::new("second");
        dispatcher.add_handler(first.clone());
        dispatcher.add_handler(second.clone());

        dispatcher.start_listening().await;
        sleep(Duration::from_millis(10)).await;

        event_bus.emit(sample_event());
        sleep(Duration::from_millis(50)).await;

        assert_eq!(first.call_count(), 1);
        assert_eq!(second.call_count(), 1);
    }

    struct FailingHandler {
        attempts: AtomicU32,
        failures_before_success: u32,
    }

    impl FailingHandler {
        fn new(failures_before_success: u32) -> Arc<Self> {
            Arc::new(Self {
                attempts: AtomicU32::new(0),
                failures_before_success,
            })
        }
    }

    #[async_trait]
    impl EventHandler for FailingHandler {
        async fn handle(&self, _event: &RaidEvent) -> Result<(), EventError> {
            let attempt = self.attempts.fetch_add(1, Ordering::Relaxed);
            if attempt < self.failures_before_success {
                Err(EventError::retryable("simulated failure"))
            } else {
                Ok(())
            }
        }

        fn name(&self) -> &'static str {
            "failing-handler"
        }
    }

    #[tokio::test]
    async fn retryable_failures_are_retried_until_success() {
        let event_bus = EventBus::with_default_capacity();
        let mut dispatcher = EventDispatcher::new(event_bus.clone())
            .with_max_retries(3)
            .with_handler_timeout(Duration::from_millis(100));

        let handler = FailingHandler::new(2);
        dispatcher.add_handler(handler.clone());

        dispatcher.start_listening().await;
        sleep(Duration::from_millis(10)).await;

        event_bus.emit(sample_event());
        sleep(Duration::from_millis(1000)).await;

        // Initial attempt plus two retries.
        assert_eq!(handler.attempts.load(Ordering::Relaxed), 3);
    }
}
