pub mod mocks;
pub mod setup;

// Re-export main utilities for use by test files
#[allow(unused_imports)]
pub use mocks::{MockRaidDetector, RecordingHandler};
#[allow(unused_imports)]
pub use setup::{settle, TestSetup, TestSetupBuilder};
