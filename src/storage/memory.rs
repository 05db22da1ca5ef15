use std::sync::Mutex;

use async_trait::async_trait;

use super::{RaidStore, StorageError};
use crate::raid::RaidSnapshot;

/// In-memory checkpoint store for development and testing.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    raids: Mutex<Vec<RaidSnapshot>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RaidStore for InMemoryStore {
    async fn save(&self, raids: &[RaidSnapshot]) -> Result<(), StorageError> {
        *self.raids.lock().unwrap() = raids.to_vec();
        Ok(())
    }

    async fn load(&self) -> Result<Vec<RaidSnapshot>, StorageError> {
        Ok(self.raids.lock().unwrap().clone())
    }
}
