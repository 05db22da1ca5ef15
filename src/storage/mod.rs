// Durable checkpointing of tracked raids.
//
// The store holds one full checkpoint: every save overwrites the previous
// state, every load returns everything that was saved. Incremental logging
// is deliberately absent; saves happen at process boundaries only.

pub use json_file::JsonFileStore;
pub use memory::InMemoryStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::raid::RaidSnapshot;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Backend for the raid checkpoint.
#[async_trait]
pub trait RaidStore: Send + Sync {
    /// Replaces the stored checkpoint with `raids`.
    async fn save(&self, raids: &[RaidSnapshot]) -> Result<(), StorageError>;

    /// Loads the stored checkpoint. A store that was never written to
    /// yields an empty list, not an error.
    async fn load(&self) -> Result<Vec<RaidSnapshot>, StorageError>;
}

mod json_file;
mod memory;
