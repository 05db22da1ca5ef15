use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use super::{RaidStore, StorageError};
use crate::raid::RaidSnapshot;

/// Checkpoint store backed by a single pretty-printed JSON file.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RaidStore for JsonFileStore {
    async fn save(&self, raids: &[RaidSnapshot]) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let payload = serde_json::to_vec_pretty(raids)?;
        tokio::fs::write(&self.path, payload).await?;

        debug!(
            path = %self.path.display(),
            count = raids.len(),
            "raid checkpoint written"
        );
        Ok(())
    }

    async fn load(&self) -> Result<Vec<RaidSnapshot>, StorageError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no raid checkpoint on disk");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        Ok(serde_json::from_slice(&bytes)?)
    }
}
