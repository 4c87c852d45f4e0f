//! Poll-cycle checkpoints.
//!
//! While a page is waiting for replies the driver keeps just enough on disk
//! to pick the same poll back up after a restart: where the story is, its
//! flags, which options message is being watched and which replies were
//! already handled.

use derive_getters::Getters;
use gamebook_error::JsonError;
use gamebook_interface::MessageId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Snapshot of a playthrough waiting in `Polling`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct SessionCheckpoint {
    /// Story title, checked on resume
    title: String,
    /// Key of the page being polled
    stitch: String,
    /// Flag table at the time of the poll
    flags: BTreeMap<String, bool>,
    /// Options message the replies are searched under
    options_message: MessageId,
    /// Replies already handled
    seen: Vec<MessageId>,
}

impl SessionCheckpoint {
    /// Creates a checkpoint.
    pub fn new(
        title: impl Into<String>,
        stitch: impl Into<String>,
        flags: BTreeMap<String, bool>,
        options_message: MessageId,
        seen: Vec<MessageId>,
    ) -> Self {
        Self {
            title: title.into(),
            stitch: stitch.into(),
            flags,
            options_message,
            seen,
        }
    }
}

/// Reads and writes one checkpoint file.
#[derive(Debug, Clone, Getters)]
pub struct CheckpointStore {
    /// Checkpoint file location
    path: PathBuf,
}

impl CheckpointStore {
    /// Creates a store for `path`. Nothing is touched until [`save`](Self::save).
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Loads the checkpoint, or `None` if there is none.
    pub fn load(&self) -> Result<Option<SessionCheckpoint>, JsonError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No checkpoint file");
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&self.path)
            .map_err(|e| JsonError::new(format!("Failed to read checkpoint file: {}", e)))?;
        let checkpoint: SessionCheckpoint = serde_json::from_str(&contents)
            .map_err(|e| JsonError::new(format!("Failed to parse checkpoint file: {}", e)))?;

        debug!(stitch = %checkpoint.stitch, seen = checkpoint.seen.len(), "Loaded checkpoint");
        Ok(Some(checkpoint))
    }

    /// Writes the checkpoint, replacing any earlier one.
    pub fn save(&self, checkpoint: &SessionCheckpoint) -> Result<(), JsonError> {
        let contents = serde_json::to_string_pretty(checkpoint)
            .map_err(|e| JsonError::new(format!("Failed to serialize checkpoint: {}", e)))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    JsonError::new(format!("Failed to create checkpoint directory: {}", e))
                })?;
            }
        }

        let staging = self.path.with_extension("tmp");
        std::fs::write(&staging, contents)
            .map_err(|e| JsonError::new(format!("Failed to write checkpoint file: {}", e)))?;
        std::fs::rename(&staging, &self.path)
            .map_err(|e| JsonError::new(format!("Failed to write checkpoint file: {}", e)))?;

        debug!(stitch = %checkpoint.stitch, seen = checkpoint.seen.len(), "Saved checkpoint");
        Ok(())
    }

    /// Removes the checkpoint if present.
    pub fn clear(&self) -> Result<(), JsonError> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)
                .map_err(|e| JsonError::new(format!("Failed to delete checkpoint file: {}", e)))?;
            debug!(path = %self.path.display(), "Cleared checkpoint");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkpoint_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path().join("nested").join("session.json"));
        assert_eq!(store.load().unwrap(), None);

        let mut flags = BTreeMap::new();
        flags.insert("met_guard".to_string(), true);
        let checkpoint = SessionCheckpoint::new(
            "The Gate",
            "gate",
            flags,
            MessageId::new("m-7"),
            vec![MessageId::new("r-1"), MessageId::new("r-2")],
        );

        store.save(&checkpoint).unwrap();
        assert_eq!(store.load().unwrap(), Some(checkpoint));

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
        store.clear().unwrap();
    }

    #[test]
    fn test_corrupt_checkpoint_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(CheckpointStore::new(&path).load().is_err());
    }
}
