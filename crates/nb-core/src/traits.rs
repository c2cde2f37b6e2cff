//! # Core Traits (Ports)
//!
//! Any storage plugin must implement these traits to be used by the binary.
//! All paths handed to a store are relative to its backup root.

use crate::error::Result;
use crate::models::{Role, StashEntry};
use crate::naming::NameParts;
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// What happened to one candidate file during pruning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PruneOutcome {
    Deleted,
    /// Somebody else removed it between listing and deleting.
    AlreadyGone,
    /// Deletion failed; the message has already been logged.
    Failed(String),
}

/// Revisioned, time-bucketed snapshot persistence.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Creates `dir` if needed and writes `document` to `dir/file_name`,
    /// replacing any existing file. Returns the full path written.
    ///
    /// Directory failures are reported as `AppError::CreateDir`, file
    /// failures as `AppError::WriteFile`.
    async fn write_snapshot(
        &self,
        role: &Role,
        dir: &Path,
        file_name: &str,
        document: &Value,
    ) -> Result<PathBuf>;

    /// Keeps the `keep` most recently modified revisions of `family` in
    /// `dir` and deletes the rest. A revision is a file matching
    /// `family.revision_mask()` that is also a
    /// [`NameParts::is_family_member`]. Never fails.
    async fn prune_revisions(
        &self,
        dir: &Path,
        family: &NameParts,
        keep: usize,
    ) -> Vec<(PathBuf, PruneOutcome)>;
}

/// Flat "most recent wins" store for unsynced boards.
#[async_trait]
pub trait StashStore: Send + Sync {
    /// Writes `document` under `file_name`, overwriting a previous stash with the same key.
    async fn stash(&self, file_name: &str, document: &Value) -> Result<PathBuf>;

    /// The most recently modified stash across all boards and hosts, if any.
    async fn latest(&self) -> Result<Option<StashEntry>>;
}
