//! # nb-storage-local
//! nullboard-backup/crates/nb-plugins/nb-storage-local/src/lib.rs
//! Local filesystem implementation of `SnapshotStore` and `StashStore`.
//! Features: time-bucketed directories, atomic replace, bounded revision history.

mod files;
mod stash;

pub use files::to_canonical_json;
pub use stash::LocalStashStore;

use async_trait::async_trait;
use nb_core::error::{AppError, Result};
use nb_core::models::Role;
use nb_core::naming::NameParts;
use nb_core::traits::{PruneOutcome, SnapshotStore};
use serde_json::Value;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

pub struct LocalSnapshotStore {
    /// Root directory for all backups (e.g., "/srv/nullboard")
    root_path: PathBuf,
}

impl LocalSnapshotStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root_path: root }
    }
}

#[async_trait]
impl SnapshotStore for LocalSnapshotStore {
    async fn write_snapshot(
        &self,
        role: &Role,
        dir: &Path,
        file_name: &str,
        document: &Value,
    ) -> Result<PathBuf> {
        let target_dir = self.root_path.join(dir);

        // 1. Ensure directory exists
        fs::create_dir_all(&target_dir)
            .await
            .map_err(|source| AppError::CreateDir {
                path: target_dir.clone(),
                source,
            })?;

        // 2. Serialize, then replace the target in one rename
        let bytes = files::to_canonical_json(document)?;
        let target = target_dir.join(file_name);
        files::write_atomic(&target, bytes)
            .await
            .map_err(|source| AppError::WriteFile {
                path: target.clone(),
                source,
            })?;

        log::debug!("stored {:?} snapshot {}", role, target.display());
        Ok(target)
    }

    /// Newest first by modification time; everything past `keep` is deleted.
    async fn prune_revisions(
        &self,
        dir: &Path,
        family: &NameParts,
        keep: usize,
    ) -> Vec<(PathBuf, PruneOutcome)> {
        let target_dir = self.root_path.join(dir);
        let mask = family.revision_mask();

        let pattern = match glob::Pattern::new(&mask) {
            Ok(p) => p,
            Err(e) => {
                log::warn!("invalid revision mask {:?}: {}", mask, e);
                return Vec::new();
            }
        };

        let mut revisions = match files::list_matching(&target_dir, &pattern).await {
            Ok(found) => found,
            Err(e) => {
                log::warn!("cannot list {} for pruning: {}", target_dir.display(), e);
                return Vec::new();
            }
        };

        // `*` also spans dots, e.g. an untitled board's mask catching a titled one
        revisions.retain(|(path, _)| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| family.is_family_member(n))
        });

        // sort_by is stable, so equal mtimes keep directory order
        revisions.sort_by(|a, b| b.1.cmp(&a.1));

        let mut outcomes = Vec::new();
        for (path, _) in revisions.into_iter().skip(keep) {
            let outcome = remove_revision(&path).await;
            outcomes.push((path, outcome));
        }
        outcomes
    }
}

async fn remove_revision(path: &Path) -> PruneOutcome {
    match fs::remove_file(path).await {
        Ok(()) => {
            log::info!("deleted old revision {}", path.display());
            PruneOutcome::Deleted
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::debug!("old revision {} already gone", path.display());
            PruneOutcome::AlreadyGone
        }
        Err(e) => {
            log::warn!("failed to delete file {}: {}", path.display(), e);
            PruneOutcome::Failed(e.to_string())
        }
    }
}
