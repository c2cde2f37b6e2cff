//! Flat stash directory: one file per host+board key, newest file wins on read.

use crate::files;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nb_core::error::{AppError, Result};
use nb_core::models::{BoardIdentity, StashEntry};
use nb_core::traits::StashStore;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;

const STASH_DIR: &str = "boards/stashed";
const STASH_MASK: &str = "*.latest.json";

pub struct LocalStashStore {
    stash_dir: PathBuf,
}

impl LocalStashStore {
    /// Stashes live in `boards/stashed` under the backup root.
    pub fn new(root: &Path) -> Self {
        Self {
            stash_dir: root.join(STASH_DIR),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.stash_dir
    }
}

#[async_trait]
impl StashStore for LocalStashStore {
    async fn stash(&self, file_name: &str, document: &Value) -> Result<PathBuf> {
        fs::create_dir_all(&self.stash_dir)
            .await
            .map_err(|source| AppError::CreateDir {
                path: self.stash_dir.clone(),
                source,
            })?;

        let bytes = files::to_canonical_json(document)?;
        let target = self.stash_dir.join(file_name);
        files::write_atomic(&target, bytes)
            .await
            .map_err(|source| AppError::WriteFile {
                path: target.clone(),
                source,
            })?;

        log::debug!("stashed {}", target.display());
        Ok(target)
    }

    async fn latest(&self) -> Result<Option<StashEntry>> {
        let pattern = glob::Pattern::new(STASH_MASK)
            .map_err(|e| AppError::Internal(format!("stash mask: {e}")))?;

        let stashed = files::list_matching(&self.stash_dir, &pattern)
            .await
            .map_err(|source| AppError::ReadFile {
                path: self.stash_dir.clone(),
                source,
            })?;

        let Some((path, modified)) = stashed.into_iter().max_by_key(|(_, modified)| *modified) else {
            return Ok(None);
        };

        let bytes = fs::read(&path)
            .await
            .map_err(|source| AppError::ReadFile {
                path: path.clone(),
                source,
            })?;
        let payload: Value = serde_json::from_slice(&bytes)?;

        log::debug!("unstashing {}", path.display());
        Ok(Some(StashEntry {
            board: BoardIdentity::from_document(&payload),
            payload,
            written_at: DateTime::<Utc>::from(modified),
        }))
    }
}
