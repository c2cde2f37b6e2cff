//! # Board Backup Orchestrator
//!
//! Turns the four logical operations (save-board, save-other, stash,
//! unstash) into writes against the storage ports.

use crate::bucket::time_to_bucket_path;
use crate::error::{AppError, Result};
use crate::models::{is_empty_document, BoardSave, Category, Role, Snapshot, StashEntry};
use crate::naming::NameParts;
use crate::traits::{PruneOutcome, SnapshotStore, StashStore};
use chrono::NaiveDateTime;
use serde_json::Value;
use std::path::PathBuf;

/// What a save actually did on disk.
#[derive(Debug, Default)]
pub struct SaveReport {
    pub written: Vec<PathBuf>,
    /// Roles whose document was absent or empty.
    pub skipped: Vec<Role>,
    pub pruned: Vec<(PathBuf, PruneOutcome)>,
}

pub struct BackupService {
    snapshots: Box<dyn SnapshotStore>,
    stash: Box<dyn StashStore>,
    keep_revisions: usize,
}

impl BackupService {
    pub fn new(
        snapshots: Box<dyn SnapshotStore>,
        stash: Box<dyn StashStore>,
        keep_revisions: usize,
    ) -> Self {
        Self {
            snapshots,
            stash,
            keep_revisions,
        }
    }

    /// Writes the latest pointer, the full envelope and the board-only capture.
    ///
    /// Names are always derived from the board document. A failed file
    /// write does not stop the other roles, but a directory that cannot be
    /// created aborts the rest of the save.
    pub async fn save_board(&self, save: BoardSave) -> Result<SaveReport> {
        let naming_payload = save.board_document.clone().unwrap_or(Value::Null);
        let snapshot = Snapshot::new(Some(save.board_id), naming_payload, save.now, save.origin_host)?;
        let bucket = time_to_bucket_path(&snapshot.captured_at);

        let targets = [
            (Role::Latest, save.board_document.as_ref()),
            (Role::Full, save.full_document.as_ref()),
            (Role::Board, save.board_document.as_ref()),
        ];

        let mut report = SaveReport::default();
        let mut to_prune = Vec::new();
        let mut first_error: Option<AppError> = None;

        for (role, document) in targets {
            let Some(document) = document.filter(|d| !is_empty_document(d)) else {
                log::debug!("board {}: nothing to write for {:?}", save.board_id, role);
                report.skipped.push(role);
                continue;
            };

            let dir = role.directory(&snapshot.origin_host, &bucket);
            let parts = NameParts::for_snapshot(&snapshot, &role);

            match self
                .snapshots
                .write_snapshot(&role, &dir, &parts.file_name(), document)
                .await
            {
                Ok(path) => {
                    if role.is_prunable() {
                        to_prune.push((dir, parts));
                    }
                    report.written.push(path);
                }
                Err(e @ AppError::CreateDir { .. }) => return Err(e),
                Err(e) => {
                    log::error!("board {}: {:?} write failed: {}", save.board_id, role, e);
                    first_error.get_or_insert(e);
                }
            }
        }

        for (dir, family) in to_prune {
            let outcomes = self
                .snapshots
                .prune_revisions(&dir, &family, self.keep_revisions)
                .await;
            report.pruned.extend(outcomes);
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(report),
        }
    }

    /// Saves an arbitrary document under `<category>/<host>/<bucket>/`.
    pub async fn save_other(
        &self,
        category: Category,
        board_id: Option<i64>,
        document: Option<Value>,
        origin_host: &str,
        now: NaiveDateTime,
    ) -> Result<SaveReport> {
        let role = Role::Other(category);
        let mut report = SaveReport::default();

        let Some(document) = document.filter(|d| !is_empty_document(d)) else {
            log::debug!("{:?}: nothing to write", role);
            report.skipped.push(role);
            return Ok(report);
        };

        let snapshot = Snapshot::new(board_id, document, now, origin_host)?;
        let dir = role.directory(origin_host, &time_to_bucket_path(&now));
        let file_name = NameParts::for_snapshot(&snapshot, &role).file_name();

        let path = self
            .snapshots
            .write_snapshot(&role, &dir, &file_name, &snapshot.payload)
            .await?;
        report.written.push(path);
        Ok(report)
    }

    /// Stashes a board under a host+board key. An empty document is a no-op success.
    pub async fn stash_board(
        &self,
        board_id: i64,
        document: Option<Value>,
        origin_host: &str,
    ) -> Result<Option<PathBuf>> {
        let Some(document) = document.filter(|d| !is_empty_document(d)) else {
            log::debug!("board {}: empty stash request ignored", board_id);
            return Ok(None);
        };

        let suffix = Role::Stash.suffix(origin_host);
        let parts = NameParts::build(Some(board_id), Some(&document), None, None, Some(&suffix), false)?;
        let path = self.stash.stash(&parts.file_name(), &document).await?;
        Ok(Some(path))
    }

    /// The most recently stashed board across all boards and hosts.
    pub async fn unstash_board(&self) -> Result<Option<StashEntry>> {
        self.stash.latest().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BoardIdentity;
    use async_trait::async_trait;
    use chrono::{NaiveDate, Utc};
    use serde_json::json;
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    /// Records writes in memory and fails on request.
    #[derive(Default)]
    struct FakeStore {
        files: Mutex<Vec<(PathBuf, Value)>>,
        prunes: Mutex<Vec<(PathBuf, String, usize)>>,
        /// Handed back by every prune call.
        prune_outcomes: Vec<(PathBuf, PruneOutcome)>,
        fail_file_for: Option<Role>,
        fail_dir_for: Option<Role>,
    }

    #[async_trait]
    impl SnapshotStore for Arc<FakeStore> {
        async fn write_snapshot(
            &self,
            role: &Role,
            dir: &Path,
            file_name: &str,
            document: &Value,
        ) -> Result<PathBuf> {
            let path = dir.join(file_name);
            let io = || std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
            if self.fail_dir_for.as_ref() == Some(role) {
                return Err(AppError::CreateDir { path: dir.to_path_buf(), source: io() });
            }
            if self.fail_file_for.as_ref() == Some(role) {
                return Err(AppError::WriteFile { path, source: io() });
            }
            self.files.lock().unwrap().push((path.clone(), document.clone()));
            Ok(path)
        }

        async fn prune_revisions(
            &self,
            dir: &Path,
            family: &NameParts,
            keep: usize,
        ) -> Vec<(PathBuf, PruneOutcome)> {
            self.prunes
                .lock()
                .unwrap()
                .push((dir.to_path_buf(), family.revision_mask(), keep));
            self.prune_outcomes.clone()
        }
    }

    #[async_trait]
    impl StashStore for Arc<FakeStore> {
        async fn stash(&self, file_name: &str, document: &Value) -> Result<PathBuf> {
            let path = Path::new("boards/stashed").join(file_name);
            let mut files = self.files.lock().unwrap();
            files.retain(|(p, _)| p != &path);
            files.push((path.clone(), document.clone()));
            Ok(path)
        }

        async fn latest(&self) -> Result<Option<StashEntry>> {
            Ok(self.files.lock().unwrap().last().map(|(_, doc)| StashEntry {
                board: BoardIdentity::from_document(doc),
                payload: doc.clone(),
                written_at: Utc::now(),
            }))
        }
    }

    fn service(store: &Arc<FakeStore>) -> BackupService {
        BackupService::new(Box::new(store.clone()), Box::new(store.clone()), 5)
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(14, 47, 0)
            .unwrap()
    }

    fn board() -> Value {
        json!({ "id": 42, "title": "My Board!!", "revision": 3, "lists": [] })
    }

    fn save(full: Option<Value>, board: Option<Value>) -> BoardSave {
        BoardSave {
            board_id: 42,
            full_document: full,
            board_document: board,
            origin_host: "10.0.0.5".into(),
            now: now(),
        }
    }

    fn written(store: &FakeStore) -> Vec<PathBuf> {
        store.files.lock().unwrap().iter().map(|(p, _)| p.clone()).collect()
    }

    #[tokio::test]
    async fn save_board_writes_three_targets_and_prunes_two() {
        let store = Arc::new(FakeStore::default());
        let full = json!({ "data": board().to_string(), "extra": "x" });

        let report = service(&store).save_board(save(Some(full), Some(board()))).await.unwrap();

        assert_eq!(
            written(&store),
            vec![
                PathBuf::from("boards/10.0.0.5.My_Board.42.latest-saved.nbx"),
                PathBuf::from("boards/full/10.0.0.5/2024-03-15/14/40/10.0.0.5.My_Board.42.3.2024-03-15.full"),
                PathBuf::from("boards/nbx/10.0.0.5/2024-03-15/14/40/10.0.0.5.My_Board.42.3.2024-03-15.nbx"),
            ]
        );
        assert!(report.skipped.is_empty());

        let prunes = store.prunes.lock().unwrap().clone();
        assert_eq!(prunes.len(), 2);
        assert_eq!(prunes[0].1, "10.0.0.5.My_Board.42.*.2024-03-15.full");
        assert_eq!(prunes[1].1, "10.0.0.5.My_Board.42.*.2024-03-15.nbx");
        assert!(prunes.iter().all(|(_, _, keep)| *keep == 5));
    }

    #[tokio::test]
    async fn empty_full_envelope_is_skipped() {
        let store = Arc::new(FakeStore::default());

        let report = service(&store).save_board(save(Some(json!({})), Some(board()))).await.unwrap();

        assert_eq!(report.written.len(), 2);
        assert_eq!(report.skipped, vec![Role::Full]);
        assert!(written(&store).iter().all(|p| !p.to_string_lossy().ends_with(".full")));
        assert_eq!(store.prunes.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn mismatched_id_writes_nothing() {
        let store = Arc::new(FakeStore::default());
        let mut doc = board();
        doc["id"] = json!(7);

        let err = service(&store).save_board(save(Some(doc.clone()), Some(doc))).await.unwrap_err();

        assert!(matches!(err, AppError::BoardIdMismatch { path_id: 42, .. }));
        assert!(written(&store).is_empty());
    }

    #[tokio::test]
    async fn failed_full_write_still_attempts_board() {
        let store = Arc::new(FakeStore {
            fail_file_for: Some(Role::Full),
            ..Default::default()
        });

        let err = service(&store).save_board(save(Some(board()), Some(board()))).await.unwrap_err();

        assert!(matches!(err, AppError::WriteFile { .. }));
        let paths = written(&store);
        assert_eq!(paths.len(), 2);
        assert!(paths[1].to_string_lossy().ends_with(".nbx"));
        // only the successful revisioned write is pruned
        let prunes = store.prunes.lock().unwrap().clone();
        assert_eq!(prunes.len(), 1);
        assert!(prunes[0].1.ends_with(".nbx"));
    }

    #[tokio::test]
    async fn prune_failures_are_reported_not_raised() {
        let gone = PathBuf::from("boards/nbx/old.1.nbx");
        let stuck = PathBuf::from("boards/nbx/old.2.nbx");
        let store = Arc::new(FakeStore {
            prune_outcomes: vec![
                (gone.clone(), PruneOutcome::AlreadyGone),
                (stuck.clone(), PruneOutcome::Failed("permission denied".into())),
            ],
            ..Default::default()
        });

        let report = service(&store).save_board(save(Some(board()), Some(board()))).await.unwrap();

        assert_eq!(report.written.len(), 3);
        // one batch per prunable role
        assert_eq!(report.pruned.len(), 4);
        assert_eq!(report.pruned[0], (gone, PruneOutcome::AlreadyGone));
        assert_eq!(report.pruned[1], (stuck, PruneOutcome::Failed("permission denied".into())));
    }

    #[tokio::test]
    async fn directory_failure_aborts_remaining_writes() {
        let store = Arc::new(FakeStore {
            fail_dir_for: Some(Role::Latest),
            ..Default::default()
        });

        let err = service(&store).save_board(save(Some(board()), Some(board()))).await.unwrap_err();

        assert!(matches!(err, AppError::CreateDir { .. }));
        assert!(written(&store).is_empty());
        assert!(store.prunes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn save_other_uses_category_directory() {
        let store = Arc::new(FakeStore::default());
        let category = Category::new("config").unwrap();

        let report = service(&store)
            .save_other(category, None, Some(json!({ "theme": "dark" })), "10.0.0.5", now())
            .await
            .unwrap();

        assert_eq!(
            report.written,
            vec![PathBuf::from("config/10.0.0.5/2024-03-15/14/40/2024-03-15.data")]
        );
        assert!(store.prunes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_stash_is_a_successful_noop() {
        let store = Arc::new(FakeStore::default());
        let svc = service(&store);

        assert!(svc.stash_board(42, None, "h").await.unwrap().is_none());
        assert!(svc.stash_board(42, Some(json!({})), "h").await.unwrap().is_none());
        assert!(svc.unstash_board().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn stash_key_ignores_revision() {
        let store = Arc::new(FakeStore::default());
        let svc = service(&store);

        let first = svc.stash_board(42, Some(board()), "10.0.0.5").await.unwrap().unwrap();
        let mut newer = board();
        newer["revision"] = json!(4);
        let second = svc.stash_board(42, Some(newer.clone()), "10.0.0.5").await.unwrap().unwrap();

        assert_eq!(first, second);
        assert_eq!(first, PathBuf::from("boards/stashed/My_Board.42.10.0.0.5.latest.json"));
        assert_eq!(svc.unstash_board().await.unwrap().unwrap().payload, newer);
    }
}
