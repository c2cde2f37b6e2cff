//! # Domain Models
//!
//! These types describe what gets persisted for every inbound write.
//! Payloads stay opaque `serde_json::Value`s; only `id`, `title` and
//! `revision` are ever looked at.

use crate::error::{AppError, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};

/// Identity of a kanban board as far as file naming is concerned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardIdentity {
    /// Caller-supplied id (path segment). Absent for category saves such as `/config`.
    pub id: Option<i64>,
    /// Raw title taken from the payload, unsanitized. May be empty.
    pub title: String,
}

impl BoardIdentity {
    /// Builds the identity for a write, checking the path id against the payload id.
    ///
    /// The check only applies when both sides carry an id. A payload `id`
    /// that is not an integer never matches.
    pub fn resolve(board_id: Option<i64>, payload: Option<&Value>) -> Result<Self> {
        let payload = payload.filter(|p| !is_empty_document(p));

        if let (Some(path_id), Some(embedded)) = (board_id, payload.and_then(|p| p.get("id"))) {
            if embedded.as_i64() != Some(path_id) {
                return Err(AppError::BoardIdMismatch {
                    path_id,
                    payload_id: embedded.to_string(),
                });
            }
        }

        let title = payload
            .and_then(|p| p.get("title"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim()
            .to_string();

        Ok(Self { id: board_id, title })
    }

    /// Best-effort identity read back from a stored document.
    pub fn from_document(document: &Value) -> Self {
        Self {
            id: document.get("id").and_then(Value::as_i64),
            title: document
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        }
    }
}

/// The full set of facts persisted per write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub board: BoardIdentity,
    /// `revision` field of the payload, if it has one.
    pub revision: Option<i64>,
    pub payload: Value,
    /// Local wall-clock time of the write; drives buckets and datestamps.
    pub captured_at: NaiveDateTime,
    /// Peer address of the client, used as an opaque grouping key.
    pub origin_host: String,
}

impl Snapshot {
    pub fn new(
        board_id: Option<i64>,
        payload: Value,
        captured_at: NaiveDateTime,
        origin_host: impl Into<String>,
    ) -> Result<Self> {
        let board = BoardIdentity::resolve(board_id, Some(&payload))?;
        Ok(Self {
            board,
            revision: revision_of(&payload),
            payload,
            captured_at,
            origin_host: origin_host.into(),
        })
    }
}

/// A stashed board as read back from disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StashEntry {
    pub board: BoardIdentity,
    pub payload: Value,
    /// File modification time.
    pub written_at: DateTime<Utc>,
}

/// Input of a board save: the whole request envelope plus the board-only part.
#[derive(Debug, Clone)]
pub struct BoardSave {
    pub board_id: i64,
    pub full_document: Option<Value>,
    pub board_document: Option<Value>,
    pub origin_host: String,
    pub now: NaiveDateTime,
}

/// Name of a free-form save target such as `config`.
///
/// Used verbatim as the top-level directory, so only ASCII alphanumerics,
/// `-` and `_` are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Category(String);

impl Category {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if valid {
            Ok(Self(name))
        } else {
            Err(AppError::InvalidCategory(name))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Category {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Category> for String {
    fn from(value: Category) -> Self {
        value.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which of the parallel captures a file represents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    /// Flat pointer to the most recent board, overwritten on every save.
    Latest,
    /// Whole request envelope, bucketed and revisioned.
    Full,
    /// Board payload only, in the same format Nullboard exports.
    Board,
    /// Anything saved under a named category.
    Other(Category),
    /// Single-slot store for unsynced boards.
    Stash,
}

impl Role {
    /// Fixed filename suffix. The stash suffix embeds the origin host.
    pub fn suffix(&self, origin_host: &str) -> String {
        match self {
            Role::Latest => "latest-saved.nbx".to_string(),
            Role::Full => "full".to_string(),
            Role::Board => "nbx".to_string(),
            Role::Other(_) => "data".to_string(),
            Role::Stash => format!("{origin_host}.latest.json"),
        }
    }

    /// Host used as the leading name part, if the role has one.
    pub fn prefix<'a>(&self, origin_host: &'a str) -> Option<&'a str> {
        match self {
            Role::Latest | Role::Full | Role::Board => Some(origin_host),
            Role::Other(_) | Role::Stash => None,
        }
    }

    pub fn includes_revision(&self) -> bool {
        matches!(self, Role::Full | Role::Board | Role::Other(_))
    }

    /// Overwritten roles carry no datestamp.
    pub fn includes_datestamp(&self) -> bool {
        self.includes_revision()
    }

    /// Only the two board captures keep a bounded revision family.
    pub fn is_prunable(&self) -> bool {
        matches!(self, Role::Full | Role::Board)
    }

    /// Directory relative to the backup root.
    pub fn directory(&self, origin_host: &str, bucket: &Path) -> PathBuf {
        match self {
            Role::Latest => PathBuf::from("boards"),
            Role::Full => Path::new("boards/full").join(origin_host).join(bucket),
            Role::Board => Path::new("boards/nbx").join(origin_host).join(bucket),
            Role::Other(category) => Path::new(category.as_str()).join(origin_host).join(bucket),
            Role::Stash => PathBuf::from("boards/stashed"),
        }
    }
}

/// Absent, `null`, `{}`, `[]` and `""` all count as "nothing to write".
pub fn is_empty_document(document: &Value) -> bool {
    match document {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// The payload's `revision` field, when it is an integer.
pub fn revision_of(payload: &Value) -> Option<i64> {
    payload.get("revision").and_then(Value::as_i64)
}
