//! # Filename Codec
//!
//! Deterministic file names of the form
//! `prefix.title.id.revision.datestamp.suffix`, where every empty part is
//! dropped, plus the glob mask that selects a whole revision family.

use crate::bucket::time_to_datestamp;
use crate::error::Result;
use crate::models::{revision_of, BoardIdentity, Role, Snapshot};
use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Characters that are unsafe in paths or shells, plus whitespace.
/// Any run of them becomes a single `_`.
static RE_SEPARATORS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r##"[\s%\&",)@\^.;!/}*\[(>\\?#`{\]:+\~'|$<]+"##)
        .expect("separator pattern is valid")
});

/// Turns a board title into a filesystem-safe token.
///
/// Leading and trailing separators vanish, so `"My Board!!"` becomes `My_Board`.
pub fn sanitize_title(raw: &str) -> String {
    RE_SEPARATORS
        .split(raw)
        .filter(|chunk| !chunk.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// The individual slots of a file name, before joining.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NameParts {
    pub prefix: Option<String>,
    /// Already sanitized.
    pub title: String,
    pub board_id: Option<i64>,
    pub revision: Option<i64>,
    pub datestamp: Option<String>,
    pub suffix: Option<String>,
}

impl NameParts {
    /// Builds the slots from raw request data.
    ///
    /// Fails only when `board_id` and the payload's `id` disagree.
    pub fn build(
        board_id: Option<i64>,
        payload: Option<&Value>,
        at: Option<&NaiveDateTime>,
        prefix: Option<&str>,
        suffix: Option<&str>,
        include_revision: bool,
    ) -> Result<Self> {
        let board = BoardIdentity::resolve(board_id, payload)?;
        let revision = if include_revision {
            payload.and_then(revision_of)
        } else {
            None
        };
        Ok(Self::assemble(&board, revision, at, prefix, suffix))
    }

    /// Slots for a snapshot written under `role`.
    pub fn for_snapshot(snapshot: &Snapshot, role: &Role) -> Self {
        let revision = snapshot.revision.filter(|_| role.includes_revision());
        let at = Some(&snapshot.captured_at).filter(|_| role.includes_datestamp());
        let suffix = role.suffix(&snapshot.origin_host);
        Self::assemble(
            &snapshot.board,
            revision,
            at,
            role.prefix(&snapshot.origin_host),
            Some(&suffix),
        )
    }

    fn assemble(
        board: &BoardIdentity,
        revision: Option<i64>,
        at: Option<&NaiveDateTime>,
        prefix: Option<&str>,
        suffix: Option<&str>,
    ) -> Self {
        Self {
            prefix: prefix.filter(|p| !p.is_empty()).map(str::to_string),
            title: sanitize_title(&board.title),
            board_id: board.id,
            revision,
            datestamp: at.map(time_to_datestamp),
            suffix: suffix.filter(|s| !s.is_empty()).map(str::to_string),
        }
    }

    /// Non-empty parts in order: prefix, title, id, revision, datestamp, suffix.
    pub fn to_vec(&self) -> Vec<String> {
        self.slots(self.revision.map(|r| r.to_string()))
    }

    pub fn file_name(&self) -> String {
        self.to_vec().join(".")
    }

    /// Glob mask preselecting this name's revision family.
    ///
    /// The revision slot is always present as `*`; the other parts are
    /// escaped so they only ever match literally. `*` can span dots, so
    /// candidates must also pass [`NameParts::is_family_member`].
    pub fn revision_mask(&self) -> String {
        let (head, tail) = self.family_parts();
        head.iter()
            .map(|p| glob::Pattern::escape(p))
            .chain(std::iter::once("*".to_string()))
            .chain(tail.iter().map(|p| glob::Pattern::escape(p)))
            .collect::<Vec<_>>()
            .join(".")
    }

    /// True when `file_name` is this name with a single integer in the revision slot.
    pub fn is_family_member(&self, file_name: &str) -> bool {
        let (head, tail) = self.family_parts();
        let mut rest = file_name;

        if !head.is_empty() {
            match rest.strip_prefix(&format!("{}.", head.join("."))) {
                Some(r) => rest = r,
                None => return false,
            }
        }
        if !tail.is_empty() {
            match rest.strip_suffix(&format!(".{}", tail.join("."))) {
                Some(r) => rest = r,
                None => return false,
            }
        }
        !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit() || b == b'-') && rest.parse::<i64>().is_ok()
    }

    // Parts before and after the revision slot.
    fn family_parts(&self) -> (Vec<String>, Vec<String>) {
        let mut head = self.slots(None);
        let tail_len = usize::from(self.datestamp.is_some()) + usize::from(self.suffix.is_some());
        let tail = head.split_off(head.len().saturating_sub(tail_len));
        (head, tail)
    }

    fn slots(&self, revision: Option<String>) -> Vec<String> {
        [
            self.prefix.clone(),
            Some(self.title.clone()),
            self.board_id.map(|id| id.to_string()),
            revision,
            self.datestamp.clone(),
            self.suffix.clone(),
        ]
        .into_iter()
        .flatten()
        .filter(|p| !p.is_empty())
        .collect()
    }
}

/// Ordered name parts; see [`NameParts::build`].
pub fn build_name_parts(
    board_id: Option<i64>,
    payload: Option<&Value>,
    at: Option<&NaiveDateTime>,
    prefix: Option<&str>,
    suffix: Option<&str>,
    include_revision: bool,
) -> Result<Vec<String>> {
    NameParts::build(board_id, payload, at, prefix, suffix, include_revision).map(|p| p.to_vec())
}

/// Name parts joined with `.`.
pub fn build_name(
    board_id: Option<i64>,
    payload: Option<&Value>,
    at: Option<&NaiveDateTime>,
    prefix: Option<&str>,
    suffix: Option<&str>,
    include_revision: bool,
) -> Result<String> {
    build_name_parts(board_id, payload, at, prefix, suffix, include_revision).map(|p| p.join("."))
}
