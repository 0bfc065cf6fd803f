//! Restoring remembered cursor lines when an editor becomes active
//!
//! Selection events keep a [`CursorMemory`] current. When an editor is
//! activated its remembered line is placed directly, or, for one side of a
//! diff view, translated to that side: first through the in-memory
//! [`LineMapping`] of the two buffers, then through the file's git diff when
//! the line has no exact counterpart.
//!
//! Every failure means "leave the cursor where it is". Nothing is retried and
//! nothing is reported to the user.

use crate::anchor::{find_anchor_above, find_mapped_line};
use crate::git::{DiffSource, GitError};
use crate::hunk::UnifiedDiff;
use crate::mapping::{Direction, LineMapping};
use crate::memory::{CursorMemory, FileKey};
use crate::workspace::{relative_path, RootResolver};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Identity of an open editor
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EditorId(pub String);

impl EditorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for EditorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Side of a diff view an editor shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Old,
    New,
}

impl Side {
    /// Direction a remembered line travels to land on this side
    pub fn lookup_direction(self) -> Direction {
        match self {
            Side::New => Direction::Forward,
            Side::Old => Direction::Reverse,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Old => f.write_str("old"),
            Side::New => f.write_str("new"),
        }
    }
}

/// An editor's place in a diff view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffPair {
    pub side: Side,
    /// The editor showing the other side
    pub sibling: EditorId,
    pub old_text: String,
    pub new_text: String,
}

/// Answers which diff pair, if any, an editor belongs to
pub trait DiffViewQuery {
    fn diff_pair(&self, editor: &EditorId) -> Option<&DiffPair>;
}

/// Diff views currently open, keyed by either of their editors
#[derive(Debug, Clone, Default)]
pub struct DiffViews {
    pairs: FxHashMap<EditorId, DiffPair>,
}

impl DiffViews {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, old: EditorId, new: EditorId, old_text: String, new_text: String) {
        self.pairs.insert(
            old.clone(),
            DiffPair {
                side: Side::Old,
                sibling: new.clone(),
                old_text: old_text.clone(),
                new_text: new_text.clone(),
            },
        );
        self.pairs.insert(
            new,
            DiffPair {
                side: Side::New,
                sibling: old,
                old_text,
                new_text,
            },
        );
    }

    /// Close the view `editor` belongs to, both sides at once
    pub fn close(&mut self, editor: &EditorId) -> bool {
        let Some(pair) = self.pairs.remove(editor) else {
            return false;
        };
        self.pairs.remove(&pair.sibling);
        true
    }

    pub fn len(&self) -> usize {
        self.pairs.len() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl DiffViewQuery for DiffViews {
    fn diff_pair(&self, editor: &EditorId) -> Option<&DiffPair> {
        self.pairs.get(editor)
    }
}

/// The cursor of `editor` moved to `line`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionChanged {
    pub editor: EditorId,
    pub uri: String,
    pub line: usize,
}

/// `editor` became the active editor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorActivated {
    pub editor: EditorId,
    pub uri: String,
    /// Absolute path on disk, when the URI alone does not give one
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl EditorActivated {
    fn file_path(&self, key: &FileKey) -> Option<PathBuf> {
        if let Some(path) = &self.path {
            return Some(path.clone());
        }
        let candidate = Path::new(key.as_str());
        candidate.is_absolute().then(|| candidate.to_path_buf())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Reveal {
    #[default]
    Center,
}

/// Request to move an editor's caret
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reposition {
    pub editor: EditorId,
    pub line: usize,
    pub column: usize,
    pub reveal: Reveal,
}

impl Reposition {
    pub fn new(editor: EditorId, line: usize) -> Self {
        Self {
            editor,
            line,
            column: 0,
            reveal: Reveal::Center,
        }
    }
}

/// Applies repositions to editors. Targets may already be closed.
pub trait RepositionSink {
    fn reposition(&mut self, reposition: &Reposition);
}

impl RepositionSink for Vec<Reposition> {
    fn reposition(&mut self, reposition: &Reposition) {
        self.push(reposition.clone());
    }
}

#[derive(Error, Debug)]
pub enum RestoreError {
    #[error("no line remembered for {0}")]
    NothingRemembered(FileKey),
    #[error("{} is not inside a known workspace root", .0.display())]
    NoWorkspaceRoot(PathBuf),
    #[error("diff source failed: {0}")]
    DiffSource(#[from] GitError),
    #[error("line {line} has no counterpart on the {side} side")]
    NoMapping { line: usize, side: Side },
}

impl RestoreError {
    /// False for outcomes that are ordinary "not found" results
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            RestoreError::NoWorkspaceRoot(_) | RestoreError::DiffSource(_)
        )
    }
}

/// Owns the cursor memory and the collaborators needed to restore lines
pub struct CursorRestorer<S, R> {
    memory: CursorMemory,
    source: S,
    roots: R,
}

impl<S: DiffSource, R: RootResolver> CursorRestorer<S, R> {
    pub fn new(source: S, roots: R) -> Self {
        Self::with_memory(CursorMemory::new(), source, roots)
    }

    pub fn with_memory(memory: CursorMemory, source: S, roots: R) -> Self {
        Self {
            memory,
            source,
            roots,
        }
    }

    pub fn memory(&self) -> &CursorMemory {
        &self.memory
    }

    /// Tear down, handing back the memory
    pub fn into_memory(self) -> CursorMemory {
        self.memory
    }

    pub fn record_selection(&mut self, event: &SelectionChanged) {
        self.memory.record(FileKey::from_uri(&event.uri), event.line);
    }

    /// Work out where the activated editor's caret should go
    pub async fn on_editor_activated<Q: DiffViewQuery>(
        &self,
        event: &EditorActivated,
        views: &Q,
    ) -> Result<Reposition, RestoreError> {
        let key = FileKey::from_uri(&event.uri);
        let line = self
            .memory
            .get(&key)
            .ok_or_else(|| RestoreError::NothingRemembered(key.clone()))?;

        let Some(pair) = views.diff_pair(&event.editor) else {
            return Ok(Reposition::new(event.editor.clone(), line));
        };
        let side = pair.side;

        // Any hit is trusted, even inside a changed region of the view
        let mapping = LineMapping::build(&pair.old_text, &pair.new_text);
        if let Some(mapped) = mapping.resolve(side.lookup_direction(), line) {
            return Ok(Reposition::new(event.editor.clone(), mapped));
        }
        log::debug!("buffers give no {side} line for line {line} of {key}, asking git");

        let path = event
            .file_path(&key)
            .ok_or_else(|| RestoreError::NoWorkspaceRoot(PathBuf::from(key.as_str())))?;
        let (root, relative) = relative_path(&self.roots, &path)
            .await
            .ok_or_else(|| RestoreError::NoWorkspaceRoot(path.clone()))?;

        let text = self.source.unified_diff(&root, &relative).await?;
        let diff = UnifiedDiff::parse(&text);

        let resolved = match side {
            Side::New => find_mapped_line(&diff, line),
            // The anchor is new-numbered and only usable through its old-side copy
            Side::Old => find_anchor_above(&diff, line).and_then(|anchor| {
                let old = mapping.new_to_old(anchor);
                if old.is_none() {
                    log::debug!("anchor {anchor} of {key} has no line in the old buffer");
                }
                old
            }),
        };

        resolved
            .map(|target| Reposition::new(event.editor.clone(), target))
            .ok_or(RestoreError::NoMapping { line, side })
    }

    /// Resolve and, on success, apply on the next scheduler turn.
    ///
    /// Returns whether a reposition was applied.
    pub async fn restore<Q: DiffViewQuery, K: RepositionSink>(
        &self,
        event: &EditorActivated,
        views: &Q,
        sink: &mut K,
    ) -> bool {
        match self.on_editor_activated(event, views).await {
            Ok(reposition) => {
                apply_deferred(sink, reposition).await;
                true
            }
            Err(err) if err.is_failure() => {
                log::warn!("cursor not restored for {}: {err}", event.uri);
                false
            }
            Err(err) => {
                log::debug!("cursor not restored for {}: {err}", event.uri);
                false
            }
        }
    }
}

/// Apply a reposition after yielding once to the scheduler
pub async fn apply_deferred<K: RepositionSink>(sink: &mut K, reposition: Reposition) {
    tokio::task::yield_now().await;
    log::info!(
        "restored line {} for editor {}",
        reposition.line,
        reposition.editor
    );
    sink.reposition(&reposition);
}
