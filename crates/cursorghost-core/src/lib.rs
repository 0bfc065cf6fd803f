//! Core engine for cursorghost
//!
//! Maps a remembered line number between versions of a file: exactly through
//! a line diff of two open buffers, or approximately through the nearest
//! unchanged line of the file's git diff when the line itself was added or
//! removed.

pub mod anchor;
pub mod git;
pub mod hunk;
pub mod mapping;
pub mod memory;
pub mod restore;
pub mod segment;
pub mod workspace;

pub use anchor::{find_anchor_above, find_mapped_line};
pub use git::{DiffSource, GitDiffSource, GitError, FULL_FILE_CONTEXT};
pub use hunk::{Hunk, HunkLine, HunkMarker, UnifiedDiff};
pub use mapping::{Direction, LineMapping};
pub use memory::{CursorMemory, FileKey};
pub use restore::{
    apply_deferred, CursorRestorer, DiffPair, DiffViewQuery, DiffViews, EditorActivated,
    EditorId, Reposition, RepositionSink, RestoreError, Reveal, SelectionChanged, Side,
};
pub use segment::{diff_lines, ChangeSegment, SegmentKind};
pub use workspace::{relative_path, GitRootResolver, RootResolver, WorkspaceRoots};
