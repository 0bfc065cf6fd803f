//! Line-level change segments between two texts

use imara_diff::{Algorithm, Diff, InternedInput};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Classification of a run of lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SegmentKind {
    Unchanged,
    Added,
    Removed,
}

/// A maximal run of lines sharing one classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSegment {
    pub kind: SegmentKind,
    /// Line contents without their terminators
    pub lines: Vec<String>,
}

impl ChangeSegment {
    pub fn new(kind: SegmentKind, lines: Vec<String>) -> Self {
        Self { kind, lines }
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// The segment text with its lines joined by `\n`
    pub fn value(&self) -> String {
        self.lines.join("\n")
    }
}

/// Diff two texts line by line.
///
/// Inside one change region the removed run is emitted before the added run.
pub fn diff_lines(old: &str, new: &str) -> Vec<ChangeSegment> {
    let input = InternedInput::new(old, new);
    let mut diff = Diff::compute(Algorithm::Myers, &input);
    diff.postprocess_lines(&input);

    let before = |range: Range<u32>| -> Vec<String> {
        range
            .map(|idx| strip_terminator(input.interner[input.before[idx as usize]]).to_string())
            .collect()
    };
    let after = |range: Range<u32>| -> Vec<String> {
        range
            .map(|idx| strip_terminator(input.interner[input.after[idx as usize]]).to_string())
            .collect()
    };

    let mut segments = Vec::new();
    let mut old_pos = 0u32;

    for hunk in diff.hunks() {
        if hunk.before.start > old_pos {
            segments.push(ChangeSegment::new(
                SegmentKind::Unchanged,
                before(old_pos..hunk.before.start),
            ));
        }
        if !hunk.before.is_empty() {
            segments.push(ChangeSegment::new(
                SegmentKind::Removed,
                before(hunk.before.clone()),
            ));
        }
        if !hunk.after.is_empty() {
            segments.push(ChangeSegment::new(
                SegmentKind::Added,
                after(hunk.after.clone()),
            ));
        }
        old_pos = hunk.before.end;
    }

    let old_len = input.before.len() as u32;
    if old_pos < old_len {
        segments.push(ChangeSegment::new(
            SegmentKind::Unchanged,
            before(old_pos..old_len),
        ));
    }

    segments
}

fn strip_terminator(line: &str) -> &str {
    line.strip_suffix('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .unwrap_or(line)
}
