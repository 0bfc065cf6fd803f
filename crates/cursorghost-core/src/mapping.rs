//! Line correspondence between the two sides of an open diff

use crate::segment::{diff_lines, ChangeSegment, SegmentKind};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Lookup direction through a [`LineMapping`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Old line number to new line number
    Forward,
    /// New line number to old line number
    Reverse,
}

/// Zero-based line tables for unchanged lines.
///
/// Both tables are partial injections and mirror each other: an unchanged
/// line at old index `i` and new index `j` appears as `i -> j` and `j -> i`.
/// Added and removed lines have no entry.
#[derive(Debug, Clone, Default)]
pub struct LineMapping {
    old_to_new: FxHashMap<usize, usize>,
    new_to_old: FxHashMap<usize, usize>,
}

impl LineMapping {
    /// Diff `old` against `new` and record every unchanged line pair
    pub fn build(old: &str, new: &str) -> Self {
        Self::from_segments(&diff_lines(old, new))
    }

    pub fn from_segments(segments: &[ChangeSegment]) -> Self {
        let mut mapping = Self::default();
        let mut old_line = 0usize;
        let mut new_line = 0usize;

        for segment in segments {
            let count = segment.line_count();
            match segment.kind {
                SegmentKind::Unchanged => {
                    for _ in 0..count {
                        mapping.new_to_old.insert(new_line, old_line);
                        mapping.old_to_new.insert(old_line, new_line);
                        old_line += 1;
                        new_line += 1;
                    }
                }
                SegmentKind::Added => new_line += count,
                SegmentKind::Removed => old_line += count,
            }
        }

        mapping
    }

    pub fn resolve(&self, direction: Direction, line: usize) -> Option<usize> {
        match direction {
            Direction::Forward => self.old_to_new(line),
            Direction::Reverse => self.new_to_old(line),
        }
    }

    pub fn old_to_new(&self, line: usize) -> Option<usize> {
        self.old_to_new.get(&line).copied()
    }

    pub fn new_to_old(&self, line: usize) -> Option<usize> {
        self.new_to_old.get(&line).copied()
    }

    /// Number of unchanged line pairs
    pub fn len(&self) -> usize {
        self.old_to_new.len()
    }

    pub fn is_empty(&self) -> bool {
        self.old_to_new.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> usize {
        text.lines().count()
    }

    #[test]
    fn test_added_line_shifts_new_side() {
        let mapping = LineMapping::build("a\nb\nc\n", "a\nX\nb\nc\n");

        assert_eq!(mapping.resolve(Direction::Forward, 0), Some(0));
        assert_eq!(mapping.resolve(Direction::Forward, 1), Some(2));
        assert_eq!(mapping.resolve(Direction::Forward, 2), Some(3));
        assert_eq!(mapping.resolve(Direction::Reverse, 1), None);
        assert_eq!(mapping.resolve(Direction::Reverse, 3), Some(2));
    }

    #[test]
    fn test_removed_line_has_no_forward_entry() {
        let mapping = LineMapping::build("a\nb\nc\n", "a\nc\n");

        assert_eq!(mapping.old_to_new(1), None);
        assert_eq!(mapping.old_to_new(2), Some(1));
        assert_eq!(mapping.new_to_old(1), Some(2));
    }

    #[test]
    fn test_empty_inputs_give_empty_mapping() {
        let mapping = LineMapping::build("", "");
        assert!(mapping.is_empty());
        assert_eq!(mapping.resolve(Direction::Forward, 0), None);
    }

    #[test]
    fn test_round_trip_over_unchanged_lines() {
        let old = "fn main() {\n    let a = 1;\n    let b = 2;\n    println!(\"{a}\");\n}\n";
        let new = "// header\nfn main() {\n    let a = 1;\n    println!(\"{a}\");\n    drop(a);\n}\n";
        let mapping = LineMapping::build(old, new);

        for old_line in 0..lines(old) {
            if let Some(new_line) = mapping.old_to_new(old_line) {
                assert_eq!(mapping.new_to_old(new_line), Some(old_line));
            }
        }
    }

    #[test]
    fn test_table_sizes_account_for_every_line() {
        let old = "a\nb\nc\nd\ne\n";
        let new = "a\nc\nD\ne\nf\n";
        let segments = diff_lines(old, new);
        let mapping = LineMapping::from_segments(&segments);

        let removed: usize = segments
            .iter()
            .filter(|s| s.kind == SegmentKind::Removed)
            .map(ChangeSegment::line_count)
            .sum();
        let added: usize = segments
            .iter()
            .filter(|s| s.kind == SegmentKind::Added)
            .map(ChangeSegment::line_count)
            .sum();

        assert_eq!(mapping.len() + removed, lines(old));
        assert_eq!(mapping.new_to_old.len() + added, lines(new));
    }

    #[test]
    fn test_from_hand_built_segments() {
        let segments = vec![
            ChangeSegment::new(SegmentKind::Unchanged, vec!["a".into()]),
            ChangeSegment::new(SegmentKind::Removed, vec!["b".into(), "c".into()]),
            ChangeSegment::new(SegmentKind::Added, vec!["B".into()]),
            ChangeSegment::new(SegmentKind::Unchanged, vec!["d".into()]),
        ];
        let mapping = LineMapping::from_segments(&segments);

        assert_eq!(mapping.old_to_new(0), Some(0));
        assert_eq!(mapping.old_to_new(3), Some(2));
        assert_eq!(mapping.new_to_old(1), None);
        assert_eq!(mapping.len(), 2);
    }
}
