//! Anchor lookup over a parsed unified diff
//!
//! Both lookups stop at the first changed line matching the target and
//! answer with the closest preceding context line of the same hunk. Which
//! side triggers the stop is what tells them apart: an added line for
//! [`find_anchor_above`], a removed line for [`find_mapped_line`].

use crate::hunk::{HunkMarker, UnifiedDiff};
use rustc_hash::FxHashMap;

/// Find the nearest context line above an added line.
///
/// `target_new` is a zero-based line in the new file. Returns the new-side
/// number of the last eligible context line before it in the same hunk,
/// never the added line itself. `None` when the target is not an added line
/// or no eligible context line precedes it.
pub fn find_anchor_above(diff: &UnifiedDiff, target_new: usize) -> Option<usize> {
    for hunk in &diff.hunks {
        let mut latest_anchor: Option<usize> = None;

        for numbered in hunk.numbered() {
            match numbered.line.marker {
                HunkMarker::Add => {
                    if numbered.new == Some(target_new) {
                        return latest_anchor;
                    }
                }
                HunkMarker::Remove => {}
                HunkMarker::Context => {
                    if diff.is_anchor_candidate(numbered.line) {
                        latest_anchor = numbered.new;
                    }
                }
            }
        }
    }

    log::debug!("no added line at new line {target_new}");
    None
}

/// Map a removed old line to the new-side position of its nearest context line.
///
/// `target_old` is a zero-based line in the old file. Context lines seen so
/// far are remembered across the whole diff; the anchor itself is the last
/// eligible context line of the hunk containing the target.
pub fn find_mapped_line(diff: &UnifiedDiff, target_old: usize) -> Option<usize> {
    let mut old_to_new_context: FxHashMap<usize, usize> = FxHashMap::default();

    for hunk in &diff.hunks {
        let mut latest_context_old: Option<usize> = None;

        for numbered in hunk.numbered() {
            match numbered.line.marker {
                HunkMarker::Remove => {
                    if numbered.old == Some(target_old) {
                        return latest_context_old
                            .and_then(|old| old_to_new_context.get(&old).copied());
                    }
                }
                HunkMarker::Add => {}
                HunkMarker::Context => {
                    let (Some(old), Some(new)) = (numbered.old, numbered.new) else {
                        continue;
                    };
                    old_to_new_context.insert(old, new);
                    if diff.is_anchor_candidate(numbered.line) {
                        latest_context_old = Some(old);
                    }
                }
            }
        }
    }

    log::debug!("no removed line at old line {target_old}");
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_context(old: &[&str], new_hunk_body: &[&str]) -> String {
        let new_len = new_hunk_body
            .iter()
            .filter(|l| !l.starts_with('-'))
            .count();
        let mut text = format!(
            "--- a/file\n+++ b/file\n@@ -1,{} +1,{} @@\n",
            old.len(),
            new_len
        );
        for line in new_hunk_body {
            text.push_str(line);
            text.push('\n');
        }
        text
    }

    #[test]
    fn test_anchor_above_added_line() {
        // old [a, b, c], new [a, X, b, c]
        let text = full_context(&["a", "b", "c"], &[" a", "+X", " b", " c"]);
        let diff = UnifiedDiff::parse(&text);

        assert_eq!(find_anchor_above(&diff, 1), Some(0));
    }

    #[test]
    fn test_anchor_above_ignores_context_target() {
        let text = full_context(&["a", "b", "c"], &[" a", "+X", " b", " c"]);
        let diff = UnifiedDiff::parse(&text);

        assert_eq!(find_anchor_above(&diff, 2), None);
        assert_eq!(find_anchor_above(&diff, 99), None);
    }

    #[test]
    fn test_anchor_above_at_file_start_is_none() {
        let diff = UnifiedDiff::parse("@@ -1,1 +1,2 @@\n+X\n a\n");
        assert_eq!(find_anchor_above(&diff, 0), None);
    }

    #[test]
    fn test_anchor_above_skips_blank_context_when_suppressed() {
        let diff = UnifiedDiff::parse("@@ -1,3 +1,4 @@\n a\n \n+X\n b\n");
        assert!(diff.suppress_blank_context);
        assert_eq!(find_anchor_above(&diff, 2), Some(0));
    }

    #[test]
    fn test_anchor_above_uses_blank_context_when_diff_adds_blank_lines() {
        let diff = UnifiedDiff::parse("@@ -1,3 +1,5 @@\n a\n \n+X\n+\n b\n");
        assert!(!diff.suppress_blank_context);
        assert_eq!(find_anchor_above(&diff, 2), Some(1));
    }

    #[test]
    fn test_anchor_above_resets_per_hunk() {
        let text = "\
@@ -1,2 +1,2 @@
 a
-b
+B
@@ -10,1 +10,2 @@
+Y
 j
";
        let diff = UnifiedDiff::parse(text);
        assert_eq!(find_anchor_above(&diff, 1), Some(0));
        assert_eq!(find_anchor_above(&diff, 9), None);
    }

    #[test]
    fn test_anchor_above_walks_past_removed_lines() {
        let diff = UnifiedDiff::parse("@@ -1,3 +1,3 @@\n a\n-b\n-c\n+X\n+Y\n");
        assert_eq!(find_anchor_above(&diff, 2), Some(0));
    }

    #[test]
    fn test_mapped_line_for_removed_line() {
        // old [a, b, c], new [a, c]
        let text = full_context(&["a", "b", "c"], &[" a", "-b", " c"]);
        let diff = UnifiedDiff::parse(&text);

        assert_eq!(find_mapped_line(&diff, 1), Some(0));
    }

    #[test]
    fn test_mapped_line_follows_shifted_context() {
        let diff = UnifiedDiff::parse("@@ -1,4 +1,5 @@\n+new0\n+new1\n a\n b\n-c\n d\n");
        assert_eq!(find_mapped_line(&diff, 2), Some(3));
    }

    #[test]
    fn test_mapped_line_lines_zero_to_three_kept_four_removed() {
        let text = full_context(
            &["l0", "l1", "l2", "l3", "l4", "l5"],
            &[" l0", " l1", " l2", " l3", "-l4", " l5"],
        );
        let diff = UnifiedDiff::parse(&text);

        assert_eq!(find_mapped_line(&diff, 4), Some(3));
    }

    #[test]
    fn test_mapped_line_without_preceding_context() {
        let diff = UnifiedDiff::parse("@@ -1,2 +1,1 @@\n-a\n b\n");
        assert_eq!(find_mapped_line(&diff, 0), None);
    }

    #[test]
    fn test_mapped_line_skips_blank_context_when_suppressed() {
        let diff = UnifiedDiff::parse("@@ -1,4 +1,3 @@\n a\n \n-b\n c\n");
        assert_eq!(find_mapped_line(&diff, 2), Some(0));
    }

    #[test]
    fn test_mapped_line_ignores_unremoved_targets() {
        let diff = UnifiedDiff::parse("@@ -1,2 +1,3 @@\n a\n+X\n b\n");
        assert_eq!(find_mapped_line(&diff, 0), None);
        assert_eq!(find_mapped_line(&diff, 1), None);
    }
}
