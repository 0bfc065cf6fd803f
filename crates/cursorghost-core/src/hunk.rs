//! Unified diff parsing
//!
//! Produces hunks with their header positions and body lines. Line number
//! bookkeeping for body lines is done once, in [`Hunk::numbered`], and shared
//! by every consumer.

use regex::Regex;
use std::sync::OnceLock;

static HUNK_HEADER: OnceLock<Regex> = OnceLock::new();

fn hunk_header() -> &'static Regex {
    HUNK_HEADER.get_or_init(|| {
        Regex::new(r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@")
            .expect("hunk header pattern should compile")
    })
}

/// Kind of a hunk body line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HunkMarker {
    Context,
    Add,
    Remove,
}

/// One body line of a hunk, marker stripped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HunkLine {
    pub marker: HunkMarker,
    pub text: String,
}

impl HunkLine {
    pub fn new(marker: HunkMarker, text: impl Into<String>) -> Self {
        Self {
            marker,
            text: text.into(),
        }
    }

    /// Whitespace-only line
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// A body line together with its zero-based position on each side
#[derive(Debug, Clone, Copy)]
pub struct NumberedLine<'a> {
    pub line: &'a HunkLine,
    /// Set for context and removed lines
    pub old: Option<usize>,
    /// Set for context and added lines
    pub new: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    pub old_start: usize, // 1-based, as written in the header
    pub new_start: usize, // 1-based, as written in the header
    pub lines: Vec<HunkLine>,
}

impl Hunk {
    /// Zero-based old line number of the first old-side body line
    pub fn old_counter_start(&self) -> usize {
        self.old_start.saturating_sub(1)
    }

    /// Zero-based new line number of the first new-side body line
    pub fn new_counter_start(&self) -> usize {
        self.new_start.saturating_sub(1)
    }

    /// Iterate body lines with their line numbers.
    ///
    /// The old counter advances on context and removed lines, the new counter
    /// on context and added lines. Each line reports the counter value before
    /// it advances.
    pub fn numbered(&self) -> impl Iterator<Item = NumberedLine<'_>> + '_ {
        let mut old = self.old_counter_start();
        let mut new = self.new_counter_start();
        self.lines.iter().map(move |line| {
            let numbered = match line.marker {
                HunkMarker::Context => NumberedLine {
                    line,
                    old: Some(old),
                    new: Some(new),
                },
                HunkMarker::Remove => NumberedLine {
                    line,
                    old: Some(old),
                    new: None,
                },
                HunkMarker::Add => NumberedLine {
                    line,
                    old: None,
                    new: Some(new),
                },
            };
            if numbered.old.is_some() {
                old += 1;
            }
            if numbered.new.is_some() {
                new += 1;
            }
            numbered
        })
    }
}

/// A parsed single-file unified diff
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnifiedDiff {
    pub hunks: Vec<Hunk>,
    /// True unless the diff adds at least one empty line (a line that is exactly `+`).
    /// While set, blank context lines never serve as anchors.
    pub suppress_blank_context: bool,
}

impl UnifiedDiff {
    pub fn parse(text: &str) -> Self {
        let suppress_blank_context = !text.lines().any(|line| line == "+");

        let mut hunks = Vec::new();
        let mut open: Option<OpenHunk> = None;

        for raw in text.lines() {
            if let Some(header) = parse_header(raw) {
                if let Some(done) = open.take() {
                    hunks.push(done.hunk);
                }
                open = Some(header);
                continue;
            }
            let Some(current) = open.as_mut() else {
                continue;
            };
            if let Some(line) = current.classify(raw) {
                current.hunk.lines.push(line);
            }
        }
        if let Some(done) = open {
            hunks.push(done.hunk);
        }

        Self {
            hunks,
            suppress_blank_context,
        }
    }

    /// Whether a context line may be used as an anchor
    pub fn is_anchor_candidate(&self, line: &HunkLine) -> bool {
        line.marker == HunkMarker::Context && !(self.suppress_blank_context && line.is_blank())
    }

    pub fn is_empty(&self) -> bool {
        self.hunks.is_empty()
    }
}

struct OpenHunk {
    hunk: Hunk,
    remaining_old: usize,
    remaining_new: usize,
}

impl OpenHunk {
    /// Classify one body line by its marker, advancing the remaining counts.
    ///
    /// A line starting `+++` or `---` is an add or remove line while the
    /// header still expects lines on that side, and a file header otherwise.
    /// Lines with any other prefix yield `None` and advance nothing.
    fn classify(&mut self, raw: &str) -> Option<HunkLine> {
        let line = if let Some(text) = raw.strip_prefix('+') {
            if raw.starts_with("+++") && self.remaining_new == 0 {
                return None;
            }
            HunkLine::new(HunkMarker::Add, text)
        } else if let Some(text) = raw.strip_prefix('-') {
            if raw.starts_with("---") && self.remaining_old == 0 {
                return None;
            }
            HunkLine::new(HunkMarker::Remove, text)
        } else if let Some(text) = raw.strip_prefix(' ') {
            HunkLine::new(HunkMarker::Context, text)
        } else {
            return None;
        };

        match line.marker {
            HunkMarker::Context => {
                self.remaining_old = self.remaining_old.saturating_sub(1);
                self.remaining_new = self.remaining_new.saturating_sub(1);
            }
            HunkMarker::Remove => self.remaining_old = self.remaining_old.saturating_sub(1),
            HunkMarker::Add => self.remaining_new = self.remaining_new.saturating_sub(1),
        }
        Some(line)
    }
}

fn parse_header(line: &str) -> Option<OpenHunk> {
    let caps = hunk_header().captures(line)?;
    let number = |idx: usize, default: usize| -> Option<usize> {
        match caps.get(idx) {
            Some(m) => m.as_str().parse().ok(),
            None => Some(default),
        }
    };

    let old_start = number(1, 0)?;
    let old_len = number(2, 1)?;
    let new_start = number(3, 0)?;
    let new_len = number(4, 1)?;

    Some(OpenHunk {
        hunk: Hunk {
            old_start,
            new_start,
            lines: Vec::new(),
        },
        remaining_old: old_len,
        remaining_new: new_len,
    })
}
