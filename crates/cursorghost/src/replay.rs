//! Replay of recorded editor events
//!
//! One JSON object per line:
//! ```text
//! {"type":"selection","editor":"e1","uri":"file:///repo/a.rs","line":4}
//! {"type":"open_diff","old":"e2","new":"e3","old_text":"...","new_text":"..."}
//! {"type":"activate","editor":"e3","uri":"file:///repo/a.rs"}
//! {"type":"close","editor":"e3"}
//! ```

use anyhow::{Context, Result};
use cursorghost_core::{
    CursorRestorer, DiffSource, DiffViews, EditorActivated, EditorId, Reposition, RootResolver,
    SelectionChanged,
};
use serde::Deserialize;
use std::io::{BufRead, Write};

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReplayEvent {
    Selection(SelectionChanged),
    OpenDiff {
        old: EditorId,
        new: EditorId,
        old_text: String,
        new_text: String,
    },
    Activate(EditorActivated),
    Close {
        editor: EditorId,
    },
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub events: usize,
    pub activations: usize,
    pub restored: usize,
}

/// Feed every event through `restorer`, printing each applied reposition
pub async fn replay<S, R, I, W>(
    input: I,
    restorer: &mut CursorRestorer<S, R>,
    out: &mut W,
) -> Result<ReplaySummary>
where
    S: DiffSource,
    R: RootResolver,
    I: BufRead,
    W: Write,
{
    let mut views = DiffViews::new();
    let mut summary = ReplaySummary::default();

    for (idx, line) in input.lines().enumerate() {
        let line = line.context("Failed to read event log")?;
        if line.trim().is_empty() {
            continue;
        }
        let event: ReplayEvent = serde_json::from_str(&line)
            .with_context(|| format!("Invalid event on line {}", idx + 1))?;
        summary.events += 1;

        match event {
            ReplayEvent::Selection(selection) => restorer.record_selection(&selection),
            ReplayEvent::OpenDiff {
                old,
                new,
                old_text,
                new_text,
            } => views.open(old, new, old_text, new_text),
            ReplayEvent::Close { editor } => {
                views.close(&editor);
            }
            ReplayEvent::Activate(activated) => {
                summary.activations += 1;
                let mut applied: Vec<Reposition> = Vec::new();
                if restorer.restore(&activated, &views, &mut applied).await {
                    summary.restored += 1;
                }
                for reposition in applied {
                    writeln!(out, "{} -> line {}", reposition.editor, reposition.line)?;
                }
            }
        }
    }

    Ok(summary)
}
