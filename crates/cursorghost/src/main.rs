//! cursorghost CLI - restore cursor lines across diffs and revisions

mod config;
mod replay;

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use cursorghost_core::git::{get_repo_root, get_staged_content};
use cursorghost_core::GitError;
use cursorghost_core::{
    find_anchor_above, find_mapped_line, CursorMemory, CursorRestorer, DiffViews, Direction,
    EditorActivated, EditorId, FileKey, LineMapping, Side, UnifiedDiff,
};
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "cursorghost")]
#[command(author, version, about = "Restore cursor lines across diffs and git revisions")]
struct Args {
    /// Config file to use instead of ~/.config/cursorghost/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Map a line between two versions of a file
    Map {
        old: PathBuf,
        new: PathBuf,
        /// Zero-based line number
        line: usize,
        /// Map from the new file to the old file
        #[arg(long)]
        reverse: bool,
    },
    /// Find an anchor line in a unified diff
    Anchor(AnchorArgs),
    /// Resolve a remembered line for one side of a file's git diff
    Resolve {
        file: PathBuf,
        /// Zero-based remembered line
        #[arg(long)]
        line: usize,
        /// Side of the diff being displayed
        #[arg(long, value_enum)]
        side: CliSide,
    },
    /// Replay a JSON-lines editor event log
    Replay {
        /// Event log; stdin when omitted
        events: Option<PathBuf>,
    },
}

#[derive(ClapArgs, Debug)]
struct AnchorArgs {
    /// Unified diff file; stdin when omitted
    diff: Option<PathBuf>,
    /// Added line in the new file: find the context line above it
    #[arg(long, conflicts_with = "old_line", required_unless_present = "old_line")]
    new_line: Option<usize>,
    /// Removed line in the old file: find its new-side anchor
    #[arg(long)]
    old_line: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum CliSide {
    Old,
    New,
}

impl From<CliSide> for Side {
    fn from(side: CliSide) -> Self {
        match side {
            CliSide::Old => Side::Old,
            CliSide::New => Side::New,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = config::Config::load(args.config.as_ref());

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log.level.as_str()),
    )
    .init();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match args.command {
        Command::Map {
            old,
            new,
            line,
            reverse,
        } => {
            let old_text = std::fs::read_to_string(&old)
                .context(format!("Failed to read: {}", old.display()))?;
            let new_text = std::fs::read_to_string(&new)
                .context(format!("Failed to read: {}", new.display()))?;
            let direction = if reverse {
                Direction::Reverse
            } else {
                Direction::Forward
            };
            let mapping = LineMapping::build(&old_text, &new_text);
            print_line(&mut out, mapping.resolve(direction, line))?;
        }
        Command::Anchor(anchor) => {
            let text = read_input(anchor.diff.as_deref())?;
            let diff = UnifiedDiff::parse(&text);
            let resolved = match (anchor.new_line, anchor.old_line) {
                (Some(line), _) => find_anchor_above(&diff, line),
                (None, Some(line)) => find_mapped_line(&diff, line),
                (None, None) => anyhow::bail!("Either --new-line or --old-line is required"),
            };
            print_line(&mut out, resolved)?;
        }
        Command::Resolve { file, line, side } => {
            let resolved = runtime.block_on(resolve_file(&config, &file, line, side.into()))?;
            print_line(&mut out, resolved)?;
        }
        Command::Replay { events } => {
            let mut restorer =
                CursorRestorer::new(config.diff_source(), config.workspace_roots());
            let summary = match events {
                Some(path) => {
                    let file = std::fs::File::open(&path)
                        .context(format!("Failed to open: {}", path.display()))?;
                    runtime.block_on(replay::replay(
                        BufReader::new(file),
                        &mut restorer,
                        &mut out,
                    ))?
                }
                None => runtime.block_on(replay::replay(
                    io::stdin().lock(),
                    &mut restorer,
                    &mut out,
                ))?,
            };
            log::info!(
                "replayed {} events, restored {} of {} activations",
                summary.events,
                summary.restored,
                summary.activations
            );
        }
    }

    Ok(())
}

/// Remember `line` for `file`, then activate the requested side of its
/// staged-versus-working-tree diff
async fn resolve_file(
    config: &config::Config,
    file: &Path,
    line: usize,
    side: Side,
) -> Result<Option<usize>> {
    let file = file
        .canonicalize()
        .context(format!("Failed to resolve: {}", file.display()))?;
    let dir = file.parent().unwrap_or(Path::new("."));
    let program = config.git.program.as_str();

    let root = match get_repo_root(program, dir).await {
        Ok(root) => root,
        Err(GitError::NotARepo) => anyhow::bail!(
            "Not in a git repository: {}\n\
             \n\
             Usage: cursorghost map <old_file> <new_file> <line>",
            file.display()
        ),
        Err(err) => return Err(err).context("Failed to get git repository root"),
    };
    let relative = file
        .strip_prefix(&root)
        .context("File is outside its repository root")?;

    // Untracked files have nothing staged yet
    let old_text = get_staged_content(program, &root, relative)
        .await
        .context(format!("Failed to read staged content: {}", relative.display()))?
        .unwrap_or_default();
    let new_text =
        std::fs::read_to_string(&file).context(format!("Failed to read: {}", file.display()))?;

    let uri = FileKey::from_path(&file).to_string();
    let mut memory = CursorMemory::new();
    memory.record(FileKey::from_path(&file), line);
    let restorer =
        CursorRestorer::with_memory(memory, config.diff_source(), config.workspace_roots());

    let old_editor = EditorId::new("old");
    let new_editor = EditorId::new("new");
    let mut views = DiffViews::new();
    views.open(old_editor.clone(), new_editor.clone(), old_text, new_text);

    let editor = match side {
        Side::Old => old_editor,
        Side::New => new_editor,
    };
    let activated = EditorActivated {
        editor,
        uri,
        path: Some(file.clone()),
    };

    match restorer.on_editor_activated(&activated, &views).await {
        Ok(reposition) => Ok(Some(reposition.line)),
        Err(err) if err.is_failure() => Err(err).context("Failed to resolve line"),
        Err(err) => {
            log::debug!("{err}");
            Ok(None)
        }
    }
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .context(format!("Failed to read: {}", path.display())),
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
            Ok(text)
        }
    }
}

fn print_line(out: &mut impl Write, line: Option<usize>) -> Result<()> {
    match line {
        Some(line) => writeln!(out, "{line}")?,
        None => writeln!(out, "no match")?,
    }
    Ok(())
}
