//! Git integration: repository discovery, file contents and unified diffs

use std::future::Future;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::process::Command;

/// Context width that keeps a whole file inside a single hunk
pub const FULL_FILE_CONTEXT: u32 = 1_000_000;

#[derive(Error, Debug)]
pub enum GitError {
    #[error("Not a git repository")]
    NotARepo,
    #[error("Git command failed: {0}")]
    CommandFailed(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Get the root of the git repository containing `path`.
///
/// Git reports the toplevel with symlinks resolved.
pub async fn get_repo_root(program: &str, path: &Path) -> Result<PathBuf, GitError> {
    let output = Command::new(program)
        .arg("-C")
        .arg(path)
        .arg("rev-parse")
        .arg("--show-toplevel")
        .output()
        .await?;

    if !output.status.success() {
        return Err(GitError::NotARepo);
    }

    let root = String::from_utf8_lossy(&output.stdout).trim().to_string();
    Ok(PathBuf::from(root))
}

/// Get the staged content of a file, `None` when the index has no entry for it
pub async fn get_staged_content(
    program: &str,
    repo_path: &Path,
    file: &Path,
) -> Result<Option<String>, GitError> {
    let output = Command::new(program)
        .arg("-C")
        .arg(repo_path)
        .arg("show")
        .arg(format!(":{}", file.display()))
        .output()
        .await?;

    if output.status.success() {
        return Ok(Some(String::from_utf8_lossy(&output.stdout).to_string()));
    }

    let listed = Command::new(program)
        .arg("-C")
        .arg(repo_path)
        .arg("ls-files")
        .arg("--cached")
        .arg("--")
        .arg(file)
        .output()
        .await?;

    if listed.status.success() && listed.stdout.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    Err(GitError::CommandFailed(
        String::from_utf8_lossy(&output.stderr).to_string(),
    ))
}

/// Source of unified diff text for one file
pub trait DiffSource {
    /// Unified diff of `file` (relative to `repo_root`) against its working tree state
    fn unified_diff<'a>(
        &'a self,
        repo_root: &'a Path,
        file: &'a Path,
    ) -> impl Future<Output = Result<String, GitError>> + Send + 'a;
}

/// Runs `git diff` with enough context to cover the whole file
#[derive(Debug, Clone)]
pub struct GitDiffSource {
    program: String,
    context_lines: u32,
}

impl Default for GitDiffSource {
    fn default() -> Self {
        Self {
            program: "git".to_string(),
            context_lines: FULL_FILE_CONTEXT,
        }
    }
}

impl GitDiffSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_context_lines(mut self, context_lines: u32) -> Self {
        self.context_lines = context_lines;
        self
    }

    pub fn context_lines(&self) -> u32 {
        self.context_lines
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl DiffSource for GitDiffSource {
    fn unified_diff<'a>(
        &'a self,
        repo_root: &'a Path,
        file: &'a Path,
    ) -> impl Future<Output = Result<String, GitError>> + Send + 'a {
        async move {
            let output = Command::new(&self.program)
                .current_dir(repo_root)
                .arg("diff")
                .arg("--no-color")
                .arg("--no-ext-diff")
                .arg(format!("--unified={}", self.context_lines))
                .arg("--")
                .arg(file)
                .output()
                .await?;

            if !output.status.success() {
                return Err(GitError::CommandFailed(
                    String::from_utf8_lossy(&output.stderr).to_string(),
                ));
            }

            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        }
    }
}
