//! Configuration file support for cursorghost
//!
//! Config file location: `~/.config/cursorghost/config.toml` (XDG_CONFIG_HOME)
//!
//! Example config:
//! ```toml
//! [git]
//! program = "git"
//! context_lines = 1000000
//!
//! [workspace]
//! roots = ["/home/me/src/project"]
//!
//! [log]
//! level = "info"
//! ```

use cursorghost_core::{GitDiffSource, GitRootResolver, WorkspaceRoots, FULL_FILE_CONTEXT};
use serde::Deserialize;
use std::path::PathBuf;

/// How unified diffs are fetched
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GitConfig {
    /// Program invoked for every git command
    pub program: String,
    /// Context width passed as `--unified`; must cover the largest file
    pub context_lines: u32,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            program: "git".to_string(),
            context_lines: FULL_FILE_CONTEXT,
        }
    }
}

/// Known project roots
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Roots checked before asking git; empty means git only
    pub roots: Vec<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// env_logger filter used when RUST_LOG is unset
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

/// Root configuration
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub git: GitConfig,
    pub workspace: WorkspaceConfig,
    pub log: LogConfig,
}

impl Config {
    /// Get all possible config file paths in priority order
    fn config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
            paths.push(PathBuf::from(xdg).join("cursorghost").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".config").join("cursorghost").join("config.toml"));
        }

        // ~/Library/Application Support on macOS
        if let Some(config_dir) = dirs::config_dir() {
            let platform_path = config_dir.join("cursorghost").join("config.toml");
            if !paths.contains(&platform_path) {
                paths.push(platform_path);
            }
        }

        paths
    }

    /// Get the first existing config file path
    pub fn config_path() -> Option<PathBuf> {
        Self::config_paths().into_iter().find(|p| p.exists())
    }

    /// Load config from an explicit path, or the XDG config path.
    /// Returns default config if the file doesn't exist or can't be parsed
    pub fn load(explicit: Option<&PathBuf>) -> Self {
        explicit
            .cloned()
            .or_else(Self::config_path)
            .and_then(|path| std::fs::read_to_string(&path).ok())
            .and_then(|content| Self::parse(&content))
            .unwrap_or_default()
    }

    fn parse(content: &str) -> Option<Self> {
        toml::from_str(content)
            .map_err(|e| {
                // The logger is not installed yet
                eprintln!("Warning: Failed to parse config: {}", e);
                e
            })
            .ok()
    }

    pub fn diff_source(&self) -> GitDiffSource {
        GitDiffSource::new()
            .with_program(self.git.program.clone())
            .with_context_lines(self.git.context_lines)
    }

    /// Configured roots, falling back to git discovery
    pub fn workspace_roots(&self) -> WorkspaceRoots {
        WorkspaceRoots::new(self.workspace.roots.iter().cloned())
            .or_git(GitRootResolver::new(self.git.program.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.git.program, "git");
        assert_eq!(config.git.context_lines, FULL_FILE_CONTEXT);
        assert!(config.workspace.roots.is_empty());
        assert_eq!(config.log.level, "warn");
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let config = Config::parse("[workspace]\nroots = [\"/src/app\"]\n").unwrap();
        assert_eq!(config.workspace.roots, vec![PathBuf::from("/src/app")]);
        assert_eq!(config.git.context_lines, FULL_FILE_CONTEXT);
    }

    #[test]
    fn test_git_section() {
        let config =
            Config::parse("[git]\nprogram = \"/usr/bin/git\"\ncontext_lines = 50000\n").unwrap();
        let source = config.diff_source();
        assert_eq!(source.context_lines(), 50_000);
        assert_eq!(source.program(), "/usr/bin/git");
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        assert!(Config::parse("[git\nprogram = ").is_none());
    }
}
