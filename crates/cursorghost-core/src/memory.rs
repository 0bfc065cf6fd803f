//! Remembered cursor lines per file

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use url::Url;

/// Normalized file identity.
///
/// A file opened as `file:///repo/a.rs` and the same file opened from git as
/// `git:/repo/a.rs?{...}` share one key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileKey(String);

impl FileKey {
    pub fn from_uri(uri: &str) -> Self {
        let Ok(parsed) = Url::parse(uri) else {
            return Self(uri.to_string());
        };
        match parsed.scheme() {
            "file" => match parsed.to_file_path() {
                Ok(path) => Self::from_path(&path),
                Err(()) => Self(uri.to_string()),
            },
            "git" => Self(decode_path(parsed.path())),
            _ => Self(uri.to_string()),
        }
    }

    pub fn from_path(path: &Path) -> Self {
        Self(path.to_string_lossy().into_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn decode_path(encoded: &str) -> String {
    Url::parse(&format!("file://{encoded}"))
        .ok()
        .and_then(|url| url.to_file_path().ok())
        .map(|path| path.to_string_lossy().into_owned())
        .unwrap_or_else(|| encoded.to_string())
}

/// Last observed zero-based cursor line for each file.
///
/// Entries never expire; a line may be stale once its file has changed.
#[derive(Debug, Clone, Default)]
pub struct CursorMemory {
    lines: FxHashMap<FileKey, usize>,
}

impl CursorMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, key: FileKey, line: usize) {
        log::debug!("saved line {line} for {key}");
        self.lines.insert(key, line);
    }

    pub fn get(&self, key: &FileKey) -> Option<usize> {
        self.lines.get(key).copied()
    }

    pub fn forget(&mut self, key: &FileKey) -> Option<usize> {
        self.lines.remove(key)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_and_git_uris_share_a_key() {
        let file = FileKey::from_uri("file:///repo/src/main.rs");
        let git = FileKey::from_uri("git:/repo/src/main.rs?%7B%22ref%22%3A%22HEAD%22%7D");
        assert_eq!(file, git);
        assert_eq!(file.as_str(), "/repo/src/main.rs");
    }

    #[test]
    fn test_percent_encoded_paths_are_decoded() {
        let file = FileKey::from_uri("file:///repo/my%20notes.md");
        let git = FileKey::from_uri("git:/repo/my%20notes.md");
        assert_eq!(file.as_str(), "/repo/my notes.md");
        assert_eq!(git, file);
    }

    #[test]
    fn test_other_schemes_keep_the_full_uri() {
        let key = FileKey::from_uri("untitled:Untitled-1");
        assert_eq!(key.as_str(), "untitled:Untitled-1");

        let unparsable = FileKey::from_uri("not a uri");
        assert_eq!(unparsable.as_str(), "not a uri");
    }

    #[test]
    fn test_memory_reads_do_not_remove() {
        let mut memory = CursorMemory::new();
        let key = FileKey::from_uri("file:///repo/a.rs");

        memory.record(key.clone(), 4);
        assert_eq!(memory.get(&key), Some(4));
        assert_eq!(memory.get(&key), Some(4));

        memory.record(key.clone(), 9);
        assert_eq!(memory.get(&key), Some(9));
        assert_eq!(memory.len(), 1);
    }

    #[test]
    fn test_memories_are_isolated() {
        let mut first = CursorMemory::new();
        let second = CursorMemory::new();
        let key = FileKey::from_uri("file:///repo/a.rs");

        first.record(key.clone(), 1);
        assert_eq!(second.get(&key), None);

        assert_eq!(first.forget(&key), Some(1));
        assert!(first.is_empty());
    }
}
