//! Mapping files to the workspace root that contains them

use crate::git;
use std::future::Future;
use std::path::{Path, PathBuf};

/// Resolves an absolute file path to its containing project root
pub trait RootResolver {
    fn root_for<'a>(
        &'a self,
        path: &'a Path,
    ) -> impl Future<Output = Option<PathBuf>> + Send + 'a;
}

/// Resolves roots by asking git for the toplevel of the file's directory
#[derive(Debug, Clone)]
pub struct GitRootResolver {
    program: String,
}

impl Default for GitRootResolver {
    fn default() -> Self {
        Self::new("git")
    }
}

impl GitRootResolver {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl RootResolver for GitRootResolver {
    fn root_for<'a>(
        &'a self,
        path: &'a Path,
    ) -> impl Future<Output = Option<PathBuf>> + Send + 'a {
        async move {
            let dir = if path.is_dir() { path } else { path.parent()? };
            match git::get_repo_root(&self.program, dir).await {
                Ok(root) => Some(root),
                Err(err) => {
                    log::debug!("no git root for {}: {err}", path.display());
                    None
                }
            }
        }
    }
}

/// A fixed set of known roots. The deepest root containing a path wins.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceRoots {
    roots: Vec<PathBuf>,
    git: Option<GitRootResolver>,
}

impl WorkspaceRoots {
    pub fn new(roots: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            roots: roots.into_iter().collect(),
            git: None,
        }
    }

    /// Ask `git` when no configured root contains the path
    pub fn or_git(mut self, git: GitRootResolver) -> Self {
        self.git = Some(git);
        self
    }
}

impl RootResolver for WorkspaceRoots {
    fn root_for<'a>(
        &'a self,
        path: &'a Path,
    ) -> impl Future<Output = Option<PathBuf>> + Send + 'a {
        async move {
            let configured = self
                .roots
                .iter()
                .filter(|root| path.starts_with(root))
                .max_by_key(|root| root.components().count())
                .cloned();

            match (configured, &self.git) {
                (Some(root), _) => Some(root),
                (None, Some(git)) => git.root_for(path).await,
                (None, None) => None,
            }
        }
    }
}

/// The root containing `path` and `path` relative to that root.
///
/// Git reports roots with symlinks resolved while editors report paths as
/// opened, so the prefix is stripped from whichever spellings agree.
pub async fn relative_path<R: RootResolver>(
    resolver: &R,
    path: &Path,
) -> Option<(PathBuf, PathBuf)> {
    let real_path = tokio::fs::canonicalize(path).await.ok();
    let root = match resolver.root_for(path).await {
        Some(root) => root,
        None => resolver.root_for(real_path.as_deref()?).await?,
    };
    let real_root = tokio::fs::canonicalize(&root).await.ok();

    let paths = [Some(path), real_path.as_deref()];
    let roots = [Some(root.as_path()), real_root.as_deref()];
    for candidate in paths.into_iter().flatten() {
        for root in roots.into_iter().flatten() {
            if let Ok(relative) = candidate.strip_prefix(root) {
                return Some((root.to_path_buf(), relative.to_path_buf()));
            }
        }
    }

    log::debug!(
        "{} does not sit under its root {}",
        path.display(),
        root.display()
    );
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_deepest_root_wins() {
        let roots = WorkspaceRoots::new([
            PathBuf::from("/work"),
            PathBuf::from("/work/vendor/lib"),
        ]);

        assert_eq!(
            roots.root_for(Path::new("/work/vendor/lib/src/a.rs")).await,
            Some(PathBuf::from("/work/vendor/lib"))
        );
        assert_eq!(
            roots.root_for(Path::new("/work/src/main.rs")).await,
            Some(PathBuf::from("/work"))
        );
    }

    #[tokio::test]
    async fn test_path_outside_roots() {
        let roots = WorkspaceRoots::new([PathBuf::from("/work")]);
        assert_eq!(roots.root_for(Path::new("/elsewhere/a.rs")).await, None);
        // Component-wise prefix, not string prefix
        assert_eq!(roots.root_for(Path::new("/workshop/a.rs")).await, None);
    }

    #[tokio::test]
    async fn test_relative_path() {
        let roots = WorkspaceRoots::new([PathBuf::from("/work")]);
        assert_eq!(
            relative_path(&roots, Path::new("/work/src/lib.rs")).await,
            Some((PathBuf::from("/work"), PathBuf::from("src/lib.rs")))
        );
        assert_eq!(relative_path(&roots, Path::new("/elsewhere/a.rs")).await, None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_relative_path_through_symlinked_directory() {
        let dir = tempfile::tempdir().unwrap();
        let real = dir.path().join("real");
        std::fs::create_dir_all(real.join("src")).unwrap();
        std::fs::write(real.join("src").join("lib.rs"), "fn main() {}\n").unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&real, &link).unwrap();

        // Root spelled physically, file spelled through the link
        let roots = WorkspaceRoots::new([real.canonicalize().unwrap()]);
        let (root, relative) = relative_path(&roots, &link.join("src").join("lib.rs"))
            .await
            .unwrap();
        assert_eq!(root, real.canonicalize().unwrap());
        assert_eq!(relative, PathBuf::from("src/lib.rs"));
    }

    #[tokio::test]
    async fn test_missing_git_program_finds_no_root() {
        let roots =
            WorkspaceRoots::default().or_git(GitRootResolver::new("cursorghost-no-such-git"));
        assert_eq!(roots.root_for(&std::env::temp_dir()).await, None);
    }
}
