//! Positions in a command tree and the group-vs-leaf probe.
//!
//! A [`Position`] is a root directory plus the tokens consumed so far. At any
//! position exactly one of two things may exist: a group (the directory
//! `<root>/<a>/<b>`) or a leaf (the file `<root>/<a>/<b>.yml`). Both or
//! neither is an error.

use std::io;
use std::path::{Path, PathBuf};

use tracing::trace;

use crate::error::{ResolveError, Result};

/// File suffix identifying a leaf command.
pub const LEAF_EXTENSION: &str = "yml";

/// What a position resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node {
    Group,
    Leaf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    root: PathBuf,
    segments: Vec<String>,
}

impl Position {
    /// The top of a command tree.
    pub fn root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            segments: Vec::new(),
        }
    }

    /// The position one level below, named by `token`.
    pub fn child(&self, token: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(token.to_string());
        Self {
            root: self.root.clone(),
            segments,
        }
    }

    pub fn root_dir(&self) -> &Path {
        &self.root
    }

    /// Consumed tokens joined with `/`; empty at the root.
    pub fn relative(&self) -> String {
        self.segments.join("/")
    }

    /// Last consumed token, or `None` at the root.
    pub fn name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Directory a group at this position would occupy.
    pub fn dir_path(&self) -> PathBuf {
        let mut path = self.root.clone();
        path.extend(&self.segments);
        path
    }

    /// File a leaf at this position would occupy.
    pub fn leaf_path(&self) -> PathBuf {
        let mut raw = self.dir_path().into_os_string();
        raw.push(".");
        raw.push(LEAF_EXTENSION);
        PathBuf::from(raw)
    }

    /// Decides whether this position is a group or a leaf.
    ///
    /// The two existence checks run concurrently; only their conjunction
    /// matters.
    ///
    /// # Errors
    ///
    /// [`ResolveError::ActionNotFound`] when neither exists (or the last
    /// token cannot name a child), [`ResolveError::DuplicateAction`] when
    /// both do.
    pub async fn probe(&self) -> Result<Node> {
        if self.segments.iter().any(|s| !is_valid_segment(s)) {
            return Err(ResolveError::ActionNotFound {
                path: self.dir_path(),
            });
        }

        let dir_path = self.dir_path();
        let leaf_path = self.leaf_path();
        let (is_dir, is_file) = tokio::join!(is_dir(&dir_path), is_file(&leaf_path));
        let (is_dir, is_file) = (
            is_dir.map_err(|e| ResolveError::io(&dir_path, e))?,
            is_file.map_err(|e| ResolveError::io(&leaf_path, e))?,
        );
        trace!(position = %self.relative(), is_dir, is_file, "probed position");

        match (is_dir, is_file) {
            (true, false) => Ok(Node::Group),
            (false, true) => Ok(Node::Leaf),
            (true, true) => Err(ResolveError::DuplicateAction { path: dir_path }),
            (false, false) => Err(ResolveError::ActionNotFound { path: dir_path }),
        }
    }
}

/// A token can only name a direct child: no separators, no `.`/`..`.
pub fn is_valid_segment(token: &str) -> bool {
    !token.is_empty()
        && token != "."
        && token != ".."
        && !token.contains('/')
        && !token.contains('\\')
}

async fn is_dir(path: &Path) -> io::Result<bool> {
    match tokio::fs::metadata(path).await {
        Ok(meta) => Ok(meta.is_dir()),
        Err(e) if is_absent(&e) => Ok(false),
        Err(e) => Err(e),
    }
}

async fn is_file(path: &Path) -> io::Result<bool> {
    match tokio::fs::metadata(path).await {
        Ok(meta) => Ok(meta.is_file()),
        Err(e) if is_absent(&e) => Ok(false),
        Err(e) => Err(e),
    }
}

fn is_absent(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        let pos = Position::root("/srv/actions").child("db").child("migrate");
        assert_eq!(pos.relative(), "db/migrate");
        assert_eq!(pos.name(), Some("migrate"));
        assert_eq!(pos.depth(), 2);
        assert_eq!(pos.dir_path(), PathBuf::from("/srv/actions/db/migrate"));
        assert_eq!(pos.leaf_path(), PathBuf::from("/srv/actions/db/migrate.yml"));
    }

    #[test]
    fn test_root_has_no_name() {
        let pos = Position::root("/srv/actions");
        assert_eq!(pos.relative(), "");
        assert_eq!(pos.name(), None);
    }

    #[test]
    fn test_segment_validation() {
        assert!(is_valid_segment("deploy"));
        assert!(is_valid_segment("deploy-prod.v2"));
        assert!(!is_valid_segment(""));
        assert!(!is_valid_segment(".."));
        assert!(!is_valid_segment("a/b"));
    }

    #[tokio::test]
    async fn test_probe_detects_group_and_leaf() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("db")).unwrap();
        std::fs::write(dir.path().join("build.yml"), "args: []\n").unwrap();

        let root = Position::root(dir.path());
        assert_eq!(root.probe().await.unwrap(), Node::Group);
        assert_eq!(root.child("db").probe().await.unwrap(), Node::Group);
        assert_eq!(root.child("build").probe().await.unwrap(), Node::Leaf);
    }

    #[tokio::test]
    async fn test_probe_rejects_both_and_neither() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("test")).unwrap();
        std::fs::write(dir.path().join("test.yml"), "").unwrap();

        let root = Position::root(dir.path());
        assert!(matches!(
            root.child("test").probe().await,
            Err(ResolveError::DuplicateAction { .. })
        ));
        assert!(matches!(
            root.child("missing").probe().await,
            Err(ResolveError::ActionNotFound { .. })
        ));
        assert!(matches!(
            root.child("..").probe().await,
            Err(ResolveError::ActionNotFound { .. })
        ));
    }
}
