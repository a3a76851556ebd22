//! In-memory mock filesystem for exercising the procfs source without a real `/proc`.

use crate::collector::traits::FileSystem;
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Dir,
    File(String),
}

/// In-memory filesystem for testing.
///
/// Entries live in one ordered map, so directory listings come back sorted.
/// Paths marked with [`MockFs::deny`] fail with `PermissionDenied`, which
/// simulates processes owned by other users.
#[derive(Debug, Clone, Default)]
pub struct MockFs {
    nodes: BTreeMap<PathBuf, Node>,
    denied: BTreeSet<PathBuf>,
}

impl MockFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes a file, creating any missing parent directories.
    pub fn add_file(&mut self, path: impl AsRef<Path>, content: impl Into<String>) {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            self.add_dir(parent);
        }
        self.nodes
            .insert(path.to_path_buf(), Node::File(content.into()));
    }

    /// Creates a directory and its ancestors.
    pub fn add_dir(&mut self, path: impl AsRef<Path>) {
        for ancestor in path.as_ref().ancestors() {
            if ancestor.as_os_str().is_empty() {
                continue;
            }
            self.nodes
                .entry(ancestor.to_path_buf())
                .or_insert(Node::Dir);
        }
    }

    /// Removes a file or a whole subtree.
    ///
    /// Used to simulate a process exiting between enumeration and reading.
    pub fn remove(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        self.nodes.retain(|p, _| !p.starts_with(path));
    }

    /// Makes reads of `path` (or anything below it) fail with `PermissionDenied`.
    pub fn deny(&mut self, path: impl AsRef<Path>) {
        self.denied.insert(path.as_ref().to_path_buf());
    }

    /// Registers `/proc/<pid>` with its `stat` and `comm` files.
    pub fn add_process(&mut self, pid: u32, comm: &str, stat: &str) {
        let dir = Path::new("/proc").join(pid.to_string());
        self.add_file(dir.join("stat"), stat);
        self.add_file(dir.join("comm"), format!("{}\n", comm));
    }

    pub fn exists(&self, path: impl AsRef<Path>) -> bool {
        self.nodes.contains_key(path.as_ref())
    }

    fn is_denied(&self, path: &Path) -> bool {
        self.denied.iter().any(|denied| path.starts_with(denied))
    }
}

fn not_found(what: &str, path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("no such {}: {}", what, path.display()),
    )
}

impl FileSystem for MockFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        if self.is_denied(path) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("access to {} denied", path.display()),
            ));
        }
        match self.nodes.get(path) {
            Some(Node::File(content)) => Ok(content.clone()),
            Some(Node::Dir) => Err(io::Error::other(format!(
                "{} is a directory",
                path.display()
            ))),
            None => Err(not_found("file", path)),
        }
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        if self.nodes.get(path) != Some(&Node::Dir) {
            return Err(not_found("directory", path));
        }
        Ok(self
            .nodes
            .keys()
            .filter(|p| p.parent() == Some(path))
            .cloned()
            .collect())
    }
}
