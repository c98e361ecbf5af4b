//! Fixtures for sift-config unit tests.

use std::{
    fmt::Write,
    fs,
    path::{Path, PathBuf},
};

use tempfile::TempDir;

use crate::discovery::CONFIG_FILENAME;

/// A throwaway directory tree holding `.sift.toml` files.
pub struct TestDir {
    /// Removed on drop.
    root: TempDir,
}

impl TestDir {
    /// Creates an empty fixture tree.
    pub fn new() -> Self {
        Self {
            root: tempfile::tempdir().unwrap(),
        }
    }

    /// Root of the fixture tree.
    pub fn path(&self) -> &Path {
        self.root.path()
    }

    /// Creates `rel` (and its parents) under the fixture root.
    pub fn mkdir(&self, rel: &str) -> PathBuf {
        let dir = self.root.path().join(rel);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// Writes `content` to `<rel>/.sift.toml`. An empty `rel` means the fixture root.
    pub fn config(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.mkdir(rel).join(CONFIG_FILENAME);
        fs::write(&path, content).unwrap();
        path
    }

    /// Writes `<rel>/.sift.toml` holding a `[fields]` table, marked as root when asked.
    pub fn fields(&self, rel: &str, root: bool, fields: &[(&str, u8)]) -> PathBuf {
        let mut content = format!("root = {root}\n\n[fields]\n");
        for (name, bit) in fields {
            writeln!(content, "{name} = {bit}").unwrap();
        }
        self.config(rel, &content)
    }
}
