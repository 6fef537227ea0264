#![allow(dead_code)]

use std::path::{Path, PathBuf};

use sandbox_fs_tools::{Context, SandboxConfig};

#[cfg(unix)]
pub mod unix_helpers;

pub fn test_context(root: &Path) -> Context {
    test_context_with_roots(&[root])
}

pub fn test_context_with_roots(roots: &[&Path]) -> Context {
    Context::new(SandboxConfig::with_allowed_directories(roots.iter().copied())).expect("ctx")
}

/// Write `content` at `root/relative`, creating parents, and return the full path.
pub fn put(root: &Path, relative: &str, content: &str) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parents");
    }
    std::fs::write(&path, content).expect("write fixture");
    path
}

pub fn read(path: &Path) -> String {
    std::fs::read_to_string(path).expect("read")
}

/// Two sibling temp directories: an allowed root and a directory outside it.
pub fn sandbox_and_outside() -> (tempfile::TempDir, PathBuf, PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path().join("sandbox");
    let outside = dir.path().join("outside");
    std::fs::create_dir_all(&root).expect("mkdir root");
    std::fs::create_dir_all(&outside).expect("mkdir outside");
    (dir, root, outside)
}
