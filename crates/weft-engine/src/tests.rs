//! Shared helpers for file-system tests.

use std::path::PathBuf;
use tempfile::TempDir;

pub fn create_test_templates_dir() -> TempDir {
    TempDir::new().expect("failed to create temp templates dir")
}

/// Write `content` to `relative` under `dir`, creating parent directories.
pub fn create_test_file(dir: &TempDir, relative: &str, content: &str) -> PathBuf {
    let path = dir.path().join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
}
