//! Test utilities for Vigil crates.

use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Creates a temporary directory that is cleaned up on drop.
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Creates a temporary file with given content.
pub fn temp_file(content: &str) -> (TempDir, PathBuf) {
    let dir = temp_dir();
    let path = write_file(dir.path(), "test_file", content);
    (dir, path)
}

/// Writes `content` to `dir/name`, creating parent directories.
pub fn write_file(dir: &Path, name: &str, content: impl AsRef<[u8]>) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create parent dir");
    }
    std::fs::write(&path, content).expect("Failed to write temp file");
    path
}

/// Replaces the first occurrence of `from` in line `index` of a text file.
///
/// Panics if the line or the pattern is absent, so tamper tests cannot
/// silently pass without tampering.
pub fn tamper_line(path: &Path, index: usize, from: &str, to: &str) {
    let text = std::fs::read_to_string(path).expect("Failed to read file");
    let mut lines: Vec<String> = text.lines().map(str::to_string).collect();
    let line = lines.get_mut(index).expect("line index out of range");
    assert!(line.contains(from), "pattern {from:?} not found in line {index}");
    *line = line.replacen(from, to, 1);
    let mut out = lines.join("\n");
    out.push('\n');
    std::fs::write(path, out).expect("Failed to write file");
}

/// Assert that a Result is Ok and return the value.
#[macro_export]
macro_rules! assert_ok {
    ($expr:expr) => {
        match $expr {
            Ok(v) => v,
            Err(e) => panic!("Expected Ok, got Err: {:?}", e),
        }
    };
}

/// Assert that a Result is Err and return the error.
#[macro_export]
macro_rules! assert_err {
    ($expr:expr) => {
        match $expr {
            Ok(v) => panic!("Expected Err, got Ok: {:?}", v),
            Err(e) => e,
        }
    };
}
