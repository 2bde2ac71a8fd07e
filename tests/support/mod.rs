#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

/// A throwaway storage directory for one test.
pub struct TestStore {
    dir: TempDir,
}

impl TestStore {
    pub fn new() -> std::io::Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn write_file(&self, name: &str, contents: &str) -> std::io::Result<PathBuf> {
        let path = self.file(name);
        fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn read_file(&self, name: &str) -> std::io::Result<String> {
        fs::read_to_string(self.file(name))
    }

    /// `taskm` pointed at this store, shutting down after the operation.
    pub fn cmd(&self) -> Command {
        let mut cmd = taskm_cmd();
        cmd.env("TASKM_STORAGE_DIR", self.path())
            .env("TASKM_ONCE", "true");
        cmd
    }
}

/// `taskm` with a clean environment for the variables it reads.
pub fn taskm_cmd() -> Command {
    let mut cmd = Command::cargo_bin("taskm").expect("binary");
    cmd.env_remove("TASKM_STORAGE_DIR")
        .env_remove("TASKM_CONFIG")
        .env_remove("TASKM_ONCE")
        .env_remove("RUST_LOG");
    cmd
}
