//! Testing utilities for taskspace workspace
//!
//! Shared fixtures: throwaway cache roots, back-dated directories, and an
//! opt-in tracing subscriber.

#![allow(missing_docs)]

use filetime::FileTime;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use taskspace_core::{ManagerRegistry, TmpConfig, TmpManager};
use tempfile::TempDir;

/// Temporary cache root, deleted on drop
pub struct TestSpace {
    root: TempDir,
}

impl TestSpace {
    pub fn new() -> Self {
        Self {
            root: TempDir::new().unwrap(),
        }
    }

    /// Base directory handed to managers (`<tempdir>/tmp_test`, created)
    pub fn base_dir(&self) -> PathBuf {
        let base = self.root.path().join("tmp_test");
        fs::create_dir_all(&base).unwrap();
        base
    }

    /// Short-lived configuration: 0.001h max age, 5 project dirs
    pub fn config(&self) -> TmpConfig {
        TmpConfig::new()
            .with_base_dir(self.base_dir())
            .with_max_age_hours(0.001)
            .with_max_project_dirs(5)
    }

    /// Configuration that never expires by age
    pub fn capacity_config(&self, max_project_dirs: usize) -> TmpConfig {
        TmpConfig::new()
            .with_base_dir(self.base_dir())
            .with_max_age_hours(24.0)
            .with_max_project_dirs(max_project_dirs)
    }

    pub fn manager(&self, project_name: &str) -> TmpManager {
        TmpManager::new(project_name, self.config()).unwrap()
    }

    pub fn registry(&self) -> ManagerRegistry {
        ManagerRegistry::new(self.config())
    }

    /// Create `base_dir/name` with modification time `age` in the past
    pub fn project_dir_aged(&self, name: &str, age: Duration) -> PathBuf {
        let dir = self.base_dir().join(name);
        fs::create_dir_all(&dir).unwrap();
        set_age(&dir, age);
        dir
    }

    /// Create `base_dir/name` with modification time `mtime`
    pub fn project_dir_modified_at(&self, name: &str, mtime: SystemTime) -> PathBuf {
        let dir = self.base_dir().join(name);
        fs::create_dir_all(&dir).unwrap();
        set_mtime(&dir, mtime);
        dir
    }

    /// Names of the directories currently under the base directory, sorted
    pub fn project_dir_names(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.base_dir())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.path().is_dir())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

impl Default for TestSpace {
    fn default() -> Self {
        Self::new()
    }
}

/// Set the modification time of `path` to `age` before now
pub fn set_age(path: &Path, age: Duration) {
    set_mtime(path, SystemTime::now() - age);
}

/// Set the modification time of `path`
pub fn set_mtime(path: &Path, mtime: SystemTime) {
    filetime::set_file_mtime(path, FileTime::from_system_time(mtime)).unwrap();
}

/// Install a `RUST_LOG`-filtered fmt subscriber; repeated calls are no-ops
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
