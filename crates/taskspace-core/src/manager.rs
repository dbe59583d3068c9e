//! Per-project temporary directory manager
//!
//! Layout under the configured base directory:
//!
//! ```text
//! <base_dir>/
//! ├── <project_hash>/
//! │   ├── <task_id>/
//! │   │   ├── context.json
//! │   │   ├── <subtask_id>/
//! │   │   │   └── <filename>
//! │   │   └── <another_subtask>/
//! │   └── <another_task>/
//! └── <another_project_hash>/
//! ```

use crate::config::TmpConfig;
use crate::error::{TmpError, TmpResult};
use crate::hash::ProjectHash;
use crate::ident::IdentifierKind;
use crate::reclaim::{remove_tree, PruneGate, Reclaimer, SweepReport};
use std::fs;
use std::path::{Path, PathBuf};

/// Temporary directory manager for one project
///
/// Cheap to share behind an `Arc`; every method takes `&self`.
#[derive(Debug)]
pub struct TmpManager {
    project_name: String,
    project_hash: ProjectHash,
    project_dir: PathBuf,
    config: TmpConfig,
    reclaimer: Reclaimer,
    gate: PruneGate,
}

impl TmpManager {
    /// Create manager and its project directory
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or the project
    /// directory cannot be created
    pub fn new(project_name: impl Into<String>, config: TmpConfig) -> TmpResult<Self> {
        config.validate()?;
        let project_name = project_name.into();
        let project_hash = ProjectHash::of(&project_name);
        let project_dir = config.base_dir.join(project_hash.to_hex());

        create_dir(&project_dir)?;
        tracing::debug!(
            project = %project_name,
            hash = %project_hash,
            "Created tmp manager at {}",
            project_dir.display()
        );

        Ok(Self {
            reclaimer: Reclaimer::from_config(&config),
            gate: PruneGate::new(config.prune_interval()),
            project_name,
            project_hash,
            project_dir,
            config,
        })
    }

    /// Project name this manager was created for
    #[inline]
    #[must_use]
    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    /// Hash naming the project directory
    #[inline]
    #[must_use]
    pub fn project_hash(&self) -> ProjectHash {
        self.project_hash
    }

    /// Project directory (may have been reclaimed since construction)
    #[inline]
    #[must_use]
    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    /// Configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &TmpConfig {
        &self.config
    }

    /// Recreate the project directory if it was removed
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created
    pub fn ensure_project_dir(&self) -> TmpResult<&Path> {
        create_dir(&self.project_dir)?;
        Ok(&self.project_dir)
    }

    /// Directory for a task, created if missing
    ///
    /// # Errors
    /// Returns an error if `task_id` is rejected or creation fails
    pub fn task_dir(&self, task_id: &str) -> TmpResult<PathBuf> {
        let dir = self.task_path(task_id)?;
        create_dir(&dir)?;
        Ok(dir)
    }

    /// Directory for a subtask, created (with its task directory) if missing
    ///
    /// # Errors
    /// Returns an error if an identifier is rejected or creation fails
    pub fn subtask_dir(&self, task_id: &str, subtask_id: &str) -> TmpResult<PathBuf> {
        self.check(IdentifierKind::Subtask, subtask_id)?;
        let dir = self.task_dir(task_id)?.join(subtask_id);
        create_dir(&dir)?;
        Ok(dir)
    }

    /// Remove a task directory and everything beneath it
    ///
    /// Returns `false` if there was nothing to remove.
    ///
    /// # Errors
    /// Returns an error if `task_id` is rejected or removal fails
    pub fn cleanup_task(&self, task_id: &str) -> TmpResult<bool> {
        let dir = self.task_path(task_id)?;
        let removed = remove_tree(&dir).map_err(|e| TmpError::io_error(&dir, e))?;
        if removed {
            tracing::info!("Cleaned up task directory: {}", dir.display());
        }
        Ok(removed)
    }

    /// Remove a subtask directory, leaving its task directory in place
    ///
    /// Returns `false` if there was nothing to remove.
    ///
    /// # Errors
    /// Returns an error if an identifier is rejected or removal fails
    pub fn cleanup_subtask(&self, task_id: &str, subtask_id: &str) -> TmpResult<bool> {
        let dir = self.subtask_path(task_id, subtask_id)?;
        let removed = remove_tree(&dir).map_err(|e| TmpError::io_error(&dir, e))?;
        if removed {
            tracing::info!("Cleaned up subtask directory: {}", dir.display());
        }
        Ok(removed)
    }

    /// Sweep the base directory unless this manager swept recently
    ///
    /// Returns `None` when skipped by the prune interval.
    ///
    /// # Errors
    /// Returns an error only if the base directory cannot be listed
    pub fn prune_old_directories(&self) -> TmpResult<Option<SweepReport>> {
        self.gate.run(|| self.reclaimer.sweep()).transpose()
    }

    pub(crate) fn task_path(&self, task_id: &str) -> TmpResult<PathBuf> {
        self.check(IdentifierKind::Task, task_id)?;
        Ok(self.project_dir.join(task_id))
    }

    pub(crate) fn subtask_path(&self, task_id: &str, subtask_id: &str) -> TmpResult<PathBuf> {
        self.check(IdentifierKind::Subtask, subtask_id)?;
        Ok(self.task_path(task_id)?.join(subtask_id))
    }

    pub(crate) fn check(&self, kind: IdentifierKind, value: &str) -> TmpResult<()> {
        self.config.identifiers.check(kind, value)
    }
}

fn create_dir(dir: &Path) -> TmpResult<()> {
    fs::create_dir_all(dir).map_err(|e| TmpError::io_error(dir, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ident::IdentifierPolicy;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn test_config(tmp: &TempDir) -> TmpConfig {
        TmpConfig::new()
            .with_base_dir(tmp.path().join("tmp_test"))
            .with_max_age_hours(0.001)
            .with_max_project_dirs(5)
    }

    #[test]
    fn new_creates_base_and_project_dir() {
        let tmp = TempDir::new().unwrap();
        for name in [
            "simple_project",
            "project-with-dashes",
            "project_with_underscores",
            "ProjectWithCamelCase",
            "project with spaces",
        ] {
            let manager = TmpManager::new(name, test_config(&tmp)).unwrap();
            assert_eq!(manager.project_name(), name);
            assert!(manager.project_dir().is_dir());
            assert_eq!(manager.project_hash().to_hex().len(), 16);
            assert_eq!(
                manager.project_dir().file_name().unwrap().to_str().unwrap(),
                manager.project_hash().to_hex()
            );
        }
    }

    #[test]
    fn new_rejects_invalid_config() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(&tmp).with_max_age_hours(-1.0);
        assert!(matches!(TmpManager::new("p", config), Err(TmpError::Config(_))));
    }

    #[test]
    fn independent_managers_share_directory() {
        let tmp = TempDir::new().unwrap();
        let m1 = TmpManager::new("shared", test_config(&tmp)).unwrap();
        let m2 = TmpManager::new("shared", test_config(&tmp)).unwrap();
        assert_eq!(m1.project_hash(), m2.project_hash());
        assert_eq!(m1.project_dir(), m2.project_dir());
    }

    #[test]
    fn task_and_subtask_hierarchy() {
        let tmp = TempDir::new().unwrap();
        let manager = TmpManager::new("test_project", test_config(&tmp)).unwrap();

        for (task_id, subtask_id) in [
            ("task_123", "subtask_456"),
            ("simple_task", "simple_subtask"),
            ("task-with-dashes", "subtask-with-dashes"),
        ] {
            let task_dir = manager.task_dir(task_id).unwrap();
            assert!(task_dir.is_dir());
            assert_eq!(task_dir.file_name().unwrap(), task_id);
            assert_eq!(task_dir.parent().unwrap(), manager.project_dir());

            let subtask_dir = manager.subtask_dir(task_id, subtask_id).unwrap();
            assert!(subtask_dir.is_dir());
            assert_eq!(subtask_dir.file_name().unwrap(), subtask_id);
            assert_eq!(subtask_dir.parent().unwrap(), task_dir);
        }
    }

    #[test]
    fn task_dir_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let manager = TmpManager::new("p", test_config(&tmp)).unwrap();
        let first = manager.task_dir("t").unwrap();
        let second = manager.task_dir("t").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn subtask_dir_provisions_task_dir() {
        let tmp = TempDir::new().unwrap();
        let manager = TmpManager::new("p", test_config(&tmp)).unwrap();
        let subtask_dir = manager.subtask_dir("fresh_task", "s").unwrap();
        assert!(manager.project_dir().join("fresh_task").is_dir());
        assert!(subtask_dir.is_dir());
    }

    #[test]
    fn task_dir_recreates_reclaimed_project_dir() {
        let tmp = TempDir::new().unwrap();
        let manager = TmpManager::new("p", test_config(&tmp)).unwrap();
        fs::remove_dir_all(manager.project_dir()).unwrap();

        let task_dir = manager.task_dir("t").unwrap();
        assert!(task_dir.is_dir());
    }

    #[test]
    fn ensure_project_dir_recreates() {
        let tmp = TempDir::new().unwrap();
        let manager = TmpManager::new("p", test_config(&tmp)).unwrap();
        fs::remove_dir_all(manager.project_dir()).unwrap();
        assert!(manager.ensure_project_dir().unwrap().is_dir());
    }

    #[test]
    fn cleanup_subtask_keeps_task() {
        let tmp = TempDir::new().unwrap();
        let manager = TmpManager::new("p", test_config(&tmp)).unwrap();
        let task_dir = manager.task_dir("test_task").unwrap();
        let subtask_dir = manager.subtask_dir("test_task", "test_subtask").unwrap();
        fs::write(task_dir.join("task_file.txt"), "content").unwrap();
        fs::write(subtask_dir.join("subtask_file.txt"), "content").unwrap();

        assert!(manager.cleanup_subtask("test_task", "test_subtask").unwrap());
        assert!(!subtask_dir.exists());
        assert!(task_dir.join("task_file.txt").exists());

        assert!(manager.cleanup_task("test_task").unwrap());
        assert!(!task_dir.exists());
    }

    #[test]
    fn cleanup_missing_is_not_an_error() {
        let tmp = TempDir::new().unwrap();
        let manager = TmpManager::new("p", test_config(&tmp)).unwrap();
        assert!(!manager.cleanup_task("never").unwrap());
        assert!(!manager.cleanup_subtask("never", "ever").unwrap());
        assert!(!manager.project_dir().join("never").exists());
    }

    #[test]
    fn strict_policy_rejects_traversal() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(&tmp).with_identifiers(IdentifierPolicy::Strict);
        let manager = TmpManager::new("p", config).unwrap();

        assert!(matches!(
            manager.task_dir(".."),
            Err(TmpError::InvalidIdentifier { kind: IdentifierKind::Task, .. })
        ));
        assert!(matches!(
            manager.subtask_dir("ok", "a/b"),
            Err(TmpError::InvalidIdentifier { kind: IdentifierKind::Subtask, .. })
        ));
        assert!(manager.cleanup_task("").is_err());
        assert!(manager.project_dir().is_dir());
    }

    #[test]
    fn prune_is_rate_limited() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(&tmp).with_max_age_hours(24.0);
        let manager = TmpManager::new("p", config).unwrap();

        assert!(manager.prune_old_directories().unwrap().is_some());
        assert!(manager.prune_old_directories().unwrap().is_none());
    }

    #[test]
    fn manager_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>(_: &T) {}
        let tmp = TempDir::new().unwrap();
        let manager = Arc::new(TmpManager::new("p", test_config(&tmp)).unwrap());
        assert_send_sync(&manager);
    }
}
