//! Registry of live managers, one per project name
//!
//! Provides [`ManagerRegistry`]. Each access triggers the manager's
//! rate-limited sweep, so reclamation piggybacks on normal use instead of
//! running on a timer.

use crate::config::TmpConfig;
use crate::error::{TmpError, TmpResult};
use crate::hash::ProjectHash;
use crate::manager::TmpManager;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::sync::Arc;

static GLOBAL: Lazy<ManagerRegistry> = Lazy::new(|| {
    let config = TmpConfig::from_env().unwrap_or_else(|e| {
        tracing::warn!("Invalid taskspace environment, using defaults: {}", e);
        TmpConfig::default()
    });
    ManagerRegistry::new(config)
});

/// Map from project name to its manager
///
/// Keyed by the raw name. A second name that hashes onto a directory already
/// owned by another name is rejected with [`TmpError::HashCollision`].
#[derive(Debug)]
pub struct ManagerRegistry {
    default_config: TmpConfig,
    managers: DashMap<String, Arc<TmpManager>>,
    owners: DashMap<ProjectHash, String>,
}

impl ManagerRegistry {
    /// Create empty registry; `default_config` applies when callers pass none
    #[inline]
    #[must_use]
    pub fn new(default_config: TmpConfig) -> Self {
        Self {
            default_config,
            managers: DashMap::new(),
            owners: DashMap::new(),
        }
    }

    /// Process-wide registry configured from `TASKSPACE_*` variables
    #[must_use]
    pub fn global() -> &'static Self {
        &GLOBAL
    }

    /// Default configuration for new managers
    #[inline]
    #[must_use]
    pub fn default_config(&self) -> &TmpConfig {
        &self.default_config
    }

    /// Get or create the manager for `project_name`
    ///
    /// `config` is only used when the manager is created. Afterwards the
    /// project directory is recreated if it was reclaimed, and the manager's
    /// rate-limited sweep runs; sweep failures are logged, not returned.
    ///
    /// # Errors
    /// - [`TmpError::HashCollision`] if another name owns the same hash
    /// - construction or directory creation failures
    pub fn get_manager(
        &self,
        project_name: &str,
        config: Option<&TmpConfig>,
    ) -> TmpResult<Arc<TmpManager>> {
        let manager = match self.managers.entry(project_name.to_string()) {
            Entry::Occupied(entry) => Arc::clone(entry.get()),
            Entry::Vacant(entry) => {
                let hash = ProjectHash::of(project_name);
                self.claim_hash(hash, project_name)?;
                let config = config.unwrap_or(&self.default_config).clone();
                let manager = match TmpManager::new(project_name, config) {
                    Ok(manager) => Arc::new(manager),
                    Err(e) => {
                        self.owners.remove(&hash);
                        return Err(e);
                    }
                };
                entry.insert(Arc::clone(&manager));
                manager
            }
        };

        manager.ensure_project_dir()?;
        if let Err(e) = manager.prune_old_directories() {
            tracing::warn!(project = %project_name, "Pruning failed: {}", e);
        }
        Ok(manager)
    }

    /// Whether a manager exists for `project_name`
    #[inline]
    #[must_use]
    pub fn contains(&self, project_name: &str) -> bool {
        self.managers.contains_key(project_name)
    }

    /// Drop the registry's handle for `project_name`
    ///
    /// The project directory is left on disk for the reclaimer.
    pub fn remove(&self, project_name: &str) -> Option<Arc<TmpManager>> {
        let (_, manager) = self.managers.remove(project_name)?;
        self.owners.remove(&manager.project_hash());
        Some(manager)
    }

    /// Number of registered managers
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.managers.len()
    }

    /// Whether the registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.managers.is_empty()
    }

    /// Registered project names, unordered
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.managers.iter().map(|e| e.key().clone()).collect()
    }

    fn claim_hash(&self, hash: ProjectHash, project_name: &str) -> TmpResult<()> {
        match self.owners.entry(hash) {
            Entry::Occupied(owner) if owner.get() != project_name => Err(TmpError::HashCollision {
                hash,
                existing: owner.get().clone(),
                requested: project_name.to_string(),
            }),
            Entry::Occupied(_) => Ok(()),
            Entry::Vacant(slot) => {
                slot.insert(project_name.to_string());
                Ok(())
            }
        }
    }
}

impl Default for ManagerRegistry {
    fn default() -> Self {
        Self::new(TmpConfig::default())
    }
}

/// Get or create a manager from the [global](ManagerRegistry::global) registry
///
/// # Errors
/// See [`ManagerRegistry::get_manager`]
pub fn get_tmp_manager(project_name: &str, config: Option<&TmpConfig>) -> TmpResult<Arc<TmpManager>> {
    ManagerRegistry::global().get_manager(project_name, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn registry(tmp: &TempDir) -> ManagerRegistry {
        ManagerRegistry::new(TmpConfig::new().with_base_dir(tmp.path()))
    }

    #[test]
    fn same_name_same_instance() {
        let tmp = TempDir::new().unwrap();
        let registry = registry(&tmp);

        let m1 = registry.get_manager("project_a", None).unwrap();
        let m2 = registry.get_manager("project_a", None).unwrap();
        let m3 = registry.get_manager("project_b", None).unwrap();

        assert!(Arc::ptr_eq(&m1, &m2));
        assert!(!Arc::ptr_eq(&m1, &m3));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn first_config_wins() {
        let tmp = TempDir::new().unwrap();
        let registry = registry(&tmp);
        let custom = TmpConfig::new().with_base_dir(tmp.path()).with_max_project_dirs(3);

        let m1 = registry.get_manager("p", Some(&custom)).unwrap();
        let m2 = registry
            .get_manager("p", Some(&custom.clone().with_max_project_dirs(9)))
            .unwrap();
        assert_eq!(m1.config().max_project_dirs, 3);
        assert!(Arc::ptr_eq(&m1, &m2));
    }

    #[test]
    fn get_manager_recreates_reclaimed_dir() {
        let tmp = TempDir::new().unwrap();
        let registry = registry(&tmp);
        let manager = registry.get_manager("p", None).unwrap();
        std::fs::remove_dir_all(manager.project_dir()).unwrap();

        let again = registry.get_manager("p", None).unwrap();
        assert!(again.project_dir().is_dir());
    }

    #[test]
    fn claim_hash_detects_collision() {
        let tmp = TempDir::new().unwrap();
        let registry = registry(&tmp);
        registry.get_manager("owner", None).unwrap();

        let hash = ProjectHash::of("owner");
        assert!(registry.claim_hash(hash, "owner").is_ok());
        let err = registry.claim_hash(hash, "intruder").unwrap_err();
        assert!(matches!(
            err,
            TmpError::HashCollision { ref existing, ref requested, .. }
                if existing == "owner" && requested == "intruder"
        ));
    }

    #[test]
    fn failed_construction_releases_hash() {
        let tmp = TempDir::new().unwrap();
        let registry = registry(&tmp);
        let bad = TmpConfig::new().with_base_dir(tmp.path()).with_max_age_hours(-1.0);

        assert!(registry.get_manager("p", Some(&bad)).is_err());
        assert!(!registry.contains("p"));
        assert!(registry.owners.is_empty());
        assert!(registry.get_manager("p", None).is_ok());
    }

    #[test]
    fn remove_releases_name_and_hash() {
        let tmp = TempDir::new().unwrap();
        let registry = registry(&tmp);
        let m1 = registry.get_manager("p", None).unwrap();

        let removed = registry.remove("p").unwrap();
        assert!(Arc::ptr_eq(&m1, &removed));
        assert!(registry.is_empty());
        assert!(registry.remove("p").is_none());
        assert!(m1.project_dir().is_dir());

        let m2 = registry.get_manager("p", None).unwrap();
        assert!(!Arc::ptr_eq(&m1, &m2));
    }

    #[test]
    fn names_lists_registered_projects() {
        let tmp = TempDir::new().unwrap();
        let registry = registry(&tmp);
        registry.get_manager("a", None).unwrap();
        registry.get_manager("b", None).unwrap();

        let mut names = registry.names();
        names.sort();
        assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
    }
}
