//! Reclamation of stale and excess project directories
//!
//! A sweep runs two policies over the immediate child directories of the
//! base directory, in order:
//!
//! 1. **Age**: children whose modification time is older than `max_age` are
//!    removed.
//! 2. **Capacity**: if more than `max_project_dirs` children remain, the
//!    oldest are removed until the limit holds.
//!
//! Other processes may sweep the same base directory at the same time. A
//! child that vanishes between listing and removal is not an error and is
//! not reported, and a failed removal is logged without aborting the sweep.
//! Only failure to list the base directory up front fails a sweep.

use crate::config::TmpConfig;
use crate::error::{TmpError, TmpResult};
use parking_lot::Mutex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

/// Outcome of one sweep
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Directories removed by the age policy during this sweep
    pub expired: Vec<PathBuf>,
    /// Directories removed by the capacity policy during this sweep
    pub evicted: Vec<PathBuf>,
    /// Removals that failed and were skipped
    pub failed: usize,
}

impl SweepReport {
    /// Total directories removed by this sweep
    #[inline]
    #[must_use]
    pub fn removed_count(&self) -> usize {
        self.expired.len() + self.evicted.len()
    }

    /// Whether nothing was removed and nothing failed
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.removed_count() == 0 && self.failed == 0
    }
}

/// Age + capacity sweeper over one base directory
#[derive(Debug, Clone)]
pub struct Reclaimer {
    base_dir: PathBuf,
    max_age: Duration,
    max_project_dirs: usize,
}

impl Reclaimer {
    /// Create reclaimer with explicit limits
    #[inline]
    #[must_use]
    pub fn new(base_dir: impl Into<PathBuf>, max_age: Duration, max_project_dirs: usize) -> Self {
        Self {
            base_dir: base_dir.into(),
            max_age,
            max_project_dirs,
        }
    }

    /// Create reclaimer from configuration
    #[inline]
    #[must_use]
    pub fn from_config(config: &TmpConfig) -> Self {
        Self::new(&config.base_dir, config.max_age(), config.max_project_dirs)
    }

    /// Directory being swept
    #[inline]
    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Sweep against the current wall-clock time
    ///
    /// # Errors
    /// Returns an error only if the base directory cannot be listed
    pub fn sweep(&self) -> TmpResult<SweepReport> {
        self.sweep_at(SystemTime::now())
    }

    /// Sweep, measuring directory ages relative to `now`
    ///
    /// # Errors
    /// Returns an error only if the base directory cannot be listed before
    /// the age pass
    pub fn sweep_at(&self, now: SystemTime) -> TmpResult<SweepReport> {
        tracing::info!("Starting pruning of {}", self.base_dir.display());
        let mut report = SweepReport::default();

        for (dir, mtime) in self.list_project_dirs()? {
            let age = now.duration_since(mtime).unwrap_or(Duration::ZERO);
            if age > self.max_age {
                match remove_tree(&dir) {
                    Ok(true) => {
                        tracing::info!("Pruned old project directory: {}", dir.display());
                        report.expired.push(dir);
                    }
                    Ok(false) => {}
                    Err(e) => {
                        tracing::warn!("Error pruning {}: {}", dir.display(), e);
                        report.failed += 1;
                    }
                }
            }
        }

        let mut remaining = match self.list_project_dirs() {
            Ok(remaining) => remaining,
            Err(e) => {
                tracing::warn!("Skipping capacity pass: {}", e);
                return Ok(report);
            }
        };
        if remaining.len() > self.max_project_dirs {
            remaining.sort_by(|(a_path, a_time), (b_path, b_time)| {
                a_time.cmp(b_time).then_with(|| a_path.cmp(b_path))
            });
            let excess = remaining.len() - self.max_project_dirs;
            for (dir, _) in remaining.into_iter().take(excess) {
                match remove_tree(&dir) {
                    Ok(true) => {
                        tracing::info!("Pruned excess project directory: {}", dir.display());
                        report.evicted.push(dir);
                    }
                    Ok(false) => {}
                    Err(e) => {
                        tracing::warn!("Error pruning {}: {}", dir.display(), e);
                        report.failed += 1;
                    }
                }
            }
        }

        if report.removed_count() > 0 {
            tracing::info!(
                expired = report.expired.len(),
                evicted = report.evicted.len(),
                failed = report.failed,
                "Pruned {} temporary directories",
                report.removed_count()
            );
        }
        Ok(report)
    }

    /// Child directories of the base directory with their mtimes
    ///
    /// Entries that cannot be stat'ed are skipped with a warning.
    fn list_project_dirs(&self) -> TmpResult<Vec<(PathBuf, SystemTime)>> {
        let entries = match fs::read_dir(&self.base_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(TmpError::io_error(&self.base_dir, e)),
        };

        let mut dirs = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Error listing {}: {}", self.base_dir.display(), e);
                    continue;
                }
            };
            let path = entry.path();
            match fs::metadata(&path).and_then(|m| Ok((m.is_dir(), m.modified()?))) {
                Ok((true, mtime)) => dirs.push((path, mtime)),
                Ok((false, _)) => {}
                Err(e) => tracing::warn!("Skipping {}: {}", path.display(), e),
            }
        }
        Ok(dirs)
    }
}

/// Serialises sweeps of one manager and spaces them by a minimum interval
#[derive(Debug)]
pub struct PruneGate {
    interval: Duration,
    last_prune: Mutex<Option<Instant>>,
}

impl PruneGate {
    /// Create gate; the first call to [`run`](Self::run) always passes
    #[inline]
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_prune: Mutex::new(None),
        }
    }

    /// Run `sweep` unless the previous run was less than one interval ago
    ///
    /// The lock is held while `sweep` runs, so concurrent callers wait and
    /// then observe the fresh timestamp.
    pub fn run<T>(&self, sweep: impl FnOnce() -> T) -> Option<T> {
        let mut last_prune = self.last_prune.lock();
        if let Some(last) = *last_prune {
            if last.elapsed() < self.interval {
                tracing::debug!("Skipping prune, last run {:?} ago", last.elapsed());
                return None;
            }
        }
        *last_prune = Some(Instant::now());
        Some(sweep())
    }

    /// When the last sweep through this gate started
    #[inline]
    #[must_use]
    pub fn last_prune(&self) -> Option<Instant> {
        *self.last_prune.lock()
    }
}

/// Remove a directory tree, treating "not found" as success
///
/// Returns `true` if this call removed the tree.
pub(crate) fn remove_tree(path: &Path) -> io::Result<bool> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!("Already removed: {}", path.display());
            Ok(false)
        }
        Err(e) => Err(e),
    }
}
