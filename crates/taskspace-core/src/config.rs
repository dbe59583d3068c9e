//! Configuration for temporary directory management
//!
//! [`TmpConfig`] is immutable once handed to a manager. It can be built in
//! code, parsed from TOML, or read from `TASKSPACE_*` environment variables.

use crate::error::{TmpError, TmpResult};
use crate::ident::IdentifierPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding [`TmpConfig::base_dir`]
pub const ENV_BASE_DIR: &str = "TASKSPACE_BASE_DIR";
/// Environment variable overriding [`TmpConfig::max_age_hours`]
pub const ENV_MAX_AGE_HOURS: &str = "TASKSPACE_MAX_AGE_HOURS";
/// Environment variable overriding [`TmpConfig::prune_interval_minutes`]
pub const ENV_PRUNE_INTERVAL_MINUTES: &str = "TASKSPACE_PRUNE_INTERVAL_MINUTES";
/// Environment variable overriding [`TmpConfig::max_project_dirs`]
pub const ENV_MAX_PROJECT_DIRS: &str = "TASKSPACE_MAX_PROJECT_DIRS";

/// Temporary directory configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TmpConfig {
    /// Root under which every project namespace lives
    pub base_dir: PathBuf,
    /// Project directories older than this are removed
    pub max_age_hours: f64,
    /// Minimum spacing between sweeps of one manager
    pub prune_interval_minutes: f64,
    /// Maximum number of project directories under `base_dir`
    pub max_project_dirs: usize,
    /// Validation applied to task, subtask and file names
    pub identifiers: IdentifierPolicy,
}

impl TmpConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With base directory
    #[inline]
    #[must_use]
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    /// With max age in hours
    #[inline]
    #[must_use]
    pub fn with_max_age_hours(mut self, hours: f64) -> Self {
        self.max_age_hours = hours;
        self
    }

    /// With prune interval in minutes
    #[inline]
    #[must_use]
    pub fn with_prune_interval_minutes(mut self, minutes: f64) -> Self {
        self.prune_interval_minutes = minutes;
        self
    }

    /// With max project directories
    #[inline]
    #[must_use]
    pub fn with_max_project_dirs(mut self, max: usize) -> Self {
        self.max_project_dirs = max;
        self
    }

    /// With identifier policy
    #[inline]
    #[must_use]
    pub fn with_identifiers(mut self, policy: IdentifierPolicy) -> Self {
        self.identifiers = policy;
        self
    }

    /// Age threshold as a duration
    ///
    /// Call [`validate`](Self::validate) first; out-of-range values saturate.
    #[must_use]
    pub fn max_age(&self) -> Duration {
        to_duration(self.max_age_hours, 3600.0)
    }

    /// Prune interval as a duration
    #[must_use]
    pub fn prune_interval(&self) -> Duration {
        to_duration(self.prune_interval_minutes, 60.0)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// Returns [`TmpError::Config`] for negative, NaN or infinite durations
    pub fn validate(&self) -> TmpResult<()> {
        check_duration_field("max_age_hours", self.max_age_hours)?;
        check_duration_field("prune_interval_minutes", self.prune_interval_minutes)?;
        if self.base_dir.as_os_str().is_empty() {
            return Err(TmpError::Config("base_dir must not be empty".to_string()));
        }
        Ok(())
    }

    /// Parse configuration from TOML, missing keys take defaults
    ///
    /// # Errors
    /// Returns an error if the TOML is invalid or values are out of range
    pub fn from_toml_str(s: &str) -> TmpResult<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    pub fn load(path: impl AsRef<Path>) -> TmpResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| TmpError::io_error(path, e))?;
        Self::from_toml_str(&text)
    }

    /// Defaults overridden by `TASKSPACE_*` environment variables
    ///
    /// # Errors
    /// Returns [`TmpError::Config`] if a variable is set but unparsable
    pub fn from_env() -> TmpResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> TmpResult<Self> {
        let mut config = Self::default();
        if let Some(dir) = lookup(ENV_BASE_DIR) {
            config.base_dir = PathBuf::from(dir);
        }
        if let Some(v) = lookup(ENV_MAX_AGE_HOURS) {
            config.max_age_hours = parse_env(ENV_MAX_AGE_HOURS, &v)?;
        }
        if let Some(v) = lookup(ENV_PRUNE_INTERVAL_MINUTES) {
            config.prune_interval_minutes = parse_env(ENV_PRUNE_INTERVAL_MINUTES, &v)?;
        }
        if let Some(v) = lookup(ENV_MAX_PROJECT_DIRS) {
            config.max_project_dirs = parse_env(ENV_MAX_PROJECT_DIRS, &v)?;
        }
        config.validate()?;
        Ok(config)
    }
}

impl Default for TmpConfig {
    fn default() -> Self {
        Self {
            base_dir: std::env::temp_dir().join("agentic_projects"),
            max_age_hours: 1.0,
            prune_interval_minutes: 30.0,
            max_project_dirs: 100,
            identifiers: IdentifierPolicy::Verbatim,
        }
    }
}

fn to_duration(value: f64, unit_secs: f64) -> Duration {
    Duration::try_from_secs_f64(value * unit_secs).unwrap_or(if value > 0.0 {
        Duration::MAX
    } else {
        Duration::ZERO
    })
}

fn check_duration_field(name: &str, value: f64) -> TmpResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(TmpError::Config(format!(
            "{name} must be a finite non-negative number, got {value}"
        )))
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> TmpResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| TmpError::Config(format!("{key}: cannot parse '{value}'")))
}
