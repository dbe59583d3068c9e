//! Usage report for a project's directory tree

use crate::hash::ProjectHash;
use crate::manager::TmpManager;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use walkdir::WalkDir;

/// Size and shape of one project directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectInfo {
    pub project_name: String,
    pub project_hash: ProjectHash,
    pub directory: PathBuf,
    /// Sum of regular file sizes
    pub total_size_bytes: u64,
    pub file_count: u64,
    /// Directories below the project directory, not counting itself
    pub dir_count: u64,
    /// Modification time of the project directory, `None` once reclaimed
    pub last_modified: Option<DateTime<Utc>>,
}

impl TmpManager {
    /// Walk the project directory and summarise its contents
    ///
    /// Entries that disappear or cannot be stat'ed mid-walk are skipped.
    #[must_use]
    pub fn project_info(&self) -> ProjectInfo {
        let mut total_size_bytes = 0;
        let mut file_count = 0;
        let mut dir_count = 0;

        for entry in WalkDir::new(self.project_dir()).min_depth(1) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::debug!("Skipping entry during walk: {}", e);
                    continue;
                }
            };
            let file_type = entry.file_type();
            if file_type.is_dir() {
                dir_count += 1;
            } else if file_type.is_file() {
                if let Ok(meta) = entry.metadata() {
                    total_size_bytes += meta.len();
                    file_count += 1;
                }
            }
        }

        let last_modified = fs::metadata(self.project_dir())
            .and_then(|m| m.modified())
            .ok()
            .map(DateTime::<Utc>::from);

        ProjectInfo {
            project_name: self.project_name().to_string(),
            project_hash: self.project_hash(),
            directory: self.project_dir().to_path_buf(),
            total_size_bytes,
            file_count,
            dir_count,
            last_modified,
        }
    }
}
