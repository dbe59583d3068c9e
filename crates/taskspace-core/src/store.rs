//! Task context documents and subtask binary artifacts
//!
//! Writes go to a temporary file in the destination directory and are then
//! renamed over the target, so concurrent readers see either the old or the
//! new content. Reads report a missing file as `None`; a context file that
//! does not parse is reported the same way.

use crate::error::{TmpError, TmpResult};
use crate::ident::IdentifierKind;
use crate::manager::TmpManager;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// File name of the per-task context document
pub const CONTEXT_FILE_NAME: &str = "context.json";

impl TmpManager {
    /// Write the task's context document, replacing any previous one
    ///
    /// # Errors
    /// - [`TmpError::Serialization`] if `context` cannot be encoded as JSON;
    ///   the previous document is left untouched
    /// - [`TmpError::Io`] if the file cannot be written
    pub fn write_context<T>(&self, task_id: &str, context: &T) -> TmpResult<PathBuf>
    where
        T: Serialize + ?Sized,
    {
        let bytes = serde_json::to_vec_pretty(context)?;
        let path = self.task_dir(task_id)?.join(CONTEXT_FILE_NAME);
        write_atomic(&path, &bytes)?;
        Ok(path)
    }

    /// Read the task's context document
    ///
    /// Returns `None` if it was never written or does not parse as `T`.
    ///
    /// # Errors
    /// Returns an error for IO failures other than "not found"
    pub fn read_context<T>(&self, task_id: &str) -> TmpResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let path = self.task_path(task_id)?.join(CONTEXT_FILE_NAME);
        let Some(bytes) = read_optional(&path)? else {
            return Ok(None);
        };
        match serde_json::from_slice(&bytes) {
            Ok(context) => Ok(Some(context)),
            Err(e) => {
                tracing::debug!("Ignoring malformed context {}: {}", path.display(), e);
                Ok(None)
            }
        }
    }

    /// Write a named binary artifact for a subtask
    ///
    /// # Errors
    /// Returns an error if an identifier is rejected or the write fails
    pub fn write_binary(
        &self,
        task_id: &str,
        subtask_id: &str,
        filename: &str,
        data: &[u8],
    ) -> TmpResult<PathBuf> {
        self.check(IdentifierKind::File, filename)?;
        let path = self.subtask_dir(task_id, subtask_id)?.join(filename);
        write_atomic(&path, data)?;
        Ok(path)
    }

    /// Read a named binary artifact for a subtask
    ///
    /// # Errors
    /// Returns an error for IO failures other than "not found"
    pub fn read_binary(
        &self,
        task_id: &str,
        subtask_id: &str,
        filename: &str,
    ) -> TmpResult<Option<Vec<u8>>> {
        self.check(IdentifierKind::File, filename)?;
        let path = self.subtask_path(task_id, subtask_id)?.join(filename);
        read_optional(&path)
    }
}

fn read_optional(path: &Path) -> TmpResult<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(TmpError::io_error(path, e)),
    }
}

/// Mode given to artifacts on Unix; `tempfile` alone would leave them 0600
#[cfg(unix)]
const ARTIFACT_MODE: u32 = 0o644;

fn write_atomic(path: &Path, data: &[u8]) -> TmpResult<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::Builder::new()
        .prefix(".")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|e| TmpError::io_error(dir, e))?;
    tmp.write_all(data)
        .map_err(|e| TmpError::io_error(tmp.path(), e))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(fs::Permissions::from_mode(ARTIFACT_MODE))
            .map_err(|e| TmpError::io_error(tmp.path(), e))?;
    }
    tmp.persist(path)
        .map_err(|e| TmpError::io_error(path, e.error))?;
    Ok(())
}
