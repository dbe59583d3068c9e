//! Identifier policy for task, subtask and file names
//!
//! Identifiers become path components below the project directory. The
//! default [`IdentifierPolicy::Verbatim`] uses them unchanged, which lets a
//! caller escape the project directory with `..` or an absolute path.
//! [`IdentifierPolicy::Strict`] rejects such identifiers.

use crate::error::TmpError;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Which path component an identifier is destined for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierKind {
    /// Task directory name
    Task,
    /// Subtask directory name
    Subtask,
    /// Binary artifact file name
    File,
}

impl Display for IdentifierKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Task => "task id",
            Self::Subtask => "subtask id",
            Self::File => "file name",
        };
        f.write_str(s)
    }
}

/// Validation applied to identifiers before they are joined onto a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierPolicy {
    /// Use identifiers as given
    #[default]
    Verbatim,

    /// Reject empty, `.`, `..`, and anything containing a separator or NUL
    Strict,
}

impl IdentifierPolicy {
    /// Check `value` against this policy
    ///
    /// # Errors
    /// Returns [`TmpError::InvalidIdentifier`] if the policy rejects `value`
    pub fn check(self, kind: IdentifierKind, value: &str) -> Result<(), TmpError> {
        match self {
            Self::Verbatim => Ok(()),
            Self::Strict => strict_violation(value)
                .map_or(Ok(()), |reason| Err(TmpError::invalid_identifier(kind, value, reason))),
        }
    }
}

fn strict_violation(value: &str) -> Option<&'static str> {
    if value.is_empty() {
        Some("must not be empty")
    } else if value == "." || value == ".." {
        Some("must not be a relative directory reference")
    } else if value.contains(['/', '\\']) {
        Some("must not contain a path separator")
    } else if value.contains('\0') {
        Some("must not contain NUL")
    } else {
        None
    }
}
