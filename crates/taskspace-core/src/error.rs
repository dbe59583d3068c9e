//! Error types for taskspace
//!
//! Reads report missing or malformed artifacts as `Ok(None)`, so the variants
//! here cover what callers must actually handle:
//! - filesystem failures outside the not-found case
//! - documents that cannot be serialized
//! - rejected identifiers and hash collisions
//! - invalid configuration

use crate::hash::ProjectHash;
use crate::ident::IdentifierKind;
use std::path::PathBuf;

/// Main taskspace error type
#[derive(Debug, thiserror::Error)]
pub enum TmpError {
    /// IO error on a specific path
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Document cannot be represented as JSON
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Identifier rejected by the configured policy
    #[error("invalid {kind} '{value}': {reason}")]
    InvalidIdentifier {
        kind: IdentifierKind,
        value: String,
        reason: &'static str,
    },

    /// Two project names share one on-disk namespace
    #[error("project '{requested}' collides with '{existing}' on hash {hash}")]
    HashCollision {
        hash: ProjectHash,
        existing: String,
        requested: String,
    },

    /// Configuration values out of range
    #[error("configuration error: {0}")]
    Config(String),

    /// Configuration file could not be parsed
    #[error("configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

impl TmpError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create invalid identifier error
    pub fn invalid_identifier(
        kind: IdentifierKind,
        value: impl Into<String>,
        reason: &'static str,
    ) -> Self {
        Self::InvalidIdentifier {
            kind,
            value: value.into(),
            reason,
        }
    }

    /// Whether this is an IO error of kind `NotFound`
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

/// Result type alias for taskspace operations
pub type TmpResult<T> = Result<T, TmpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_display_includes_path() {
        let err = TmpError::io_error(
            "/tmp/x",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let msg = err.to_string();
        assert!(msg.contains("/tmp/x"));
        assert!(msg.contains("denied"));
        assert!(!err.is_not_found());
    }

    #[test]
    fn not_found_classification() {
        let err = TmpError::io_error("/gone", std::io::ErrorKind::NotFound.into());
        assert!(err.is_not_found());
    }

    #[test]
    fn invalid_identifier_display() {
        let err = TmpError::invalid_identifier(IdentifierKind::Task, "..", "nope");
        assert_eq!(err.to_string(), "invalid task id '..': nope");
    }

    #[test]
    fn hash_collision_display() {
        let err = TmpError::HashCollision {
            hash: ProjectHash::of("a"),
            existing: "a".to_string(),
            requested: "b".to_string(),
        };
        assert!(err.to_string().contains("collides"));
    }

    #[test]
    fn error_conversions() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: TmpError = json_err.into();
        assert!(matches!(err, TmpError::Serialization(_)));
    }
}
