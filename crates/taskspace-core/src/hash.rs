//! Project namespace hashing
//!
//! Provides [`ProjectHash`], the fixed-length key a project name is stored
//! under on disk. The raw project name is never used as a path component.

use sha2::{Digest, Sha256};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Number of digest bytes kept in a [`ProjectHash`]
pub const PROJECT_HASH_BYTES: usize = 8;

/// Length of the hex rendering of a [`ProjectHash`]
pub const PROJECT_HASH_LEN: usize = PROJECT_HASH_BYTES * 2;

/// Truncated SHA-256 digest of a project name
///
/// Pure and keyless: the same name yields the same hash in every process.
/// Renders as 16 lowercase hex characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProjectHash([u8; PROJECT_HASH_BYTES]);

impl ProjectHash {
    /// Hash a project name
    #[inline]
    #[must_use]
    pub fn of(project_name: &str) -> Self {
        let digest = Sha256::digest(project_name.as_bytes());
        let mut arr = [0u8; PROJECT_HASH_BYTES];
        arr.copy_from_slice(&digest[..PROJECT_HASH_BYTES]);
        Self(arr)
    }

    /// Create from raw bytes
    #[inline]
    #[must_use]
    pub const fn new(bytes: [u8; PROJECT_HASH_BYTES]) -> Self {
        Self(bytes)
    }

    /// Get reference to the underlying bytes
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; PROJECT_HASH_BYTES] {
        &self.0
    }

    /// Hex rendering, used as the directory name
    #[inline]
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl Display for ProjectHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for ProjectHash {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != PROJECT_HASH_LEN {
            return Err(HashError::InvalidLength {
                expected: PROJECT_HASH_LEN,
                actual: s.len(),
            });
        }
        let mut arr = [0u8; PROJECT_HASH_BYTES];
        hex::decode_to_slice(s, &mut arr)?;
        Ok(Self(arr))
    }
}

impl serde::Serialize for ProjectHash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> serde::Deserialize<'de> for ProjectHash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Errors parsing a [`ProjectHash`] from text
#[derive(Debug, thiserror::Error)]
pub enum HashError {
    /// Wrong number of hex characters
    #[error("invalid project hash length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// Hex decoding error
    #[error("hex decode error: {0}")]
    HexDecode(#[from] hex::FromHexError),
}
