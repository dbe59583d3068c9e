//! taskspace Core
//!
//! Scoped temporary directories for task/subtask units of work, with
//! automatic reclamation of stale and excess project namespaces.
//!
//! # Core Concepts
//!
//! - [`ProjectHash`]: 16-hex-char namespace key derived from a project name
//! - [`TmpManager`]: task/subtask directories and artifacts for one project
//! - [`Reclaimer`]: age and capacity sweeps over the shared base directory
//! - [`ManagerRegistry`]: at most one manager per project name
//! - [`ProjectInfo`]: size and shape of a project's directory tree
//!
//! # Example
//!
//! ```rust,ignore
//! use taskspace_core::{ManagerRegistry, TmpConfig};
//!
//! let registry = ManagerRegistry::new(TmpConfig::new().with_base_dir("/tmp/agents"));
//! let manager = registry.get_manager("my-project", None)?;
//!
//! manager.write_context("task-1", &serde_json::json!({"status": "in_progress"}))?;
//! manager.write_binary("task-1", "step-1", "data.bin", b"\x00\x01")?;
//!
//! let info = manager.project_info();
//! println!("{} files, {} bytes", info.file_count, info.total_size_bytes);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod config;
pub mod error;
pub mod hash;
pub mod ident;
pub mod info;
pub mod manager;
pub mod reclaim;
pub mod registry;
pub mod store;

// Re-exports
pub use config::TmpConfig;
pub use error::{TmpError, TmpResult};
pub use hash::{HashError, ProjectHash, PROJECT_HASH_LEN};
pub use ident::{IdentifierKind, IdentifierPolicy};
pub use info::ProjectInfo;
pub use manager::TmpManager;
pub use reclaim::{PruneGate, Reclaimer, SweepReport};
pub use registry::{get_tmp_manager, ManagerRegistry};
pub use store::CONTEXT_FILE_NAME;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with taskspace
    pub use crate::{
        ManagerRegistry, ProjectHash, ProjectInfo, SweepReport, TmpConfig, TmpError, TmpManager,
        TmpResult,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
