//! Staging directories for archive builds
//!
//! Each build gets a directory no earlier build in this process used, so a
//! worker still reading an older archive is never overwritten. Allocated
//! directories are never removed here; cleanup belongs to the caller.

use crate::error::BuildError;
use replship_config::ArchiveConfig;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;
use uuid::Uuid;

const TARGET: &str = "replship::workspace";

/// Names tried before giving up on a pathological staging root
const MAX_ATTEMPTS: usize = 16;

/// A freshly created, empty staging directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceDir {
    path: PathBuf,
    id: Uuid,
    sequence: u64,
}

impl WorkspaceDir {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Random identity of this allocation
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Position of this allocation within its allocator
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

#[derive(Debug)]
pub struct WorkspaceAllocator {
    root: PathBuf,
    prefix: String,
    next: AtomicU64,
}

impl WorkspaceAllocator {
    pub fn new(root: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            prefix: prefix.into(),
            next: AtomicU64::new(0),
        }
    }

    /// Allocator under `staging_root`, or `<temp>/replship` when unset
    pub fn from_config(config: &ArchiveConfig) -> Self {
        let root = config
            .staging_root
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("replship"));
        Self::new(root, config.staging_prefix.clone())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create a new, empty, uniquely named directory under the root
    pub fn allocate(&self) -> Result<WorkspaceDir, BuildError> {
        std::fs::create_dir_all(&self.root).map_err(|source| BuildError::Workspace {
            path: self.root.clone(),
            source,
        })?;

        let mut last_path = self.root.clone();
        for _ in 0..MAX_ATTEMPTS {
            let sequence = self.next.fetch_add(1, Ordering::Relaxed);
            let id = Uuid::new_v4();
            let path = self.root.join(format!(
                "{}-{}-{}-{}",
                self.prefix,
                std::process::id(),
                sequence,
                id.simple()
            ));

            // create_dir, not create_dir_all: an existing directory must fail
            match std::fs::create_dir(&path) {
                Ok(()) => {
                    debug!(target: TARGET, path = %path.display(), sequence, "allocated staging directory");
                    return Ok(WorkspaceDir { path, id, sequence });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    debug!(target: TARGET, path = %path.display(), "staging name taken, retrying");
                    last_path = path;
                }
                Err(source) => return Err(BuildError::Workspace { path, source }),
            }
        }

        Err(BuildError::Workspace {
            path: last_path,
            source: std::io::Error::new(
                ErrorKind::AlreadyExists,
                "no unused staging directory name found",
            ),
        })
    }
}
