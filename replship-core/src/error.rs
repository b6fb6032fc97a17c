//! Error types for resolution, platform probing and archive builds

use replship_vfs::VfsError;
use std::path::PathBuf;
use thiserror::Error;
use zip::result::ZipError;

/// Failure to resolve a unit by name
#[derive(Error, Debug)]
pub enum LoadError {
    /// No stage could answer the name. This is the expected end of an
    /// exhausted lookup, not a fault.
    #[error("unit not found: {name}")]
    NotFound { name: String },

    #[error("failed to read unit '{name}' from {location}: {source}")]
    Source {
        name: String,
        location: String,
        #[source]
        source: VfsError,
    },

    #[error("failed to read unit '{name}' from archive {location}: {source}")]
    Archive {
        name: String,
        location: String,
        #[source]
        source: ZipError,
    },
}

impl LoadError {
    pub fn not_found(name: impl Into<String>) -> Self {
        LoadError::NotFound { name: name.into() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, LoadError::NotFound { .. })
    }
}

/// The platform resolver cannot be obtained on this runtime.
///
/// Never reaches callers of resolution: every variant downgrades to
/// "no platform resolver" at loader construction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("platform resolver unsupported: {0}")]
    Unsupported(String),

    #[error("platform capability missing: {0}")]
    MissingCapability(String),

    #[error("platform resolver access denied: {0}")]
    Denied(String),
}

/// Failure of an archive build
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("no session registered; refusing to build an archive")]
    NoSession,

    #[error("cannot create staging directory {path}: {source}")]
    Workspace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot read artifact tree at {path}: {source}")]
    Tree {
        path: PathBuf,
        #[source]
        source: VfsError,
    },

    #[error("cannot write archive {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: ZipError,
    },
}

impl BuildError {
    /// Whether the build was refused for lack of a session
    pub fn is_configuration(&self) -> bool {
        matches!(self, BuildError::NoSession)
    }
}
