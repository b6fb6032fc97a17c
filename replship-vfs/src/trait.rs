//! VirtualFileSystem trait definition

use crate::error::VfsResult;
use std::path::Path;

/// Whether a directory entry is a directory or a leaf artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    File,
}

/// One child of a directory, as returned by [`VirtualFileSystem::read_dir`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Name of the child, without any separator
    pub name: String,
    pub kind: EntryKind,
}

impl DirEntry {
    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Directory,
        }
    }

    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::File,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// Extension of a leaf name (text after the last `.`), if any
    pub fn extension(&self) -> Option<&str> {
        match self.name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => Some(ext),
            _ => None,
        }
    }
}

/// Virtual File System trait
///
/// Provides a unified interface over compiler output, decoupling readers
/// from the backend that stores it.
///
/// Sibling names are unique. `read_dir` returns children in an order that is
/// stable for one call; callers that need one consistent view list once.
///
/// # Implementations
/// - `MemoryFileSystem`: In-memory tree
/// - `NativeFileSystem`: Native OS file system
pub trait VirtualFileSystem: Send + Sync {
    /// Read file contents
    fn read_file(&self, path: &Path) -> VfsResult<Vec<u8>>;

    /// Write file contents
    ///
    /// Creates the file and any missing parent directories if needed,
    /// truncates the file if it exists.
    fn write_file(&self, path: &Path, content: &[u8]) -> VfsResult<()>;

    /// List the children of a directory
    fn read_dir(&self, path: &Path) -> VfsResult<Vec<DirEntry>>;

    /// Create a directory and any missing parents
    fn create_dir_all(&self, path: &Path) -> VfsResult<()>;

    /// Check if path exists
    fn exists(&self, path: &Path) -> bool;

    /// Check if path is a file
    fn is_file(&self, path: &Path) -> bool;

    /// Check if path is a directory
    fn is_dir(&self, path: &Path) -> bool;
}
