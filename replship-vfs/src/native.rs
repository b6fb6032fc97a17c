//! Native file system implementation

use crate::error::{VfsError, VfsResult};
use crate::r#trait::{DirEntry, VirtualFileSystem};
use std::path::{Component, Path, PathBuf};

/// A native OS file system implementation.
///
/// This wraps `std::fs` operations and provides the `VirtualFileSystem`
/// interface for a compiler output directory on disk.
///
/// With a base directory, every path is taken relative to it: `/a/B.class`
/// and `a/B.class` both name `<base>/a/B.class`, and `..` is rejected.
/// Without one, paths are used as given.
///
/// # Example
/// ```
/// use replship_vfs::{NativeFileSystem, VirtualFileSystem};
/// use std::path::Path;
///
/// let fs = NativeFileSystem::with_base(std::env::temp_dir());
/// assert!(fs.is_dir(Path::new("/")));
/// ```
#[derive(Debug, Clone, Default)]
pub struct NativeFileSystem {
    base: Option<PathBuf>,
}

impl NativeFileSystem {
    /// Create a new native file system using paths as given.
    pub fn new() -> Self {
        Self { base: None }
    }

    /// Create a new native file system with a base directory.
    ///
    /// All paths will be relative to this base directory.
    pub fn with_base(base: impl Into<PathBuf>) -> Self {
        Self {
            base: Some(base.into()),
        }
    }

    /// The base directory, if any
    pub fn base(&self) -> Option<&Path> {
        self.base.as_deref()
    }

    fn resolve(&self, path: &Path) -> VfsResult<PathBuf> {
        let Some(base) = &self.base else {
            return Ok(path.to_path_buf());
        };
        let mut resolved = base.clone();
        for component in path.components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::RootDir | Component::CurDir | Component::Prefix(_) => {}
                Component::ParentDir => {
                    return Err(VfsError::InvalidPath {
                        path: path.to_string_lossy().to_string(),
                        reason: "parent references escape the base directory".to_string(),
                    })
                }
            }
        }
        Ok(resolved)
    }
}

impl VirtualFileSystem for NativeFileSystem {
    fn read_file(&self, path: &Path) -> VfsResult<Vec<u8>> {
        let full = self.resolve(path)?;
        if full.is_dir() {
            return Err(VfsError::NotAFile {
                path: full.to_string_lossy().to_string(),
            });
        }
        std::fs::read(&full).map_err(|e| VfsError::io(full.to_string_lossy(), e))
    }

    fn write_file(&self, path: &Path, content: &[u8]) -> VfsResult<()> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| VfsError::io(parent.to_string_lossy(), e))?;
        }
        std::fs::write(&full, content).map_err(|e| VfsError::io(full.to_string_lossy(), e))
    }

    fn read_dir(&self, path: &Path) -> VfsResult<Vec<DirEntry>> {
        let full = self.resolve(path)?;
        if full.is_file() {
            return Err(VfsError::NotADirectory {
                path: full.to_string_lossy().to_string(),
            });
        }
        let reader =
            std::fs::read_dir(&full).map_err(|e| VfsError::io(full.to_string_lossy(), e))?;

        let mut entries = Vec::new();
        for entry in reader {
            let entry = entry.map_err(|e| VfsError::io(full.to_string_lossy(), e))?;
            let child = entry.path();
            let name = entry.file_name().into_string().map_err(|raw| VfsError::InvalidPath {
                path: child.to_string_lossy().to_string(),
                reason: format!("non UTF-8 name {:?}", raw),
            })?;
            // follows symlinks
            if child.is_dir() {
                entries.push(DirEntry::directory(name));
            } else {
                entries.push(DirEntry::file(name));
            }
        }
        Ok(entries)
    }

    fn create_dir_all(&self, path: &Path) -> VfsResult<()> {
        let full = self.resolve(path)?;
        std::fs::create_dir_all(&full).map_err(|e| VfsError::io(full.to_string_lossy(), e))
    }

    fn exists(&self, path: &Path) -> bool {
        self.resolve(path).map(|p| p.exists()).unwrap_or(false)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.resolve(path).map(|p| p.is_file()).unwrap_or(false)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.resolve(path).map(|p| p.is_dir()).unwrap_or(false)
    }
}
