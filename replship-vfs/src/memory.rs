//! In-memory file system implementation

use crate::error::{VfsError, VfsResult};
use crate::r#trait::{DirEntry, VirtualFileSystem};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

#[derive(Debug, Clone)]
enum Node {
    Dir(BTreeMap<String, Node>),
    File(Vec<u8>),
}

impl Node {
    fn empty_dir() -> Self {
        Node::Dir(BTreeMap::new())
    }
}

/// An in-memory file system implementation.
///
/// Files and directories form a real tree; children of a directory are kept
/// in a `BTreeMap`, so listings come back in byte order of their names.
/// Clones share the same tree, which is how a compiler driver and a reader
/// observe the same output.
///
/// # Example
/// ```
/// use replship_vfs::{MemoryFileSystem, VirtualFileSystem};
/// use std::path::Path;
///
/// let fs = MemoryFileSystem::new();
/// fs.write_file(Path::new("/a/B.class"), &[1, 2, 3]).unwrap();
/// assert!(fs.is_dir(Path::new("/a")));
/// assert_eq!(fs.read_file(Path::new("/a/B.class")).unwrap(), vec![1, 2, 3]);
/// ```
#[derive(Debug, Clone)]
pub struct MemoryFileSystem {
    root: Arc<RwLock<Node>>,
}

impl MemoryFileSystem {
    /// Create a new empty memory file system.
    pub fn new() -> Self {
        Self {
            root: Arc::new(RwLock::new(Node::empty_dir())),
        }
    }

    /// Create a new memory file system pre-populated with files.
    ///
    /// # Panics
    /// If a path is invalid or collides with a file used as a directory.
    pub fn with_files<I, S>(files: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<u8>)>,
        S: AsRef<str>,
    {
        let fs = Self::new();
        for (path, content) in files {
            fs.write_file(Path::new(path.as_ref()), &content)
                .unwrap_or_else(|e| panic!("invalid fixture path: {e}"));
        }
        fs
    }

    /// Split a path into its normal components.
    /// Uses forward slashes consistently for cross-platform compatibility.
    fn components(path: &Path) -> VfsResult<Vec<String>> {
        let normalized = path.to_string_lossy().replace('\\', "/");
        let mut parts = Vec::new();
        for part in normalized.split('/') {
            match part {
                "" | "." => continue,
                ".." => {
                    return Err(VfsError::InvalidPath {
                        path: normalized.clone(),
                        reason: "parent references are not supported".to_string(),
                    })
                }
                other => parts.push(other.to_string()),
            }
        }
        Ok(parts)
    }

    fn display(parts: &[String]) -> String {
        format!("/{}", parts.join("/"))
    }

    fn lookup<'a>(root: &'a Node, parts: &[String]) -> VfsResult<&'a Node> {
        let mut node = root;
        for (depth, part) in parts.iter().enumerate() {
            node = match node {
                Node::Dir(children) => children.get(part).ok_or_else(|| VfsError::NotFound {
                    path: Self::display(&parts[..=depth]),
                })?,
                Node::File(_) => {
                    return Err(VfsError::NotADirectory {
                        path: Self::display(&parts[..depth]),
                    })
                }
            };
        }
        Ok(node)
    }

    /// Walk to the directory at `parts`, creating missing directories.
    fn ensure_dir<'a>(
        root: &'a mut Node,
        parts: &[String],
    ) -> VfsResult<&'a mut BTreeMap<String, Node>> {
        let mut node = root;
        for (depth, part) in parts.iter().enumerate() {
            let children = match node {
                Node::Dir(children) => children,
                Node::File(_) => {
                    return Err(VfsError::NotADirectory {
                        path: Self::display(&parts[..depth]),
                    })
                }
            };
            node = children.entry(part.clone()).or_insert_with(Node::empty_dir);
        }
        match node {
            Node::Dir(children) => Ok(children),
            Node::File(_) => Err(VfsError::NotADirectory {
                path: Self::display(parts),
            }),
        }
    }
}

impl Default for MemoryFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualFileSystem for MemoryFileSystem {
    fn read_file(&self, path: &Path) -> VfsResult<Vec<u8>> {
        let parts = Self::components(path)?;
        let root = self.root.read().unwrap_or_else(PoisonError::into_inner);
        match Self::lookup(&root, &parts)? {
            Node::File(content) => Ok(content.clone()),
            Node::Dir(_) => Err(VfsError::NotAFile {
                path: Self::display(&parts),
            }),
        }
    }

    fn write_file(&self, path: &Path, content: &[u8]) -> VfsResult<()> {
        let parts = Self::components(path)?;
        let Some((name, parents)) = parts.split_last() else {
            return Err(VfsError::InvalidPath {
                path: path.to_string_lossy().to_string(),
                reason: "cannot write to the root directory".to_string(),
            });
        };
        let mut root = self.root.write().unwrap_or_else(PoisonError::into_inner);
        let dir = Self::ensure_dir(&mut root, parents)?;
        if let Some(Node::Dir(_)) = dir.get(name) {
            return Err(VfsError::NotAFile {
                path: Self::display(&parts),
            });
        }
        dir.insert(name.clone(), Node::File(content.to_vec()));
        Ok(())
    }

    fn read_dir(&self, path: &Path) -> VfsResult<Vec<DirEntry>> {
        let parts = Self::components(path)?;
        let root = self.root.read().unwrap_or_else(PoisonError::into_inner);
        match Self::lookup(&root, &parts)? {
            Node::Dir(children) => Ok(children
                .iter()
                .map(|(name, node)| match node {
                    Node::Dir(_) => DirEntry::directory(name.clone()),
                    Node::File(_) => DirEntry::file(name.clone()),
                })
                .collect()),
            Node::File(_) => Err(VfsError::NotADirectory {
                path: Self::display(&parts),
            }),
        }
    }

    fn create_dir_all(&self, path: &Path) -> VfsResult<()> {
        let parts = Self::components(path)?;
        let mut root = self.root.write().unwrap_or_else(PoisonError::into_inner);
        Self::ensure_dir(&mut root, &parts).map(|_| ())
    }

    fn exists(&self, path: &Path) -> bool {
        let Ok(parts) = Self::components(path) else {
            return false;
        };
        let root = self.root.read().unwrap_or_else(PoisonError::into_inner);
        Self::lookup(&root, &parts).is_ok()
    }

    fn is_file(&self, path: &Path) -> bool {
        let Ok(parts) = Self::components(path) else {
            return false;
        };
        let root = self.root.read().unwrap_or_else(PoisonError::into_inner);
        matches!(Self::lookup(&root, &parts), Ok(Node::File(_)))
    }

    fn is_dir(&self, path: &Path) -> bool {
        let Ok(parts) = Self::components(path) else {
            return false;
        };
        let root = self.root.read().unwrap_or_else(PoisonError::into_inner);
        matches!(Self::lookup(&root, &parts), Ok(Node::Dir(_)))
    }
}
