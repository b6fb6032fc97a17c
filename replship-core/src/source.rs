//! Code sources - the locations a loader reads unit bytes from
//!
//! A source only fetches bytes; defining a unit from them is the loader's job.

use crate::error::LoadError;
use crate::unit::unit_path;
use parking_lot::Mutex;
use replship_vfs::{VfsError, VirtualFileSystem};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use zip::result::{ZipError, ZipResult};
use zip::ZipArchive;

pub trait CodeSource: Send + Sync {
    /// Human-readable location, for logs and errors
    fn location(&self) -> String;

    /// Fetch the bytes of a unit, `Ok(None)` if this source does not have it
    fn fetch(&self, name: &str) -> Result<Option<Vec<u8>>, LoadError>;
}

/// Units laid out as `a/b/C.<ext>` under a root of any artifact tree
pub struct DirectorySource {
    fs: Arc<dyn VirtualFileSystem>,
    root: PathBuf,
    extension: String,
}

impl DirectorySource {
    pub fn new(
        fs: Arc<dyn VirtualFileSystem>,
        root: impl Into<PathBuf>,
        extension: impl Into<String>,
    ) -> Self {
        Self {
            fs,
            root: root.into(),
            extension: extension.into(),
        }
    }
}

impl CodeSource for DirectorySource {
    fn location(&self) -> String {
        format!("dir:{}", self.root.display())
    }

    fn fetch(&self, name: &str) -> Result<Option<Vec<u8>>, LoadError> {
        let Some(relative) = unit_path(name, &self.extension) else {
            return Ok(None);
        };
        let path = self.root.join(relative);
        match self.fs.read_file(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(
                VfsError::NotFound { .. }
                | VfsError::NotADirectory { .. }
                | VfsError::NotAFile { .. },
            ) => Ok(None),
            Err(source) => Err(LoadError::Source {
                name: name.to_string(),
                location: self.location(),
                source,
            }),
        }
    }
}

/// Units read straight out of a built archive, as a worker process does
pub struct ArchiveSource {
    path: PathBuf,
    archive: Mutex<ZipArchive<File>>,
    extension: String,
}

impl ArchiveSource {
    /// Open an archive; fails if the file is missing or not a valid archive
    pub fn open(path: impl AsRef<Path>, extension: impl Into<String>) -> ZipResult<Self> {
        let path = path.as_ref().to_path_buf();
        let archive = ZipArchive::new(File::open(&path)?)?;
        Ok(Self {
            path,
            archive: Mutex::new(archive),
            extension: extension.into(),
        })
    }

    /// Number of entries, directory markers included
    pub fn len(&self) -> usize {
        self.archive.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CodeSource for ArchiveSource {
    fn location(&self) -> String {
        format!("archive:{}", self.path.display())
    }

    fn fetch(&self, name: &str) -> Result<Option<Vec<u8>>, LoadError> {
        let Some(entry) = unit_path(name, &self.extension) else {
            return Ok(None);
        };
        let mut archive = self.archive.lock();
        let archive_error = |source: ZipError| LoadError::Archive {
            name: name.to_string(),
            location: self.location(),
            source,
        };

        let mut file = match archive.by_name(&entry) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(archive_error(e)),
        };
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)
            .map_err(|e| archive_error(ZipError::Io(e)))?;
        Ok(Some(bytes))
    }
}
