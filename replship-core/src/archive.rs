//! Ordered archive snapshots of an artifact tree
//!
//! Entries are written depth-first with every directory marker ahead of its
//! children, so a streaming reader can create directories before the files
//! inside them. Only leaves carrying the code extension are packaged.

use crate::error::BuildError;
use replship_config::{ArchiveConfig, Compression, DEFAULT_CODE_EXTENSION};
use replship_vfs::{VfsError, VirtualFileSystem};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, trace};
use zip::result::{ZipError, ZipResult};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const TARGET: &str = "replship::archive";

/// One archive entry, in write order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveEntry {
    /// Directory marker; the path ends with `/`
    Directory { path: String },
    Leaf { path: String, bytes: Vec<u8> },
}

impl ArchiveEntry {
    pub fn path(&self) -> &str {
        match self {
            ArchiveEntry::Directory { path } | ArchiveEntry::Leaf { path, .. } => path,
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, ArchiveEntry::Directory { .. })
    }
}

/// Receives entries in traversal order
trait EntrySink {
    fn directory(&mut self, path: &str) -> Result<(), BuildError>;
    fn leaf(&mut self, path: &str, bytes: Vec<u8>) -> Result<(), BuildError>;
}

impl EntrySink for Vec<ArchiveEntry> {
    fn directory(&mut self, path: &str) -> Result<(), BuildError> {
        self.push(ArchiveEntry::Directory {
            path: path.to_string(),
        });
        Ok(())
    }

    fn leaf(&mut self, path: &str, bytes: Vec<u8>) -> Result<(), BuildError> {
        self.push(ArchiveEntry::Leaf {
            path: path.to_string(),
            bytes,
        });
        Ok(())
    }
}

struct ZipSink {
    writer: ZipWriter<File>,
    method: CompressionMethod,
    dest: PathBuf,
    directories: usize,
    leaves: usize,
}

impl ZipSink {
    // Fixed timestamps keep archives of identical trees byte-identical
    fn options(&self) -> SimpleFileOptions {
        SimpleFileOptions::default()
            .compression_method(self.method)
            .last_modified_time(zip::DateTime::default())
    }

    fn write_error(&self, source: ZipError) -> BuildError {
        BuildError::Write {
            path: self.dest.clone(),
            source,
        }
    }
}

impl EntrySink for ZipSink {
    fn directory(&mut self, path: &str) -> Result<(), BuildError> {
        let options = self.options();
        self.writer
            .add_directory(path, options)
            .map_err(|e| self.write_error(e))?;
        self.directories += 1;
        Ok(())
    }

    fn leaf(&mut self, path: &str, bytes: Vec<u8>) -> Result<(), BuildError> {
        let options = self.options();
        self.writer
            .start_file(path, options)
            .map_err(|e| self.write_error(e))?;
        self.writer
            .write_all(&bytes)
            .map_err(|e| self.write_error(ZipError::Io(e)))?;
        self.leaves += 1;
        Ok(())
    }
}

/// Serializes an artifact tree into a zip archive
#[derive(Debug, Clone)]
pub struct ArchiveBuilder {
    extension: String,
    compression: Compression,
}

impl Default for ArchiveBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_CODE_EXTENSION)
    }
}

impl ArchiveBuilder {
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
            compression: Compression::default(),
        }
    }

    pub fn from_config(config: &ArchiveConfig) -> Self {
        Self::new(config.code_extension.clone()).with_compression(config.compression)
    }

    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Entries `build` would write for `root`, without touching disk
    pub fn plan(
        &self,
        tree: &dyn VirtualFileSystem,
        root: &Path,
    ) -> Result<Vec<ArchiveEntry>, BuildError> {
        let mut entries = Vec::new();
        self.walk(tree, root, "", true, &mut entries)?;
        Ok(entries)
    }

    /// Write the archive for `root` to `dest` and return `dest`.
    ///
    /// On error the file at `dest` may be left behind in an unusable state.
    #[instrument(
        target = "replship::archive",
        skip_all,
        fields(root = %root.display(), dest = %dest.display())
    )]
    pub fn build(
        &self,
        tree: &dyn VirtualFileSystem,
        root: &Path,
        dest: &Path,
    ) -> Result<PathBuf, BuildError> {
        let file = File::create(dest).map_err(|e| BuildError::Write {
            path: dest.to_path_buf(),
            source: ZipError::Io(e),
        })?;

        let mut sink = ZipSink {
            writer: ZipWriter::new(file),
            method: match self.compression {
                Compression::Stored => CompressionMethod::Stored,
                Compression::Deflated => CompressionMethod::Deflated,
            },
            dest: dest.to_path_buf(),
            directories: 0,
            leaves: 0,
        };

        // The writer is dropped on the error path, which closes the file
        self.walk(tree, root, "", true, &mut sink)?;

        let ZipSink {
            writer,
            directories,
            leaves,
            ..
        } = sink;
        writer.finish().map_err(|source| BuildError::Write {
            path: dest.to_path_buf(),
            source,
        })?;

        info!(target: TARGET, directories, leaves, "archive written");
        Ok(dest.to_path_buf())
    }

    fn walk(
        &self,
        tree: &dyn VirtualFileSystem,
        dir: &Path,
        prefix: &str,
        is_root: bool,
        sink: &mut dyn EntrySink,
    ) -> Result<(), BuildError> {
        let children = match tree.read_dir(dir) {
            Ok(children) => children,
            Err(e) if !is_root && vanished(&e) => {
                debug!(target: TARGET, path = %dir.display(), "directory vanished during build");
                return Ok(());
            }
            Err(source) => {
                return Err(BuildError::Tree {
                    path: dir.to_path_buf(),
                    source,
                })
            }
        };

        for child in children {
            let child_path = dir.join(&child.name);

            if child.is_dir() {
                let path = format!("{}{}/", prefix, child.name);
                sink.directory(&path)?;
                self.walk(tree, &child_path, &path, false, sink)?;
                continue;
            }

            if child.extension() != Some(self.extension.as_str()) {
                trace!(target: TARGET, path = %child_path.display(), "skipping non-code leaf");
                continue;
            }

            let bytes = match tree.read_file(&child_path) {
                Ok(bytes) => bytes,
                Err(e) if vanished(&e) => {
                    debug!(target: TARGET, path = %child_path.display(), "leaf vanished during build");
                    continue;
                }
                Err(source) => {
                    return Err(BuildError::Tree {
                        path: child_path,
                        source,
                    })
                }
            };
            sink.leaf(&format!("{}{}", prefix, child.name), bytes)?;
        }

        Ok(())
    }
}

fn vanished(err: &VfsError) -> bool {
    err.is_not_found()
}

/// Read back the entries of an archive in stored order
pub fn list_archive(path: &Path) -> ZipResult<Vec<ArchiveEntry>> {
    let mut archive = ZipArchive::new(File::open(path)?)?;
    let mut entries = Vec::with_capacity(archive.len());

    for index in 0..archive.len() {
        let mut file = archive.by_index(index)?;
        let name = file.name().to_string();
        if file.is_dir() {
            entries.push(ArchiveEntry::Directory { path: name });
        } else {
            let mut bytes = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut bytes)?;
            entries.push(ArchiveEntry::Leaf { path: name, bytes });
        }
    }

    Ok(entries)
}
