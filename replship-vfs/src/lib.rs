//! Replship Virtual File System
//!
//! The artifact tree a compiler writes its output into: a hierarchy of named
//! directories and byte-content leaves, with an in-memory and a native backend.
//!
//! # Usage
//! ```rust,ignore
//! use replship_vfs::{VirtualFileSystem, MemoryFileSystem};
//! use std::path::Path;
//!
//! let fs = MemoryFileSystem::new();
//! fs.write_file(Path::new("/a/B.class"), &[1, 2, 3]).unwrap();
//! let entries = fs.read_dir(Path::new("/a")).unwrap();
//! ```

mod error;
mod memory;
mod native;
mod r#trait;

pub use error::{VfsError, VfsResult};
pub use memory::MemoryFileSystem;
pub use native::NativeFileSystem;
pub use r#trait::{DirEntry, EntryKind, VirtualFileSystem};
