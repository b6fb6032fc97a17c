//! Shared fixtures for replship-core integration tests

#![allow(dead_code)]

use replship_core::{CodeUnit, LoadError, LoaderConfig, Session, SessionRegistry, UnitResolver};
use replship_vfs::{MemoryFileSystem, VirtualFileSystem};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Resolver over a fixed name → bytes table that records how often it was asked
pub struct RecordingResolver {
    label: String,
    units: HashMap<String, Vec<u8>>,
    calls: AtomicUsize,
}

impl RecordingResolver {
    pub fn new(label: &str, units: &[(&str, &[u8])]) -> Arc<Self> {
        Arc::new(Self {
            label: label.to_string(),
            units: units
                .iter()
                .map(|(name, bytes)| (name.to_string(), bytes.to_vec()))
                .collect(),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn empty(label: &str) -> Arc<Self> {
        Self::new(label, &[])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl UnitResolver for RecordingResolver {
    fn label(&self) -> &str {
        &self.label
    }

    fn resolve(&self, name: &str) -> Result<Arc<CodeUnit>, LoadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.units
            .get(name)
            .map(|bytes| Arc::new(CodeUnit::new(name, bytes.clone(), self.label.clone())))
            .ok_or_else(|| LoadError::not_found(name))
    }
}

/// Register a session answered by `resolver`, over an in-memory output tree
pub fn register_session(
    sessions: &SessionRegistry,
    id: &str,
    resolver: Arc<dyn UnitResolver>,
    files: &[(&str, &[u8])],
) -> Arc<MemoryFileSystem> {
    let tree = Arc::new(output_tree(files));
    let output: Arc<dyn VirtualFileSystem> = tree.clone();
    sessions.set(Arc::new(Session::new(id, output, "/out", resolver)));
    tree
}

/// Register a session whose resolver reads from its own output tree
pub fn register_output_session(
    sessions: &SessionRegistry,
    id: &str,
    files: &[(&str, &[u8])],
) -> Arc<MemoryFileSystem> {
    let tree = Arc::new(output_tree(files));
    let output: Arc<dyn VirtualFileSystem> = tree.clone();
    sessions.set(Arc::new(Session::over_output(
        id,
        output,
        "/out",
        &LoaderConfig::default(),
    )));
    tree
}

/// In-memory tree with every path placed under `/out`
pub fn output_tree(files: &[(&str, &[u8])]) -> MemoryFileSystem {
    MemoryFileSystem::with_files(
        files
            .iter()
            .map(|(path, bytes)| (format!("/out/{}", path), bytes.to_vec())),
    )
}
