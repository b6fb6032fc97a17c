//! Interactive sessions and the registry holding the active one
//!
//! A session is the current interactive context: a resolver for the fragments
//! compiled so far plus the output tree they were compiled into. The driver
//! replaces it after each compile round; loaders and packagers read it.

use crate::loader::ModuleLoader;
use crate::resolver::UnitResolver;
use crate::source::DirectorySource;
use arc_swap::ArcSwapOption;
use replship_config::LoaderConfig;
use replship_vfs::VirtualFileSystem;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

const TARGET: &str = "replship::session";

pub struct Session {
    id: String,
    output: Arc<dyn VirtualFileSystem>,
    output_root: PathBuf,
    resolver: Arc<dyn UnitResolver>,
}

impl Session {
    pub fn new(
        id: impl Into<String>,
        output: Arc<dyn VirtualFileSystem>,
        output_root: impl Into<PathBuf>,
        resolver: Arc<dyn UnitResolver>,
    ) -> Self {
        Self {
            id: id.into(),
            output,
            output_root: output_root.into(),
            resolver,
        }
    }

    /// Session whose resolver reads units straight from its own output tree
    pub fn over_output(
        id: impl Into<String>,
        output: Arc<dyn VirtualFileSystem>,
        output_root: impl Into<PathBuf>,
        config: &LoaderConfig,
    ) -> Self {
        let id = id.into();
        let output_root = output_root.into();
        let resolver = ModuleLoader::builder(format!("session:{}", id))
            .location(DirectorySource::new(
                Arc::clone(&output),
                output_root.clone(),
                config.code_extension.clone(),
            ))
            .build();
        Self::new(id, output, output_root, Arc::new(resolver))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The tree compiled output is written into
    pub fn output(&self) -> &Arc<dyn VirtualFileSystem> {
        &self.output
    }

    /// Directory of the output tree that holds the compiled units
    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    pub fn resolver(&self) -> &Arc<dyn UnitResolver> {
        &self.resolver
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("output_root", &self.output_root)
            .field("resolver", &self.resolver.label())
            .finish()
    }
}

/// Holder of the single active session
///
/// `set` is one atomic pointer swap: readers see the old or the new session,
/// never a mix, and never wait on a writer. Last writer wins.
#[derive(Default)]
pub struct SessionRegistry {
    current: ArcSwapOption<Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            current: ArcSwapOption::empty(),
        }
    }

    /// Replace the active session, returning the one it displaced
    pub fn set(&self, session: Arc<Session>) -> Option<Arc<Session>> {
        let id = session.id().to_string();
        let previous = self.current.swap(Some(session));
        match &previous {
            Some(old) => info!(target: TARGET, session = %id, replaced = %old.id(), "session replaced"),
            None => info!(target: TARGET, session = %id, "session registered"),
        }
        previous
    }

    /// The active session, or `None`
    pub fn current(&self) -> Option<Arc<Session>> {
        self.current.load_full()
    }

    /// Drop the active session, returning it
    pub fn clear(&self) -> Option<Arc<Session>> {
        let previous = self.current.swap(None);
        if let Some(old) = &previous {
            info!(target: TARGET, session = %old.id(), "session cleared");
        }
        previous
    }

    pub fn is_active(&self) -> bool {
        self.current.load().is_some()
    }
}

impl fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("current", &self.current().map(|s| s.id().to_string()))
            .finish()
    }
}
