//! On-demand archive builds of the active session's output

use crate::archive::ArchiveBuilder;
use crate::error::BuildError;
use crate::session::SessionRegistry;
use crate::workspace::WorkspaceAllocator;
use replship_config::ArchiveConfig;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, instrument};

const TARGET: &str = "replship::archive";

/// Snapshots the active session's output tree into a fresh staging directory
#[derive(Debug)]
pub struct Packager {
    sessions: Arc<SessionRegistry>,
    allocator: WorkspaceAllocator,
    builder: ArchiveBuilder,
    archive_name: String,
}

impl Packager {
    pub fn new(
        sessions: Arc<SessionRegistry>,
        allocator: WorkspaceAllocator,
        builder: ArchiveBuilder,
        archive_name: impl Into<String>,
    ) -> Self {
        Self {
            sessions,
            allocator,
            builder,
            archive_name: archive_name.into(),
        }
    }

    pub fn from_config(sessions: Arc<SessionRegistry>, config: &ArchiveConfig) -> Self {
        Self::new(
            sessions,
            WorkspaceAllocator::from_config(config),
            ArchiveBuilder::from_config(config),
            config.archive_name.clone(),
        )
    }

    pub fn builder(&self) -> &ArchiveBuilder {
        &self.builder
    }

    /// Build an archive of the current session and return its path.
    ///
    /// Every call writes into a new directory, so archives returned by
    /// earlier calls stay untouched.
    #[instrument(target = "replship::archive", skip(self))]
    pub fn build(&self) -> Result<PathBuf, BuildError> {
        let session = self.sessions.current().ok_or(BuildError::NoSession)?;
        let workspace = self.allocator.allocate()?;
        let dest = workspace.path().join(&self.archive_name);

        let path = self.builder.build(
            session.output().as_ref(),
            session.output_root(),
            &dest,
        )?;
        info!(
            target: TARGET,
            session = %session.id(),
            path = %path.display(),
            "session archive ready"
        );
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::{list_archive, ArchiveEntry};
    use crate::session::Session;
    use replship_config::LoaderConfig;
    use replship_vfs::{MemoryFileSystem, VirtualFileSystem};

    fn packager(staging: &std::path::Path, sessions: Arc<SessionRegistry>) -> Packager {
        Packager::new(
            sessions,
            WorkspaceAllocator::new(staging, "test"),
            ArchiveBuilder::new("class"),
            "session.jar",
        )
    }

    fn register(sessions: &SessionRegistry, files: Vec<(&str, Vec<u8>)>) {
        let output: Arc<dyn VirtualFileSystem> = Arc::new(MemoryFileSystem::with_files(files));
        sessions.set(Arc::new(Session::over_output(
            "s1",
            output,
            "/out",
            &LoaderConfig::default(),
        )));
    }

    #[test]
    fn test_build_without_session_fails_before_allocating() {
        let staging = tempfile::tempdir().unwrap();
        let packager = packager(staging.path(), Arc::new(SessionRegistry::new()));

        let err = packager.build().unwrap_err();
        assert!(matches!(err, BuildError::NoSession));
        assert_eq!(std::fs::read_dir(staging.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_builds_land_in_distinct_directories() {
        let staging = tempfile::tempdir().unwrap();
        let sessions = Arc::new(SessionRegistry::new());
        register(&sessions, vec![("/out/a/B.class", vec![1, 2, 3])]);
        let packager = packager(staging.path(), Arc::clone(&sessions));

        let first = packager.build().unwrap();
        let second = packager.build().unwrap();

        assert_ne!(first, second);
        assert_ne!(first.parent(), second.parent());
        assert_eq!(first.file_name(), second.file_name());
        assert_eq!(list_archive(&first).unwrap(), list_archive(&second).unwrap());
    }

    #[test]
    fn test_build_uses_latest_session() {
        let staging = tempfile::tempdir().unwrap();
        let sessions = Arc::new(SessionRegistry::new());
        let packager = packager(staging.path(), Arc::clone(&sessions));

        register(&sessions, vec![("/out/Old.class", vec![0])]);
        register(&sessions, vec![("/out/New.class", vec![1])]);

        let entries = list_archive(&packager.build().unwrap()).unwrap();
        assert_eq!(
            entries,
            vec![ArchiveEntry::Leaf {
                path: "New.class".to_string(),
                bytes: vec![1],
            }]
        );
    }

    #[test]
    fn test_from_config() {
        let staging = tempfile::tempdir().unwrap();
        let config = ArchiveConfig {
            archive_name: "out.zip".to_string(),
            staging_root: Some(staging.path().to_path_buf()),
            ..Default::default()
        };
        let sessions = Arc::new(SessionRegistry::new());
        register(&sessions, vec![("/out/A.class", vec![1])]);

        let path = Packager::from_config(sessions, &config).build().unwrap();
        assert!(path.starts_with(staging.path()));
        assert_eq!(path.file_name().unwrap(), "out.zip");
    }
}
