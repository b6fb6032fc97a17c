//! Subcommand implementations
//!
//! Each command returns the lines it wants printed so `main` owns all output.

use replship_config::ShipConfig;
use replship_core::{
    list_archive, ArchiveBuilder, ArchiveEntry, ArchiveSource, DirectorySource, ModuleLoader,
    Packager, Session, SessionRegistry, SystemPlatformProbe,
};
use replship_vfs::{NativeFileSystem, VirtualFileSystem};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::logging::CLI_TARGET;

pub type CommandResult = Result<Vec<String>, Box<dyn Error>>;

const SESSION_ID: &str = "cli";

/// Archive an on-disk output directory, or list what would be archived
pub fn pack(
    config: &ShipConfig,
    output: &Path,
    staging: Option<&Path>,
    dry_run: bool,
) -> CommandResult {
    if !output.is_dir() {
        return Err(format!("'{}' is not a directory", output.display()).into());
    }

    let tree: Arc<dyn VirtualFileSystem> = Arc::new(NativeFileSystem::new());
    let mut archive = config.archive.clone();
    if let Some(staging) = staging {
        archive.staging_root = Some(staging.to_path_buf());
    }

    if dry_run {
        let entries = ArchiveBuilder::from_config(&archive).plan(tree.as_ref(), output)?;
        return Ok(entries.iter().map(describe).collect());
    }

    let sessions = Arc::new(SessionRegistry::new());
    sessions.set(Arc::new(Session::over_output(
        SESSION_ID,
        tree,
        output,
        &config.loader,
    )));
    let path = Packager::from_config(sessions, &archive).build()?;
    Ok(vec![path.display().to_string()])
}

/// Resolve one unit name and report who answered
pub fn resolve(
    config: &ShipConfig,
    name: &str,
    session: Option<&Path>,
    classpath: &[PathBuf],
) -> CommandResult {
    let fs: Arc<dyn VirtualFileSystem> = Arc::new(NativeFileSystem::new());
    let extension = &config.loader.code_extension;

    let sessions = Arc::new(SessionRegistry::new());
    if let Some(dir) = session {
        sessions.set(Arc::new(Session::over_output(
            SESSION_ID,
            Arc::clone(&fs),
            dir,
            &config.loader,
        )));
    }

    let mut builder = ModuleLoader::builder(SESSION_ID)
        .sessions(sessions)
        .fragment_marker(config.loader.fragment_marker.clone());
    for entry in classpath {
        builder = if is_archive(entry) {
            debug!(target: CLI_TARGET, path = %entry.display(), "classpath archive");
            builder.location(ArchiveSource::open(entry, extension.clone())?)
        } else {
            debug!(target: CLI_TARGET, path = %entry.display(), "classpath directory");
            builder.location(DirectorySource::new(
                Arc::clone(&fs),
                entry.clone(),
                extension.clone(),
            ))
        };
    }
    let loader = builder
        .probe(SystemPlatformProbe::shared(&config.loader))
        .build();

    let unit = loader.load(name)?;
    Ok(vec![format!(
        "{} ({} bytes) defined by {}",
        unit.name(),
        unit.bytes().len(),
        unit.defined_by()
    )])
}

/// Print the entries of a built archive in stored order
pub fn list(archive: &Path) -> CommandResult {
    Ok(list_archive(archive)?.iter().map(describe).collect())
}

fn describe(entry: &ArchiveEntry) -> String {
    match entry {
        ArchiveEntry::Directory { path } => path.clone(),
        ArchiveEntry::Leaf { path, bytes } => format!("{} ({} bytes)", path, bytes.len()),
    }
}

fn is_archive(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("jar") | Some("zip")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use replship_core::LoadError;
    use std::fs;

    fn output_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("demo")).unwrap();
        fs::write(dir.path().join("demo/Main.class"), [0xCA, 0xFE]).unwrap();
        fs::write(dir.path().join("demo/Main.scala"), b"object Main").unwrap();
        dir
    }

    #[test]
    fn test_pack_dry_run_lists_plan() {
        let output = output_dir();
        let lines = pack(&ShipConfig::default(), output.path(), None, true).unwrap();
        assert_eq!(lines, vec!["demo/", "demo/Main.class (2 bytes)"]);
    }

    #[test]
    fn test_pack_then_list() {
        let output = output_dir();
        let staging = tempfile::tempdir().unwrap();

        let lines = pack(
            &ShipConfig::default(),
            output.path(),
            Some(staging.path()),
            false,
        )
        .unwrap();
        let archive = PathBuf::from(&lines[0]);
        assert!(archive.starts_with(staging.path()));

        let listed = list(&archive).unwrap();
        assert_eq!(listed, vec!["demo/", "demo/Main.class (2 bytes)"]);
    }

    #[test]
    fn test_pack_rejects_missing_directory() {
        let missing = tempfile::tempdir().unwrap().path().join("gone");
        assert!(pack(&ShipConfig::default(), &missing, None, true).is_err());
    }

    #[test]
    fn test_resolve_from_classpath_directory() {
        let output = output_dir();
        let lines = resolve(
            &ShipConfig::default(),
            "demo.Main",
            None,
            &[output.path().to_path_buf()],
        )
        .unwrap();
        assert_eq!(lines, vec!["demo.Main (2 bytes) defined by cli"]);
    }

    #[test]
    fn test_resolve_from_packed_archive() {
        let output = output_dir();
        let staging = tempfile::tempdir().unwrap();
        let archive = pack(
            &ShipConfig::default(),
            output.path(),
            Some(staging.path()),
            false,
        )
        .unwrap()
        .remove(0);

        let lines = resolve(
            &ShipConfig::default(),
            "demo.Main",
            None,
            &[PathBuf::from(archive)],
        )
        .unwrap();
        assert_eq!(lines, vec!["demo.Main (2 bytes) defined by cli"]);
    }

    #[test]
    fn test_resolve_fragment_from_session() {
        let session = tempfile::tempdir().unwrap();
        fs::create_dir_all(session.path().join("$line1")).unwrap();
        fs::write(session.path().join("$line1/$read.class"), [1, 2, 3]).unwrap();

        let lines = resolve(&ShipConfig::default(), "$line1.$read", Some(session.path()), &[])
            .unwrap();
        assert_eq!(lines, vec!["$line1.$read (3 bytes) defined by session:cli"]);
    }

    #[test]
    fn test_resolve_unknown_name_is_not_found() {
        let err = resolve(&ShipConfig::default(), "no.Such", None, &[]).unwrap_err();
        let load = err.downcast_ref::<LoadError>().unwrap();
        assert!(load.is_not_found());
    }
}
