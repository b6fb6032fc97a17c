//! End-to-end resolution and archive build scenarios

mod common;

use common::{output_tree, register_output_session, register_session, RecordingResolver};
use replship_core::{
    list_archive, ArchiveBuilder, ArchiveEntry, ArchiveSource, BuildError, ModuleLoader,
    NoPlatform, Packager, SessionRegistry, UnitResolver, WorkspaceAllocator,
};
use std::path::Path;
use std::sync::Arc;

const FRAGMENT: &str = "$line3.$read";

fn packager(staging: &Path, sessions: Arc<SessionRegistry>) -> Packager {
    Packager::new(
        sessions,
        WorkspaceAllocator::new(staging, "it"),
        ArchiveBuilder::new("class"),
        "session.jar",
    )
}

#[test]
fn test_fragment_answered_by_session_skips_parent() {
    let sessions = Arc::new(SessionRegistry::new());
    let session = RecordingResolver::new("session", &[(FRAGMENT, b"fresh")]);
    register_session(&sessions, "s1", session.clone(), &[]);

    let parent = RecordingResolver::new("parent", &[(FRAGMENT, b"stale")]);
    let loader = ModuleLoader::builder("repl")
        .sessions(Arc::clone(&sessions))
        .parent(parent.clone())
        .probe(&NoPlatform)
        .build();

    let unit = loader.load(FRAGMENT).unwrap();
    assert_eq!(unit.bytes(), b"fresh");
    assert_eq!(session.calls(), 1);
    assert_eq!(parent.calls(), 0);
}

#[test]
fn test_fragment_missed_by_session_falls_back_to_parent() {
    let sessions = Arc::new(SessionRegistry::new());
    let session = RecordingResolver::empty("session");
    register_session(&sessions, "s1", session.clone(), &[]);

    let parent = RecordingResolver::new("parent", &[(FRAGMENT, b"parent")]);
    let loader = ModuleLoader::builder("repl")
        .sessions(Arc::clone(&sessions))
        .parent(parent.clone())
        .build();

    assert_eq!(loader.load(FRAGMENT).unwrap().bytes(), b"parent");
    assert_eq!(session.calls(), 1);
    assert_eq!(parent.calls(), 1);
}

#[test]
fn test_fragment_without_session_falls_back_then_not_found() {
    let sessions = Arc::new(SessionRegistry::new());
    let parent = RecordingResolver::empty("parent");
    let loader = ModuleLoader::builder("repl")
        .sessions(sessions)
        .parent(parent.clone())
        .build();

    let err = loader.load(FRAGMENT).unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(parent.calls(), 1);
}

#[test]
fn test_plain_names_never_reach_session() {
    let sessions = Arc::new(SessionRegistry::new());
    let session = RecordingResolver::new("session", &[("scala.Option", b"session")]);
    register_session(&sessions, "s1", session.clone(), &[]);

    let parent = RecordingResolver::new("parent", &[("scala.Option", b"parent")]);
    let loader = ModuleLoader::builder("repl")
        .sessions(sessions)
        .parent(parent.clone())
        .build();

    assert_eq!(loader.load("scala.Option").unwrap().bytes(), b"parent");
    assert!(loader.load("scala.Missing").unwrap_err().is_not_found());
    assert_eq!(session.calls(), 0);
}

#[test]
fn test_replaced_session_answers_next_lookup() {
    let sessions = Arc::new(SessionRegistry::new());
    register_output_session(&sessions, "round1", &[("$line1/$read.class", b"one")]);

    let loader = ModuleLoader::builder("repl")
        .sessions(Arc::clone(&sessions))
        .build();
    assert_eq!(loader.load("$line1.$read").unwrap().bytes(), b"one");

    register_output_session(&sessions, "round2", &[("$line2/$read.class", b"two")]);
    assert_eq!(loader.load("$line2.$read").unwrap().bytes(), b"two");
    assert!(loader.load("$line1.$read").unwrap_err().is_not_found());
}

#[test]
fn test_two_builds_produce_distinct_archives() {
    let staging = tempfile::tempdir().unwrap();
    let sessions = Arc::new(SessionRegistry::new());
    register_output_session(&sessions, "s1", &[("a/B.class", &[1, 2, 3])]);
    let packager = packager(staging.path(), sessions);

    let first = packager.build().unwrap();
    let second = packager.build().unwrap();
    assert_ne!(first, second);
    assert!(first.exists());
    assert!(second.exists());
}

#[test]
fn test_example_tree_yields_marker_then_leaf() {
    let staging = tempfile::tempdir().unwrap();
    let sessions = Arc::new(SessionRegistry::new());
    register_output_session(
        &sessions,
        "s1",
        &[("a/B.class", &[1, 2, 3]), ("a/notes.txt", b"ignored")],
    );

    let archive = packager(staging.path(), sessions).build().unwrap();
    assert_eq!(
        list_archive(&archive).unwrap(),
        vec![
            ArchiveEntry::Directory {
                path: "a/".to_string()
            },
            ArchiveEntry::Leaf {
                path: "a/B.class".to_string(),
                bytes: vec![1, 2, 3],
            },
        ]
    );
}

#[test]
fn test_directories_precede_descendants_and_bytes_match() {
    let files: &[(&str, &[u8])] = &[
        ("p/q/r/Deep.class", b"deep"),
        ("p/Shallow.class", b"shallow"),
        ("p/q/Mid.class", b"mid"),
        ("p/q/Mid.scala", b"source"),
        ("z/Last.class", b"last"),
        ("README", b"docs"),
    ];
    let staging = tempfile::tempdir().unwrap();
    let sessions = Arc::new(SessionRegistry::new());
    register_output_session(&sessions, "s1", files);

    let entries = list_archive(&packager(staging.path(), sessions).build().unwrap()).unwrap();

    for (index, entry) in entries.iter().enumerate() {
        if entry.is_dir() {
            assert!(entries[..index]
                .iter()
                .all(|earlier| !earlier.path().starts_with(entry.path())));
        } else {
            let dir_prefix = entry.path().rsplit_once('/').map(|(dir, _)| format!("{}/", dir));
            if let Some(prefix) = dir_prefix {
                assert!(entries[..index].iter().any(|e| e.path() == prefix));
            }
        }
    }

    let mut actual: Vec<_> = entries
        .iter()
        .filter_map(|e| match e {
            ArchiveEntry::Leaf { path, bytes } => Some((path.as_str(), bytes.as_slice())),
            ArchiveEntry::Directory { .. } => None,
        })
        .collect();
    let mut expected: Vec<_> = files
        .iter()
        .filter(|(path, _)| path.ends_with(".class"))
        .map(|(path, bytes)| (*path, *bytes))
        .collect();
    expected.sort();
    actual.sort();
    assert_eq!(actual, expected);
    assert!(entries.iter().all(|e| e.is_dir() || e.path().ends_with(".class")));
}

#[test]
fn test_build_without_session_is_refused() {
    let staging = tempfile::tempdir().unwrap();
    let err = packager(staging.path(), Arc::new(SessionRegistry::new()))
        .build()
        .unwrap_err();

    assert!(matches!(err, BuildError::NoSession));
    assert!(err.is_configuration());
    assert_eq!(std::fs::read_dir(staging.path()).unwrap().count(), 0);
}

#[test]
fn test_built_archive_serves_as_code_source() {
    let staging = tempfile::tempdir().unwrap();
    let sessions = Arc::new(SessionRegistry::new());
    register_output_session(
        &sessions,
        "s1",
        &[("$line4/$read.class", b"fragment"), ("util/Helper.class", b"helper")],
    );
    let archive = packager(staging.path(), sessions).build().unwrap();

    let worker = ModuleLoader::builder("worker")
        .location(ArchiveSource::open(&archive, "class").unwrap())
        .build();
    assert_eq!(worker.load("util.Helper").unwrap().bytes(), b"helper");
    assert_eq!(worker.load("$line4.$read").unwrap().defined_by(), "worker");
    assert!(worker.load("util.Missing").unwrap_err().is_not_found());
}

#[test]
fn test_concurrent_resolution_defines_each_name_once() {
    let tree = Arc::new(output_tree(&[("shared/Unit.class", b"bytes")]));
    let loader = Arc::new(
        ModuleLoader::builder("repl")
            .location(replship_core::DirectorySource::new(tree, "/out", "class"))
            .build(),
    );

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let loader = Arc::clone(&loader);
            std::thread::spawn(move || loader.resolve("shared.Unit").unwrap())
        })
        .collect();
    let units: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert!(units.iter().all(|u| Arc::ptr_eq(u, &units[0])));
    assert_eq!(loader.defined_count(), 1);
}
