//! Filename Boundary Tests
//!
//! - A name that fails the grammar is rejected before any filesystem access
//! - No accepted name can resolve outside the profile directory
//! - Rejection is identical for read, write and delete

mod common;

use common::{open_profile_store, profile_bytes};
use profile_gateway::naming::{DocumentKind, FilenameError, FilenameGuard};
use profile_gateway::store::StoreError;
use std::fs;
use tempfile::TempDir;

// =============================================================================
// Test Utilities
// =============================================================================

const HOSTILE_NAMES: &[&str] = &[
    "",
    "../outside.a7p",
    "../../etc/passwd",
    "..%2Foutside.a7p",
    "sub/inner.a7p",
    "a.a7p/../b",
    "a.a7p/../b.a7p",
    "/abs/path.a7p",
    "\\windows.a7p",
    ".hidden.a7p",
    "-dash.a7p",
    "_under.a7p",
    " space.a7p",
    "profile.a7p/",
    "profile.a7p\n",
    "profile.txt",
    "profile.A7P",
    "profile.a7p.bak",
    "pro\0file.a7p",
    "prof:ile.a7p",
    "archive.tar",
];

/// Directory layout: `<temp>/profiles` is the store, `<temp>/outside.a7p` a
/// decoy a traversal would hit.
fn store_with_decoy() -> (TempDir, profile_gateway::store::DocumentStore) {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("outside.a7p"), b"decoy").unwrap();
    let store = open_profile_store(&temp.path().join("profiles"));
    (temp, store)
}

// =============================================================================
// Grammar
// =============================================================================

#[test]
fn test_hostile_names_fail_grammar() {
    for name in HOSTILE_NAMES {
        assert!(
            FilenameGuard::validate(name, DocumentKind::Profile).is_err(),
            "accepted hostile name {:?}",
            name
        );
    }
}

#[test]
fn test_ordinary_names_pass_grammar() {
    for name in ["profile1.a7p", "a.a7p", "My Rifle 308.a7p", "x_1-2.v3.a7p", "9.a7p", "a..a7p"] {
        let validated = FilenameGuard::validate(name, DocumentKind::Profile).unwrap();
        assert_eq!(validated.as_str(), name);
    }
}

#[test]
fn test_empty_name_has_own_error() {
    assert!(matches!(
        FilenameGuard::validate("", DocumentKind::Profile),
        Err(FilenameError::Empty)
    ));
}

#[test]
fn test_kinds_do_not_cross() {
    assert!(FilenameGuard::validate("reticles.tar", DocumentKind::Archive).is_ok());
    assert!(FilenameGuard::validate("reticles.tar", DocumentKind::Profile).is_err());
    assert!(FilenameGuard::validate("p.a7p", DocumentKind::Archive).is_err());
}

// =============================================================================
// No Filesystem Effect
// =============================================================================

/// Writes under hostile names create nothing anywhere.
#[test]
fn test_rejected_write_has_no_effect() {
    let (temp, store) = store_with_decoy();

    for name in HOSTILE_NAMES {
        assert!(matches!(
            store.write(name, &profile_bytes()),
            Err(StoreError::InvalidFilename(_))
        ));
    }

    assert_eq!(fs::read(temp.path().join("outside.a7p")).unwrap(), b"decoy");
    assert_eq!(fs::read_dir(temp.path().join("profiles")).unwrap().count(), 0);
    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 2);
}

#[test]
fn test_rejected_delete_has_no_effect() {
    let (temp, store) = store_with_decoy();

    for name in HOSTILE_NAMES {
        assert!(matches!(store.delete(name), Err(StoreError::InvalidFilename(_))));
    }
    assert!(temp.path().join("outside.a7p").exists());
}

/// Reads of hostile names never report what lies outside the directory.
#[test]
fn test_rejected_read_reveals_nothing() {
    let (_temp, store) = store_with_decoy();

    for name in HOSTILE_NAMES {
        assert!(matches!(store.read(name), Err(StoreError::InvalidFilename(_))));
    }
}

/// Files in the directory that fail the grammar are invisible to listing.
#[test]
fn test_listing_skips_foreign_entries() {
    let temp = TempDir::new().unwrap();
    let store = open_profile_store(temp.path());

    store.write("kept.a7p", &profile_bytes()).unwrap();
    fs::write(temp.path().join("notes.txt"), b"x").unwrap();
    fs::write(temp.path().join(".kept.a7p.123.tmp"), b"x").unwrap();
    fs::create_dir(temp.path().join("dir.a7p")).unwrap();

    let names: Vec<String> = store
        .list()
        .unwrap()
        .map(|n| n.unwrap().into_string())
        .collect();
    assert_eq!(names, vec!["kept.a7p".to_string()]);
}
