use std::fs;

use dq_fetch::{FetchError, LocalStore, ObjectLocation, ObjectStore};

fn bucket_with(object: &str, contents: &[u8]) -> tempfile::TempDir {
    let root = tempfile::tempdir().expect("temp root");
    let path = root.path().join("uploads").join(object);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, contents).unwrap();
    root
}

#[test]
fn fetch_produces_identical_bytes() {
    let contents = b"salary,year\n100000,2024\n\xef\xbb\xbfodd bytes,2023\n";
    let root = bucket_with("surveys/salaries.csv", contents);
    let store = LocalStore::new(root.path());
    let out = tempfile::tempdir().unwrap();
    let destination = out.path().join("downloads").join("salaries.csv");

    let location = ObjectLocation::new("uploads", "surveys/salaries.csv").unwrap();
    let report = store.fetch(&location, &destination).expect("fetch");

    assert_eq!(fs::read(&destination).unwrap(), contents);
    assert_eq!(report.bytes, contents.len() as u64);
    assert_eq!(report.destination, destination);
}

#[test]
fn fetch_twice_yields_the_same_digest() {
    let root = bucket_with("a.csv", b"a\n1\n");
    let store = LocalStore::new(root.path());
    let out = tempfile::tempdir().unwrap();
    let destination = out.path().join("a.csv");
    let location = ObjectLocation::new("uploads", "a.csv").unwrap();

    let first = store.fetch(&location, &destination).unwrap();
    let second = store.fetch(&location, &destination).unwrap();
    assert_eq!(first.sha256, second.sha256);
}

#[test]
fn missing_object_is_not_found() {
    let root = bucket_with("a.csv", b"a\n1\n");
    let store = LocalStore::new(root.path());
    let out = tempfile::tempdir().unwrap();
    let location = ObjectLocation::new("uploads", "missing.csv").unwrap();

    let err = store
        .fetch(&location, &out.path().join("x.csv"))
        .unwrap_err();
    assert!(matches!(err, FetchError::NotFound { .. }));
    assert!(!out.path().join("x.csv").exists());
}

#[test]
fn parent_traversal_is_rejected() {
    let root = bucket_with("a.csv", b"a\n1\n");
    let store = LocalStore::new(root.path());
    let location = ObjectLocation::new("uploads", "../outside.csv").unwrap();
    let err = store.object_path(&location).unwrap_err();
    assert!(matches!(err, FetchError::InvalidLocation(_)));
}

#[test]
fn unwritable_destination_is_reported() {
    let root = bucket_with("a.csv", b"a\n1\n");
    let store = LocalStore::new(root.path());
    let out = tempfile::tempdir().unwrap();
    // A regular file where a directory is needed.
    let blocker = out.path().join("blocker");
    fs::write(&blocker, "x").unwrap();
    let location = ObjectLocation::new("uploads", "a.csv").unwrap();

    let err = store
        .fetch(&location, &blocker.join("a.csv"))
        .unwrap_err();
    assert!(matches!(err, FetchError::Destination { .. }));
}
