//! Durable file-backed client storage.

use okr_session::storage::{LEGACY_SELECTED_COMPANY_KEY, SELECTED_COMPANY_KEY};
use okr_session::{ClientStorage, FileStorage, SessionError};

#[test]
fn entries_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("client.json");

    let storage = FileStorage::open(&path).unwrap();
    assert_eq!(storage.get(SELECTED_COMPANY_KEY), None);
    storage
        .set(SELECTED_COMPANY_KEY, r#"{"id":"x","name":"Acme"}"#)
        .unwrap();
    storage.set(LEGACY_SELECTED_COMPANY_KEY, "x").unwrap();
    storage.remove(LEGACY_SELECTED_COMPANY_KEY).unwrap();
    drop(storage);

    let reopened = FileStorage::open(&path).unwrap();
    assert_eq!(
        reopened.get(SELECTED_COMPANY_KEY).as_deref(),
        Some(r#"{"id":"x","name":"Acme"}"#)
    );
    assert_eq!(reopened.get(LEGACY_SELECTED_COMPANY_KEY), None);
}

#[test]
fn empty_file_opens_as_empty_store() {
    let file = tempfile::NamedTempFile::new().unwrap();

    let storage = FileStorage::open(file.path()).unwrap();
    assert_eq!(storage.get(SELECTED_COMPANY_KEY), None);
}

#[test]
fn corrupt_file_is_a_storage_error() {
    let file = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(file.path(), "[1, 2").unwrap();

    let err = FileStorage::open(file.path()).unwrap_err();
    assert!(matches!(err, SessionError::Storage(_)));
}
