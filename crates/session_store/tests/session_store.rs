use std::fs;
use std::path::PathBuf;

use session_store::{session_file_path, SessionStore, SessionStoreError, StoredSession};
use tempfile::TempDir;

fn temp_store() -> (TempDir, SessionStore) {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let store = SessionStore::new(&dir.path().join("relay-home"));
    (dir, store)
}

fn write_raw(store: &SessionStore, contents: &str) -> PathBuf {
    let path = store.path().to_path_buf();
    fs::create_dir_all(path.parent().expect("session file has a parent"))
        .expect("session dir should be created");
    fs::write(&path, contents).expect("session file should be written");
    path
}

#[test]
fn load_missing_file_is_empty_session() {
    let (_dir, store) = temp_store();

    let session = store.load().expect("missing file must load");
    assert_eq!(session, StoredSession::default());
    assert!(!store.is_logged_in().expect("logged-in check"));
}

#[test]
fn save_then_load_preserves_tokens_and_expiry() {
    let (_dir, store) = temp_store();
    let session = StoredSession::new("access", "refresh", "user-1")
        .with_expires_at_unix(1_705_311_000)
        .expect("valid expiry");

    store.save(&session).expect("save should succeed");

    assert_eq!(store.load().expect("load"), session);
    assert!(store.is_logged_in().expect("logged-in check"));
}

#[test]
fn save_creates_parent_directory_and_leaves_no_temp_file() {
    let (dir, store) = temp_store();
    store
        .save(&StoredSession::new("a", "r", "u"))
        .expect("save should succeed");

    let root = dir.path().join("relay-home");
    assert_eq!(store.path(), session_file_path(&root));
    let entries: Vec<String> = fs::read_dir(&root)
        .expect("session dir exists")
        .map(|entry| {
            entry
                .expect("dir entry")
                .file_name()
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    assert_eq!(entries, vec!["session.json".to_owned()]);
}

#[cfg(unix)]
#[test]
fn save_restricts_file_permissions() {
    use std::os::unix::fs::PermissionsExt;

    let (_dir, store) = temp_store();
    store
        .save(&StoredSession::new("a", "r", "u"))
        .expect("save should succeed");

    let mode = fs::metadata(store.path())
        .expect("metadata")
        .permissions()
        .mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[test]
fn clear_empties_tokens() {
    let (_dir, store) = temp_store();
    store
        .save(&StoredSession::new("a", "r", "u"))
        .expect("save should succeed");

    store.clear().expect("clear should succeed");

    let session = store.load().expect("load");
    assert!(!session.is_logged_in());
    assert_eq!(session.user_id(), None);
    assert!(!session.can_refresh());
}

#[test]
fn load_tolerates_missing_fields_and_blank_file() {
    let (_dir, store) = temp_store();

    write_raw(&store, r#"{"access_token":"a"}"#);
    let session = store.load().expect("partial file loads");
    assert!(session.is_logged_in());
    assert_eq!(session.user_id(), None);

    write_raw(&store, "  \n");
    assert_eq!(store.load().expect("blank file loads"), StoredSession::default());
}

#[test]
fn load_rejects_malformed_json() {
    let (_dir, store) = temp_store();
    write_raw(&store, "{not json");

    let error = store.load().expect_err("malformed file must fail");
    assert!(matches!(error, SessionStoreError::JsonParse { .. }));
}

#[test]
fn load_rejects_invalid_expiry_timestamp() {
    let (_dir, store) = temp_store();
    write_raw(
        &store,
        r#"{"access_token":"a","refresh_token":"r","user_id":"u","expires_at":"tomorrow"}"#,
    );

    let error = store.load().expect_err("invalid timestamp must fail");
    assert!(matches!(
        error,
        SessionStoreError::InvalidTimestamp { field: "expires_at", .. }
    ));
}
