use apodcache::cache::{CacheLocation, ContentHash, MetadataStore, StoreError, DB_FILE_NAME};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

#[test]
fn test_initialize_creates_nested_directories() {
    let dir = tempdir().unwrap();
    let location = CacheLocation::new(dir.path().join("a").join("b").join("cache")).unwrap();

    let store = MetadataStore::initialize(&location).unwrap();

    assert!(location.dir().is_dir());
    assert_eq!(store.db_path(), location.db_path());
    assert_eq!(store.count().unwrap(), 0);
}

#[test]
fn test_records_persist_across_initialize() {
    let dir = tempdir().unwrap();
    let location = CacheLocation::new(dir.path()).unwrap();
    let hash = ContentHash::of(b"horsehead");

    let id = {
        let store = MetadataStore::initialize(&location).unwrap();
        store
            .insert("Horsehead", "Dark nebula.", &dir.path().join("Horsehead.jpg"), &hash)
            .unwrap()
    };

    let store = MetadataStore::initialize(&location).unwrap();
    let record = store.find_by_hash(&hash).unwrap().unwrap();
    assert_eq!(record.id, id);
    assert_eq!(store.all_titles().unwrap(), vec!["Horsehead"]);
}

#[test]
fn test_corrupted_database_is_a_store_error() {
    let dir = tempdir().unwrap();
    let location = CacheLocation::new(dir.path()).unwrap();
    fs::write(location.db_path(), b"not a sqlite database, just garbage bytes").unwrap();

    let result = MetadataStore::initialize(&location);

    assert!(matches!(result, Err(StoreError::Database(_))));
}

#[test]
fn test_recovery_after_deleting_corrupted_database() {
    let dir = tempdir().unwrap();
    let location = CacheLocation::new(dir.path()).unwrap();
    fs::write(location.db_path(), b"corrupted garbage").unwrap();
    assert!(MetadataStore::initialize(&location).is_err());

    fs::remove_file(location.db_path()).unwrap();
    let store = MetadataStore::initialize(&location).expect("fresh database after removal");
    assert_eq!(store.count().unwrap(), 0);
}

#[test]
fn test_unreachable_database_is_a_store_error() {
    let dir = tempdir().unwrap();
    let location = CacheLocation::new(dir.path()).unwrap();
    // A directory where the database file should be
    fs::create_dir(dir.path().join(DB_FILE_NAME)).unwrap();

    assert!(MetadataStore::initialize(&location).is_err());
}

#[test]
fn test_cache_dir_blocked_by_file() {
    let dir = tempdir().unwrap();
    let blocker = dir.path().join("cache");
    fs::write(&blocker, b"i am a file").unwrap();
    let location = CacheLocation::new(&blocker).unwrap();

    let result = MetadataStore::initialize(&location);

    assert!(matches!(result, Err(StoreError::Io { .. })));
}

#[test]
fn test_get_by_id_miss() {
    let dir = tempdir().unwrap();
    let store = MetadataStore::initialize(&CacheLocation::new(dir.path()).unwrap()).unwrap();

    assert!(store.get_by_id(1).unwrap().is_none());
    assert!(store.list().unwrap().is_empty());
}

#[test]
fn test_ids_not_reused_after_external_delete() {
    let dir = tempdir().unwrap();
    let store = MetadataStore::initialize(&CacheLocation::new(dir.path()).unwrap()).unwrap();

    let first = store
        .insert("One", "1", Path::new("/tmp/One.jpg"), &ContentHash::of(b"1"))
        .unwrap();
    let conn = rusqlite::Connection::open(store.db_path()).unwrap();
    conn.execute("DELETE FROM image_apod", []).unwrap();
    drop(conn);

    let second = store
        .insert("Two", "2", Path::new("/tmp/Two.jpg"), &ContentHash::of(b"2"))
        .unwrap();
    assert!(second > first);
}
