use super::support::{image_files, ymd, FakeApod};
use apodcache::cache::{CacheLocation, ContentHash};
use apodcache::cache::StoreError;
use apodcache::manager::{derive_path, derive_qualified_path, CacheError, CacheManager};
use std::fs;
use tempfile::tempdir;

const URL: &str = "https://apod.nasa.gov/apod/image/1901/aurora.jpg";

#[test]
fn test_same_title_different_content_gets_qualified_name() {
    let dir = tempdir().unwrap();
    let apod = FakeApod::new()
        .with_image(ymd(2019, 1, 1), "Aurora", URL, b"first aurora")
        .with_image(ymd(2020, 1, 1), "Aurora", URL, b"second aurora");
    let manager = CacheManager::open(CacheLocation::new(dir.path()).unwrap(), &apod).unwrap();

    let first = manager.ensure_cached(ymd(2019, 1, 1)).unwrap();
    let second = manager.ensure_cached(ymd(2020, 1, 1)).unwrap();

    assert_ne!(first.id, second.id);
    assert!(first.file_path.ends_with("Aurora.jpg"));
    let expected = format!("Aurora_{}.jpg", ContentHash::of(b"second aurora").short());
    assert!(second.file_path.ends_with(&expected));

    // The first image is untouched
    assert_eq!(fs::read(&first.file_path).unwrap(), b"first aurora");
    assert_eq!(fs::read(&second.file_path).unwrap(), b"second aurora");
}

#[test]
fn test_orphaned_file_with_same_content_is_reused() {
    let dir = tempdir().unwrap();
    let location = CacheLocation::new(dir.path()).unwrap();
    let apod = FakeApod::new().with_image(ymd(2019, 1, 1), "Aurora", URL, b"aurora bytes");
    let manager = CacheManager::open(location.clone(), &apod).unwrap();

    // Left behind by a run whose insert failed
    let orphan = derive_path(location.dir(), "Aurora", URL);
    fs::write(&orphan, b"aurora bytes").unwrap();

    let record = manager.ensure_cached(ymd(2019, 1, 1)).unwrap();

    assert_eq!(record.file_path, orphan);
    assert_eq!(image_files(location.dir()).len(), 1);
    assert_eq!(manager.store().count().unwrap(), 1);
}

#[test]
fn test_unrelated_files_on_every_name_is_a_collision() {
    let dir = tempdir().unwrap();
    let location = CacheLocation::new(dir.path()).unwrap();
    let apod = FakeApod::new().with_image(ymd(2019, 1, 1), "Aurora", URL, b"aurora bytes");
    let manager = CacheManager::open(location.clone(), &apod).unwrap();

    let hash = ContentHash::of(b"aurora bytes");
    let plain = derive_path(location.dir(), "Aurora", URL);
    let qualified = derive_qualified_path(location.dir(), "Aurora", URL, &hash);
    fs::write(&plain, b"someone else's file").unwrap();
    fs::write(&qualified, b"another stranger").unwrap();

    let err = manager.ensure_cached(ymd(2019, 1, 1)).unwrap_err();

    assert!(matches!(err, CacheError::FileCollision { ref path } if *path == plain));
    assert_eq!(manager.store().count().unwrap(), 0);
    // Nothing was overwritten
    assert_eq!(fs::read(&plain).unwrap(), b"someone else's file");
    assert_eq!(fs::read(&qualified).unwrap(), b"another stranger");
}

#[test]
fn test_failed_insert_leaves_orphan_that_next_run_reuses() {
    let dir = tempdir().unwrap();
    let location = CacheLocation::new(dir.path()).unwrap();
    let apod = FakeApod::new().with_image(ymd(2019, 1, 1), "Aurora", URL, b"aurora bytes");
    let manager = CacheManager::open(location.clone(), &apod).unwrap();

    // Lookups still work, every insert is refused
    let conn = rusqlite::Connection::open(location.db_path()).unwrap();
    conn.execute_batch(
        "CREATE TRIGGER refuse_insert BEFORE INSERT ON image_apod
         BEGIN SELECT RAISE(ABORT, 'database or disk is full'); END;",
    )
    .unwrap();

    let err = manager.ensure_cached(ymd(2019, 1, 1)).unwrap_err();

    assert!(matches!(err, CacheError::Store(StoreError::Database(_))));
    assert_eq!(manager.store().count().unwrap(), 0);
    let orphan = derive_path(location.dir(), "Aurora", URL);
    assert_eq!(fs::read(&orphan).unwrap(), b"aurora bytes");

    conn.execute_batch("DROP TRIGGER refuse_insert;").unwrap();
    drop(conn);

    let record = manager.ensure_cached(ymd(2019, 1, 1)).unwrap();

    assert_eq!(record.file_path, orphan);
    assert_eq!(image_files(location.dir()), vec![orphan]);
    assert_eq!(manager.store().count().unwrap(), 1);
}

#[test]
fn test_failed_file_write_commits_nothing() {
    let dir = tempdir().unwrap();
    let location = CacheLocation::new(dir.path()).unwrap();
    let apod = FakeApod::new().with_image(ymd(2019, 1, 1), "Aurora", URL, b"aurora bytes");
    let manager = CacheManager::open(location.clone(), &apod).unwrap();

    // A directory at the derived name can be neither created nor read as a file
    let blocked = derive_path(location.dir(), "Aurora", URL);
    fs::create_dir(&blocked).unwrap();

    let err = manager.ensure_cached(ymd(2019, 1, 1)).unwrap_err();

    assert!(matches!(err, CacheError::Store(StoreError::Io { ref path, .. }) if *path == blocked));
    assert_eq!(manager.store().count().unwrap(), 0);
    assert!(image_files(location.dir()).is_empty());
}
