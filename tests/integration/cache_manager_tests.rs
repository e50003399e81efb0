use super::support::{image_files, ymd, FakeApod};
use apodcache::apod::{MediaKind, MediaMetadata, RetrievalError};
use apodcache::cache::{CacheLocation, ContentHash};
use apodcache::manager::{CacheError, CacheManager};
use std::fs;
use tempfile::tempdir;

const NGC_URL: &str = "https://apod.nasa.gov/apod/image/2205/NGC3521LRGBHaAPOD-20.jpg";
const NGC_TITLE: &str = "  NGC #3521: Galaxy in a Bubble  ";

fn location(dir: &std::path::Path) -> CacheLocation {
    CacheLocation::new(dir.join("image_cache")).unwrap()
}

fn video(date: chrono::NaiveDate, thumb: &str) -> MediaMetadata {
    MediaMetadata {
        date,
        title: "Total Eclipse Timelapse".to_string(),
        explanation: "The Moon's shadow crosses the land.".to_string(),
        media_kind: MediaKind::Video,
        image_url: Some("https://apod.nasa.gov/apod/image/hd_should_not_be_used.jpg".to_string()),
        video_url: Some(thumb.to_string()),
        copyright: None,
    }
}

#[test]
fn test_cache_miss_creates_file_and_record() {
    let dir = tempdir().unwrap();
    let apod = FakeApod::new().with_image(ymd(2022, 5, 1), NGC_TITLE, NGC_URL, b"galaxy bytes");
    let manager = CacheManager::open(location(dir.path()), &apod).unwrap();

    let record = manager.ensure_cached(ymd(2022, 5, 1)).unwrap();

    assert_eq!(record.title, NGC_TITLE);
    assert!(record.file_path.is_absolute());
    assert!(record.file_path.ends_with("NGC_3521_Galaxy_in_a_Bubble.jpg"));
    assert_eq!(fs::read(&record.file_path).unwrap(), b"galaxy bytes");
    assert_eq!(record.content_hash, ContentHash::of(b"galaxy bytes"));
    assert_eq!(manager.store().count().unwrap(), 1);
}

#[test]
fn test_ensure_cached_is_idempotent() {
    let dir = tempdir().unwrap();
    let apod = FakeApod::new().with_image(ymd(2022, 5, 1), NGC_TITLE, NGC_URL, b"galaxy bytes");
    let manager = CacheManager::open(location(dir.path()), &apod).unwrap();

    let first = manager.ensure_cached(ymd(2022, 5, 1)).unwrap();
    let second = manager.ensure_cached(ymd(2022, 5, 1)).unwrap();

    assert_eq!(first, second);
    assert_eq!(manager.store().count().unwrap(), 1);
    assert_eq!(image_files(manager.cache_dir()).len(), 1);
}

#[test]
fn test_hit_does_not_rewrite_file() {
    let dir = tempdir().unwrap();
    let apod = FakeApod::new().with_image(ymd(2022, 5, 1), "Moon", "https://x/moon.png", b"moon");
    let manager = CacheManager::open(location(dir.path()), &apod).unwrap();

    let record = manager.ensure_cached(ymd(2022, 5, 1)).unwrap();
    let before = fs::metadata(&record.file_path).unwrap().modified().unwrap();
    manager.ensure_cached(ymd(2022, 5, 1)).unwrap();
    let after = fs::metadata(&record.file_path).unwrap().modified().unwrap();

    assert_eq!(before, after);
}

#[test]
fn test_identical_bytes_on_different_dates_collapse() {
    let dir = tempdir().unwrap();
    let apod = FakeApod::new()
        .with_image(ymd(2004, 8, 8), "Saturn Rings", "https://x/a/saturn.jpg", b"same")
        .with_image(ymd(2004, 8, 9), "Saturn Again", "https://x/b/rerun.jpg", b"same");
    let manager = CacheManager::open(location(dir.path()), &apod).unwrap();

    let first = manager.ensure_cached(ymd(2004, 8, 8)).unwrap();
    let second = manager.ensure_cached(ymd(2004, 8, 9)).unwrap();

    assert_eq!(first.id, second.id);
    // The existing record is returned unchanged
    assert_eq!(second.title, "Saturn Rings");
    assert_eq!(image_files(manager.cache_dir()).len(), 1);
    assert_eq!(manager.store().count().unwrap(), 1);
}

#[test]
fn test_distinct_images_get_distinct_records() {
    let dir = tempdir().unwrap();
    let apod = FakeApod::new()
        .with_image(ymd(2020, 1, 1), "Orion", "https://x/orion.jpg", b"orion")
        .with_image(ymd(2020, 1, 2), "Pleiades", "https://x/m45.jpg", b"pleiades");
    let manager = CacheManager::open(location(dir.path()), &apod).unwrap();

    let a = manager.ensure_cached(ymd(2020, 1, 1)).unwrap();
    let b = manager.ensure_cached(ymd(2020, 1, 2)).unwrap();

    assert!(b.id > a.id);
    assert_ne!(a.content_hash, b.content_hash);
    assert_eq!(image_files(manager.cache_dir()).len(), 2);
}

#[test]
fn test_video_downloads_thumbnail() {
    let dir = tempdir().unwrap();
    let thumb = "https://img.youtube.com/vi/abc123/0.jpg";
    let apod = FakeApod::new()
        .with_media(video(ymd(2017, 8, 21), thumb))
        .with_file(thumb, b"thumbnail");
    let manager = CacheManager::open(location(dir.path()), &apod).unwrap();

    let record = manager.ensure_cached(ymd(2017, 8, 21)).unwrap();

    assert_eq!(apod.downloads(), vec![thumb.to_string()]);
    assert!(record.file_path.ends_with("Total_Eclipse_Timelapse.jpg"));
    assert_eq!(record.content_hash, ContentHash::of(b"thumbnail"));
}

#[test]
fn test_unsupported_media_commits_nothing() {
    let dir = tempdir().unwrap();
    let mut meta = video(ymd(2010, 3, 3), "https://x/thumb.jpg");
    meta.media_kind = MediaKind::Other("other".to_string());
    let apod = FakeApod::new().with_media(meta);
    let manager = CacheManager::open(location(dir.path()), &apod).unwrap();

    let err = manager.ensure_cached(ymd(2010, 3, 3)).unwrap_err();

    assert!(matches!(err, CacheError::UnsupportedMedia(ref kind) if kind == "other"));
    assert!(apod.downloads().is_empty());
    assert_eq!(manager.store().count().unwrap(), 0);
    assert!(image_files(manager.cache_dir()).is_empty());
}

#[test]
fn test_metadata_failure_commits_nothing() {
    let dir = tempdir().unwrap();
    let apod = FakeApod::new();
    let manager = CacheManager::open(location(dir.path()), &apod).unwrap();

    let err = manager.ensure_cached(ymd(2001, 1, 1)).unwrap_err();

    assert!(matches!(
        err,
        CacheError::Retrieval(RetrievalError::Status { code: 404, .. })
    ));
    assert_eq!(manager.store().count().unwrap(), 0);
}

#[test]
fn test_download_failure_commits_nothing() {
    let dir = tempdir().unwrap();
    let meta = MediaMetadata {
        date: ymd(2001, 1, 2),
        title: "Lost".to_string(),
        explanation: "Unreachable image.".to_string(),
        media_kind: MediaKind::Image,
        image_url: Some("https://x/missing.jpg".to_string()),
        video_url: None,
        copyright: None,
    };
    let apod = FakeApod::new().with_media(meta);
    let manager = CacheManager::open(location(dir.path()), &apod).unwrap();

    let err = manager.ensure_cached(ymd(2001, 1, 2)).unwrap_err();

    assert!(matches!(
        err,
        CacheError::Retrieval(RetrievalError::Transport { .. })
    ));
    assert_eq!(manager.store().count().unwrap(), 0);
    assert!(image_files(manager.cache_dir()).is_empty());
}

#[test]
fn test_image_without_url_is_malformed() {
    let dir = tempdir().unwrap();
    let meta = MediaMetadata {
        date: ymd(2001, 1, 3),
        title: "No URL".to_string(),
        explanation: "Payload without a link.".to_string(),
        media_kind: MediaKind::Image,
        image_url: None,
        video_url: Some("https://x/thumb.jpg".to_string()),
        copyright: None,
    };
    let apod = FakeApod::new().with_media(meta);
    let manager = CacheManager::open(location(dir.path()), &apod).unwrap();

    let err = manager.ensure_cached(ymd(2001, 1, 3)).unwrap_err();

    assert!(matches!(
        err,
        CacheError::Retrieval(RetrievalError::Malformed(_))
    ));
    assert!(apod.downloads().is_empty());
}

#[test]
fn test_blank_title_is_malformed_and_not_downloaded() {
    let dir = tempdir().unwrap();
    let meta = MediaMetadata {
        date: ymd(2001, 1, 4),
        title: "   ".to_string(),
        explanation: "Payload without a title.".to_string(),
        media_kind: MediaKind::Image,
        image_url: Some("https://x/untitled.jpg".to_string()),
        video_url: None,
        copyright: None,
    };
    let apod = FakeApod::new()
        .with_media(meta)
        .with_file("https://x/untitled.jpg", b"untitled bytes");
    let manager = CacheManager::open(location(dir.path()), &apod).unwrap();

    let err = manager.ensure_cached(ymd(2001, 1, 4)).unwrap_err();

    assert!(matches!(
        err,
        CacheError::Retrieval(RetrievalError::Malformed(_))
    ));
    assert!(apod.downloads().is_empty());
    assert_eq!(manager.store().count().unwrap(), 0);
}

#[test]
fn test_cache_survives_reopen() {
    let dir = tempdir().unwrap();
    let apod = FakeApod::new().with_image(ymd(2022, 5, 1), NGC_TITLE, NGC_URL, b"galaxy bytes");

    let first = {
        let manager = CacheManager::open(location(dir.path()), &apod).unwrap();
        manager.ensure_cached(ymd(2022, 5, 1)).unwrap()
    };

    let manager = CacheManager::open(location(dir.path()), &apod).unwrap();
    let again = manager.ensure_cached(ymd(2022, 5, 1)).unwrap();

    assert_eq!(first, again);
    assert_eq!(manager.store().get_by_id(first.id).unwrap(), Some(first));
}
