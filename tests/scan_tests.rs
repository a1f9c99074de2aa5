//! End-to-end passes against real temp trees: scan, rescan, prune, thumbnails, concurrency.

use dircat::{
    CatalogError, CatalogRef, CatalogStore, DirEntry, JoinMode, ScanEvent, ScanOptions,
    ScanSummary, Scanner, generate_thumbnail, prune_catalog,
};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// root/{a/{a1.txt, b/{deep.txt}}, broken.jpg, pic.jpg, top.txt}
struct Fixture {
    _tree: TempDir,
    _store_dir: TempDir,
    root: PathBuf,
    db_path: PathBuf,
}

fn fixture() -> Fixture {
    let tree = tempfile::tempdir().unwrap();
    let store_dir = tempfile::tempdir().unwrap();
    let root = tree.path().canonicalize().unwrap();
    fs::create_dir_all(root.join("a").join("b")).unwrap();
    fs::write(root.join("a").join("a1.txt"), b"hello").unwrap();
    fs::write(root.join("a").join("b").join("deep.txt"), b"deep").unwrap();
    fs::write(root.join("top.txt"), b"top level file").unwrap();
    fs::write(root.join("broken.jpg"), b"definitely not a jpeg").unwrap();
    image::RgbImage::from_fn(640, 480, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    })
    .save(root.join("pic.jpg"))
    .unwrap();
    let db_path = store_dir.path().join("catalog.sqlite");
    Fixture {
        _tree: tree,
        _store_dir: store_dir,
        root,
        db_path,
    }
}

fn run(scanner: &Scanner, root: &Path, target: CatalogRef) -> (Vec<ScanEvent>, ScanSummary) {
    let handle = scanner.start(root, target).unwrap();
    let mut events = Vec::new();
    let summary = handle.drain(|e| events.push(e.clone())).unwrap();
    (events, summary)
}

fn scan_new(fx: &Fixture, name: &str) -> (i64, ScanSummary) {
    let scanner = Scanner::new(&fx.db_path, ScanOptions::default());
    let (_, summary) = run(&scanner, &fx.root, CatalogRef::new_named(name));
    (summary.catalog_id.unwrap(), summary)
}

fn rescan(fx: &Fixture, catalog_id: i64) -> ScanSummary {
    let scanner = Scanner::new(&fx.db_path, ScanOptions::default());
    run(&scanner, &fx.root, CatalogRef::Existing(catalog_id)).1
}

fn disk_paths(root: &Path) -> BTreeSet<PathBuf> {
    walkdir::WalkDir::new(root)
        .into_iter()
        .map(|e| e.unwrap().into_path())
        .collect()
}

fn find<'a>(entries: &'a [DirEntry], path: &Path) -> &'a DirEntry {
    entries
        .iter()
        .find(|e| e.full_path == path)
        .unwrap_or_else(|| panic!("no entry for {}", path.display()))
}

#[test]
fn test_fresh_scan_catalogs_exactly_the_tree() {
    let fx = fixture();
    let (cat, summary) = scan_new(&fx, "fresh");
    let store = CatalogStore::open(&fx.db_path).unwrap();
    let entries = store.fetch_all(cat).unwrap();

    let cataloged: BTreeSet<PathBuf> = entries.iter().map(|e| e.full_path.clone()).collect();
    assert_eq!(cataloged, disk_paths(&fx.root));
    assert_eq!(entries.len(), 8);

    let root_id = store.get_root_id(cat).unwrap();
    let root = store.get_entry(root_id).unwrap();
    assert!(root.is_root());
    assert_eq!(root.full_path, fx.root);

    for e in entries.iter().filter(|e| e.id != root_id) {
        let parent = store.get_entry(e.parent_id).unwrap();
        assert!(parent.is_directory);
        assert_eq!(parent.full_path, e.full_path.parent().unwrap());
        assert_eq!(e.directory, parent.full_path);
    }

    let a = find(&entries, &fx.root.join("a"));
    assert!(a.is_directory);
    assert_eq!(a.filesize, 0);
    assert_eq!(a.name, "a");
    let top = find(&entries, &fx.root.join("top.txt"));
    assert_eq!(top.filesize, 14);
    assert!(!top.is_directory);

    assert_eq!(summary.inserted, 8);
    assert_eq!(summary.directories, 3);
    assert_eq!(summary.files, 5);
    assert_eq!(summary.failed, 0);
    assert!(!summary.cancelled);
    assert_eq!(store.list_catalogs().unwrap()[0].original_path, fx.root);
}

#[test]
fn test_events_are_directories_then_one_finished() {
    let fx = fixture();
    let scanner = Scanner::new(&fx.db_path, ScanOptions::default());
    let (events, summary) = run(&scanner, &fx.root, CatalogRef::new_named("events"));

    let (last, dirs) = events.split_last().unwrap();
    assert!(matches!(last, ScanEvent::Finished(s) if *s == summary));
    let dir_paths: Vec<PathBuf> = dirs
        .iter()
        .map(|e| match e {
            ScanEvent::Directory(p) => p.clone(),
            ScanEvent::Finished(_) => panic!("more than one Finished"),
        })
        .collect();
    // Pre-order: each directory before its descendants.
    assert_eq!(
        dir_paths,
        vec![fx.root.clone(), fx.root.join("a"), fx.root.join("a").join("b")]
    );
    assert!(!scanner.is_running());
    assert_eq!(scanner.active_catalog(), None);
}

#[test]
fn test_rescan_unchanged_tree_adds_nothing() {
    let fx = fixture();
    let (cat, _) = scan_new(&fx, "idem");
    let store = CatalogStore::open(&fx.db_path).unwrap();
    let before = store.fetch_all(cat).unwrap();

    let summary = rescan(&fx, cat);
    assert_eq!(summary.inserted, 0);
    assert_eq!(summary.existing, 7);
    assert_eq!(summary.catalog_id, Some(cat));
    assert_eq!(store.fetch_all(cat).unwrap(), before);
}

#[test]
fn test_rescan_adds_only_new_file() {
    let fx = fixture();
    let (cat, _) = scan_new(&fx, "incr");
    let store = CatalogStore::open(&fx.db_path).unwrap();
    let before = store.fetch_all(cat).unwrap();

    let new_file = fx.root.join("a").join("b").join("new.txt");
    fs::write(&new_file, b"fresh").unwrap();
    let summary = rescan(&fx, cat);
    assert_eq!(summary.inserted, 1);

    let after = store.fetch_all(cat).unwrap();
    assert_eq!(after.len(), before.len() + 1);
    assert_eq!(&after[..before.len()], &before[..], "prior rows untouched");
    let added = find(&after, &new_file);
    assert_eq!(added.filesize, 5);
    assert_eq!(
        added.parent_id,
        store.find_parent_id(cat, &fx.root.join("a").join("b")).unwrap()
    );
}

#[test]
fn test_two_catalogs_of_same_root_are_independent() {
    let fx = fixture();
    let (first, _) = scan_new(&fx, "first");
    let (second, summary) = scan_new(&fx, "second");
    assert_ne!(first, second);
    assert_eq!(summary.inserted, 8, "existence is checked per catalog");

    let store = CatalogStore::open(&fx.db_path).unwrap();
    let hits = store.search(second, "deep", JoinMode::All).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].catalog_id, second);
}

#[test]
fn test_duplicate_catalog_name_fails_pass_but_finishes() {
    let fx = fixture();
    scan_new(&fx, "same");
    let scanner = Scanner::new(&fx.db_path, ScanOptions::default());
    let handle = scanner.start(&fx.root, CatalogRef::new_named("same")).unwrap();
    let mut finished = 0;
    let result = handle.drain(|e| {
        if matches!(e, ScanEvent::Finished(_)) {
            finished += 1;
        }
    });
    assert!(matches!(result, Err(CatalogError::DuplicateName(_))));
    assert_eq!(finished, 1);
    assert!(!scanner.is_running());
}

#[test]
fn test_thumbnails_in_pass() {
    let fx = fixture();
    let (cat, summary) = scan_new(&fx, "thumbs");
    assert_eq!(summary.thumbnails, 1);
    assert_eq!(summary.thumbnail_failures, 1);

    let store = CatalogStore::open(&fx.db_path).unwrap();
    let entries = store.fetch_all(cat).unwrap();
    let pic = find(&entries, &fx.root.join("pic.jpg"));
    assert!(pic.has_thumbnail());
    let decoded = image::load_from_memory(&pic.thumbnail).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (256, 192));

    let broken = find(&entries, &fx.root.join("broken.jpg"));
    assert!(broken.thumbnail.is_empty());
    assert!(!find(&entries, &fx.root.join("top.txt")).has_thumbnail());
}

#[test]
fn test_thumbnails_can_be_disabled() {
    let fx = fixture();
    let opts = ScanOptions {
        with_thumbnails: false,
        ..ScanOptions::default()
    };
    let scanner = Scanner::new(&fx.db_path, opts);
    let (_, summary) = run(&scanner, &fx.root, CatalogRef::new_named("plain"));
    assert_eq!(summary.thumbnails, 0);
    let store = CatalogStore::open(&fx.db_path).unwrap();
    let entries = store.fetch_all(summary.catalog_id.unwrap()).unwrap();
    assert!(entries.iter().all(|e| e.thumbnail.is_empty()));
}

#[test]
fn test_generate_thumbnail_direct() {
    let dir = tempfile::tempdir().unwrap();
    let small = dir.path().join("small.PNG");
    image::RgbaImage::from_pixel(100, 50, image::Rgba([10, 20, 30, 128]))
        .save_with_format(&small, image::ImageFormat::Png)
        .unwrap();
    let blob = generate_thumbnail(&small);
    let decoded = image::load_from_memory(&blob).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (100, 50), "no upscaling");

    let tall = dir.path().join("tall.jpeg");
    image::RgbImage::new(300, 900).save(&tall).unwrap();
    let decoded = image::load_from_memory(&generate_thumbnail(&tall)).unwrap();
    assert_eq!(decoded.height(), 256);
    assert!(decoded.width() <= 256);

    let text = dir.path().join("notes.txt");
    fs::write(&text, b"text").unwrap();
    assert!(generate_thumbnail(&text).is_empty());

    let broken = dir.path().join("broken.jpg");
    fs::write(&broken, b"garbage").unwrap();
    assert!(generate_thumbnail(&broken).is_empty());
    assert!(matches!(
        dircat::engine::try_generate_thumbnail(&broken),
        Err(CatalogError::Decode { .. })
    ));
}

#[test]
fn test_prune_removes_only_deleted_file() {
    let fx = fixture();
    let (cat, _) = scan_new(&fx, "prune");
    let mut store = CatalogStore::open(&fx.db_path).unwrap();
    let before = store.fetch_all(cat).unwrap();
    let gone = find(&before, &fx.root.join("top.txt")).id;

    fs::remove_file(fx.root.join("top.txt")).unwrap();
    let report = prune_catalog(&mut store, cat).unwrap();
    assert_eq!(report.checked, 8);
    assert_eq!(report.removed, vec![gone]);
    assert_eq!(report.deleted, 1);

    let after = store.fetch_all(cat).unwrap();
    let expected: Vec<DirEntry> = before.into_iter().filter(|e| e.id != gone).collect();
    assert_eq!(after, expected);
}

#[test]
fn test_prune_removed_directory_takes_descendants() {
    let fx = fixture();
    let (cat, _) = scan_new(&fx, "prune-dir");
    let mut store = CatalogStore::open(&fx.db_path).unwrap();

    fs::remove_dir_all(fx.root.join("a")).unwrap();
    let report = prune_catalog(&mut store, cat).unwrap();
    assert_eq!(report.deleted, 4);
    let left: BTreeSet<PathBuf> = store
        .fetch_all(cat)
        .unwrap()
        .into_iter()
        .map(|e| e.full_path)
        .collect();
    assert_eq!(left, disk_paths(&fx.root));
}

#[test]
fn test_prune_unreachable_root_mutates_nothing() {
    let fx = fixture();
    let (cat, _) = scan_new(&fx, "gone");
    let mut store = CatalogStore::open(&fx.db_path).unwrap();
    let count = store.count_entries(cat).unwrap();

    fs::remove_dir_all(&fx.root).unwrap();
    let err = prune_catalog(&mut store, cat).unwrap_err();
    assert!(matches!(err, CatalogError::Unreachable(ref p) if *p == fx.root));
    assert_eq!(store.count_entries(cat).unwrap(), count);
}

#[test]
fn test_unreachable_root_rejected_before_writes() {
    let fx = fixture();
    let scanner = Scanner::new(&fx.db_path, ScanOptions::default());
    let missing = fx.root.join("does-not-exist");
    let err = scanner
        .start(&missing, CatalogRef::new_named("missing"))
        .err()
        .unwrap();
    assert!(matches!(err, CatalogError::Unreachable(_)));
    assert!(!scanner.is_running());

    let file_root = scanner
        .start(&fx.root.join("top.txt"), CatalogRef::new_named("file"))
        .err()
        .unwrap();
    assert!(matches!(file_root, CatalogError::Unreachable(_)));

    // Nothing was created; the store may not even exist yet.
    if fx.db_path.exists() {
        let store = CatalogStore::open(&fx.db_path).unwrap();
        assert!(store.list_catalogs().unwrap().is_empty());
    }
}

#[test]
fn test_rescan_of_catalog_with_missing_root() {
    let fx = fixture();
    let (cat, _) = scan_new(&fx, "moved");
    let store = CatalogStore::open(&fx.db_path).unwrap();
    let catalog = store.get_catalog(cat).unwrap();
    fs::remove_dir_all(&fx.root).unwrap();

    let scanner = Scanner::new(&fx.db_path, ScanOptions::default());
    let err = scanner.start_rescan(&catalog).err().unwrap();
    assert!(matches!(err, CatalogError::Unreachable(_)));
}

#[test]
fn test_second_start_while_running_is_rejected() {
    let fx = fixture();
    // Capacity 1 and no draining: the worker blocks on its second directory event.
    let opts = ScanOptions {
        event_capacity: 1,
        ..ScanOptions::default()
    };
    let scanner = Scanner::new(&fx.db_path, opts);
    let handle = scanner
        .start(&fx.root, CatalogRef::new_named("busy"))
        .unwrap();
    assert!(scanner.is_running());

    let second = scanner.start(&fx.root, CatalogRef::new_named("other"));
    assert!(matches!(second, Err(CatalogError::Busy)));

    let mut dirs = 0;
    let mut finished = 0;
    let summary = handle
        .drain(|e| match e {
            ScanEvent::Directory(_) => dirs += 1,
            ScanEvent::Finished(_) => finished += 1,
        })
        .unwrap();
    assert_eq!((dirs, finished), (3, 1));
    assert_eq!(summary.inserted, 8);
    assert!(!scanner.is_running());

    let store = CatalogStore::open(&fx.db_path).unwrap();
    assert!(store.find_catalog("other").unwrap_err().is_not_found());

    // Idle again: a new pass is accepted.
    let again = scanner.start(&fx.root, CatalogRef::Existing(summary.catalog_id.unwrap()));
    assert_eq!(again.unwrap().wait().unwrap().inserted, 0);
}

#[test]
fn test_cancel_stops_pass_and_next_pass_completes() {
    let fx = fixture();
    let opts = ScanOptions {
        event_capacity: 1,
        ..ScanOptions::default()
    };
    let scanner = Scanner::new(&fx.db_path, opts);
    let handle = scanner
        .start(&fx.root, CatalogRef::new_named("cancel"))
        .unwrap();
    handle.cancel();
    let summary = handle.wait().unwrap();
    assert!(summary.cancelled);
    assert!(summary.inserted < 8);
    let cat = summary.catalog_id.unwrap();

    let resumed = scanner
        .start(&fx.root, CatalogRef::Existing(cat))
        .unwrap()
        .wait()
        .unwrap();
    assert!(!resumed.cancelled);
    let store = CatalogStore::open(&fx.db_path).unwrap();
    assert_eq!(store.count_entries(cat).unwrap(), 8);
}

#[test]
fn test_store_inside_root_and_excludes_are_skipped() {
    let fx = fixture();
    let db_in_root = fx.root.join("inside.sqlite");
    let opts = ScanOptions {
        exclude: vec!["b".to_string(), "*.txt".to_string()],
        ..ScanOptions::default()
    };
    let scanner = Scanner::new(&db_in_root, opts);
    let (_, summary) = run(&scanner, &fx.root, CatalogRef::new_named("inside"));

    let store = CatalogStore::open(&db_in_root).unwrap();
    let names: BTreeSet<String> = store
        .fetch_all(summary.catalog_id.unwrap())
        .unwrap()
        .into_iter()
        .map(|e| e.name)
        .collect();
    let expected: BTreeSet<String> = ["", "a", "broken.jpg", "pic.jpg"]
        .into_iter()
        .map(String::from)
        .collect();
    assert_eq!(names, expected);
}

#[cfg(unix)]
#[test]
fn test_non_utf8_names_are_skipped_and_survive_prune() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let fx = fixture();
    let odd_file = fx.root.join(OsStr::from_bytes(b"caf\xe9.txt"));
    if fs::write(&odd_file, b"latin-1 name").is_err() {
        // Filesystem only accepts UTF-8 names.
        return;
    }
    let odd_dir = fx.root.join(OsStr::from_bytes(b"d\xff"));
    fs::create_dir(&odd_dir).unwrap();
    fs::write(odd_dir.join("inner.txt"), b"inside").unwrap();

    let (cat, summary) = scan_new(&fx, "non-utf8");
    assert_eq!(summary.skipped_paths, 3, "file, directory and its child");
    assert!(!summary.cancelled);

    let mut store = CatalogStore::open(&fx.db_path).unwrap();
    let entries = store.fetch_all(cat).unwrap();
    assert_eq!(entries.len(), 8);
    assert!(entries.iter().all(|e| e.full_path.to_str().is_some()));
    assert!(
        entries
            .iter()
            .all(|e| !e.full_path.to_string_lossy().contains('\u{FFFD}'))
    );

    let report = prune_catalog(&mut store, cat).unwrap();
    assert_eq!(report.deleted, 0);
    assert!(odd_file.exists());
    assert_eq!(rescan(&fx, cat).inserted, 0);
}

#[cfg(unix)]
#[test]
fn test_backslash_in_name_survives_prune() {
    let fx = fixture();
    let odd = fx.root.join("back\\slash.txt");
    fs::write(&odd, b"z").unwrap();

    let (cat, summary) = scan_new(&fx, "backslash");
    assert_eq!(summary.inserted, 9);
    let mut store = CatalogStore::open(&fx.db_path).unwrap();
    let entry = find(&store.fetch_all(cat).unwrap(), &odd).clone();
    assert_eq!(entry.name, "back\\slash.txt");

    let report = prune_catalog(&mut store, cat).unwrap();
    assert_eq!(report.deleted, 0);
    assert_eq!(store.get_entry(entry.id).unwrap(), entry);
}

#[test]
fn test_rejected_insert_is_counted_and_pass_continues() {
    let fx = fixture();
    // Create the schema, then make the store refuse one row.
    drop(CatalogStore::open(&fx.db_path).unwrap());
    let conn = rusqlite::Connection::open(&fx.db_path).unwrap();
    conn.execute_batch(
        "CREATE TRIGGER reject_top BEFORE INSERT ON dir_entry WHEN NEW.name = 'top.txt'
         BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
    )
    .unwrap();
    drop(conn);

    let scanner = Scanner::new(&fx.db_path, ScanOptions::default());
    let (events, summary) = run(&scanner, &fx.root, CatalogRef::new_named("reject"));
    assert!(matches!(events.last(), Some(ScanEvent::Finished(_))));
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.inserted, 7);
    assert_eq!(summary.files, 5);

    let store = CatalogStore::open(&fx.db_path).unwrap();
    let entries = store.fetch_all(summary.catalog_id.unwrap()).unwrap();
    assert_eq!(entries.len(), 7);
    assert!(entries.iter().all(|e| e.name != "top.txt"));
    find(&entries, &fx.root.join("pic.jpg"));
}

#[cfg(unix)]
#[test]
fn test_unreadable_directory_is_skipped_and_pass_finishes() {
    use std::os::unix::fs::PermissionsExt;

    let fx = fixture();
    let locked = fx.root.join("a").join("b");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
    if fs::read_dir(&locked).is_ok() {
        // Privileged user: permission bits are not enforced.
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let scanner = Scanner::new(&fx.db_path, ScanOptions::default());
    let (events, summary) = run(&scanner, &fx.root, CatalogRef::new_named("locked"));
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    assert!(matches!(events.last(), Some(ScanEvent::Finished(_))));
    assert_eq!(summary.skipped_paths, 1);
    assert_eq!(summary.failed, 0);
    assert!(!summary.cancelled);

    let store = CatalogStore::open(&fx.db_path).unwrap();
    let entries = store.fetch_all(summary.catalog_id.unwrap()).unwrap();
    assert_eq!(entries.len(), 7);
    assert!(find(&entries, &locked).is_directory);
    assert!(
        entries
            .iter()
            .all(|e| e.full_path != locked.join("deep.txt"))
    );
}
