use serde_json::json;
use shelf_store::config::{SchemaConfig, StoreConfig};
use shelf_store::storage::{Database, DatabaseError};

fn test_db() -> (tempfile::TempDir, Database) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(&StoreConfig::on_disk(dir.path().join("data"))).unwrap();
    (dir, db)
}

#[test]
fn test_put_and_get_file() {
    let (_dir, db) = test_db();

    let record = db
        .put_file("file-1", "notes.txt", "text/plain", b"hello world")
        .unwrap();
    assert_eq!(record.id, "file-1");
    assert_eq!(record.size, 11);

    let file = db.get_file("file-1").unwrap().expect("file should exist");
    assert_eq!(file.name, "notes.txt");
    assert_eq!(file.mime_type, "text/plain");
    assert_eq!(&file.data[..], b"hello world");
}

#[test]
fn test_get_file_not_found() {
    let (_dir, db) = test_db();
    assert!(db.get_file("nonexistent").unwrap().is_none());
    assert!(db.get_file_metadata("nonexistent").unwrap().is_none());
}

#[test]
fn test_delete_file() {
    let (_dir, db) = test_db();
    db.put_file("file-2", "a.pdf", "application/pdf", b"%PDF")
        .unwrap();

    assert!(db.delete_file("file-2").unwrap());
    assert!(db.get_file("file-2").unwrap().is_none());
    assert!(db.get_files_by_name("a.pdf").unwrap().is_empty());
}

#[test]
fn test_delete_file_not_found() {
    let (_dir, db) = test_db();
    assert!(!db.delete_file("nonexistent").unwrap());
}

#[test]
fn test_overwrite_replaces_payload_and_size() {
    let (_dir, db) = test_db();
    db.put_file("f", "draft.txt", "text/plain", b"first version")
        .unwrap();
    db.put_file("f", "draft.txt", "text/markdown", b"v2").unwrap();

    let all = db.get_all_files().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].size, 2);
    assert_eq!(all[0].mime_type, "text/markdown");

    let file = db.get_file("f").unwrap().unwrap();
    assert_eq!(&file.data[..], b"v2");
}

#[test]
fn test_overwrite_with_new_name_moves_index_entry() {
    let (_dir, db) = test_db();
    db.put_file("f", "old.txt", "text/plain", b"x").unwrap();
    db.put_file("f", "new.txt", "text/plain", b"x").unwrap();

    assert!(db.get_files_by_name("old.txt").unwrap().is_empty());
    let renamed = db.get_files_by_name("new.txt").unwrap();
    assert_eq!(renamed.len(), 1);
    assert_eq!(renamed[0].id, "f");
}

#[test]
fn test_name_index_is_not_unique() {
    let (_dir, db) = test_db();
    db.put_file("a", "chapter.pdf", "application/pdf", b"a")
        .unwrap();
    db.put_file("b", "chapter.pdf", "application/pdf", b"bb")
        .unwrap();
    db.put_file("c", "other.pdf", "application/pdf", b"ccc")
        .unwrap();

    let mut ids: Vec<String> = db
        .get_files_by_name("chapter.pdf")
        .unwrap()
        .into_iter()
        .map(|f| f.id)
        .collect();
    ids.sort();
    assert_eq!(ids, vec!["a", "b"]);

    db.delete_file("a").unwrap();
    let remaining = db.get_files_by_name("chapter.pdf").unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, "b");
}

#[test]
fn test_get_all_files_in_key_order() {
    let (_dir, db) = test_db();
    db.put_file("b", "b.txt", "text/plain", b"b").unwrap();
    db.put_file("a", "a.txt", "text/plain", b"a").unwrap();
    db.put_file("c", "c.txt", "text/plain", b"c").unwrap();

    let ids: Vec<String> = db
        .get_all_files()
        .unwrap()
        .into_iter()
        .map(|f| f.id)
        .collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
}

#[test]
fn test_empty_payload() {
    let (_dir, db) = test_db();
    db.put_file("empty", "empty.bin", "application/octet-stream", b"")
        .unwrap();

    assert_eq!(db.get_file_metadata("empty").unwrap().unwrap().size, 0);
    assert!(db.get_file("empty").unwrap().unwrap().data.is_empty());
}

// ============================================================================
// Generic data
// ============================================================================

#[test]
fn test_put_and_get_data() {
    let (_dir, db) = test_db();
    let value = json!({"books": [{"id": "b1", "progress": 0.4}], "theme": "dark"});

    let record = db.put_data("app-state", value.clone()).unwrap();
    assert_eq!(record.key, "app-state");

    let stored = db.get_data("app-state").unwrap().unwrap();
    assert_eq!(stored.data, value);
    assert_eq!(stored.updated_at, record.updated_at);
}

#[test]
fn test_data_upsert_advances_timestamp() {
    let (_dir, db) = test_db();
    let first = db.put_data("k", json!(1)).unwrap();
    let second = db.put_data("k", json!(2)).unwrap();
    let third = db.put_data("k", json!(3)).unwrap();

    assert!(second.updated_at > first.updated_at);
    assert!(third.updated_at > second.updated_at);
    assert_eq!(db.get_data("k").unwrap().unwrap().data, json!(3));
}

#[test]
fn test_data_values_of_every_shape() {
    let (_dir, db) = test_db();
    let values = [
        json!(null),
        json!(true),
        json!(-42),
        json!(3.25),
        json!("text"),
        json!([1, "two", null]),
        json!({"nested": {"deep": [1, 2, 3]}}),
    ];

    for (i, value) in values.iter().enumerate() {
        let key = format!("k{i}");
        db.put_data(&key, value.clone()).unwrap();
        assert_eq!(&db.get_data(&key).unwrap().unwrap().data, value);
    }
}

#[test]
fn test_delete_data() {
    let (_dir, db) = test_db();
    db.put_data("gone", json!("x")).unwrap();

    assert!(db.delete_data("gone").unwrap());
    assert!(!db.delete_data("gone").unwrap());
    assert!(db.get_data("gone").unwrap().is_none());
}

// ============================================================================
// Schema and lifecycle
// ============================================================================

#[test]
fn test_new_database_records_version() {
    let (_dir, db) = test_db();
    assert_eq!(db.version().unwrap(), Some(1));
}

#[test]
fn test_reopen_keeps_records() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig::on_disk(dir.path());

    {
        let db = Database::open(&config).unwrap();
        db.put_file("f1", "notes.txt", "text/plain", b"persisted")
            .unwrap();
        db.put_data("k", json!({"a": 1})).unwrap();
    }

    let db = Database::open(&config).unwrap();
    assert_eq!(&db.get_file("f1").unwrap().unwrap().data[..], b"persisted");
    assert_eq!(db.get_data("k").unwrap().unwrap().data, json!({"a": 1}));
}

#[test]
fn test_upgrade_bumps_version_and_keeps_records() {
    let dir = tempfile::tempdir().unwrap();
    let v1 = StoreConfig::on_disk(dir.path());

    {
        let db = Database::open(&v1).unwrap();
        db.put_data("k", json!("kept")).unwrap();
    }

    let v2 = StoreConfig {
        version: 2,
        ..v1.clone()
    };
    let db = Database::open(&v2).unwrap();
    assert_eq!(db.version().unwrap(), Some(2));
    assert_eq!(db.get_data("k").unwrap().unwrap().data, json!("kept"));
}

#[test]
fn test_open_older_version_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let v3 = StoreConfig {
        version: 3,
        ..StoreConfig::on_disk(dir.path())
    };
    drop(Database::open(&v3).unwrap());

    let v1 = StoreConfig {
        version: 1,
        ..v3.clone()
    };
    match Database::open(&v1) {
        Err(DatabaseError::VersionConflict { stored, requested }) => {
            assert_eq!(stored, 3);
            assert_eq!(requested, 1);
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("opening an older version should fail"),
    }
}

#[test]
fn test_custom_table_names() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig {
        schema: SchemaConfig {
            files_table: "library_files".to_string(),
            file_blobs_table: "library_blobs".to_string(),
            name_index: "library_names".to_string(),
            data_table: "library_data".to_string(),
        },
        ..StoreConfig::on_disk(dir.path())
    };

    let db = Database::open(&config).unwrap();
    db.put_file("f", "x.txt", "text/plain", b"x").unwrap();
    assert_eq!(db.get_files_by_name("x.txt").unwrap().len(), 1);
}

#[test]
fn test_separate_names_are_separate_databases() {
    let dir = tempfile::tempdir().unwrap();
    let first = Database::open(&StoreConfig {
        name: "first".to_string(),
        ..StoreConfig::on_disk(dir.path())
    })
    .unwrap();
    let second = Database::open(&StoreConfig {
        name: "second".to_string(),
        ..StoreConfig::on_disk(dir.path())
    })
    .unwrap();

    first.put_data("k", json!(1)).unwrap();
    assert!(second.get_data("k").unwrap().is_none());
    assert!(dir.path().join("first.redb").exists());
    assert!(dir.path().join("second.redb").exists());
}

#[test]
fn test_purge_all() {
    let (_dir, db) = test_db();
    db.put_file("p1", "same.txt", "text/plain", b"1").unwrap();
    db.put_file("p2", "same.txt", "text/plain", b"2").unwrap();
    db.put_data("k", json!(1)).unwrap();

    let stats = db.purge_all().unwrap();
    assert_eq!(stats.files, 2);
    assert_eq!(stats.data, 1);

    assert!(db.get_all_files().unwrap().is_empty());
    assert!(db.get_file("p1").unwrap().is_none());
    assert!(db.get_files_by_name("same.txt").unwrap().is_empty());
    assert!(db.get_data("k").unwrap().is_none());

    // Store remains usable after a purge
    db.put_file("p3", "same.txt", "text/plain", b"3").unwrap();
    assert_eq!(db.get_files_by_name("same.txt").unwrap().len(), 1);
}
