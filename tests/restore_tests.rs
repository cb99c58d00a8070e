//! Backup restore tests: archive decoding, lock-file semantics, push order

use std::io::Write;
use std::path::{Path, PathBuf};

use zip::write::FileOptions;

use fiscus::{db, restore};

fn write_archive(dir: &Path, name: &str, entries: &[(&str, &str)]) -> PathBuf {
    let path = dir.join(name);
    let file = std::fs::File::create(&path).unwrap();
    let mut writer = zip::ZipWriter::new(file);

    for (entry_name, content) in entries {
        writer.start_file(*entry_name, FileOptions::default()).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap();

    path
}

const ACTORS_JSON: &str = r#"[{"name":"Actor #1"},{"name":"Actor #2"}]"#;
const LABELS_JSON: &str = r#"[{"name":"Label #1","parent":"Label #5"}]"#;
const TRANSACTIONS_JSON: &str = r#"[{
    "signature": "restored",
    "date": "2020-02-05T00:00:00Z",
    "amount": -2410,
    "label": "Label #1",
    "sender": "Actor #1",
    "receiver": "Actor #2"
}]"#;

async fn installed_pool() -> sqlx::SqlitePool {
    let pool = db::memory_pool().await.unwrap();
    db::install(&pool).await.unwrap();
    pool
}

#[test]
fn lock_sits_next_to_the_archive() {
    assert_eq!(
        restore::lock_path(Path::new("/backups/reg.zip")),
        PathBuf::from("/backups/.reg.zip")
    );
}

#[tokio::test]
async fn restore_applies_a_full_bundle() {
    let dir = tempfile::tempdir().unwrap();
    let archive = write_archive(
        dir.path(),
        "reg.zip",
        &[
            ("reg_actors.json", ACTORS_JSON),
            ("reg_labels.json", LABELS_JSON),
            ("reg_transactions.json", TRANSACTIONS_JSON),
        ],
    );

    let pool = installed_pool().await;
    let applied = restore::restore(&pool, 1000, &archive).await.unwrap();
    assert!(applied);
    assert!(restore::lock_path(&archive).exists());

    let actors = db::actors::pull(&pool, 100).await.unwrap();
    assert_eq!(actors.len(), 2);

    let labels = db::labels::pull(&pool, 100).await.unwrap();
    assert_eq!(labels.len(), 2); // Label #5 materialized as parent

    let transactions = db::transactions::pull_by_signature(&pool, "restored", 100)
        .await
        .unwrap();
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0].amount, -2410);
    assert!(transactions[0].uuid.is_some());
}

#[tokio::test]
async fn restore_is_one_shot_per_archive() {
    let dir = tempfile::tempdir().unwrap();
    let archive = write_archive(
        dir.path(),
        "reg.zip",
        &[("reg_transactions.json", TRANSACTIONS_JSON)],
    );

    let pool = installed_pool().await;
    assert!(restore::restore(&pool, 1000, &archive).await.unwrap());

    // the fixture transaction carries no uuid, so a second push would land
    // a second row; the lock must prevent that
    assert!(!restore::restore(&pool, 1000, &archive).await.unwrap());

    let transactions = db::transactions::pull_by_signature(&pool, "restored", 100)
        .await
        .unwrap();
    assert_eq!(transactions.len(), 1);
}

#[tokio::test]
async fn unknown_entries_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let archive = write_archive(
        dir.path(),
        "reg.zip",
        &[
            ("README.txt", "not a registry file"),
            ("reg_actors.json", ACTORS_JSON),
        ],
    );

    let pool = installed_pool().await;
    assert!(restore::restore(&pool, 1000, &archive).await.unwrap());

    let actors = db::actors::pull(&pool, 100).await.unwrap();
    assert_eq!(actors.len(), 2);
}

#[tokio::test]
async fn missing_archive_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let pool = installed_pool().await;

    let missing = dir.path().join("does-not-exist.zip");
    assert!(restore::restore(&pool, 1000, &missing).await.is_err());
    assert!(!restore::lock_path(&missing).exists());
}

#[tokio::test]
async fn malformed_entry_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let archive = write_archive(
        dir.path(),
        "reg.zip",
        &[("reg_actors.json", "{not json")],
    );

    let pool = installed_pool().await;
    assert!(restore::restore(&pool, 1000, &archive).await.is_err());
}

#[tokio::test]
async fn failed_push_leaves_the_lock_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let archive = write_archive(
        dir.path(),
        "reg.zip",
        &[("reg_actors.json", ACTORS_JSON)],
    );

    let pool = installed_pool().await;
    pool.close().await;

    // the store is gone, so the push fails; the archive stays quarantined
    assert!(restore::restore(&pool, 1000, &archive).await.is_err());
    assert!(restore::lock_path(&archive).exists());
}
