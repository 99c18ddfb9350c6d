use chrono::{DateTime, Utc};
use storage::repository::{ProgressRecord, ProgressRepository, Storage};
use storage::sqlite::SqliteRepository;

fn at(secs: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(secs, 0).unwrap()
}

#[tokio::test]
async fn sqlite_roundtrip_keeps_latest_payload() {
    let repo = SqliteRepository::connect(
        "sqlite:file:memdb_progress_roundtrip?mode=memory&cache=shared",
    )
    .await
    .expect("connect");
    repo.migrate().await.expect("migrate");

    assert!(repo.load_progress().await.unwrap().is_none());

    repo.save_progress(&ProgressRecord::new(r#"{"totalScore":10}"#, at(100)))
        .await
        .unwrap();
    repo.save_progress(&ProgressRecord::new(r#"{"totalScore":30}"#, at(200)))
        .await
        .unwrap();

    let record = repo.load_progress().await.unwrap().expect("record");
    assert_eq!(record.payload, r#"{"totalScore":30}"#);
    assert_eq!(record.updated_at, at(200));
}

#[tokio::test]
async fn sqlite_clear_removes_snapshot() {
    let repo = SqliteRepository::connect(
        "sqlite:file:memdb_progress_clear?mode=memory&cache=shared",
    )
    .await
    .expect("connect");
    repo.migrate().await.expect("migrate");

    repo.save_progress(&ProgressRecord::new("{}", at(1)))
        .await
        .unwrap();
    repo.clear_progress().await.unwrap();
    assert!(repo.load_progress().await.unwrap().is_none());

    // clearing an empty store is fine
    repo.clear_progress().await.unwrap();
}

#[tokio::test]
async fn migrations_can_run_twice() {
    let repo = SqliteRepository::connect(
        "sqlite:file:memdb_progress_migrate?mode=memory&cache=shared",
    )
    .await
    .expect("connect");
    repo.migrate().await.expect("first migrate");
    repo.migrate().await.expect("second migrate");
}

#[tokio::test]
async fn storage_sqlite_builds_progress_repository() {
    let storage = Storage::sqlite("sqlite:file:memdb_progress_storage?mode=memory&cache=shared")
        .await
        .expect("storage");
    storage
        .progress
        .save_progress(&ProgressRecord::new("{\"currentChapter\":1}", at(5)))
        .await
        .unwrap();
    let record = storage.progress.load_progress().await.unwrap().unwrap();
    assert_eq!(record.payload, "{\"currentChapter\":1}");
}
