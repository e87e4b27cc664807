use chrono::Duration;
use exam_core::model::{AnswerLedger, ExamCategory, Question, QuestionId, Test, TestId, TestResult, UserId};
use exam_core::scoring::score_attempt;
use exam_core::time::fixed_now;
use storage::BuiltinCatalog;
use storage::repository::{LocalSessionStore, ResultRepository, Storage, TestRepository};
use storage::sqlite::SqliteRepository;

fn build_test(id: &str, age_days: i64) -> Test {
    let questions = (0..3)
        .map(|i| {
            Question::new(
                QuestionId::new(format!("{id}-q{i}")),
                format!("Question {i}"),
                vec!["a".into(), "b".into(), "c".into(), "d".into()],
                i,
                "why",
                "UPSC",
                "Polity",
            )
            .unwrap()
        })
        .collect();
    Test::new(
        TestId::new(id),
        format!("Test {id}"),
        ExamCategory::Upsc,
        "Polity",
        questions,
        20,
        100,
        true,
        fixed_now() - Duration::days(age_days),
    )
    .unwrap()
}

fn build_result(user: &str, test: &Test, hours_ago: i64) -> TestResult {
    let mut ledger = AnswerLedger::new(test.question_count());
    ledger.record_answer(0, 0).unwrap();
    ledger.record_answer(1, 3).unwrap();
    ledger.toggle_bookmark(2).unwrap();
    let score = score_attempt(test.questions(), &ledger, test.negative_marking());
    TestResult::from_score(
        UserId::new(user),
        test.id().clone(),
        &score,
        &ledger,
        95,
        fixed_now() - Duration::hours(hours_ago),
    )
}

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

#[tokio::test]
async fn sqlite_roundtrips_tests_newest_first() {
    let repo = connect("memdb_tests").await;
    repo.upsert_test(&build_test("older", 3)).await.unwrap();
    repo.upsert_test(&build_test("newer", 1)).await.unwrap();

    let fetched = repo
        .get_test(&TestId::new("older"))
        .await
        .unwrap()
        .expect("stored test");
    assert_eq!(fetched, build_test("older", 3));

    let ids: Vec<String> = repo
        .list_tests()
        .await
        .unwrap()
        .iter()
        .map(|t| t.id().to_string())
        .collect();
    assert_eq!(ids, vec!["newer", "older"]);

    // Upserting again replaces rather than duplicates.
    repo.upsert_test(&build_test("older", 3)).await.unwrap();
    assert_eq!(repo.count_tests().await.unwrap(), 2);
    assert!(repo.get_test(&TestId::new("gone")).await.unwrap().is_none());
}

#[tokio::test]
async fn sqlite_assigns_result_ids_and_lists_per_user() {
    let repo = connect("memdb_results").await;
    let test = build_test("t", 0);

    let older = repo.create_result(&build_result("u1", &test, 5)).await.unwrap();
    let newer = repo.create_result(&build_result("u1", &test, 1)).await.unwrap();
    repo.create_result(&build_result("u2", &test, 2)).await.unwrap();

    let results = repo
        .list_results_for_user(&UserId::new("u1"), 10)
        .await
        .unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].id(), Some(newer));
    assert_eq!(results[1].id(), Some(older));

    let stored = &results[0];
    assert_eq!(stored.correct(), 1);
    assert_eq!(stored.wrong(), 1);
    assert_eq!(stored.skipped(), 1);
    assert_eq!(stored.time_taken_secs(), 95);
    assert_eq!(stored.answers().get(&2), Some(&None));
    assert_eq!(stored.answers().get(&1), Some(&Some(3)));

    let limited = repo
        .list_results_for_user(&UserId::new("u1"), 1)
        .await
        .unwrap();
    assert_eq!(limited.len(), 1);
}

#[tokio::test]
async fn sqlite_local_sessions_replace_and_clear() {
    let repo = connect("memdb_sessions").await;
    let id = TestId::new("t");

    let mut ledger = AnswerLedger::new(4);
    ledger.record_answer(0, 0).unwrap();
    repo.save(&id, &ledger.snapshot()).await.unwrap();

    ledger.toggle_bookmark(0).unwrap();
    ledger.record_answer(3, 2).unwrap();
    repo.save(&id, &ledger.snapshot()).await.unwrap();

    let loaded = repo.load(&id).await.unwrap().expect("snapshot");
    assert_eq!(loaded, ledger.snapshot());
    let restored = AnswerLedger::restore(4, &loaded).unwrap();
    assert_eq!(restored.answer(0).selected(), Some(0));
    assert!(restored.answer(0).is_bookmarked());

    repo.clear(&id).await.unwrap();
    assert!(repo.load(&id).await.unwrap().is_none());
}

#[tokio::test]
async fn sqlite_storage_seeds_builtin_catalog() {
    let storage = Storage::sqlite("sqlite:file:memdb_seed?mode=memory&cache=shared")
        .await
        .expect("storage");
    let catalog = BuiltinCatalog::load().unwrap();
    for test in catalog.tests() {
        storage.tests.upsert_test(test).await.unwrap();
    }

    assert_eq!(storage.tests.count_tests().await.unwrap(), 6);
    let listed = storage.tests.list_tests().await.unwrap();
    assert_eq!(listed, catalog.tests().to_vec());
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let repo = connect("memdb_migrate_twice").await;
    repo.migrate().await.expect("second migrate");
    repo.upsert_test(&build_test("t", 0)).await.unwrap();
    assert_eq!(repo.count_tests().await.unwrap(), 1);
}

#[tokio::test]
async fn sqlite_creates_a_missing_database_file() {
    let path = std::env::temp_dir().join(format!("exam-fresh-{}.sqlite3", std::process::id()));
    let _ = std::fs::remove_file(&path);

    let url = format!("sqlite://{}", path.display());
    let storage = Storage::sqlite(&url).await.expect("fresh database");
    assert!(path.exists());
    assert_eq!(storage.tests.count_tests().await.unwrap(), 0);

    drop(storage);
    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{suffix}", path.display()));
    }
}
