use assess_core::model::SessionFlag;
use assess_core::time::fixed_now;
use assess_core::Clock;
use chrono::Duration;
use storage::{
    default_session_ttl, FileSessionStore, JsonQuestionBank, QuestionRepository, SessionStore,
    StorageError,
};

#[tokio::test]
async fn flags_survive_reopening_the_jar() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let clock = Clock::fixed(fixed_now());

    let store = FileSessionStore::new(&path, clock);
    assert_eq!(store.get(SessionFlag::Authenticated).await.unwrap(), None);
    store
        .set(SessionFlag::Authenticated, true, default_session_ttl())
        .await
        .unwrap();
    store
        .set(SessionFlag::OnboardingComplete, true, default_session_ttl())
        .await
        .unwrap();

    let reopened = FileSessionStore::new(&path, clock.advanced(Duration::days(1)));
    assert_eq!(reopened.get(SessionFlag::Authenticated).await.unwrap(), Some(true));
    assert_eq!(
        reopened.get(SessionFlag::OnboardingComplete).await.unwrap(),
        Some(true)
    );

    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(raw.contains("onboarding_complete"));
}

#[tokio::test]
async fn expired_flags_read_as_absent_and_are_pruned() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("session.json");
    let clock = Clock::fixed(fixed_now());

    let store = FileSessionStore::new(&path, clock);
    store
        .set(SessionFlag::Authenticated, true, Duration::hours(1))
        .await
        .unwrap();

    let later = FileSessionStore::new(&path, clock.advanced(Duration::hours(2)));
    assert_eq!(later.get(SessionFlag::Authenticated).await.unwrap(), None);

    later
        .set(SessionFlag::OnboardingComplete, true, default_session_ttl())
        .await
        .unwrap();
    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(!raw.contains("\"authenticated\""));
}

#[tokio::test]
async fn clear_keeps_other_flags() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let store = FileSessionStore::new(&path, Clock::fixed(fixed_now()));
    store
        .set(SessionFlag::Authenticated, true, default_session_ttl())
        .await
        .unwrap();
    store
        .set(SessionFlag::OnboardingComplete, true, default_session_ttl())
        .await
        .unwrap();

    store.clear(SessionFlag::Authenticated).await.unwrap();

    assert_eq!(store.get(SessionFlag::Authenticated).await.unwrap(), None);
    assert_eq!(
        store.get(SessionFlag::OnboardingComplete).await.unwrap(),
        Some(true)
    );
}

#[tokio::test]
async fn corrupt_jar_fails_reads_until_rewritten() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    std::fs::write(&path, "{not json").unwrap();
    let store = FileSessionStore::new(&path, Clock::fixed(fixed_now()));

    let err = store.get(SessionFlag::Authenticated).await.unwrap_err();
    assert!(matches!(err, StorageError::Serialization(_)));

    store
        .set(SessionFlag::Authenticated, true, Duration::days(7))
        .await
        .unwrap();
    assert_eq!(store.get(SessionFlag::Authenticated).await.unwrap(), Some(true));
    assert_eq!(store.get(SessionFlag::OnboardingComplete).await.unwrap(), None);
}

#[tokio::test]
async fn question_bank_reads_authored_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("questions.json");
    std::fs::write(
        &path,
        r#"[
  {
    "id": "q1",
    "category": "CIS v8.1",
    "topic": "1. Inventory and Control of Enterprise Assets",
    "question": "How are assets documented?",
    "helptext": "CIS 1.1",
    "stepIndex": 0,
    "options": [
      { "id": "q1-opt1", "text": "No inventory.", "score": 1 },
      { "id": "q1-opt2", "text": "CMDB.", "score": 2 }
    ]
  }
]"#,
    )
    .unwrap();

    let questions = JsonQuestionBank::new(&path).list_questions().await.unwrap();
    assert_eq!(questions.len(), 1);
    assert_eq!(questions[0].id().as_str(), "q1");
    assert_eq!(questions[0].help_text(), "CIS 1.1");
    assert_eq!(questions[0].options()[1].score.value(), 2);
}

#[tokio::test]
async fn question_bank_rejects_out_of_range_scores() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("questions.json");
    std::fs::write(
        &path,
        r#"[{"id":"q1","category":"c","topic":"t","question":"p","stepIndex":0,
            "options":[{"id":"a","text":"x","score":9}]}]"#,
    )
    .unwrap();

    let err = JsonQuestionBank::new(&path).list_questions().await.unwrap_err();
    assert!(matches!(err, StorageError::Serialization(_)));
}

#[tokio::test]
async fn missing_question_bank_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let err = JsonQuestionBank::new(dir.path().join("absent.json"))
        .list_questions()
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
}
