use super::*;
use chrono::{Duration, TimeZone};

use crate::error::StoreError;
use crate::models::Word;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 9, 1, 19, 0, 0).unwrap()
}

async fn setup() -> (Db, i64) {
    let db = Db::in_memory().await.unwrap();
    let learner = db.create_learner("dana").await.unwrap();
    (db, learner.id)
}

#[tokio::test]
async fn test_session_presents_snapshot_in_order() {
    let (db, learner) = setup().await;
    let session = StudySession::start(&db, learner, StudyMode::Spelling, Some("小学".into()), 3, now())
        .await
        .unwrap();

    assert_eq!(session.total(), 3);
    let prompt = session.current().unwrap();
    assert_eq!(prompt.direction, Direction::Spelling);
    assert_eq!(prompt.text, "猫");
    assert_eq!(prompt.position, 1);
    assert_eq!(prompt.total, 3);
}

#[tokio::test]
async fn test_submit_records_and_advances() {
    let (db, learner) = setup().await;
    let mut session = StudySession::start(&db, learner, StudyMode::Spelling, Some("小学".into()), 2, now())
        .await
        .unwrap();

    let outcome = session.submit(&db, "Cat", now()).await.unwrap().unwrap();
    assert!(outcome.correct);
    assert_eq!(outcome.progress.mastery_level(), 1);
    assert!(!outcome.finished);
    assert_eq!(session.current().unwrap().text, "狗");

    let outcome = session.submit(&db, "cat", now()).await.unwrap().unwrap();
    assert!(!outcome.correct);
    assert_eq!(outcome.expected, "dog");
    assert!(outcome.feedback.contains("'cat' 是另一个单词"));
    assert!(outcome.finished);
    assert!(session.is_finished());
    assert_eq!((session.correct, session.answered), (1, 2));

    assert!(session.submit(&db, "anything", now()).await.unwrap().is_none());
    assert!(session.current().is_none());
}

#[tokio::test]
async fn test_meaning_direction() {
    let (db, learner) = setup().await;
    let mut session = StudySession::start(&db, learner, StudyMode::Meaning, Some("小学".into()), 1, now())
        .await
        .unwrap();

    assert_eq!(session.current().unwrap().text, "cat");
    let outcome = session.submit(&db, "猫", now()).await.unwrap().unwrap();
    assert!(outcome.correct);
    assert_eq!(outcome.direction, Direction::Meaning);
}

#[tokio::test]
async fn test_reveal_counts_as_incorrect() {
    let (db, learner) = setup().await;
    let mut session = StudySession::start(&db, learner, StudyMode::Spelling, Some("小学".into()), 1, now())
        .await
        .unwrap();

    let outcome = session.reveal(&db, now()).await.unwrap().unwrap();
    assert!(!outcome.correct);
    assert_eq!(outcome.feedback, "答案是：cat");
    assert_eq!(outcome.progress.difficulty(), 2);
    assert_eq!(outcome.progress.next_due_at(), Some(now() + Duration::minutes(15)));
    assert!(session.reveal(&db, now()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_empty_due_set_finishes_immediately() {
    let (db, learner) = setup().await;
    let mut session = StudySession::start(&db, learner, StudyMode::Mixed, Some("没有这个级别".into()), 10, now())
        .await
        .unwrap();

    assert!(session.is_finished());
    assert_eq!(session.remaining(), 0);
    assert!(session.current().is_none());
    assert!(session.submit(&db, "cat", now()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_snapshot_ignores_mid_session_changes() {
    let (db, learner) = setup().await;
    let mut session = StudySession::start(&db, learner, StudyMode::Spelling, Some("小学".into()), 2, now())
        .await
        .unwrap();
    let second = session.items[1].word.id;

    // Another client answers the second word; it is no longer due but stays in this session.
    db.record_answer(learner, second, true, Direction::Spelling, now())
        .await
        .unwrap();
    assert_eq!(session.total(), 2);

    session.submit(&db, "cat", now()).await.unwrap();
    assert_eq!(session.current().unwrap().word_id, second);
    let outcome = session.submit(&db, "dog", now()).await.unwrap().unwrap();
    assert_eq!(outcome.progress.consecutive_correct(), 2);
}

#[tokio::test]
async fn test_mixed_mode_only_changes_presentation() {
    let (db, learner) = setup().await;
    let mut session = StudySession::start(&db, learner, StudyMode::Mixed, Some("小学".into()), 5, now())
        .await
        .unwrap();

    while let Some(prompt) = session.current() {
        let item = session.items[session.current_index].word.clone();
        let answer = match prompt.direction {
            Direction::Spelling => {
                assert_eq!(prompt.text, item.meaning);
                item.term.clone()
            }
            Direction::Meaning => {
                assert_eq!(prompt.text, item.term);
                item.meaning.clone()
            }
        };
        let outcome = session.submit(&db, &answer, now()).await.unwrap().unwrap();
        assert!(outcome.correct);
        assert_eq!(outcome.progress.next_due_at(), Some(now() + Duration::minutes(20)));
    }
    assert_eq!(session.correct, 5);
}

#[tokio::test]
async fn test_store_failure_keeps_current_word() {
    let (db, learner) = setup().await;
    let ghost = DueItem {
        word: Word {
            id: 4_242,
            term: "ghost".into(),
            pronunciation: None,
            meaning: "幽灵".into(),
            level: "小学".into(),
            created_at: now(),
        },
        progress: ProgressRecord::fresh(),
    };
    let mut session = StudySession::from_items(learner, StudyMode::Spelling, None, vec![ghost], now());

    assert!(matches!(
        session.submit(&db, "ghost", now()).await,
        Err(StoreError::NotFound(_))
    ));
    assert_eq!(session.current().unwrap().word_id, 4_242);
    assert_eq!(session.answered, 0);
}

#[tokio::test]
async fn test_idle_clock_moves_with_answers() {
    let (db, learner) = setup().await;
    let mut session = StudySession::start(&db, learner, StudyMode::Spelling, Some("小学".into()), 2, now())
        .await
        .unwrap();
    let ttl = Duration::minutes(30);

    assert!(!session.is_idle(now() + Duration::minutes(29), ttl));
    assert!(session.is_idle(now() + Duration::minutes(30), ttl));

    session.submit(&db, "cat", now() + Duration::minutes(20)).await.unwrap();
    assert!(!session.is_idle(now() + Duration::minutes(45), ttl));

    // A stale clock never moves the session backwards.
    session.touch(now());
    assert!(!session.is_idle(now() + Duration::minutes(45), ttl));
    assert_eq!(session.started_at, now());
}
