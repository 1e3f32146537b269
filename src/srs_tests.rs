use super::*;
use chrono::TimeZone;
use proptest::prelude::*;

use crate::models::Word;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
}

fn record(reviews: u32, correct: u32, difficulty: u8, mastery: u8, streak: u32) -> ProgressRecord {
    ProgressRecord::new(reviews, correct, difficulty, mastery, streak, None, None).unwrap()
}

fn due_item(id: i64, level: &str, next_due_at: Option<DateTime<Utc>>, streak: u32) -> DueItem {
    let progress = ProgressRecord::new(
        streak.max(1),
        streak,
        1,
        0,
        streak,
        None,
        next_due_at,
    )
    .unwrap();
    DueItem {
        word: Word {
            id,
            term: format!("word{}", id),
            pronunciation: None,
            meaning: format!("meaning{}", id),
            level: level.to_string(),
            created_at: now(),
        },
        progress,
    }
}

#[test]
fn test_fresh_correct_answer() {
    let next = advance(&ProgressRecord::fresh(), true, now());

    assert_eq!(next.review_count(), 1);
    assert_eq!(next.correct_count(), 1);
    assert_eq!(next.mastery_level(), 1);
    assert_eq!(next.difficulty(), 1);
    assert_eq!(next.consecutive_correct(), 1);
    assert_eq!(next.last_reviewed_at(), Some(now()));
    assert_eq!(next.next_due_at(), Some(now() + Duration::minutes(20)));
}

#[test]
fn test_third_correct_in_a_row_retires() {
    let next = advance(&record(2, 2, 1, 3, 2), true, now());

    assert_eq!(next.consecutive_correct(), 3);
    assert_eq!(next.mastery_level(), 5);
    assert_eq!(next.next_due_at(), Some(now() + Duration::days(365)));
    assert!(is_retired(&next));
}

#[test]
fn test_incorrect_on_hard_word_relapses_quickly() {
    let next = advance(&record(6, 3, 4, 2, 1), false, now());

    assert_eq!(next.consecutive_correct(), 0);
    assert_eq!(next.difficulty(), 5);
    assert_eq!(next.mastery_level(), 1);
    assert_eq!(next.correct_count(), 3);
    assert_eq!(next.next_due_at(), Some(now() + Duration::minutes(5)));
}

#[test]
fn test_mastery_ladder() {
    // (prior mastery, expected interval after one more correct answer with no streak)
    let cases = [
        (0, Duration::minutes(20)),
        (1, Duration::hours(1)),
        (2, Duration::hours(8)),
        (3, Duration::days(1)),
        (4, Duration::days(2)),
        (5, Duration::days(2)),
    ];
    for (mastery, expected) in cases {
        let next = advance(&record(5, 1, 3, mastery, 0), true, now());
        assert_eq!(next.next_due_at(), Some(now() + expected), "mastery {}", mastery);
    }
}

#[test]
fn test_relapse_intervals() {
    // prior difficulty 1 -> 2 (15 min), 2 -> 3 (10 min), 3 -> 4 (5 min), 5 stays 5 (5 min)
    let cases = [
        (1, Duration::minutes(15)),
        (2, Duration::minutes(10)),
        (3, Duration::minutes(5)),
        (5, Duration::minutes(5)),
    ];
    for (difficulty, expected) in cases {
        let next = advance(&record(3, 1, difficulty, 2, 1), false, now());
        assert_eq!(next.next_due_at(), Some(now() + expected), "difficulty {}", difficulty);
    }
}

#[test]
fn test_retired_word_stays_retired_on_correct_answer() {
    let retired = advance(&record(2, 2, 1, 3, 2), true, now());
    let later = now() + Duration::days(400);
    let again = advance(&retired, true, later);

    assert_eq!(again.consecutive_correct(), 4);
    assert_eq!(again.mastery_level(), 5);
    assert_eq!(again.next_due_at(), Some(later + Duration::days(365)));
}

#[test]
fn test_wrong_answer_reenters_active_pool() {
    let retired = advance(&record(2, 2, 1, 3, 2), true, now());
    let relapsed = advance(&retired, false, now());

    assert_eq!(relapsed.consecutive_correct(), 0);
    assert_eq!(relapsed.mastery_level(), 4);
    assert!(!is_retired(&relapsed));
    assert!(is_eligible(&relapsed, now() + Duration::minutes(15)));
}

#[test]
fn test_saturated_counters_still_advance() {
    let worn = ProgressRecord::new(u32::MAX, u32::MAX, 1, 4, u32::MAX, None, None).unwrap();

    let next = advance(&worn, true, now());
    assert_eq!(next.review_count(), u32::MAX);
    assert_eq!(next.correct_count(), u32::MAX);
    assert_eq!(next.consecutive_correct(), u32::MAX);
    assert_eq!(next.next_due_at(), Some(now() + Duration::days(365)));

    let next = advance(&ProgressRecord::new(u32::MAX, 0, 1, 0, 0, None, None).unwrap(), false, now());
    assert_eq!(next.review_count(), u32::MAX);
    assert_eq!(next.difficulty(), 2);
}

#[test]
fn test_due_date_caps_at_calendar_end() {
    let edge = DateTime::<Utc>::MAX_UTC - Duration::minutes(1);

    let next = advance(&ProgressRecord::fresh(), true, edge);
    assert_eq!(next.last_reviewed_at(), Some(edge));
    assert_eq!(next.next_due_at(), Some(DateTime::<Utc>::MAX_UTC));

    let next = advance(&ProgressRecord::fresh(), false, DateTime::<Utc>::MAX_UTC);
    assert_eq!(next.next_due_at(), Some(DateTime::<Utc>::MAX_UTC));
}

#[test]
fn test_is_due() {
    assert!(is_due(&ProgressRecord::fresh(), now()));

    let reviewed = advance(&ProgressRecord::fresh(), true, now());
    assert!(!is_due(&reviewed, now()));
    assert!(is_due(&reviewed, now() + Duration::minutes(20)));
}

#[test]
fn test_retired_word_not_eligible_even_after_time_travel() {
    let retired = advance(&record(2, 2, 1, 3, 2), true, now());
    let far_future = now() + Duration::days(1000);

    assert!(is_due(&retired, far_future));
    assert!(!is_eligible(&retired, far_future));
}

#[test]
fn test_select_due_orders_and_excludes() {
    let items = vec![
        due_item(1, "小学", Some(now() + Duration::hours(1)), 0),
        due_item(2, "小学", Some(now() - Duration::hours(1)), 0),
        due_item(3, "小学", None, 0),
    ];

    let ids: Vec<i64> = select_due(items, now(), 10, None)
        .iter()
        .map(|item| item.word.id)
        .collect();
    assert_eq!(ids, vec![3, 2]);
}

#[test]
fn test_select_due_ties_break_by_creation_order() {
    let due = Some(now() - Duration::minutes(5));
    let items = vec![
        due_item(7, "初中", due, 0),
        due_item(4, "初中", due, 0),
        due_item(9, "初中", None, 0),
        due_item(5, "初中", None, 0),
    ];

    let ids: Vec<i64> = select_due(items, now(), 10, None)
        .iter()
        .map(|item| item.word.id)
        .collect();
    assert_eq!(ids, vec![5, 9, 4, 7]);
}

#[test]
fn test_select_due_applies_level_filter_and_limit() {
    let items = vec![
        due_item(1, "小学", None, 0),
        due_item(2, "大学", None, 0),
        due_item(3, "大学", None, 0),
        due_item(4, "大学", None, 0),
        due_item(5, "大学", Some(now() - Duration::days(800)), 3),
    ];

    let ids: Vec<i64> = select_due(items, now(), 2, Some("大学"))
        .iter()
        .map(|item| item.word.id)
        .collect();
    assert_eq!(ids, vec![2, 3]);
}

#[test]
fn test_sort_for_selection_keeps_retired_items() {
    let mut items = vec![
        due_item(3, "小学", Some(now() - Duration::days(2)), 3),
        due_item(2, "小学", Some(now() - Duration::days(1)), 0),
        due_item(1, "小学", None, 0),
    ];
    sort_for_selection(&mut items);

    let ids: Vec<i64> = items.iter().map(|item| item.word.id).collect();
    assert_eq!(ids, vec![1, 3, 2]);
}

#[test]
fn test_select_due_empty_is_not_an_error() {
    let items = vec![due_item(1, "小学", Some(now() + Duration::hours(1)), 0)];
    assert!(select_due(items, now(), 10, None).is_empty());
}

fn arb_record() -> impl Strategy<Value = ProgressRecord> {
    (0u32..50, 1u8..=5, 0u8..=5)
        .prop_flat_map(|(reviews, difficulty, mastery)| {
            (Just(reviews), 0..=reviews, Just(difficulty), Just(mastery))
        })
        .prop_flat_map(|(reviews, correct, difficulty, mastery)| {
            (Just(reviews), Just(correct), Just(difficulty), Just(mastery), 0..=correct)
        })
        .prop_map(|(reviews, correct, difficulty, mastery, streak)| {
            record(reviews, correct, difficulty, mastery, streak)
        })
}

proptest! {
    #[test]
    fn prop_advance_keeps_invariants(start in arb_record(), answers in proptest::collection::vec(any::<bool>(), 1..20)) {
        let mut current = start;
        for is_correct in answers {
            let next = advance(&current, is_correct, now());
            prop_assert!(next.mastery_level() <= 5);
            prop_assert!((1..=5).contains(&next.difficulty()));
            prop_assert!(next.correct_count() <= next.review_count());
            prop_assert!(next.consecutive_correct() <= next.correct_count());
            prop_assert_eq!(next.review_count(), current.review_count() + 1);
            // The result must survive the same validation the store applies.
            prop_assert!(ProgressRecord::try_from(crate::models::ProgressRow::from(next.clone())).is_ok());
            current = next;
        }
    }

    #[test]
    fn prop_single_wrong_answer_resets_streak(start in arb_record()) {
        let next = advance(&start, false, now());
        prop_assert_eq!(next.consecutive_correct(), 0);
        prop_assert_eq!(next.mastery_level(), start.mastery_level().saturating_sub(1));
        prop_assert_eq!(next.difficulty(), (start.difficulty() + 1).min(5));
    }

    #[test]
    fn prop_retirement_is_sticky_under_correct_answers(start in arb_record(), extra in 1usize..6) {
        let mut current = start;
        for _ in 0..3 {
            current = advance(&current, true, now());
        }
        for step in 0..extra {
            let at = now() + Duration::days(400 * (step as i64 + 1));
            let next = advance(&current, true, at);
            prop_assert!(next.consecutive_correct() > current.consecutive_correct());
            prop_assert_eq!(next.next_due_at(), Some(at + Duration::days(365)));
            prop_assert!(!is_eligible(&next, at + Duration::days(10_000)));
            current = next;
        }
    }
}
