use std::cmp::Ordering;

use chrono::{DateTime, Duration, Utc};

use crate::models::{DueItem, ProgressRecord, MAX_DIFFICULTY, MAX_MASTERY, MIN_DIFFICULTY};

/// A streak of this many correct answers retires a word.
pub const RETIREMENT_STREAK: u32 = 3;
pub const RETIREMENT_DAYS: i64 = 365;

/// Applies one answer to a progress record and schedules the next review.
///
/// Counters and levels move first, then the interval is picked from the
/// post-update streak, mastery and difficulty:
///
/// * streak of 3 or more: retired for a year, mastery forced to 5
/// * correct: mastery ladder, 20 min / 1 h / 8 h / 1 day / 2 days
/// * incorrect: relapse interval, 5 min (difficulty >= 4) / 10 min (3) / 15 min
///
/// A retired word that is answered again keeps retiring, so retirement is undone only by
/// a wrong answer or a reset. Counters saturate at `u32::MAX`.
pub fn advance(record: &ProgressRecord, is_correct: bool, now: DateTime<Utc>) -> ProgressRecord {
    let mut next = record.clone();
    next.review_count = next.review_count.saturating_add(1);

    if is_correct {
        next.correct_count = next.correct_count.saturating_add(1);
        next.consecutive_correct = next.consecutive_correct.saturating_add(1);
        next.mastery_level = (next.mastery_level + 1).min(MAX_MASTERY);
        next.difficulty = next.difficulty.saturating_sub(1).max(MIN_DIFFICULTY);
    } else {
        next.consecutive_correct = 0;
        next.mastery_level = next.mastery_level.saturating_sub(1);
        next.difficulty = (next.difficulty + 1).min(MAX_DIFFICULTY);
    }

    if next.consecutive_correct >= RETIREMENT_STREAK {
        next.mastery_level = MAX_MASTERY;
    }

    let interval = next_interval(
        is_correct,
        next.consecutive_correct,
        next.mastery_level,
        next.difficulty,
    );
    next.last_reviewed_at = Some(now);
    // Past the end of the representable calendar the review lands on the last instant.
    next.next_due_at = Some(now.checked_add_signed(interval).unwrap_or(DateTime::<Utc>::MAX_UTC));

    next
}

/// The interval table on its own; arguments are the post-update values.
pub fn next_interval(is_correct: bool, consecutive_correct: u32, mastery_level: u8, difficulty: u8) -> Duration {
    if consecutive_correct >= RETIREMENT_STREAK {
        return Duration::days(RETIREMENT_DAYS);
    }

    if is_correct {
        match mastery_level {
            0 | 1 => Duration::minutes(20),
            2 => Duration::hours(1),
            3 => Duration::hours(8),
            4 => Duration::days(1),
            _ => Duration::days(2),
        }
    } else {
        match difficulty {
            d if d >= 4 => Duration::minutes(5),
            3 => Duration::minutes(10),
            _ => Duration::minutes(15),
        }
    }
}

/// A never-reviewed record is due immediately.
pub fn is_due(record: &ProgressRecord, now: DateTime<Utc>) -> bool {
    match record.next_due_at {
        None => true,
        Some(due) => due <= now,
    }
}

pub fn is_retired(record: &ProgressRecord) -> bool {
    record.consecutive_correct >= RETIREMENT_STREAK
}

/// Due and not retired. The streak check still holds when `now` jumps past a retirement date.
pub fn is_eligible(record: &ProgressRecord, now: DateTime<Utc>) -> bool {
    is_due(record, now) && !is_retired(record)
}

/// Earliest due first, never-reviewed before everything, then word creation order.
pub fn selection_order(a: &DueItem, b: &DueItem) -> Ordering {
    match (a.progress.next_due_at, b.progress.next_due_at) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => x.cmp(&y),
    }
    .then_with(|| a.word.id.cmp(&b.word.id))
}

pub fn sort_for_selection(items: &mut [DueItem]) {
    items.sort_by(selection_order);
}

/// In-memory due-set selection over already loaded items.
///
/// The category filter is applied first, then eligibility, then ordering and the batch cap.
pub fn select_due(items: Vec<DueItem>, now: DateTime<Utc>, limit: usize, level: Option<&str>) -> Vec<DueItem> {
    let mut due: Vec<DueItem> = items
        .into_iter()
        .filter(|item| level.map_or(true, |l| item.word.level == l))
        .filter(|item| is_eligible(&item.progress, now))
        .collect();
    sort_for_selection(&mut due);
    due.truncate(limit);
    due
}

#[cfg(test)]
#[path = "srs_tests.rs"]
mod tests;
