use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::db::Db;
use crate::error::StoreResult;
use crate::feedback::FeedbackGenerator;
use crate::models::{Direction, DueItem, ProgressRecord, StudyMode};

/// What the learner sees for the current word.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Prompt {
    pub word_id: i64,
    pub direction: Direction,
    pub text: String,
    pub pronunciation: Option<String>,
    pub position: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnswerOutcome {
    pub word_id: i64,
    pub direction: Direction,
    pub correct: bool,
    pub expected: String,
    pub feedback: String,
    pub progress: ProgressRecord,
    pub finished: bool,
}

/// One pass over a batch of due words.
///
/// The batch is fetched once when the session starts and never refreshed, so answers given
/// during the session cannot reorder or extend it.
pub struct StudySession {
    pub id: Uuid,
    pub learner_id: i64,
    pub mode: StudyMode,
    pub level: Option<String>,
    items: Vec<DueItem>,
    current_index: usize,
    current_direction: Option<Direction>,
    pub answered: u32,
    pub correct: u32,
    pub started_at: DateTime<Utc>,
    last_touched: DateTime<Utc>,
}

impl StudySession {
    pub async fn start(
        db: &Db,
        learner_id: i64,
        mode: StudyMode,
        level: Option<String>,
        limit: u32,
        now: DateTime<Utc>,
    ) -> StoreResult<Self> {
        let items = db.query_due(learner_id, now, limit, level.as_deref()).await?;
        log::info!(
            "learner {} starting {:?} session with {} word(s)",
            learner_id,
            mode,
            items.len()
        );
        Ok(Self::from_items(learner_id, mode, level, items, now))
    }

    pub fn from_items(
        learner_id: i64,
        mode: StudyMode,
        level: Option<String>,
        items: Vec<DueItem>,
        now: DateTime<Utc>,
    ) -> Self {
        let mut session = Self {
            id: Uuid::new_v4(),
            learner_id,
            mode,
            level,
            items,
            current_index: 0,
            current_direction: None,
            answered: 0,
            correct: 0,
            started_at: now,
            last_touched: now,
        };
        session.present_current();
        session
    }

    fn present_current(&mut self) {
        self.current_direction = if self.current_index < self.items.len() {
            Some(self.mode.direction(&mut rand::thread_rng()))
        } else {
            None
        };
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_touched = self.last_touched.max(now);
    }

    /// No request has looked at this session for at least `ttl`.
    pub fn is_idle(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now.signed_duration_since(self.last_touched) >= ttl
    }

    pub fn is_finished(&self) -> bool {
        self.current_index >= self.items.len()
    }

    pub fn total(&self) -> usize {
        self.items.len()
    }

    pub fn remaining(&self) -> usize {
        self.items.len().saturating_sub(self.current_index)
    }

    pub fn current(&self) -> Option<Prompt> {
        let item = self.items.get(self.current_index)?;
        let direction = self.current_direction?;
        let text = match direction {
            Direction::Spelling => item.word.meaning.clone(),
            Direction::Meaning => item.word.term.clone(),
        };
        Some(Prompt {
            word_id: item.word.id,
            direction,
            text,
            pronunciation: item.word.pronunciation.clone(),
            position: self.current_index + 1,
            total: self.items.len(),
        })
    }

    /// Checks the answer to the current word, records it and moves on.
    /// Returns `None` once the session is over.
    pub async fn submit(&mut self, db: &Db, user_input: &str, now: DateTime<Utc>) -> StoreResult<Option<AnswerOutcome>> {
        let (item, direction) = match self.current_entry() {
            Some(entry) => entry,
            None => return Ok(None),
        };
        let correct = FeedbackGenerator::is_correct(direction, &item.word, user_input);

        let feedback = if correct {
            "回答正确！".to_string()
        } else {
            let vocabulary = db.list_words(None).await?;
            FeedbackGenerator::generate_explanation(direction, &item.word, user_input, &vocabulary)
        };

        self.finish_current(db, item, direction, correct, feedback, now).await.map(Some)
    }

    /// Shows the answer to the current word. Counts as an incorrect answer.
    pub async fn reveal(&mut self, db: &Db, now: DateTime<Utc>) -> StoreResult<Option<AnswerOutcome>> {
        let (item, direction) = match self.current_entry() {
            Some(entry) => entry,
            None => return Ok(None),
        };
        let feedback = format!(
            "答案是：{}",
            FeedbackGenerator::expected_answer(direction, &item.word)
        );

        self.finish_current(db, item, direction, false, feedback, now).await.map(Some)
    }

    fn current_entry(&self) -> Option<(DueItem, Direction)> {
        let item = self.items.get(self.current_index)?.clone();
        Some((item, self.current_direction?))
    }

    async fn finish_current(
        &mut self,
        db: &Db,
        item: DueItem,
        direction: Direction,
        correct: bool,
        feedback: String,
        now: DateTime<Utc>,
    ) -> StoreResult<AnswerOutcome> {
        // On a store failure the session stays on this word so the answer can be retried.
        let progress = db
            .record_answer(self.learner_id, item.word.id, correct, direction, now)
            .await?;

        self.touch(now);
        self.answered += 1;
        if correct {
            self.correct += 1;
        }
        self.current_index += 1;
        self.present_current();

        if self.is_finished() {
            log::info!(
                "session {} finished: {}/{} correct",
                self.id,
                self.correct,
                self.answered
            );
        }

        Ok(AnswerOutcome {
            word_id: item.word.id,
            direction,
            correct,
            expected: FeedbackGenerator::expected_answer(direction, &item.word).to_string(),
            feedback,
            progress,
            finished: self.is_finished(),
        })
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
