use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub const MIN_DIFFICULTY: u8 = 1;
pub const MAX_DIFFICULTY: u8 = 5;
pub const MIN_MASTERY: u8 = 0;
pub const MAX_MASTERY: u8 = 5;

/// Schedule state of one (learner, word) pair.
///
/// Fields are only reachable through the constructors, so a value of this type always
/// satisfies the range and counter invariants. The scheduler relies on that and never
/// clamps its input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ProgressRow", into = "ProgressRow")]
pub struct ProgressRecord {
    pub(crate) review_count: u32,
    pub(crate) correct_count: u32,
    pub(crate) difficulty: u8,
    pub(crate) mastery_level: u8,
    pub(crate) consecutive_correct: u32,
    pub(crate) last_reviewed_at: Option<DateTime<Utc>>,
    pub(crate) next_due_at: Option<DateTime<Utc>>,
}

impl ProgressRecord {
    /// State of a word the learner has never seen: due immediately.
    pub fn fresh() -> Self {
        Self {
            review_count: 0,
            correct_count: 0,
            difficulty: MIN_DIFFICULTY,
            mastery_level: MIN_MASTERY,
            consecutive_correct: 0,
            last_reviewed_at: None,
            next_due_at: None,
        }
    }

    pub fn new(
        review_count: u32,
        correct_count: u32,
        difficulty: u8,
        mastery_level: u8,
        consecutive_correct: u32,
        last_reviewed_at: Option<DateTime<Utc>>,
        next_due_at: Option<DateTime<Utc>>,
    ) -> Result<Self, ValidationError> {
        check_range("difficulty", difficulty as i64, MIN_DIFFICULTY, MAX_DIFFICULTY)?;
        check_range("mastery_level", mastery_level as i64, MIN_MASTERY, MAX_MASTERY)?;
        if correct_count > review_count {
            return Err(ValidationError::CorrectExceedsReviews {
                correct: correct_count,
                reviews: review_count,
            });
        }
        if consecutive_correct > correct_count {
            return Err(ValidationError::StreakExceedsCorrect {
                streak: consecutive_correct,
                correct: correct_count,
            });
        }

        Ok(Self {
            review_count,
            correct_count,
            difficulty,
            mastery_level,
            consecutive_correct,
            last_reviewed_at,
            next_due_at,
        })
    }

    pub fn review_count(&self) -> u32 {
        self.review_count
    }

    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    pub fn difficulty(&self) -> u8 {
        self.difficulty
    }

    pub fn mastery_level(&self) -> u8 {
        self.mastery_level
    }

    pub fn consecutive_correct(&self) -> u32 {
        self.consecutive_correct
    }

    pub fn last_reviewed_at(&self) -> Option<DateTime<Utc>> {
        self.last_reviewed_at
    }

    pub fn next_due_at(&self) -> Option<DateTime<Utc>> {
        self.next_due_at
    }
}

impl Default for ProgressRecord {
    fn default() -> Self {
        Self::fresh()
    }
}

fn check_range(field: &'static str, value: i64, min: u8, max: u8) -> Result<(), ValidationError> {
    if value < min as i64 || value > max as i64 {
        return Err(ValidationError::OutOfRange {
            field,
            value,
            min: min as i64,
            max: max as i64,
        });
    }
    Ok(())
}

fn non_negative(field: &'static str, value: i64) -> Result<u32, ValidationError> {
    u32::try_from(value).map_err(|_| ValidationError::OutOfRange {
        field,
        value,
        min: 0,
        max: u32::MAX as i64,
    })
}

fn level(field: &'static str, value: i64, min: u8, max: u8) -> Result<u8, ValidationError> {
    check_range(field, value, min, max)?;
    Ok(value as u8)
}

fn timestamp(field: &'static str, millis: Option<i64>) -> Result<Option<DateTime<Utc>>, ValidationError> {
    millis
        .map(|ms| DateTime::from_timestamp_millis(ms).ok_or(ValidationError::Timestamp { field, millis: ms }))
        .transpose()
}

/// Loosely typed form of a progress record, as it sits in a database row or a JSON body.
/// Timestamps are Unix milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRow {
    pub review_count: i64,
    pub correct_count: i64,
    pub difficulty: i64,
    pub mastery_level: i64,
    pub consecutive_correct: i64,
    pub last_reviewed_at: Option<i64>,
    pub next_due_at: Option<i64>,
}

impl TryFrom<ProgressRow> for ProgressRecord {
    type Error = ValidationError;

    fn try_from(row: ProgressRow) -> Result<Self, Self::Error> {
        ProgressRecord::new(
            non_negative("review_count", row.review_count)?,
            non_negative("correct_count", row.correct_count)?,
            level("difficulty", row.difficulty, MIN_DIFFICULTY, MAX_DIFFICULTY)?,
            level("mastery_level", row.mastery_level, MIN_MASTERY, MAX_MASTERY)?,
            non_negative("consecutive_correct", row.consecutive_correct)?,
            timestamp("last_reviewed_at", row.last_reviewed_at)?,
            timestamp("next_due_at", row.next_due_at)?,
        )
    }
}

impl From<ProgressRecord> for ProgressRow {
    fn from(record: ProgressRecord) -> Self {
        Self {
            review_count: record.review_count as i64,
            correct_count: record.correct_count as i64,
            difficulty: record.difficulty as i64,
            mastery_level: record.mastery_level as i64,
            consecutive_correct: record.consecutive_correct as i64,
            last_reviewed_at: record.last_reviewed_at.map(|t| t.timestamp_millis()),
            next_due_at: record.next_due_at.map(|t| t.timestamp_millis()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Word {
    pub id: i64, // insertion order doubles as creation order
    pub term: String,
    pub pronunciation: Option<String>,
    pub meaning: String,
    pub level: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Learner {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Which side of a word is shown and which side the learner must produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Prompt with the meaning, answer with the term.
    Spelling,
    /// Prompt with the term, answer with the meaning.
    Meaning,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Spelling => "spelling",
            Direction::Meaning => "meaning",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "spelling" => Ok(Direction::Spelling),
            "meaning" => Ok(Direction::Meaning),
            other => Err(ValidationError::Mode(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StudyMode {
    #[default]
    Spelling,
    Meaning,
    Mixed,
}

impl StudyMode {
    /// Mixed mode flips a coin for every item; the choice never feeds back into scheduling.
    pub fn direction<R: Rng + ?Sized>(&self, rng: &mut R) -> Direction {
        match self {
            StudyMode::Spelling => Direction::Spelling,
            StudyMode::Meaning => Direction::Meaning,
            StudyMode::Mixed => {
                if rng.gen_bool(0.5) {
                    Direction::Spelling
                } else {
                    Direction::Meaning
                }
            }
        }
    }
}

/// Append-only log entry; feeds statistics only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnswerEvent {
    pub learner_id: i64,
    pub word_id: i64,
    pub is_correct: bool,
    pub mode: Direction,
    pub answered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DueItem {
    pub word: Word,
    pub progress: ProgressRecord,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LearnerStatistics {
    pub total_words: i64,
    pub studied_words: i64,
    pub mastered_words: i64,
    pub today_studied: i64,
    pub accuracy: f64,
    pub mastery_distribution: BTreeMap<i64, i64>,
    pub consecutive_distribution: BTreeMap<i64, i64>,
}
