use thiserror::Error;

/// A progress record (or a stored row meant to become one) breaks a field invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} = {value} is outside {min}..={max}")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },
    #[error("correct_count ({correct}) exceeds review_count ({reviews})")]
    CorrectExceedsReviews { correct: u32, reviews: u32 },
    #[error("consecutive_correct ({streak}) exceeds correct_count ({correct})")]
    StreakExceedsCorrect { streak: u32, correct: u32 },
    #[error("{field} holds an unrepresentable timestamp ({millis} ms)")]
    Timestamp { field: &'static str, millis: i64 },
    #[error("unknown study mode '{0}'")]
    Mode(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid progress record: {0}")]
    Validation(#[from] ValidationError),
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("state value could not be encoded: {0}")]
    Encoding(#[from] serde_json::Error),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;
