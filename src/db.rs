use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow, SqliteSynchronous},
    ConnectOptions, FromRow, Row, SqliteConnection, SqlitePool,
};

use crate::config::Config;
use crate::data::DEFAULT_WORDS;
use crate::error::{StoreError, StoreResult, ValidationError};
use crate::models::{
    AnswerEvent, Direction, DueItem, Learner, LearnerStatistics, ProgressRecord, ProgressRow, Word,
};
use crate::srs::{self, RETIREMENT_STREAK};

impl<'r> FromRow<'r, SqliteRow> for Word {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Word {
            id: row.try_get("id")?,
            term: row.try_get("term")?,
            pronunciation: row.try_get("pronunciation")?,
            meaning: row.try_get("meaning")?,
            level: row.try_get("level")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl<'r> FromRow<'r, SqliteRow> for Learner {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Learner {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl<'r> FromRow<'r, SqliteRow> for ProgressRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(ProgressRow {
            review_count: row.try_get("review_count")?,
            correct_count: row.try_get("correct_count")?,
            difficulty: row.try_get("difficulty")?,
            mastery_level: row.try_get("mastery_level")?,
            consecutive_correct: row.try_get("consecutive_correct")?,
            last_reviewed_at: row.try_get("last_reviewed_at")?,
            next_due_at: row.try_get("next_due_at")?,
        })
    }
}

impl<'r> FromRow<'r, SqliteRow> for AnswerEvent {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let mode: String = row.try_get("mode")?;
        let millis: i64 = row.try_get("answered_at")?;
        let answered_at = DateTime::from_timestamp_millis(millis).ok_or_else(|| {
            sqlx::Error::Decode(Box::new(ValidationError::Timestamp {
                field: "answered_at",
                millis,
            }))
        })?;

        Ok(AnswerEvent {
            learner_id: row.try_get("learner_id")?,
            word_id: row.try_get("word_id")?,
            is_correct: row.try_get("is_correct")?,
            mode: mode.parse::<Direction>().map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
            answered_at,
        })
    }
}

/// Reads the progress half of a `words LEFT JOIN progress` row. No progress row means a
/// word the learner has never seen.
fn joined_progress(row: &SqliteRow) -> StoreResult<ProgressRecord> {
    let review_count: Option<i64> = row.try_get("review_count")?;
    if review_count.is_none() {
        return Ok(ProgressRecord::fresh());
    }
    let raw = ProgressRow::from_row(row)?;
    Ok(ProgressRecord::try_from(raw)?)
}

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS learners (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        created_at DATETIME NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS words (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        term TEXT NOT NULL,
        pronunciation TEXT,
        meaning TEXT NOT NULL,
        level TEXT NOT NULL,
        created_at DATETIME NOT NULL
    )
    "#,
    // Scheduling timestamps are Unix milliseconds so due checks compare integers.
    r#"
    CREATE TABLE IF NOT EXISTS progress (
        learner_id INTEGER NOT NULL REFERENCES learners (id),
        word_id INTEGER NOT NULL REFERENCES words (id),
        review_count INTEGER NOT NULL,
        correct_count INTEGER NOT NULL,
        difficulty INTEGER NOT NULL,
        mastery_level INTEGER NOT NULL,
        consecutive_correct INTEGER NOT NULL,
        last_reviewed_at INTEGER,
        next_due_at INTEGER,
        PRIMARY KEY (learner_id, word_id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_progress_due ON progress (learner_id, next_due_at)",
    r#"
    CREATE TABLE IF NOT EXISTS answer_events (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        learner_id INTEGER NOT NULL REFERENCES learners (id),
        word_id INTEGER NOT NULL REFERENCES words (id),
        is_correct BOOLEAN NOT NULL,
        mode TEXT NOT NULL,
        answered_at INTEGER NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_answer_events_learner ON answer_events (learner_id, answered_at)",
    r#"
    CREATE TABLE IF NOT EXISTS learner_state (
        learner_id INTEGER NOT NULL REFERENCES learners (id),
        state_key TEXT NOT NULL,
        state_value TEXT NOT NULL,
        updated_at DATETIME NOT NULL,
        PRIMARY KEY (learner_id, state_key)
    )
    "#,
];

const UPSERT_PROGRESS: &str = r#"
    INSERT INTO progress (
        learner_id, word_id, review_count, correct_count, difficulty,
        mastery_level, consecutive_correct, last_reviewed_at, next_due_at
    )
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
    ON CONFLICT (learner_id, word_id) DO UPDATE SET
        review_count = excluded.review_count,
        correct_count = excluded.correct_count,
        difficulty = excluded.difficulty,
        mastery_level = excluded.mastery_level,
        consecutive_correct = excluded.consecutive_correct,
        last_reviewed_at = excluded.last_reviewed_at,
        next_due_at = excluded.next_due_at
"#;

/// SQLite-backed progress store. Every call names its learner explicitly.
#[derive(Clone)]
pub struct Db {
    pool: SqlitePool,
}

impl Db {
    pub async fn connect(config: &Config) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(&config.database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .log_statements(log::LevelFilter::Trace);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        Self::from_pool(pool).await
    }

    /// Private in-memory database. A single connection keeps every query on the same database.
    pub async fn in_memory() -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?
            .foreign_keys(true)
            .log_statements(log::LevelFilter::Trace);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Self::from_pool(pool).await
    }

    async fn from_pool(pool: SqlitePool) -> StoreResult<Self> {
        let db = Db { pool };
        db.migrate().await?;
        db.seed_database_if_empty().await?;
        Ok(db)
    }

    async fn migrate(&self) -> StoreResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    async fn seed_database_if_empty(&self) -> StoreResult<()> {
        let count: i64 = sqlx::query_scalar("SELECT count(*) FROM words")
            .fetch_one(&self.pool)
            .await?;

        if count == 0 {
            let now = Utc::now();
            let mut tx = self.pool.begin().await?;
            for seed in DEFAULT_WORDS {
                sqlx::query(
                    "INSERT INTO words (term, pronunciation, meaning, level, created_at) VALUES (?, ?, ?, ?, ?)",
                )
                .bind(seed.term)
                .bind(seed.pronunciation)
                .bind(seed.meaning)
                .bind(seed.level)
                .bind(now)
                .execute(&mut *tx)
                .await?;
            }
            tx.commit().await?;
            log::info!("seeded {} default words", DEFAULT_WORDS.len());
        }
        Ok(())
    }

    // ---- learners ----

    pub async fn create_learner(&self, name: &str) -> StoreResult<Learner> {
        let created_at = Utc::now();
        let result = sqlx::query("INSERT INTO learners (name, created_at) VALUES (?, ?)")
            .bind(name)
            .bind(created_at)
            .execute(&self.pool)
            .await;

        match result {
            Ok(done) => {
                log::info!("created learner '{}'", name);
                Ok(Learner {
                    id: done.last_insert_rowid(),
                    name: name.to_string(),
                    created_at,
                })
            }
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(StoreError::Conflict(format!("learner '{}' already exists", name)))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn get_learner(&self, learner_id: i64) -> StoreResult<Option<Learner>> {
        let learner = sqlx::query_as::<_, Learner>("SELECT * FROM learners WHERE id = ?")
            .bind(learner_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(learner)
    }

    pub async fn find_learner(&self, name: &str) -> StoreResult<Option<Learner>> {
        let learner = sqlx::query_as::<_, Learner>("SELECT * FROM learners WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(learner)
    }

    async fn require_learner(&self, learner_id: i64) -> StoreResult<Learner> {
        self.get_learner(learner_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("learner {}", learner_id)))
    }

    // ---- words ----

    pub async fn add_word(
        &self,
        term: &str,
        pronunciation: Option<&str>,
        meaning: &str,
        level: &str,
    ) -> StoreResult<Word> {
        let created_at = Utc::now();
        let done = sqlx::query(
            "INSERT INTO words (term, pronunciation, meaning, level, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(term)
        .bind(pronunciation)
        .bind(meaning)
        .bind(level)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        Ok(Word {
            id: done.last_insert_rowid(),
            term: term.to_string(),
            pronunciation: pronunciation.map(str::to_string),
            meaning: meaning.to_string(),
            level: level.to_string(),
            created_at,
        })
    }

    pub async fn get_word(&self, word_id: i64) -> StoreResult<Option<Word>> {
        let word = sqlx::query_as::<_, Word>("SELECT * FROM words WHERE id = ?")
            .bind(word_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(word)
    }

    pub async fn list_words(&self, level: Option<&str>) -> StoreResult<Vec<Word>> {
        let words = sqlx::query_as::<_, Word>(
            "SELECT * FROM words WHERE (? IS NULL OR level = ?) ORDER BY id",
        )
        .bind(level)
        .bind(level)
        .fetch_all(&self.pool)
        .await?;
        Ok(words)
    }

    /// Distinct word levels, in the order they were first introduced.
    pub async fn levels(&self) -> StoreResult<Vec<String>> {
        let levels = sqlx::query_scalar::<_, String>(
            "SELECT level FROM words GROUP BY level ORDER BY min(id)",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(levels)
    }

    // ---- progress ----

    async fn fetch_progress(
        conn: &mut SqliteConnection,
        learner_id: i64,
        word_id: i64,
    ) -> StoreResult<Option<ProgressRecord>> {
        let row = sqlx::query_as::<_, ProgressRow>(
            "SELECT * FROM progress WHERE learner_id = ? AND word_id = ?",
        )
        .bind(learner_id)
        .bind(word_id)
        .fetch_optional(&mut *conn)
        .await?;

        match row {
            Some(raw) => match ProgressRecord::try_from(raw) {
                Ok(record) => Ok(Some(record)),
                Err(e) => {
                    log::warn!(
                        "rejected stored progress for learner {} word {}: {}",
                        learner_id,
                        word_id,
                        e
                    );
                    Err(e.into())
                }
            },
            None => Ok(None),
        }
    }

    async fn write_progress(
        conn: &mut SqliteConnection,
        learner_id: i64,
        word_id: i64,
        record: &ProgressRecord,
    ) -> StoreResult<()> {
        let row = ProgressRow::from(record.clone());
        sqlx::query(UPSERT_PROGRESS)
            .bind(learner_id)
            .bind(word_id)
            .bind(row.review_count)
            .bind(row.correct_count)
            .bind(row.difficulty)
            .bind(row.mastery_level)
            .bind(row.consecutive_correct)
            .bind(row.last_reviewed_at)
            .bind(row.next_due_at)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    async fn insert_event(conn: &mut SqliteConnection, event: &AnswerEvent) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO answer_events (learner_id, word_id, is_correct, mode, answered_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(event.learner_id)
        .bind(event.word_id)
        .bind(event.is_correct)
        .bind(event.mode.as_str())
        .bind(event.answered_at.timestamp_millis())
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    pub async fn get_progress(&self, learner_id: i64, word_id: i64) -> StoreResult<Option<ProgressRecord>> {
        let mut conn = self.pool.acquire().await?;
        Self::fetch_progress(&mut *conn, learner_id, word_id).await
    }

    /// Upserts one record; a single statement, so atomic per key.
    pub async fn put_progress(&self, learner_id: i64, word_id: i64, record: &ProgressRecord) -> StoreResult<()> {
        let mut conn = self.pool.acquire().await?;
        Self::write_progress(&mut *conn, learner_id, word_id, record).await
    }

    pub async fn append_event(&self, event: &AnswerEvent) -> StoreResult<()> {
        let mut conn = self.pool.acquire().await?;
        Self::insert_event(&mut *conn, event).await
    }

    /// A learner's answer log, newest first.
    pub async fn events(&self, learner_id: i64, limit: u32) -> StoreResult<Vec<AnswerEvent>> {
        let events = sqlx::query_as::<_, AnswerEvent>(
            r#"
            SELECT learner_id, word_id, is_correct, mode, answered_at FROM answer_events
            WHERE learner_id = ?
            ORDER BY answered_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(learner_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(events)
    }

    /// Reads, advances and writes one record and logs the answer, all in one transaction.
    ///
    /// The transaction opens with a write so SQLite hands out its write lock before the read;
    /// two answers to the same word therefore apply one after the other instead of both
    /// starting from the same prior record.
    pub async fn record_answer(
        &self,
        learner_id: i64,
        word_id: i64,
        is_correct: bool,
        mode: Direction,
        now: DateTime<Utc>,
    ) -> StoreResult<ProgressRecord> {
        self.require_learner(learner_id).await?;
        if self.get_word(word_id).await?.is_none() {
            return Err(StoreError::NotFound(format!("word {}", word_id)));
        }

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO progress (learner_id, word_id, review_count, correct_count, difficulty, mastery_level, consecutive_correct)
            VALUES (?, ?, 0, 0, 1, 0, 0)
            ON CONFLICT (learner_id, word_id) DO NOTHING
            "#,
        )
        .bind(learner_id)
        .bind(word_id)
        .execute(&mut *tx)
        .await?;

        let current = Self::fetch_progress(&mut *tx, learner_id, word_id)
            .await?
            .unwrap_or_else(ProgressRecord::fresh);

        let next = srs::advance(&current, is_correct, now);

        Self::write_progress(&mut *tx, learner_id, word_id, &next).await?;
        let event = AnswerEvent {
            learner_id,
            word_id,
            is_correct,
            mode,
            answered_at: now,
        };
        Self::insert_event(&mut *tx, &event).await?;

        tx.commit().await?;

        if srs::is_retired(&next) && !srs::is_retired(&current) {
            log::info!("learner {} retired word {}", learner_id, word_id);
        }
        log::debug!(
            "learner {} word {} answered {} ({}), next due {:?}",
            learner_id,
            word_id,
            if is_correct { "correctly" } else { "incorrectly" },
            mode,
            next.next_due_at()
        );

        Ok(next)
    }

    /// Eligible words for a learner at `now`, filtered by level first, then ordered
    /// never-reviewed first, earliest due next, creation order on ties.
    pub async fn query_due(
        &self,
        learner_id: i64,
        now: DateTime<Utc>,
        limit: u32,
        level: Option<&str>,
    ) -> StoreResult<Vec<DueItem>> {
        let rows = sqlx::query(
            r#"
            SELECT w.id AS id, w.term AS term, w.pronunciation AS pronunciation,
                   w.meaning AS meaning, w.level AS level, w.created_at AS created_at,
                   p.review_count AS review_count, p.correct_count AS correct_count,
                   p.difficulty AS difficulty, p.mastery_level AS mastery_level,
                   p.consecutive_correct AS consecutive_correct,
                   p.last_reviewed_at AS last_reviewed_at, p.next_due_at AS next_due_at
            FROM words w
            LEFT JOIN progress p ON p.word_id = w.id AND p.learner_id = ?
            WHERE (? IS NULL OR w.level = ?)
              AND (p.next_due_at IS NULL OR p.next_due_at <= ?)
              AND (p.word_id IS NULL OR p.consecutive_correct < ?)
            ORDER BY p.next_due_at IS NOT NULL, p.next_due_at ASC, w.id ASC
            LIMIT ?
            "#,
        )
        .bind(learner_id)
        .bind(level)
        .bind(level)
        .bind(now.timestamp_millis())
        .bind(RETIREMENT_STREAK as i64)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        let mut items = Vec::with_capacity(rows.len());
        for row in &rows {
            items.push(DueItem {
                word: Word::from_row(row)?,
                progress: joined_progress(row)?,
            });
        }

        log::debug!("learner {}: {} due word(s)", learner_id, items.len());
        Ok(items)
    }

    pub async fn count_due(&self, learner_id: i64, now: DateTime<Utc>, level: Option<&str>) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT count(*)
            FROM words w
            LEFT JOIN progress p ON p.word_id = w.id AND p.learner_id = ?
            WHERE (? IS NULL OR w.level = ?)
              AND (p.next_due_at IS NULL OR p.next_due_at <= ?)
              AND (p.word_id IS NULL OR p.consecutive_correct < ?)
            "#,
        )
        .bind(learner_id)
        .bind(level)
        .bind(level)
        .bind(now.timestamp_millis())
        .bind(RETIREMENT_STREAK as i64)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Forgets everything a learner has studied. Returns the number of progress records removed.
    pub async fn reset_progress(&self, learner_id: i64) -> StoreResult<u64> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM answer_events WHERE learner_id = ?")
            .bind(learner_id)
            .execute(&mut *tx)
            .await?;
        let removed = sqlx::query("DELETE FROM progress WHERE learner_id = ?")
            .bind(learner_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        log::info!("reset {} progress record(s) for learner {}", removed, learner_id);
        Ok(removed)
    }

    pub async fn statistics(&self, learner_id: i64, now: DateTime<Utc>) -> StoreResult<LearnerStatistics> {
        let total_words: i64 = sqlx::query_scalar("SELECT count(*) FROM words")
            .fetch_one(&self.pool)
            .await?;

        let studied_words: i64 = sqlx::query_scalar(
            "SELECT count(*) FROM progress WHERE learner_id = ? AND review_count > 0",
        )
        .bind(learner_id)
        .fetch_one(&self.pool)
        .await?;

        let mastered_words: i64 = sqlx::query_scalar(
            "SELECT count(*) FROM progress WHERE learner_id = ? AND consecutive_correct >= ?",
        )
        .bind(learner_id)
        .bind(RETIREMENT_STREAK as i64)
        .fetch_one(&self.pool)
        .await?;

        let day_start = now.date_naive().and_time(NaiveTime::MIN).and_utc();
        let day_end = day_start + Duration::days(1);
        let today_studied: i64 = sqlx::query_scalar(
            r#"
            SELECT count(DISTINCT word_id) FROM answer_events
            WHERE learner_id = ? AND answered_at >= ? AND answered_at < ?
            "#,
        )
        .bind(learner_id)
        .bind(day_start.timestamp_millis())
        .bind(day_end.timestamp_millis())
        .fetch_one(&self.pool)
        .await?;

        let accuracy: Option<f64> = sqlx::query_scalar(
            "SELECT AVG(CAST(is_correct AS REAL)) * 100.0 FROM answer_events WHERE learner_id = ?",
        )
        .bind(learner_id)
        .fetch_one(&self.pool)
        .await?;

        let mastery_distribution: BTreeMap<i64, i64> = sqlx::query_as::<_, (i64, i64)>(
            "SELECT mastery_level, count(*) FROM progress WHERE learner_id = ? GROUP BY mastery_level",
        )
        .bind(learner_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .collect();

        let consecutive_distribution: BTreeMap<i64, i64> = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT consecutive_correct, count(*) FROM progress
            WHERE learner_id = ? AND review_count > 0
            GROUP BY consecutive_correct
            "#,
        )
        .bind(learner_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .collect();

        Ok(LearnerStatistics {
            total_words,
            studied_words,
            mastered_words,
            today_studied,
            accuracy: (accuracy.unwrap_or(0.0) * 10.0).round() / 10.0,
            mastery_distribution,
            consecutive_distribution,
        })
    }

    // ---- learner state ----

    pub async fn save_state(&self, learner_id: i64, key: &str, value: &serde_json::Value) -> StoreResult<()> {
        self.require_learner(learner_id).await?;
        let encoded = serde_json::to_string(value)?;
        sqlx::query(
            r#"
            INSERT INTO learner_state (learner_id, state_key, state_value, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (learner_id, state_key) DO UPDATE SET
                state_value = excluded.state_value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(learner_id)
        .bind(key)
        .bind(encoded)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn load_state(&self, learner_id: i64, key: &str) -> StoreResult<Option<serde_json::Value>> {
        let raw: Option<String> = sqlx::query_scalar(
            "SELECT state_value FROM learner_state WHERE learner_id = ? AND state_key = ?",
        )
        .bind(learner_id)
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(raw.map(|raw| decode_state(key, raw)))
    }

    pub async fn all_states(&self, learner_id: i64) -> StoreResult<BTreeMap<String, serde_json::Value>> {
        let rows = sqlx::query_as::<_, (String, String)>(
            "SELECT state_key, state_value FROM learner_state WHERE learner_id = ?",
        )
        .bind(learner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(key, raw)| {
                let value = decode_state(&key, raw);
                (key, value)
            })
            .collect())
    }

    /// Removes one key, or every key when `key` is `None`. Returns the number of keys removed.
    pub async fn clear_state(&self, learner_id: i64, key: Option<&str>) -> StoreResult<u64> {
        let removed = sqlx::query(
            "DELETE FROM learner_state WHERE learner_id = ? AND (? IS NULL OR state_key = ?)",
        )
        .bind(learner_id)
        .bind(key)
        .bind(key)
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(removed)
    }
}

fn decode_state(key: &str, raw: String) -> serde_json::Value {
    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            log::warn!("state '{}' is not valid JSON ({}), returning it as text", key, e);
            serde_json::Value::String(raw)
        }
    }
}

#[cfg(test)]
#[path = "db_tests.rs"]
mod tests;
