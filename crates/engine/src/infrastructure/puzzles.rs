//! SQLite-backed puzzle storage.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crossduel_domain::{ClueMap, Puzzle, PuzzleId, StoredPuzzle};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::path::Path;

use crate::infrastructure::ports::{PuzzleRepo, RepoError};

/// SQLite implementation of the puzzle store.
///
/// `clues` and `answers` are JSON objects stored as text; `created_at` is
/// RFC3339 text.
pub struct SqlitePuzzleRepo {
    pool: SqlitePool,
}

impl SqlitePuzzleRepo {
    pub async fn new(db_path: &str) -> Result<Self, RepoError> {
        if let Some(parent) = Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| RepoError::Unavailable(e.to_string()))?;
            }
        }

        let pool = SqlitePool::connect(&format!("sqlite:{}?mode=rwc", db_path))
            .await
            .map_err(|e| RepoError::Unavailable(e.to_string()))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS puzzles (
                id INTEGER PRIMARY KEY,
                title TEXT NOT NULL,
                grid TEXT NOT NULL,
                clues TEXT NOT NULL,
                answers TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| RepoError::database("puzzles", e))?;

        Ok(Self { pool })
    }

    fn row_to_puzzle(row: &SqliteRow) -> Result<StoredPuzzle, RepoError> {
        let column = |e: sqlx::Error| RepoError::database("puzzles", e);

        let id: i64 = row.try_get("id").map_err(column)?;
        let title: String = row.try_get("title").map_err(column)?;
        let grid: String = row.try_get("grid").map_err(column)?;
        let clues_json: String = row.try_get("clues").map_err(column)?;
        let answers_json: String = row.try_get("answers").map_err(column)?;
        let created_at: String = row.try_get("created_at").map_err(column)?;

        let clues: ClueMap = serde_json::from_str(&clues_json)
            .map_err(|e| RepoError::serialization(format!("error parsing clues: {e}")))?;
        let answers: ClueMap = serde_json::from_str(&answers_json)
            .map_err(|e| RepoError::serialization(format!("error parsing answers: {e}")))?;
        let created_at = DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| RepoError::serialization(format!("error parsing created_at: {e}")))?
            .with_timezone(&Utc);

        let puzzle = Puzzle::new(grid, clues, answers).map_err(RepoError::serialization)?;
        StoredPuzzle::new(PuzzleId::new(id), title, puzzle, created_at)
            .map_err(RepoError::serialization)
    }
}

#[async_trait]
impl PuzzleRepo for SqlitePuzzleRepo {
    async fn get(&self, id: PuzzleId) -> Result<Option<StoredPuzzle>, RepoError> {
        let row = sqlx::query(
            "SELECT id, title, grid, clues, answers, created_at FROM puzzles WHERE id = ?",
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::database("puzzles", e))?;

        row.as_ref().map(Self::row_to_puzzle).transpose()
    }

    async fn save(&self, puzzle: &StoredPuzzle) -> Result<(), RepoError> {
        let clues = serde_json::to_string(&puzzle.puzzle.clues)
            .map_err(|e| RepoError::Serialization(e.to_string()))?;
        let answers = serde_json::to_string(&puzzle.puzzle.answers)
            .map_err(|e| RepoError::Serialization(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO puzzles (id, title, grid, clues, answers, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                grid = excluded.grid,
                clues = excluded.clues,
                answers = excluded.answers,
                created_at = excluded.created_at
            "#,
        )
        .bind(puzzle.id.get())
        .bind(&puzzle.title)
        .bind(&puzzle.puzzle.grid)
        .bind(clues)
        .bind(answers)
        .bind(puzzle.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::database("puzzles", e))?;

        Ok(())
    }
}

/// Stand-in used when the store could not be opened at startup.
/// Every lookup fails, so sessions play the fallback puzzle.
pub struct UnavailablePuzzleRepo {
    reason: String,
}

impl UnavailablePuzzleRepo {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl PuzzleRepo for UnavailablePuzzleRepo {
    async fn get(&self, _id: PuzzleId) -> Result<Option<StoredPuzzle>, RepoError> {
        Err(RepoError::Unavailable(self.reason.clone()))
    }

    async fn save(&self, _puzzle: &StoredPuzzle) -> Result<(), RepoError> {
        Err(RepoError::Unavailable(self.reason.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn temp_db() -> (tempfile::TempDir, String) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("puzzles.db").to_string_lossy().into_owned();
        (dir, path)
    }

    fn sample(id: i64) -> StoredPuzzle {
        let puzzle = Puzzle::new(
            "CAT#\n#DOG",
            BTreeMap::from([("1-Across".to_string(), "Feline".to_string())]),
            BTreeMap::from([("1-Across".to_string(), "CAT".to_string())]),
        )
        .unwrap();
        let created_at = "2024-01-02T03:04:05Z".parse::<DateTime<Utc>>().unwrap();
        StoredPuzzle::new(PuzzleId::new(id), "Pets", puzzle, created_at).unwrap()
    }

    #[tokio::test]
    async fn saved_puzzle_round_trips_through_json_columns() {
        let (_dir, path) = temp_db();
        let repo = SqlitePuzzleRepo::new(&path).await.unwrap();

        repo.save(&sample(1)).await.unwrap();
        let loaded = repo.get(PuzzleId::new(1)).await.unwrap();

        assert_eq!(loaded, Some(sample(1)));
    }

    #[tokio::test]
    async fn missing_puzzle_is_none() {
        let (_dir, path) = temp_db();
        let repo = SqlitePuzzleRepo::new(&path).await.unwrap();

        assert_eq!(repo.get(PuzzleId::new(42)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn corrupt_clues_column_is_a_serialization_error() {
        let (_dir, path) = temp_db();
        let repo = SqlitePuzzleRepo::new(&path).await.unwrap();

        sqlx::query(
            "INSERT INTO puzzles (id, title, grid, clues, answers, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(9_i64)
        .bind("Broken")
        .bind("grid")
        .bind("not json")
        .bind("{}")
        .bind("2024-01-02T03:04:05Z")
        .execute(&repo.pool)
        .await
        .unwrap();

        let err = repo.get(PuzzleId::new(9)).await.unwrap_err();
        assert!(matches!(err, RepoError::Serialization(_)));
    }

    #[tokio::test]
    async fn creates_missing_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/data/puzzles.db");
        let repo = SqlitePuzzleRepo::new(&path.to_string_lossy()).await.unwrap();

        repo.save(&sample(2)).await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn unavailable_store_always_fails() {
        let repo = UnavailablePuzzleRepo::new("connection refused");
        let err = repo.get(PuzzleId::new(1)).await.unwrap_err();
        assert!(matches!(err, RepoError::Unavailable(ref reason) if reason == "connection refused"));
    }
}
