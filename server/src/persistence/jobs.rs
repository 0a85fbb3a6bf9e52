//! SQLite-backed [`JobRepository`].

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use chess_analytics_core::{AnalysisJob, AnalysisStatus};

use super::traits::JobRepository;
use super::PersistenceError;

#[derive(Clone)]
pub struct SqliteJobRepository {
    pool: SqlitePool,
}

impl SqliteJobRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn status_to_str(status: AnalysisStatus) -> &'static str {
    match status {
        AnalysisStatus::Idle => "idle",
        AnalysisStatus::Running => "running",
        AnalysisStatus::Done => "done",
        AnalysisStatus::Failed => "failed",
    }
}

fn status_from_str(s: &str) -> AnalysisStatus {
    match s {
        "running" => AnalysisStatus::Running,
        "done" => AnalysisStatus::Done,
        "failed" => AnalysisStatus::Failed,
        _ => AnalysisStatus::Idle,
    }
}

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

type JobRow = (String, String, i64, i64, i64, String, String);

fn row_to_job(row: JobRow) -> AnalysisJob {
    let (username, status, total_games, analyzed_games, puzzles_created, created_at, updated_at) =
        row;
    AnalysisJob {
        username,
        status: status_from_str(&status),
        total_games: total_games as u32,
        analyzed_games: analyzed_games as u32,
        puzzles_created: puzzles_created as u32,
        created_at: parse_timestamp(&created_at),
        updated_at: parse_timestamp(&updated_at),
    }
}

impl JobRepository for SqliteJobRepository {
    async fn get_job(&self, username: &str) -> Result<Option<AnalysisJob>, PersistenceError> {
        let row: Option<JobRow> = sqlx::query_as(
            "SELECT username, status, total_games, analyzed_games, puzzles_created, \
             created_at, updated_at FROM analysis_jobs WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(row_to_job))
    }

    async fn upsert_job(&self, job: &AnalysisJob) -> Result<(), PersistenceError> {
        sqlx::query("INSERT OR IGNORE INTO users (username) VALUES (?)")
            .bind(&job.username)
            .execute(&self.pool)
            .await?;

        sqlx::query(
            "INSERT INTO analysis_jobs \
             (username, status, total_games, analyzed_games, puzzles_created, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT(username) DO UPDATE SET \
             status = excluded.status, \
             total_games = excluded.total_games, \
             analyzed_games = excluded.analyzed_games, \
             puzzles_created = excluded.puzzles_created, \
             updated_at = excluded.updated_at",
        )
        .bind(&job.username)
        .bind(status_to_str(job.status))
        .bind(job.total_games as i64)
        .bind(job.analyzed_games as i64)
        .bind(job.puzzles_created as i64)
        .bind(job.created_at.to_rfc3339())
        .bind(job.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::Database;

    fn sample_job(username: &str) -> AnalysisJob {
        let now = Utc::now();
        AnalysisJob {
            username: username.to_string(),
            status: AnalysisStatus::Running,
            total_games: 10,
            analyzed_games: 3,
            puzzles_created: 2,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn upsert_then_get_round_trips() {
        let db = Database::new_in_memory().await.unwrap();
        let repo = SqliteJobRepository::new(db.pool().clone());

        repo.upsert_job(&sample_job("alice")).await.unwrap();
        let job = repo.get_job("alice").await.unwrap().unwrap();
        assert_eq!(job.status, AnalysisStatus::Running);
        assert_eq!(job.analyzed_games, 3);
    }

    #[tokio::test]
    async fn upsert_overwrites_progress() {
        let db = Database::new_in_memory().await.unwrap();
        let repo = SqliteJobRepository::new(db.pool().clone());

        repo.upsert_job(&sample_job("alice")).await.unwrap();
        let mut job2 = sample_job("alice");
        job2.analyzed_games = 10;
        job2.status = AnalysisStatus::Done;
        repo.upsert_job(&job2).await.unwrap();

        let job = repo.get_job("alice").await.unwrap().unwrap();
        assert_eq!(job.analyzed_games, 10);
        assert_eq!(job.status, AnalysisStatus::Done);
    }

    #[tokio::test]
    async fn missing_job_returns_none() {
        let db = Database::new_in_memory().await.unwrap();
        let repo = SqliteJobRepository::new(db.pool().clone());
        assert!(repo.get_job("nobody").await.unwrap().is_none());
    }
}
