//! Persistence layer: sqlite via `sqlx` — a single pool, embedded
//! migrations run on open, one repository struct per aggregate.
//!
//! Four logical tables plus the transient job record: users, games,
//! positions, puzzles, analysis_jobs. Writes are upserts keyed on natural
//! IDs: `(user, externalId)`, `(game, ply)`.

mod database;
mod games;
mod jobs;
mod positions;
mod puzzles;
mod traits;

pub use database::Database;
pub use games::SqliteGameRepository;
pub use jobs::SqliteJobRepository;
pub use positions::SqlitePositionRepository;
pub use puzzles::SqlitePuzzleRepository;
pub use traits::{
    GameFilter, GameRepository, JobRepository, PositionRepository, PuzzleFilter, PuzzleRepository,
};

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("sqlite error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("json encoding error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("migration error: {0}")]
    Migration(String),
    #[error("record not found: {0}")]
    NotFound(String),
}
