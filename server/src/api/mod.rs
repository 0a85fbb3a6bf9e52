//! The typed API layer. No network listener, routing framework, or
//! authentication is wired up here — that shell is an explicit external
//! collaborator — but every request/response shape and every handler
//! method an external HTTP shell would call exists and is exercised by
//! tests.
//!
//! One small struct per group of related calls, generic over the
//! repository traits it actually needs rather than one struct holding
//! every dependency.
//! Adapted away from `tonic`/`Request<T>`/`Status` since this project
//! speaks no wire protocol at all — handlers take and return plain typed
//! structs and a local [`ApiError`].

mod arena;
mod classify;
mod eval;
mod ingest;
mod puzzles;
mod stats;

pub use arena::{ArenaEndpoints, ArenaStatsRequest, ArenaStatsResponse, TargetStatsRequest, TargetStatsResponse};
pub use classify::{classify_test, ClassifyTestRequest, ClassifyTestResponse};
pub use eval::{evaluate_fen, EvalResponse};
pub use ingest::{ImportRequest, ImportResponse, IngestEndpoints, JobStatusResponse};
pub use puzzles::{PuzzleEndpoints, PuzzleListQuery, PuzzleListResponse, PuzzleResponse};
pub use stats::{GameListQuery, GameListResponse, StatsEndpoints, StatsQuery, StatsResponse};

use crate::persistence::{GameRepository, JobRepository, PersistenceError};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error("unknown username: {0}")]
    UnknownUsername(String),
    #[error("puzzle not found")]
    PuzzleNotFound,
    #[error("malformed puzzle id: {0}")]
    MalformedPuzzleId(String),
    #[error("import failed: {0}")]
    Import(#[from] crate::import::ImportError),
    #[error(transparent)]
    Pipeline(#[from] crate::pipeline::PipelineError),
    #[error(transparent)]
    Classify(#[from] analysis::ClassifyError),
    #[error(transparent)]
    Engine(#[from] engine::EvaluatorError),
}

/// Request-path data errors surface to the caller rather than being
/// swallowed: a user asking for stats on an unknown username returns a
/// 404-equivalent. A username is known iff
/// it owns at least one game or an analysis job record — the two tables
/// that get a row written for a user that has ever been imported.
pub(crate) async fn ensure_user_known<G, J>(games: &G, jobs: &J, username: &str) -> Result<(), ApiError>
where
    G: GameRepository,
    J: JobRepository,
{
    if jobs.get_job(username).await?.is_some() {
        return Ok(());
    }
    let any_games = games
        .list_games(username, &crate::persistence::GameFilter { limit: Some(1), ..Default::default() })
        .await?;
    if any_games.is_empty() {
        return Err(ApiError::UnknownUsername(username.to_string()));
    }
    Ok(())
}
