//! Repository trait definitions. Methods return `impl Future + Send`
//! rather than `async fn` so the futures stay `Send` across
//! `tokio::spawn`, since pipeline workers hold a repository handle across
//! an await point inside a spawned task.

use std::future::Future;

use chess_analytics_core::{AnalysisJob, Game, Position, Puzzle};

use super::PersistenceError;

/// Filters accepted by the puzzle-listing and game-listing endpoints of
/// the HTTP interface. All fields are optional; `None` means "don't filter on this".
#[derive(Debug, Clone, Default)]
pub struct GameFilter {
    pub rated: Option<bool>,
    pub time_category: Option<chess_analytics_core::TimeCategory>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Default)]
pub struct PuzzleFilter {
    pub rated: Option<bool>,
    pub time_category: Option<chess_analytics_core::TimeCategory>,
    pub category: Option<analysis::Category>,
    pub label: Option<analysis::TacticalTagKind>,
    pub limit: u32,
    pub offset: u32,
}

pub trait GameRepository: Send + Sync {
    /// Upserts a game keyed on `(username, external_id)`; returns its row
    /// id either way.
    fn upsert_game(&self, game: &Game) -> impl Future<Output = Result<i64, PersistenceError>> + Send;
    fn get_game(&self, id: i64) -> impl Future<Output = Result<Option<Game>, PersistenceError>> + Send;
    fn list_games(
        &self,
        username: &str,
        filter: &GameFilter,
    ) -> impl Future<Output = Result<Vec<Game>, PersistenceError>> + Send;
    /// Games belonging to `username` with `positions_parsed = false`, in
    /// insertion order — the leftmost-incomplete-row resumption contract
    /// of orchestration.
    fn list_unparsed_games(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<Vec<Game>, PersistenceError>> + Send;
    fn mark_positions_parsed(
        &self,
        game_id: i64,
    ) -> impl Future<Output = Result<(), PersistenceError>> + Send;
    fn update_accuracy(
        &self,
        game_id: i64,
        accuracy_white: Option<f64>,
        accuracy_black: Option<f64>,
    ) -> impl Future<Output = Result<(), PersistenceError>> + Send;
}

pub trait PositionRepository: Send + Sync {
    /// Inserts every position of a freshly-parsed game in one shot.
    fn insert_positions(
        &self,
        positions: &[Position],
    ) -> impl Future<Output = Result<(), PersistenceError>> + Send;
    fn list_positions(
        &self,
        game_id: i64,
    ) -> impl Future<Output = Result<Vec<Position>, PersistenceError>> + Send;
    /// Positions across `username`'s games still missing an eval (and not
    /// `eval_failed`), in `(game, ply)` order, capped at `limit`.
    fn list_unevaluated(
        &self,
        username: &str,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<Position>, PersistenceError>> + Send;
    /// Persists an evaluation. A larger `depth` overrides a smaller one on
    /// re-evaluation (the Position invariant); a smaller depth is a no-op.
    fn update_eval(
        &self,
        game_id: i64,
        ply: u32,
        eval_cp: i32,
        depth: u32,
        pv: &[String],
    ) -> impl Future<Output = Result<(), PersistenceError>> + Send;
    fn mark_eval_failed(
        &self,
        game_id: i64,
        ply: u32,
    ) -> impl Future<Output = Result<(), PersistenceError>> + Send;
    /// True once every position of the game has a non-null `eval` or is
    /// flagged `eval_failed` — the backpressure gate of the concurrency model that the
    /// puzzle generator must pass before it can run.
    fn is_game_fully_evaluated(
        &self,
        game_id: i64,
    ) -> impl Future<Output = Result<bool, PersistenceError>> + Send;
}

pub trait PuzzleRepository: Send + Sync {
    /// Idempotent: a `(game, ply)` pair already materialized as a puzzle
    /// is left untouched (mistake detection's idempotence contract).
    fn insert_puzzle(
        &self,
        puzzle: &Puzzle,
    ) -> impl Future<Output = Result<bool, PersistenceError>> + Send;
    fn puzzle_exists(
        &self,
        game_id: i64,
        ply: u32,
    ) -> impl Future<Output = Result<bool, PersistenceError>> + Send;
    fn list_puzzles(
        &self,
        username: &str,
        filter: &PuzzleFilter,
    ) -> impl Future<Output = Result<(Vec<Puzzle>, u64), PersistenceError>> + Send;
    fn get_puzzle(
        &self,
        game_id: i64,
        ply: u32,
    ) -> impl Future<Output = Result<Option<Puzzle>, PersistenceError>> + Send;
}

pub trait JobRepository: Send + Sync {
    fn get_job(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<Option<AnalysisJob>, PersistenceError>> + Send;
    fn upsert_job(
        &self,
        job: &AnalysisJob,
    ) -> impl Future<Output = Result<(), PersistenceError>> + Send;
}
