//! Orchestration: runs the five stages for one user's job, updating
//! the job record after each so the polling endpoint observes monotonic
//! progress. Engine work for the evaluate/puzzle stages is spread across
//! a bounded worker pool: each worker owns one
//! [`Evaluator`] for its lifetime and is handed a disjoint slice of games
//! so within-game ply ordering is preserved without any cross-task
//! coordination beyond the database itself.

use chrono::Utc;
use engine::{EngineConfig, Evaluator};

use chess_analytics_core::{AnalysisJob, AnalysisStatus};

use crate::import::{ImportFilter, ImportSource};
use crate::persistence::{GameRepository, JobRepository, PersistenceError, PositionRepository, PuzzleRepository};

use super::accuracy::run_accuracy_stage;
use super::parse::run_parse_stage;
use super::puzzles::{run_puzzle_stage, PuzzleStageError};

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error("import failed: {0}")]
    Import(#[from] crate::import::ImportError),
    #[error("puzzle stage failed: {0}")]
    Puzzle(#[from] PuzzleStageError),
    #[error("failed to spawn engine: {0}")]
    EngineSpawn(String),
}

/// Per-run parameters not already captured by [`crate::config::PipelineConfig`].
pub struct RunOptions {
    pub username: String,
    pub import_filter: ImportFilter,
}

/// Runs the full pipeline once for one user: import, parse, screening
/// evaluation, accuracy, puzzle generation. Safe to call repeatedly — each
/// stage only acts on rows it hasn't already finished.
pub async fn run_pipeline<G, P, Z, J, I>(
    games: &G,
    positions: &P,
    puzzles: &Z,
    jobs: &J,
    import: &I,
    config: &crate::config::PipelineConfig,
    opts: RunOptions,
) -> Result<AnalysisJob, PipelineError>
where
    G: GameRepository,
    P: PositionRepository,
    Z: PuzzleRepository,
    J: JobRepository,
    I: ImportSource,
{
    let username = opts.username.as_str();
    let now = Utc::now();
    let mut job = jobs.get_job(username).await?.unwrap_or(AnalysisJob {
        username: username.to_string(),
        status: AnalysisStatus::Idle,
        total_games: 0,
        analyzed_games: 0,
        puzzles_created: 0,
        created_at: now,
        updated_at: now,
    });
    job.status = AnalysisStatus::Running;
    job.updated_at = Utc::now();
    jobs.upsert_job(&job).await?;

    // Stage 1: import.
    let fetched = import.fetch_games(username, &opts.import_filter).await?;
    for record in &fetched {
        let game = crate::import::record_to_game(record, username);
        games.upsert_game(&game).await?;
    }
    let all_games = games
        .list_games(username, &crate::persistence::GameFilter::default())
        .await?;
    job.total_games = all_games.len() as u32;
    jobs.upsert_job(&job).await?;

    // Stage 2: parse.
    run_parse_stage(games, positions, username).await?;

    // Stage 3: screening evaluation, via a small worker pool.
    run_evaluate_pool(positions, username, config).await?;

    // Stage 4: accuracy.
    run_accuracy_stage(games, positions, username).await?;

    // Stage 5: puzzle generation.
    let mut review_evaluator = spawn_evaluator(config).await.map_err(PipelineError::EngineSpawn)?;
    let puzzles_created = run_puzzle_stage(
        games,
        positions,
        puzzles,
        &mut review_evaluator,
        username,
        config.review_depth,
    )
    .await?;

    let finished_games = games
        .list_games(username, &crate::persistence::GameFilter::default())
        .await?;
    job.analyzed_games = finished_games.iter().filter(|g| g.positions_parsed).count() as u32;
    job.puzzles_created += puzzles_created as u32;
    job.status = AnalysisStatus::Done;
    job.updated_at = Utc::now();
    jobs.upsert_job(&job).await?;

    Ok(job)
}

async fn spawn_evaluator(config: &crate::config::PipelineConfig) -> Result<Evaluator, String> {
    Evaluator::spawn(EngineConfig {
        engine_path: Some(config.engine_path.clone()),
        ..Default::default()
    })
    .await
    .map_err(|e| e.to_string())
}

/// Runs the screening-evaluation stage across `config.concurrency` workers,
/// each owning its own engine process for the duration of the run.
async fn run_evaluate_pool<P: PositionRepository + Clone + Send + Sync + 'static>(
    positions: &P,
    username: &str,
    config: &crate::config::PipelineConfig,
) -> Result<(), PipelineError> {
    let batch_limit = 512u32;
    let pending = positions.list_unevaluated(username, batch_limit).await?;
    if pending.is_empty() {
        return Ok(());
    }

    let shards = partition_by_game(pending, config.concurrency.max(1));

    let mut set = tokio::task::JoinSet::new();
    for shard in shards {
        if shard.is_empty() {
            continue;
        }
        let positions = positions.clone();
        let screening_depth = config.screening_depth;
        let engine_path = config.engine_path.clone();
        set.spawn(async move {
            let mut evaluator = Evaluator::spawn(EngineConfig {
                engine_path: Some(engine_path),
                ..Default::default()
            })
            .await
            .map_err(|e| e.to_string())?;
            for pos in shard {
                match evaluator.analyze_to_depth(&pos.fen, screening_depth).await {
                    Ok(eval) => {
                        evaluator.reset_failure_count();
                        let pv: Vec<String> =
                            eval.pv.iter().map(|m| chess::format_uci_move(*m)).collect();
                        positions
                            .update_eval(pos.game_id, pos.ply, eval.score.as_cp(), eval.depth as u32, &pv)
                            .await
                            .map_err(|e| e.to_string())?;
                    }
                    Err(e) => {
                        tracing::warn!(game_id = pos.game_id, ply = pos.ply, error = %e, "screening evaluation failed");
                        if evaluator.has_failed_three_times() {
                            positions
                                .mark_eval_failed(pos.game_id, pos.ply)
                                .await
                                .map_err(|e| e.to_string())?;
                            evaluator.reset_failure_count();
                        }
                    }
                }
            }
            Ok::<(), String>(())
        });
    }

    while let Some(result) = set.join_next().await {
        result
            .map_err(|e| PipelineError::EngineSpawn(e.to_string()))?
            .map_err(PipelineError::EngineSpawn)?;
    }

    Ok(())
}

/// Groups positions by `game_id` into `worker_count` buckets, assigning
/// whole games round-robin so every worker's slice stays ply-ordered
/// within each game it owns.
fn partition_by_game(
    positions: Vec<chess_analytics_core::Position>,
    worker_count: usize,
) -> Vec<Vec<chess_analytics_core::Position>> {
    let mut buckets: Vec<Vec<chess_analytics_core::Position>> = vec![Vec::new(); worker_count];
    let mut game_to_bucket: std::collections::HashMap<i64, usize> = std::collections::HashMap::new();
    let mut next_bucket = 0;

    for pos in positions {
        let bucket = *game_to_bucket.entry(pos.game_id).or_insert_with(|| {
            let b = next_bucket % worker_count;
            next_bucket += 1;
            b
        });
        buckets[bucket].push(pos);
    }

    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess::PieceColor;
    use chess_analytics_core::Position;

    fn pos(game_id: i64, ply: u32) -> Position {
        Position {
            game_id,
            ply,
            fen: "8/8/8/8/8/8/8/8 w - - 0 1".to_string(),
            move_uci: "e2e4".to_string(),
            san: "e4".to_string(),
            side_to_move: PieceColor::White,
            eval: None,
            eval_depth: None,
            pv: None,
            eval_failed: false,
        }
    }

    #[test]
    fn partition_keeps_a_games_positions_together() {
        let positions = vec![pos(1, 1), pos(1, 2), pos(2, 1), pos(1, 3), pos(2, 2)];
        let buckets = partition_by_game(positions, 2);
        for bucket in &buckets {
            let game_ids: std::collections::HashSet<i64> = bucket.iter().map(|p| p.game_id).collect();
            assert!(game_ids.len() <= 1, "a bucket must not mix games");
        }
        let total: usize = buckets.iter().map(|b| b.len()).sum();
        assert_eq!(total, 5);
    }

    #[test]
    fn partition_preserves_ply_order_within_a_game() {
        let positions = vec![pos(1, 1), pos(1, 2), pos(1, 3)];
        let buckets = partition_by_game(positions, 3);
        let game_bucket = buckets.iter().find(|b| !b.is_empty()).unwrap();
        let plies: Vec<u32> = game_bucket.iter().map(|p| p.ply).collect();
        assert_eq!(plies, vec![1, 2, 3]);
    }
}
