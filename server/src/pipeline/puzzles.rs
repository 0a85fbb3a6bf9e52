//! Puzzle generator & classifier stage: walks a fully-evaluated
//! game's positions, finds mistake candidates, re-checks them at review
//! depth, and persists the resulting puzzle (category/severity/labels via
//! `chess_analytics_core::build_puzzle`, which itself calls
//! `analysis::classify_puzzle`).

use chess::PieceColor as Side;
use chess_analytics_core::{build_puzzle, is_candidate, Game, MistakeCandidate, Position, ReviewOutcome};
use engine::Evaluator;

use crate::persistence::{GameRepository, PersistenceError, PositionRepository, PuzzleRepository};

#[derive(Debug, thiserror::Error)]
pub enum PuzzleStageError {
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error("classification error: {0}")]
    Classify(#[from] analysis::ClassifyError),
    #[error("engine error: {0}")]
    Engine(#[from] engine::EvaluatorError),
}

fn mover_perspective_cp(white_perspective_cp: i32, mover: Side) -> i32 {
    if mover == Side::White {
        white_perspective_cp
    } else {
        -white_perspective_cp
    }
}

/// Runs puzzle generation for every fully-evaluated, not-yet-scanned game
/// of `username`. Returns the number of puzzles newly created.
pub async fn run_puzzle_stage(
    games: &impl GameRepository,
    positions: &impl PositionRepository,
    puzzles: &impl PuzzleRepository,
    evaluator: &mut Evaluator,
    username: &str,
    review_depth: u8,
) -> Result<usize, PuzzleStageError> {
    let candidates_games = games
        .list_games(username, &crate::persistence::GameFilter::default())
        .await?;
    let mut created = 0;

    for game in candidates_games.iter().filter(|g| g.positions_parsed) {
        if !positions.is_game_fully_evaluated(game.id).await? {
            continue;
        }
        let rows = positions.list_positions(game.id).await?;
        created += scan_game(game, &rows, puzzles, evaluator, review_depth).await?;
    }

    Ok(created)
}

async fn scan_game(
    game: &Game,
    rows: &[Position],
    puzzles: &impl PuzzleRepository,
    evaluator: &mut Evaluator,
    review_depth: u8,
) -> Result<usize, PuzzleStageError> {
    let mover_side = game.user_side();
    let mut created = 0;

    for idx in 0..rows.len().saturating_sub(1) {
        let (before, after) = (&rows[idx], &rows[idx + 1]);
        if before.side_to_move != mover_side {
            continue;
        }
        if before.eval_failed || after.eval_failed {
            continue;
        }
        let (Some(eval_before), Some(eval_after)) = (before.eval, after.eval) else {
            continue;
        };

        if puzzles.puzzle_exists(game.id, before.ply).await? {
            continue;
        }

        let screening_delta =
            mover_perspective_cp(eval_after, mover_side) - mover_perspective_cp(eval_before, mover_side);
        let screening_best = before.pv.as_ref().and_then(|pv| pv.first()).map(String::as_str).unwrap_or("");

        if !is_candidate(before.ply, screening_delta, &before.move_uci, screening_best) {
            continue;
        }

        let review_before = evaluator.analyze_to_depth(&before.fen, review_depth).await?;
        let review_after = evaluator.analyze_to_depth(&after.fen, review_depth).await?;

        let best_move_uci = review_before
            .pv
            .first()
            .map(|m| chess::format_uci_move(*m))
            .unwrap_or_else(|| before.move_uci.clone());
        let pv_moves: Vec<String> = review_before.pv.iter().map(|m| chess::format_uci_move(*m)).collect();

        let (setup_fen, setup_move_uci) = if idx > 0 {
            (Some(rows[idx - 1].fen.clone()), Some(rows[idx - 1].move_uci.clone()))
        } else {
            (None, None)
        };

        let candidate = MistakeCandidate {
            game_id: game.id,
            ply: before.ply,
            fen: before.fen.clone(),
            side_to_move: mover_side,
            played_move_uci: before.move_uci.clone(),
            screening_delta_cp: screening_delta,
            setup_fen,
            setup_move_uci,
        };
        let outcome = ReviewOutcome {
            eval_before_cp: mover_perspective_cp(review_before.score.as_cp(), mover_side),
            eval_after_cp: mover_perspective_cp(review_after.score.as_cp(), mover_side),
            best_move_uci,
            pv_moves,
        };

        if let Some(puzzle) = build_puzzle(&candidate, &outcome)? {
            if puzzles.insert_puzzle(&puzzle).await? {
                created += 1;
            }
        }
    }

    Ok(created)
}
