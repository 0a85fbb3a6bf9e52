//! The accuracy & phase metrics stage. Persists `accuracyWhite`/
//! `accuracyBlack` on each fully-evaluated game. Per-phase aggregates
//! (`PhaseMetrics`) are not persisted anywhere in the four logical tables;
//! the API layer recomputes them on demand from raw positions for the
//! stats/arena-stats endpoints.

use chess::PieceColor as Side;
use chess_analytics_core::{per_game_accuracy, per_move_accuracy, win_percentage, Position};

use crate::persistence::{GameRepository, PersistenceError, PositionRepository};

/// One move's per-move accuracy, the side that played it, and the phase it
/// falls in (by the mover's ply). Shared with the API layer's phase-metric
/// computation so the two call sites can't drift on what "a move" means.
#[derive(Debug, Clone, Copy)]
pub struct MoveAccuracy {
    pub side: Side,
    pub ply: u32,
    pub accuracy: f64,
    pub wp_before: f64,
    pub wp_after: f64,
    pub is_best_move: bool,
}

/// Derives one [`MoveAccuracy`] per ply that has a following position (the
/// final ply of a game has no "after" evaluation recorded anywhere in the
/// data model, so it's excluded — matching the contract that accuracy is
/// defined on eval deltas, not terminal positions).
pub fn compute_move_accuracies(positions: &[Position]) -> Vec<MoveAccuracy> {
    let mut out = Vec::new();
    for window in positions.windows(2) {
        let (before, after) = (&window[0], &window[1]);
        let (Some(eval_before), Some(eval_after)) = (before.eval, after.eval) else {
            continue;
        };
        if before.eval_failed || after.eval_failed {
            continue;
        }
        let mover = before.side_to_move;
        let cp_before = mover_perspective_cp(eval_before, mover);
        let cp_after = mover_perspective_cp(eval_after, mover);
        let wp_before = win_percentage(cp_before);
        let wp_after = win_percentage(cp_after);
        let is_best_move = before
            .pv
            .as_ref()
            .and_then(|pv| pv.first())
            .is_some_and(|best| best == &before.move_uci);

        out.push(MoveAccuracy {
            side: mover,
            ply: before.ply,
            accuracy: per_move_accuracy(wp_before, wp_after),
            wp_before,
            wp_after,
            is_best_move,
        });
    }
    out
}

fn mover_perspective_cp(white_perspective_cp: i32, mover: Side) -> i32 {
    if mover == Side::White {
        white_perspective_cp
    } else {
        -white_perspective_cp
    }
}

/// Computes and persists `accuracyWhite`/`accuracyBlack` for every game of
/// `username` that is fully evaluated but still missing an accuracy
/// figure.
pub async fn run_accuracy_stage(
    games: &impl GameRepository,
    positions: &impl PositionRepository,
    username: &str,
) -> Result<usize, PersistenceError> {
    let candidates = games
        .list_games(username, &crate::persistence::GameFilter::default())
        .await?;
    let mut updated = 0;

    for game in candidates.iter().filter(|g| g.positions_parsed) {
        if game.accuracy_white.is_some() && game.accuracy_black.is_some() {
            continue;
        }
        if !positions.is_game_fully_evaluated(game.id).await? {
            continue;
        }

        let rows = positions.list_positions(game.id).await?;
        let moves = compute_move_accuracies(&rows);

        let white_acc: Vec<f64> = moves
            .iter()
            .filter(|m| m.side == Side::White)
            .map(|m| m.accuracy)
            .collect();
        let black_acc: Vec<f64> = moves
            .iter()
            .filter(|m| m.side == Side::Black)
            .map(|m| m.accuracy)
            .collect();

        games
            .update_accuracy(
                game.id,
                per_game_accuracy(&white_acc),
                per_game_accuracy(&black_acc),
            )
            .await?;
        updated += 1;
    }

    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(ply: u32, side: Side, eval: i32, move_uci: &str) -> Position {
        Position {
            game_id: 1,
            ply,
            fen: "8/8/8/8/8/8/8/8 w - - 0 1".to_string(),
            move_uci: move_uci.to_string(),
            san: "x".to_string(),
            side_to_move: side,
            eval: Some(eval),
            eval_depth: Some(12),
            pv: Some(vec![move_uci.to_string()]),
            eval_failed: false,
        }
    }

    #[test]
    fn no_move_after_last_ply_is_excluded() {
        let positions = vec![pos(1, Side::White, 20, "e2e4")];
        assert!(compute_move_accuracies(&positions).is_empty());
    }

    #[test]
    fn accuracy_uses_movers_perspective() {
        let positions = vec![pos(1, Side::Black, -100, "e7e5"), pos(2, Side::White, -100, "g1f3")];
        let moves = compute_move_accuracies(&positions);
        assert_eq!(moves.len(), 1);
        // Mover was Black; -100 (White-relative) before and after is a wash
        // from Black's perspective (both +100 for Black), so no drop.
        assert_eq!(moves[0].accuracy, 100.0);
    }

    #[test]
    fn eval_failed_position_is_skipped() {
        let mut second = pos(2, Side::White, -400, "g1f3");
        second.eval_failed = true;
        let positions = vec![pos(1, Side::Black, 0, "e7e5"), second];
        assert!(compute_move_accuracies(&positions).is_empty());
    }

    #[test]
    fn best_move_rate_flag_matches_pv_head() {
        let positions = vec![pos(1, Side::White, 20, "e2e4"), pos(2, Side::Black, 15, "e7e5")];
        let moves = compute_move_accuracies(&positions);
        assert!(moves[0].is_best_move);
    }
}
