//! Mistake detection and puzzle assembly. Pure logic only: the
//! server crate walks a game's positions, calls [`is_candidate`] on each
//! mover ply, drives the review-depth re-evaluation through `engine`, and
//! hands the result to [`build_puzzle`].

use analysis::{classify_puzzle, ClassifyError, ClassifyInput, TacticalTagKind};

use crate::model::{Puzzle, Severity, Side};

/// Flips a White-perspective centipawn score to the given mover's
/// perspective.
pub fn mover_perspective_cp(white_perspective_cp: i32, mover: Side) -> i32 {
    if mover == Side::White {
        white_perspective_cp
    } else {
        -white_perspective_cp
    }
}

/// A ply where the user moved and the screening-depth evaluation regressed
/// enough, and early enough, to be worth a deeper look.
#[derive(Debug, Clone)]
pub struct MistakeCandidate {
    pub game_id: i64,
    pub ply: u32,
    /// Position before the mistake, from the mover's turn.
    pub fen: String,
    pub side_to_move: Side,
    pub played_move_uci: String,
    /// mistake detection step 1, from the mover's perspective, at screening depth.
    pub screening_delta_cp: i32,
    /// The opponent's move that led to `fen`, and the position one ply
    /// earlier — carried through for the puzzle's optional setup fields.
    pub setup_fen: Option<String>,
    pub setup_move_uci: Option<String>,
}

/// mistake detection step 2: a candidate iff the regression is at least half a pawn,
/// the ply is past the opening-book window, and the player didn't play the
/// engine's own top move.
pub fn is_candidate(
    ply: u32,
    delta_cp: i32,
    played_move_uci: &str,
    screening_best_move_uci: &str,
) -> bool {
    delta_cp <= -50 && ply > 6 && played_move_uci != screening_best_move_uci
}

/// The review-depth re-evaluation of a candidate's before/after positions,
/// both already expressed from the mover's perspective.
#[derive(Debug, Clone)]
pub struct ReviewOutcome {
    pub eval_before_cp: i32,
    pub eval_after_cp: i32,
    pub best_move_uci: String,
    /// Review-depth PV from the before-position, mover-to-move first.
    pub pv_moves: Vec<String>,
}

impl ReviewOutcome {
    fn delta_cp(&self) -> i32 {
        self.eval_after_cp - self.eval_before_cp
    }
}

const PV_CAP: usize = 8;

/// mistake detection step 3 + step 4 + step 5 combined: re-checks the deeper
/// evaluation, and if the mistake survives, assigns severity and builds
/// the full [`Puzzle`] record (category/labels by way of
/// `analysis::classify_puzzle`). Returns `None` when the review-depth pass
/// shows the regression no longer clears the `-50` threshold — these
/// candidates are discarded, not persisted.
pub fn build_puzzle(
    candidate: &MistakeCandidate,
    outcome: &ReviewOutcome,
) -> Result<Option<Puzzle>, ClassifyError> {
    if outcome.delta_cp() > -50 {
        return Ok(None);
    }

    let severity = classify_severity(outcome.eval_before_cp, outcome.eval_after_cp);

    let pv_moves: Vec<String> = outcome.pv_moves.iter().take(PV_CAP).cloned().collect();
    let required_moves = pv_moves.len().div_ceil(2).max(1) as u32;

    let input = ClassifyInput {
        fen: &candidate.fen,
        best_move_uci: &outcome.best_move_uci,
        pv_moves: &pv_moves,
        eval_before_cp: outcome.eval_before_cp,
        eval_after_cp: outcome.eval_after_cp,
        side_to_move: candidate.side_to_move.into(),
    };
    let (category, tags) = classify_puzzle(&input)?;
    let labels: Vec<TacticalTagKind> = {
        let mut seen = Vec::new();
        for tag in &tags {
            if !seen.contains(&tag.kind) {
                seen.push(tag.kind.clone());
            }
        }
        seen
    };

    Ok(Some(Puzzle {
        game_id: candidate.game_id,
        ply: candidate.ply,
        fen: candidate.fen.clone(),
        side_to_move: candidate.side_to_move,
        played_move_uci: candidate.played_move_uci.clone(),
        best_move_uci: outcome.best_move_uci.clone(),
        pv_moves,
        eval_before_cp: outcome.eval_before_cp,
        eval_after_cp: outcome.eval_after_cp,
        delta_cp: outcome.delta_cp(),
        required_moves,
        setup_fen: candidate.setup_fen.clone(),
        setup_move_uci: candidate.setup_move_uci.clone(),
        category,
        severity,
        labels,
    }))
}

/// The severity assignment from mistake detection step 4, exposed
/// standalone (rather than only reachable through [`build_puzzle`]) since
/// a `/classify-test` endpoint takes evals directly and must compute
/// severity without a PV re-evaluation round trip.
pub fn classify_severity(eval_before_cp: i32, eval_after_cp: i32) -> Severity {
    let delta = eval_after_cp - eval_before_cp;
    if delta <= -300 {
        return Severity::Blunder;
    }
    if eval_before_cp >= 150 && eval_after_cp < 50 {
        return Severity::MissedWin;
    }
    if eval_before_cp >= -150 && eval_after_cp <= -300 {
        return Severity::MissedSave;
    }
    Severity::Mistake
}

/// Re-exported so callers building puzzles don't need a separate
/// dependency on `analysis` just to name the category type.
pub use analysis::Category as PuzzleCategory;

#[cfg(test)]
mod tests {
    use super::*;
    use chess::PieceColor as Color;

    #[test]
    fn candidate_requires_half_pawn_regression() {
        assert!(!is_candidate(10, -49, "e2e4", "d2d4"));
        assert!(is_candidate(10, -50, "e2e4", "d2d4"));
    }

    #[test]
    fn candidate_excludes_opening_book_plies() {
        assert!(!is_candidate(6, -200, "e2e4", "d2d4"));
        assert!(is_candidate(7, -200, "e2e4", "d2d4"));
    }

    #[test]
    fn candidate_excludes_best_move_played() {
        assert!(!is_candidate(20, -200, "d2d4", "d2d4"));
    }

    #[test]
    fn severity_blunder_threshold() {
        assert_eq!(classify_severity(0, -300), Severity::Blunder);
        assert_eq!(classify_severity(0, -299), Severity::Mistake);
    }

    #[test]
    fn severity_missed_win_and_save() {
        assert_eq!(classify_severity(200, 0), Severity::MissedWin);
        // delta here is only -150 (not a blunder); missed_save still fires
        // because the position was holdable (>= -150) before the move and
        // decisively lost (<= -300) after.
        assert_eq!(classify_severity(-150, -300), Severity::MissedSave);
    }

    #[test]
    fn review_recheck_discards_false_positive() {
        let candidate = MistakeCandidate {
            game_id: 1,
            ply: 20,
            fen: "6k1/ppp2ppp/3q1r2/8/8/2NP4/PPP2PPP/6K1 w - - 0 25".to_string(),
            side_to_move: Color::White,
            played_move_uci: "c3e4".to_string(),
            screening_delta_cp: -200,
            setup_fen: None,
            setup_move_uci: None,
        };
        let outcome = ReviewOutcome {
            eval_before_cp: 0,
            eval_after_cp: -10,
            best_move_uci: "c3e4".to_string(),
            pv_moves: vec!["c3e4".to_string()],
        };
        assert!(build_puzzle(&candidate, &outcome).unwrap().is_none());
    }

    #[test]
    fn review_recheck_keeps_real_mistake_and_builds_puzzle() {
        // The played move was a blunder; the best move (what the puzzle
        // teaches) is the knight fork c3e4. `eval_after_cp` reflects the
        // actual (bad) played move, so the delta is a real regression.
        let candidate = MistakeCandidate {
            game_id: 1,
            ply: 20,
            fen: "6k1/ppp2ppp/3q1r2/8/8/2NP4/PPP2PPP/6K1 w - - 0 25".to_string(),
            side_to_move: Color::White,
            played_move_uci: "g1g2".to_string(),
            screening_delta_cp: -500,
            setup_fen: None,
            setup_move_uci: None,
        };
        let outcome = ReviewOutcome {
            eval_before_cp: 0,
            eval_after_cp: -500,
            best_move_uci: "c3e4".to_string(),
            pv_moves: vec!["c3e4".to_string(), "d6d8".to_string(), "e4f6".to_string()],
        };
        let puzzle = build_puzzle(&candidate, &outcome).unwrap().unwrap();
        assert_eq!(puzzle.category, PuzzleCategory::Tactics);
        assert_eq!(puzzle.required_moves, 2);
        assert!(puzzle.labels.contains(&TacticalTagKind::Fork));
    }
}
