//! the rating model's "observed rates" — the per-category performance figures the
//! arena rating model calibrates against the expected curves.
//!
//! Most observed rates are ordinary [`PhaseMetrics`]/accuracy arithmetic
//! already computed elsewhere. The two that need something new are
//! `attacking` and `tactics`, whose observed rates are defined per-move (not
//! per-puzzle): every mover ply (not just the ones that became puzzles)
//! must run through the category cascade. [`observe_move`] does that
//! one ply at a time; [`CategoryTally`] folds the stream of observations
//! into the rates [`crate::rating::build_card`] wants.

use analysis::{classify_puzzle, Category, ClassifyError, ClassifyInput};

use crate::model::{Position, Side};

/// The category cascade's verdict on a single ply, plus the bits needed to
/// fold it into [`CategoryTally`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveObservation {
    pub category: Category,
    pub is_opening_ply: bool,
    pub is_best_move: bool,
    /// Mover's win-percentage drop exceeded 10 points from a position that
    /// wasn't already lost — the same blunder definition the accuracy model uses for
    /// phase metrics, reused here per-category.
    pub is_blunder: bool,
}

/// Runs the category cascade on one mover ply (`before` -> `after`, both
/// evaluated, `before.side_to_move == mover`) and folds in the
/// best-move/blunder facts [`CategoryTally`] needs. Returns `None` when
/// either position lacks an eval/PV to classify from — such plies simply
/// don't contribute an observation, the same way the puzzle generator
/// skips them.
pub fn observe_move(
    before: &Position,
    after: &Position,
    mover: Side,
) -> Result<Option<MoveObservation>, ClassifyError> {
    if before.side_to_move != mover || before.eval_failed || after.eval_failed {
        return Ok(None);
    }
    let (Some(eval_before), Some(eval_after)) = (before.eval, after.eval) else {
        return Ok(None);
    };
    let Some(best_move_uci) = before.pv.as_ref().and_then(|pv| pv.first()) else {
        return Ok(None);
    };

    let eval_before_cp = mover_perspective_cp(eval_before, mover);
    let eval_after_cp = mover_perspective_cp(eval_after, mover);
    let wp_before = crate::accuracy::win_percentage(eval_before_cp);
    let wp_after = crate::accuracy::win_percentage(eval_after_cp);

    let pv_moves = before.pv.clone().unwrap_or_default();
    let input = ClassifyInput {
        fen: &before.fen,
        best_move_uci,
        pv_moves: &pv_moves,
        eval_before_cp,
        eval_after_cp,
        side_to_move: mover.into(),
    };
    let (category, _tags) = classify_puzzle(&input)?;

    Ok(Some(MoveObservation {
        category,
        is_opening_ply: before.ply <= 24,
        is_best_move: &before.move_uci == best_move_uci,
        is_blunder: wp_before - wp_after > 10.0 && wp_before >= 25.0,
    }))
}

fn mover_perspective_cp(white_perspective_cp: i32, mover: Side) -> i32 {
    if mover == Side::White {
        white_perspective_cp
    } else {
        -white_perspective_cp
    }
}

/// Folds a stream of [`MoveObservation`]s into the per-category counts
/// the rating model's `attacking`/`tactics`/`opening` observed rates need.
#[derive(Debug, Clone, Copy, Default)]
pub struct CategoryTally {
    attacking_total: u32,
    attacking_best: u32,
    tactics_total: u32,
    tactics_blunders: u32,
    opening_total: u32,
    opening_best: u32,
}

impl CategoryTally {
    pub fn add(&mut self, obs: MoveObservation) {
        if obs.category == Category::Attacking {
            self.attacking_total += 1;
            if obs.is_best_move {
                self.attacking_best += 1;
            }
        }
        if obs.category == Category::Tactics {
            self.tactics_total += 1;
            if obs.is_blunder {
                self.tactics_blunders += 1;
            }
        }
        if obs.is_opening_ply {
            self.opening_total += 1;
            if obs.is_best_move {
                self.opening_best += 1;
            }
        }
    }

    /// Best-move rate among moves the cascade categorized `attacking`.
    /// Falls back to the midpoint when the user has no attacking-category
    /// moves yet, so an empty category doesn't masquerade as a perfect or
    /// a zero score.
    pub fn attacking_observed_pct(&self) -> f64 {
        ratio_or_midpoint(self.attacking_best, self.attacking_total)
    }

    /// `1 - blunder_rate` on positions the cascade categorized `tactics`
    /// (i.e. carrying at least one motif), per the rating model.
    pub fn tactics_observed_pct(&self) -> f64 {
        100.0 - ratio_or_midpoint(self.tactics_blunders, self.tactics_total)
    }

    /// Best-move rate over plies with `ply <= 24`.
    pub fn opening_observed_pct(&self) -> f64 {
        ratio_or_midpoint(self.opening_best, self.opening_total)
    }
}

fn ratio_or_midpoint(numerator: u32, denominator: u32) -> f64 {
    if denominator == 0 {
        50.0
    } else {
        100.0 * numerator as f64 / denominator as f64
    }
}

/// `defending`'s observed rate: `1 - missed_save_rate`, where the rate is
/// the fraction of the user's assessed moves that became a `missed_save`
/// puzzle.
pub fn defending_observed_pct(missed_save_puzzles: u32, total_moves: u32) -> f64 {
    100.0 - ratio_or_midpoint(missed_save_puzzles, total_moves)
}

/// `strategic`'s observed rate: overall per-game accuracy minus the
/// opening/endgame-phase accuracy, normalized around the 50-point
/// midpoint so a strategic player (someone whose accuracy holds up
/// *outside* the phases the other categories already cover) scores above
/// the middle of the band and someone weaker there scores below it.
///
/// The exact curve/normalization here is this implementation's own
/// choice, not a formula derived from any ground truth.
pub fn strategic_observed_pct(overall_accuracy: f64, opening_and_endgame_accuracy: f64) -> f64 {
    (50.0 + (overall_accuracy - opening_and_endgame_accuracy)).clamp(0.0, 100.0)
}

/// `endgame`'s observed rate is just the endgame [`Phase`]'s accuracy,
/// already computed by [`crate::accuracy::phase_metrics`]; re-exported
/// here as a one-line helper so call sites don't need to remember which
/// `Phase` variant to index.
pub fn endgame_observed_pct(endgame_phase_accuracy: Option<f64>) -> f64 {
    endgame_phase_accuracy.unwrap_or(50.0)
}
