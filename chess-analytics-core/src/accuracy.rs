//! The accuracy model: win-percentage transform, per-move accuracy, the winsorized
//! harmonic mean used for per-game/per-phase accuracy, and the
//! best-move/blunder rate aggregates the rating model consumes.
//!
//! The constants below are calibrated against a ground-truth accuracy
//! series (a MAE <= 4.0 / RMSE <= 5.0 bound) and must not be re-derived or
//! "simplified" without re-running that calibration.

use crate::model::Phase;

/// The logistic steepness constant from the accuracy model. Literal; do not re-derive.
const WP_K: f64 = 0.003_682_08;

/// Floor every per-move accuracy is winsorized to before aggregation, so a
/// single catastrophic move can't collapse a harmonic mean to near zero.
const WINSOR_FLOOR: f64 = 24.0;

/// Transforms a centipawn score (from the perspective whose turn it is) to
/// a 0–100 win percentage.
pub fn win_percentage(cp: i32) -> f64 {
    50.0 + 50.0 * (2.0 / (1.0 + (-WP_K * cp as f64).exp()) - 1.0)
}

/// Accuracy of a single move, given the mover's win percentage immediately
/// before and after the move.
pub fn per_move_accuracy(wp_before: f64, wp_after: f64) -> f64 {
    if wp_after >= wp_before {
        return 100.0;
    }
    let diff = wp_before - wp_after;
    let raw = 103.1668 * (-0.1159 * diff).exp() - 3.1669 + 1.0;
    raw.clamp(0.0, 100.0)
}

fn winsorize(acc: f64) -> f64 {
    acc.max(WINSOR_FLOOR)
}

/// The winsorized harmonic mean used for both per-game and per-phase
/// accuracy: floor every value at 24, then take the harmonic mean.
pub fn winsorized_harmonic_mean(accuracies: &[f64]) -> Option<f64> {
    if accuracies.is_empty() {
        return None;
    }
    let n = accuracies.len() as f64;
    let reciprocal_sum: f64 = accuracies
        .iter()
        .map(|&a| 1.0 / winsorize(a))
        .sum();
    Some(n / reciprocal_sum)
}

/// One side's per-move accuracies across a single game, in ply order.
/// `wp_before`/`wp_after` must already be from that side's perspective.
pub fn per_game_accuracy(move_accuracies: &[f64]) -> Option<f64> {
    winsorized_harmonic_mean(move_accuracies)
}

/// A single move's accuracy plus the phase it belongs to and whether it
/// matched the engine's top move, for per-phase aggregation.
#[derive(Debug, Clone, Copy)]
pub struct MoveSample {
    pub phase: Phase,
    pub accuracy: f64,
    pub wp_before: f64,
    pub wp_after: f64,
    pub is_best_move: bool,
    pub per_game_index: usize,
}

/// Aggregated phase metrics: accuracy (winsorized-harmonic-per-game, then
/// arithmetic-mean-across-games), best-move rate, and blunder rate.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PhaseMetrics {
    pub accuracy: Option<f64>,
    pub best_move_rate: f64,
    pub blunder_rate: f64,
}

/// Computes [`PhaseMetrics`] for a single phase from the flat list of move
/// samples across however many games were scanned. `per_game_index`
/// groups samples by game so the harmonic mean is taken within a game
/// before arithmetic-averaging across games, per the accuracy model.
pub fn phase_metrics(samples: &[MoveSample]) -> PhaseMetrics {
    if samples.is_empty() {
        return PhaseMetrics::default();
    }

    let mut by_game: std::collections::BTreeMap<usize, Vec<f64>> = std::collections::BTreeMap::new();
    for s in samples {
        by_game.entry(s.per_game_index).or_default().push(s.accuracy);
    }
    let per_game_means: Vec<f64> = by_game
        .values()
        .filter_map(|accs| winsorized_harmonic_mean(accs))
        .collect();
    let accuracy = if per_game_means.is_empty() {
        None
    } else {
        Some(per_game_means.iter().sum::<f64>() / per_game_means.len() as f64)
    };

    let best_move_rate =
        samples.iter().filter(|s| s.is_best_move).count() as f64 / samples.len() as f64;

    // Blunder: mover's WP drop exceeds 10 points and the starting WP was
    // >= 25 (so a move made in an already-lost position isn't counted).
    let blunder_count = samples
        .iter()
        .filter(|s| s.wp_before - s.wp_after > 10.0 && s.wp_before >= 25.0)
        .count();
    let blunder_rate = blunder_count as f64 / samples.len() as f64;

    PhaseMetrics {
        accuracy,
        best_move_rate,
        blunder_rate,
    }
}
