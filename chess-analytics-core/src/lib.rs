//! The data model and statistical core of the chess analytics backend:
//! the persisted shapes, the accuracy/phase metrics, mistake detection
//! and puzzle assembly, and the arena rating model.
//!
//! This crate has no I/O: it never touches a database or an engine process.
//! `server` drives the engine and persistence and calls into these pure
//! functions at each pipeline stage.

pub mod accuracy;
pub mod arena_observations;
pub mod model;
pub mod rating;
pub mod scan;

pub use accuracy::{
    per_game_accuracy, per_move_accuracy, phase_metrics, win_percentage, winsorized_harmonic_mean,
    MoveSample, PhaseMetrics,
};
pub use analysis::Category;
pub use arena_observations::{
    defending_observed_pct, endgame_observed_pct, observe_move, strategic_observed_pct,
    CategoryTally, MoveObservation,
};
pub use model::{
    AnalysisJob, AnalysisStatus, Eval, Game, GameResult, Phase, Position, Puzzle, Severity,
    TimeCategory, User,
};
pub use rating::{
    build_card, compute_form, lookup_expected, score_category, ArenaCard, CategoryKind,
    CategoryScore, RatePoint, Tier,
};
pub use scan::{build_puzzle, classify_severity, is_candidate, MistakeCandidate, ReviewOutcome};
