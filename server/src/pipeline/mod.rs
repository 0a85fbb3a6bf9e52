//! The five-stage pipeline: import, parse, evaluate, accuracy,
//! generate-puzzles. Stages are plain async functions over the repository
//! traits rather than a framework, preferring explicit `tokio`-driven
//! control flow over a pipeline abstraction.

mod accuracy;
mod orchestrator;
mod parse;
mod puzzles;

pub use accuracy::{compute_move_accuracies, run_accuracy_stage, MoveAccuracy};
pub use orchestrator::{run_pipeline, PipelineError, RunOptions};
pub use parse::{parse_game_positions, run_parse_stage, ParseError};
pub use puzzles::{run_puzzle_stage, PuzzleStageError};
